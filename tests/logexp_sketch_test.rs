use expsketch::Sketch;
use expsketch::error::ErrorKind;
use expsketch::logexp::{LogExpJaccSketch, LogExpSketch};
use expsketch::q::QSketch;
use googletest::assert_that;
use googletest::prelude::ge;
use googletest::prelude::near;

fn fill(sketch: &mut impl Sketch, keys: std::ops::Range<u32>, weight: f64) {
    for i in keys {
        sketch.update(&format!("e{i}"), weight);
    }
}

#[test]
fn test_base_two_reproduces_q_sketch() {
    let mut log_sketch = LogExpSketch::new(128, &[], 8, 2.0).unwrap();
    let mut q_sketch = QSketch::new(128, &[], 8).unwrap();
    for i in 0..2000 {
        let elem = format!("e{i}");
        let weight = 1.0 + (i % 5) as f64;
        log_sketch.update(&elem, weight);
        q_sketch.update(&elem, weight);
    }
    assert_eq!(log_sketch.registers(), q_sketch.registers());
    assert_eq!(log_sketch.estimate(), q_sketch.estimate());
}

#[test]
fn test_narrow_base_accuracy() {
    // base 1.2 packs the quantization grid tighter than base 2, so the
    // same register width gives a finer estimate
    let mut sketch = LogExpSketch::new(256, &[], 10, 1.2).unwrap();
    fill(&mut sketch, 0..10_000, 1.0);
    assert_that!(sketch.estimate(), near(10_000.0, 2_000.0));
}

#[test]
fn test_invalid_base_is_rejected() {
    assert_eq!(
        LogExpSketch::new(16, &[], 8, 1.0).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
    assert_eq!(
        LogExpJaccSketch::new(16, &[], 8, 0.5, 8).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
}

#[test]
fn test_jaccard_estimate_tracks_overlap() {
    let mut a = LogExpJaccSketch::new(256, &[], 8, 2.0, 8).unwrap();
    let mut b = LogExpJaccSketch::new(256, &[], 8, 2.0, 8).unwrap();
    // elements 0..1000 and 500..1500, true Jaccard 1/3
    fill(&mut a, 0..1000, 1.0);
    fill(&mut b, 500..1500, 1.0);
    let jaccard = a.jaccard_struct(&b);
    assert_that!(jaccard, near(1.0 / 3.0, 0.15));
}

#[test]
fn test_jaccard_identical_streams_is_one() {
    let mut a = LogExpJaccSketch::new(128, &[], 8, 2.0, 8).unwrap();
    let mut b = LogExpJaccSketch::new(128, &[], 8, 2.0, 8).unwrap();
    fill(&mut a, 0..500, 1.0);
    fill(&mut b, 0..500, 1.0);
    assert_eq!(a.jaccard_struct(&b), 1.0);
}

#[test]
fn test_jaccard_bits_bounds_are_enforced() {
    assert_eq!(
        LogExpJaccSketch::new(16, &[], 8, 2.0, 1).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
    assert!(LogExpJaccSketch::new(16, &[], 8, 2.0, 2).is_ok());
    assert!(LogExpJaccSketch::new(16, &[], 8, 2.0, 32).is_ok());
    assert_eq!(
        LogExpJaccSketch::new(16, &[], 8, 2.0, 33).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
}

#[test]
fn test_reconstruction_matches_original() {
    let mut original = LogExpJaccSketch::new(64, &[], 8, 1.5, 8).unwrap();
    fill(&mut original, 0..300, 2.0);
    let mut restored = LogExpJaccSketch::from_state(
        64,
        &original.seeds(),
        8,
        1.5,
        8,
        &original.registers(),
        &original.fingerprints(),
    )
    .unwrap();
    assert_eq!(restored.estimate(), original.estimate());
    original.update("after-restore", 1.0);
    restored.update("after-restore", 1.0);
    assert_eq!(original.registers(), restored.registers());
    assert_eq!(original.fingerprints(), restored.fingerprints());
}

#[test]
fn test_memory_accounting_ordering() {
    let plain = LogExpSketch::new(128, &[], 8, 2.0).unwrap();
    let jacc = LogExpJaccSketch::new(128, &[], 8, 2.0, 8).unwrap();
    assert_that!(plain.memory_usage_total(), ge(plain.memory_usage_write()));
    // the fingerprint array is part of the persisted state
    assert_that!(jacc.memory_usage_write(), ge(plain.memory_usage_write()));
    assert_that!(jacc.memory_usage_total(), ge(jacc.memory_usage_write()));
    assert_that!(
        jacc.memory_usage_write(),
        ge(jacc.memory_usage_estimate())
    );
}
