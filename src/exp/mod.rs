//! Continuous exponential-mark sketches.
//!
//! Every register keeps the minimum "exponential mark" `-ln(u) / weight`
//! observed for it; the sum of minima recovers the weighted cardinality in
//! closed form as `(m - 1) / sum`. Three variants share this register
//! semantics:
//!
//! - [`ExpSketch`]: draws one mark per register on every update; the
//!   correctness baseline, exactly `m` hash evaluations per element.
//! - [`FastExpSketch`]: visits registers in a per-element permutation and
//!   stops as soon as the running partial sum can no longer improve any
//!   remaining register.
//! - [`FastGmExpSketch`]: fills registers greedily, then switches to a
//!   pruned mode keyed off the maximum register.
//!
//! # Usage
//!
//! ```rust
//! use expsketch::Sketch;
//! use expsketch::exp::ExpSketch;
//!
//! let mut sketch = ExpSketch::new(64, &[]).unwrap();
//! sketch.update("apple", 1.0);
//! sketch.update("banana", 2.5);
//! assert!(sketch.estimate() > 0.0);
//! ```

mod fast;
mod gm;
mod sketch;

pub use self::fast::FastExpSketch;
pub use self::gm::FastGmExpSketch;
pub use self::sketch::ExpSketch;

/// Fraction of positionally equal registers, used as a structural Jaccard
/// similarity by the continuous variants. 0.0 for mismatched lengths.
pub(crate) fn jaccard_equal_registers(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let equal = a.iter().zip(b).filter(|(x, y)| x == y).count();
    equal as f64 / a.len() as f64
}
