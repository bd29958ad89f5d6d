use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::fingerprint::FingerprintArray;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::logexp::check_logarithm_base;
use crate::logexp::quantize_log;
use crate::mle::GeometricMle;
use crate::q::check_register_width;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// [`LogExpSketch`](crate::logexp::LogExpSketch) with element
/// fingerprints for similarity estimation.
///
/// Every register improvement also records a short fingerprint of the
/// winning element in a parallel array, so two sketches built from
/// overlapping streams can estimate their Jaccard similarity by comparing
/// fingerprints positionally. The fingerprint width is configured
/// independently of the register width.
#[derive(Debug, Clone)]
pub struct LogExpJaccSketch {
    seeds: SeedTable,
    bits: u8,
    base: f64,
    jaccard_bits: u8,
    r_max: i64,
    registers: CompactVec,
    fingerprints: FingerprintArray,
    mle: GeometricMle,
}

impl LogExpJaccSketch {
    /// Creates an empty sketch. `jaccard_bits` is the fingerprint width.
    pub fn new(
        m: usize,
        seeds: &[u32],
        bits: u8,
        base: f64,
        jaccard_bits: u8,
    ) -> Result<Self, Error> {
        check_register_width(bits)?;
        check_logarithm_base(base)?;
        let seeds = SeedTable::new(m, seeds)?;
        let fingerprints = FingerprintArray::new(u32::from(jaccard_bits), m)?;
        let r_max = (1i64 << (bits - 1)) - 1;
        let r_min = -(1i64 << (bits - 1)) + 1;
        let mut registers = CompactVec::new(u32::from(bits), m);
        for i in 0..m {
            registers.set_signed(i, r_min);
        }
        Ok(Self {
            seeds,
            bits,
            base,
            jaccard_bits,
            r_max,
            registers,
            fingerprints,
            mle: GeometricMle::new(base),
        })
    }

    /// Reconstructs a sketch from previously captured state, fingerprints
    /// included.
    #[allow(clippy::too_many_arguments)]
    pub fn from_state(
        m: usize,
        seeds: &[u32],
        bits: u8,
        base: f64,
        jaccard_bits: u8,
        registers: &[i64],
        fingerprints: &[u32],
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits, base, jaccard_bits)?;
        if registers.len() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "register array length does not match sketch size",
            )
            .with_context("expected", m)
            .with_context("actual", registers.len()));
        }
        for (i, &r) in registers.iter().enumerate() {
            sketch.registers.set_signed(i, r);
        }
        sketch.fingerprints =
            FingerprintArray::from_values(u32::from(jaccard_bits), m, fingerprints)?;
        Ok(sketch)
    }

    /// Fingerprint-based Jaccard similarity estimate against `other`.
    /// Returns 0.0 when the sketch sizes differ.
    pub fn jaccard_struct(&self, other: &LogExpJaccSketch) -> f64 {
        self.fingerprints.jaccard(&other.fingerprints)
    }

    /// Number of registers.
    pub fn sketch_size(&self) -> usize {
        self.registers.len()
    }

    /// Captured seed list; empty when the implicit rule is in use.
    pub fn seeds(&self) -> Vec<u32> {
        self.seeds.to_vec()
    }

    /// Register width in bits.
    pub fn amount_bits(&self) -> u8 {
        self.bits
    }

    /// Fingerprint width in bits.
    pub fn amount_bits_jaccard(&self) -> u8 {
        self.jaccard_bits
    }

    /// Quantization base.
    pub fn logarithm_base(&self) -> f64 {
        self.base
    }

    /// Unpacked register values.
    pub fn registers(&self) -> Vec<i64> {
        self.registers.iter_signed().collect()
    }

    /// Unpacked fingerprint values.
    pub fn fingerprints(&self) -> Vec<u32> {
        self.fingerprints.to_vec()
    }
}

impl Sketch for LogExpJaccSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        for i in 0..self.registers.len() {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(i)));
            let mark = -u.ln() / weight;
            let q = quantize_log(mark, self.base, self.r_max);
            if q > self.registers.get_signed(i) {
                self.registers.set_signed(i, q);
                self.fingerprints.record(i, elem);
            }
        }
    }

    fn estimate(&self) -> f64 {
        let values: Vec<i64> = self.registers.iter_signed().collect();
        self.mle.estimate(&values)
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + 2 * size_of::<u8>()
            + size_of::<f64>()
            + 2 * size_of::<i64>()
            + self.seeds.byte_size()
            + self.registers.byte_size()
            + self.fingerprints.byte_size_total()
    }

    fn memory_usage_write(&self) -> usize {
        self.registers.byte_size() + self.fingerprints.byte_size_write()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.byte_size() + size_of::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(keys: std::ops::Range<u32>) -> LogExpJaccSketch {
        let mut sketch = LogExpJaccSketch::new(64, &[], 8, 2.0, 8).unwrap();
        for i in keys {
            sketch.update(&format!("e{i}"), 1.0);
        }
        sketch
    }

    #[test]
    fn test_identical_streams_have_jaccard_one() {
        let a = filled(0..200);
        let b = filled(0..200);
        assert_eq!(a.jaccard_struct(&b), 1.0);
    }

    #[test]
    fn test_disjoint_streams_have_low_jaccard() {
        let a = filled(0..200);
        let b = filled(1000..1200);
        assert!(a.jaccard_struct(&b) < 0.2);
    }

    #[test]
    fn test_registers_match_plain_variant() {
        use crate::logexp::LogExpSketch;
        let mut plain = LogExpSketch::new(32, &[], 8, 1.7).unwrap();
        let mut jacc = LogExpJaccSketch::new(32, &[], 8, 1.7, 8).unwrap();
        for i in 0..100 {
            let elem = format!("e{i}");
            plain.update(&elem, 2.0);
            jacc.update(&elem, 2.0);
        }
        assert_eq!(plain.registers(), jacc.registers());
    }

    #[test]
    fn test_from_state_restores_fingerprints() {
        let original = filled(0..100);
        let restored = LogExpJaccSketch::from_state(
            64,
            &original.seeds(),
            8,
            2.0,
            8,
            &original.registers(),
            &original.fingerprints(),
        )
        .unwrap();
        assert_eq!(original.fingerprints(), restored.fingerprints());
        assert_eq!(original.jaccard_struct(&restored), 1.0);
    }
}
