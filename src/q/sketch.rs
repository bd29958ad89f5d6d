use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::mle::GeometricMle;
use crate::q::check_register_width;
use crate::q::quantize_base2;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Baseline quantized sketch.
///
/// Each register is a `b`-bit signed cell holding the largest quantized
/// value observed, clipped to `[r_min, r_max]` with
/// `r_max = 2^(b-1) - 1` and `r_min = -2^(b-1) + 1`. Registers start at
/// `r_min` and never decrease. The estimate is the base-2 MLE fit.
#[derive(Debug, Clone)]
pub struct QSketch {
    seeds: SeedTable,
    bits: u8,
    r_max: i64,
    registers: CompactVec,
    mle: GeometricMle,
}

impl QSketch {
    /// Creates an empty sketch with `m` registers of `bits` bits each.
    pub fn new(m: usize, seeds: &[u32], bits: u8) -> Result<Self, Error> {
        check_register_width(bits)?;
        let seeds = SeedTable::new(m, seeds)?;
        let r_max = (1i64 << (bits - 1)) - 1;
        let r_min = -(1i64 << (bits - 1)) + 1;
        let mut registers = CompactVec::new(u32::from(bits), m);
        for i in 0..m {
            registers.set_signed(i, r_min);
        }
        Ok(Self {
            seeds,
            bits,
            r_max,
            registers,
            mle: GeometricMle::new(2.0),
        })
    }

    /// Reconstructs a sketch from previously captured state.
    pub fn from_state(
        m: usize,
        seeds: &[u32],
        bits: u8,
        registers: &[i64],
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits)?;
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
        Ok(sketch)
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

    /// Unpacked register values.
    pub fn registers(&self) -> Vec<i64> {
        self.registers.iter_signed().collect()
    }
}

impl Sketch for QSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let inv_weight = 1.0 / weight;
        for i in 0..self.registers.len() {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(i)));
            let mark = -u.ln() * inv_weight;
            let q = quantize_base2(mark, self.r_max);
            if q > self.registers.get_signed(i) {
                self.registers.set_signed(i, q);
            }
        }
    }

    fn estimate(&self) -> f64 {
        let values: Vec<i64> = self.registers.iter_signed().collect();
        self.mle.estimate(&values)
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + size_of::<u8>()
            + 2 * size_of::<i64>()
            + self.seeds.byte_size()
            + self.registers.byte_size()
    }

    fn memory_usage_write(&self) -> usize {
        self.registers.byte_size()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_at_r_min() {
        let sketch = QSketch::new(8, &[], 6).unwrap();
        assert!(sketch.registers().iter().all(|&r| r == -31));
    }

    #[test]
    fn test_registers_never_decrease() {
        let mut sketch = QSketch::new(16, &[], 8).unwrap();
        let mut previous = sketch.registers();
        for i in 0..50 {
            sketch.update(&format!("e{i}"), 1.0 + i as f64);
            let current = sketch.registers();
            for (p, c) in previous.iter().zip(current.iter()) {
                assert!(c >= p);
            }
            previous = current;
        }
    }

    #[test]
    fn test_huge_weight_clips_to_r_max() {
        // a near-zero mark quantizes past the representable range
        let mut sketch = QSketch::new(4, &[], 4).unwrap();
        sketch.update("elem", 1e300);
        assert!(sketch.registers().iter().all(|&r| r == 7));
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(QSketch::new(8, &[], 0).is_err());
    }

    #[test]
    fn test_from_state_roundtrip() {
        let mut original = QSketch::new(8, &[], 6).unwrap();
        for i in 0..20 {
            original.update(&format!("e{i}"), 2.0);
        }
        let mut restored =
            QSketch::from_state(8, &original.seeds(), 6, &original.registers()).unwrap();
        original.update("next", 1.5);
        restored.update("next", 1.5);
        assert_eq!(original.registers(), restored.registers());
    }
}
