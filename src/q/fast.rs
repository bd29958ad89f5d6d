use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::PERMUTATION_SEED;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::mle::GeometricMle;
use crate::perm::Permutation;
use crate::q::check_register_width;
use crate::q::quantize_base2;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Early-exit variant of [`QSketch`](crate::q::QSketch).
///
/// Registers are visited in a per-element Fisher-Yates order while the
/// running partial sum `S += E_k / (m - k)` grows; the quantized value
/// stored is `floor(-log2(S))`, which only falls as `S` grows. Once `S`
/// reaches `2^(-min_register)` no register can improve and the update
/// stops. The threshold is recomputed only when a register holding the
/// minimum is overwritten.
#[derive(Debug, Clone)]
pub struct FastQSketch {
    seeds: SeedTable,
    bits: u8,
    r_min: i64,
    r_max: i64,
    registers: CompactVec,
    perm: Permutation,
    min_value: i64,
    threshold: f64,
    mle: GeometricMle,
}

impl FastQSketch {
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
        let mut sketch = Self {
            seeds,
            bits,
            r_min,
            r_max,
            registers,
            perm: Permutation::new(m),
            min_value: 0,
            threshold: 0.0,
            mle: GeometricMle::new(2.0),
        };
        sketch.update_threshold();
        Ok(sketch)
    }

    /// Reconstructs a sketch from previously captured state. The pruning
    /// threshold is recomputed from the registers.
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
        sketch.update_threshold();
        Ok(sketch)
    }

    fn update_threshold(&mut self) {
        self.min_value = self.registers.iter_signed().min().unwrap_or(self.r_min);
        self.threshold = (-(self.min_value as f64)).exp2();
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

impl Sketch for FastQSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let m = self.registers.len();
        let inv_weight = 1.0 / weight;
        let mut partial = 0.0;
        let mut min_touched = false;
        self.perm.reset(element_hash(elem, PERMUTATION_SEED));
        for k in 0..m {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(k)));
            partial += -u.ln() * inv_weight / (m - k) as f64;
            if partial >= self.threshold {
                break;
            }
            let j = self.perm.next(k);
            let q = quantize_base2(partial, self.r_max);
            if q > self.registers.get_signed(j) {
                if self.registers.get_signed(j) == self.min_value {
                    min_touched = true;
                }
                self.registers.set_signed(j, q);
            }
        }
        if min_touched {
            self.update_threshold();
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
            + size_of::<i64>()
            + size_of::<f64>()
            + self.seeds.byte_size()
            + self.registers.byte_size()
            + self.perm.byte_size_total()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<i64>()
            + size_of::<f64>()
            + self.registers.byte_size()
            + self.perm.byte_size_write()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_tracks_register_minimum() {
        let mut sketch = FastQSketch::new(16, &[], 8).unwrap();
        for i in 0..200 {
            sketch.update(&format!("e{i}"), 1.0);
        }
        let min = sketch.registers().into_iter().min().unwrap();
        assert_eq!(sketch.min_value, min);
        assert_eq!(sketch.threshold, (-(min as f64)).exp2());
    }

    #[test]
    fn test_duplicate_update_leaves_registers_unchanged() {
        let mut sketch = FastQSketch::new(16, &[], 8).unwrap();
        sketch.update("element", 3.0);
        let snapshot = sketch.registers();
        sketch.update("element", 3.0);
        assert_eq!(sketch.registers(), snapshot);
    }

    #[test]
    fn test_restored_sketch_matches_original_going_forward() {
        let mut original = FastQSketch::new(16, &[], 8).unwrap();
        for i in 0..50 {
            original.update(&format!("e{i}"), 1.0 + i as f64);
        }
        let mut restored =
            FastQSketch::from_state(16, &original.seeds(), 8, &original.registers()).unwrap();
        original.update("next", 2.5);
        restored.update("next", 2.5);
        assert_eq!(original.registers(), restored.registers());
    }

    #[test]
    fn test_registers_never_decrease() {
        let mut sketch = FastQSketch::new(8, &[], 6).unwrap();
        let mut previous = sketch.registers();
        for i in 0..80 {
            sketch.update(&format!("e{i}"), 0.5);
            let current = sketch.registers();
            for (p, c) in previous.iter().zip(current.iter()) {
                assert!(c >= p);
            }
            previous = current;
        }
    }
}
