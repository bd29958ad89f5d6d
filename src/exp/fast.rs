//! Early-exit continuous sketch.

use crate::error::Error;
use crate::error::ErrorKind;
use crate::exp::jaccard_equal_registers;
use crate::hash::PERMUTATION_SEED;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::perm::Permutation;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Early-exit variant of [`ExpSketch`](crate::exp::ExpSketch).
///
/// Registers are visited in a per-element Fisher-Yates order while a
/// running partial sum `S += E_k / (m - k)` reproduces the order
/// statistics of `m` independent exponential marks. The partial sum only
/// grows, so the update stops as soon as it reaches the current maximum
/// register: no later register could be improved. Once most registers are
/// small this makes updates sublinear in `m`, at the cost of one extra
/// permutation-seeding hash.
#[derive(Debug, Clone)]
pub struct FastExpSketch {
    seeds: SeedTable,
    registers: Vec<f64>,
    perm: Permutation,
    max: f64,
}

fn max_register(registers: &[f64]) -> f64 {
    registers.iter().fold(f64::NEG_INFINITY, |acc, &v| acc.max(v))
}

impl FastExpSketch {
    /// Creates an empty sketch with `m` registers.
    pub fn new(m: usize, seeds: &[u32]) -> Result<Self, Error> {
        let seeds = SeedTable::new(m, seeds)?;
        Ok(Self {
            seeds,
            registers: vec![f64::INFINITY; m],
            perm: Permutation::new(m),
            max: f64::INFINITY,
        })
    }

    /// Reconstructs a sketch from previously captured state. The pruning
    /// threshold is recomputed from the registers, so future updates behave
    /// identically to the sketch the state was captured from.
    pub fn from_state(m: usize, seeds: &[u32], registers: Vec<f64>) -> Result<Self, Error> {
        let seeds = SeedTable::new(m, seeds)?;
        if registers.len() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "register array length does not match sketch size",
            )
            .with_context("expected", m)
            .with_context("actual", registers.len()));
        }
        let max = max_register(&registers);
        Ok(Self {
            seeds,
            registers,
            perm: Permutation::new(m),
            max,
        })
    }

    /// Number of registers.
    pub fn sketch_size(&self) -> usize {
        self.registers.len()
    }

    /// Captured seed list; empty when the implicit rule is in use.
    pub fn seeds(&self) -> Vec<u32> {
        self.seeds.to_vec()
    }

    /// Raw register values.
    pub fn registers(&self) -> &[f64] {
        &self.registers
    }

    /// Structural Jaccard similarity via positional register equality.
    pub fn jaccard_struct(&self, other: &FastExpSketch) -> f64 {
        jaccard_equal_registers(&self.registers, &other.registers)
    }
}

impl Sketch for FastExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let m = self.registers.len();
        let inv_weight = 1.0 / weight;
        let mut partial = 0.0;
        let mut max_touched = false;
        self.perm.reset(element_hash(elem, PERMUTATION_SEED));
        for k in 0..m {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(k)));
            partial += -u.ln() * inv_weight / (m - k) as f64;
            if partial >= self.max {
                break;
            }
            let j = self.perm.next(k);
            if self.registers[j] == self.max {
                max_touched = true;
            }
            if partial < self.registers[j] {
                self.registers[j] = partial;
            }
        }
        // rescanning is only needed when the threshold holder was overwritten
        if max_touched {
            self.max = max_register(&self.registers);
        }
    }

    fn estimate(&self) -> f64 {
        let total: f64 = self.registers.iter().sum();
        (self.registers.len() as f64 - 1.0) / total
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + self.perm.byte_size_total()
            + size_of::<f64>()
            + self.seeds.byte_size()
            + self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<f64>() + self.perm.byte_size_write() + self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.len() * size_of::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_update_leaves_registers_unchanged() {
        let mut sketch = FastExpSketch::new(16, &[]).unwrap();
        sketch.update("element", 2.0);
        let snapshot = sketch.registers().to_vec();
        sketch.update("element", 2.0);
        assert_eq!(sketch.registers(), snapshot.as_slice());
    }

    #[test]
    fn test_threshold_tracks_register_maximum() {
        let mut sketch = FastExpSketch::new(8, &[]).unwrap();
        for i in 0..100 {
            sketch.update(&format!("e{i}"), 1.0);
        }
        assert_eq!(sketch.max, max_register(&sketch.registers));
    }

    #[test]
    fn test_restored_sketch_matches_original_going_forward() {
        let mut original = FastExpSketch::new(16, &[]).unwrap();
        for i in 0..32 {
            original.update(&format!("e{i}"), 1.0 + i as f64);
        }
        let mut restored = FastExpSketch::from_state(
            original.sketch_size(),
            &original.seeds(),
            original.registers().to_vec(),
        )
        .unwrap();
        original.update("next", 3.0);
        restored.update("next", 3.0);
        assert_eq!(original.registers(), restored.registers());
    }

    #[test]
    fn test_empty_estimate_is_zero() {
        let sketch = FastExpSketch::new(8, &[]).unwrap();
        assert_eq!(sketch.estimate(), 0.0);
    }
}
