//! Baseline all-registers continuous sketch.

use crate::error::Error;
use crate::error::ErrorKind;
use crate::exp::jaccard_equal_registers;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Baseline weighted cardinality sketch with continuous registers.
///
/// Each update draws one exponential mark per register and keeps the
/// minimum. Under the weighted-exponential model every register minimum is
/// itself exponential with rate equal to the total weight, so the estimate
/// takes the closed form `(m - 1) / sum(registers)`.
#[derive(Debug, Clone)]
pub struct ExpSketch {
    seeds: SeedTable,
    registers: Vec<f64>,
}

impl ExpSketch {
    /// Creates an empty sketch with `m` registers.
    ///
    /// `seeds` must be empty (implicit rule `seed(i) = i + 1`) or have
    /// length `m`.
    pub fn new(m: usize, seeds: &[u32]) -> Result<Self, Error> {
        let seeds = SeedTable::new(m, seeds)?;
        Ok(Self {
            seeds,
            registers: vec![f64::INFINITY; m],
        })
    }

    /// Reconstructs a sketch from previously captured state.
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
        Ok(Self { seeds, registers })
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

    /// Structural Jaccard similarity: the fraction of positionally equal
    /// registers. Returns 0.0 when the sketch sizes differ.
    pub fn jaccard_struct(&self, other: &ExpSketch) -> f64 {
        jaccard_equal_registers(&self.registers, &other.registers)
    }
}

impl Sketch for ExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let inv_weight = 1.0 / weight;
        for (i, register) in self.registers.iter_mut().enumerate() {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(i)));
            let mark = -u.ln() * inv_weight;
            if mark < *register {
                *register = mark;
            }
        }
    }

    /// `(m - 1) / sum(registers)`; 0.0 before the first update since the
    /// register sum is infinite.
    fn estimate(&self) -> f64 {
        let total: f64 = self.registers.iter().sum();
        (self.registers.len() as f64 - 1.0) / total
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>() + self.seeds.byte_size() + self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_write(&self) -> usize {
        self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.len() * size_of::<f64>()
    }
}
