//! Greedy-pruned sketch with a fill/prune state machine.

use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::PERMUTATION_SEED;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::perm::Permutation;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Register value meaning "never written".
const UNFILLED: f64 = -1.0;

/// Greedy-pruned variant of [`ExpSketch`](crate::exp::ExpSketch).
///
/// Registers start at a negative sentinel instead of infinity and the
/// sketch runs in one of two modes. While any register is unfilled every
/// visited register is written unconditionally; once the last sentinel
/// disappears the sketch switches to pruned mode permanently and tracks
/// the index of the maximum register, stopping each update as soon as the
/// running partial sum exceeds that maximum. Each update visits at most
/// `m - 1` permuted registers.
#[derive(Debug, Clone)]
pub struct FastGmExpSketch {
    seeds: SeedTable,
    registers: Vec<f64>,
    perm: Permutation,
    /// Index of the maximum register, meaningful only once pruned.
    j_star: usize,
    /// Number of registers still holding the sentinel.
    remaining: usize,
    pruned: bool,
}

fn argmax(registers: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in registers.iter().enumerate() {
        if v > registers[best] {
            best = i;
        }
    }
    best
}

impl FastGmExpSketch {
    /// Creates an empty sketch with `m` registers, all unfilled.
    pub fn new(m: usize, seeds: &[u32]) -> Result<Self, Error> {
        let seeds = SeedTable::new(m, seeds)?;
        Ok(Self {
            seeds,
            registers: vec![UNFILLED; m],
            perm: Permutation::new(m),
            j_star: 0,
            remaining: m,
            pruned: false,
        })
    }

    /// Reconstructs a sketch from previously captured state. The mode,
    /// unfilled count and maximum index are all recomputed from the
    /// registers.
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
        let remaining = registers.iter().filter(|&&v| v < 0.0).count();
        let j_star = argmax(&registers);
        Ok(Self {
            seeds,
            registers,
            perm: Permutation::new(m),
            j_star,
            remaining,
            pruned: remaining == 0,
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

    /// Raw register values, sentinel included.
    pub fn registers(&self) -> &[f64] {
        &self.registers
    }

    /// Structural Jaccard similarity via positional register equality.
    pub fn jaccard_struct(&self, other: &FastGmExpSketch) -> f64 {
        super::jaccard_equal_registers(&self.registers, &other.registers)
    }
}

impl Sketch for FastGmExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let m = self.registers.len();
        let inv_weight = 1.0 / weight;
        let mut partial = 0.0;
        self.perm.reset(element_hash(elem, PERMUTATION_SEED));
        for k in 0..m.saturating_sub(1) {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(k)));
            partial += -u.ln() * inv_weight / (m - k) as f64;
            let j = self.perm.next(k);
            if !self.pruned {
                if self.registers[j] < 0.0 {
                    self.registers[j] = partial;
                    self.remaining -= 1;
                    if self.remaining == 0 {
                        self.pruned = true;
                        self.j_star = argmax(&self.registers);
                    }
                } else if partial < self.registers[j] {
                    self.registers[j] = partial;
                }
            } else {
                if partial > self.registers[self.j_star] {
                    break;
                }
                if partial < self.registers[j] {
                    self.registers[j] = partial;
                    if j == self.j_star {
                        self.j_star = argmax(&self.registers);
                    }
                }
            }
        }
    }

    fn estimate(&self) -> f64 {
        if self.remaining == self.registers.len() {
            return 0.0;
        }
        let total: f64 = self.registers.iter().sum();
        (self.registers.len() as f64 - 1.0) / total
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + size_of::<usize>()
            + size_of::<usize>()
            + size_of::<bool>()
            + self.perm.byte_size_total()
            + self.seeds.byte_size()
            + self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<usize>()
            + size_of::<usize>()
            + size_of::<bool>()
            + self.perm.byte_size_write()
            + self.registers.len() * size_of::<f64>()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.len() * size_of::<f64>()
    }
}
