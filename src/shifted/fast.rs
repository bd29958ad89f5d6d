use crate::error::Error;
use crate::hash::PERMUTATION_SEED;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::logexp::check_logarithm_base;
use crate::mle::GeometricMle;
use crate::perm::Permutation;
use crate::q::check_register_width;
use crate::seeds::SeedTable;
use crate::shifted::ShiftedRegisters;
use crate::sketch::Sketch;

/// Early-exit variant of
/// [`ShiftedLogExpSketch`](crate::shifted::ShiftedLogExpSketch).
///
/// Registers are visited in a per-element Fisher-Yates order while the
/// running partial sum `S += E_k / (m - k)` grows; each visited register
/// takes the quantized partial sum, and the update stops once `S`
/// reaches `k^(-(min_stored + offset))`, the mark value of the smallest
/// register. No fingerprint array is kept.
#[derive(Debug, Clone)]
pub struct FastShiftedLogExpSketch {
    seeds: SeedTable,
    bits: u8,
    base: f64,
    store: ShiftedRegisters,
    perm: Permutation,
    min_value: u64,
    threshold: f64,
    mle: GeometricMle,
}

impl FastShiftedLogExpSketch {
    /// Creates an empty sketch with `m` registers of `bits` bits each.
    pub fn new(m: usize, seeds: &[u32], bits: u8, base: f64) -> Result<Self, Error> {
        check_register_width(bits)?;
        check_logarithm_base(base)?;
        let seeds = SeedTable::new(m, seeds)?;
        let mut sketch = Self {
            seeds,
            bits,
            base,
            store: ShiftedRegisters::new(bits, m),
            perm: Permutation::new(m),
            min_value: 0,
            threshold: 0.0,
            mle: GeometricMle::new(base),
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
        base: f64,
        registers: &[u32],
        offset: i64,
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits, base)?;
        sketch.store = ShiftedRegisters::from_state(bits, m, registers, offset)?;
        sketch.update_threshold();
        Ok(sketch)
    }

    fn update_threshold(&mut self) {
        self.min_value = self.store.min_stored();
        let true_min = self.min_value as i64 + self.store.offset();
        self.threshold = self.base.powi(-(true_min as i32));
    }

    /// Number of registers.
    pub fn sketch_size(&self) -> usize {
        self.store.len()
    }

    /// Captured seed list; empty when the implicit rule is in use.
    pub fn seeds(&self) -> Vec<u32> {
        self.seeds.to_vec()
    }

    /// Register width in bits.
    pub fn amount_bits(&self) -> u8 {
        self.bits
    }

    /// Quantization base.
    pub fn logarithm_base(&self) -> f64 {
        self.base
    }

    /// Rebasing offset; true register value = stored + offset.
    pub fn offset(&self) -> i64 {
        self.store.offset()
    }

    /// Stored (unshifted) register values.
    pub fn registers(&self) -> Vec<u32> {
        self.store.to_vec()
    }
}

impl Sketch for FastShiftedLogExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        let m = self.store.len();
        let mut partial = 0.0;
        let mut min_touched = false;
        self.perm.reset(element_hash(elem, PERMUTATION_SEED));
        for k in 0..m {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(k)));
            let mark = -u.ln() / weight;
            partial += mark / (m - k) as f64;
            if partial >= self.threshold {
                break;
            }
            let j = self.perm.next(k);
            let q = (-(partial.ln() / self.base.ln())).floor() as i64;
            let old = self.store.stored(j);
            if self.store.raise(j, q) && old == self.min_value {
                min_touched = true;
            }
        }
        if min_touched {
            self.update_threshold();
        }
    }

    fn estimate(&self) -> f64 {
        self.mle.estimate(&self.store.values())
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + size_of::<u8>()
            + size_of::<f64>()
            + size_of::<i64>()
            + size_of::<u64>()
            + size_of::<f64>()
            + self.seeds.byte_size()
            + self.store.byte_size()
            + self.perm.byte_size_total()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<i64>()
            + size_of::<u64>()
            + size_of::<f64>()
            + self.store.byte_size()
            + self.perm.byte_size_write()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.store.byte_size() + size_of::<i64>() + size_of::<f64>()
    }
}
