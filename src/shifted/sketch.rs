use crate::error::Error;
use crate::fingerprint::FingerprintArray;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::logexp::check_logarithm_base;
use crate::mle::GeometricMle;
use crate::q::check_register_width;
use crate::seeds::SeedTable;
use crate::shifted::ShiftedRegisters;
use crate::sketch::Sketch;

/// Rebasing quantized sketch with element fingerprints.
///
/// Registers are unsigned `b`-bit cells over a global offset (see the
/// module docs); the quantization grid is `floor(-log_k(E))` for the
/// configured base. Every register improvement records the winning
/// element's fingerprint for Jaccard estimation, and because equal-value
/// rewrites are dropped before they reach the store, a tie never swaps an
/// already-recorded fingerprint.
#[derive(Debug, Clone)]
pub struct ShiftedLogExpSketch {
    seeds: SeedTable,
    bits: u8,
    base: f64,
    jaccard_bits: u8,
    store: ShiftedRegisters,
    fingerprints: FingerprintArray,
    mle: GeometricMle,
}

impl ShiftedLogExpSketch {
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
        Ok(Self {
            seeds,
            bits,
            base,
            jaccard_bits,
            store: ShiftedRegisters::new(bits, m),
            fingerprints,
            mle: GeometricMle::new(base),
        })
    }

    /// Reconstructs a sketch from previously captured state: stored
    /// register values, the rebasing offset and the fingerprints.
    #[allow(clippy::too_many_arguments)]
    pub fn from_state(
        m: usize,
        seeds: &[u32],
        bits: u8,
        base: f64,
        jaccard_bits: u8,
        registers: &[u32],
        offset: i64,
        fingerprints: &[u32],
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits, base, jaccard_bits)?;
        sketch.store = ShiftedRegisters::from_state(bits, m, registers, offset)?;
        sketch.fingerprints =
            FingerprintArray::from_values(u32::from(jaccard_bits), m, fingerprints)?;
        Ok(sketch)
    }

    /// Fingerprint-based Jaccard similarity estimate against `other`.
    /// Returns 0.0 when the sketch sizes differ.
    pub fn jaccard_struct(&self, other: &ShiftedLogExpSketch) -> f64 {
        self.fingerprints.jaccard(&other.fingerprints)
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

    /// Fingerprint width in bits.
    pub fn amount_bits_jaccard(&self) -> u8 {
        self.jaccard_bits
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

    /// Unpacked fingerprint values.
    pub fn fingerprints(&self) -> Vec<u32> {
        self.fingerprints.to_vec()
    }
}

impl Sketch for ShiftedLogExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        for i in 0..self.store.len() {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(i)));
            let mark = -u.ln() / weight;
            let q = (-(mark.ln() / self.base.ln())).floor() as i64;
            if self.store.raise(i, q) {
                self.fingerprints.record(i, elem);
            }
        }
    }

    fn estimate(&self) -> f64 {
        self.mle.estimate(&self.store.values())
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + 2 * size_of::<u8>()
            + size_of::<f64>()
            + size_of::<i64>()
            + self.seeds.byte_size()
            + self.store.byte_size()
            + self.fingerprints.byte_size_total()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<i64>() + self.store.byte_size() + self.fingerprints.byte_size_write()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.store.byte_size() + size_of::<i64>() + size_of::<f64>()
    }
}
