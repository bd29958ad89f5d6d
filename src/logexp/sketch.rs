use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::logexp::check_logarithm_base;
use crate::logexp::quantize_log;
use crate::mle::GeometricMle;
use crate::q::check_register_width;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Quantized sketch over an arbitrary logarithm base `k > 1`.
///
/// Register semantics match [`QSketch`](crate::q::QSketch) with the
/// quantization grid `floor(-log_k(E))` instead of base 2; the estimate is
/// the Newton-refined MLE fit with the same base.
#[derive(Debug, Clone)]
pub struct LogExpSketch {
    seeds: SeedTable,
    bits: u8,
    base: f64,
    r_max: i64,
    registers: CompactVec,
    mle: GeometricMle,
}

impl LogExpSketch {
    /// Creates an empty sketch with `m` registers of `bits` bits each,
    /// quantizing with logarithm base `base`.
    pub fn new(m: usize, seeds: &[u32], bits: u8, base: f64) -> Result<Self, Error> {
        check_register_width(bits)?;
        check_logarithm_base(base)?;
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
            base,
            r_max,
            registers,
            mle: GeometricMle::new(base),
        })
    }

    /// Reconstructs a sketch from previously captured state.
    pub fn from_state(
        m: usize,
        seeds: &[u32],
        bits: u8,
        base: f64,
        registers: &[i64],
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits, base)?;
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

    /// Quantization base.
    pub fn logarithm_base(&self) -> f64 {
        self.base
    }

    /// Unpacked register values.
    pub fn registers(&self) -> Vec<i64> {
        self.registers.iter_signed().collect()
    }
}

impl Sketch for LogExpSketch {
    fn update(&mut self, elem: &str, weight: f64) {
        for i in 0..self.registers.len() {
            let u = to_unit_interval(element_hash(elem, self.seeds.get(i)));
            let mark = -u.ln() / weight;
            let q = quantize_log(mark, self.base, self.r_max);
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
            + size_of::<f64>()
            + 2 * size_of::<i64>()
            + self.seeds.byte_size()
            + self.registers.byte_size()
    }

    fn memory_usage_write(&self) -> usize {
        self.registers.byte_size()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.byte_size() + size_of::<f64>()
    }
}
