use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::element_hash;
use crate::hash::to_unit_interval;
use crate::q::check_register_width;
use crate::seeds::SeedTable;
use crate::sketch::Sketch;

/// Single-register streaming variant of the quantized family.
///
/// Each update hashes the element to exactly one register via a global
/// routing seed, so per-update cost is independent of `m`. A histogram of
/// quantized values is kept alongside the registers
/// (`sum(histogram) == m` always); whenever a register changes, the
/// histogram yields the probability `q_r` that an element of this weight
/// would have changed some register, and `weight / q_r` is added to a
/// running cardinality accumulator. `estimate()` returns the accumulator,
/// making the estimate O(1) with no Newton refinement.
///
/// The representable range is `[-2^(b-1), 2^(b-1) - 1]`; the lower bound
/// sits one below the other quantized variants because the initial value
/// occupies its own histogram bucket.
#[derive(Debug, Clone)]
pub struct QSketchDyn {
    seeds: SeedTable,
    bits: u8,
    g_seed: u32,
    r_min: i64,
    r_max: i64,
    registers: CompactVec,
    histogram: Vec<u32>,
    cardinality: f64,
}

impl QSketchDyn {
    /// Creates an empty sketch with `m` registers of `bits` bits each.
    /// `g_seed` keys the element-to-register routing hash.
    pub fn new(m: usize, seeds: &[u32], bits: u8, g_seed: u32) -> Result<Self, Error> {
        check_register_width(bits)?;
        let seeds = SeedTable::new(m, seeds)?;
        let r_min = -(1i64 << (bits - 1));
        let r_max = (1i64 << (bits - 1)) - 1;
        let mut registers = CompactVec::new(u32::from(bits), m);
        for i in 0..m {
            registers.set_signed(i, r_min);
        }
        let mut histogram = vec![0u32; 1usize << bits];
        histogram[0] = m as u32;
        Ok(Self {
            seeds,
            bits,
            g_seed,
            r_min,
            r_max,
            registers,
            histogram,
            cardinality: 0.0,
        })
    }

    /// Reconstructs a sketch from previously captured state. The histogram
    /// must describe the registers exactly.
    pub fn from_state(
        m: usize,
        seeds: &[u32],
        bits: u8,
        g_seed: u32,
        registers: &[i64],
        histogram: &[u32],
        cardinality: f64,
    ) -> Result<Self, Error> {
        let mut sketch = Self::new(m, seeds, bits, g_seed)?;
        if registers.len() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "register array length does not match sketch size",
            )
            .with_context("expected", m)
            .with_context("actual", registers.len()));
        }
        if histogram.len() != 1usize << bits {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "histogram length does not match register width",
            )
            .with_context("expected", 1usize << bits)
            .with_context("actual", histogram.len()));
        }
        if histogram.iter().map(|&c| c as usize).sum::<usize>() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "histogram counts do not sum to the sketch size",
            )
            .with_context("m", m));
        }
        for (i, &r) in registers.iter().enumerate() {
            sketch.registers.set_signed(i, r);
        }
        sketch.histogram.copy_from_slice(histogram);
        sketch.cardinality = cardinality;
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

    /// Routing seed.
    pub fn g_seed(&self) -> u32 {
        self.g_seed
    }

    /// Unpacked register values.
    pub fn registers(&self) -> Vec<i64> {
        self.registers.iter_signed().collect()
    }

    /// Counts of registers per quantized value, indexed by `value - r_min`.
    pub fn histogram(&self) -> &[u32] {
        &self.histogram
    }

    /// Running cardinality accumulator.
    pub fn cardinality(&self) -> f64 {
        self.cardinality
    }

    /// Probability that an element of `weight` changes some register,
    /// given the current histogram.
    fn change_probability(&self, weight: f64) -> f64 {
        let m = self.registers.len() as f64;
        let mut survivors = 0.0;
        for (v, &count) in self.histogram.iter().enumerate() {
            if count > 0 {
                let scale = (-((v as i64 + self.r_min + 1) as f64)).exp2();
                survivors += f64::from(count) * (-weight * scale).exp();
            }
        }
        1.0 - survivors / m
    }
}

impl Sketch for QSketchDyn {
    fn update(&mut self, elem: &str, weight: f64) {
        let m = self.registers.len();
        let j = (element_hash(elem, self.g_seed) % m as u64) as usize;
        let u = to_unit_interval(element_hash(elem, self.seeds.get(j)));
        let mark = -u.ln() / weight;
        let y = (-mark.log2()).floor() as i64;

        let old = self.registers.get_signed(j);
        if y <= old {
            return;
        }
        let new = y.min(self.r_max);

        let old_idx = (old - self.r_min) as usize;
        let new_idx = (new - self.r_min) as usize;
        if self.histogram[old_idx] > 0 {
            self.histogram[old_idx] -= 1;
        }
        self.histogram[new_idx] += 1;
        self.registers.set_signed(j, new);

        let q_r = self.change_probability(weight);
        self.cardinality += weight / q_r;
    }

    fn estimate(&self) -> f64 {
        self.cardinality
    }

    fn memory_usage_total(&self) -> usize {
        size_of::<usize>()
            + size_of::<u8>()
            + 2 * size_of::<i64>()
            + size_of::<u32>()
            + size_of::<f64>()
            + self.seeds.byte_size()
            + self.registers.byte_size()
            + self.histogram.len() * size_of::<u32>()
    }

    fn memory_usage_write(&self) -> usize {
        size_of::<f64>()
            + self.registers.byte_size()
            + self.histogram.len() * size_of::<u32>()
    }

    fn memory_usage_estimate(&self) -> usize {
        self.registers.byte_size() + self.histogram.len() * size_of::<u32>()
    }
}
