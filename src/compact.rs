//! Fixed-width bit-packed register storage.
//!
//! Registers of `b` bits each are packed contiguously into `u64` words,
//! bounding a sketch's register storage to `m * b` bits instead of `m`
//! machine words. Cells may span a word boundary; get and set stay O(1).

/// Bit-packed array of `len` cells, each `width` bits wide.
#[derive(Debug, Clone)]
pub(crate) struct CompactVec {
    width: u32,
    len: usize,
    words: Box<[u64]>,
}

impl CompactVec {
    /// Creates a zero-filled array. `width` must be in `1..=64`.
    pub(crate) fn new(width: u32, len: usize) -> Self {
        debug_assert!((1..=64).contains(&width));
        let total_bits = len * width as usize;
        let words = vec![0u64; total_bits.div_ceil(64)].into_boxed_slice();
        Self { width, len, words }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Returns the cell at `index` as an unsigned value.
    #[inline]
    pub(crate) fn get(&self, index: usize) -> u64 {
        debug_assert!(index < self.len);
        let bit = index * self.width as usize;
        let word = bit / 64;
        let offset = (bit % 64) as u32;
        let mut value = self.words[word] >> offset;
        let spilled = offset + self.width;
        if spilled > 64 {
            value |= self.words[word + 1] << (64 - offset);
        }
        value & self.mask()
    }

    /// Stores `value` (masked to `width` bits) at `index`.
    #[inline]
    pub(crate) fn set(&mut self, index: usize, value: u64) {
        debug_assert!(index < self.len);
        let value = value & self.mask();
        let bit = index * self.width as usize;
        let word = bit / 64;
        let offset = (bit % 64) as u32;
        self.words[word] &= !(self.mask() << offset);
        self.words[word] |= value << offset;
        let spilled = offset + self.width;
        if spilled > 64 {
            let high_bits = spilled - 64;
            let low_bits = self.width - high_bits;
            self.words[word + 1] &= !((1u64 << high_bits) - 1);
            self.words[word + 1] |= value >> low_bits;
        }
    }

    /// Returns the cell at `index` sign-extended from `width` bits.
    #[inline]
    pub(crate) fn get_signed(&self, index: usize) -> i64 {
        let value = self.get(index);
        if self.width < 64 && value >> (self.width - 1) & 1 == 1 {
            (value | !self.mask()) as i64
        } else {
            value as i64
        }
    }

    /// Stores a signed value as two's complement within `width` bits.
    #[inline]
    pub(crate) fn set_signed(&mut self, index: usize, value: i64) {
        self.set(index, value as u64);
    }

    /// Sets every cell to `value`.
    pub(crate) fn fill(&mut self, value: u64) {
        for i in 0..self.len {
            self.set(i, value);
        }
    }

    /// Copies all cells from `other`, which must have identical shape.
    pub(crate) fn copy_from(&mut self, other: &CompactVec) {
        debug_assert!(self.width == other.width && self.len == other.len);
        self.words.copy_from_slice(&other.words);
    }

    /// Packed size in bytes: `ceil(len * width / 8)`.
    pub(crate) fn byte_size(&self) -> usize {
        (self.len * self.width as usize).div_ceil(8)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(|i| self.get(i))
    }

    pub(crate) fn iter_signed(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len).map(|i| self.get_signed(i))
    }
}
