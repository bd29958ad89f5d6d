//! Secondary fingerprint registers for structural Jaccard similarity.
//!
//! A fingerprint register records a small nonzero hash of the element that
//! most recently improved the corresponding main register. Two sketches
//! built from similar streams agree on a fraction of fingerprints close to
//! the Jaccard similarity of their inputs; the estimator corrects for the
//! birthday-collision rate of the small fingerprint space.

use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::hash::FINGERPRINT_SEED;
use crate::hash::element_hash;

#[derive(Debug, Clone)]
pub(crate) struct FingerprintArray {
    cells: CompactVec,
    bits: u32,
}

impl FingerprintArray {
    /// `bits` must be at least 2: the collision correction divides by
    /// `2^bits - 2`, and a 1-bit fingerprint has a single nonzero value.
    pub(crate) fn new(bits: u32, m: usize) -> Result<Self, Error> {
        if !(2..=32).contains(&bits) {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                "fingerprint width must be in 2..=32 bits",
            )
            .with_context("jaccard_bits", bits));
        }
        Ok(Self {
            cells: CompactVec::new(bits, m),
            bits,
        })
    }

    pub(crate) fn from_values(bits: u32, m: usize, values: &[u32]) -> Result<Self, Error> {
        let mut array = Self::new(bits, m)?;
        if values.len() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "fingerprint array length does not match sketch size",
            )
            .with_context("expected", m)
            .with_context("actual", values.len()));
        }
        for (i, &v) in values.iter().enumerate() {
            array.cells.set(i, v as u64);
        }
        Ok(array)
    }

    /// Records the element that just improved main register `index`.
    /// Stores a value in `1..=2^bits - 1`, so zero always means "never set".
    pub(crate) fn record(&mut self, index: usize, elem: &str) {
        let g_max = (1u64 << self.bits) - 1;
        let h = element_hash(elem, FINGERPRINT_SEED) % g_max + 1;
        self.cells.set(index, h);
    }

    /// Collision-corrected similarity of two fingerprint arrays.
    /// Returns 0.0 when the arrays have different lengths.
    pub(crate) fn jaccard(&self, other: &FingerprintArray) -> f64 {
        if self.cells.len() != other.cells.len() {
            return 0.0;
        }
        let mut equal = 0usize;
        for i in 0..self.cells.len() {
            let a = self.cells.get(i);
            if a != 0 && a == other.cells.get(i) {
                equal += 1;
            }
        }
        let p = equal as f64 / self.cells.len() as f64;
        let g_max = ((1u64 << self.bits) - 1) as f64;
        let jacc = (g_max * p - 1.0) / (g_max - 1.0);
        jacc.max(0.0)
    }

    pub(crate) fn to_vec(&self) -> Vec<u32> {
        self.cells.iter().map(|v| v as u32).collect()
    }

    pub(crate) fn byte_size_total(&self) -> usize {
        self.cells.byte_size() + size_of::<u8>()
    }

    pub(crate) fn byte_size_write(&self) -> usize {
        self.cells.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_nonzero() {
        let mut fp = FingerprintArray::new(8, 16).unwrap();
        for i in 0..16 {
            fp.record(i, &format!("elem-{i}"));
            let v = fp.cells.get(i);
            assert!((1..=255).contains(&v));
        }
    }

    #[test]
    fn test_self_similarity_is_one_when_full() {
        let mut fp = FingerprintArray::new(8, 32).unwrap();
        for i in 0..32 {
            fp.record(i, &format!("elem-{i}"));
        }
        let clone = fp.clone();
        assert!((fp.jaccard(&clone) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unset_cells_never_match() {
        let a = FingerprintArray::new(8, 8).unwrap();
        let b = FingerprintArray::new(8, 8).unwrap();
        // all-zero arrays share every position, but none count as matches
        assert_eq!(a.jaccard(&b), 0.0);
    }

    #[test]
    fn test_length_mismatch_is_zero() {
        let a = FingerprintArray::new(8, 8).unwrap();
        let b = FingerprintArray::new(8, 9).unwrap();
        assert_eq!(a.jaccard(&b), 0.0);
    }

    #[test]
    fn test_one_bit_width_rejected() {
        assert!(FingerprintArray::new(1, 8).is_err());
    }
}
