//! Keyed hash oracle and unit-interval mapping shared by every variant.
//!
//! All pseudo-randomness in a sketch is derived from MurmurHash3 x64-128
//! keyed by a per-register seed, so replaying the same stream against the
//! same configuration reproduces the registers bit for bit.

/// Seed keying the per-element Fisher-Yates permutation, distinct from any
/// implicit register seed only by convention (register seeds start at 1 as
/// well, but feed a different code path).
pub(crate) const PERMUTATION_SEED: u32 = 1;

/// Seed keying the secondary fingerprint hash.
pub(crate) const FINGERPRINT_SEED: u32 = 42;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// First 64 bits of MurmurHash3 x64-128 of the element under `seed`.
#[inline]
pub(crate) fn element_hash(elem: &str, seed: u32) -> u64 {
    let (h1, _h2) = mur3::murmurhash3_x64_128(elem.as_bytes(), seed);
    h1
}

/// Maps a 64-bit hash onto `(0, 1]` via `(h + 1) / 2^64`.
///
/// The interval is open at zero so `-ln(u)` is always finite.
#[inline]
pub(crate) fn to_unit_interval(h: u64) -> f64 {
    (h as f64 + 1.0) / TWO_POW_64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval_bounds() {
        assert!(to_unit_interval(0) > 0.0);
        assert!(to_unit_interval(u64::MAX) <= 1.0);
        assert!((-to_unit_interval(0).ln()).is_finite());
    }

    #[test]
    fn test_hash_is_seed_keyed() {
        let a = element_hash("element", 1);
        let b = element_hash("element", 2);
        assert_ne!(a, b);
        assert_eq!(a, element_hash("element", 1));
    }
}
