//! Quantized base-2 sketch family.
//!
//! These sketches store `floor(-log2(E))` for the minimum exponential mark
//! `E` seen at each register, packed into `b`-bit signed cells instead of
//! full doubles. Quantization loses the closed-form harmonic estimator, so
//! cardinality is recovered by a Newton-refined maximum-likelihood fit over
//! the register values.
//!
//! Three variants share the register semantics:
//! - [`QSketch`] draws all `m` marks per update.
//! - [`FastQSketch`] visits registers in a per-element permutation and
//!   stops early once the running partial sum can no longer change any
//!   register.
//! - [`QSketchDyn`] touches a single register per update and keeps a value
//!   histogram, trading per-update work for an O(1) streaming estimate.

mod dynamic;
mod fast;
mod sketch;

pub use dynamic::QSketchDyn;
pub use fast::FastQSketch;
pub use sketch::QSketch;

use crate::error::Error;
use crate::error::ErrorKind;

/// Validates the register width for the signed quantized families.
pub(crate) fn check_register_width(bits: u8) -> Result<(), Error> {
    if bits == 0 || bits > 32 {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "register width 'b' must be in 1..=32",
        )
        .with_context("bits", bits));
    }
    Ok(())
}

/// Quantizes a mark to `floor(-log2(mark))`, clipped to `r_max`.
///
/// A zero mark maps to positive infinity before the clip; an infinite mark
/// saturates far below any representable register and never wins a
/// max-comparison.
#[inline]
pub(crate) fn quantize_base2(mark: f64, r_max: i64) -> i64 {
    let q = (-mark.log2()).floor();
    (q as i64).min(r_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_midrange() {
        assert_eq!(quantize_base2(0.25, 127), 2);
        assert_eq!(quantize_base2(1.0, 127), 0);
        assert_eq!(quantize_base2(5.0, 127), -3);
    }

    #[test]
    fn test_quantize_zero_mark_clips_to_r_max() {
        assert_eq!(quantize_base2(0.0, 127), 127);
    }

    #[test]
    fn test_quantize_infinite_mark_saturates_low() {
        assert!(quantize_base2(f64::INFINITY, 127) < -(1 << 30));
    }

    #[test]
    fn test_register_width_bounds() {
        assert!(check_register_width(0).is_err());
        assert!(check_register_width(8).is_ok());
        assert!(check_register_width(33).is_err());
    }
}
