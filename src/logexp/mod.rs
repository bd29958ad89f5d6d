//! Quantized sketch family with a configurable logarithm base.
//!
//! Where the base-2 family fixes its quantization grid, these sketches
//! quantize marks as `floor(-log_k(E))` for a configured base `k > 1`.
//! A base close to 1 packs the grid tighter (more register bits for the
//! same dynamic range, lower quantization error); a larger base trades
//! accuracy for range. The MLE machinery is shared with the base-2
//! family, parameterized by `k`.

mod jaccard;
mod sketch;

pub use jaccard::LogExpJaccSketch;
pub use sketch::LogExpSketch;

use crate::error::Error;
use crate::error::ErrorKind;

pub(crate) fn check_logarithm_base(base: f64) -> Result<(), Error> {
    if !(base > 1.0) || !base.is_finite() {
        return Err(Error::new(
            ErrorKind::ConfigInvalid,
            "logarithm base 'k' must be finite and greater than 1",
        )
        .with_context("base", base));
    }
    Ok(())
}

/// Quantizes a mark to `floor(-log_k(mark))`, clipped to `r_max`.
#[inline]
pub(crate) fn quantize_log(mark: f64, base: f64, r_max: i64) -> i64 {
    let q = (-(mark.ln() / base.ln())).floor();
    (q as i64).min(r_max)
}
