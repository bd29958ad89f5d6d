//! Capability surface shared by every sketch variant.

use crate::error::Error;
use crate::error::ErrorKind;

/// Streaming operations common to the whole sketch family.
///
/// Variants differ in register semantics and update policy but share this
/// surface. `update` is infallible by design: all validation happens at
/// construction or at the batch entry point, never inside the hot path.
pub trait Sketch {
    /// Folds one element with the given weight into the sketch.
    ///
    /// A plain distinct count is the `weight = 1.0` special case.
    fn update(&mut self, elem: &str, weight: f64);

    /// Folds a batch of `(element, weight)` pairs into the sketch.
    ///
    /// Both slices are validated before any register is touched, so a
    /// length mismatch leaves the sketch unchanged.
    fn update_many(&mut self, elems: &[&str], weights: &[f64]) -> Result<(), Error> {
        if elems.len() != weights.len() {
            return Err(Error::new(
                ErrorKind::LengthMismatch,
                "elements and weights must have equal length",
            )
            .with_context("elements", elems.len())
            .with_context("weights", weights.len()));
        }
        for (elem, &weight) in elems.iter().zip(weights) {
            self.update(elem, weight);
        }
        Ok(())
    }

    /// Current weighted-cardinality estimate.
    ///
    /// Always approximate and never errors; an estimate on a sketch that
    /// saw no updates is a documented per-variant sentinel, not a failure.
    fn estimate(&self) -> f64;

    /// Full in-memory footprint in bytes, including transient buffers.
    fn memory_usage_total(&self) -> usize;

    /// Bytes that must be persisted to reconstruct the sketch exactly.
    fn memory_usage_write(&self) -> usize;

    /// Bytes sufficient to recompute the cardinality estimate alone.
    fn memory_usage_estimate(&self) -> usize;
}
