//! Quantized sketch family with a rebasing register range.
//!
//! The other quantized families spend one bit of every register on sign
//! and pin the representable range at construction time. These sketches
//! store unsigned `b`-bit cells plus one global signed `offset`; the true
//! quantized value of a register is `stored + offset`. When a new value
//! would overflow the stored range, every register is shifted down
//! uniformly (floored at zero) and the offset absorbs the difference, so
//! the full `2^b` range tracks the live part of the distribution instead
//! of a fixed window.

mod fast;
mod registers;
mod sketch;

pub use fast::FastShiftedLogExpSketch;
pub use sketch::ShiftedLogExpSketch;

pub(crate) use registers::ShiftedRegisters;
