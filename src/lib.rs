//! A library of streaming sketches for weighted cardinality estimation.
//!
//! Every sketch in this crate answers the same question over a stream of
//! `(element, weight)` pairs: what is the sum of weights over the
//! *distinct* elements, counting repeated elements once? The estimate is
//! approximate, the state is a small fixed-size register array, and a
//! single pass suffices. Unweighted distinct counting is the
//! `weight = 1.0` special case.
//!
//! All variants derive their randomness from keyed hashing of the element
//! itself, so they are deterministic: the same stream in any order of
//! duplicates produces the same state, and two sketches built with the
//! same configuration are directly comparable.
//!
//! The families differ in how a register is represented and how much work
//! an update does:
//!
//! - [`exp`]: continuous f64 registers, the baseline family; includes
//!   early-exit and greedy-pruned variants.
//! - [`q`]: base-2 quantized registers packed to `b` bits, estimates via
//!   a Newton-refined MLE; includes an early-exit variant and a
//!   single-register-per-update streaming variant.
//! - [`logexp`]: quantized with a configurable logarithm base, optionally
//!   carrying element fingerprints for Jaccard similarity.
//! - [`shifted`]: quantized with a global rebasing offset so the stored
//!   range tracks the live part of the value distribution.
//!
//! ```
//! use expsketch::Sketch;
//! use expsketch::exp::ExpSketch;
//!
//! let mut sketch = ExpSketch::new(256, &[])?;
//! for i in 0..1000 {
//!     sketch.update(&format!("user-{i}"), 2.5);
//! }
//! sketch.update("user-0", 2.5); // duplicates do not change the state
//! let estimate = sketch.estimate();
//! assert!((estimate - 2500.0).abs() / 2500.0 < 0.25);
//! # Ok::<(), expsketch::error::Error>(())
//! ```

pub mod error;
pub mod exp;
pub mod logexp;
pub mod q;
pub mod shifted;

mod common;
mod compact;
mod fingerprint;
mod hash;
mod mle;
mod perm;
mod seeds;
mod sketch;

pub use sketch::Sketch;
