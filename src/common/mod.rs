//! Shared internal utilities.

pub(crate) mod random;
