//! Per-register hash seed assignment.

use crate::error::Error;
use crate::error::ErrorKind;

/// Seed table for a sketch's registers.
///
/// The common case is the implicit rule `seed(i) = i + 1`, which needs no
/// storage; an explicit table is only materialized when the caller supplies
/// seeds that do not follow that rule. A caller-supplied list that happens
/// to be exactly `1..=m` collapses to the implicit rule, so both spellings
/// capture identical state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeedTable {
    len: usize,
    repr: Repr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    Sequential,
    Explicit(Box<[u32]>),
}

impl SeedTable {
    /// Builds a seed table for `m` registers.
    ///
    /// `seeds` must be empty (implicit rule) or have length `m`.
    pub(crate) fn new(m: usize, seeds: &[u32]) -> Result<Self, Error> {
        if m == 0 {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                "sketch size 'm' must be positive",
            ));
        }
        if seeds.is_empty() {
            return Ok(Self {
                len: m,
                repr: Repr::Sequential,
            });
        }
        if seeds.len() != m {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                "seed list must be empty or have length m",
            )
            .with_context("m", m)
            .with_context("seeds", seeds.len()));
        }
        let sequential = seeds
            .iter()
            .enumerate()
            .all(|(i, &s)| s as usize == i + 1);
        let repr = if sequential {
            Repr::Sequential
        } else {
            Repr::Explicit(seeds.into())
        };
        Ok(Self { len: m, repr })
    }

    /// Seed assigned to register `index`.
    #[inline]
    pub(crate) fn get(&self, index: usize) -> u32 {
        match &self.repr {
            Repr::Sequential => index as u32 + 1,
            Repr::Explicit(seeds) => seeds[index],
        }
    }

    /// Bytes occupied by the table (zero under the implicit rule).
    pub(crate) fn byte_size(&self) -> usize {
        match &self.repr {
            Repr::Sequential => 0,
            Repr::Explicit(seeds) => seeds.len() * size_of::<u32>(),
        }
    }

    /// Captured seed list; empty when the implicit rule is in use.
    pub(crate) fn to_vec(&self) -> Vec<u32> {
        match &self.repr {
            Repr::Sequential => Vec::new(),
            Repr::Explicit(seeds) => seeds.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_rule() {
        let table = SeedTable::new(4, &[]).unwrap();
        assert_eq!(table.get(0), 1);
        assert_eq!(table.get(3), 4);
        assert_eq!(table.byte_size(), 0);
        assert!(table.to_vec().is_empty());
    }

    #[test]
    fn test_sequential_list_collapses() {
        let explicit = SeedTable::new(3, &[1, 2, 3]).unwrap();
        let implicit = SeedTable::new(3, &[]).unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_explicit_list() {
        let table = SeedTable::new(3, &[10, 20, 30]).unwrap();
        assert_eq!(table.get(1), 20);
        assert_eq!(table.byte_size(), 12);
        assert_eq!(table.to_vec(), vec![10, 20, 30]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = SeedTable::new(3, &[1, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = SeedTable::new(0, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
