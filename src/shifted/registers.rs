use crate::compact::CompactVec;
use crate::error::Error;
use crate::error::ErrorKind;

/// Unsigned register store with a global rebasing offset.
///
/// True value of register `i` is `stored(i) + offset`. Stored cells live
/// in `0..=r_max` with `r_max = 2^b - 1`; the offset starts at
/// `-2^(b-1) + 1` so the initial all-zero store matches the other
/// quantized families' `r_min`.
#[derive(Debug, Clone)]
pub(crate) struct ShiftedRegisters {
    cells: CompactVec,
    offset: i64,
    r_max: u64,
}

impl ShiftedRegisters {
    pub(crate) fn new(bits: u8, m: usize) -> Self {
        Self {
            cells: CompactVec::new(u32::from(bits), m),
            offset: -(1i64 << (bits - 1)) + 1,
            r_max: (1u64 << bits) - 1,
        }
    }

    /// Rebuilds a store from captured stored values and offset.
    pub(crate) fn from_state(
        bits: u8,
        m: usize,
        values: &[u32],
        offset: i64,
    ) -> Result<Self, Error> {
        let mut store = Self::new(bits, m);
        if values.len() != m {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "register array length does not match sketch size",
            )
            .with_context("expected", m)
            .with_context("actual", values.len()));
        }
        for (i, &v) in values.iter().enumerate() {
            if u64::from(v) > store.r_max {
                return Err(Error::new(
                    ErrorKind::InvalidState,
                    "register value exceeds the stored range",
                )
                .with_context("index", i)
                .with_context("value", v)
                .with_context("r_max", store.r_max));
            }
            store.cells.set(i, u64::from(v));
        }
        store.offset = offset;
        Ok(store)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn offset(&self) -> i64 {
        self.offset
    }

    /// Stored (unshifted) value of register `index`.
    pub(crate) fn stored(&self, index: usize) -> u64 {
        self.cells.get(index)
    }

    pub(crate) fn min_stored(&self) -> u64 {
        self.cells.iter().min().unwrap_or(0)
    }

    /// True (shifted) register values.
    pub(crate) fn values(&self) -> Vec<i64> {
        self.cells.iter().map(|v| v as i64 + self.offset).collect()
    }

    /// Captured stored values.
    pub(crate) fn to_vec(&self) -> Vec<u32> {
        self.cells.iter().map(|v| v as u32).collect()
    }

    /// Raises register `index` to quantized value `q` if that improves it.
    ///
    /// Values below the current window are dropped, equal values are
    /// no-ops (an equal rewrite must not disturb fingerprint tie-breaks),
    /// and values above the stored range trigger a uniform rebase: every
    /// register shifts down by the overflow (floored at zero) and the
    /// offset absorbs it, preserving relative order. Returns whether the
    /// register changed.
    pub(crate) fn raise(&mut self, index: usize, q: i64) -> bool {
        if q < self.offset {
            return false;
        }
        let possible = q.saturating_sub(self.offset) as u64;
        if possible <= self.cells.get(index) {
            return false;
        }
        if possible > self.r_max {
            let shift = possible - self.r_max;
            for j in 0..self.cells.len() {
                self.cells.set(j, self.cells.get(j).saturating_sub(shift));
            }
            self.offset = self.offset.saturating_add(shift as i64);
            self.cells.set(index, self.r_max);
        } else {
            self.cells.set(index, possible);
        }
        true
    }

    pub(crate) fn byte_size(&self) -> usize {
        self.cells.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values_match_signed_r_min() {
        let store = ShiftedRegisters::new(6, 4);
        assert!(store.values().iter().all(|&v| v == -31));
    }

    #[test]
    fn test_raise_within_window() {
        let mut store = ShiftedRegisters::new(6, 4);
        assert!(store.raise(2, 0));
        assert_eq!(store.values()[2], 0);
        assert_eq!(store.offset(), -31);
    }

    #[test]
    fn test_equal_value_is_a_noop() {
        let mut store = ShiftedRegisters::new(6, 4);
        assert!(store.raise(1, 5));
        assert!(!store.raise(1, 5));
    }

    #[test]
    fn test_below_window_is_dropped() {
        let mut store = ShiftedRegisters::new(6, 4);
        assert!(!store.raise(0, -100));
        assert!(store.values().iter().all(|&v| v == -31));
    }

    #[test]
    fn test_rebase_preserves_relative_order() {
        let mut store = ShiftedRegisters::new(4, 4);
        // window is [-7, 8] before the rebase
        store.raise(0, -3);
        store.raise(1, 2);
        store.raise(2, 6);
        let before = store.values();
        assert!(store.raise(3, 20));
        assert_eq!(store.values()[3], 20);
        assert!(store.offset() > -7);
        let after = store.values();
        for (i, (b, a)) in before.iter().zip(after.iter()).enumerate() {
            // floored registers may rise to the new window bottom
            assert!(a >= b, "register {i}");
        }
        for pair in [(0usize, 1usize), (1, 2)] {
            assert!(after[pair.0] <= after[pair.1]);
        }
    }

    #[test]
    fn test_from_state_rejects_out_of_range_value() {
        let err = ShiftedRegisters::from_state(4, 2, &[3, 16], -7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
