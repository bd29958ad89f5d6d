//! Per-element deterministic register visitation order.
//!
//! The early-exit variants visit registers in a Fisher-Yates permutation
//! keyed by the element hash. The identity template is immutable; the
//! working copy is reset from it at the start of every update, so updates
//! never allocate. Both buffers are bit-packed to `ceil(log2 m)` bits per
//! index.

use crate::common::random::XorShift64;
use crate::compact::CompactVec;

#[derive(Debug, Clone)]
pub(crate) struct Permutation {
    template: CompactVec,
    scratch: CompactVec,
    rng: XorShift64,
}

fn index_width(m: usize) -> u32 {
    (m.max(2) - 1).ilog2() + 1
}

impl Permutation {
    pub(crate) fn new(m: usize) -> Self {
        let mut template = CompactVec::new(index_width(m), m);
        for i in 0..m {
            template.set(i, i as u64);
        }
        let scratch = template.clone();
        Self {
            template,
            scratch,
            rng: XorShift64::seeded(0),
        }
    }

    /// Re-seeds the generator and resets the scratch order to the identity.
    /// Called once at the start of every update.
    pub(crate) fn reset(&mut self, seed: u64) {
        self.rng = XorShift64::seeded(seed);
        self.scratch.copy_from(&self.template);
    }

    /// Performs the `k`-th Fisher-Yates swap and returns the register index
    /// visited at position `k`.
    pub(crate) fn next(&mut self, k: usize) -> usize {
        let r = self.rng.next_index(k, self.template.len());
        let swap = self.scratch.get(k);
        self.scratch.set(k, self.scratch.get(r));
        self.scratch.set(r, swap);
        self.scratch.get(k) as usize
    }

    /// Footprint of both index buffers.
    pub(crate) fn byte_size_total(&self) -> usize {
        self.template.byte_size() + self.scratch.byte_size()
    }

    /// Footprint of the working buffer alone.
    pub(crate) fn byte_size_write(&self) -> usize {
        self.scratch.byte_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(perm: &mut Permutation, seed: u64, m: usize) -> Vec<usize> {
        perm.reset(seed);
        (0..m).map(|k| perm.next(k)).collect()
    }

    #[test]
    fn test_visits_every_register_once() {
        let m = 37;
        let mut perm = Permutation::new(m);
        let mut order = drain(&mut perm, 12345, m);
        order.sort_unstable();
        assert_eq!(order, (0..m).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_order() {
        let m = 16;
        let mut perm = Permutation::new(m);
        let first = drain(&mut perm, 77, m);
        let second = drain(&mut perm, 77, m);
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let m = 64;
        let mut perm = Permutation::new(m);
        let a = drain(&mut perm, 1, m);
        let b = drain(&mut perm, 2, m);
        assert_ne!(a, b);
    }

    #[test]
    fn test_single_register() {
        let mut perm = Permutation::new(1);
        perm.reset(5);
        assert_eq!(perm.next(0), 0);
    }

    #[test]
    fn test_index_width() {
        assert_eq!(index_width(1), 1);
        assert_eq!(index_width(2), 1);
        assert_eq!(index_width(8), 3);
        assert_eq!(index_width(9), 4);
        assert_eq!(index_width(1024), 10);
    }
}
