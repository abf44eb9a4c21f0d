//! Block partition arithmetic mapping global ids to `(owner, local index)`.
//!
//! `n` ids are split into `npes` contiguous blocks of `width = n / npes`;
//! the tail rank absorbs the remainder, so only its logical block may be
//! larger (`max_width`). Symmetric storage is always sized `max_width` on
//! every rank and the unused tail entries on non-tail ranks are padding.
//!
//! When `n < npes` the block width is zero and every id collapses onto the
//! tail rank; all helpers honor that degenerate case.

use crate::graph::NodeId;

/// Block partition of `[0, n)` over `npes` ranks, specialized to rank `pe`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Total number of ids partitioned.
    pub n: usize,
    /// This rank.
    pub pe: usize,
    /// Group size.
    pub npes: usize,
    /// Block width of every non-tail rank, `n / npes`.
    pub width: usize,
    /// Logical width of the tail rank; the symmetric allocation size.
    pub max_width: usize,
    /// First id owned by this rank.
    pub start: NodeId,
    /// One past the last id owned by this rank.
    pub end: NodeId,
}

impl Partition {
    /// Partition `n` ids over the rank's group.
    pub fn new(n: usize, rank: &crate::runtime::Rank) -> Self {
        Self::with_shape(n, rank.pe(), rank.npes())
    }

    /// Partition with explicit shape; the arithmetic core.
    pub fn with_shape(n: usize, pe: usize, npes: usize) -> Self {
        debug_assert!(pe < npes);
        let width = n / npes;
        let max_width = n - (npes - 1) * width;
        let start = (pe * width) as NodeId;
        let end = if pe == npes - 1 {
            n as NodeId
        } else {
            start + width as NodeId
        };
        Partition {
            n,
            pe,
            npes,
            width,
            max_width,
            start,
            end,
        }
    }

    /// Owning rank of global id `x`.
    #[inline]
    pub fn owner(&self, x: NodeId) -> usize {
        debug_assert!(x >= 0 && (x as usize) < self.n, "id {x} outside partition");
        if self.width == 0 {
            self.npes - 1
        } else {
            ((x as usize) / self.width).min(self.npes - 1)
        }
    }

    /// Index of `x` within its owner's block.
    #[inline]
    pub fn local_pos(&self, x: NodeId) -> usize {
        (x as usize) - self.owner(x) * self.width
    }

    /// Number of ids this rank actually owns (`<= max_width`).
    #[inline]
    pub fn local_width(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// True when this rank owns `x`.
    #[inline]
    pub fn contains(&self, x: NodeId) -> bool {
        x >= self.start && x < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tail_absorbs_remainder() {
        let p = Partition::with_shape(10, 3, 4);
        assert_eq!(p.width, 2);
        assert_eq!(p.max_width, 4);
        assert_eq!((p.start, p.end), (6, 10));
        for pe in 0..3 {
            let q = Partition::with_shape(10, pe, 4);
            assert_eq!(q.local_width(), 2);
        }
    }

    #[test]
    fn zero_width_collapses_to_tail() {
        let p = Partition::with_shape(3, 7, 8);
        assert_eq!(p.width, 0);
        assert_eq!(p.max_width, 3);
        assert_eq!(p.local_width(), 3);
        for x in 0..3 {
            assert_eq!(p.owner(x), 7);
            assert_eq!(p.local_pos(x), x as usize);
        }
        let q = Partition::with_shape(3, 0, 8);
        assert_eq!(q.local_width(), 0);
    }

    proptest! {
        #[test]
        fn every_id_has_one_owner(n in 1usize..2000, npes in 1usize..16) {
            let parts: Vec<Partition> =
                (0..npes).map(|pe| Partition::with_shape(n, pe, npes)).collect();
            let mut covered = 0usize;
            for x in 0..n as NodeId {
                let owner = parts[0].owner(x);
                let owners: Vec<usize> = parts
                    .iter()
                    .filter(|p| p.contains(x))
                    .map(|p| p.pe)
                    .collect();
                prop_assert_eq!(&owners, &vec![owner]);
                prop_assert!(parts[owner].local_pos(x) < parts[owner].local_width());
                covered += 1;
            }
            prop_assert_eq!(covered, n);
            let total: usize = parts.iter().map(|p| p.local_width()).sum();
            prop_assert_eq!(total, n);
        }

        #[test]
        fn local_pos_round_trips(n in 1usize..2000, npes in 1usize..16) {
            for pe in 0..npes {
                let p = Partition::with_shape(n, pe, npes);
                prop_assert!(p.local_width() <= p.max_width);
                for x in p.start..p.end {
                    prop_assert_eq!(p.owner(x), pe);
                    let lp = p.local_pos(x);
                    prop_assert_eq!(p.start + lp as NodeId, x);
                }
            }
        }
    }
}
