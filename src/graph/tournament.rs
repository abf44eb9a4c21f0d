//! Tournament tree: k-way merge of per-rank sorted degree runs.
//!
//! Each rank sorts its `(degree, node)` pairs descending and the tree merges
//! the runs into one globally descending stream. Leaves hold every rank's
//! current head; internal nodes cache the winner of their subtree, so
//! extracting the global maximum replays one leaf-to-root path —
//! `O(log k)` comparisons per element. Only the current leader rank operates
//! the tree; when the leader's output window fills, the tree state is staged
//! through symmetric memory to the next rank along with the leader token.

use crate::runtime::{SymPod, SymSlice};
use bytemuck::{Pod, Zeroable};

use crate::graph::NodeId;

/// Degree-keyed sort record.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DegreeNode {
    /// Out-degree of `node`.
    pub degree: i64,
    /// The vertex.
    pub node: NodeId,
}

unsafe impl SymPod for DegreeNode {}

impl DegreeNode {
    /// Sentinel losing to every real pair (degrees are non-negative).
    pub const SENTINEL: DegreeNode = DegreeNode {
        degree: -1,
        node: 0,
    };

    #[inline]
    fn key(self) -> (i64, NodeId) {
        (self.degree, self.node)
    }
}

/// Tree slot: a pair plus the rank whose run it came from.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TreeSlot {
    pair: DegreeNode,
    rank: i64,
}

unsafe impl SymPod for TreeSlot {}

const EMPTY_SLOT: TreeSlot = TreeSlot {
    pair: DegreeNode::SENTINEL,
    rank: -1,
};

/// K-way merge tree over symmetric sorted runs.
pub struct TournamentTree {
    /// Leaf count, `next_pow2(npes)`; slot 1 is the root, leaves start at
    /// `k`.
    k: usize,
    slots: Vec<TreeSlot>,
    /// Per rank: index of the next unconsumed element of its run.
    cursors: Vec<u64>,
    /// Per rank: run length.
    counts: Vec<u64>,
    runs: SymSlice<DegreeNode>,
}

impl TournamentTree {
    /// Build from gathered run heads; used by the first leader.
    pub fn build(leaves: &[DegreeNode], runs: SymSlice<DegreeNode>, counts: Vec<u64>) -> Self {
        let npes = counts.len();
        debug_assert_eq!(leaves.len(), npes);
        let k = npes.next_power_of_two();
        let mut slots = vec![EMPTY_SLOT; 2 * k];
        for (r, head) in leaves.iter().enumerate() {
            slots[k + r] = TreeSlot {
                pair: *head,
                rank: r as i64,
            };
        }
        let cursors = counts.iter().map(|&c| u64::from(c > 0)).collect();
        let mut tree = TournamentTree {
            k,
            slots,
            cursors,
            counts,
            runs,
        };
        for i in (1..k).rev() {
            tree.slots[i] = tree.winner(i);
        }
        tree
    }

    /// Reconstruct from the staging arrays a departing leader filled.
    pub fn restore(
        stage_slots: &SymSlice<TreeSlot>,
        stage_cursors: &SymSlice<u64>,
        runs: SymSlice<DegreeNode>,
        counts: Vec<u64>,
    ) -> Self {
        let k = counts.len().next_power_of_two();
        debug_assert_eq!(stage_slots.len(), 2 * k);
        TournamentTree {
            k,
            slots: stage_slots.local_to_vec(),
            cursors: stage_cursors.local_to_vec(),
            counts,
            runs,
        }
    }

    /// Stage this tree's state into rank `to`'s copies of the staging
    /// arrays.
    pub fn save_to(
        &self,
        stage_slots: &SymSlice<TreeSlot>,
        stage_cursors: &SymSlice<u64>,
        to: usize,
    ) {
        stage_slots.put_slice_to(to, 0, &self.slots);
        stage_cursors.put_slice_to(to, 0, &self.cursors);
    }

    #[inline]
    fn winner(&self, i: usize) -> TreeSlot {
        let (l, r) = (self.slots[2 * i], self.slots[2 * i + 1]);
        if l.pair.key() >= r.pair.key() {
            l
        } else {
            r
        }
    }

    /// Extract the global maximum and replay its leaf-to-root path.
    pub fn pop_root(&mut self) -> DegreeNode {
        let top = self.slots[1];
        debug_assert!(top.rank >= 0, "popped an exhausted tournament tree");
        let r = top.rank as usize;
        let next = if self.cursors[r] < self.counts[r] {
            let pair = self.runs.get_from(r, self.cursors[r] as usize);
            self.cursors[r] += 1;
            TreeSlot {
                pair,
                rank: r as i64,
            }
        } else {
            EMPTY_SLOT
        };
        let mut i = self.k + r;
        self.slots[i] = next;
        while i > 1 {
            i /= 2;
            self.slots[i] = self.winner(i);
        }
        top.pair
    }
}
