//! Distributed CSR graph in symmetric memory.
//!
//! Each side of the graph (`out`, and `in` for directed graphs built with
//! inversion) stores a partitioned `index` of `max_width + 1` local offsets
//! and a symmetric `neighs` array sized to the largest per-rank neighbor
//! total (symmetric allocation is uniform; ranks with fewer neighbors leave
//! a tail unused). Neighbor access for a non-local vertex resolves through
//! the owner with one-sided gets.

pub mod builder;
pub mod generator;
pub mod reader;
pub mod tournament;

use crate::partition::Partition;
use crate::runtime::{Rank, SymPod, SymSlice};
use bytemuck::{Pod, Zeroable};

/// Global vertex id. Signed: kernels encode status in the sign bit (an
/// unvisited BFS vertex stores its negated out-degree).
pub type NodeId = i64;

/// Edge weight / path distance.
pub type Weight = i64;

/// Offset into a neighbor array.
pub type SGOffset = i64;

/// Destination with an attached weight; the neighbor entry of weighted
/// graphs.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WNode {
    /// Destination vertex.
    pub v: NodeId,
    /// Weight of the edge leading to `v`.
    pub w: Weight,
}

unsafe impl SymPod for WNode {}

/// One edge of an edge list: source plus destination payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge<D> {
    /// Source vertex.
    pub u: NodeId,
    /// Destination entry (bare id or id + weight).
    pub v: D,
}

/// Edge list scattered round-robin across ranks.
pub type EdgeList<D> = Vec<Edge<D>>;

/// Neighbor-entry contract uniting unweighted (`NodeId`) and weighted
/// ([`WNode`]) CSR payloads.
pub trait Destination: SymPod + Copy + PartialEq + std::fmt::Debug {
    /// Whether this payload carries a weight that must be present in (or
    /// synthesized for) the edge list.
    const HAS_WEIGHT: bool;

    /// Destination vertex id.
    fn node(self) -> NodeId;
    /// Edge weight (zero for unweighted payloads).
    fn weight(self) -> Weight;
    /// Build a payload from parts; `w` is ignored by unweighted payloads.
    fn from_node_weight(v: NodeId, w: Weight) -> Self;
    /// The reverse-edge payload stored under `self`'s owner: the original
    /// source, carrying `self`'s weight.
    fn source_of(u: NodeId, dv: Self) -> Self;
    /// Total order used when canonicalizing neighbor lists.
    fn sort_key(self) -> (NodeId, Weight);
}

impl Destination for NodeId {
    const HAS_WEIGHT: bool = false;

    #[inline]
    fn node(self) -> NodeId {
        self
    }
    #[inline]
    fn weight(self) -> Weight {
        0
    }
    #[inline]
    fn from_node_weight(v: NodeId, _w: Weight) -> Self {
        v
    }
    #[inline]
    fn source_of(u: NodeId, _dv: Self) -> Self {
        u
    }
    #[inline]
    fn sort_key(self) -> (NodeId, Weight) {
        (self, 0)
    }
}

impl Destination for WNode {
    const HAS_WEIGHT: bool = true;

    #[inline]
    fn node(self) -> NodeId {
        self.v
    }
    #[inline]
    fn weight(self) -> Weight {
        self.w
    }
    #[inline]
    fn from_node_weight(v: NodeId, w: Weight) -> Self {
        WNode { v, w }
    }
    #[inline]
    fn source_of(u: NodeId, dv: Self) -> Self {
        WNode { v: u, w: dv.w }
    }
    #[inline]
    fn sort_key(self) -> (NodeId, Weight) {
        (self.v, self.w)
    }
}

/// One CSR half: partitioned offsets plus the symmetric neighbor pool.
pub struct CsrSide<D: Destination> {
    pub(crate) index: SymSlice<SGOffset>,
    pub(crate) neighs: SymSlice<D>,
}

impl<D: Destination> Clone for CsrSide<D> {
    fn clone(&self) -> Self {
        CsrSide {
            index: self.index.clone(),
            neighs: self.neighs.clone(),
        }
    }
}

impl<D: Destination> CsrSide<D> {
    /// Offset bounds of `u`'s neighbor run, resolved through its owner.
    fn bounds(&self, vp: &Partition, u: NodeId) -> (usize, SGOffset, SGOffset) {
        let owner = vp.owner(u);
        let lp = vp.local_pos(u);
        let lo = self.index.get_from(owner, lp);
        let hi = self.index.get_from(owner, lp + 1);
        debug_assert!(0 <= lo && lo <= hi);
        (owner, lo, hi)
    }

    fn degree(&self, vp: &Partition, u: NodeId) -> i64 {
        let (_, lo, hi) = self.bounds(vp, u);
        hi - lo
    }

    fn neigh_vec(&self, vp: &Partition, u: NodeId) -> Vec<D> {
        let (owner, lo, hi) = self.bounds(vp, u);
        self.neighs.get_slice_from(owner, lo as usize, (hi - lo) as usize)
    }

    /// Sum of this rank's local neighbor counts.
    pub(crate) fn local_total(&self, vp: &Partition) -> i64 {
        self.index.read(vp.local_width())
    }
}

/// Lazy one-sided iterator over a neighbor run.
pub struct NeighIter<'g, D: Destination> {
    neighs: &'g SymSlice<D>,
    owner: usize,
    cur: SGOffset,
    end: SGOffset,
}

impl<D: Destination> Iterator for NeighIter<'_, D> {
    type Item = D;

    fn next(&mut self) -> Option<D> {
        if self.cur == self.end {
            return None;
        }
        let item = self.neighs.get_from(self.owner, self.cur as usize);
        self.cur += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = (self.end - self.cur) as usize;
        (rem, Some(rem))
    }
}

/// Distributed CSR graph; `D` selects unweighted or weighted edges.
pub struct Graph<D: Destination> {
    rank: Rank,
    vp: Partition,
    directed: bool,
    num_edges_directed: i64,
    out: CsrSide<D>,
    /// Inverse side; present only on directed graphs built with inversion.
    inv: Option<CsrSide<D>>,
}

/// Unweighted graph.
pub type Ugraph = Graph<NodeId>;
/// Weighted graph.
pub type Wgraph = Graph<WNode>;

impl<D: Destination> Graph<D> {
    /// Assemble a graph from built CSR sides. Collective (computes the
    /// directed edge total with a reduction).
    pub(crate) fn assemble(
        rank: &Rank,
        vp: Partition,
        directed: bool,
        out: CsrSide<D>,
        inv: Option<CsrSide<D>>,
    ) -> Self {
        debug_assert!(inv.is_none() || directed);
        let num_edges_directed = rank.sum_i64(out.local_total(&vp));
        Graph {
            rank: rank.clone(),
            vp,
            directed,
            num_edges_directed,
            out,
            inv,
        }
    }

    /// The rank handle this view was created on.
    #[inline]
    pub fn rank(&self) -> &Rank {
        &self.rank
    }

    /// Vertex partition of this graph.
    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.vp
    }

    /// True when edges are one-directional.
    #[inline]
    pub fn directed(&self) -> bool {
        self.directed
    }

    /// Number of vertices.
    #[inline]
    pub fn num_nodes(&self) -> i64 {
        self.vp.n as i64
    }

    /// Number of logical edges (undirected edges counted once).
    #[inline]
    pub fn num_edges(&self) -> i64 {
        if self.directed {
            self.num_edges_directed
        } else {
            self.num_edges_directed / 2
        }
    }

    /// Number of stored directed edges.
    #[inline]
    pub fn num_edges_directed(&self) -> i64 {
        self.num_edges_directed
    }

    /// Iterate all global vertex ids.
    pub fn vertices(&self) -> impl Iterator<Item = NodeId> {
        0..self.num_nodes()
    }

    /// Out-degree of `u` (one-sided when `u` is remote).
    pub fn out_degree(&self, u: NodeId) -> i64 {
        self.out.degree(&self.vp, u)
    }

    /// In-degree of `u`; equals the out-degree on undirected graphs.
    pub fn in_degree(&self, u: NodeId) -> i64 {
        self.in_side().degree(&self.vp, u)
    }

    /// Iterate `u`'s outgoing neighbors.
    pub fn out_neigh(&self, u: NodeId) -> NeighIter<'_, D> {
        let (owner, lo, hi) = self.out.bounds(&self.vp, u);
        NeighIter {
            neighs: &self.out.neighs,
            owner,
            cur: lo,
            end: hi,
        }
    }

    /// Iterate `u`'s incoming neighbors (outgoing on undirected graphs).
    pub fn in_neigh(&self, u: NodeId) -> NeighIter<'_, D> {
        let side = self.in_side();
        let (owner, lo, hi) = side.bounds(&self.vp, u);
        NeighIter {
            neighs: &side.neighs,
            owner,
            cur: lo,
            end: hi,
        }
    }

    /// Fetch `u`'s outgoing neighbor run in one bulk get.
    pub fn out_neigh_vec(&self, u: NodeId) -> Vec<D> {
        self.out.neigh_vec(&self.vp, u)
    }

    /// Fetch `u`'s incoming neighbor run in one bulk get.
    pub fn in_neigh_vec(&self, u: NodeId) -> Vec<D> {
        self.in_side().neigh_vec(&self.vp, u)
    }

    #[inline]
    fn in_side(&self) -> &CsrSide<D> {
        self.inv.as_ref().unwrap_or(&self.out)
    }

    pub(crate) fn out_side(&self) -> &CsrSide<D> {
        &self.out
    }

    pub(crate) fn inv_side(&self) -> Option<&CsrSide<D>> {
        self.inv.as_ref()
    }
}

/// Deterministic source picker shared by the harness and the sampling
/// heuristics. Every rank draws from the same seeded stream, so all ranks
/// agree on the sequence without communicating.
pub struct SourcePicker<'g, D: Destination> {
    g: &'g Graph<D>,
    given: Option<NodeId>,
    rng: rand::rngs::SmallRng,
}

const PICKER_SEED: u64 = 27491095;

impl<'g, D: Destination> SourcePicker<'g, D> {
    /// Pick from `g`; a `given` source short-circuits the stream.
    pub fn new(g: &'g Graph<D>, given: Option<NodeId>) -> Self {
        use rand::SeedableRng;
        SourcePicker {
            g,
            given,
            rng: rand::rngs::SmallRng::seed_from_u64(PICKER_SEED),
        }
    }

    /// Next source: the fixed vertex, or a random vertex with outgoing
    /// edges.
    pub fn pick_next(&mut self) -> NodeId {
        use rand::Rng;
        if let Some(s) = self.given {
            return s;
        }
        loop {
            let v = self.rng.gen_range(0..self.g.num_nodes());
            if self.g.out_degree(v) > 0 {
                return v;
            }
        }
    }
}

/// Block-parallel exclusive prefix sum; the result has one more entry than
/// `vals` and ends with the total.
pub fn parallel_prefix_sum(vals: &[i64]) -> Vec<SGOffset> {
    use rayon::prelude::*;
    const BLOCK: usize = 1 << 16;
    let nblocks = vals.len().div_ceil(BLOCK).max(1);
    let block_sums: Vec<i64> = vals
        .par_chunks(BLOCK)
        .map(|c| c.iter().sum::<i64>())
        .collect();
    let mut bulk = Vec::with_capacity(nblocks + 1);
    let mut total = 0i64;
    for b in 0..block_sums.len() {
        bulk.push(total);
        total = total
            .checked_add(block_sums[b])
            .expect("prefix sum overflow");
    }
    bulk.push(total);
    let mut prefix = vec![0i64; vals.len() + 1];
    prefix[vals.len()] = total;
    prefix
        .par_chunks_mut(BLOCK)
        .zip(vals.par_chunks(BLOCK))
        .enumerate()
        .for_each(|(b, (out, chunk))| {
            let mut run = bulk[b];
            for (o, v) in out.iter_mut().zip(chunk) {
                *o = run;
                run += v;
            }
        });
    prefix
}
