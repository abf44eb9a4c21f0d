//! Two-pass distributed CSR construction from a round-robin edge list.
//!
//! The pipeline: acquire the edge list (file, generator, or a short-circuit
//! load of a serialized graph), find the vertex count with a max-allreduce,
//! synthesize weights if the kernel needs them and the source had none,
//! build the outgoing CSR (and the incoming CSR for directed graphs), then
//! squish — sort, deduplicate, and drop self-loops from every neighbor
//! list. The edge list is scoped so it is released before kernels run.
//!
//! Degree counting and edge scattering are one-sided: each endpoint's owner
//! is hit with a fetch-inc (degree slot or offset cursor) and a put. Degree
//! counting interleaves a fixed cadence of barriers as back-pressure relief;
//! the number of rounds comes from a max-allreduce of the local edge count
//! so every rank emits the same barrier sequence.

use crate::error::SymGraphError;
use crate::graph::tournament::{DegreeNode, TournamentTree, TreeSlot};
use crate::graph::{
    generator, parallel_prefix_sum, reader, CsrSide, Destination, EdgeList, Graph, NodeId,
    SGOffset, Ugraph,
};
use crate::partition::Partition;
use crate::runtime::{Cmp, Rank};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Local edges processed between back-pressure barriers while counting
/// degrees. Any finite period is correct; this matches the communication
/// buffering the one-sided traffic tolerates.
const COUNT_FLUSH_PERIOD: usize = 10_000;

/// Where the edge stream comes from.
#[derive(Clone, Debug)]
pub enum GraphSource {
    /// Edge list or serialized graph file.
    File(PathBuf),
    /// File whose edge set already contains both directions of every edge;
    /// loaded as undirected without mirroring.
    SymmetrizedFile(PathBuf),
    /// Synthetic stream with `2^scale` vertices.
    Synthetic {
        /// log2 of the vertex count.
        scale: u32,
        /// Average out-degree.
        degree: u32,
        /// Uniform endpoints instead of Kronecker.
        uniform: bool,
    },
}

/// Distributed graph builder; `D` selects the neighbor payload.
pub struct Builder<D: Destination> {
    rank: Rank,
    symmetrize: bool,
    _payload: PhantomData<D>,
}

impl<D: Destination> Builder<D> {
    /// A builder for the rank's group. `symmetrize` mirrors every input
    /// edge, producing an undirected graph.
    pub fn new(rank: &Rank, symmetrize: bool) -> Self {
        Builder {
            rank: rank.clone(),
            symmetrize,
            _payload: PhantomData,
        }
    }

    /// Run the full pipeline for `source`.
    pub fn make_graph(&self, source: &GraphSource) -> Result<Graph<D>, SymGraphError> {
        let (path, pre_symmetrized) = match source {
            GraphSource::File(p) => (Some(p), false),
            GraphSource::SymmetrizedFile(p) => (Some(p), true),
            GraphSource::Synthetic { .. } => (None, false),
        };
        if let Some(p) = path {
            if reader::file_kind(p) != reader::FileKind::EdgeList {
                return reader::read_serialized::<D>(&self.rank, p);
            }
        }
        let mirror = self.symmetrize && !pre_symmetrized;
        let directed = !self.symmetrize && !pre_symmetrized;
        let g = {
            // Scope bounds the edge list's lifetime: peak memory, not the
            // graph, is what the symmetric heap must fit.
            let mut el: EdgeList<D>;
            match source {
                GraphSource::File(p) | GraphSource::SymmetrizedFile(p) => {
                    let (edges, had_weights) = reader::read_edge_list::<D>(&self.rank, p)?;
                    el = edges;
                    if D::HAS_WEIGHT && !had_weights {
                        generator::insert_weights(&self.rank, &mut el);
                    }
                }
                GraphSource::Synthetic {
                    scale,
                    degree,
                    uniform,
                } => {
                    el = generator::Generator::new(*scale, *degree).generate(&self.rank, *uniform);
                    if D::HAS_WEIGHT {
                        generator::insert_weights(&self.rank, &mut el);
                    }
                }
            }
            self.rank.barrier();
            self.make_graph_from_el(&el, directed, mirror)?
        };
        self.rank.barrier();
        self.squish_graph(&g)
    }

    /// Assemble an unsquished CSR graph from a local edge share.
    pub fn make_graph_from_el(
        &self,
        el: &EdgeList<D>,
        directed: bool,
        mirror: bool,
    ) -> Result<Graph<D>, SymGraphError> {
        let num_nodes = self.find_max_node_id(el) + 1;
        let vp = Partition::new(num_nodes as usize, &self.rank);
        let out = self.make_csr(el, &vp, mirror, false)?;
        let inv = if directed {
            Some(self.make_csr(el, &vp, mirror, true)?)
        } else {
            None
        };
        self.rank.barrier();
        Ok(Graph::assemble(&self.rank, vp, directed, out, inv))
    }

    /// Largest endpoint id across all ranks (full-width max-allreduce).
    pub fn find_max_node_id(&self, el: &EdgeList<D>) -> NodeId {
        let mut max_seen: NodeId = -1;
        for e in el {
            max_seen = max_seen.max(e.u).max(e.v.node());
        }
        self.rank.max_i64(max_seen)
    }

    /// Count per-vertex degrees into a partitioned vector with one-sided
    /// fetch-incs on each endpoint's owner.
    ///
    /// The vector is symmetric and up to date after the trailing barrier but
    /// deliberately unsynchronized: rank `p`'s slots hold only `p`'s owned
    /// vertices.
    fn count_degrees(
        &self,
        el: &EdgeList<D>,
        vp: &Partition,
        mirror: bool,
        transpose: bool,
    ) -> Result<crate::data::Pvector<i64>, SymGraphError> {
        let degrees = crate::data::Pvector::<i64>::new(&self.rank, vp)?;
        let rounds = self
            .rank
            .max_u64(el.len().div_ceil(COUNT_FLUSH_PERIOD) as u64);
        for round in 0..rounds as usize {
            let lo = round * COUNT_FLUSH_PERIOD;
            let hi = ((round + 1) * COUNT_FLUSH_PERIOD).min(el.len());
            for e in el.get(lo..hi).unwrap_or(&[]) {
                if mirror || !transpose {
                    degrees
                        .sym()
                        .fetch_inc(vp.owner(e.u), vp.local_pos(e.u));
                }
                if mirror || transpose {
                    let v = e.v.node();
                    degrees.sym().fetch_inc(vp.owner(v), vp.local_pos(v));
                }
            }
            self.rank.barrier();
        }
        Ok(degrees)
    }

    /// Build one CSR side: count, prefix-sum, allocate uniformly, scatter.
    fn make_csr(
        &self,
        el: &EdgeList<D>,
        vp: &Partition,
        mirror: bool,
        transpose: bool,
    ) -> Result<CsrSide<D>, SymGraphError> {
        let degrees = self.count_degrees(el, vp, mirror, transpose)?;
        let offsets = parallel_prefix_sum(&degrees.local_to_vec());
        let lw = vp.local_width();
        let local_total = offsets[lw];
        // Symmetric allocations are uniform: every rank sizes its pool to
        // the largest per-rank total and ranks with fewer neighbors leave a
        // tail unused.
        let max_total = self.rank.max_i64(local_total);
        let neighs = self.rank.alloc::<D>(max_total as usize)?;
        let index = self.rank.alloc::<SGOffset>(vp.max_width + 1)?;
        let cursors = self.rank.alloc::<SGOffset>(vp.max_width + 1)?;
        for (i, off) in offsets.iter().enumerate() {
            index.write(i, *off);
            cursors.write(i, *off);
        }
        self.rank.barrier();
        for e in el {
            if mirror || !transpose {
                let owner = vp.owner(e.u);
                let slot = cursors.fetch_inc(owner, vp.local_pos(e.u));
                neighs.put_to(owner, slot as usize, e.v);
            }
            if mirror || transpose {
                let v = e.v.node();
                let owner = vp.owner(v);
                let slot = cursors.fetch_inc(owner, vp.local_pos(v));
                neighs.put_to(owner, slot as usize, D::source_of(e.u, e.v));
            }
        }
        self.rank.barrier();
        Ok(CsrSide { index, neighs })
    }

    /// Canonicalize one CSR side: per-vertex sort, dedup, self-loop removal,
    /// then a tight reallocation.
    fn squish_csr(&self, side: &CsrSide<D>, vp: &Partition) -> Result<CsrSide<D>, SymGraphError> {
        let lw = vp.local_width();
        let pe = self.rank.pe();
        let lists: Vec<Vec<D>> = (0..lw)
            .into_par_iter()
            .map(|i| {
                let lo = side.index.read(i) as usize;
                let hi = side.index.read(i + 1) as usize;
                let mut run = side.neighs.get_slice_from(pe, lo, hi - lo);
                run.sort_unstable_by_key(|d| d.sort_key());
                run.dedup_by(|a, b| a.node() == b.node());
                let this = vp.start + i as NodeId;
                run.retain(|d| d.node() != this);
                run
            })
            .collect();
        let diffs: Vec<i64> = lists.iter().map(|l| l.len() as i64).collect();
        let offsets = parallel_prefix_sum(&diffs);
        let max_total = self.rank.max_i64(offsets[lw]);
        let neighs = self.rank.alloc::<D>(max_total as usize)?;
        let index = self.rank.alloc::<SGOffset>(vp.max_width + 1)?;
        for (i, off) in offsets.iter().enumerate() {
            index.write(i, *off);
        }
        for (i, list) in lists.iter().enumerate() {
            neighs.put_slice_to(pe, offsets[i] as usize, list);
        }
        self.rank.barrier();
        Ok(CsrSide { index, neighs })
    }

    /// Squish every side of `g` into a canonical graph: neighbor lists
    /// strictly ascending, no duplicates, no self-loops.
    pub fn squish_graph(&self, g: &Graph<D>) -> Result<Graph<D>, SymGraphError> {
        let vp = *g.partition();
        let out = self.squish_csr(g.out_side(), &vp)?;
        let inv = match g.inv_side() {
            Some(side) => Some(self.squish_csr(side, &vp)?),
            None => None,
        };
        self.rank.barrier();
        Ok(Graph::assemble(&self.rank, vp, g.directed(), out, inv))
    }
}

/// Relabel vertices so higher-degree nodes get smaller ids, then rebuild the
/// CSR under the new naming. Distributed sort: local descending sorts merged
/// through the tournament tree while a leader token walks the ranks.
///
/// Rejects directed graphs.
pub fn relabel_by_degree(g: &Ugraph) -> Result<Ugraph, SymGraphError> {
    if g.directed() {
        return Err(SymGraphError::DirectedGraph);
    }
    let rank = g.rank().clone();
    let vp = *g.partition();
    let (pe, npes) = (rank.pe(), rank.npes());
    let lw = vp.local_width();

    // Phase 1: every rank sorts its own (degree, node) pairs descending.
    let mut degree_pairs = crate::data::Pvector::<DegreeNode>::new(&rank, &vp)?;
    let mut local: Vec<DegreeNode> = (vp.start..vp.end)
        .map(|n| DegreeNode {
            degree: g.out_degree(n),
            node: n,
        })
        .collect();
    local.par_sort_unstable_by(|a, b| (b.degree, b.node).cmp(&(a.degree, a.node)));
    degree_pairs.sym().put_slice_to(pe, 0, &local);
    degree_pairs.set_widths(vp.max_width, lw);

    // Phase 2: k-way tournament merge. Rank 0 leads with every rank's run
    // head as a leaf; leadership (and the tree state) moves to the next rank
    // once the leader's output window is full.
    let leader = rank.alloc_cell::<i64>()?;
    let init_leaves = rank.alloc::<DegreeNode>(npes)?;
    let k = npes.next_power_of_two();
    let stage_slots = rank.alloc::<TreeSlot>(2 * k)?;
    let stage_cursors = rank.alloc::<u64>(npes)?;
    let temp_pairs = crate::data::Pvector::<DegreeNode>::new(&rank, &vp)?;
    let head = local.first().copied().unwrap_or(DegreeNode::SENTINEL);
    init_leaves.put_to(0, pe, head);
    rank.barrier();

    let counts: Vec<u64> = (0..npes)
        .map(|r| Partition::with_shape(vp.n, r, npes).local_width() as u64)
        .collect();
    leader.wait_until(Cmp::Eq, pe as i64);
    let mut tree = if pe == 0 {
        TournamentTree::build(&init_leaves.local_to_vec(), degree_pairs.sym().clone(), counts)
    } else {
        TournamentTree::restore(
            &stage_slots,
            &stage_cursors,
            degree_pairs.sym().clone(),
            counts,
        )
    };
    for i in 0..lw {
        temp_pairs.write(i, tree.pop_root());
    }
    if pe < npes - 1 {
        tree.save_to(&stage_slots, &stage_cursors, pe + 1);
        leader.put_to(pe + 1, (pe + 1) as i64);
    }
    rank.barrier();

    // Phase 3: global sorted position becomes the new id; scatter it to the
    // old id's owner. Higher degree ⇒ smaller id.
    let new_ids = crate::data::Pvector::<NodeId>::new(&rank, &vp)?;
    let mut degrees: Vec<i64> = Vec::with_capacity(lw);
    for n in vp.start..vp.end {
        let lp = vp.local_pos(n);
        let pair = temp_pairs.read(lp);
        degrees.push(pair.degree);
        new_ids
            .sym()
            .put_to(vp.owner(pair.node), vp.local_pos(pair.node), n);
    }
    rank.barrier();

    // Phase 4: rebuild the CSR with translated endpoints.
    let offsets = parallel_prefix_sum(&degrees);
    let max_total = rank.max_i64(offsets[lw]);
    let neighs = rank.alloc::<NodeId>(max_total as usize)?;
    let index = rank.alloc::<SGOffset>(vp.max_width + 1)?;
    let cursors = rank.alloc::<SGOffset>(vp.max_width + 1)?;
    for (i, off) in offsets.iter().enumerate() {
        index.write(i, *off);
        cursors.write(i, *off);
    }
    rank.barrier();
    for u in vp.start..vp.end {
        let new_u = new_ids.read(vp.local_pos(u));
        let (nu_owner, nu_pos) = (vp.owner(new_u), vp.local_pos(new_u));
        for v in g.out_neigh_vec(u) {
            let slot = cursors.fetch_inc(nu_owner, nu_pos);
            let new_v = new_ids.sym().get_from(vp.owner(v), vp.local_pos(v));
            neighs.put_to(nu_owner, slot as usize, new_v);
        }
    }
    rank.barrier();
    for i in 0..lw {
        let lo = index.read(i) as usize;
        let hi = index.read(i + 1) as usize;
        let mut run = neighs.get_slice_from(pe, lo, hi - lo);
        run.sort_unstable();
        neighs.put_slice_to(pe, lo, &run);
    }
    rank.barrier();
    Ok(Graph::assemble(
        &rank,
        vp,
        false,
        CsrSide { index, neighs },
        None,
    ))
}
