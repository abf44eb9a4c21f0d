//! Direction-optimizing breadth-first search.
//!
//! Returns the parent array of a BFS traversal from a source vertex,
//! adaptively switching between top-down (push) and bottom-up (pull)
//! expansion following Beamer, Asanović and Patterson, "Direction-Optimizing
//! Breadth-First Search" (SC 2012). The frontier is a replicated sliding
//! queue for top-down steps and a pair of full-width bitmaps for bottom-up
//! steps.
//!
//! Parent encoding: the per-vertex out-degrees are precomputed into the
//! parent array as negative numbers, so
//! `parent[x] < 0` ⇔ `x` unvisited with `parent[x] = -out_degree(x)`
//! (or −1 for degree 0), and `parent[x] >= 0` ⇔ visited predecessor, with
//! `parent[source] = source` terminating the tree.
//!
//! Remote parent updates are serialized per owner through the PLOCKS array
//! (one lock word per rank) and land as one-sided compare-and-swaps so the
//! first writer wins, mirroring the local fast path.

use crate::data::{Bitmap, Pvector, QueueBuffer, SlidingQueue};
use crate::error::SymGraphError;
use crate::graph::{NodeId, Ugraph};
use crate::runtime::SymLock;

/// Frontier-growth threshold: switch to bottom-up when the frontier's
/// outgoing edge count exceeds `edges_to_check / alpha`.
pub const ALPHA: i64 = 15;
/// Shrink threshold: return to top-down once the awake count falls under
/// `num_nodes / beta` and stops growing.
pub const BETA: i64 = 18;

/// Seed the parent array: negated out-degrees for the local slice, the
/// source terminal where owned.
fn init_parent(g: &Ugraph, source: NodeId) -> Result<Pvector<NodeId>, SymGraphError> {
    let vp = g.partition();
    let parent = Pvector::<NodeId>::new(g.rank(), vp)?;
    for n in vp.start..vp.end {
        let deg = g.out_degree(n);
        parent.write(vp.local_pos(n), if deg != 0 { -deg } else { -1 });
    }
    if vp.contains(source) {
        parent.write(vp.local_pos(source), source);
    }
    Ok(parent)
}

/// One top-down step: the promoted window is block-partitioned over ranks;
/// every discovered vertex is claimed with a compare-and-swap (local, or
/// remote under the owner's lock) and enqueued. Returns the global scout
/// count — the sum of out-degrees of the vertices discovered this step.
fn td_step(
    g: &Ugraph,
    parent: &Pvector<NodeId>,
    frontier: &SlidingQueue<NodeId>,
    qlock: &SymLock,
    plocks: &SymLock,
) -> i64 {
    let rank = g.rank();
    let vp = g.partition();
    let (pe, npes) = (rank.pe(), rank.npes());
    let mut lqueue = QueueBuffer::new(frontier, qlock);
    let mut local_scout: i64 = 0;

    let window = frontier.size();
    let share = window / npes;
    let begin = share * pe;
    let finish = if pe == npes - 1 { window } else { begin + share };
    for i in begin..finish {
        let u = frontier.window_item(i);
        for v in g.out_neigh(u) {
            let owner = vp.owner(v);
            let lp = vp.local_pos(v);
            if owner == pe {
                let curr = parent.read(lp);
                if curr < 0 && parent.sym().compare_and_swap(pe, lp, curr, u) == curr {
                    lqueue.push_back(v);
                    local_scout += -curr;
                }
            } else {
                plocks.set(owner);
                let curr = parent.sym().get_from(owner, lp);
                if curr < 0 && parent.sym().compare_and_swap(owner, lp, curr, u) == curr {
                    lqueue.push_back(v);
                    local_scout += -curr;
                }
                plocks.clear(owner);
            }
        }
    }
    lqueue.flush();
    rank.sum_i64(local_scout)
}

/// One bottom-up step: every rank scans its owned unvisited vertices for an
/// incoming frontier neighbor. Returns the global awake count.
///
/// Assumes all ranks enter with synchronized `front` bitmaps; `front` is
/// never written here, and `next` is merged before returning.
fn bu_step(g: &Ugraph, parent: &Pvector<NodeId>, front: &Bitmap, next: &Bitmap) -> i64 {
    let vp = g.partition();
    let mut awake: i64 = 0;
    next.reset();
    for u in vp.start..vp.end {
        let lp = vp.local_pos(u);
        if parent.read(lp) < 0 {
            for v in g.in_neigh(u) {
                if front.get_bit(v) {
                    parent.write(lp, v);
                    awake += 1;
                    next.set_bit(u);
                    break;
                }
            }
        }
    }
    next.merge();
    g.rank().sum_i64(awake)
}

/// Replay the (replicated) promoted window into every rank's own bitmap.
fn queue_to_bitmap(frontier: &SlidingQueue<NodeId>, bm: &Bitmap) {
    for u in frontier.iter() {
        bm.set_bit_atomic(u);
    }
}

/// Convert set bits back into queue entries: ranks scan their id range,
/// batch-append owned bits, then collectively promote.
fn bitmap_to_queue(g: &Ugraph, bm: &Bitmap, frontier: &SlidingQueue<NodeId>, qlock: &SymLock) {
    let vp = g.partition();
    let mut lqueue = QueueBuffer::new(frontier, qlock);
    for n in vp.start..vp.end {
        if bm.get_bit(n) {
            lqueue.push_back(n);
        }
    }
    lqueue.flush();
    frontier.slide_window();
}

/// Direction-optimizing BFS from `source`. Collective; returns the
/// partitioned parent vector with entries in `{-1, predecessor}`.
pub fn dobfs(
    g: &Ugraph,
    source: NodeId,
    alpha: i64,
    beta: i64,
) -> Result<Pvector<NodeId>, SymGraphError> {
    let rank = g.rank();
    let vp = g.partition();
    let n = g.num_nodes();
    let parent = init_parent(g, source)?;
    let qlock = rank.alloc_lock(1)?;
    let plocks = rank.alloc_lock(rank.npes())?;

    let frontier = SlidingQueue::<NodeId>::new(rank, n as usize)?;
    frontier.push_back(source);
    frontier.slide_window();
    let mut front = Bitmap::new(rank, n as usize)?;
    front.reset();
    let mut curr = Bitmap::new(rank, n as usize)?;
    curr.reset();
    rank.barrier();

    let mut edges_to_check = g.num_edges_directed();
    let mut scout_count = g.out_degree(source);
    while !frontier.empty() {
        if scout_count > edges_to_check / alpha {
            queue_to_bitmap(&frontier, &front);
            let mut awake_count = frontier.size() as i64;
            frontier.slide_window();
            loop {
                let old_awake_count = awake_count;
                awake_count = bu_step(g, &parent, &front, &curr);
                front.swap(&mut curr);
                if !(awake_count >= old_awake_count || awake_count > n / beta) {
                    break;
                }
            }
            bitmap_to_queue(g, &front, &frontier, &qlock);
            scout_count = 1;
        } else {
            edges_to_check -= scout_count;
            scout_count = td_step(g, &parent, &frontier, &qlock, &plocks);
            frontier.slide_window();
        }
    }
    // Unreached vertices still carry negated degrees; fold them to -1.
    for lp in 0..vp.local_width() {
        if parent.read(lp) < -1 {
            parent.write(lp, -1);
        }
    }
    rank.barrier();
    Ok(parent)
}

/// Serial reference check: recompute depths from `source` and validate this
/// rank's slice of the parent array — source terminal, edge existence,
/// depth consistency, and reachability agreement. Non-fatal; returns the
/// global verdict on every rank.
pub fn bfs_verifier(g: &Ugraph, source: NodeId, parent: &Pvector<NodeId>) -> bool {
    let vp = g.partition();
    let n = g.num_nodes() as usize;
    let mut depth = vec![-1i64; n];
    depth[source as usize] = 0;
    let mut to_visit = Vec::with_capacity(n);
    to_visit.push(source);
    let mut at = 0;
    while at < to_visit.len() {
        let u = to_visit[at];
        at += 1;
        for v in g.out_neigh(u) {
            if depth[v as usize] == -1 {
                depth[v as usize] = depth[u as usize] + 1;
                to_visit.push(v);
            }
        }
    }
    let mut ok = true;
    for u in vp.start..vp.end {
        let pu = parent.read(vp.local_pos(u));
        if depth[u as usize] != -1 && pu != -1 {
            if u == source {
                if !(pu == u && depth[u as usize] == 0) {
                    println!("Source wrong");
                    ok = false;
                }
                continue;
            }
            let mut parent_found = false;
            for v in g.in_neigh(u) {
                if v == pu {
                    if depth[v as usize] != depth[u as usize] - 1 {
                        println!("Wrong depths for {u} & {v}");
                        ok = false;
                    }
                    parent_found = true;
                    break;
                }
            }
            if !parent_found {
                println!("Couldn't find edge from {pu} to {u}");
                ok = false;
            }
        } else if depth[u as usize] != pu {
            println!("Reachability mismatch for {u}");
            ok = false;
        }
    }
    g.rank().min_i64(ok as i64) == 1
}
