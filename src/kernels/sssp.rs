//! Single-source shortest paths by delta-stepping with bucket fusion.
//!
//! Tentative distances live in a partitioned vector updated only through
//! one-sided compare-and-swaps. Work is organized into buckets of width
//! `delta` (Meyer and Sanders, "Δ-stepping: a parallelizable shortest path
//! algorithm"); each iteration relaxes the current shared bucket in two
//! phases separated by barriers, with short same-priority local bins drained
//! in the same iteration (bucket fusion, after Zhang et al., CGO 2020).
//!
//! The shared frontier double-buffers through two-element symmetric arrays
//! keyed by `iter & 1`: bucket indexes in `shared_indexes`, frontier
//! lengths in `frontier_tails`. A vertex once binned is never removed; stale
//! entries are skipped by the `dist[u] >= delta * curr_bin` guard.

use crate::data::Pvector;
use crate::error::SymGraphError;
use crate::graph::{NodeId, Weight, Wgraph};
use crate::partition::Partition;
use crate::runtime::{Cmp, Rank};

/// Distance of an unreachable vertex.
pub const DIST_INF: Weight = Weight::MAX / 2;
/// Bucket index meaning "no bucket anywhere".
const MAX_BIN: u64 = u64::MAX / 2;
/// Local bins at most this long are fused into the current iteration.
const BIN_SIZE_THRESHOLD: usize = 1000;

/// Relax every outgoing edge of `u`, filing improved vertices into the
/// rank-local bins by their new bucket.
fn relax_edges(
    g: &Wgraph,
    vp: &Partition,
    dist: &Pvector<Weight>,
    delta: Weight,
    u: NodeId,
    local_bins: &mut Vec<Vec<NodeId>>,
) {
    let du = dist.sym().get_from(vp.owner(u), vp.local_pos(u));
    for wn in g.out_neigh(u) {
        let owner = vp.owner(wn.v);
        let lp = vp.local_pos(wn.v);
        let new_dist = du + wn.w;
        let mut old_dist = dist.sym().get_from(owner, lp);
        while new_dist < old_dist {
            let observed = dist
                .sym()
                .compare_and_swap(owner, lp, old_dist, new_dist);
            if observed == old_dist {
                let dest_bin = (new_dist / delta) as usize;
                if dest_bin >= local_bins.len() {
                    local_bins.resize_with(dest_bin + 1, Vec::new);
                }
                local_bins[dest_bin].push(wn.v);
                break;
            }
            old_dist = observed;
        }
    }
}

/// Delta-stepping SSSP from `source` with bucket width `delta`. Collective;
/// returns the partitioned distance vector, `DIST_INF` marking unreachable
/// vertices.
pub fn delta_step(
    g: &Wgraph,
    source: NodeId,
    delta: Weight,
) -> Result<Pvector<Weight>, SymGraphError> {
    assert!(delta > 0, "delta must be positive");
    let rank = g.rank().clone();
    let vp = *g.partition();
    let pe = rank.pe();

    let dist = Pvector::filled(&rank, &vp, DIST_INF)?;
    if vp.contains(source) {
        dist.write(vp.local_pos(source), 0);
    }
    // Shared frontier, block-partitioned by whatever tail each iteration
    // settles on. A tail shorter than the edge count can hand the last rank
    // a larger share than the edge partition's own, so the backing array
    // carries `npes` words of headroom past max_width.
    let ep = Partition::new(g.num_edges_directed() as usize, &rank);
    let frontier = rank.alloc::<NodeId>(ep.max_width + rank.npes())?;

    // Double-buffered coordination words, keyed by iter & 1.
    let shared_indexes = rank.alloc::<u64>(2)?;
    shared_indexes.write(0, 0);
    shared_indexes.write(1, MAX_BIN);
    let frontier_tails = rank.alloc::<u64>(2)?;
    frontier_tails.write(0, 1);
    frontier_tails.write(1, 0);
    let iter = rank.alloc_cell::<u64>()?;

    // The initial frontier holds just the source, owned by whichever rank
    // the length-1 layout assigns slot 0.
    let seed = Partition::with_shape(1, pe, rank.npes());
    if seed.contains(0) {
        frontier.write(0, source);
    }
    let mut local_bins: Vec<Vec<NodeId>> = Vec::new();
    rank.barrier();

    while shared_indexes.read((iter.read() & 1) as usize) != MAX_BIN {
        let key = (iter.read() & 1) as usize;
        let curr_bin = shared_indexes.read(key);
        let curr_tail = frontier_tails.read(key);

        // Phase 1: relax this rank's slice of the shared frontier.
        let fp = Partition::with_shape(curr_tail as usize, pe, rank.npes());
        for i in 0..fp.local_width() {
            let u = frontier.read(i);
            let du = dist.sym().get_from(vp.owner(u), vp.local_pos(u));
            if du >= delta * curr_bin as Weight {
                relax_edges(g, &vp, &dist, delta, u, &mut local_bins);
            }
        }
        rank.barrier();

        // Bucket fusion: drain short same-priority bins without another
        // global iteration.
        while (curr_bin as usize) < local_bins.len()
            && !local_bins[curr_bin as usize].is_empty()
            && local_bins[curr_bin as usize].len() < BIN_SIZE_THRESHOLD
        {
            let drained = std::mem::take(&mut local_bins[curr_bin as usize]);
            for u in drained {
                relax_edges(g, &vp, &dist, delta, u, &mut local_bins);
            }
        }
        rank.barrier();

        // Vote: smallest non-empty local bin at or above the current one.
        let mut local_min = shared_indexes.read(key ^ 1);
        for (b, bin) in local_bins.iter().enumerate().skip(curr_bin as usize) {
            if !bin.is_empty() {
                local_min = local_min.min(b as u64);
                break;
            }
        }
        let next_bin = rank.min_u64(local_min);
        shared_indexes.write(key ^ 1, next_bin);

        // Phase 2: retire the current window, then redistribute the chosen
        // bins across the partitioned frontier.
        shared_indexes.write(key, MAX_BIN);
        frontier_tails.write(key, 0);
        rank.barrier();

        let contribution = local_bins
            .get(next_bin as usize)
            .map_or(0, |b| b.len() as u64);
        let mut copy_start = 0u64;
        if (next_bin as usize) < local_bins.len() {
            // Reserve a contiguous range off rank 0's tail counter.
            copy_start = frontier_tails.fetch_add(0, key ^ 1, contribution);
        }
        rank.barrier();
        let final_tail = rank.broadcast_u64(0, frontier_tails.read(key ^ 1));
        frontier_tails.write(key ^ 1, final_tail);
        rank.barrier();

        if contribution > 0 {
            let bin = std::mem::take(&mut local_bins[next_bin as usize]);
            scatter_frontier(&rank, &frontier, final_tail, copy_start, &bin);
        }
        rank.barrier();
        iter.write(iter.read() + 1);
        rank.barrier();
    }
    Ok(dist)
}

/// Write `bin` into the partitioned frontier at global position
/// `copy_start`, splitting across partition boundaries where the
/// contribution spans ranks.
fn scatter_frontier(
    rank: &Rank,
    frontier: &crate::runtime::SymSlice<NodeId>,
    final_tail: u64,
    copy_start: u64,
    bin: &[NodeId],
) {
    let nftp = Partition::with_shape(final_tail as usize, rank.pe(), rank.npes());
    let mut owner = nftp.owner(copy_start as i64);
    let mut local_start = nftp.local_pos(copy_start as i64);
    let mut prior = 0usize;
    while prior < bin.len() {
        let logical = if owner == nftp.npes - 1 {
            nftp.max_width
        } else {
            nftp.width
        };
        let room = logical - local_start;
        let remaining = bin.len() - prior;
        if room < remaining {
            frontier.put_slice_to(owner, local_start, &bin[prior..prior + room]);
            prior += room;
            owner += 1;
            local_start = 0;
        } else {
            frontier.put_slice_to(owner, local_start, &bin[prior..]);
            break;
        }
    }
}

/// Append the full distance vector to `path`, one value per line in global
/// vertex order; ranks serialize their turns through the printer token.
pub fn sssp_verifier(
    g: &Wgraph,
    dist: &Pvector<Weight>,
    path: &std::path::Path,
) -> Result<bool, SymGraphError> {
    use std::io::Write;
    let rank = g.rank();
    let vp = g.partition();
    let printer = rank.alloc_cell::<i64>()?;
    printer.write(0);
    rank.barrier();
    printer.wait_until(Cmp::Eq, rank.pe() as i64);
    let mut out = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for n in vp.start..vp.end {
        writeln!(out, "{}", dist.read(vp.local_pos(n)))?;
    }
    out.flush()?;
    if rank.pe() + 1 < rank.npes() {
        printer.put_to(rank.pe() + 1, (rank.pe() + 1) as i64);
    }
    rank.barrier();
    Ok(true)
}
