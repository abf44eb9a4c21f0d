#![allow(dead_code)]
//! Shared helpers for the integration tests: temp-file edge lists and
//! kernel drivers that assemble the global result from per-rank slices.

use std::io::Write;
use std::path::{Path, PathBuf};
use symgraph::prelude::*;
use tempfile::NamedTempFile;

/// Rank counts every end-to-end scenario is checked under.
pub const RANK_COUNTS: &[usize] = &[1, 2, 4, 8];

/// Write an unweighted edge list, one `u v` per line.
pub fn edge_list_file(edges: &[(i64, i64)]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "# generated by a test").unwrap();
    for (u, v) in edges {
        writeln!(f, "{u} {v}").unwrap();
    }
    f.flush().unwrap();
    f
}

/// Write a weighted edge list, one `u v w` per line.
pub fn weighted_edge_list_file(edges: &[(i64, i64, i64)]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    for (u, v, w) in edges {
        writeln!(f, "{u} {v} {w}").unwrap();
    }
    f.flush().unwrap();
    f
}

/// Build an unweighted graph on every rank from a file path.
pub fn build_ugraph(
    rank: &Rank,
    path: &Path,
    symmetrize: bool,
) -> Result<Ugraph, SymGraphError> {
    Builder::<NodeId>::new(rank, symmetrize).make_graph(&GraphSource::File(path.to_path_buf()))
}

/// Build a weighted graph on every rank from a file path.
pub fn build_wgraph(
    rank: &Rank,
    path: &Path,
    symmetrize: bool,
) -> Result<Wgraph, SymGraphError> {
    Builder::<WNode>::new(rank, symmetrize).make_graph(&GraphSource::File(path.to_path_buf()))
}

/// Run BFS under `ranks` ranks and return the full parent vector.
pub fn bfs_parents(
    edges: &[(i64, i64)],
    symmetrize: bool,
    source: i64,
    ranks: usize,
) -> Vec<i64> {
    let file = edge_list_file(edges);
    let path: PathBuf = file.path().into();
    World::launch(ranks, |rank| {
        let g = build_ugraph(rank, &path, symmetrize)?;
        let parent = dobfs(&g, source, ALPHA, BETA)?;
        Ok(parent.local_to_vec())
    })
    .unwrap()
    .into_iter()
    .flatten()
    .collect()
}

/// Run SSSP under `ranks` ranks and return the full distance vector.
pub fn sssp_dists(
    edges: &[(i64, i64, i64)],
    symmetrize: bool,
    source: i64,
    delta: i64,
    ranks: usize,
) -> Vec<i64> {
    let file = weighted_edge_list_file(edges);
    let path: PathBuf = file.path().into();
    World::launch(ranks, |rank| {
        let g = build_wgraph(rank, &path, symmetrize)?;
        let dist = delta_step(&g, source, delta)?;
        Ok(dist.local_to_vec())
    })
    .unwrap()
    .into_iter()
    .flatten()
    .collect()
}

/// Run the triangle count under `ranks` ranks.
pub fn triangle_count(edges: &[(i64, i64)], ranks: usize) -> u64 {
    let file = edge_list_file(edges);
    let path: PathBuf = file.path().into();
    let counts = World::launch(ranks, |rank| {
        let g = build_ugraph(rank, &path, true)?;
        Ok(ordered_count(&g))
    })
    .unwrap();
    for c in &counts {
        assert_eq!(*c, counts[0], "ranks disagree on the triangle total");
    }
    counts[0]
}
