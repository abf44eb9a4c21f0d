//! Distributed CSR construction: degree counting, canonicalization, edge
//! totals, and the serialized round trip.

mod util;

use std::path::PathBuf;
use symgraph::graph::reader;
use symgraph::prelude::*;

/// Gather every rank's neighbor lists as (vertex, sorted neighbors).
fn gather_adjacency(g: &Ugraph) -> Vec<(i64, Vec<i64>)> {
    (0..g.num_nodes())
        .map(|u| (u, g.out_neigh_vec(u)))
        .collect()
}

#[test]
fn csr_matches_reference_adjacency() {
    let edges = [(0i64, 1i64), (0, 2), (1, 2), (2, 3), (4, 1)];
    for &npes in util::RANK_COUNTS {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        let adjacencies = World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            assert!(!g.directed());
            assert_eq!(g.num_nodes(), 5);
            assert_eq!(g.num_edges_directed(), 10);
            assert_eq!(g.num_edges(), 5);
            Ok(gather_adjacency(&g))
        })
        .unwrap();
        let expected = vec![
            (0, vec![1, 2]),
            (1, vec![0, 2, 4]),
            (2, vec![0, 1, 3]),
            (3, vec![2]),
            (4, vec![1]),
        ];
        for adj in adjacencies {
            assert_eq!(adj, expected, "npes={npes}");
        }
    }
}

#[test]
fn squish_sorts_dedups_and_drops_self_loops() {
    // Duplicates, a self-loop, and unsorted input.
    let edges = [(2i64, 1i64), (0, 1), (0, 1), (1, 1), (2, 0), (1, 0)];
    for &npes in &[1usize, 2, 4] {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            for u in 0..g.num_nodes() {
                let run = g.out_neigh_vec(u);
                assert!(run.windows(2).all(|w| w[0] < w[1]), "list not strict");
                assert!(!run.contains(&u), "self-loop survived");
            }
            // (0,1) twice and (1,0) collapse into one undirected edge.
            assert_eq!(gather_adjacency(&g)[0].1, vec![1, 2]);
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn directed_graph_builds_both_sides() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3)];
    for &npes in &[1usize, 2, 4] {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, false)?;
            assert!(g.directed());
            assert_eq!(g.num_edges_directed(), 3);
            assert_eq!(g.out_neigh_vec(1), vec![2]);
            assert_eq!(g.in_neigh_vec(1), vec![0]);
            assert_eq!(g.in_neigh_vec(0), Vec::<i64>::new());
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn weighted_lists_keep_weights_through_squish() {
    let edges = [(0i64, 1i64, 4i64), (1, 2, 7), (0, 2, 1)];
    for &npes in &[1usize, 2] {
        let file = util::weighted_edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        World::launch(npes, |rank| {
            let g = util::build_wgraph(rank, &path, true)?;
            assert_eq!(
                g.out_neigh_vec(0),
                vec![WNode { v: 1, w: 4 }, WNode { v: 2, w: 1 }]
            );
            assert_eq!(
                g.out_neigh_vec(2),
                vec![WNode { v: 0, w: 1 }, WNode { v: 1, w: 7 }]
            );
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn generator_is_identical_across_rank_counts() {
    let mut reference: Option<Vec<(i64, i64)>> = None;
    for &npes in util::RANK_COUNTS {
        let shares = World::launch(npes, |rank| {
            let el = symgraph::graph::generator::Generator::new(6, 4)
                .generate::<NodeId>(rank, true);
            // Tag each edge with its global index for order-insensitive
            // comparison.
            Ok(el
                .iter()
                .enumerate()
                .map(|(j, e)| (rank.pe() as u64 + j as u64 * rank.npes() as u64, e.u, e.v))
                .collect::<Vec<_>>())
        })
        .unwrap();
        let mut tagged: Vec<(u64, i64, i64)> = shares.into_iter().flatten().collect();
        tagged.sort_unstable();
        let flat: Vec<(i64, i64)> = tagged.into_iter().map(|(_, u, v)| (u, v)).collect();
        match &reference {
            None => reference = Some(flat),
            Some(r) => assert_eq!(&flat, r, "generator diverged at npes={npes}"),
        }
    }
}

#[test]
fn serialized_round_trip_is_byte_identical() {
    let edges = [(0i64, 1i64), (0, 2), (1, 2), (2, 3), (4, 1), (3, 4)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let dir = tempfile::tempdir().unwrap();
    let sg1 = dir.path().join("first.sg");
    let sg2 = dir.path().join("second.sg");
    for &npes in &[1usize, 2, 4] {
        World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            reader::write_serialized(&g, &sg1)?;
            let reloaded = reader::read_serialized::<NodeId>(rank, &sg1)?;
            assert_eq!(reloaded.num_nodes(), g.num_nodes());
            assert_eq!(reloaded.num_edges_directed(), g.num_edges_directed());
            for u in 0..g.num_nodes() {
                assert_eq!(reloaded.out_neigh_vec(u), g.out_neigh_vec(u));
            }
            reader::write_serialized(&reloaded, &sg2)?;
            Ok(())
        })
        .unwrap();
        let b1 = std::fs::read(&sg1).unwrap();
        let b2 = std::fs::read(&sg2).unwrap();
        assert_eq!(b1, b2, "round trip not byte-identical at npes={npes}");
        std::fs::remove_file(&sg1).unwrap();
        std::fs::remove_file(&sg2).unwrap();
    }
}

#[test]
fn weighted_serialized_round_trip() {
    let edges = [(0i64, 1i64, 3i64), (1, 2, 5), (2, 0, 9)];
    let file = util::weighted_edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let dir = tempfile::tempdir().unwrap();
    let wsg = dir.path().join("g.wsg");
    World::launch(2, |rank| {
        let g = util::build_wgraph(rank, &path, true)?;
        reader::write_serialized(&g, &wsg)?;
        let reloaded = reader::read_serialized::<WNode>(rank, &wsg)?;
        for u in 0..g.num_nodes() {
            assert_eq!(reloaded.out_neigh_vec(u), g.out_neigh_vec(u));
        }
        Ok(())
    })
    .unwrap();
}

#[test]
fn mismatched_serialized_payload_is_rejected() {
    let edges = [(0i64, 1i64)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let dir = tempfile::tempdir().unwrap();
    let sg = dir.path().join("g.sg");
    World::launch(1, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        reader::write_serialized(&g, &sg)?;
        Ok(())
    })
    .unwrap();
    let result = World::launch(1, |rank| {
        reader::read_serialized::<WNode>(rank, &sg).map(|_| ())
    });
    assert!(matches!(result, Err(SymGraphError::UnknownFormat(_))));
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    use std::io::Write;
    writeln!(f, "# header comment").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "0 1").unwrap();
    writeln!(f, "  # indented comment").unwrap();
    writeln!(f, "1 2").unwrap();
    f.flush().unwrap();
    let path: PathBuf = f.path().into();
    World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn malformed_lines_are_reported_with_location() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    use std::io::Write;
    writeln!(f, "0 1").unwrap();
    writeln!(f, "2 banana").unwrap();
    f.flush().unwrap();
    let path: PathBuf = f.path().into();
    let result = World::launch(1, |rank| util::build_ugraph(rank, &path, true).map(|_| ()));
    match result {
        Err(SymGraphError::ParseEdge { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected ParseEdge, got {other:?}"),
    }
}
