//! Triangle counting and the degree-relabeling path.

mod util;

use std::path::PathBuf;
use symgraph::graph::builder::relabel_by_degree;
use symgraph::prelude::*;

/// Reference count: enumerate all vertex triples.
fn brute_force_triangles(n: i64, edges: &[(i64, i64)]) -> u64 {
    let mut adj = vec![vec![false; n as usize]; n as usize];
    for &(u, v) in edges {
        if u != v {
            adj[u as usize][v as usize] = true;
            adj[v as usize][u as usize] = true;
        }
    }
    let mut total = 0;
    for a in 0..n as usize {
        for b in a + 1..n as usize {
            for c in b + 1..n as usize {
                if adj[a][b] && adj[b][c] && adj[a][c] {
                    total += 1;
                }
            }
        }
    }
    total
}

#[test]
fn path_graph_has_no_triangles() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3), (3, 4), (4, 5)];
    for &npes in util::RANK_COUNTS {
        assert_eq!(util::triangle_count(&edges, npes), 0, "npes={npes}");
    }
}

#[test]
fn single_triangle() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2)];
    for &npes in util::RANK_COUNTS {
        assert_eq!(util::triangle_count(&edges, npes), 1, "npes={npes}");
    }
}

#[test]
fn complete_graph_k4_has_four() {
    let edges = [(0i64, 1i64), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    for &npes in util::RANK_COUNTS {
        assert_eq!(util::triangle_count(&edges, npes), 4, "npes={npes}");
    }
}

#[test]
fn triangle_plus_disconnected_edge() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2), (3, 4)];
    for &npes in util::RANK_COUNTS {
        assert_eq!(util::triangle_count(&edges, npes), 1, "npes={npes}");
    }
}

#[test]
fn matches_brute_force_on_a_denser_graph() {
    let edges = [
        (0i64, 1i64),
        (0, 2),
        (0, 3),
        (0, 4),
        (1, 2),
        (1, 4),
        (2, 3),
        (2, 5),
        (3, 4),
        (3, 5),
        (4, 5),
        (1, 5),
    ];
    let expected = brute_force_triangles(6, &edges);
    for &npes in util::RANK_COUNTS {
        assert_eq!(util::triangle_count(&edges, npes), expected, "npes={npes}");
    }
}

#[test]
fn directed_graph_is_a_precondition_error() {
    let edges = [(0i64, 1i64), (1, 2), (2, 0)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let result = World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, false)?;
        hybrid(&g).map(|_| ())
    });
    assert!(matches!(result, Err(SymGraphError::DirectedGraph)));
}

#[test]
fn relabel_preserves_the_triangle_count() {
    let edges = [
        (0i64, 1i64),
        (0, 2),
        (0, 3),
        (0, 4),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 1),
        (1, 3),
    ];
    let expected = brute_force_triangles(5, &edges);
    for &npes in util::RANK_COUNTS {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        let counts = World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            let relabeled = relabel_by_degree(&g)?;
            assert_eq!(relabeled.num_edges_directed(), g.num_edges_directed());
            Ok(ordered_count(&relabeled))
        })
        .unwrap();
        for c in counts {
            assert_eq!(c, expected, "npes={npes}");
        }
    }
}

#[test]
fn relabel_orders_ids_by_descending_degree() {
    // Star center has the highest degree, so it must become vertex 0.
    let edges = [(4i64, 0i64), (4, 1), (4, 2), (4, 3), (0, 1)];
    for &npes in &[1usize, 2, 4] {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            let relabeled = relabel_by_degree(&g)?;
            let vp = relabeled.partition();
            // Degrees, read per owner, must be non-increasing in new id.
            let local: Vec<i64> = (vp.start..vp.end)
                .map(|u| relabeled.out_degree(u))
                .collect();
            let degrees = rank.collect(&local);
            assert!(degrees.windows(2).all(|w| w[0] >= w[1]), "{degrees:?}");
            assert_eq!(degrees[0], 4);
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn relabel_rejects_directed_graphs() {
    let edges = [(0i64, 1i64), (1, 2)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let result = World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, false)?;
        relabel_by_degree(&g).map(|_| ())
    });
    assert!(matches!(result, Err(SymGraphError::DirectedGraph)));
}

#[test]
fn sparse_graphs_skip_relabelling() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        assert!(!worth_relabelling(&g));
        Ok(())
    })
    .unwrap();
}

#[test]
fn hybrid_matches_plain_count_on_synthetic_input() {
    for &npes in &[1usize, 2, 4] {
        let counts = World::launch(npes, |rank| {
            let g = Builder::<NodeId>::new(rank, true).make_graph(&GraphSource::Synthetic {
                scale: 5,
                degree: 6,
                uniform: false,
            })?;
            Ok((ordered_count(&g), hybrid(&g)?))
        })
        .unwrap();
        for (plain, hybridized) in counts {
            assert_eq!(plain, hybridized, "npes={npes}");
        }
    }
}

#[test]
fn tc_verifier_appends_the_total() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tc_output.txt");
    World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        let total = ordered_count(&g);
        assert!(tc_verifier(&g, total, &out)?);
        Ok(())
    })
    .unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "1");
}
