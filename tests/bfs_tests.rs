//! End-to-end BFS scenarios, identical under every rank count.

mod util;

use std::path::PathBuf;
use symgraph::prelude::*;

#[test]
fn path_graph_parents() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3), (3, 4), (4, 5)];
    for &npes in util::RANK_COUNTS {
        let parents = util::bfs_parents(&edges, true, 0, npes);
        assert_eq!(parents, vec![0, 0, 1, 2, 3, 4], "npes={npes}");
    }
}

#[test]
fn triangle_parents() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2)];
    for &npes in util::RANK_COUNTS {
        let parents = util::bfs_parents(&edges, true, 0, npes);
        assert_eq!(parents, vec![0, 0, 0], "npes={npes}");
    }
}

#[test]
fn complete_graph_depths() {
    let edges = [(0i64, 1i64), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    for &npes in util::RANK_COUNTS {
        let parents = util::bfs_parents(&edges, true, 0, npes);
        assert_eq!(parents[0], 0);
        for u in 1..4 {
            assert_eq!(parents[u], 0, "depth-1 vertex {u} at npes={npes}");
        }
    }
}

#[test]
fn disconnected_component_stays_unreached() {
    let edges = [(0i64, 1i64), (1, 2), (0, 2), (3, 4)];
    for &npes in util::RANK_COUNTS {
        let parents = util::bfs_parents(&edges, true, 0, npes);
        assert_eq!(parents[3], -1, "npes={npes}");
        assert_eq!(parents[4], -1, "npes={npes}");
        assert_eq!(&parents[..3], &[0, 0, 0]);
    }
}

#[test]
fn directed_path_follows_edge_direction() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3)];
    for &npes in util::RANK_COUNTS {
        let parents = util::bfs_parents(&edges, false, 0, npes);
        assert_eq!(parents, vec![0, 0, 1, 2], "npes={npes}");
        let from_sink = util::bfs_parents(&edges, false, 3, npes);
        assert_eq!(from_sink, vec![-1, -1, -1, 3], "npes={npes}");
    }
}

#[test]
fn bfs_is_idempotent() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3), (0, 3), (1, 3)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    World::launch(4, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        let first = dobfs(&g, 1, ALPHA, BETA)?.local_to_vec();
        let second = dobfs(&g, 1, ALPHA, BETA)?.local_to_vec();
        assert_eq!(first, second);
        Ok(())
    })
    .unwrap();
}

#[test]
fn verifier_accepts_kernel_output() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3), (3, 4), (4, 0), (1, 3)];
    for &npes in &[1usize, 2, 4] {
        let file = util::edge_list_file(&edges);
        let path: PathBuf = file.path().into();
        World::launch(npes, |rank| {
            let g = util::build_ugraph(rank, &path, true)?;
            let parent = dobfs(&g, 2, ALPHA, BETA)?;
            assert!(bfs_verifier(&g, 2, &parent));
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn verifier_rejects_a_corrupted_tree() {
    let edges = [(0i64, 1i64), (1, 2), (2, 3)];
    let file = util::edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    World::launch(2, |rank| {
        let g = util::build_ugraph(rank, &path, true)?;
        let parent = dobfs(&g, 0, ALPHA, BETA)?;
        // Break one entry: claim 3's parent is 0 (no such edge).
        let vp = g.partition();
        if vp.contains(3) {
            parent.write(vp.local_pos(3), 0);
        }
        g.rank().barrier();
        assert!(!bfs_verifier(&g, 0, &parent));
        Ok(())
    })
    .unwrap();
}
