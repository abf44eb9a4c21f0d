//! End-to-end delta-stepping scenarios, identical under every rank count.

mod util;

use std::path::PathBuf;
use symgraph::kernels::sssp::DIST_INF;
use symgraph::prelude::*;

#[test]
fn path_graph_distances() {
    let edges = [(0i64, 1i64, 1i64), (1, 2, 1), (2, 3, 1), (3, 4, 1), (4, 5, 1)];
    for &npes in util::RANK_COUNTS {
        let dist = util::sssp_dists(&edges, true, 0, 1, npes);
        assert_eq!(dist, vec![0, 1, 2, 3, 4, 5], "npes={npes}");
    }
}

#[test]
fn triangle_distances() {
    let edges = [(0i64, 1i64, 1i64), (1, 2, 1), (0, 2, 1)];
    for &npes in util::RANK_COUNTS {
        let dist = util::sssp_dists(&edges, true, 0, 1, npes);
        assert_eq!(dist, vec![0, 1, 1], "npes={npes}");
    }
}

#[test]
fn weighted_diamond_with_delta_two() {
    let edges = [
        (0i64, 1i64, 1i64),
        (0, 2, 4),
        (1, 2, 2),
        (2, 3, 1),
        (1, 3, 5),
    ];
    for &npes in util::RANK_COUNTS {
        let dist = util::sssp_dists(&edges, true, 0, 2, npes);
        assert_eq!(dist, vec![0, 1, 3, 4], "npes={npes}");
    }
}

#[test]
fn disconnected_vertices_stay_at_infinity() {
    let edges = [(0i64, 1i64, 2i64), (1, 2, 2), (0, 2, 2), (3, 4, 2)];
    for &npes in util::RANK_COUNTS {
        let dist = util::sssp_dists(&edges, true, 0, 2, npes);
        assert_eq!(&dist[..3], &[0, 2, 2], "npes={npes}");
        assert_eq!(dist[3], DIST_INF, "npes={npes}");
        assert_eq!(dist[4], DIST_INF, "npes={npes}");
    }
}

#[test]
fn directed_weighted_edges_relax_one_way() {
    let edges = [(0i64, 1i64, 3i64), (1, 2, 4), (2, 0, 1)];
    for &npes in &[1usize, 2, 4] {
        let dist = util::sssp_dists(&edges, false, 0, 3, npes);
        assert_eq!(dist, vec![0, 3, 7], "npes={npes}");
        let from_two = util::sssp_dists(&edges, false, 2, 3, npes);
        assert_eq!(from_two, vec![1, 4, 0], "npes={npes}");
    }
}

#[test]
fn triangle_inequality_holds_on_a_random_graph() {
    // Deterministic scale-6 synthetic graph, checked against the relaxation
    // law rather than a golden vector.
    for &npes in &[1usize, 2, 4] {
        World::launch(npes, |rank| {
            let builder = Builder::<WNode>::new(rank, true);
            let g = builder.make_graph(&GraphSource::Synthetic {
                scale: 5,
                degree: 4,
                uniform: true,
            })?;
            let dist = delta_step(&g, 0, 8)?;
            let vp = g.partition();
            assert_eq!(
                if vp.contains(0) {
                    dist.read(vp.local_pos(0))
                } else {
                    0
                },
                0
            );
            for u in vp.start..vp.end {
                let du = dist.read(vp.local_pos(u));
                if du == DIST_INF {
                    continue;
                }
                for wn in g.out_neigh_vec(u) {
                    let dv = dist.get_global(vp, wn.v);
                    assert!(
                        dv <= du + wn.w,
                        "edge ({u},{}) violates relaxation: {dv} > {du}+{}",
                        wn.v,
                        wn.w
                    );
                }
            }
            Ok(())
        })
        .unwrap();
    }
}

#[test]
fn sssp_is_idempotent() {
    let edges = [(0i64, 1i64, 2i64), (1, 2, 3), (0, 2, 9), (2, 3, 1)];
    let file = util::weighted_edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    World::launch(4, |rank| {
        let g = util::build_wgraph(rank, &path, true)?;
        let first = delta_step(&g, 0, 2)?.local_to_vec();
        let second = delta_step(&g, 0, 2)?.local_to_vec();
        assert_eq!(first, second);
        Ok(())
    })
    .unwrap();
}

#[test]
fn verifier_appends_distances_in_global_order() {
    let edges = [(0i64, 1i64, 1i64), (1, 2, 1), (2, 3, 1)];
    let file = util::weighted_edge_list_file(&edges);
    let path: PathBuf = file.path().into();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sssp_output.txt");
    for &npes in &[1usize, 2, 4] {
        World::launch(npes, |rank| {
            let g = util::build_wgraph(rank, &path, true)?;
            let dist = delta_step(&g, 0, 1)?;
            assert!(sssp_verifier(&g, &dist, &out)?);
            Ok(())
        })
        .unwrap();
    }
    let contents = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // Three appended runs of the same four distances.
    assert_eq!(lines.len(), 12);
    for run in lines.chunks(4) {
        assert_eq!(run, ["0", "1", "2", "3"]);
    }
}
