//! Breadth-first search harness: build, run timed trials, optionally
//! analyze and verify.

use symgraph::bench::{benchmark_kernel, print_count, print_step};
use symgraph::cli::Args;
use symgraph::graph::{NodeId, SourcePicker, Ugraph};
use symgraph::kernels::bfs::{bfs_verifier, dobfs, ALPHA, BETA};
use symgraph::prelude::*;
use std::time::Instant;

fn print_bfs_stats(g: &Ugraph, parent: &Pvector<NodeId>) {
    let vp = g.partition();
    let mut tree_size: i64 = 0;
    let mut n_edges: i64 = 0;
    for n in vp.start..vp.end {
        if parent.read(vp.local_pos(n)) >= 0 {
            n_edges += g.out_degree(n);
            tree_size += 1;
        }
    }
    let tree_size = g.rank().sum_i64(tree_size);
    let n_edges = g.rank().sum_i64(n_edges);
    if g.rank().pe() == 0 {
        println!("BFS Tree has {tree_size} nodes and {n_edges} edges");
    }
}

fn main() {
    let args = Args::parse_or_exit("bfs");
    let source_spec = args.graph_source().unwrap_or_else(|e| {
        eprintln!("bfs: {e}");
        std::process::exit(-1);
    });
    let result = World::launch(args.ranks, |rank| {
        let builder = Builder::<NodeId>::new(rank, args.symmetrize);
        let build_start = Instant::now();
        let g = builder.make_graph(&source_spec)?;
        print_step(rank, "Build Time", build_start.elapsed().as_secs_f64());
        print_count(rank, "Graph Nodes", g.num_nodes());
        print_count(rank, "Graph Edges", g.num_edges());

        let mut sp = SourcePicker::new(&g, args.start_vertex);
        let mut vsp = SourcePicker::new(&g, args.start_vertex);
        benchmark_kernel(
            &g,
            args.effective_trials(),
            |g| {
                let source = sp.pick_next();
                print_count(g.rank(), "Source", source);
                dobfs(g, source, ALPHA, BETA)
            },
            args.analysis.then_some(print_bfs_stats),
            args.verify
                .then_some(|g: &Ugraph, parent: &Pvector<NodeId>| {
                    Ok(bfs_verifier(g, vsp.pick_next(), parent))
                }),
        )
    });
    if let Err(e) = result {
        eprintln!("bfs: {e}");
        std::process::exit(Args::exit_code(&e));
    }
}
