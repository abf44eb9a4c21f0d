//! Triangle-counting harness. Requires an undirected input graph.

use symgraph::bench::{benchmark_kernel, print_step};
use symgraph::cli::Args;
use symgraph::graph::Ugraph;
use symgraph::kernels::tc::{hybrid, tc_verifier};
use symgraph::prelude::*;
use std::path::Path;
use std::time::Instant;

fn print_triangle_stats(g: &Ugraph, total: &u64) {
    if g.rank().pe() == 0 {
        println!("{total} triangles");
    }
}

fn main() {
    let args = Args::parse_or_exit("tc");
    let source_spec = args.graph_source().unwrap_or_else(|e| {
        eprintln!("tc: {e}");
        std::process::exit(-1);
    });
    let result = World::launch(args.ranks, |rank| {
        let builder = Builder::<NodeId>::new(rank, args.symmetrize);
        let build_start = Instant::now();
        let g = builder.make_graph(&source_spec)?;
        print_step(rank, "Build Time", build_start.elapsed().as_secs_f64());
        if g.directed() {
            if rank.pe() == 0 {
                eprintln!("Input graph is directed but tc requires undirected");
            }
            return Err(SymGraphError::DirectedGraph);
        }

        benchmark_kernel(
            &g,
            args.effective_trials(),
            |g| hybrid(g),
            args.analysis.then_some(print_triangle_stats),
            args.verify
                .then_some(|g: &Ugraph, total: &u64| {
                    tc_verifier(g, *total, Path::new("tc_output.txt"))
                }),
        )
    });
    if let Err(e) = result {
        eprintln!("tc: {e}");
        std::process::exit(Args::exit_code(&e));
    }
}
