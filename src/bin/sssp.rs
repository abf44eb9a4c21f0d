//! Single-source shortest-paths harness.

use symgraph::bench::{benchmark_kernel, print_count, print_step};
use symgraph::cli::Args;
use symgraph::graph::{Weight, Wgraph};
use symgraph::kernels::sssp::{delta_step, sssp_verifier, DIST_INF};
use symgraph::prelude::*;
use std::path::Path;
use std::time::Instant;

fn print_sssp_stats(g: &Wgraph, dist: &Pvector<Weight>) {
    let vp = g.partition();
    let reached = (0..vp.local_width())
        .filter(|&i| dist.read(i) != DIST_INF)
        .count() as i64;
    let reached = g.rank().sum_i64(reached);
    if g.rank().pe() == 0 {
        println!("SSSP Tree reaches {reached} nodes");
    }
}

fn main() {
    let args = Args::parse_or_exit("sssp");
    let source_spec = args.graph_source().unwrap_or_else(|e| {
        eprintln!("sssp: {e}");
        std::process::exit(-1);
    });
    let result = World::launch(args.ranks, |rank| {
        let builder = Builder::<WNode>::new(rank, args.symmetrize);
        let build_start = Instant::now();
        let g = builder.make_graph(&source_spec)?;
        print_step(rank, "Build Time", build_start.elapsed().as_secs_f64());

        let mut sp = SourcePicker::new(&g, args.start_vertex);
        benchmark_kernel(
            &g,
            args.effective_trials(),
            |g| {
                let source = sp.pick_next();
                print_count(g.rank(), "Source", source);
                delta_step(g, source, args.delta)
            },
            args.analysis.then_some(print_sssp_stats),
            args.verify
                .then_some(|g: &Wgraph, dist: &Pvector<Weight>| {
                    sssp_verifier(g, dist, Path::new("sssp_output.txt"))
                }),
        )
    });
    if let Err(e) = result {
        eprintln!("sssp: {e}");
        std::process::exit(Args::exit_code(&e));
    }
}
