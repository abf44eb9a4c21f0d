//! Trial harness shared by the kernel binaries: timed trials, per-step
//! labels, optional analysis and verification.
//!
//! Output is plain stdout lines from rank 0 only, keeping the SPMD console
//! readable under any launcher.

use crate::error::SymGraphError;
use crate::graph::{Destination, Graph};
use crate::runtime::Rank;
use std::time::Instant;

/// Print a labeled step time from rank 0.
pub fn print_step(rank: &Rank, label: &str, seconds: f64) {
    if rank.pe() == 0 {
        println!("{label:>21}: {seconds:3.5}");
    }
}

/// Print a labeled count from rank 0.
pub fn print_count(rank: &Rank, label: &str, count: i64) {
    if rank.pe() == 0 {
        println!("{label:>21}: {count}");
    }
}

/// Run `kernel` for `trials` timed rounds, optionally analyzing and
/// verifying each result. Verification mismatch is a warning, not an error.
pub fn benchmark_kernel<D: Destination, R>(
    g: &Graph<D>,
    trials: usize,
    mut kernel: impl FnMut(&Graph<D>) -> Result<R, SymGraphError>,
    mut analyze: Option<impl FnMut(&Graph<D>, &R)>,
    mut verify: Option<impl FnMut(&Graph<D>, &R) -> Result<bool, SymGraphError>>,
) -> Result<(), SymGraphError> {
    let rank = g.rank();
    let mut total = 0.0f64;
    for _ in 0..trials {
        rank.barrier();
        let started = Instant::now();
        let result = kernel(g)?;
        rank.barrier();
        let seconds = started.elapsed().as_secs_f64();
        print_step(rank, "Trial Time", seconds);
        total += seconds;
        if let Some(analyze) = analyze.as_mut() {
            analyze(g, &result);
        }
        if let Some(verify) = verify.as_mut() {
            let ok = verify(g, &result)?;
            if rank.pe() == 0 {
                println!(
                    "{:>21}: {}",
                    "Verification",
                    if ok { "PASS" } else { "FAIL" }
                );
            }
        }
    }
    print_step(rank, "Average Time", total / trials.max(1) as f64);
    Ok(())
}
