//! Shared command-line surface for the kernel binaries.
//!
//! Flags mirror the common benchmark harness: `-f`/`--sf` file inputs,
//! `-g`/`-u` synthetic scales with `-k` average degree, `-s` symmetrize,
//! `-r` fixed source, `-n`/`-i` trial counts, `-v` verify, `-a` analysis,
//! and `-d` delta for SSSP, plus `--ranks` sizing the in-process SPMD
//! group. Exit codes: 0 success, −1 CLI error, −2 kernel precondition
//! violation, 1 fatal internal error.

use crate::error::SymGraphError;
use crate::graph::builder::GraphSource;
use crate::graph::{NodeId, Weight};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments shared by the kernel binaries.
#[derive(Parser, Debug)]
pub struct Args {
    /// Load a graph from FILE (edge list, .sg, or .wsg).
    #[arg(short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Load an already-symmetrized graph from FILE.
    #[arg(long = "sf", value_name = "FILE")]
    pub symmetrized_file: Option<PathBuf>,

    /// Generate a Kronecker graph with 2^SCALE vertices.
    #[arg(short = 'g', value_name = "SCALE")]
    pub kronecker_scale: Option<u32>,

    /// Generate a uniform-random graph with 2^SCALE vertices.
    #[arg(short = 'u', value_name = "SCALE")]
    pub uniform_scale: Option<u32>,

    /// Average degree for synthetic graphs.
    #[arg(short = 'k', value_name = "DEG", default_value_t = 16)]
    pub degree: u32,

    /// Symmetrize the input graph.
    #[arg(short = 's')]
    pub symmetrize: bool,

    /// Start every trial from vertex SRC instead of random sources.
    #[arg(short = 'r', value_name = "SRC")]
    pub start_vertex: Option<NodeId>,

    /// Number of timed trials.
    #[arg(short = 'n', value_name = "TRIALS")]
    pub trials: Option<usize>,

    /// Iteration count (accepted alongside -n; the larger drives the loop).
    #[arg(short = 'i', value_name = "ITERS")]
    pub iterations: Option<usize>,

    /// Verify each trial's output.
    #[arg(short = 'v')]
    pub verify: bool,

    /// Print analysis of each trial's output.
    #[arg(short = 'a')]
    pub analysis: bool,

    /// Bucket width for delta-stepping.
    #[arg(short = 'd', value_name = "DELTA", default_value_t = 1)]
    pub delta: Weight,

    /// Ranks in the SPMD group.
    #[arg(long = "ranks", value_name = "N", default_value_t = 1)]
    pub ranks: usize,
}

impl Args {
    /// Parse the process arguments, printing usage and exiting −1 on error.
    pub fn parse_or_exit(kernel: &str) -> Args {
        match Args::try_parse() {
            Ok(args) => {
                if args.file.is_none()
                    && args.symmetrized_file.is_none()
                    && args.kronecker_scale.is_none()
                    && args.uniform_scale.is_none()
                {
                    eprintln!("{kernel}: no graph specified (use -f, --sf, -g, or -u)");
                    std::process::exit(-1);
                }
                args
            }
            Err(e) => {
                let _ = e.print();
                let code = match e.kind() {
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                    _ => -1,
                };
                std::process::exit(code);
            }
        }
    }

    /// Resolve the graph source in the harness's priority order.
    pub fn graph_source(&self) -> Result<GraphSource, SymGraphError> {
        if let Some(p) = &self.symmetrized_file {
            return Ok(GraphSource::SymmetrizedFile(p.clone()));
        }
        if let Some(p) = &self.file {
            return Ok(GraphSource::File(p.clone()));
        }
        if let Some(scale) = self.kronecker_scale {
            return Ok(GraphSource::Synthetic {
                scale,
                degree: self.degree,
                uniform: false,
            });
        }
        if let Some(scale) = self.uniform_scale {
            return Ok(GraphSource::Synthetic {
                scale,
                degree: self.degree,
                uniform: true,
            });
        }
        Err(SymGraphError::NoInput)
    }

    /// Effective trial count: the larger of `-n` and `-i`, default 16.
    pub fn effective_trials(&self) -> usize {
        self.trials
            .unwrap_or(0)
            .max(self.iterations.unwrap_or(0))
            .max(if self.trials.is_none() && self.iterations.is_none() {
                16
            } else {
                1
            })
    }

    /// Map an error from a launched kernel to the harness exit code.
    pub fn exit_code(err: &SymGraphError) -> i32 {
        match err {
            SymGraphError::DirectedGraph => -2,
            SymGraphError::GlobalExit(code) => *code,
            SymGraphError::Io(_)
            | SymGraphError::ParseEdge { .. }
            | SymGraphError::UnknownFormat(_)
            | SymGraphError::CorruptGraph(_)
            | SymGraphError::NoInput => -1,
            _ => 1,
        }
    }
}
