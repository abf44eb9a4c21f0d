//! `SymGraphError`: unified error type for the public APIs of this crate.
//!
//! Fallible operations return `Result<_, SymGraphError>` and propagate with
//! `?`. Protocol violations (queue overflow, out-of-slice indexing, prefix-sum
//! overflow) are implementation bugs and assert rather than surface here. The
//! job as a whole is fail-stop: once any rank calls
//! [`global_exit`](crate::runtime::Rank::global_exit), every rank unwinds and
//! [`World::launch`](crate::runtime::World::launch) reports `GlobalExit`.

use thiserror::Error;

/// Unified error type for symgraph operations.
#[derive(Debug, Error)]
pub enum SymGraphError {
    /// Symmetric allocation could not reserve backing storage on some rank.
    #[error("rank {pe} failed symmetric allocation of {words} words")]
    AllocFailed {
        /// Rank that observed the failure.
        pe: usize,
        /// Requested allocation size in 64-bit words.
        words: usize,
    },
    /// The process group was torn down by a collective exit.
    #[error("process group terminated with exit code {0}")]
    GlobalExit(i32),
    /// A rank thread panicked for a reason other than a collective exit.
    #[error("a rank thread panicked")]
    RankPanicked,
    /// A kernel that requires an undirected input received a directed graph.
    #[error("kernel requires an undirected graph")]
    DirectedGraph,
    /// No graph input was specified (neither a file nor generator parameters).
    #[error("no input graph specified")]
    NoInput,
    /// Underlying I/O failure while reading or writing a graph file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A line of an edge-list file did not parse.
    #[error("malformed edge list {path}:{line}: {msg}")]
    ParseEdge {
        /// Path of the offending file.
        path: String,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        msg: String,
    },
    /// File suffix does not name a readable graph format for this kernel.
    #[error("unrecognized graph file `{0}`")]
    UnknownFormat(String),
    /// A serialized graph file was truncated or internally inconsistent.
    #[error("corrupt serialized graph `{0}`")]
    CorruptGraph(String),
}
