//! # symgraph
//!
//! symgraph is a distributed, partitioned graph-analytics engine for SPMD
//! execution over a one-sided shared-memory model: a fixed group of peer
//! ranks holds one logical graph in partitioned symmetric memory and
//! cooperatively runs graph kernels against it. The crate provides:
//!
//! - An in-process SPMD runtime: symmetric allocation, one-sided put/get and
//!   atomics, collective reductions, barriers, named binary locks, and
//!   blocking waits on symmetric words ([`runtime`]).
//! - Partition arithmetic and the distributed coordination structures built
//!   on it — partitioned vectors, symmetric bitmaps, and the double-buffered
//!   sliding frontier queue ([`partition`], [`data`]).
//! - A distributed CSR graph builder: two-pass construction from a
//!   round-robin edge list, canonicalization (squish), degree relabeling via
//!   a tournament-tree k-way merge, file readers, and synthetic generators
//!   ([`graph`]).
//! - Three kernels with verifiers: direction-optimizing BFS, delta-stepping
//!   SSSP with bucket fusion, and ordered triangle counting ([`kernels`]).
//!
//! ## Usage
//!
//! ```no_run
//! use symgraph::prelude::*;
//!
//! let parents = World::launch(4, |rank| {
//!     let builder = Builder::<NodeId>::new(rank, true);
//!     let g = builder.make_graph(&GraphSource::Synthetic {
//!         scale: 10,
//!         degree: 16,
//!         uniform: false,
//!     })?;
//!     let parent = dobfs(&g, 0, ALPHA, BETA)?;
//!     Ok(parent.local_to_vec())
//! })
//! .unwrap();
//! # let _ = parents;
//! ```
//!
//! Every rank runs identical code; constructing symmetric objects and
//! calling kernels are collective operations, so all ranks must make the
//! same sequence of calls.

pub mod bench;
pub mod cli;
pub mod data;
pub mod error;
pub mod graph;
pub mod kernels;
pub mod partition;
pub mod runtime;

/// The most-used types and entry points in one import.
pub mod prelude {
    pub use crate::bench::benchmark_kernel;
    pub use crate::data::{Bitmap, Pvector, QueueBuffer, SlidingQueue};
    pub use crate::error::SymGraphError;
    pub use crate::graph::builder::{relabel_by_degree, Builder, GraphSource};
    pub use crate::graph::{
        Destination, Edge, EdgeList, Graph, NodeId, SourcePicker, Ugraph, Weight, Wgraph, WNode,
    };
    pub use crate::kernels::bfs::{bfs_verifier, dobfs, ALPHA, BETA};
    pub use crate::kernels::sssp::{delta_step, sssp_verifier, DIST_INF};
    pub use crate::kernels::tc::{hybrid, ordered_count, tc_verifier, worth_relabelling};
    pub use crate::partition::Partition;
    pub use crate::runtime::{Cmp, Rank, SymCell, SymLock, SymPod, SymSlice, SymWord, World};
}
