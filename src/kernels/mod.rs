//! Graph kernels: direction-optimizing BFS, delta-stepping SSSP, and
//! ordered triangle counting, plus their verifiers.

pub mod bfs;
pub mod sssp;
pub mod tc;
