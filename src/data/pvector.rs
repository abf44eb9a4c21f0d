//! Partitioned vector: the fixed-width symmetric array behind every
//! distributed value column (degrees, parents, distances).
//!
//! Storage is `max_width` elements on every rank — symmetric allocation
//! requires a uniform size — while the logical content of rank `p` is the
//! slice `[start(p), end(p))` of the partition, mapped to local indices
//! `[0, local_width)`. Padding past `local_width` on non-tail ranks is never
//! the value of any global id.

use crate::error::SymGraphError;
use crate::partition::Partition;
use crate::runtime::{Rank, SymPod, SymSlice, SymWord};

/// Partitioned symmetric vector of `T`.
pub struct Pvector<T: SymPod> {
    slice: SymSlice<T>,
    max_width: usize,
    local_width: usize,
}

impl<T: SymPod> Pvector<T> {
    /// Collective, zero-initialized construction sized to `part`.
    pub fn new(rank: &Rank, part: &Partition) -> Result<Self, SymGraphError> {
        Ok(Pvector {
            slice: rank.alloc::<T>(part.max_width)?,
            max_width: part.max_width,
            local_width: part.local_width(),
        })
    }

    /// Collective construction with every local slot set to `fill`.
    pub fn filled(rank: &Rank, part: &Partition, fill: T) -> Result<Self, SymGraphError> {
        let v = Self::new(rank, part)?;
        for i in 0..v.max_width {
            v.slice.write(i, fill);
        }
        Ok(v)
    }

    /// Symmetric allocation size (identical on every rank).
    #[inline]
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Number of live elements on this rank.
    #[inline]
    pub fn local_width(&self) -> usize {
        self.local_width
    }

    /// Record how many slots this rank actually uses; the storage hint for
    /// consumers that need to reason about the tail.
    pub fn set_widths(&mut self, max_width: usize, local_width: usize) {
        debug_assert!(local_width <= max_width && max_width <= self.slice.len());
        self.max_width = max_width;
        self.local_width = local_width;
    }

    /// Local read at local index `i`.
    #[inline]
    pub fn read(&self, i: usize) -> T {
        self.slice.read(i)
    }

    /// Local write at local index `i`.
    #[inline]
    pub fn write(&self, i: usize, v: T) {
        self.slice.write(i, v)
    }

    /// The backing symmetric slice, for one-sided remote traffic.
    #[inline]
    pub fn sym(&self) -> &SymSlice<T> {
        &self.slice
    }

    /// Copy of this rank's live slice.
    pub fn local_to_vec(&self) -> Vec<T> {
        self.slice
            .get_slice_from(self.slice.rank().pe(), 0, self.local_width)
    }
}

impl<T: SymWord> Pvector<T> {
    /// One-sided get of global id `x` through its owner under `part`.
    pub fn get_global(&self, part: &Partition, x: crate::graph::NodeId) -> T {
        self.slice.get_from(part.owner(x), part.local_pos(x))
    }
}
