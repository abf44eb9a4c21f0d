//! Double-buffered frontier queue with per-rank append batching.
//!
//! The queue is replicated: a symmetric backing array of capacity `n` plus
//! three symmetric cursor words per rank. Appends land in
//! `[shared_out_end, shared_in)` and stay invisible until
//! [`slide_window`](SlidingQueue::slide_window) promotes them; readers only
//! ever see `[shared_out_start, shared_out_end)`. Promotion is collective,
//! so after it every rank iterates an identical window.
//!
//! [`QueueBuffer`] decouples hot-path appends from the single global append
//! region: items stage in a rank-local vector and
//! [`flush`](QueueBuffer::flush) moves them out under the global queue lock —
//! reserve a range with a fetch-add on rank 0's `shared_in`, then put the
//! items and the advanced cursor to every rank. Reserving on one rank but
//! broadcasting to all is racy between those two steps, which is exactly why
//! the whole flush is serialized by the lock.

use crate::error::SymGraphError;
use crate::runtime::{Rank, SymCell, SymLock, SymPod};

/// Rank-local staging capacity of a queue buffer.
pub const QUEUE_BUFFER_SIZE: usize = 16384;

/// Replicated double-buffered queue in symmetric memory.
pub struct SlidingQueue<T: SymPod> {
    data: crate::runtime::SymSlice<T>,
    shared_in: SymCell<u64>,
    out_start: SymCell<u64>,
    out_end: SymCell<u64>,
    rank: Rank,
}

impl<T: SymPod> SlidingQueue<T> {
    /// Collective construction with capacity `cap`.
    pub fn new(rank: &Rank, cap: usize) -> Result<Self, SymGraphError> {
        Ok(SlidingQueue {
            data: rank.alloc::<T>(cap)?,
            shared_in: rank.alloc_cell::<u64>()?,
            out_start: rank.alloc_cell::<u64>()?,
            out_end: rank.alloc_cell::<u64>()?,
            rank: rank.clone(),
        })
    }

    /// Direct local append, visible after the next `slide_window`.
    ///
    /// Unsynchronized: callers use it only for replicated writes where every
    /// rank appends identical items in identical order (frontier seeding).
    pub fn push_back(&self, v: T) {
        let i = self.shared_in.read();
        assert!((i as usize) < self.data.len(), "sliding queue overflow");
        self.data.write(i as usize, v);
        self.shared_in.write(i + 1);
    }

    /// True when the promoted window is empty.
    pub fn empty(&self) -> bool {
        self.out_start.read() == self.out_end.read()
    }

    /// Size of the promoted window.
    pub fn size(&self) -> usize {
        (self.out_end.read() - self.out_start.read()) as usize
    }

    /// Read item `i` of the promoted window.
    pub fn window_item(&self, i: usize) -> T {
        debug_assert!(i < self.size());
        self.data.read(self.out_start.read() as usize + i)
    }

    /// Iterate the promoted window.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let start = self.out_start.read() as usize;
        let end = self.out_end.read() as usize;
        (start..end).map(move |i| self.data.read(i))
    }

    /// Reset all cursors. Replicated local operation.
    pub fn reset(&self) {
        self.shared_in.write(0);
        self.out_start.write(0);
        self.out_end.write(0);
    }

    /// Collectively promote pending appends into the readable window.
    ///
    /// Barriers on entry (so every flush's puts are visible) and on exit (so
    /// no rank races ahead); afterwards the window bounds are identical on
    /// every rank.
    pub fn slide_window(&self) {
        self.rank.barrier();
        let promoted = self.out_end.read();
        self.out_start.write(promoted);
        self.out_end.write(self.shared_in.read());
        self.check_window();
        self.rank.barrier();
    }

    pub(crate) fn shared_in(&self) -> &SymCell<u64> {
        &self.shared_in
    }

    pub(crate) fn data(&self) -> &crate::runtime::SymSlice<T> {
        &self.data
    }

    pub(crate) fn rank(&self) -> &Rank {
        &self.rank
    }

    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    fn check_window(&self) {
        let (s, e, i) = (
            self.out_start.read(),
            self.out_end.read(),
            self.shared_in.read(),
        );
        assert!(
            s <= e && e <= i && i as usize <= self.data.len(),
            "queue window out of order: start={s} end={e} in={i}"
        );
    }

    #[cfg(not(any(debug_assertions, feature = "check-invariants")))]
    fn check_window(&self) {}
}

/// Rank-local staging buffer feeding a [`SlidingQueue`].
///
/// Borrows the queue and the global queue lock; the lock is a shared
/// symmetric resource owned by the surrounding algorithm, not by either
/// structure.
pub struct QueueBuffer<'a, T: SymPod> {
    queue: &'a SlidingQueue<T>,
    lock: &'a SymLock,
    staged: Vec<T>,
}

impl<'a, T: SymPod> QueueBuffer<'a, T> {
    /// Stage against `queue`, flushing through `lock`.
    pub fn new(queue: &'a SlidingQueue<T>, lock: &'a SymLock) -> Self {
        QueueBuffer {
            queue,
            lock,
            staged: Vec::with_capacity(QUEUE_BUFFER_SIZE),
        }
    }

    /// Append locally; flushes first when the stage is full.
    pub fn push_back(&mut self, v: T) {
        if self.staged.len() == QUEUE_BUFFER_SIZE {
            self.flush();
        }
        self.staged.push(v);
    }

    /// Publish staged items to every rank's copy of the queue.
    pub fn flush(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        let count = self.staged.len() as u64;
        self.lock.set(0);
        let copy_start = self.queue.shared_in().fetch_add_on(0, count);
        let new_in = copy_start + count;
        assert!(
            new_in as usize <= self.queue.data().len(),
            "sliding queue overflow during flush"
        );
        for r in 0..self.queue.rank().npes() {
            self.queue
                .data()
                .put_slice_to(r, copy_start as usize, &self.staged);
            self.queue.shared_in().put_to(r, new_in);
        }
        self.staged.clear();
        self.lock.clear(0);
    }
}
