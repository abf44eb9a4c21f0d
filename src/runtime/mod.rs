//! SPMD process group over a word-typed symmetric heap.
//!
//! A [`World`] hosts `N` peer ranks inside one process; every rank runs the
//! same closure (single program, multiple data) and communicates only through
//! symmetric allocations and collectives. The runtime provides what a
//! one-sided fabric provides: symmetric allocation (the same logical
//! allocation addressable from every rank by `(rank, index)`), one-sided
//! `put`/`get` of typed words, one-sided atomics, reductions, barriers,
//! broadcast/collect, named binary locks, and a blocking `wait_until` on a
//! symmetric word.
//!
//! Memory ordering contract: one-sided loads are `Acquire`, stores `Release`,
//! and read-modify-writes `AcqRel`; a [`Rank::barrier`] additionally fences
//! `SeqCst` on entry and exit, so every put issued before a barrier is
//! visible on every rank after it.
//!
//! Failure is fail-stop for the whole job: [`Rank::global_exit`] poisons the
//! group, every blocked primitive unwinds, and [`World::launch`] surfaces
//! [`SymGraphError::GlobalExit`]. There is no rank-local recovery.

mod collective;
mod heap;
mod sync;

pub use heap::{SymCell, SymPod, SymSlice, SymWord};
pub use sync::{Cmp, SymLock};

use crate::error::SymGraphError;
use collective::Collective;
use hashbrown::HashMap;
use heap::AllocInner;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Panic payload carried by a collective exit; recovered by `World::launch`.
pub(crate) struct ExitCode(pub i32);

/// Shared state of one process group.
pub(crate) struct Group {
    npes: usize,
    coll: Collective,
    allocs: Mutex<HashMap<u64, PendingAlloc>>,
    alloc_seq: Vec<AtomicU64>,
}

struct PendingAlloc {
    inner: Arc<AllocInner>,
    taken: usize,
}

impl Group {
    fn new(npes: usize) -> Self {
        Group {
            npes,
            coll: Collective::new(npes),
            allocs: Mutex::new(HashMap::new()),
            alloc_seq: (0..npes).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub(crate) fn poison(&self, code: i32) {
        self.coll.poison(code);
    }

    /// Panic with the recorded exit code if the group has been poisoned.
    pub(crate) fn check_poison(&self) {
        if let Some(code) = self.coll.poison_code() {
            std::panic::panic_any(ExitCode(code));
        }
    }
}

/// Handle to one rank of a running process group.
///
/// Cheap to clone; long-lived data structures keep a clone so remote
/// operations and collectives do not need the handle threaded through every
/// call.
#[derive(Clone)]
pub struct Rank {
    group: Arc<Group>,
    pe: usize,
}

impl Rank {
    /// This rank's id, `p ∈ [0, npes)`.
    #[inline]
    pub fn pe(&self) -> usize {
        self.pe
    }

    /// Number of ranks in the group.
    #[inline]
    pub fn npes(&self) -> usize {
        self.group.npes
    }

    /// Collective barrier. Puts issued before the barrier are visible on
    /// every rank after it.
    pub fn barrier(&self) {
        self.group.coll.exchange(self.pe, Vec::new());
    }

    /// Collective symmetric allocation of `len` elements of `T`, zero
    /// initialized on every rank. Implies a barrier.
    ///
    /// On allocation failure the failing rank reports the request, poisons
    /// the group (fail-stop) and returns `AllocFailed`.
    pub fn alloc<T: SymPod>(&self, len: usize) -> Result<SymSlice<T>, SymGraphError> {
        heap::check_layout::<T>();
        let words = len
            .checked_mul(heap::words_per::<T>())
            .unwrap_or_else(|| panic!("symmetric allocation of {len} elements overflows"));
        let inner = self.alloc_words(words)?;
        let slice = SymSlice::new(self.clone(), inner, len);
        self.barrier();
        Ok(slice)
    }

    /// Collective allocation of a single symmetric element.
    pub fn alloc_cell<T: SymPod>(&self) -> Result<SymCell<T>, SymGraphError> {
        Ok(SymCell::new(self.alloc(1)?))
    }

    fn alloc_words(&self, words: usize) -> Result<Arc<AllocInner>, SymGraphError> {
        self.group.check_poison();
        let seq = self.group.alloc_seq[self.pe].fetch_add(1, Ordering::Relaxed);
        let mut tab = self.group.allocs.lock();
        if let Some(pending) = tab.get_mut(&seq) {
            assert_eq!(
                pending.inner.words(),
                words,
                "ranks disagree on the size of collective allocation {seq}"
            );
            let inner = pending.inner.clone();
            pending.taken += 1;
            if pending.taken == self.group.npes {
                tab.remove(&seq);
            }
            return Ok(inner);
        }
        // First rank to arrive reserves the backing regions for everyone.
        match AllocInner::try_new(self.group.npes, words) {
            Some(inner) => {
                let inner = Arc::new(inner);
                if self.group.npes > 1 {
                    tab.insert(
                        seq,
                        PendingAlloc {
                            inner: inner.clone(),
                            taken: 1,
                        },
                    );
                }
                Ok(inner)
            }
            None => {
                drop(tab);
                eprintln!(
                    "rank {} failed symmetric allocation of {} words",
                    self.pe, words
                );
                self.group.poison(1);
                Err(SymGraphError::AllocFailed {
                    pe: self.pe,
                    words,
                })
            }
        }
    }

    /// Collective allocation of `n` named binary locks.
    pub fn alloc_lock(&self, n: usize) -> Result<SymLock, SymGraphError> {
        SymLock::new(self, n)
    }

    fn allreduce<T, F>(&self, v: T, fold: F) -> T
    where
        T: SymWord,
        F: Fn(T, T) -> T,
    {
        let slots = self
            .group
            .coll
            .exchange(self.pe, bytemuck::bytes_of(&v).to_vec());
        slots
            .iter()
            .map(|s| bytemuck::pod_read_unaligned::<T>(s))
            .reduce(fold)
            .expect("reduction over an empty group")
    }

    /// Sum allreduce.
    pub fn sum_i64(&self, v: i64) -> i64 {
        self.allreduce(v, |a, b| a + b)
    }

    /// Min allreduce.
    pub fn min_i64(&self, v: i64) -> i64 {
        self.allreduce(v, i64::min)
    }

    /// Max allreduce.
    pub fn max_i64(&self, v: i64) -> i64 {
        self.allreduce(v, i64::max)
    }

    /// Sum allreduce over unsigned words.
    pub fn sum_u64(&self, v: u64) -> u64 {
        self.allreduce(v, |a, b| a + b)
    }

    /// Min allreduce over unsigned words.
    pub fn min_u64(&self, v: u64) -> u64 {
        self.allreduce(v, u64::min)
    }

    /// Max allreduce over unsigned words.
    pub fn max_u64(&self, v: u64) -> u64 {
        self.allreduce(v, u64::max)
    }

    /// Elementwise bitwise-OR allreduce; `words` holds the union on return.
    pub fn or_merge(&self, words: &mut [u64]) {
        let slots = self
            .group
            .coll
            .exchange(self.pe, bytemuck::cast_slice(words).to_vec());
        for slot in slots.iter() {
            let other: &[u64] = bytemuck::cast_slice(slot);
            debug_assert_eq!(other.len(), words.len());
            for (w, o) in words.iter_mut().zip(other) {
                *w |= o;
            }
        }
    }

    /// Broadcast one word from `root` to every rank.
    pub fn broadcast_u64(&self, root: usize, v: u64) -> u64 {
        let payload = if self.pe == root {
            bytemuck::bytes_of(&v).to_vec()
        } else {
            Vec::new()
        };
        let slots = self.group.coll.exchange(self.pe, payload);
        bytemuck::pod_read_unaligned(&slots[root])
    }

    /// Variable-length allgather: every rank receives the concatenation of
    /// all local contributions in rank order.
    pub fn collect<T: SymPod>(&self, local: &[T]) -> Vec<T> {
        let slots = self
            .group
            .coll
            .exchange(self.pe, bytemuck::cast_slice(local).to_vec());
        let mut out = Vec::new();
        for slot in slots.iter() {
            out.extend(bytemuck::pod_collect_to_vec::<u8, T>(slot));
        }
        out
    }

    /// Tear down the whole group with `code`. Never returns; every other
    /// rank unwinds from its next blocking primitive.
    pub fn global_exit(&self, code: i32) -> ! {
        self.group.poison(code);
        std::panic::panic_any(ExitCode(code));
    }

    pub(crate) fn group(&self) -> &Arc<Group> {
        &self.group
    }
}

impl std::fmt::Debug for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rank")
            .field("pe", &self.pe)
            .field("npes", &self.group.npes)
            .finish()
    }
}

/// Entry point for SPMD execution.
pub struct World;

impl World {
    /// Run `f` on `npes` peer ranks and join them all.
    ///
    /// Results are returned in rank order. The first failure wins: an `Err`
    /// from a rank closure, a collective exit (`GlobalExit`), or a panic
    /// (`RankPanicked`). A rank that fails also poisons the group so peers
    /// blocked in collectives unwind instead of deadlocking.
    pub fn launch<T, F>(npes: usize, f: F) -> Result<Vec<T>, SymGraphError>
    where
        T: Send,
        F: Fn(&Rank) -> Result<T, SymGraphError> + Send + Sync,
    {
        assert!(npes >= 1, "a process group needs at least one rank");
        let group = Arc::new(Group::new(npes));
        let outcomes: Vec<RankOutcome<T>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..npes)
                .map(|pe| {
                    let rank = Rank {
                        group: group.clone(),
                        pe,
                    };
                    let f = &f;
                    s.spawn(move || {
                        let result = catch_unwind(AssertUnwindSafe(|| f(&rank)));
                        match &result {
                            Ok(Ok(_)) => {}
                            // Unblock peers stuck in collectives before join.
                            Ok(Err(_)) => rank.group.poison(1),
                            Err(payload) => {
                                if !payload.is::<ExitCode>() {
                                    rank.group.poison(1);
                                }
                            }
                        }
                        result
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(Ok(Ok(v))) => RankOutcome::Ok(v),
                    Ok(Ok(Err(e))) => RankOutcome::Err(e),
                    Ok(Err(payload)) | Err(payload) => RankOutcome::from_panic(payload),
                })
                .collect()
        });

        let mut out = Vec::with_capacity(npes);
        let mut exit: Option<SymGraphError> = None;
        let mut panicked = false;
        for outcome in outcomes {
            match outcome {
                RankOutcome::Ok(v) => out.push(v),
                RankOutcome::Err(e) => return Err(e),
                RankOutcome::Exited(code) => {
                    exit.get_or_insert(SymGraphError::GlobalExit(code));
                }
                RankOutcome::Panicked => panicked = true,
            }
        }
        if let Some(e) = exit {
            return Err(e);
        }
        if panicked {
            return Err(SymGraphError::RankPanicked);
        }
        Ok(out)
    }
}

enum RankOutcome<T> {
    Ok(T),
    Err(SymGraphError),
    Exited(i32),
    Panicked,
}

impl<T> RankOutcome<T> {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<ExitCode>() {
            Ok(code) => RankOutcome::Exited(code.0),
            Err(_) => RankOutcome::Panicked,
        }
    }
}
