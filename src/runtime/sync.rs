//! Point-to-point synchronization: named binary locks and `wait_until`.
//!
//! Both primitives spin against symmetric words rather than blocking in the
//! rendezvous, because they synchronize a *subset* of ranks (a lock holder
//! and its contenders, or a token sender and receiver) while the rest of the
//! group keeps running. Spinners poll the poison flag so a collective exit
//! still tears them down.

use super::heap::{SymSlice, SymWord};
use super::Rank;
use crate::error::SymGraphError;

const SPINS_BEFORE_SLEEP: u32 = 1 << 12;

/// Comparison selector for [`SymCell::wait_until`](super::SymCell::wait_until).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cmp {
    /// Wait for equality.
    Eq,
    /// Wait for inequality.
    Ne,
    /// Wait for a strictly greater value.
    Gt,
    /// Wait for a greater-or-equal value.
    Ge,
    /// Wait for a strictly smaller value.
    Lt,
    /// Wait for a smaller-or-equal value.
    Le,
}

impl Cmp {
    #[inline]
    fn holds<T: PartialOrd>(self, observed: T, target: T) -> bool {
        match self {
            Cmp::Eq => observed == target,
            Cmp::Ne => observed != target,
            Cmp::Gt => observed > target,
            Cmp::Ge => observed >= target,
            Cmp::Lt => observed < target,
            Cmp::Le => observed <= target,
        }
    }
}

fn backoff(spins: &mut u32) {
    *spins += 1;
    if *spins < SPINS_BEFORE_SLEEP {
        std::hint::spin_loop();
        if *spins % 64 == 0 {
            std::thread::yield_now();
        }
    } else {
        std::thread::sleep(std::time::Duration::from_micros(50));
    }
}

impl<T: SymWord + PartialOrd> super::SymCell<T> {
    /// Block until this rank's copy satisfies `cmp` against `target`.
    ///
    /// The write that satisfies the wait is expected to arrive as a remote
    /// put from a peer rank (token passing).
    pub fn wait_until(&self, cmp: Cmp, target: T) {
        let mut spins = 0;
        loop {
            if cmp.holds(self.read(), target) {
                return;
            }
            self.rank().group().check_poison();
            backoff(&mut spins);
        }
    }
}

/// `n` named binary locks in symmetric memory.
///
/// Lock `i` is a single word; acquisition spin-CASes it from 0 to the
/// contender's `pe + 1`. Locks are global names, not per-rank state: the
/// authoritative word lives on rank 0. Holders must not block in a
/// collective while holding a lock.
pub struct SymLock {
    words: SymSlice<u64>,
}

impl SymLock {
    /// Collective construction of `n` unlocked locks.
    pub fn new(rank: &Rank, n: usize) -> Result<Self, SymGraphError> {
        Ok(SymLock {
            words: rank.alloc::<u64>(n)?,
        })
    }

    /// Number of locks in the set.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when the set holds no locks.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Acquire lock `i`, blocking until it is free.
    pub fn set(&self, i: usize) {
        let tag = self.words.rank().pe() as u64 + 1;
        let mut spins = 0;
        loop {
            if self.words.compare_and_swap(0, i, 0, tag) == 0 {
                return;
            }
            self.words.rank().group().check_poison();
            backoff(&mut spins);
        }
    }

    /// Release lock `i`. The caller must hold it.
    pub fn clear(&self, i: usize) {
        debug_assert_eq!(
            self.words.get_from(0, i),
            self.words.rank().pe() as u64 + 1,
            "released a lock held by another rank"
        );
        self.words.put_to(0, i, 0);
    }
}
