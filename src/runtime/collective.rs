//! Rendezvous machinery shared by every collective.
//!
//! All collectives reduce to one primitive: each rank deposits a byte
//! payload, the last arriver seals the round, and every rank departs with a
//! shared view of all payloads. Barriers are the empty-payload case;
//! reductions, broadcast and collect fold or slice the payload set locally.
//! Rounds are sense-reversed: a rank cannot enter round `k+1` until every
//! rank has departed round `k`, which is what makes collectives
//! source-ordered.

use super::ExitCode;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{fence, AtomicI64, Ordering};
use std::sync::Arc;

const NOT_POISONED: i64 = i64::MIN;

pub(crate) struct Collective {
    state: Mutex<RoundState>,
    cv: Condvar,
    poison: AtomicI64,
}

struct RoundState {
    slots: Vec<Option<Vec<u8>>>,
    result: Option<Arc<Vec<Vec<u8>>>>,
    arrived: usize,
    departing: usize,
    epoch: u64,
}

impl Collective {
    pub(crate) fn new(npes: usize) -> Self {
        Collective {
            state: Mutex::new(RoundState {
                slots: (0..npes).map(|_| None).collect(),
                result: None,
                arrived: 0,
                departing: 0,
                epoch: 0,
            }),
            cv: Condvar::new(),
            poison: AtomicI64::new(NOT_POISONED),
        }
    }

    pub(crate) fn poison(&self, code: i32) {
        let _ = self.poison.compare_exchange(
            NOT_POISONED,
            code as i64,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        let _guard = self.state.lock();
        self.cv.notify_all();
    }

    pub(crate) fn poison_code(&self) -> Option<i32> {
        match self.poison.load(Ordering::Acquire) {
            NOT_POISONED => None,
            code => Some(code as i32),
        }
    }

    fn bail_if_poisoned(&self) {
        if let Some(code) = self.poison_code() {
            std::panic::panic_any(ExitCode(code));
        }
    }

    /// Deposit `payload`, wait for all ranks, and return every rank's
    /// payload for this round. Fences `SeqCst` on both sides so relaxed
    /// one-sided traffic is ordered across the rendezvous.
    pub(crate) fn exchange(&self, pe: usize, payload: Vec<u8>) -> Arc<Vec<Vec<u8>>> {
        fence(Ordering::SeqCst);
        self.bail_if_poisoned();
        let npes;
        let out;
        {
            let mut st = self.state.lock();
            npes = st.slots.len();
            while st.departing > 0 {
                self.cv.wait(&mut st);
                self.bail_if_poisoned();
            }
            debug_assert!(st.slots[pe].is_none(), "rank {pe} entered a round twice");
            st.slots[pe] = Some(payload);
            st.arrived += 1;
            if st.arrived == npes {
                let sealed: Vec<Vec<u8>> = st
                    .slots
                    .iter_mut()
                    .map(|s| s.take().expect("sealed round with a missing slot"))
                    .collect();
                st.result = Some(Arc::new(sealed));
                st.arrived = 0;
                st.departing = npes;
                st.epoch = st.epoch.wrapping_add(1);
                self.cv.notify_all();
            } else {
                let entered = st.epoch;
                while st.epoch == entered {
                    self.cv.wait(&mut st);
                    self.bail_if_poisoned();
                }
            }
            out = st
                .result
                .as_ref()
                .expect("departing a round with no result")
                .clone();
            st.departing -= 1;
            if st.departing == 0 {
                st.result = None;
                self.cv.notify_all();
            }
        }
        fence(Ordering::SeqCst);
        out
    }
}
