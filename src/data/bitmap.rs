//! Symmetric bitmap: every rank holds a full local copy of all `n` bits.
//!
//! Writes touch only the local copy ([`set_bit`](Bitmap::set_bit) plain,
//! [`set_bit_atomic`](Bitmap::set_bit_atomic) word-level CAS semantics via
//! fetch-or); [`merge`](Bitmap::merge) is the only synchronization point — a
//! bitwise-OR allreduce after which all ranks' copies are bit-identical.

use crate::error::SymGraphError;
use crate::graph::NodeId;
use crate::runtime::{Rank, SymSlice};

const WORD_BITS: usize = 64;

/// Full-width symmetric bitmap of `n` bits.
pub struct Bitmap {
    words: SymSlice<u64>,
    nbits: usize,
}

impl Bitmap {
    /// Collective construction of an all-zero bitmap.
    pub fn new(rank: &Rank, nbits: usize) -> Result<Self, SymGraphError> {
        let nwords = nbits.div_ceil(WORD_BITS);
        Ok(Bitmap {
            words: rank.alloc::<u64>(nwords)?,
            nbits,
        })
    }

    /// Number of addressable bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.nbits
    }

    /// True when the bitmap addresses no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }

    #[inline]
    fn split(&self, i: NodeId) -> (usize, u64) {
        let i = i as usize;
        debug_assert!(i < self.nbits, "bit {i} out of range {}", self.nbits);
        (i / WORD_BITS, 1u64 << (i % WORD_BITS))
    }

    /// Set bit `i` in the local copy (no atomicity guarantee needed by the
    /// caller).
    pub fn set_bit(&self, i: NodeId) {
        let (w, mask) = self.split(i);
        let pe = self.words.rank().pe();
        self.words.put_to(pe, w, self.words.read(w) | mask);
    }

    /// Set bit `i` in the local copy, safe against concurrent local setters.
    pub fn set_bit_atomic(&self, i: NodeId) {
        let (w, mask) = self.split(i);
        self.words.fetch_or(self.words.rank().pe(), w, mask);
    }

    /// Read bit `i` from the local copy.
    pub fn get_bit(&self, i: NodeId) -> bool {
        let (w, mask) = self.split(i);
        self.words.read(w) & mask != 0
    }

    /// Clear every bit of the local copy.
    pub fn reset(&self) {
        for w in 0..self.words.len() {
            self.words.write(w, 0);
        }
    }

    /// Swap handles with `other` (cheap; no data movement).
    pub fn swap(&mut self, other: &mut Bitmap) {
        std::mem::swap(self, other);
    }

    /// Collective bitwise-OR allreduce. After the call every rank's copy is
    /// the union of all local copies, bit for bit.
    pub fn merge(&self) {
        let mut local = self.words.local_to_vec();
        self.words.rank().or_merge(&mut local);
        let pe = self.words.rank().pe();
        self.words.put_slice_to(pe, 0, &local);
    }
}
