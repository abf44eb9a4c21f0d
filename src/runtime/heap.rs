//! Typed views over the word-granular symmetric heap.
//!
//! Every symmetric allocation is a per-rank region of 64-bit atomic words;
//! [`SymSlice`] layers a typed element view on top and is the unit every
//! distributed structure builds on. Elements are plain-old-data whose size is
//! a small multiple of 8 bytes ([`SymPod`]); single-word elements
//! additionally get the one-sided atomics ([`SymWord`]). Indexing outside an
//! allocation is a programming error and asserts; it is never a recoverable
//! runtime condition.

use super::Rank;
use bytemuck::Pod;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Widest symmetric element this heap supports, in words.
const MAX_ELEM_WORDS: usize = 4;

/// Marker for element types that may live in symmetric memory.
///
/// # Safety
/// Implementors must be `Pod` with `size_of::<T>()` a non-zero multiple of 8
/// and alignment at most 8, so a value is exactly a run of heap words.
pub unsafe trait SymPod: Pod + Send + Sync {}

unsafe impl SymPod for i64 {}
unsafe impl SymPod for u64 {}

/// Single-word symmetric element; unlocks the one-sided atomics.
pub trait SymWord: SymPod + Copy + PartialEq {
    /// Reinterpret as a heap word.
    fn to_word(self) -> u64;
    /// Reinterpret a heap word.
    fn from_word(w: u64) -> Self;
}

impl SymWord for i64 {
    #[inline]
    fn to_word(self) -> u64 {
        self as u64
    }
    #[inline]
    fn from_word(w: u64) -> Self {
        w as i64
    }
}

impl SymWord for u64 {
    #[inline]
    fn to_word(self) -> u64 {
        self
    }
    #[inline]
    fn from_word(w: u64) -> Self {
        w
    }
}

#[inline]
pub(crate) fn words_per<T: SymPod>() -> usize {
    std::mem::size_of::<T>() / 8
}

pub(crate) fn check_layout<T: SymPod>() {
    let size = std::mem::size_of::<T>();
    assert!(
        size > 0 && size % 8 == 0 && size / 8 <= MAX_ELEM_WORDS,
        "symmetric element must be 1..={MAX_ELEM_WORDS} words, got {size} bytes"
    );
    assert!(std::mem::align_of::<T>() <= 8);
}

/// Backing storage of one symmetric allocation: a same-sized word region per
/// rank, zero initialized (the fabric's `calloc` semantics).
pub(crate) struct AllocInner {
    words: usize,
    regions: Vec<Box<[AtomicU64]>>,
}

impl AllocInner {
    /// Reserve regions for every rank; `None` when the host cannot satisfy
    /// the request (surfaced to the caller as a fail-stop condition).
    pub(crate) fn try_new(npes: usize, words: usize) -> Option<Self> {
        let mut regions = Vec::with_capacity(npes);
        for _ in 0..npes {
            let mut region: Vec<AtomicU64> = Vec::new();
            if region.try_reserve_exact(words).is_err() {
                return None;
            }
            for _ in 0..words {
                region.push(AtomicU64::new(0));
            }
            regions.push(region.into_boxed_slice());
        }
        Some(AllocInner { words, regions })
    }

    pub(crate) fn words(&self) -> usize {
        self.words
    }

    #[inline]
    fn cell(&self, rank: usize, word: usize) -> &AtomicU64 {
        &self.regions[rank][word]
    }
}

/// Typed handle onto a symmetric allocation of `len` elements of `T`.
///
/// Every rank holds a handle onto the same allocation; `(rank, index)`
/// addresses element `index` of `rank`'s region. Local shorthand
/// (`read`/`write`) targets the owning rank's own region.
pub struct SymSlice<T: SymPod> {
    rank: Rank,
    inner: Arc<AllocInner>,
    len: usize,
    _elem: PhantomData<T>,
}

impl<T: SymPod> Clone for SymSlice<T> {
    fn clone(&self) -> Self {
        SymSlice {
            rank: self.rank.clone(),
            inner: self.inner.clone(),
            len: self.len,
            _elem: PhantomData,
        }
    }
}

impl<T: SymPod> SymSlice<T> {
    pub(crate) fn new(rank: Rank, inner: Arc<AllocInner>, len: usize) -> Self {
        SymSlice {
            rank,
            inner,
            len,
            _elem: PhantomData,
        }
    }

    /// Element count (identical on every rank).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the allocation holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The rank handle this view was created on.
    #[inline]
    pub fn rank(&self) -> &Rank {
        &self.rank
    }

    #[inline]
    fn word_base(&self, i: usize) -> usize {
        assert!(i < self.len, "symmetric index {i} out of bounds {}", self.len);
        i * words_per::<T>()
    }

    /// One-sided get of element `i` from `rank`'s region.
    pub fn get_from(&self, rank: usize, i: usize) -> T {
        let base = self.word_base(i);
        let mut words = [0u64; MAX_ELEM_WORDS];
        let n = words_per::<T>();
        for (k, w) in words[..n].iter_mut().enumerate() {
            *w = self.inner.cell(rank, base + k).load(Ordering::Acquire);
        }
        bytemuck::pod_read_unaligned(&bytemuck::cast_slice(&words)[..std::mem::size_of::<T>()])
    }

    /// One-sided put of `v` into element `i` of `rank`'s region.
    pub fn put_to(&self, rank: usize, i: usize, v: T) {
        let base = self.word_base(i);
        let bytes = bytemuck::bytes_of(&v);
        for k in 0..words_per::<T>() {
            let w = u64::from_ne_bytes(bytes[k * 8..(k + 1) * 8].try_into().unwrap());
            self.inner.cell(rank, base + k).store(w, Ordering::Release);
        }
    }

    /// Local read of element `i` on this rank.
    #[inline]
    pub fn read(&self, i: usize) -> T {
        self.get_from(self.rank.pe(), i)
    }

    /// Local write of element `i` on this rank.
    #[inline]
    pub fn write(&self, i: usize, v: T) {
        self.put_to(self.rank.pe(), i, v)
    }

    /// Bulk one-sided put of `src` starting at element `offset` of `rank`'s
    /// region.
    pub fn put_slice_to(&self, rank: usize, offset: usize, src: &[T]) {
        if src.is_empty() {
            return;
        }
        assert!(offset + src.len() <= self.len, "symmetric put out of bounds");
        let words: &[u64] = bytemuck::cast_slice(src);
        let base = offset * words_per::<T>();
        for (k, w) in words.iter().enumerate() {
            self.inner.cell(rank, base + k).store(*w, Ordering::Release);
        }
    }

    /// Bulk one-sided get of `len` elements starting at `offset` of `rank`'s
    /// region.
    pub fn get_slice_from(&self, rank: usize, offset: usize, len: usize) -> Vec<T> {
        assert!(offset + len <= self.len, "symmetric get out of bounds");
        let base = offset * words_per::<T>();
        let nwords = len * words_per::<T>();
        let mut words = vec![0u64; nwords];
        for (k, w) in words.iter_mut().enumerate() {
            *w = self.inner.cell(rank, base + k).load(Ordering::Acquire);
        }
        bytemuck::cast_slice(&words).to_vec()
    }

    /// Copy of this rank's whole region.
    pub fn local_to_vec(&self) -> Vec<T> {
        self.get_slice_from(self.rank.pe(), 0, self.len)
    }
}

impl<T: SymWord> SymSlice<T> {
    /// One-sided compare-and-swap on element `i` of `rank`'s region.
    /// Returns the observed value; the swap took effect iff it equals
    /// `expected`.
    pub fn compare_and_swap(&self, rank: usize, i: usize, expected: T, desired: T) -> T {
        let base = self.word_base(i);
        match self.inner.cell(rank, base).compare_exchange(
            expected.to_word(),
            desired.to_word(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(w) | Err(w) => T::from_word(w),
        }
    }

    /// One-sided fetch-add (two's complement wrapping); returns the prior
    /// value.
    pub fn fetch_add(&self, rank: usize, i: usize, delta: T) -> T {
        let base = self.word_base(i);
        T::from_word(
            self.inner
                .cell(rank, base)
                .fetch_add(delta.to_word(), Ordering::AcqRel),
        )
    }

    /// One-sided fetch-increment; returns the prior value.
    pub fn fetch_inc(&self, rank: usize, i: usize) -> T {
        T::from_word(
            self.inner
                .cell(rank, self.word_base(i))
                .fetch_add(1, Ordering::AcqRel),
        )
    }

    /// One-sided unconditional swap; returns the prior value.
    pub fn atomic_swap(&self, rank: usize, i: usize, v: T) -> T {
        T::from_word(
            self.inner
                .cell(rank, self.word_base(i))
                .swap(v.to_word(), Ordering::AcqRel),
        )
    }

    /// One-sided fetch-or over the element's word.
    pub fn fetch_or(&self, rank: usize, i: usize, bits: T) -> T {
        T::from_word(
            self.inner
                .cell(rank, self.word_base(i))
                .fetch_or(bits.to_word(), Ordering::AcqRel),
        )
    }
}

/// Single symmetric element; the coordination-word building block (iteration
/// counters, leader/printer tokens, queue cursors).
pub struct SymCell<T: SymPod> {
    slice: SymSlice<T>,
}

impl<T: SymPod> Clone for SymCell<T> {
    fn clone(&self) -> Self {
        SymCell {
            slice: self.slice.clone(),
        }
    }
}

impl<T: SymPod> SymCell<T> {
    pub(crate) fn new(slice: SymSlice<T>) -> Self {
        debug_assert_eq!(slice.len(), 1);
        SymCell { slice }
    }

    /// Local read of this rank's copy.
    #[inline]
    pub fn read(&self) -> T {
        self.slice.read(0)
    }

    /// Local write of this rank's copy.
    #[inline]
    pub fn write(&self, v: T) {
        self.slice.write(0, v)
    }

    /// One-sided get from `rank`'s copy.
    #[inline]
    pub fn get_from(&self, rank: usize) -> T {
        self.slice.get_from(rank, 0)
    }

    /// One-sided put into `rank`'s copy.
    #[inline]
    pub fn put_to(&self, rank: usize, v: T) {
        self.slice.put_to(rank, 0, v)
    }

    pub(crate) fn rank(&self) -> &Rank {
        self.slice.rank()
    }
}

impl<T: SymWord> SymCell<T> {
    /// One-sided fetch-add on `rank`'s copy; returns the prior value.
    #[inline]
    pub fn fetch_add_on(&self, rank: usize, delta: T) -> T {
        self.slice.fetch_add(rank, 0, delta)
    }

    /// One-sided fetch-increment on `rank`'s copy; returns the prior value.
    #[inline]
    pub fn fetch_inc_on(&self, rank: usize) -> T {
        self.slice.fetch_inc(rank, 0)
    }
}
