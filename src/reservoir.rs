//! Reservoir sampling over a line stream.
//!
//! Maintains a uniform sample of at most `capacity` records from a stream of
//! unknown length, using **Algorithm R** (Vitter, 1985). Each retained record
//! remembers the 0-based position it arrived at, so a sample can be put back
//! into stream order for display.
//!
//! ## References
//!
//! - Vitter (1985): reservoir sampling “Algorithm R”.
//!
//! Notes:
//! - [`ReservoirSampler`] is the single-owner store. [`SharedReservoir`] is the
//!   handle the producer and any number of readers share.
//! - The RNG is supplied at construction; `with_rng` exists for deterministic
//!   testing/benchmarking.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::snapshot::Snapshot;

/// One retained record and its position in the original stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// 0-based arrival position. Assigned once, never reused.
    pub sequence_index: u64,
    pub content: String,
}

impl Entry {
    pub fn new(sequence_index: u64, content: impl Into<String>) -> Self {
        Self {
            sequence_index,
            content: content.into(),
        }
    }
}

/// A fixed-capacity uniform sample of a stream (Algorithm R).
///
/// After `seen >= capacity` records, every record observed so far is retained
/// with probability `capacity / seen`.
#[derive(Debug, Clone)]
pub struct ReservoirSampler<R = StdRng> {
    capacity: usize,
    seen: u64,
    entries: Vec<Entry>,
    rng: R,
}

impl ReservoirSampler<StdRng> {
    /// Create a sampler that keeps at most `capacity` records, seeded from OS entropy.
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }
}

impl<R: Rng> ReservoirSampler<R> {
    /// Create a sampler using a caller-supplied RNG.
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            seen: 0,
            entries: Vec::with_capacity(capacity),
            rng,
        }
    }

    /// Offer the next record of the stream. Returns whether it was retained.
    ///
    /// The content is only converted into an owned `String` when it is kept.
    /// If `capacity == 0`, every record is counted and discarded.
    pub fn admit(&mut self, content: impl Into<String>) -> bool {
        let sequence_index = self.seen;

        let retained = if self.entries.len() < self.capacity {
            self.entries.push(Entry::new(sequence_index, content));
            true
        } else if self.capacity > 0 && self.keep_next(sequence_index) {
            let slot = self.rng.random_range(0..self.capacity);
            self.entries[slot] = Entry::new(sequence_index, content);
            true
        } else {
            false
        };

        self.seen += 1;
        retained
    }

    // Record number `sequence_index + 1` survives with probability k / (seen + 1).
    fn keep_next(&mut self, sequence_index: u64) -> bool {
        let r: f64 = self.rng.random();
        r < self.capacity as f64 / (sequence_index + 1) as f64
    }
}

impl<R> ReservoirSampler<R> {
    /// Maximum number of records retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records observed so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Retained records in slot order (not stream order).
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the current contents into a stream-ordered [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_unordered(self.entries.clone(), self.seen)
    }
}

/// A [`ReservoirSampler`] shared between one writer and many readers.
///
/// Every operation takes the lock for its own duration only.
#[derive(Debug)]
pub struct SharedReservoir<R = StdRng> {
    inner: Arc<Mutex<ReservoirSampler<R>>>,
}

impl<R> Clone for SharedReservoir<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedReservoir<StdRng> {
    pub fn new(capacity: usize) -> Self {
        Self::from_sampler(ReservoirSampler::new(capacity))
    }
}

impl<R> SharedReservoir<R> {
    pub fn from_sampler(sampler: ReservoirSampler<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sampler)),
        }
    }

    // Entries are replaced whole under the lock, so a poisoned guard still
    // holds a consistent store.
    fn lock(&self) -> MutexGuard<'_, ReservoirSampler<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Number of records observed so far.
    pub fn seen_count(&self) -> u64 {
        self.lock().seen()
    }

    /// Point-in-time copy of the reservoir, sorted by sequence index.
    ///
    /// Only the copy happens under the lock; sorting happens after release.
    pub fn snapshot(&self) -> Snapshot {
        let (entries, seen) = {
            let sampler = self.lock();
            (sampler.entries.clone(), sampler.seen)
        };
        Snapshot::from_unordered(entries, seen)
    }
}

impl<R: Rng> SharedReservoir<R> {
    /// Offer the next record of the stream. Returns whether it was retained.
    pub fn admit(&self, content: impl Into<String>) -> bool {
        self.lock().admit(content)
    }
}
