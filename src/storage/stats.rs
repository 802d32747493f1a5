//! Operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed atomic counters updated by the engine and its shards.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    gets: AtomicU64,
    hits: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    expired_lazy: AtomicU64,
    expired_swept: AtomicU64,
    sweeps: AtomicU64,
}

impl Stats {
    #[inline]
    pub(crate) fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_lazy_expiry(&self) {
        self.expired_lazy.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, expired: u64) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        if expired > 0 {
            self.expired_swept.fetch_add(expired, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            expired_lazy: self.expired_lazy.load(Ordering::Relaxed),
            expired_swept: self.expired_swept.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the engine's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads of a single key (`get`, `get_del`, `has`, `dur`)
    pub gets: u64,
    /// Reads that found a live entry
    pub hits: u64,
    /// Writes of a single key (every `set*` and `get_set*` variant)
    pub sets: u64,
    /// Explicit removals that deleted a live entry
    pub deletes: u64,
    /// Entries purged because an operation found them expired
    pub expired_lazy: u64,
    /// Entries purged by the background sweep
    pub expired_swept: u64,
    /// Completed sweep cycles
    pub sweeps: u64,
}

impl CacheStats {
    /// Total entries purged by either expiry path.
    pub fn expired(&self) -> u64 {
        self.expired_lazy + self.expired_swept
    }

    /// Fraction of reads that hit, or 0.0 when nothing has been read.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }
}
