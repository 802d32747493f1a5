//! Sharded Storage Engine with Expiry Support
//!
//! This module implements the cache-wide contract on top of a fixed set of
//! shards. It routes each key to exactly one shard, aggregates the per-shard
//! operations, and owns the lifecycle of the background sweeper.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Instead of one big lock, we use multiple shards to reduce contention.
//! 2. **Lazy Expiry**: Keys are checked for expiry on access (lazy) plus background cleanup.
//! 3. **Fixed Routing**: The shard count never changes, so a key always lands on the same shard.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Engine                                  │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! No operation ever holds more than one shard lock, so there is no lock
//! ordering to get wrong. Iteration sees a per-shard snapshot, consistent
//! within a shard but not atomic across shards.

use crate::error::ConfigResult;
use crate::storage::config::{EngineBuilder, EngineConfig};
use crate::storage::expiry::{ExpirySweeper, Sweep};
use crate::storage::reply::Reply;
use crate::storage::shard::{EvictionCallback, Hooks, Shard};
use crate::storage::stats::CacheStats;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use tracing::info;

/// Shards plus the state they share; the sweeper holds a weak reference.
#[derive(Debug)]
struct Core<V> {
    shards: Box<[Shard<V>]>,
    hooks: Hooks<V>,
}

impl<V: Clone> Core<V> {
    fn sweep_all(&self) -> usize {
        let now = Instant::now();
        let removed: usize = self
            .shards
            .iter()
            .map(|shard| shard.sweep(now, &self.hooks))
            .sum();
        self.hooks.stats.record_sweep(removed as u64);
        removed
    }
}

impl<V> Sweep for Core<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn sweep_expired(&self) -> usize {
        self.sweep_all()
    }
}

/// The sharded cache engine.
///
/// Every operation is synchronous and returns a [`Reply`]. The engine can be
/// wrapped in an `Arc` and shared across threads.
///
/// # Example
///
/// ```
/// use tidekv::Engine;
/// use std::time::Duration;
///
/// let engine: Engine<&str> = Engine::builder()
///     .sweep_interval(Duration::ZERO)
///     .build()
///     .unwrap();
///
/// // Set a key
/// engine.set("name", "Ariz");
///
/// // Get the value
/// assert_eq!(engine.get("name").into_value(), Some("Ariz"));
///
/// // Set with expiry
/// engine.set_x("session", "abc123", Duration::from_secs(60));
/// assert!(engine.dur("session").ttl() > Duration::from_secs(59));
/// ```
pub struct Engine<V> {
    core: Arc<Core<V>>,
    sweeper: Mutex<Option<ExpirySweeper>>,
}

impl<V> std::fmt::Debug for Engine<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("shards", &self.core.shards.len())
            .field("stats", &self.core.hooks.stats)
            .finish()
    }
}

impl<V> Engine<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an engine with default settings.
    ///
    /// # Errors
    ///
    /// Fails only if the background sweeper cannot be started.
    pub fn new() -> ConfigResult<Self> {
        EngineBuilder::new().build()
    }

    /// Returns a builder for a custom engine.
    pub fn builder() -> EngineBuilder<V> {
        EngineBuilder::new()
    }

    /// Creates an engine from validated settings.
    pub(crate) fn from_parts(
        config: EngineConfig,
        on_evict: Option<EvictionCallback<V>>,
    ) -> ConfigResult<Self> {
        let shards = (0..config.shard_count).map(|_| Shard::default()).collect();
        let core = Arc::new(Core {
            shards,
            hooks: Hooks::new(on_evict),
        });

        let sweeper = if config.sweep_interval.is_zero() {
            None
        } else {
            let target: Arc<dyn Sweep> = Arc::clone(&core) as Arc<dyn Sweep>;
            let target: Weak<dyn Sweep> = Arc::downgrade(&target);
            Some(ExpirySweeper::start(target, config.sweep_interval)?)
        };

        info!(
            shards = config.shard_count,
            sweep_interval_ms = config.sweep_interval.as_millis() as u64,
            "Cache engine initialized"
        );

        Ok(Self {
            core,
            sweeper: Mutex::new(sweeper),
        })
    }
}

impl<V: Clone> Engine<V> {
    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.as_bytes().hash(&mut hasher);
        (hasher.finish() % self.core.shards.len() as u64) as usize
    }

    /// Gets the shard for a given key.
    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.core.shards[self.shard_index(key)]
    }

    #[inline]
    fn hooks(&self) -> &Hooks<V> {
        &self.core.hooks
    }

    /// Reports whether a live entry exists for `key`.
    ///
    /// An expired entry found here is purged and reported to the eviction
    /// callback.
    pub fn has(&self, key: &str) -> Reply<V> {
        let reply = self.shard(key).has(key, self.hooks());
        self.hooks().stats.record_get(reply.exists());
        reply
    }

    /// Stores `value` under `key` with no expiry, clearing any previous one.
    ///
    /// `exists` reports whether a live entry was overwritten.
    pub fn set(&self, key: &str, value: V) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).set(key, value, None, self.hooks())
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// A zero `ttl` stores the entry without expiry.
    pub fn set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).set(key, value, Some(ttl), self.hooks())
    }

    /// Stores `value` only if `key` has no live entry.
    ///
    /// If it does, nothing changes and the reply has `exists == true`, the
    /// current value and [`ReplyError::KeyExists`](crate::ReplyError::KeyExists).
    pub fn set_n(&self, key: &str, value: V) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).set_absent(key, value, None, self.hooks())
    }

    /// Like [`set_n`](Self::set_n), with an expiry `ttl` from now.
    pub fn set_nx(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).set_absent(key, value, Some(ttl), self.hooks())
    }

    /// Removes `key`. Removing an absent or expired key is not an error.
    pub fn del(&self, key: &str) -> Reply<V> {
        let reply = self.shard(key).del(key, self.hooks());
        if reply.exists() {
            self.hooks().stats.record_delete();
        }
        reply
    }

    /// Purges `key` if, and only if, it has expired.
    ///
    /// `exists` reports whether an expired entry was purged by this call.
    pub fn del_expired(&self, key: &str) -> Reply<V> {
        self.shard(key).del_expired(key, self.hooks())
    }

    /// Returns the live value for `key` and its remaining TTL.
    pub fn get(&self, key: &str) -> Reply<V> {
        let reply = self.shard(key).get(key, self.hooks());
        self.hooks().stats.record_get(reply.exists());
        reply
    }

    /// Atomically reads and removes `key`.
    pub fn get_del(&self, key: &str) -> Reply<V> {
        let reply = self.shard(key).get_del(key, self.hooks());
        self.hooks().stats.record_get(reply.exists());
        if reply.exists() {
            self.hooks().stats.record_delete();
        }
        reply
    }

    /// Atomically replaces the value under `key`, clearing its expiry.
    ///
    /// The reply carries the previous live value, if any.
    pub fn get_set(&self, key: &str, value: V) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).get_set(key, value, None, self.hooks())
    }

    /// Like [`get_set`](Self::get_set), with a new expiry `ttl` from now.
    pub fn get_set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        self.hooks().stats.record_set();
        self.shard(key).get_set(key, value, Some(ttl), self.hooks())
    }

    /// Sets the expiry of a live entry to `ttl` from now.
    ///
    /// A zero `ttl` clears the expiry, making the entry permanent. Absent or
    /// expired keys are left alone and reported with `exists == false`.
    pub fn expire(&self, key: &str, ttl: Duration) -> Reply<V> {
        self.shard(key).expire(key, ttl, self.hooks())
    }

    /// Removes the expiry of a live entry.
    pub fn persist(&self, key: &str) -> Reply<V> {
        self.expire(key, Duration::ZERO)
    }

    /// Returns the remaining TTL of a live entry; zero if it has no expiry.
    pub fn dur(&self, key: &str) -> Reply<V> {
        let reply = self.shard(key).dur(key, self.hooks());
        self.hooks().stats.record_get(reply.exists());
        reply
    }

    /// Visits every live key until `visit` returns false.
    ///
    /// `exists` on the reply is true when every live key was visited.
    /// See [`range`](Self::range) for the locking rules.
    pub fn range_keys<F>(&self, mut visit: F) -> Reply<V>
    where
        F: FnMut(&str) -> bool,
    {
        self.range(|key, _| visit(key))
    }

    /// Visits every live entry until `visit` returns false.
    ///
    /// Entries that had expired before the call started are never visited.
    /// Each shard's live entries are copied out under its read lock and
    /// visited after the lock is released, so `visit` may call any operation
    /// on this engine. Expired entries met on the way are purged (and
    /// reported to the eviction callback) before that shard is visited.
    ///
    /// `exists` on the reply is true when every live entry was visited.
    pub fn range<F>(&self, mut visit: F) -> Reply<V>
    where
        F: FnMut(&str, &V) -> bool,
    {
        let now = Instant::now();
        let completed = self
            .core
            .shards
            .iter()
            .all(|shard| shard.range(now, self.hooks(), &mut visit));
        Reply::found(completed)
    }

    /// Counts the live entries across all shards.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.core.shards.iter().map(|shard| shard.live_len(now)).sum()
    }

    /// Returns true if no live entry is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counts the entries physically stored, including expired entries that
    /// have not been purged yet.
    pub fn stored_len(&self) -> usize {
        self.core.shards.iter().map(Shard::stored_len).sum()
    }

    /// Drops every entry. The eviction callback is not invoked.
    pub fn flush(&self) {
        for shard in self.core.shards.iter() {
            shard.clear();
        }
    }

    /// Runs one sweep over all shards on the calling thread.
    ///
    /// Returns the number of entries that were purged.
    pub fn sweep_expired(&self) -> usize {
        self.core.sweep_all()
    }

    /// Number of shards, fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.core.shards.len()
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> CacheStats {
        self.hooks().stats.snapshot()
    }
}

impl<V> Engine<V> {
    /// Returns true while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stops the background sweeper; lazy expiry keeps working.
    ///
    /// Safe to call any number of times and concurrently with other
    /// operations. Dropping the engine has the same effect.
    pub fn close(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.stop();
        }
    }
}
