//! A single independently locked partition of the key space.
//!
//! Every operation that names a key first checks whether the stored entry
//! has expired. If it has, the entry is removed under the write lock and the
//! operation carries on as though the key had been absent. The eviction
//! callback for that entry runs after the lock is released, on the calling
//! thread, so a callback may safely call back into the cache.
//!
//! Read-only operations (`has`, `get`, `dur`, iteration) take the read lock
//! and upgrade to the write lock only when an expired entry must be purged.
//! Iteration copies the live entries out under the read lock and runs the
//! visitor afterwards, so a visitor may call any operation on the cache.

use crate::error::ReplyError;
use crate::storage::entry::{deadline, remaining_until, Entry};
use crate::storage::pool::Pool;
use crate::storage::reply::Reply;
use crate::storage::stats::Stats;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Maximum number of idle scratch buffers kept per engine.
const SCRATCH_BUFFERS: usize = 16;

/// User hook invoked once per expired entry, with the removed key and value.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, V) + Send + Sync>;

type Map<V> = HashMap<String, Entry<V>>;

/// State shared by every shard of one engine.
pub(crate) struct Hooks<V> {
    pub(crate) on_evict: Option<EvictionCallback<V>>,
    pub(crate) stats: Stats,
    keys: Pool<String>,
    pairs: Pool<(String, V)>,
}

impl<V> Hooks<V> {
    pub(crate) fn new(on_evict: Option<EvictionCallback<V>>) -> Self {
        Self {
            on_evict,
            stats: Stats::default(),
            keys: Pool::new(SCRATCH_BUFFERS),
            pairs: Pool::new(SCRATCH_BUFFERS),
        }
    }

    #[inline]
    fn notify(&self, key: &str, value: V) {
        if let Some(on_evict) = &self.on_evict {
            on_evict(key, value);
        }
    }
}

impl<V> fmt::Debug for Hooks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_evict", &self.on_evict.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug)]
pub(crate) struct Shard<V> {
    map: RwLock<Map<V>>,
}

impl<V> Default for Shard<V> {
    fn default() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> Shard<V> {
    fn read(&self) -> RwLockReadGuard<'_, Map<V>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Map<V>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes `key` if its entry has expired as of `now`.
    fn purge_expired(map: &mut Map<V>, key: &str, now: Instant) -> Option<(String, V)> {
        if !map.get(key)?.is_expired(now) {
            return None;
        }
        map.remove_entry(key).map(|(key, entry)| (key, entry.value))
    }

    /// Reports a lazily purged entry. Must be called with no lock held.
    fn expired(&self, hooks: &Hooks<V>, evicted: Option<(String, V)>) {
        if let Some((key, value)) = evicted {
            trace!(key = key.as_str(), "purged expired entry on access");
            hooks.stats.record_lazy_expiry();
            hooks.notify(&key, value);
        }
    }

    /// Applies `f` to the live entry under `key`.
    ///
    /// The fast path only takes the read lock. An expired entry is purged
    /// under the write lock, after re-checking it: another thread may have
    /// replaced it in between.
    fn read_live<R>(
        &self,
        key: &str,
        now: Instant,
        hooks: &Hooks<V>,
        f: impl FnOnce(&Entry<V>) -> R,
    ) -> Option<R> {
        {
            let map = self.read();
            match map.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(f(entry)),
                Some(_) => {}
            }
        }

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let result = map.get(key).map(f);
        drop(map);

        self.expired(hooks, evicted);
        result
    }

    pub(crate) fn has(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();
        Reply::found(self.read_live(key, now, hooks, |_| ()).is_some())
    }

    pub(crate) fn get(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();
        self.read_live(key, now, hooks, |entry| {
            Reply::hit(entry.value.clone(), entry.remaining(now))
        })
        .unwrap_or_default()
    }

    pub(crate) fn dur(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();
        self.read_live(key, now, hooks, |entry| {
            Reply::found(true).with_ttl(entry.remaining(now))
        })
        .unwrap_or_default()
    }

    /// Stores `value` under `key`, overwriting any live entry in place.
    ///
    /// `ttl` of `None` clears the expiry.
    pub(crate) fn set(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        hooks: &Hooks<V>,
    ) -> Reply<V> {
        let now = Instant::now();
        let expires_at = ttl.and_then(|ttl| deadline(now, ttl));

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let replaced = match map.get_mut(key) {
            Some(entry) => {
                entry.replace(value, expires_at);
                true
            }
            None => {
                map.insert(key.to_owned(), Entry::with_deadline(value, expires_at));
                false
            }
        };
        drop(map);

        self.expired(hooks, evicted);
        Reply::found(replaced).with_ttl(remaining_until(expires_at, now))
    }

    /// Stores `value` only if `key` has no live entry.
    ///
    /// On conflict the reply carries the current value and `KeyExists`.
    pub(crate) fn set_absent(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        hooks: &Hooks<V>,
    ) -> Reply<V> {
        let now = Instant::now();
        let expires_at = ttl.and_then(|ttl| deadline(now, ttl));

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let reply = match map.get(key) {
            Some(entry) => Reply::hit(entry.value.clone(), entry.remaining(now))
                .with_error(ReplyError::KeyExists),
            None => {
                map.insert(key.to_owned(), Entry::with_deadline(value, expires_at));
                Reply::absent().with_ttl(remaining_until(expires_at, now))
            }
        };
        drop(map);

        self.expired(hooks, evicted);
        reply
    }

    pub(crate) fn del(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let removed = map.remove(key).is_some();
        drop(map);

        self.expired(hooks, evicted);
        Reply::found(removed)
    }

    /// Purges `key` only if it is expired.
    ///
    /// `exists` reports whether this call removed an expired entry.
    pub(crate) fn del_expired(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();

        let evicted = Self::purge_expired(&mut self.write(), key, now);
        let purged = evicted.is_some();

        self.expired(hooks, evicted);
        Reply::found(purged)
    }

    pub(crate) fn get_del(&self, key: &str, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let removed = map.remove(key);
        drop(map);

        self.expired(hooks, evicted);
        removed.map_or_else(Reply::absent, |entry| {
            Reply::hit(entry.value, Duration::ZERO)
        })
    }

    /// Replaces the value under `key`, returning the previous live value.
    pub(crate) fn get_set(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        hooks: &Hooks<V>,
    ) -> Reply<V> {
        let now = Instant::now();
        let expires_at = ttl.and_then(|ttl| deadline(now, ttl));
        let remaining = remaining_until(expires_at, now);

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let reply = match map.get_mut(key) {
            Some(entry) => Reply::hit(entry.replace(value, expires_at), remaining),
            None => {
                map.insert(key.to_owned(), Entry::with_deadline(value, expires_at));
                Reply::absent().with_ttl(remaining)
            }
        };
        drop(map);

        self.expired(hooks, evicted);
        reply
    }

    /// Updates the expiry of a live entry; a zero `ttl` makes it permanent.
    pub(crate) fn expire(&self, key: &str, ttl: Duration, hooks: &Hooks<V>) -> Reply<V> {
        let now = Instant::now();

        let mut map = self.write();
        let evicted = Self::purge_expired(&mut map, key, now);
        let reply = match map.get_mut(key) {
            Some(entry) => {
                entry.expires_at = deadline(now, ttl);
                Reply::found(true).with_ttl(entry.remaining(now))
            }
            None => Reply::absent(),
        };
        drop(map);

        self.expired(hooks, evicted);
        reply
    }

    /// Visits every entry live as of `now` until `visit` returns false.
    ///
    /// Live entries are copied out under the read lock and `visit` runs once
    /// it has been released. Expired entries met on the way are purged
    /// before the visit starts.
    ///
    /// Returns `false` if the visit was cut short.
    pub(crate) fn range(
        &self,
        now: Instant,
        hooks: &Hooks<V>,
        visit: &mut dyn FnMut(&str, &V) -> bool,
    ) -> bool {
        let mut live = hooks.pairs.take();
        let mut expired = hooks.keys.take();

        {
            let map = self.read();
            for (key, entry) in map.iter() {
                if entry.is_expired(now) {
                    expired.push(key.clone());
                } else {
                    live.push((key.clone(), entry.value.clone()));
                }
            }
        }

        if !expired.is_empty() {
            self.purge_keys(&expired, hooks);
        }
        live.iter().all(|(key, value)| visit(key.as_str(), value))
    }

    /// Purges whichever of `keys` are still expired.
    fn purge_keys(&self, keys: &[String], hooks: &Hooks<V>) {
        let now = Instant::now();
        let mut evicted = hooks.pairs.take();

        {
            let mut map = self.write();
            evicted.extend(
                keys.iter()
                    .filter_map(|key| Self::purge_expired(&mut map, key, now)),
            );
        }

        for (key, value) in evicted.drain(..) {
            hooks.stats.record_lazy_expiry();
            hooks.notify(&key, value);
        }
    }

    /// Removes every entry expired as of `now`.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn sweep(&self, now: Instant, hooks: &Hooks<V>) -> usize {
        if hooks.on_evict.is_none() {
            let mut map = self.write();
            let before = map.len();
            map.retain(|_, entry| !entry.is_expired(now));
            return before - map.len();
        }

        let mut expired = hooks.keys.take();
        let mut evicted = hooks.pairs.take();
        {
            let mut map = self.write();
            expired.extend(
                map.iter()
                    .filter(|(_, entry)| entry.is_expired(now))
                    .map(|(key, _)| key.clone()),
            );
            evicted.extend(expired.iter().filter_map(|key| {
                map.remove_entry(key.as_str())
                    .map(|(key, entry)| (key, entry.value))
            }));
        }

        let removed = evicted.len();
        for (key, value) in evicted.drain(..) {
            hooks.notify(&key, value);
        }
        removed
    }

    /// Number of entries live as of `now`.
    pub(crate) fn live_len(&self, now: Instant) -> usize {
        self.read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Number of entries physically stored, expired or not.
    pub(crate) fn stored_len(&self) -> usize {
        self.read().len()
    }

    /// Drops every entry without invoking the eviction callback.
    pub(crate) fn clear(&self) {
        self.write().clear();
    }
}
