//! Backend Contract and Registry
//!
//! This module defines [`Cache`], the object-safe contract every cache
//! backend implements, and the [`Registry`] that maps backend names to
//! constructors taking free-form [`Params`].
//!
//! The in-memory [`Engine`](crate::Engine) is the only backend shipped with
//! the crate; it registers under [`MEMORY`].
//!
//! ## Example
//!
//! ```
//! use tidekv::backend::{Cache, Params, Registry, MEMORY};
//! use std::time::Duration;
//!
//! let registry: Registry<String> = Registry::with_memory();
//! let cache: Box<dyn Cache<String>> = registry
//!     .open(MEMORY, &Params::new().with("sweep_interval_ms", "0"))
//!     .unwrap();
//!
//! cache.set_x("user:1", "Ariz".to_string(), Duration::from_secs(60));
//! assert!(cache.has("user:1").exists());
//! ```

pub mod params;
pub mod registry;

pub use params::Params;
pub use registry::{register_memory, Constructor, Registry, MEMORY};

use crate::storage::{CacheStats, Engine, Reply};
use std::time::Duration;

/// The cache contract.
///
/// Every operation is synchronous and returns a [`Reply`]; a missing key is
/// never an error. Durations of zero mean "no expiry".
pub trait Cache<V>: Send + Sync {
    /// Reports whether a live entry exists for `key`.
    fn has(&self, key: &str) -> Reply<V>;
    /// Stores `value` with no expiry.
    fn set(&self, key: &str, value: V) -> Reply<V>;
    /// Stores `value`, expiring `ttl` from now.
    fn set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V>;
    /// Stores `value` only if `key` has no live entry.
    fn set_n(&self, key: &str, value: V) -> Reply<V>;
    /// Stores `value` with an expiry only if `key` has no live entry.
    fn set_nx(&self, key: &str, value: V, ttl: Duration) -> Reply<V>;
    /// Removes `key`.
    fn del(&self, key: &str) -> Reply<V>;
    /// Purges `key` only if it has expired.
    fn del_expired(&self, key: &str) -> Reply<V>;
    /// Returns the live value for `key`.
    fn get(&self, key: &str) -> Reply<V>;
    /// Reads and removes `key`.
    fn get_del(&self, key: &str) -> Reply<V>;
    /// Replaces the value, returning the previous one and clearing the expiry.
    fn get_set(&self, key: &str, value: V) -> Reply<V>;
    /// Replaces the value with a new expiry, returning the previous one.
    fn get_set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V>;
    /// Updates the expiry of a live entry.
    fn expire(&self, key: &str, ttl: Duration) -> Reply<V>;
    /// Returns the remaining TTL of a live entry.
    fn dur(&self, key: &str) -> Reply<V>;
    /// Visits live keys until `visit` returns false.
    fn range_keys(&self, visit: &mut dyn FnMut(&str) -> bool) -> Reply<V>;
    /// Visits live entries until `visit` returns false.
    fn range(&self, visit: &mut dyn FnMut(&str, &V) -> bool) -> Reply<V>;
    /// Counts the live entries.
    fn len(&self) -> usize;
    /// Returns true if no live entry is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns a snapshot of the operation counters.
    fn stats(&self) -> CacheStats;
    /// Releases background resources. Safe to call more than once.
    fn close(&self);
}

impl<V> Cache<V> for Engine<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn has(&self, key: &str) -> Reply<V> {
        Engine::has(self, key)
    }

    fn set(&self, key: &str, value: V) -> Reply<V> {
        Engine::set(self, key, value)
    }

    fn set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        Engine::set_x(self, key, value, ttl)
    }

    fn set_n(&self, key: &str, value: V) -> Reply<V> {
        Engine::set_n(self, key, value)
    }

    fn set_nx(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        Engine::set_nx(self, key, value, ttl)
    }

    fn del(&self, key: &str) -> Reply<V> {
        Engine::del(self, key)
    }

    fn del_expired(&self, key: &str) -> Reply<V> {
        Engine::del_expired(self, key)
    }

    fn get(&self, key: &str) -> Reply<V> {
        Engine::get(self, key)
    }

    fn get_del(&self, key: &str) -> Reply<V> {
        Engine::get_del(self, key)
    }

    fn get_set(&self, key: &str, value: V) -> Reply<V> {
        Engine::get_set(self, key, value)
    }

    fn get_set_x(&self, key: &str, value: V, ttl: Duration) -> Reply<V> {
        Engine::get_set_x(self, key, value, ttl)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Reply<V> {
        Engine::expire(self, key, ttl)
    }

    fn dur(&self, key: &str) -> Reply<V> {
        Engine::dur(self, key)
    }

    fn range_keys(&self, visit: &mut dyn FnMut(&str) -> bool) -> Reply<V> {
        Engine::range_keys(self, visit)
    }

    fn range(&self, visit: &mut dyn FnMut(&str, &V) -> bool) -> Reply<V> {
        Engine::range(self, visit)
    }

    fn len(&self) -> usize {
        Engine::len(self)
    }

    fn stats(&self) -> CacheStats {
        Engine::stats(self)
    }

    fn close(&self) {
        Engine::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn through_trait(cache: &dyn Cache<i32>) {
        assert!(!cache.set("a", 1).exists());
        assert!(cache.has("a").exists());
        assert_eq!(cache.get_set("a", 2).into_value(), Some(1));
        assert!(cache.expire("a", Duration::from_secs(5)).exists());
        assert!(cache.dur("a").ttl() > Duration::ZERO);

        let mut keys = Vec::new();
        assert!(cache
            .range_keys(&mut |key| {
                keys.push(key.to_string());
                true
            })
            .exists());
        assert_eq!(keys, vec!["a".to_string()]);

        let mut total = 0;
        cache.range(&mut |_, value| {
            total += *value;
            true
        });
        assert_eq!(total, 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
        assert_eq!(cache.stats().sets, 2);

        assert_eq!(cache.get_del("a").into_value(), Some(2));
        assert!(!cache.del("a").exists());
        assert!(!cache.del_expired("a").exists());
        cache.close();
    }

    #[test]
    fn test_engine_through_trait_object() {
        let engine: Engine<i32> = Engine::builder()
            .sweep_interval(Duration::ZERO)
            .build()
            .unwrap();
        through_trait(&engine);
    }
}
