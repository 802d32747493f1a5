//! Name-keyed registry of cache backends.
//!
//! The registry is an ordinary value owned by the application, not a
//! process-wide table: build one at startup, register the backends you want,
//! and open caches from it by name.

use crate::backend::{Cache, Params};
use crate::error::{ConfigError, ConfigResult};
use crate::storage::{Engine, EngineBuilder, EngineConfig};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Name under which the in-memory engine registers itself.
pub const MEMORY: &str = "memory";

/// A backend constructor: free-form parameters in, cache out.
pub type Constructor<V> = Box<dyn Fn(&Params) -> ConfigResult<Box<dyn Cache<V>>> + Send + Sync>;

/// Maps backend names to constructors.
///
/// # Example
///
/// ```
/// use tidekv::backend::{Params, Registry, MEMORY};
///
/// let registry: Registry<u64> = Registry::with_memory();
/// let params = Params::new().with("shard_count", "4").with("sweep_interval_ms", "0");
///
/// let cache = registry.open(MEMORY, &params).unwrap();
/// cache.set("hits", 1);
/// assert_eq!(cache.get("hits").into_value(), Some(1));
/// ```
pub struct Registry<V> {
    constructors: HashMap<String, Constructor<V>>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backends", &self.names())
            .finish()
    }
}

impl<V> Registry<V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers `constructor` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&Params) -> ConfigResult<Box<dyn Cache<V>>> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(backend = name.as_str(), "Registered cache backend");
        self.constructors.insert(name, Box::new(constructor));
    }

    /// Returns true if a backend is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a cache from the backend registered under `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownBackend`] if nothing is registered under
    /// `name`, or whatever the constructor reports for bad parameters.
    pub fn open(&self, name: &str, params: &Params) -> ConfigResult<Box<dyn Cache<V>>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))?;
        constructor(params)
    }
}

impl<V> Registry<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a registry with the in-memory engine registered.
    pub fn with_memory() -> Self {
        let mut registry = Self::new();
        register_memory(&mut registry);
        registry
    }
}

/// Registers the in-memory engine under [`MEMORY`].
///
/// Recognized parameters: `shard_count` and `sweep_interval_ms`.
pub fn register_memory<V>(registry: &mut Registry<V>)
where
    V: Clone + Send + Sync + 'static,
{
    registry.register(MEMORY, |params: &Params| {
        let config = EngineConfig::from_params(params)?;
        let engine: Engine<V> = EngineBuilder::with_config(config).build()?;
        Ok(Box::new(engine) as Box<dyn Cache<V>>)
    });
}
