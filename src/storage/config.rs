//! Engine configuration and builder.

use crate::backend::Params;
use crate::error::{ConfigError, ConfigResult};
use crate::storage::engine::Engine;
use crate::storage::shard::EvictionCallback;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default time between two background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Parameter name for the shard count in free-form backend parameters.
pub const PARAM_SHARD_COUNT: &str = "shard_count";

/// Parameter name for the sweep interval, in milliseconds.
pub const PARAM_SWEEP_INTERVAL_MS: &str = "sweep_interval_ms";

/// Default shard count: twice the number of available processing units.
pub fn default_shard_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        * 2
}

/// Settings consumed by the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of independently locked shards. Fixed for the engine's lifetime.
    pub shard_count: usize,
    /// Time between two background sweeps; zero disables the sweeper and
    /// leaves only lazy expiry.
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Checks the settings, failing fast on values no engine can run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.shard_count == 0 {
            return Err(ConfigError::InvalidShardCount(self.shard_count));
        }
        Ok(())
    }

    /// Reads the settings from free-form backend parameters.
    ///
    /// Recognized keys are `shard_count` and `sweep_interval_ms`; anything
    /// missing keeps its default.
    pub fn from_params(params: &Params) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(count) = params.parse::<usize>(PARAM_SHARD_COUNT)? {
            config.shard_count = count;
        }
        if let Some(ms) = params.parse::<u64>(PARAM_SWEEP_INTERVAL_MS)? {
            config.sweep_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Builder for configuring an [`Engine`].
///
/// # Example
///
/// ```
/// use tidekv::Engine;
/// use std::time::Duration;
///
/// let engine: Engine<String> = Engine::builder()
///     .shards(8)
///     .sweep_interval(Duration::ZERO) // lazy expiry only
///     .on_evict(|key, value| println!("{} expired ({})", key, value))
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.shard_count(), 8);
/// ```
pub struct EngineBuilder<V> {
    config: EngineConfig,
    on_evict: Option<EvictionCallback<V>>,
}

impl<V> Default for EngineBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for EngineBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}

impl<V> EngineBuilder<V> {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a builder starting from `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            on_evict: None,
        }
    }

    /// Set the number of shards.
    ///
    /// More shards reduce contention but increase memory overhead.
    ///
    /// Default: twice the number of available processing units
    pub fn shards(mut self, count: usize) -> Self {
        self.config.shard_count = count;
        self
    }

    /// Set the time between background sweeps.
    ///
    /// Zero disables the sweeper entirely.
    ///
    /// Default: 1 second
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Set the callback invoked once for every entry that expires.
    ///
    /// It runs on the thread that discovered the expiry (the caller for lazy
    /// expiry, the sweeper otherwise) after the shard lock has been released.
    pub fn on_evict<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, V) + Send + Sync + 'static,
    {
        let callback: EvictionCallback<V> = Arc::new(callback);
        self.on_evict = Some(callback);
        self
    }

    /// The settings collected so far.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<V> EngineBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Validates the settings and builds the engine, starting the sweeper
    /// unless the interval is zero.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidShardCount`] for a zero shard count, or
    /// [`ConfigError::Sweeper`] if the sweeper cannot be started.
    pub fn build(self) -> ConfigResult<Engine<V>> {
        self.config.validate()?;
        Engine::from_parts(self.config, self.on_evict)
    }
}
