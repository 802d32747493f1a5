//! Storage Engine Module
//!
//! This module provides the core storage functionality for tidekv.
//! It includes a thread-safe, sharded key-value store with TTL support
//! and a background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                               │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...N     │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ Weak
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: Keys can have time-to-live expiry
//! - **Lazy Expiry**: Expired keys are cleaned on access
//! - **Active Expiry**: Background sweeper cleans orphaned expired keys
//! - **Eviction Callback**: Fired exactly once per expired entry, by whichever path finds it
//!
//! ## Example
//!
//! ```
//! use tidekv::storage::Engine;
//! use std::time::Duration;
//!
//! let engine: Engine<String> = Engine::builder()
//!     .sweep_interval(Duration::ZERO)
//!     .build()
//!     .unwrap();
//!
//! // Basic operations
//! engine.set("name", "Ariz".to_string());
//! assert_eq!(engine.get("name").into_value(), Some("Ariz".to_string()));
//!
//! // Set with TTL
//! engine.set_x("session", "token123".to_string(), Duration::from_secs(3600));
//! ```

pub mod config;
pub mod engine;
pub mod entry;
pub mod expiry;
pub mod pool;
pub mod reply;
pub(crate) mod shard;
pub mod stats;

// Re-export commonly used types
pub use config::{EngineBuilder, EngineConfig, DEFAULT_SWEEP_INTERVAL};
pub use engine::Engine;
pub use entry::Entry;
pub use expiry::{ExpirySweeper, Sweep};
pub use pool::{Pool, Pooled};
pub use reply::Reply;
pub use shard::EvictionCallback;
pub use stats::CacheStats;
