//! # tidekv - A Sharded In-Process Key-Value Cache
//!
//! tidekv is an in-memory cache engine with TTL-based expiry and
//! concurrent-safe access for values of any type. It is meant for
//! memoization, session storage, rate-limit counters and similar local
//! caching, with no external services involved.
//!
//! ## Features
//!
//! - **Sharded**: Keys are hashed onto independently locked shards
//! - **TTL Support**: Entries can expire; a zero TTL means "never"
//! - **Lazy + Active Expiry**: Expired entries are purged on access and by a background sweeper
//! - **Eviction Callback**: An optional hook sees every expired entry exactly once
//! - **Uniform Replies**: Every operation returns a [`Reply`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              tidekv                                     │
//! │                                                                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Registry   │───>│                 Engine                       │   │
//! │  │ (by name)   │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │  └─────────────┘    │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                                               │                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use tidekv::Engine;
//! use std::time::Duration;
//!
//! let engine: Engine<u64> = Engine::builder()
//!     .shards(16)
//!     .sweep_interval(Duration::from_millis(500))
//!     .on_evict(|key, value| println!("{} expired with {}", key, value))
//!     .build()
//!     .unwrap();
//!
//! engine.set("requests", 1);
//! engine.set_x("window", 10, Duration::from_secs(60));
//!
//! let reply = engine.set_n("requests", 2);
//! assert!(reply.exists()); // already there, nothing changed
//! assert_eq!(reply.value(), Some(&1));
//!
//! engine.close();
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: Sharded engine, replies, expiry sweeper
//! - [`backend`]: The object-safe [`Cache`] contract and the backend [`Registry`]
//! - [`error`]: Error types
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! Each shard is guarded by its own `RwLock`, and no operation ever holds
//! more than one of them. Operations on the same key are serialized;
//! operations on keys in different shards run fully in parallel.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: When a key is accessed, we check if it's expired
//! 2. **Active**: A background task periodically scans for expired keys
//!
//! This ensures memory is reclaimed even for keys that are never accessed again.
//!
//! ### Eviction Callbacks Run Unlocked
//!
//! An expired entry is removed under its shard's write lock exactly once,
//! and the callback runs after that lock is released. A callback may
//! therefore call back into the cache.

pub mod backend;
pub mod error;
pub mod storage;

// Re-export commonly used types for convenience
pub use backend::{Cache, Params, Registry, MEMORY};
pub use error::{ConfigError, ReplyError};
pub use storage::{CacheStats, Engine, EngineBuilder, EngineConfig, Reply};

/// Version of tidekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
