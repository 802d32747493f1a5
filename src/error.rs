//! Error types for tidekv.
//!
//! The taxonomy is narrow: lookups never fail (a missing key is
//! `exists == false` on the [`Reply`](crate::storage::Reply)), so the only
//! errors are policy violations reported inside a reply and configuration
//! problems reported when an engine is built.

use std::io;
use thiserror::Error;

/// Policy violations attached to a reply.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReplyError {
    /// A not-overwrite set found a live entry under the key
    #[error("key already exists")]
    KeyExists,
}

/// Errors raised while building an engine or opening a backend.
///
/// These are fatal to construction: no partially initialized engine is
/// ever handed out.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The shard count must be at least one
    #[error("invalid shard count: {0} (must be at least 1)")]
    InvalidShardCount(usize),

    /// A free-form backend parameter could not be interpreted
    #[error("invalid value for parameter `{name}`: {value:?}")]
    InvalidParam { name: String, value: String },

    /// No constructor is registered under this name
    #[error("unknown cache backend: {0}")]
    UnknownBackend(String),

    /// The background sweeper could not be started
    #[error("failed to start expiry sweeper: {0}")]
    Sweeper(#[source] io::Error),
}

/// Result type for engine construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ReplyError::KeyExists.to_string(), "key already exists");
        assert_eq!(
            ConfigError::InvalidShardCount(0).to_string(),
            "invalid shard count: 0 (must be at least 1)"
        );
        let err = ConfigError::InvalidParam {
            name: "shard_count".to_string(),
            value: "many".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for parameter `shard_count`: \"many\""
        );
        assert_eq!(
            ConfigError::UnknownBackend("redis".to_string()).to_string(),
            "unknown cache backend: redis"
        );
    }

    #[test]
    fn test_sweeper_error_keeps_source() {
        use std::error::Error as _;

        let err = ConfigError::Sweeper(io::Error::new(io::ErrorKind::Other, "no threads"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("no threads"));
    }
}
