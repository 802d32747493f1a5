//! The uniform outcome of every cache operation.

use crate::error::ReplyError;
use std::time::Duration;

/// What a cache operation found or did.
///
/// Replies are plain values: the `value` is a clone taken while the shard
/// lock was held, so nothing in a reply aliases the cache after the call
/// returns.
///
/// # Example
///
/// ```
/// use tidekv::Engine;
///
/// let engine: Engine<u32> = Engine::builder().sweep_interval(std::time::Duration::ZERO).build().unwrap();
/// engine.set("a", 1);
///
/// let reply = engine.get("a");
/// assert!(reply.exists());
/// assert_eq!(reply.value(), Some(&1));
/// assert!(!engine.get("missing").exists());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<V> {
    exists: bool,
    value: Option<V>,
    error: Option<ReplyError>,
    ttl: Duration,
}

impl<V> Default for Reply<V> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<V> Reply<V> {
    /// A reply for a key that had no live entry.
    pub fn absent() -> Self {
        Self {
            exists: false,
            value: None,
            error: None,
            ttl: Duration::ZERO,
        }
    }

    /// A reply that only reports whether a live entry was found or affected.
    pub fn found(exists: bool) -> Self {
        Self {
            exists,
            ..Self::absent()
        }
    }

    /// A reply carrying a live value and its remaining TTL.
    pub fn hit(value: V, ttl: Duration) -> Self {
        Self {
            exists: true,
            value: Some(value),
            error: None,
            ttl,
        }
    }

    pub(crate) fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub(crate) fn with_error(mut self, error: ReplyError) -> Self {
        self.error = Some(error);
        self
    }

    /// Whether the operation found or affected a live entry.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// The returned value, only ever present when [`exists`](Self::exists) is true.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Consumes the reply, returning the value.
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// The policy violation reported by the operation, if any.
    pub fn error(&self) -> Option<ReplyError> {
        self.error
    }

    /// Remaining time to live; zero for entries without expiry or absent keys.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Converts the reply into a `Result`, surfacing a policy violation as `Err`.
    pub fn into_result(self) -> Result<Option<V>, ReplyError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_reply() {
        let reply: Reply<i32> = Reply::absent();
        assert!(!reply.exists());
        assert_eq!(reply.value(), None);
        assert_eq!(reply.error(), None);
        assert_eq!(reply.ttl(), Duration::ZERO);
        assert_eq!(reply, Reply::default());
    }

    #[test]
    fn test_hit_reply() {
        let reply = Reply::hit("v", Duration::from_secs(5));
        assert!(reply.exists());
        assert_eq!(reply.value(), Some(&"v"));
        assert_eq!(reply.ttl(), Duration::from_secs(5));
        assert_eq!(reply.into_value(), Some("v"));
    }

    #[test]
    fn test_into_result_surfaces_policy_violation() {
        let reply = Reply::hit(3, Duration::ZERO).with_error(ReplyError::KeyExists);
        assert!(reply.exists());
        assert_eq!(reply.into_result(), Err(ReplyError::KeyExists));

        let reply: Reply<i32> = Reply::found(true);
        assert_eq!(reply.into_result(), Ok(None));
    }
}
