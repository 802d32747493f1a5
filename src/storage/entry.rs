//! Stored values and their expiry deadlines.

use std::time::{Duration, Instant};

/// Computes the absolute deadline for a TTL measured from `now`.
///
/// A zero TTL means "no expiry", and so does a deadline too far in the
/// future to be represented as an `Instant`.
#[inline]
pub fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        now.checked_add(ttl)
    }
}

/// Remaining time until `expires_at` as of `now`; zero when there is no
/// deadline or it has already passed.
#[inline]
pub fn remaining_until(expires_at: Option<Instant>, now: Instant) -> Duration {
    expires_at
        .map(|exp| exp.saturating_duration_since(now))
        .unwrap_or_default()
}

/// A stored value with an optional expiry time.
///
/// An entry whose deadline has passed is logically absent even though it
/// may still sit in its shard until it is purged lazily or by the sweeper.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The actual value stored
    pub value: V,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Creates an entry expiring at `expires_at`, or never when `None`.
    pub fn with_deadline(value: V, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    /// Checks if this entry has expired as of `now`.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Remaining time to live as of `now`; zero when there is no expiry.
    pub fn remaining(&self, now: Instant) -> Duration {
        remaining_until(self.expires_at, now)
    }

    /// Overwrites the value and deadline in place.
    ///
    /// Returns the previous value.
    pub fn replace(&mut self, value: V, expires_at: Option<Instant>) -> V {
        self.expires_at = expires_at;
        std::mem::replace(&mut self.value, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let now = Instant::now();
        let entry = Entry::with_deadline("v", None);

        assert!(!entry.is_expired(now + Duration::from_secs(3600 * 24 * 365)));
        assert_eq!(entry.remaining(now), Duration::ZERO);
    }

    #[test]
    fn test_entry_expires_at_deadline() {
        let now = Instant::now();
        let entry = Entry::with_deadline("v", deadline(now, Duration::from_millis(100)));

        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::from_millis(99)));
        assert!(entry.is_expired(now + Duration::from_millis(100)));
        assert_eq!(entry.remaining(now), Duration::from_millis(100));
        assert_eq!(
            entry.remaining(now + Duration::from_millis(500)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_zero_ttl_means_no_expiry() {
        let now = Instant::now();
        let entry = Entry::with_deadline(1, deadline(now, Duration::ZERO));
        assert!(entry.expires_at.is_none());
        assert!(deadline(now, Duration::MAX).is_none());
    }

    #[test]
    fn test_replace_returns_previous_value() {
        let now = Instant::now();
        let mut entry = Entry::with_deadline(1, deadline(now, Duration::from_secs(1)));

        let old = entry.replace(2, None);
        assert_eq!(old, 1);
        assert_eq!(entry.value, 2);
        assert!(entry.expires_at.is_none());
    }
}
