//! Free-list of scratch buffers.
//!
//! Sweeps and iterations need short-lived buffers (expired keys, evicted
//! pairs). Under high call rates allocating those on every pass shows up,
//! so they are recycled through a bounded free-list instead. A buffer is
//! owned exclusively by its [`Pooled`] guard while in use and is cleared
//! before it goes back on the list.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

/// Buffers that grew beyond this many elements are dropped instead of kept.
const MAX_RETAINED_CAPACITY: usize = 4096;

/// A bounded free-list of `Vec<T>` buffers.
#[derive(Debug)]
pub struct Pool<T> {
    free: Mutex<Vec<Vec<T>>>,
    max_idle: usize,
}

impl<T> Pool<T> {
    /// Creates a pool keeping at most `max_idle` buffers around.
    pub fn new(max_idle: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
        }
    }

    /// Takes an empty buffer from the free-list, or allocates a new one.
    pub fn take(&self) -> Pooled<'_, T> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Pooled { pool: self, buf }
    }

    /// Number of idle buffers currently on the free-list.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn give_back(&self, mut buf: Vec<T>) {
        if buf.capacity() == 0 || buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

/// A buffer on loan from a [`Pool`]; returned to the free-list on drop.
#[derive(Debug)]
pub struct Pooled<'a, T> {
    pool: &'a Pool<T>,
    buf: Vec<T>,
}

impl<T> Deref for Pooled<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.buf
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.buf
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_are_recycled() {
        let pool: Pool<String> = Pool::new(2);
        assert_eq!(pool.idle(), 0);

        {
            let mut buf = pool.take();
            buf.push("a".to_string());
            buf.push("b".to_string());
        }
        assert_eq!(pool.idle(), 1);

        // A recycled buffer comes back empty but keeps its allocation
        let buf = pool.take();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 2);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_unused_buffers_are_not_retained() {
        let pool: Pool<u64> = Pool::new(2);
        drop(pool.take());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_buffers_are_bounded() {
        let pool: Pool<u64> = Pool::new(1);
        let mut a = pool.take();
        let mut b = pool.take();
        a.push(1);
        b.push(2);
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_oversized_buffers_are_dropped() {
        let pool: Pool<u8> = Pool::new(4);
        {
            let mut buf = pool.take();
            buf.reserve(MAX_RETAINED_CAPACITY + 1);
            buf.push(0);
        }
        assert_eq!(pool.idle(), 0);
    }
}
