//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically visits every
//! shard and removes expired entries. This is called "active expiry" as
//! opposed to "lazy expiry" (which happens on access).
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry (checking on access) is efficient but has a problem:
//! If a key expires and is never accessed again, it will stay in memory forever!
//!
//! The background sweeper solves this by periodically cleaning up expired keys.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Waits for the next tick of a fixed interval (default: 1s)
//! 2. Sweeps every shard, one write lock at a time
//! 3. Logs statistics about the cleanup
//!
//! The task always runs on a dedicated thread driving its own current-thread
//! runtime, whether or not the engine was built inside another runtime.
//! Sweeps and eviction callbacks therefore never run on a caller's worker
//! threads, and the sweeper keeps going after such a runtime shuts down.
//!
//! The task only holds a [`Weak`] reference to what it sweeps, so dropping
//! the engine is enough to end it.

use crate::error::{ConfigError, ConfigResult};
use std::io;
use std::sync::{mpsc, Weak};
use std::thread;
use std::time::Duration;
use tokio::runtime;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Name of the thread the sweeper runs on.
const SWEEPER_THREAD_NAME: &str = "tidekv-sweeper";

/// Something that can purge all of its expired entries in one pass.
pub trait Sweep: Send + Sync + 'static {
    /// Removes every expired entry, returning how many were removed.
    fn sweep_expired(&self) -> usize;
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// # Arguments
    ///
    /// * `target` - What to sweep; the task ends once it has been dropped
    /// * `interval` - Time between sweeps, must not be zero
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sweeper`] if the sweeper thread or its
    /// runtime cannot be created.
    pub fn start(target: Weak<dyn Sweep>, interval: Duration) -> ConfigResult<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = sweeper_loop(target, interval, shutdown_rx);

        // The runtime is built on the sweeper thread so it is never dropped
        // inside a caller's async context.
        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                match runtime::Builder::new_current_thread().enable_time().build() {
                    Ok(rt) => {
                        let _ = ready_tx.send(Ok(()));
                        rt.block_on(task);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(ConfigError::Sweeper)?;

        ready_rx
            .recv()
            .map_err(|_| {
                ConfigError::Sweeper(io::Error::other("sweeper thread exited during startup"))
            })?
            .map_err(ConfigError::Sweeper)?;

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Ok(Self {
            shutdown_tx,
            interval,
        })
    }

    /// The time between two sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped. Calling it
    /// more than once is harmless.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Background expiry sweeper stopped");
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    target: Weak<dyn Sweep>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let Some(target) = target.upgrade() else {
            debug!("Swept cache was dropped, stopping sweeper");
            return;
        };

        let expired = target.sweep_expired();
        if expired > 0 {
            debug!(expired = expired, "Expired keys cleaned up");
        } else {
            trace!("Sweep found no expired keys");
        }
    }
}
