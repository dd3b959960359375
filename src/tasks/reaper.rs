//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, StatsCounters};

// == Reaper Handle ==
/// Controls a running reaper task.
///
/// Stopping is idempotent, and dropping the handle stops the task too.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signals the task to exit. Further calls do nothing.
    pub fn stop(&self) {
        let newly_stopped = self.shutdown_tx.send_if_modified(|stopped| {
            let changed = !*stopped;
            *stopped = true;
            changed
        });
        if newly_stopped {
            info!("Stopping TTL reaper");
        }
    }

    /// Returns true once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns a task that sweeps `store` every `interval`.
///
/// The first sweep runs one full interval after spawning. Each sweep holds
/// the write lock only while scanning the map.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime.
pub fn spawn_reaper(
    store: Arc<RwLock<CacheStore>>,
    stats: Arc<StatsCounters>,
    interval: Duration,
) -> ReaperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("Starting TTL reaper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.write().sweep_expired();
                    stats.record_reclaimed(removed);

                    if removed > 0 {
                        info!("TTL sweep: removed {} expired entries", removed);
                    } else {
                        debug!("TTL sweep: no expired entries found");
                    }
                }
                changed = shutdown_rx.changed() => {
                    // An error means the handle is gone, which also means stop.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("TTL reaper stopped");
    });

    ReaperHandle { shutdown_tx, task }
}
