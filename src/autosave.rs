//! Periodic draft snapshots.
//!
//! The wizard publishes its latest `{draft, step}` snapshot on a watch
//! channel; the autosave task overwrites the stored snapshot with whatever is
//! current on every tick, edited or not. Write failures are logged and the
//! next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use pubflow_core::DraftStore;
use pubflow_domain::{DraftKey, DraftSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Shortest period the task ticks at; shorter settings are raised to it.
pub const MIN_AUTOSAVE_PERIOD: Duration = Duration::from_secs(1);

/// Running autosave task. Dropping the handle stops the task at its next
/// wake-up.
pub struct AutosaveHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl AutosaveHandle {
    /// Signals the task to stop without waiting for it.
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stops the task and waits until it has exited, so no write can land
    /// after this returns.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns the autosave loop on the current tokio runtime. The first write
/// happens one `period` after the call, never sooner than
/// [`MIN_AUTOSAVE_PERIOD`].
pub fn spawn_autosave(
    store: Arc<dyn DraftStore>,
    task_key: DraftKey,
    mut snapshots: watch::Receiver<DraftSnapshot>,
    period: Duration,
) -> AutosaveHandle {
    if period < MIN_AUTOSAVE_PERIOD {
        tracing::warn!(
            requested_ms = period.as_millis() as u64,
            "autosave period too short; using the minimum"
        );
    }
    let period = period.max(MIN_AUTOSAVE_PERIOD);
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(key = %task_key, period_secs = period.as_secs(), "autosave started");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    match store.save_snapshot(&task_key, &snapshot) {
                        Ok(()) => {
                            tracing::debug!(key = %task_key, step = snapshot.step, "draft autosaved")
                        }
                        Err(err) => {
                            tracing::warn!(key = %task_key, error = %err, "draft autosave failed")
                        }
                    }
                }
            }
        }

        tracing::debug!(key = %task_key, "autosave stopped");
    });

    AutosaveHandle {
        shutdown,
        task: Some(task),
    }
}
