//! Reminder Monitor
//!
//! Tracks the last recorded drink and decides, on a fixed cadence, whether
//! the user should be nudged to drink again. The cadence itself is a
//! [`ReminderTask`] owned by the view that started it.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::types::IntakeEntry;

/// Message shown once a drink is overdue
pub const REMINDER_MESSAGE: &str =
    "It has been more than an hour since your last drink. Please remember to hydrate!";

/// Last drink and the currently shown reminder, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderState {
    last_drink: Option<DateTime<Utc>>,
    message: Option<String>,
}

impl ReminderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_drink(&self) -> Option<DateTime<Utc>> {
        self.last_drink
    }

    /// The reminder currently on screen
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// At least `threshold` has passed since the last drink
    ///
    /// Never true without a recorded drink.
    pub fn is_overdue(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_drink {
            Some(last) => now - last >= threshold,
            None => false,
        }
    }

    /// A new drink was accepted: reset the clock and clear the message
    pub fn record_drink(&mut self, at: DateTime<Utc>) {
        self.last_drink = Some(at);
        self.message = None;
    }

    /// A fresh log was fetched: track its most recent entry
    ///
    /// Only ever moves the last drink forward, so a log fetched before a
    /// submission cannot roll it back. Leaves the message alone.
    pub fn observe_log(&mut self, entries: &[IntakeEntry]) {
        let latest = entries.iter().filter_map(IntakeEntry::instant).max();
        self.last_drink = self.last_drink.max(latest);
    }

    /// Periodic check
    ///
    /// Raises the reminder when overdue and returns it. A check that finds
    /// nothing overdue leaves any earlier message in place.
    pub fn evaluate(&mut self, now: DateTime<Utc>, threshold: Duration) -> Option<&str> {
        if self.is_overdue(now, threshold) {
            self.message = Some(REMINDER_MESSAGE.to_string());
            self.message.as_deref()
        } else {
            None
        }
    }
}

/// A periodic job tied to the lifetime of its owner
///
/// The first run happens one full period after spawning. Dropping the task
/// aborts it; [`ReminderTask::cancel`] stops it and waits for it to finish.
pub struct ReminderTask {
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderTask {
    /// Spawn `on_tick` every `period` on the current tokio runtime
    pub fn spawn<F, Fut>(period: std::time::Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        trace!("Running reminder check");
                        on_tick().await;
                    }
                    _ = signal.notified() => {
                        debug!("Reminder task received shutdown signal");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Whether the background job has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the job and wait until it has exited
    pub async fn cancel(mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ReminderTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
