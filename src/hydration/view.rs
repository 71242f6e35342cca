//! Hydration View
//!
//! Session-scoped state: the intake log, the gateway's daily totals and the
//! reminder. All mutation goes through the view. Once closed, the view
//! ignores any gateway response that completes afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use super::aggregator::{today_entries, totals_series, Progress};
use super::reminder::{ReminderState, ReminderTask};
use super::types::{parse_amount, validate_amount, DailyTotal, IntakeEntry};
use crate::aggregate::Series;
use crate::config::ReminderConfig;
use crate::gateway::{Endpoint, Gateway, GatewayError};
use crate::session::Session;
use crate::validation::ValidationError;

/// Capacity of the reminder broadcast channel
const REMINDER_CHANNEL_CAPACITY: usize = 16;

/// Errors from [`HydrationView::submit`]
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Invalid amount: {0}")]
    Validation(#[from] ValidationError),

    #[error("Gateway rejected the entry: {0}")]
    Gateway(#[from] GatewayError),

    #[error("View is closed")]
    Closed,
}

/// Endpoints that failed during [`HydrationView::refresh`]
#[derive(Error, Debug)]
#[error("Refresh failed: {}", describe_failures(.failures))]
pub struct RefreshError {
    pub failures: Vec<GatewayError>,
}

impl RefreshError {
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.failures.iter().map(GatewayError::endpoint).collect()
    }
}

fn describe_failures(failures: &[GatewayError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What happened to a gateway response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The view was closed before the response arrived
    Discarded,
}

/// Read-only projection of the view for rendering
#[derive(Debug, Clone, Serialize)]
pub struct HydrationSnapshot {
    pub today_entries: Vec<IntakeEntry>,
    pub today_total: f64,
    pub progress: Progress,
    pub daily_totals: Vec<DailyTotal>,
    pub series: Series,
    pub reminder: Option<String>,
    pub last_drink: Option<DateTime<Utc>>,
}

impl HydrationSnapshot {
    /// The first `n` of today's entries
    pub fn recent(&self, n: usize) -> &[IntakeEntry] {
        &self.today_entries[..n.min(self.today_entries.len())]
    }
}

#[derive(Default)]
struct ViewState {
    log: Vec<IntakeEntry>,
    daily_totals: Vec<DailyTotal>,
    reminder: ReminderState,
    /// Bumped for every accepted submission
    generation: u64,
    closed: bool,
}

impl ViewState {
    /// Install a fetched log
    ///
    /// When submissions were accepted after the fetch left, entries that
    /// are in the local log but missing from the fetched one stay in front.
    fn apply_log(&mut self, fetched: Vec<IntakeEntry>, fetched_at: u64) {
        self.reminder.observe_log(&fetched);

        if self.generation == fetched_at {
            self.log = fetched;
            return;
        }

        let mut merged: Vec<IntakeEntry> = self
            .log
            .drain(..)
            .filter(|local| !fetched.iter().any(|e| e.id == local.id))
            .collect();
        debug!(kept = merged.len(), "Keeping entries accepted during fetch");
        merged.extend(fetched);
        self.log = merged;
    }
}

struct Inner {
    gateway: Arc<dyn Gateway>,
    session: Session,
    threshold: chrono::Duration,
    state: RwLock<ViewState>,
    reminders: broadcast::Sender<String>,
}

impl Inner {
    async fn check_reminder(&self, now: DateTime<Utc>) -> Option<String> {
        let mut state = self.state.write().await;
        if state.closed {
            return None;
        }

        let message = state.reminder.evaluate(now, self.threshold)?.to_string();
        info!(last_drink = ?state.reminder.last_drink(), "Hydration reminder raised");
        // No subscribers is fine
        let _ = self.reminders.send(message.clone());
        Some(message)
    }
}

/// State for one hydration session
pub struct HydrationView {
    inner: Arc<Inner>,
    task: Mutex<Option<ReminderTask>>,
}

impl HydrationView {
    /// Create the view and start the reminder task when enabled
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(gateway: Arc<dyn Gateway>, session: Session, config: &ReminderConfig) -> Self {
        let (reminders, _) = broadcast::channel(REMINDER_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            gateway,
            session,
            threshold: config.threshold(),
            state: RwLock::new(ViewState::default()),
            reminders,
        });

        let task = config.enabled.then(|| {
            let inner = inner.clone();
            ReminderTask::spawn(config.check_interval(), move || {
                let inner = inner.clone();
                async move {
                    inner.check_reminder(Utc::now()).await;
                }
            })
        });

        debug!(
            user = inner.session.user_id(),
            reminders = config.enabled,
            "Opened hydration view"
        );

        Self {
            inner,
            task: Mutex::new(task),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Receive every reminder raised from now on
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.reminders.subscribe()
    }

    /// Fetch the log and the daily totals concurrently
    ///
    /// A failed part keeps its previous value.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let (log, totals) = tokio::join!(self.fetch_log(), self.fetch_daily_totals());

        let failures: Vec<GatewayError> = [log.err(), totals.err()].into_iter().flatten().collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RefreshError { failures })
        }
    }

    /// Replace the log with the session user's entries
    pub async fn fetch_log(&self) -> Result<Outcome, GatewayError> {
        let user = self.inner.session.user_id();
        let fetched_at = self.inner.state.read().await.generation;
        let entries: Vec<IntakeEntry> = match self.inner.gateway.list_intake().await {
            Ok(entries) => entries.into_iter().filter(|e| e.user == user).collect(),
            Err(e) => {
                warn!(endpoint = %e.endpoint(), error = %e, "Failed to fetch hydration log");
                return Err(e);
            }
        };

        let mut state = self.inner.state.write().await;
        if state.closed {
            debug!("Discarding hydration log received after close");
            return Ok(Outcome::Discarded);
        }

        debug!(entries = entries.len(), "Fetched hydration log");
        state.apply_log(entries, fetched_at);
        Ok(Outcome::Applied)
    }

    /// Replace the daily totals with the gateway's aggregate
    pub async fn fetch_daily_totals(&self) -> Result<Outcome, GatewayError> {
        let user = self.inner.session.user_id();
        let totals = match self.inner.gateway.daily_totals(user).await {
            Ok(totals) => totals,
            Err(e) => {
                warn!(endpoint = %e.endpoint(), error = %e, "Failed to fetch daily totals");
                return Err(e);
            }
        };

        let mut state = self.inner.state.write().await;
        if state.closed {
            debug!("Discarding daily totals received after close");
            return Ok(Outcome::Discarded);
        }

        state.daily_totals = totals;
        Ok(Outcome::Applied)
    }

    /// Record a drink of `amount` liters
    ///
    /// Nothing changes locally until the gateway has accepted the entry.
    pub async fn submit(&self, amount: f64) -> Result<IntakeEntry, SubmitError> {
        let amount = validate_amount(amount)?;
        if self.is_closed().await {
            return Err(SubmitError::Closed);
        }

        let user = self.inner.session.user_id();
        let entry = self
            .inner
            .gateway
            .create_intake(user, amount)
            .await
            .inspect_err(|e| warn!(endpoint = %e.endpoint(), error = %e, "Intake rejected"))?;

        {
            let mut state = self.inner.state.write().await;
            if state.closed {
                debug!(id = entry.id, "Discarding accepted intake received after close");
                return Ok(entry);
            }
            state.log.insert(0, entry.clone());
            state.generation += 1;
            state
                .reminder
                .record_drink(entry.instant().unwrap_or_else(Utc::now));
        }

        info!(id = entry.id, amount, "Logged intake");

        // Failure is already logged and the previous totals stay in place
        let _ = self.fetch_daily_totals().await;

        Ok(entry)
    }

    /// [`submit`](Self::submit) for a raw form value
    pub async fn submit_text(&self, input: &str) -> Result<IntakeEntry, SubmitError> {
        let amount = parse_amount(input)?;
        self.submit(amount).await
    }

    /// Run one reminder evaluation at `now`
    pub async fn check_reminder(&self, now: DateTime<Utc>) -> Option<String> {
        self.inner.check_reminder(now).await
    }

    /// Current state projected for `today`
    pub async fn snapshot(&self, today: NaiveDate) -> HydrationSnapshot {
        let state = self.inner.state.read().await;
        let entries: Vec<IntakeEntry> = today_entries(&state.log, today).into_iter().cloned().collect();
        let total: f64 = entries.iter().map(|e| e.amount).sum();

        HydrationSnapshot {
            today_total: total,
            progress: self.inner.session.progress(total),
            series: totals_series(&state.daily_totals),
            daily_totals: state.daily_totals.clone(),
            reminder: state.reminder.message().map(str::to_string),
            last_drink: state.reminder.last_drink(),
            today_entries: entries,
        }
    }

    /// The log, most recent first
    pub async fn log(&self) -> Vec<IntakeEntry> {
        self.inner.state.read().await.log.clone()
    }

    pub async fn daily_totals(&self) -> Vec<DailyTotal> {
        self.inner.state.read().await.daily_totals.clone()
    }

    pub async fn last_drink(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().await.reminder.last_drink()
    }

    pub async fn reminder_message(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .await
            .reminder
            .message()
            .map(str::to_string)
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.state.read().await.closed
    }

    /// Whether the reminder task is still running
    pub fn reminder_running(&self) -> bool {
        self.task
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }

    /// Tear the view down: stop the reminder task and ignore late responses
    pub async fn close(&self) {
        self.inner.state.write().await.closed = true;

        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            task.cancel().await;
        }

        debug!(user = self.inner.session.user_id(), "Closed hydration view");
    }
}
