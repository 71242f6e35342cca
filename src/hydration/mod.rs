//! Hydration tracking
//!
//! - **types**: intake entries, daily totals and amount validation
//! - **aggregator**: per-day totals, today's total and progress
//! - **reminder**: the "time to drink" monitor and its periodic task
//! - **view**: session state tying the three to the gateway

mod aggregator;
mod reminder;
mod types;
mod view;

pub use aggregator::{
    aggregate_daily, progress, today_entries, today_total, today_total_now, totals_series,
    Progress, ProgressError,
};
pub use reminder::{ReminderState, ReminderTask, REMINDER_MESSAGE};
pub use types::{
    date_key, date_prefix, parse_amount, parse_timestamp, validate_amount, DailyTotal,
    IntakeEntry,
};
pub use view::{HydrationSnapshot, HydrationView, Outcome, RefreshError, SubmitError};
