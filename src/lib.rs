//! # Wellspring
//!
//! Personal wellness tracking core: hydration logging with an hourly
//! "time to drink" reminder, plus mood diary and sleep summaries. All
//! durable state lives behind a remote HTTP gateway.
//!
//! ## Modules
//!
//! - [`hydration`]: intake aggregation, the reminder monitor and the session view
//! - [`diary`]: mood tally and emotional rating chart
//! - [`sleep`]: sleep duration chart and clock-time entries
//! - [`aggregate`]: the group-by primitive shared by all of the above
//! - [`gateway`]: the [`Gateway`] trait with HTTP and in-memory implementations
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wellspring::{Config, HttpGateway, HydrationView};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default();
//!     let gateway = Arc::new(HttpGateway::new(&config.gateway)?);
//!     let view = HydrationView::open(gateway, config.session()?, &config.reminder);
//!
//!     view.refresh().await?;
//!     view.submit(0.5).await?;
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let snapshot = view.snapshot(today).await;
//!     println!("{:.1} L ({:.0}%)", snapshot.today_total, snapshot.progress.percent);
//!
//!     view.close().await;
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod diary;
pub mod gateway;
pub mod hydration;
pub mod logging;
pub mod session;
pub mod sleep;
pub mod validation;

// Re-export top-level types for convenience
pub use aggregate::{group_by, most_frequent, tally, Series};

pub use config::{Config, ConfigError, GatewayConfig, LoggingConfig, ReminderConfig, SessionConfig};

pub use diary::{DiaryEntry, DiarySummary, NewDiaryEntry};

pub use gateway::{Endpoint, Gateway, GatewayError, GatewayResult, HttpGateway, InMemoryGateway};

pub use hydration::{
    DailyTotal, HydrationSnapshot, HydrationView, IntakeEntry, Progress, ProgressError,
    RefreshError, ReminderState, SubmitError, REMINDER_MESSAGE,
};

pub use session::Session;

pub use sleep::{NewSleepEntry, SleepAnalysis, SleepEntry, SleepSummary};

pub use validation::ValidationError;
