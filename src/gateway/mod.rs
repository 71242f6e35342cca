//! Gateway
//!
//! The remote HTTP backend that persists all logs. The core only ever talks
//! to it through the [`Gateway`] trait:
//!
//! - **HttpGateway**: the real REST client
//! - **InMemoryGateway**: a local stand-in for tests and offline use

mod client;
pub mod dto;
mod error;
mod memory;

pub use client::HttpGateway;
pub use error::{Endpoint, GatewayError, GatewayResult};
pub use memory::InMemoryGateway;

use async_trait::async_trait;

use crate::diary::{DiaryEntry, NewDiaryEntry};
use crate::hydration::{DailyTotal, IntakeEntry};
use crate::sleep::{NewSleepEntry, SleepAnalysis, SleepEntry};

/// Collection endpoints consumed by the views
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /hydration/`
    async fn list_intake(&self) -> GatewayResult<Vec<IntakeEntry>>;

    /// `POST /hydration/`
    async fn create_intake(&self, user: u64, amount: f64) -> GatewayResult<IntakeEntry>;

    /// `GET /hydration/total_water_intake_by_user/{user}/`
    async fn daily_totals(&self, user: u64) -> GatewayResult<Vec<DailyTotal>>;

    /// `GET /diary/user_log/{user}/`
    async fn list_diary(&self, user: u64) -> GatewayResult<Vec<DiaryEntry>>;

    /// `POST /diary/`
    async fn create_diary(&self, entry: &NewDiaryEntry) -> GatewayResult<DiaryEntry>;

    /// `GET /sleep/`
    async fn list_sleep(&self) -> GatewayResult<Vec<SleepEntry>>;

    /// `POST /sleep/`
    async fn create_sleep(&self, entry: &NewSleepEntry) -> GatewayResult<SleepEntry>;

    /// `GET /sleep/sleep_analysis/{user}/`
    async fn sleep_analysis(&self, user: u64) -> GatewayResult<SleepAnalysis>;
}
