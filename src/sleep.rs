//! Sleep log
//!
//! Chart shaping over the sleep collection, the gateway's sleep analysis,
//! and validated new entries typed as wall-clock times.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::Series;
use crate::gateway::dto::{optional_number_or_string, CreateSleepRequest};
use crate::gateway::{Gateway, GatewayResult};
use crate::hydration::parse_timestamp;
use crate::session::Session;
use crate::validation::{check_range, ValidationError};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One night as stored by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SleepEntry {
    pub id: u64,
    pub user: u64,
    pub sleep_start: String,
    pub sleep_end: String,
    /// 1 (poor) to 5 (great)
    pub quality: u8,
    /// Hours, computed by the gateway
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub duration: Option<f64>,
}

impl SleepEntry {
    fn start(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.sleep_start).map(|dt| dt.naive_utc())
    }

    /// Chart label: start date as `Nov 20`
    pub fn label(&self) -> String {
        self.start()
            .map(|dt| dt.format("%b %-d").to_string())
            .unwrap_or_else(|| self.sleep_start.clone())
    }

    /// Whole hours slept, 0 when unknown
    pub fn whole_hours(&self) -> f64 {
        self.duration
            .filter(|d| d.is_finite())
            .map(f64::floor)
            .unwrap_or(0.0)
    }
}

/// Hours slept per night
pub fn duration_series(entries: &[SleepEntry]) -> Series {
    entries.iter().map(|e| (e.label(), e.whole_hours())).collect()
}

pub fn quality_emoji(quality: u8) -> &'static str {
    match quality {
        0..=2 => "😴",
        3 => "😌",
        4 => "😊",
        _ => "😁",
    }
}

/// Aggregate figures computed by the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SleepAnalysis {
    /// Mean quality on the 1..=5 scale
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub average_quality: Option<f64>,
    /// Total time slept, in seconds
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub total_duration: Option<f64>,
}

impl SleepAnalysis {
    pub fn total_hours(&self) -> Option<f64> {
        self.total_duration.map(|secs| secs / 3600.0)
    }

    /// Emoji for the average quality, rounded to the nearest step
    pub fn quality_emoji(&self) -> Option<&'static str> {
        self.average_quality
            .filter(|q| q.is_finite())
            .map(|q| quality_emoji(q.round().clamp(0.0, 5.0) as u8))
    }
}

/// A validated night ready to submit
#[derive(Debug, Clone, PartialEq)]
pub struct NewSleepEntry {
    pub user: u64,
    pub sleep_start: String,
    pub sleep_end: String,
    pub quality: u8,
}

impl NewSleepEntry {
    /// Build an entry from `HH:MM` clock times, both anchored on `today`
    pub fn from_clock(
        user: u64,
        start: &str,
        end: &str,
        quality: u8,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        check_range("quality", i64::from(quality), 1, 5)?;
        let start = today.and_time(parse_clock(start)?);
        let end = today.and_time(parse_clock(end)?);

        Ok(Self {
            user,
            sleep_start: start.format(WIRE_FORMAT).to_string(),
            sleep_end: end.format(WIRE_FORMAT).to_string(),
            quality,
        })
    }

    /// Hours between start and end; an end before the start rolls over midnight
    pub fn duration_hours(&self) -> Option<f64> {
        let start = NaiveDateTime::parse_from_str(&self.sleep_start, WIRE_FORMAT).ok()?;
        let end = NaiveDateTime::parse_from_str(&self.sleep_end, WIRE_FORMAT).ok()?;
        let mut minutes = (end - start).num_minutes();
        if minutes < 0 {
            minutes += 24 * 60;
        }
        Some(minutes as f64 / 60.0)
    }

    pub(crate) fn to_request(&self) -> CreateSleepRequest {
        CreateSleepRequest {
            user: self.user,
            sleep_start: self.sleep_start.clone(),
            sleep_end: self.sleep_end.clone(),
            quality: self.quality,
        }
    }
}

fn parse_clock(input: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(input.to_string()))
}

/// The user's nights, the chart built from them and the analysis
#[derive(Debug, Clone, Serialize)]
pub struct SleepSummary {
    /// Newest submission first
    pub entries: Vec<SleepEntry>,
    pub durations: Series,
    /// `None` when the analysis endpoint had nothing to offer
    pub analysis: Option<SleepAnalysis>,
}

impl SleepSummary {
    pub fn new(entries: Vec<SleepEntry>, analysis: Option<SleepAnalysis>) -> Self {
        Self {
            durations: duration_series(&entries),
            entries,
            analysis,
        }
    }

    /// Put a newly accepted night in front and rebuild the chart
    pub fn insert(&mut self, entry: SleepEntry) {
        self.entries.insert(0, entry);
        self.durations = duration_series(&self.entries);
    }
}

async fn fetch_analysis(gateway: &dyn Gateway, session: &Session) -> Option<SleepAnalysis> {
    match gateway.sleep_analysis(session.user_id()).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!(endpoint = %e.endpoint(), error = %e, "Failed to fetch sleep analysis");
            None
        }
    }
}

/// Fetch the sleep log and the analysis, keeping only the session user's nights
///
/// A failed analysis leaves it empty; a failed log fails the load.
pub async fn load(gateway: &dyn Gateway, session: &Session) -> GatewayResult<SleepSummary> {
    let (entries, analysis) = tokio::join!(gateway.list_sleep(), fetch_analysis(gateway, session));
    let entries: Vec<SleepEntry> = entries?
        .into_iter()
        .filter(|e| e.user == session.user_id())
        .collect();

    debug!(entries = entries.len(), "Loaded sleep log");

    Ok(SleepSummary::new(entries, analysis))
}

/// Submit a night, add it to `summary` and refresh the analysis
///
/// Nothing in `summary` changes when the gateway rejects the entry. A
/// failed analysis refresh keeps the previous analysis.
pub async fn submit(
    gateway: &dyn Gateway,
    session: &Session,
    summary: &mut SleepSummary,
    entry: &NewSleepEntry,
) -> GatewayResult<SleepEntry> {
    let created = gateway
        .create_sleep(entry)
        .await
        .inspect_err(|e| warn!(endpoint = %e.endpoint(), error = %e, "Sleep entry rejected"))?;

    info!(id = created.id, quality = created.quality, "Logged sleep");
    summary.insert(created.clone());

    if let Some(analysis) = fetch_analysis(gateway, session).await {
        summary.analysis = Some(analysis);
    }

    Ok(created)
}
