//! Core data types for hydration tracking
//!
//! - `IntakeEntry`: one recorded drink, as returned by the gateway
//! - `DailyTotal`: liters consumed on one calendar date
//! - `parse_amount`: validation of user-entered amounts

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::dto::number_or_string;
use crate::validation::ValidationError;

/// A single recorded hydration event
///
/// Entries are immutable once the gateway has accepted them. The timestamp
/// is kept exactly as supplied so date matching is done on the string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeEntry {
    /// Server-assigned identifier
    pub id: u64,
    /// Owning user
    pub user: u64,
    /// Amount drunk in liters
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    /// ISO 8601 timestamp as supplied by the gateway
    pub timestamp: String,
}

impl IntakeEntry {
    /// Calendar date portion of the timestamp (`YYYY-MM-DD`)
    pub fn date_key(&self) -> &str {
        date_prefix(&self.timestamp)
    }

    /// Whether this entry was recorded on `date`
    pub fn is_on(&self, date: &str) -> bool {
        self.timestamp.starts_with(date)
    }

    /// The timestamp as an absolute instant, if it parses
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Aggregate intake for one calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyTotal {
    /// Date string as supplied (no timezone conversion)
    pub date: String,
    /// Sum of all amounts on that date, in liters
    #[serde(rename = "total_intake", deserialize_with = "number_or_string")]
    pub amount: f64,
}

/// Date portion of an ISO timestamp: everything before `T`
pub fn date_prefix(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// Format a date the way the gateway's timestamps start
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a gateway timestamp
///
/// RFC 3339 with an offset is honoured. A naive date-time without an
/// offset is read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Validate a raw amount
pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NotFinite);
    }
    if amount < 0.0 {
        return Err(ValidationError::Negative(amount));
    }
    Ok(amount)
}

/// Parse and validate an amount typed by the user
pub fn parse_amount(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    let amount = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    validate_amount(amount)
}
