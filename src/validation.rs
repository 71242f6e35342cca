//! Input validation errors
//!
//! Everything here is checked before a request reaches the gateway.

use thiserror::Error;

/// Errors raised before any gateway call is attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Amount is not a number: {0:?}")]
    NotANumber(String),

    #[error("Amount must not be negative: {0}")]
    Negative(f64),

    #[error("Amount must be finite")]
    NotFinite,

    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Unknown mood: {0}")]
    UnknownMood(String),

    #[error("Invalid clock time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

/// Check that an integer score lies in `min..=max`
pub fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
