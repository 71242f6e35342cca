//! Gateway error types
//!
//! Every failure carries the [`Endpoint`] it came from so callers can tell
//! which part of a view is missing data.

use std::fmt;
use thiserror::Error;

/// The gateway endpoints consumed by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /hydration/`
    ListIntake,
    /// `POST /hydration/`
    CreateIntake,
    /// `GET /hydration/total_water_intake_by_user/{user}/`
    DailyTotals,
    /// `GET /diary/user_log/{user}/`
    ListDiary,
    /// `POST /diary/`
    CreateDiary,
    /// `GET /sleep/`
    ListSleep,
    /// `POST /sleep/`
    CreateSleep,
    /// `GET /sleep/sleep_analysis/{user}/`
    SleepAnalysis,
}

impl Endpoint {
    /// Method and path template, for logs and error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Endpoint::ListIntake => "GET /hydration/",
            Endpoint::CreateIntake => "POST /hydration/",
            Endpoint::DailyTotals => "GET /hydration/total_water_intake_by_user/{user}/",
            Endpoint::ListDiary => "GET /diary/user_log/{user}/",
            Endpoint::CreateDiary => "POST /diary/",
            Endpoint::ListSleep => "GET /sleep/",
            Endpoint::CreateSleep => "POST /sleep/",
            Endpoint::SleepAnalysis => "GET /sleep/sleep_analysis/{user}/",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors that can occur when talking to the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{endpoint}: gateway unavailable")]
    Unavailable { endpoint: Endpoint },

    #[error("{endpoint}: request timeout")]
    Timeout { endpoint: Endpoint },

    #[error("{endpoint}: API error {status}: {message}")]
    Api {
        endpoint: Endpoint,
        status: u16,
        message: String,
    },

    #[error("{endpoint}: request failed: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: could not decode response: {message}")]
    Decode { endpoint: Endpoint, message: String },
}

impl GatewayError {
    /// The endpoint that failed
    pub fn endpoint(&self) -> Endpoint {
        match self {
            GatewayError::Unavailable { endpoint }
            | GatewayError::Timeout { endpoint }
            | GatewayError::Api { endpoint, .. }
            | GatewayError::Request { endpoint, .. }
            | GatewayError::Decode { endpoint, .. } => *endpoint,
        }
    }

    /// Classify a transport error the way the HTTP client reports it
    pub(crate) fn from_reqwest(endpoint: Endpoint, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout { endpoint }
        } else if err.is_connect() {
            GatewayError::Unavailable { endpoint }
        } else if err.is_decode() {
            GatewayError::Decode {
                endpoint,
                message: err.to_string(),
            }
        } else {
            GatewayError::Request {
                endpoint,
                source: err,
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_endpoint() {
        let err = GatewayError::Api {
            endpoint: Endpoint::CreateIntake,
            status: 400,
            message: "amount: required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "POST /hydration/: API error 400: amount: required"
        );
        assert_eq!(err.endpoint(), Endpoint::CreateIntake);
    }

    #[test]
    fn test_unavailable_endpoint() {
        let err = GatewayError::Unavailable {
            endpoint: Endpoint::DailyTotals,
        };
        assert_eq!(err.endpoint(), Endpoint::DailyTotals);
        assert!(err.to_string().contains("total_water_intake_by_user"));
    }
}
