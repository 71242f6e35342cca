//! Request/response bodies for the gateway wire format

use serde::{Deserialize, Deserializer, Serialize};

use crate::hydration::DailyTotal;

// ============================================
// Request DTOs
// ============================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateIntakeRequest {
    pub user: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateDiaryRequest {
    pub user: u64,
    pub mood_descriptors: String,
    pub emotional_rating: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateSleepRequest {
    pub user: u64,
    pub sleep_start: String,
    pub sleep_end: String,
    pub quality: u8,
}

// ============================================
// Response DTOs
// ============================================

/// Body of the per-user daily totals endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DailyTotalsResponse {
    #[serde(default)]
    pub daily_totals: Vec<DailyTotal>,
}

/// Decimal fields arrive either as JSON numbers or as strings like `"1.50"`
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {s:?}"))),
    }
}

/// Like [`number_or_string`], but null and unparsable values become `None`
pub(crate) fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_totals_missing_field_is_empty() {
        let body: DailyTotalsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.daily_totals.is_empty());
    }

    #[test]
    fn test_daily_totals_accepts_string_decimals() {
        let body: DailyTotalsResponse = serde_json::from_str(
            r#"{"daily_totals": [{"date": "2024-11-20", "total_intake": "2.50"},
                                 {"date": "2024-11-21", "total_intake": 1}]}"#,
        )
        .unwrap();
        assert_eq!(body.daily_totals.len(), 2);
        assert_eq!(body.daily_totals[0].amount, 2.5);
        assert_eq!(body.daily_totals[1].amount, 1.0);
    }

    #[test]
    fn test_rejects_garbage_decimal() {
        let result: Result<DailyTotalsResponse, _> = serde_json::from_str(
            r#"{"daily_totals": [{"date": "2024-11-20", "total_intake": "lots"}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_create_intake_body() {
        let body = CreateIntakeRequest {
            user: 2,
            amount: 0.5,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"user": 2, "amount": 0.5})
        );
    }
}
