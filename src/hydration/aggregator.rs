//! Hydration Aggregator
//!
//! Pure functions over the raw intake log: per-day totals, today's total
//! and progress against the daily goal.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use super::types::{date_key, DailyTotal, IntakeEntry};
use crate::aggregate::{group_by, Series};

/// Progress computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgressError {
    #[error("Daily goal must be a positive number of liters, got {0}")]
    InvalidGoal(f64),
}

/// Today's progress towards the goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Liters drunk today
    pub total: f64,
    /// Goal in liters
    pub goal: f64,
    /// `total / goal` as a percentage, may exceed 100
    pub percent: f64,
}

impl Progress {
    /// `goal` must already be known to be positive and finite
    pub(crate) fn of_checked_goal(total: f64, goal: f64) -> Self {
        Self {
            total,
            goal,
            percent: total / goal * 100.0,
        }
    }

    pub fn goal_reached(&self) -> bool {
        self.total >= self.goal
    }
}

/// Group entries by calendar date and sum amounts per date
///
/// Dates come out in the order they first appear in `entries`.
pub fn aggregate_daily(entries: &[IntakeEntry]) -> Vec<DailyTotal> {
    group_by(entries, |e| e.date_key().to_string(), |e| e.amount)
        .into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}

/// Entries recorded on `today`, in log order
pub fn today_entries(entries: &[IntakeEntry], today: NaiveDate) -> Vec<&IntakeEntry> {
    let key = date_key(today);
    entries.iter().filter(|e| e.is_on(&key)).collect()
}

/// Sum of amounts recorded on `today`; 0 when there are none
pub fn today_total(entries: &[IntakeEntry], today: NaiveDate) -> f64 {
    today_entries(entries, today).iter().map(|e| e.amount).sum()
}

/// [`today_total`] for the current UTC date
pub fn today_total_now(entries: &[IntakeEntry]) -> f64 {
    today_total(entries, Utc::now().date_naive())
}

/// `total / goal` as a percentage
pub fn progress(total: f64, goal: f64) -> Result<Progress, ProgressError> {
    if !goal.is_finite() || goal <= 0.0 {
        return Err(ProgressError::InvalidGoal(goal));
    }
    Ok(Progress::of_checked_goal(total, goal))
}

/// Chart series of daily totals: dates as labels, liters as values
pub fn totals_series(totals: &[DailyTotal]) -> Series {
    totals.iter().map(|t| (t.date.clone(), t.amount)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, amount: f64, timestamp: &str) -> IntakeEntry {
        IntakeEntry {
            id,
            user: 2,
            amount,
            timestamp: timestamp.to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_scenario_today_total_and_progress() {
        let entries = vec![
            entry(3, 1.0, "2024-11-20T09:00:00Z"),
            entry(2, 2.0, "2024-11-20T13:30:00Z"),
            entry(1, 0.5, "2024-11-19T18:00:00Z"),
        ];
        let today = day("2024-11-20");

        let total = today_total(&entries, today);
        assert_eq!(total, 3.0);

        let p = progress(total, 7.0).unwrap();
        assert!((p.percent - 42.857142857).abs() < 1e-6);
        assert_eq!(format!("{:.2}", p.percent), "42.86");
        assert!(!p.goal_reached());

        let daily = aggregate_daily(&entries);
        assert_eq!(
            daily,
            vec![
                DailyTotal {
                    date: "2024-11-20".to_string(),
                    amount: 3.0
                },
                DailyTotal {
                    date: "2024-11-19".to_string(),
                    amount: 0.5
                },
            ]
        );
    }

    #[test]
    fn test_today_total_empty_is_zero() {
        assert_eq!(today_total(&[], day("2024-11-20")), 0.0);

        let yesterday_only = vec![entry(1, 1.0, "2024-11-19T08:00:00Z")];
        assert_eq!(today_total(&yesterday_only, day("2024-11-20")), 0.0);
        assert!(today_entries(&yesterday_only, day("2024-11-20")).is_empty());
    }

    #[test]
    fn test_today_total_sums_same_date() {
        let amounts = [0.1, 0.25, 1.0, 0.3, 2.2];
        let entries: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| entry(i as u64, a, &format!("2024-11-20T{:02}:00:00Z", i + 6)))
            .collect();

        let expected: f64 = amounts.iter().sum();
        assert_eq!(today_total(&entries, day("2024-11-20")), expected);
    }

    #[test]
    fn test_progress_monotonic_in_total() {
        let goal = 7.0;
        let mut last = f64::NEG_INFINITY;
        for step in 0..=100 {
            let total = step as f64 * 0.1;
            let p = progress(total, goal).unwrap().percent;
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_progress_rejects_zero_goal() {
        assert_eq!(progress(1.0, 0.0), Err(ProgressError::InvalidGoal(0.0)));
        assert!(progress(1.0, -7.0).is_err());
        assert!(progress(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_goal_reached_at_exact_goal() {
        assert!(progress(7.0, 7.0).unwrap().goal_reached());
        assert!(progress(8.0, 7.0).unwrap().percent > 100.0);
    }

    #[test]
    fn test_totals_series() {
        let totals = vec![
            DailyTotal {
                date: "2024-11-19".to_string(),
                amount: 0.5,
            },
            DailyTotal {
                date: "2024-11-20".to_string(),
                amount: 3.0,
            },
        ];
        let series = totals_series(&totals);
        assert_eq!(series.labels, vec!["2024-11-19", "2024-11-20"]);
        assert_eq!(series.values, vec![0.5, 3.0]);
    }
}
