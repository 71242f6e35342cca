//! Session context
//!
//! Who is logging and what they are aiming for. Passed explicitly into each
//! view instead of living in a global.

use crate::hydration::{Progress, ProgressError};

/// The current user and their daily hydration goal
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user_id: u64,
    daily_goal: f64,
}

impl Session {
    /// Build a session, rejecting a goal that is not a positive finite number
    pub fn new(user_id: u64, daily_goal: f64) -> Result<Self, ProgressError> {
        if !daily_goal.is_finite() || daily_goal <= 0.0 {
            return Err(ProgressError::InvalidGoal(daily_goal));
        }
        Ok(Self {
            user_id,
            daily_goal,
        })
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Daily goal in liters
    pub fn daily_goal(&self) -> f64 {
        self.daily_goal
    }

    /// Progress of `total` liters against this session's goal
    ///
    /// The goal was checked in [`Session::new`].
    pub fn progress(&self, total: f64) -> Progress {
        Progress::of_checked_goal(total, self.daily_goal)
    }
}
