//! Daily check-in outcome model

use serde::{Deserialize, Serialize};

/// Result of a daily check-in attempt.
///
/// `success: false` with a message is the already-checked-in rejection, not
/// an error; infrastructure failures surface as `Error` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInOutcome {
    /// Whether the claim succeeded
    pub success: bool,
    /// Points granted by this claim (100 x new streak)
    #[serde(default)]
    pub points_earned: i64,
    /// Streak length after the claim
    #[serde(default)]
    pub new_streak: u32,
    /// Point balance after the claim
    #[serde(default)]
    pub total_points: i64,
    /// Human-readable rejection reason when `success` is false
    #[serde(default)]
    pub message: Option<String>,
}

impl CheckInOutcome {
    /// The already-checked-in rejection, carrying the unchanged balances
    pub fn already_checked_in(streak: u32, total_points: i64) -> Self {
        CheckInOutcome {
            success: false,
            points_earned: 0,
            new_streak: streak,
            total_points,
            message: Some(format!("Already checked in today. Your streak is {streak}.")),
        }
    }
}
