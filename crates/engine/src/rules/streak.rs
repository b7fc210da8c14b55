//! Streak calendar rules
//!
//! All day comparisons use UTC calendar dates, not 24-hour windows. A
//! check-in at 23:59 followed by one at 00:01 counts as two consecutive
//! days.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Points granted per streak day; reaching day `n` is worth `100 * n`.
pub const DAILY_CHECK_IN_BASE_POINTS: i64 = 100;

/// Number of cells in the weekly tracker.
pub const TRACKER_DAYS: u32 = 7;

/// What a check-in attempt should do, derived from the last activity marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakDecision {
    /// Last check-in was on the same calendar day; nothing to claim.
    AlreadyCheckedIn,
    /// Last check-in was yesterday; the streak grows by one.
    Continued,
    /// First claim ever, or a gap of more than one day; restart at day one.
    Reset,
}

/// Decide what a check-in at `now` should do given the last activity marker.
pub fn evaluate(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> StreakDecision {
    let Some(last) = last_activity else {
        return StreakDecision::Reset;
    };

    let last_day = last.date_naive();
    let today = now.date_naive();

    if last_day == today {
        return StreakDecision::AlreadyCheckedIn;
    }

    match today.pred_opt() {
        Some(yesterday) if last_day == yesterday => StreakDecision::Continued,
        _ => StreakDecision::Reset,
    }
}

/// The streak length a successful claim should record.
pub fn next_streak(decision: StreakDecision, current_streak: u32) -> u32 {
    match decision {
        StreakDecision::AlreadyCheckedIn => current_streak,
        StreakDecision::Continued => current_streak + 1,
        StreakDecision::Reset => 1,
    }
}

/// Points granted for reaching the given streak day.
pub fn points_for_day(day: u32) -> i64 {
    DAILY_CHECK_IN_BASE_POINTS * i64::from(day)
}

/// Claim state of one cell in the weekly tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    Claimed,
    Next,
    Locked,
}

/// One cell of the weekly tracker.
#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub points: i64,
    pub state: DayState,
}

/// Project a streak onto the weekly tracker.
///
/// Cells up to the streak are claimed, the cell right after it is the next
/// claim, and everything beyond stays locked. A streak past day seven shows
/// a fully claimed week.
pub fn streak_calendar(streak: u32) -> Vec<DayCell> {
    (1..=TRACKER_DAYS)
        .map(|day| {
            let state = if day <= streak {
                DayState::Claimed
            } else if day == streak + 1 {
                DayState::Next
            } else {
                DayState::Locked
            };
            DayCell {
                day,
                points: points_for_day(day),
                state,
            }
        })
        .collect()
}
