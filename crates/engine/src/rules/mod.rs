mod streak;

pub use streak::{
    evaluate, next_streak, points_for_day, streak_calendar, DayCell, DayState, StreakDecision,
    DAILY_CHECK_IN_BASE_POINTS, TRACKER_DAYS,
};
