//! Flowva Engine - Streak rules and the rewards operations built on them

pub mod ops;
pub mod rules;

pub use ops::{
    check_in_at, complete_quest, get_user_stats, list_quests, list_redeemables,
    perform_daily_check_in, redeem_reward,
};
pub use rules::{streak_calendar, DayCell, DayState, StreakDecision};

#[cfg(test)]
mod test_support;
