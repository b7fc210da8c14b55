//! Rewards operations over a backing store
//!
//! Every point mutation validates against freshly read state and writes
//! through the balance guard. A lost guard means someone else moved the
//! balance first; the operation re-reads and re-validates before trying
//! again.

mod checkin;
mod quests;
mod redeem;
mod stats;

pub use checkin::{check_in_at, perform_daily_check_in};
pub use quests::complete_quest;
pub use redeem::redeem_reward;
pub use stats::{get_user_stats, list_quests, list_redeemables};

/// Attempts per point mutation before giving up on guard conflicts.
pub(crate) const MAX_WRITE_CONFLICT_RETRIES: usize = 3;
