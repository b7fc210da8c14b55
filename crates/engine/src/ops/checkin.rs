//! Daily check-in.

use chrono::{DateTime, Utc};
use flowva_core::{CheckInOutcome, Error, ProfilePatch, Result, RewardsStore};
use tracing::{debug, info, warn};

use super::MAX_WRITE_CONFLICT_RETRIES;
use crate::rules::{self, StreakDecision};

/// Perform the daily check-in for a user at the current time.
pub async fn perform_daily_check_in(
    store: &dyn RewardsStore,
    user_id: &str,
) -> Result<CheckInOutcome> {
    check_in_at(store, user_id, Utc::now()).await
}

/// Perform the daily check-in as of `now`.
///
/// Streak, points, and the last-activity marker move in one guarded write.
/// A lost guard re-reads and re-decides, so losing a race against another
/// claim of the same day converges to the already-checked-in rejection
/// instead of paying twice.
pub async fn check_in_at(
    store: &dyn RewardsStore,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome> {
    for attempt in 1..=MAX_WRITE_CONFLICT_RETRIES {
        let profile = store
            .read_profile(user_id)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;

        let decision = rules::evaluate(profile.updated_at, now);
        if decision == StreakDecision::AlreadyCheckedIn {
            debug!(
                "Check-in rejected for {}: already claimed today (streak {})",
                user_id, profile.streak
            );
            return Ok(CheckInOutcome::already_checked_in(
                profile.streak,
                profile.total_points,
            ));
        }

        let new_streak = rules::next_streak(decision, profile.streak);
        let points_earned = rules::points_for_day(new_streak);
        let patch = ProfilePatch {
            streak: Some(new_streak),
            total_points: Some(profile.total_points + points_earned),
            updated_at: Some(now),
        };

        match store
            .write_profile_guarded(user_id, profile.total_points, &patch)
            .await?
        {
            Some(updated) => {
                info!(
                    "Check-in recorded for {}: day {}, +{} points",
                    user_id, new_streak, points_earned
                );
                return Ok(CheckInOutcome {
                    success: true,
                    points_earned,
                    new_streak,
                    total_points: updated.total_points,
                    message: None,
                });
            }
            None => {
                warn!(
                    "Check-in write for {} lost its guard (attempt {}), re-reading",
                    user_id, attempt
                );
            }
        }
    }

    Err(Error::ApiError(
        "check-in kept losing write conflicts".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{profile, store_with_profile, ContendedStore};
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_check_in_starts_streak() {
        let store = store_with_profile(&profile("user-1", 0, 0, None)).await;

        let outcome = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_streak, 1);
        assert_eq!(outcome.points_earned, 100);
        assert_eq!(outcome.total_points, 100);
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn test_consecutive_day_grows_streak() {
        let yesterday = noon(2025, 3, 9);
        let store = store_with_profile(&profile("user-1", 1000, 5, Some(yesterday))).await;

        let outcome = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_streak, 6);
        assert_eq!(outcome.points_earned, 600);
        assert_eq!(outcome.total_points, 1600);

        let stored = store.read_profile("user-1").await.unwrap().unwrap();
        assert_eq!(stored.streak, 6);
        assert_eq!(stored.total_points, 1600);
        assert_eq!(stored.updated_at, Some(noon(2025, 3, 10)));
    }

    #[tokio::test]
    async fn test_second_claim_same_day_is_rejected() {
        let store = store_with_profile(&profile("user-1", 1000, 5, Some(noon(2025, 3, 9)))).await;

        let first = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap();
        assert!(first.success);

        let evening = Utc.with_ymd_and_hms(2025, 3, 10, 22, 15, 0).unwrap();
        let second = check_in_at(&store, "user-1", evening).await.unwrap();
        assert!(!second.success);
        assert_eq!(second.points_earned, 0);
        assert_eq!(second.new_streak, 6);
        assert_eq!(second.total_points, 1600);
        assert_eq!(
            second.message.as_deref(),
            Some("Already checked in today. Your streak is 6.")
        );
    }

    #[tokio::test]
    async fn test_gap_resets_streak_to_one() {
        let store = store_with_profile(&profile("user-1", 900, 9, Some(noon(2025, 3, 6)))).await;

        let outcome = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_streak, 1);
        assert_eq!(outcome.points_earned, 100);
        assert_eq!(outcome.total_points, 1000);
    }

    #[tokio::test]
    async fn test_missing_profile_is_an_error() {
        let store = store_with_profile(&profile("someone-else", 0, 0, None)).await;

        let err = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_lost_guard_retries_on_fresh_state() {
        let yesterday = noon(2025, 3, 9);
        let inner = store_with_profile(&profile("user-1", 1000, 5, Some(yesterday))).await;
        // 50 points vanish between the read and the write on the first try
        let store = ContendedStore::new(inner, 50);

        let outcome = check_in_at(&store, "user-1", noon(2025, 3, 10)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.new_streak, 6);
        assert_eq!(outcome.points_earned, 600);
        assert_eq!(outcome.total_points, 1550);
    }
}
