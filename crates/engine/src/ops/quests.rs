//! Quest completion.

use chrono::Utc;
use flowva_core::{Error, ProfilePatch, QuestCompletion, QuestStatus, Result, RewardsStore};
use tracing::{error, info, warn};

use super::MAX_WRITE_CONFLICT_RETRIES;

/// Record a quest completion and award its points.
///
/// The award is gated on the progress row actually transitioning to
/// completed, so calling this twice for the same quest pays once and
/// rejects the repeat. If the award write fails after the transition was
/// recorded, the error surfaces to the caller; the retry loop keeps that
/// window narrow.
pub async fn complete_quest(
    store: &dyn RewardsStore,
    user_id: &str,
    quest_id: &str,
    reward_amount: i64,
) -> Result<QuestCompletion> {
    if reward_amount <= 0 {
        return Err(Error::InvalidData(format!(
            "quest {} carries a non-positive reward of {}",
            quest_id, reward_amount
        )));
    }

    let transitioned = store
        .upsert_user_quest_status(user_id, quest_id, QuestStatus::Completed, Some(Utc::now()))
        .await?;
    if !transitioned {
        return Err(Error::QuestAlreadyCompleted(quest_id.to_string()));
    }

    info!(
        "Quest {} completed by {}, awarding {} points",
        quest_id, user_id, reward_amount
    );

    for attempt in 1..=MAX_WRITE_CONFLICT_RETRIES {
        let profile = store
            .read_profile(user_id)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;

        let patch = ProfilePatch {
            total_points: Some(profile.total_points + reward_amount),
            ..Default::default()
        };

        match store
            .write_profile_guarded(user_id, profile.total_points, &patch)
            .await?
        {
            Some(updated) => {
                return Ok(QuestCompletion {
                    quest_id: quest_id.to_string(),
                    points_awarded: reward_amount,
                    new_points: updated.total_points,
                });
            }
            None => {
                warn!(
                    "Quest award for {} lost its guard (attempt {}), re-reading",
                    user_id, attempt
                );
            }
        }
    }

    error!(
        "Quest {} recorded for {} but the award kept losing write conflicts",
        quest_id, user_id
    );
    Err(Error::ApiError(
        "quest award kept losing write conflicts".to_string(),
    ))
}
