//! Reward redemption.

use flowva_core::{Error, ProfilePatch, Redemption, Result, RewardsStore};
use tracing::{info, warn};

use super::MAX_WRITE_CONFLICT_RETRIES;

/// Redeem a reward by subtracting its cost from the viewer's balance.
///
/// Affordability is checked against a fresh read on every attempt, so a
/// balance that shrinks mid-flight turns into the insufficient-points
/// rejection instead of a negative balance. Rejections write nothing.
pub async fn redeem_reward(
    store: &dyn RewardsStore,
    user_id: &str,
    reward_id: &str,
    cost: i64,
) -> Result<Redemption> {
    if cost <= 0 {
        return Err(Error::InvalidData(format!(
            "redeemable {} carries a non-positive cost of {}",
            reward_id, cost
        )));
    }

    for attempt in 1..=MAX_WRITE_CONFLICT_RETRIES {
        let profile = store
            .read_profile(user_id)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))?;

        if profile.total_points < cost {
            return Err(Error::InsufficientPoints {
                required: cost,
                available: profile.total_points,
            });
        }

        let patch = ProfilePatch {
            total_points: Some(profile.total_points - cost),
            ..Default::default()
        };

        match store
            .write_profile_guarded(user_id, profile.total_points, &patch)
            .await?
        {
            Some(updated) => {
                info!(
                    "Redeemed {} for {}: -{} points, {} left",
                    reward_id, user_id, cost, updated.total_points
                );
                return Ok(Redemption {
                    reward_id: reward_id.to_string(),
                    cost,
                    new_points: updated.total_points,
                });
            }
            None => {
                warn!(
                    "Redemption write for {} lost its guard (attempt {}), re-reading",
                    user_id, attempt
                );
            }
        }
    }

    Err(Error::ApiError(
        "redemption kept losing write conflicts".to_string(),
    ))
}
