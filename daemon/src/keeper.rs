//! Streak keeper — background auto check-in loop
//!
//! Wakes periodically, skips while the locally tracked next-eligible time is
//! still in the future, otherwise performs the daily check-in through the
//! rewards engine. A successful claim reschedules to the next UTC midnight
//! and persists the claim counters; infrastructure failures back off before
//! the next try.

use crate::session;
use crate::state::AppState;
use flowva_persistence::sqlite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How often the keeper wakes to check eligibility (15 minutes)
const CHECK_INTERVAL_SECS: u64 = 900;

/// Back-off after a failed check-in attempt (seconds)
const RETRY_BACKOFF_SECS: i64 = 300; // 5 minutes

/// Settings keys for the persisted claim counters
const LAST_CLAIM_KEY: &str = "keeper_last_claim";
const TOTAL_CLAIMS_KEY: &str = "keeper_total_claims";

/// Claim tracking carried across ticks
struct ClaimState {
    /// Epoch seconds of the next eligible claim (our best local guess)
    next_eligible_epoch: i64,
    /// Total successful claims recorded by this daemon
    total_claims: u32,
    /// Last successful claim timestamp
    last_claim_epoch: i64,
    /// Whether we're currently in a back-off due to error
    backoff_until: i64,
}

// ─── Handle ──────────────────────────────────────────────────────────

/// Handle to stop the keeper task
#[derive(Clone)]
pub struct KeeperHandle {
    cancel: CancellationToken,
}

impl KeeperHandle {
    /// Stop the keeper task entirely
    pub fn stop(&self) {
        self.cancel.cancel();
        info!("Keeper stopped");
    }
}

// ─── Spawn ───────────────────────────────────────────────────────────

/// Spawn the keeper background task.
/// Returns a handle for stopping it.
pub fn spawn_keeper(state: AppState) -> KeeperHandle {
    let cancel = CancellationToken::new();
    let handle = KeeperHandle {
        cancel: cancel.clone(),
    };

    tokio::spawn(keeper_loop(state, cancel));

    handle
}

// ─── Loop ────────────────────────────────────────────────────────────

async fn keeper_loop(state: AppState, cancel: CancellationToken) {
    info!("Streak keeper loop started");

    let mut claim = load_claim_state(&state).await;
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(CHECK_INTERVAL_SECS));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Keeper cancelled, exiting");
                return;
            }
            _ = interval.tick() => {
                let now = chrono::Utc::now().timestamp();

                state.catalog_cache.cleanup();

                if now < claim.backoff_until {
                    debug!("Keeper in backoff for {}s more", claim.backoff_until - now);
                    continue;
                }

                // Skip if we know it's not time yet (with 30s tolerance)
                let secs_until = (claim.next_eligible_epoch - now).max(0);
                if secs_until > 30 {
                    debug!("Keeper: next claim in {}s", secs_until);
                    continue;
                }

                let session = match session::open(&state).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("Keeper: no usable session: {}", e);
                        claim.backoff_until = now + RETRY_BACKOFF_SECS;
                        continue;
                    }
                };

                match flowva_engine::perform_daily_check_in(&session.client, &session.user_id).await {
                    Ok(outcome) if outcome.success => {
                        claim.last_claim_epoch = now;
                        claim.total_claims += 1;
                        claim.next_eligible_epoch = next_utc_midnight_epoch(chrono::Utc::now());
                        claim.backoff_until = 0;

                        save_claim_state(&state, &claim).await;

                        info!(
                            "Keeper: checked in — day {}, +{} points (total claims: {})",
                            outcome.new_streak, outcome.points_earned, claim.total_claims
                        );
                    }
                    Ok(outcome) => {
                        // Already claimed today, possibly from another device
                        claim.next_eligible_epoch = next_utc_midnight_epoch(chrono::Utc::now());
                        claim.backoff_until = 0;
                        debug!(
                            "Keeper: {}",
                            outcome.message.unwrap_or_else(|| "already checked in".to_string())
                        );
                    }
                    Err(e) => {
                        error!("Keeper: check-in failed: {}", e);
                        claim.backoff_until = now + RETRY_BACKOFF_SECS;
                    }
                }
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Epoch seconds of the first UTC midnight after `now`
fn next_utc_midnight_epoch(now: chrono::DateTime<chrono::Utc>) -> i64 {
    match now
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        Some(midnight) => midnight.and_utc().timestamp(),
        None => now.timestamp() + 24 * 3600,
    }
}

/// Load the persisted claim counters from the settings table
async fn load_claim_state(state: &AppState) -> ClaimState {
    let mut claim = ClaimState {
        next_eligible_epoch: 0,
        total_claims: 0,
        last_claim_epoch: 0,
        backoff_until: 0,
    };

    let db_guard = state.db.read().await;
    let Some(db) = db_guard.as_ref() else {
        return claim;
    };

    if let Ok(Some(value)) = sqlite::get_setting(db.pool(), LAST_CLAIM_KEY).await {
        claim.last_claim_epoch = value.parse().unwrap_or(0);
        if claim.last_claim_epoch > 0 {
            // Rebuild the schedule from the last recorded claim
            if let Some(last) = chrono::DateTime::from_timestamp(claim.last_claim_epoch, 0) {
                claim.next_eligible_epoch = next_utc_midnight_epoch(last);
            }
        }
    }
    if let Ok(Some(value)) = sqlite::get_setting(db.pool(), TOTAL_CLAIMS_KEY).await {
        claim.total_claims = value.parse().unwrap_or(0);
    }

    claim
}

/// Persist the claim counters to the settings table
async fn save_claim_state(state: &AppState, claim: &ClaimState) {
    let db_guard = state.db.read().await;
    let Some(db) = db_guard.as_ref() else { return };
    let pool = db.pool();

    let _ = sqlite::set_setting(pool, LAST_CLAIM_KEY, &claim.last_claim_epoch.to_string()).await;
    let _ = sqlite::set_setting(pool, TOTAL_CLAIMS_KEY, &claim.total_claims.to_string()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_midnight_is_start_of_tomorrow() {
        let now = chrono::Utc.with_ymd_and_hms(2025, 3, 10, 18, 45, 12).unwrap();
        let midnight = next_utc_midnight_epoch(now);
        let expected = chrono::Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        assert_eq!(midnight, expected.timestamp());
    }

    #[test]
    fn test_next_midnight_crosses_year_end() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let midnight = next_utc_midnight_epoch(now);
        let expected = chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(midnight, expected.timestamp());
    }
}
