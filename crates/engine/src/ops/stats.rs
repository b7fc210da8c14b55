//! Dashboard reads: user stats and the two catalogs.

use std::collections::HashMap;

use flowva_core::{Quest, QuestStatus, Redeemable, Result, RewardsStore, UserStats};
use tracing::{debug, warn};

/// Fetch the viewer's dashboard stats.
///
/// A missing profile row is the new-user case, not an error: stats come
/// back zeroed with the display name taken from the authenticated identity
/// when one is available.
pub async fn get_user_stats(store: &dyn RewardsStore, user_id: &str) -> Result<UserStats> {
    debug!("Fetching stats for user: {}", user_id);

    if let Some(profile) = store.read_profile(user_id).await? {
        return Ok(profile.into_user_stats(None));
    }

    debug!("No profile row for {}, synthesizing new-user stats", user_id);
    match store.read_authenticated_identity().await? {
        Some(identity) => Ok(identity.new_user_stats()),
        None => Ok(UserStats {
            total_points: 0,
            streak: 0,
            referrals: 0,
            rank: 1,
            full_name: "User".to_string(),
            avatar_url: None,
            last_check_in: None,
        }),
    }
}

/// Fetch the quest catalog joined with the viewer's progress.
///
/// A catalog failure fails the whole call. A progress-read failure only
/// degrades the view: every quest comes back available.
pub async fn list_quests(store: &dyn RewardsStore, user_id: &str) -> Result<Vec<Quest>> {
    let catalog = store.read_quest_catalog().await?;

    let statuses = match store.read_user_quest_statuses(user_id).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Quest progress read failed, listing all as available: {}", e);
            Vec::new()
        }
    };
    let status_by_quest: HashMap<String, QuestStatus> = statuses
        .into_iter()
        .map(|row| (row.quest_id, row.status))
        .collect();

    debug!("Joined {} quests against user progress", catalog.len());
    Ok(catalog
        .into_iter()
        .map(|row| {
            let status = status_by_quest.get(&row.id).copied();
            row.into_quest(status)
        })
        .collect())
}

/// Fetch the redeemables catalog with each entry's display status derived
/// from the viewer's balance.
///
/// A catalog failure fails the whole call. A missing profile or a failed
/// balance read degrades to a zero balance: rewards show locked, never
/// falsely unlocked.
pub async fn list_redeemables(store: &dyn RewardsStore, user_id: &str) -> Result<Vec<Redeemable>> {
    let catalog = store.read_redeemable_catalog().await?;
    let total_points = match store.read_profile(user_id).await {
        Ok(profile) => profile.map(|p| p.total_points).unwrap_or(0),
        Err(e) => {
            warn!("Balance read failed, listing rewards as locked: {}", e);
            0
        }
    };

    Ok(catalog
        .into_iter()
        .map(|row| row.into_redeemable(total_points))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        profile, quest_row, redeemable_row, store_with_profile, FlakyStore,
    };
    use chrono::{TimeZone, Utc};
    use flowva_core::{AuthIdentity, CatalogStatus, RedeemStatus};
    use flowva_persistence::{sqlite, LocalStore};

    #[tokio::test]
    async fn test_stats_for_existing_profile() {
        let last = Utc.with_ymd_and_hms(2025, 3, 9, 8, 0, 0).unwrap();
        let store = store_with_profile(&profile("user-1", 1500, 4, Some(last))).await;

        let stats = get_user_stats(&store, "user-1").await.unwrap();
        assert_eq!(stats.total_points, 1500);
        assert_eq!(stats.streak, 4);
        assert_eq!(stats.rank, 1);
        assert_eq!(stats.full_name, "Test User");
        assert_eq!(stats.last_check_in, Some(last));
    }

    #[tokio::test]
    async fn test_stats_for_new_user_fall_back_to_identity() {
        let identity = AuthIdentity {
            id: "user-2".to_string(),
            email: Some("ada@example.com".to_string()),
            full_name: None,
            avatar_url: None,
        };
        let store = LocalStore::open_in_memory(Some(identity)).await.unwrap();

        let stats = get_user_stats(&store, "user-2").await.unwrap();
        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.full_name, "ada");
        assert!(stats.last_check_in.is_none());
    }

    #[tokio::test]
    async fn test_stats_without_identity_use_placeholder_name() {
        let store = LocalStore::open_in_memory(None).await.unwrap();

        let stats = get_user_stats(&store, "user-3").await.unwrap();
        assert_eq!(stats.full_name, "User");
        assert_eq!(stats.rank, 1);
    }

    #[tokio::test]
    async fn test_quests_join_user_progress() {
        let store = LocalStore::open_in_memory(None).await.unwrap();
        let pool = store.database().pool();
        sqlite::upsert_quest(pool, &quest_row("q-follow", "Follow us", 250, "2025-01-01T00:00:00Z"))
            .await
            .unwrap();
        sqlite::upsert_quest(pool, &quest_row("q-refer", "Refer a friend", 500, "2025-01-02T00:00:00Z"))
            .await
            .unwrap();
        sqlite::upsert_user_quest_status(pool, "user-1", "q-follow", QuestStatus::Completed, None)
            .await
            .unwrap();

        let quests = list_quests(&store, "user-1").await.unwrap();
        assert_eq!(quests.len(), 2);
        assert_eq!(quests[0].id, "q-follow");
        assert_eq!(quests[0].status, QuestStatus::Completed);
        assert_eq!(quests[1].id, "q-refer");
        assert_eq!(quests[1].status, QuestStatus::Available);
    }

    #[tokio::test]
    async fn test_quest_progress_failure_degrades_to_available() {
        let inner = LocalStore::open_in_memory(None).await.unwrap();
        sqlite::upsert_quest(
            inner.database().pool(),
            &quest_row("q-follow", "Follow us", 250, "2025-01-01T00:00:00Z"),
        )
        .await
        .unwrap();
        let mut store = FlakyStore::new(inner);
        store.fail_quest_statuses = true;

        let quests = list_quests(&store, "user-1").await.unwrap();
        assert_eq!(quests.len(), 1);
        assert_eq!(quests[0].status, QuestStatus::Available);
    }

    #[tokio::test]
    async fn test_quest_catalog_failure_is_hard() {
        let inner = LocalStore::open_in_memory(None).await.unwrap();
        let mut store = FlakyStore::new(inner);
        store.fail_quest_catalog = true;

        assert!(list_quests(&store, "user-1").await.is_err());
    }

    #[tokio::test]
    async fn test_redeemables_derive_status_from_balance() {
        let store = store_with_profile(&profile("user-1", 500, 1, None)).await;
        let pool = store.database().pool();
        sqlite::upsert_redeemable(pool, &redeemable_row("r-small", "Sticker pack", 100))
            .await
            .unwrap();
        sqlite::upsert_redeemable(pool, &redeemable_row("r-exact", "Course access", 500))
            .await
            .unwrap();
        sqlite::upsert_redeemable(pool, &redeemable_row("r-big", "Conference ticket", 1000))
            .await
            .unwrap();
        let mut coming = redeemable_row("r-soon", "Mystery box", 200);
        coming.status = CatalogStatus::Coming;
        sqlite::upsert_redeemable(pool, &coming).await.unwrap();

        let redeemables = list_redeemables(&store, "user-1").await.unwrap();
        let ids: Vec<&str> = redeemables.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-small", "r-soon", "r-exact", "r-big"]);

        assert_eq!(redeemables[0].status, RedeemStatus::Unlocked);
        assert_eq!(redeemables[1].status, RedeemStatus::Coming);
        assert_eq!(redeemables[2].status, RedeemStatus::Unlocked);
        assert_eq!(redeemables[3].status, RedeemStatus::Locked);
    }

    #[tokio::test]
    async fn test_redeemables_for_missing_profile_read_as_zero_balance() {
        let store = LocalStore::open_in_memory(None).await.unwrap();
        sqlite::upsert_redeemable(
            store.database().pool(),
            &redeemable_row("r-small", "Sticker pack", 100),
        )
        .await
        .unwrap();

        let redeemables = list_redeemables(&store, "nobody").await.unwrap();
        assert_eq!(redeemables[0].status, RedeemStatus::Locked);
    }

    #[tokio::test]
    async fn test_redeemables_balance_failure_degrades_to_locked() {
        let inner = store_with_profile(&profile("user-1", 5000, 1, None)).await;
        sqlite::upsert_redeemable(
            inner.database().pool(),
            &redeemable_row("r-small", "Sticker pack", 100),
        )
        .await
        .unwrap();
        let mut store = FlakyStore::new(inner);
        store.fail_profile_reads = true;

        let redeemables = list_redeemables(&store, "user-1").await.unwrap();
        assert_eq!(redeemables[0].status, RedeemStatus::Locked);
    }
}
