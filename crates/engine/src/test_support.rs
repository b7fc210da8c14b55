//! Shared fixtures and store doubles for the operation tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowva_core::{
    AuthIdentity, Error, ProfilePatch, ProfileRow, QuestRow, QuestStatus, RedeemableRow, Result,
    RewardsStore, UserQuestRow,
};
use flowva_persistence::{sqlite, LocalStore};
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) fn profile(
    user_id: &str,
    total_points: i64,
    streak: u32,
    updated_at: Option<DateTime<Utc>>,
) -> ProfileRow {
    ProfileRow {
        id: user_id.to_string(),
        streak,
        total_points,
        referrals: 0,
        full_name: Some("Test User".to_string()),
        avatar_url: None,
        updated_at,
    }
}

pub(crate) async fn store_with_profile(row: &ProfileRow) -> LocalStore {
    let store = LocalStore::open_in_memory(None)
        .await
        .expect("in-memory store");
    sqlite::create_profile(store.database().pool(), row)
        .await
        .expect("seed profile");
    store
}

pub(crate) fn quest_row(id: &str, title: &str, reward_amount: i64, created_at: &str) -> QuestRow {
    QuestRow {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        reward_amount,
        icon: None,
        category: Default::default(),
        action_label: None,
        created_at: Some(created_at.parse().expect("timestamp")),
    }
}

pub(crate) fn redeemable_row(id: &str, title: &str, cost: i64) -> RedeemableRow {
    RedeemableRow {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        cost,
        icon: None,
        color_class: None,
        status: Default::default(),
    }
}

/// Wraps a real store and slips one concurrent balance mutation in front of
/// the first guarded write, so that write loses its guard.
pub(crate) struct ContendedStore {
    inner: LocalStore,
    steal_points: i64,
    fired: AtomicBool,
}

impl ContendedStore {
    pub(crate) fn new(inner: LocalStore, steal_points: i64) -> Self {
        Self {
            inner,
            steal_points,
            fired: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RewardsStore for ContendedStore {
    async fn read_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.inner.read_profile(user_id).await
    }

    async fn write_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<ProfileRow> {
        self.inner.write_profile(user_id, patch).await
    }

    async fn write_profile_guarded(
        &self,
        user_id: &str,
        expected_points: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRow>> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let steal = ProfilePatch {
                total_points: Some(expected_points - self.steal_points),
                ..Default::default()
            };
            self.inner.write_profile(user_id, &steal).await?;
        }
        self.inner
            .write_profile_guarded(user_id, expected_points, patch)
            .await
    }

    async fn read_quest_catalog(&self) -> Result<Vec<QuestRow>> {
        self.inner.read_quest_catalog().await
    }

    async fn read_user_quest_statuses(&self, user_id: &str) -> Result<Vec<UserQuestRow>> {
        self.inner.read_user_quest_statuses(user_id).await
    }

    async fn upsert_user_quest_status(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.inner
            .upsert_user_quest_status(user_id, quest_id, status, completed_at)
            .await
    }

    async fn read_redeemable_catalog(&self) -> Result<Vec<RedeemableRow>> {
        self.inner.read_redeemable_catalog().await
    }

    async fn read_authenticated_identity(&self) -> Result<Option<AuthIdentity>> {
        self.inner.read_authenticated_identity().await
    }
}

/// Wraps a real store and fails selected reads with a network error.
pub(crate) struct FlakyStore {
    inner: LocalStore,
    pub(crate) fail_quest_catalog: bool,
    pub(crate) fail_quest_statuses: bool,
    pub(crate) fail_profile_reads: bool,
}

impl FlakyStore {
    pub(crate) fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            fail_quest_catalog: false,
            fail_quest_statuses: false,
            fail_profile_reads: false,
        }
    }
}

#[async_trait]
impl RewardsStore for FlakyStore {
    async fn read_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        if self.fail_profile_reads {
            return Err(Error::NetworkError("profile unreachable".to_string()));
        }
        self.inner.read_profile(user_id).await
    }

    async fn write_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<ProfileRow> {
        self.inner.write_profile(user_id, patch).await
    }

    async fn write_profile_guarded(
        &self,
        user_id: &str,
        expected_points: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRow>> {
        self.inner
            .write_profile_guarded(user_id, expected_points, patch)
            .await
    }

    async fn read_quest_catalog(&self) -> Result<Vec<QuestRow>> {
        if self.fail_quest_catalog {
            return Err(Error::NetworkError("quest catalog unreachable".to_string()));
        }
        self.inner.read_quest_catalog().await
    }

    async fn read_user_quest_statuses(&self, user_id: &str) -> Result<Vec<UserQuestRow>> {
        if self.fail_quest_statuses {
            return Err(Error::NetworkError("quest progress unreachable".to_string()));
        }
        self.inner.read_user_quest_statuses(user_id).await
    }

    async fn upsert_user_quest_status(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.inner
            .upsert_user_quest_status(user_id, quest_id, status, completed_at)
            .await
    }

    async fn read_redeemable_catalog(&self) -> Result<Vec<RedeemableRow>> {
        self.inner.read_redeemable_catalog().await
    }

    async fn read_authenticated_identity(&self) -> Result<Option<AuthIdentity>> {
        self.inner.read_authenticated_identity().await
    }
}
