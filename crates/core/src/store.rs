//! Backend-agnostic interface to the rewards row store

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    AuthIdentity, ProfilePatch, ProfileRow, QuestRow, QuestStatus, RedeemableRow, UserQuestRow,
};

/// Operations the rewards engine needs from a row store.
///
/// Implemented by the hosted-backend client and by the local SQLite mirror.
#[async_trait]
pub trait RewardsStore: Send + Sync {
    /// Fetch a profile row; `Ok(None)` when the user has no row yet
    async fn read_profile(&self, user_id: &str) -> Result<Option<ProfileRow>>;

    /// Apply a sparse update and return the updated row
    async fn write_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<ProfileRow>;

    /// Apply a sparse update only while `total_points` still equals
    /// `expected_points`. `Ok(None)` means a concurrent writer got there
    /// first and nothing was written.
    async fn write_profile_guarded(
        &self,
        user_id: &str,
        expected_points: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRow>>;

    /// Quest catalog in creation order
    async fn read_quest_catalog(&self) -> Result<Vec<QuestRow>>;

    /// Per-user quest progress rows
    async fn read_user_quest_statuses(&self, user_id: &str) -> Result<Vec<UserQuestRow>>;

    /// Insert or update a `(user, quest)` progress row.
    ///
    /// Returns `true` when the stored status actually transitioned; `false`
    /// when the row was already `COMPLETED` or `CLAIMED`.
    async fn upsert_user_quest_status(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool>;

    /// Redeemables catalog ordered by ascending cost
    async fn read_redeemable_catalog(&self) -> Result<Vec<RedeemableRow>>;

    /// Identity of the authenticated user; `Ok(None)` when anonymous
    async fn read_authenticated_identity(&self) -> Result<Option<AuthIdentity>>;
}
