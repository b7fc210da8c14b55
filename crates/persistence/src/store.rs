//! Local mirror implementation of the rewards store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowva_core::{
    AuthIdentity, Error, ProfilePatch, ProfileRow, QuestRow, QuestStatus, RedeemableRow, Result,
    RewardsStore, UserQuestRow,
};

use crate::sqlite::{self, Database};

/// Rewards store backed by the local SQLite mirror.
///
/// Serves the engine tests and offline runs. The identity is whoever the
/// store was opened for, set at construction.
pub struct LocalStore {
    db: Database,
    identity: Option<AuthIdentity>,
}

impl LocalStore {
    /// Wrap an already-connected database
    pub fn new(db: Database, identity: Option<AuthIdentity>) -> Self {
        Self { db, identity }
    }

    /// Open an in-memory store (for testing)
    pub async fn open_in_memory(identity: Option<AuthIdentity>) -> Result<Self> {
        let db = Database::connect_in_memory().await?;
        Ok(Self::new(db, identity))
    }

    /// Access the underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl RewardsStore for LocalStore {
    async fn read_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        sqlite::get_profile(self.db.pool(), user_id).await
    }

    async fn write_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<ProfileRow> {
        sqlite::update_profile(self.db.pool(), user_id, patch)
            .await?
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))
    }

    async fn write_profile_guarded(
        &self,
        user_id: &str,
        expected_points: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRow>> {
        let updated =
            sqlite::update_profile_guarded(self.db.pool(), user_id, expected_points, patch)
                .await?;
        if updated.is_some() {
            return Ok(updated);
        }

        // Nothing matched: distinguish a lost guard from a missing row
        if sqlite::get_profile(self.db.pool(), user_id).await?.is_none() {
            return Err(Error::ProfileNotFound(user_id.to_string()));
        }
        Ok(None)
    }

    async fn read_quest_catalog(&self) -> Result<Vec<QuestRow>> {
        sqlite::list_quests(self.db.pool()).await
    }

    async fn read_user_quest_statuses(&self, user_id: &str) -> Result<Vec<UserQuestRow>> {
        sqlite::get_user_quest_statuses(self.db.pool(), user_id).await
    }

    async fn upsert_user_quest_status(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        sqlite::upsert_user_quest_status(self.db.pool(), user_id, quest_id, status, completed_at)
            .await
    }

    async fn read_redeemable_catalog(&self) -> Result<Vec<RedeemableRow>> {
        sqlite::list_redeemables(self.db.pool()).await
    }

    async fn read_authenticated_identity(&self) -> Result<Option<AuthIdentity>> {
        Ok(self.identity.clone())
    }
}
