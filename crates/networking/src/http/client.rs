//! Flowva HTTP client with bearer-token authentication

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowva_core::{
    AuthIdentity, AuthUserResponse, Error, ProfilePatch, ProfileRow, QuestRow, QuestStatus,
    RedeemableRow, Result, RewardsStore, UserQuestRow,
};
use flowva_persistence::cache::CatalogCache;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, Response,
};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Quest catalog table name in the hosted schema
const QUEST_TABLE: &str = "rewards";

/// Redeemables catalog table name in the hosted schema
const REDEEMABLE_TABLE: &str = "redeemables";

/// HTTP client for the hosted rewards backend.
///
/// Speaks PostgREST conventions against the row tables plus the auth user
/// endpoint, authenticating every request with the project API key and the
/// user's bearer token. Optionally uses an in-memory cache for the static
/// catalogs to reduce API calls.
pub struct FlowvaClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: String,
    /// Optional shared catalog cache (shared across all clients)
    cache: Option<Arc<CatalogCache>>,
}

impl FlowvaClient {
    /// Create a new client for the given backend project
    ///
    /// # Arguments
    /// * `base_url` - Project base URL, without a trailing slash
    /// * `anon_key` - The project's publishable API key
    /// * `access_token` - The signed-in user's bearer token
    pub fn new(base_url: &str, anon_key: &str, access_token: &str) -> Self {
        let http = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: access_token.to_string(),
            cache: None,
        }
    }

    /// Create a new client with a shared catalog cache
    pub fn new_with_cache(
        base_url: &str,
        anon_key: &str,
        access_token: &str,
        cache: Arc<CatalogCache>,
    ) -> Self {
        let mut client = Self::new(base_url, anon_key, access_token);
        client.cache = Some(cache);
        client
    }

    /// Get default headers for requests
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.access_token)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    /// Build a row-store URL for the given table and filter string
    fn rest_url(&self, table: &str, filters: &str) -> String {
        format!("{}/rest/v1/{}?{}", self.base_url, table, filters)
    }

    /// Check if response indicates authentication failure
    fn check_auth_error(response: &Response) -> Option<Error> {
        match response.status().as_u16() {
            401 => Some(Error::TokenExpired),
            403 => Some(Error::AuthenticationError("Access forbidden".to_string())),
            _ => None,
        }
    }

    /// Verify the bearer token by fetching the auth user
    #[instrument(skip(self))]
    pub async fn verify_auth(&self) -> Result<AuthIdentity> {
        debug!("Verifying authentication via /auth/v1/user");

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Auth user request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let user: AuthUserResponse = response.json().await.map_err(|e| {
            error!("Failed to parse auth user response: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        let identity = user.into_identity();
        debug!("Session verified for user: {}", identity.id);
        Ok(identity)
    }

    /// Run a PATCH against a filtered row set, returning the updated rows
    async fn patch_rows<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<T>> {
        let response = self
            .http
            .patch(url)
            .headers(self.default_headers())
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Row update failed: HTTP {} — {}", status, body);
            return Err(Error::ApiError(format!("HTTP {}: {}", status, body)));
        }

        response.json().await.map_err(|e| {
            error!("Failed to parse updated rows: {}", e);
            Error::InvalidData(e.to_string())
        })
    }
}

#[async_trait]
impl RewardsStore for FlowvaClient {
    /// Fetch the viewer's profile row; absent rows are `None`, not an error
    #[instrument(skip(self))]
    async fn read_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        let url = self.rest_url("profiles", &format!("id=eq.{}&select=*", user_id));

        debug!("Fetching profile from: {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Profile request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let rows: Vec<ProfileRow> = response.json().await.map_err(|e| {
            error!("Failed to parse profile rows: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        Ok(rows.into_iter().next())
    }

    /// Apply a sparse profile update and return the row the backend wrote
    #[instrument(skip(self, patch))]
    async fn write_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<ProfileRow> {
        let url = self.rest_url("profiles", &format!("id=eq.{}", user_id));
        let body = serde_json::to_value(patch)?;

        let rows: Vec<ProfileRow> = self.patch_rows(&url, &body).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::ProfileNotFound(user_id.to_string()))
    }

    /// Conditional profile update: the filter only matches while
    /// `total_points` is unchanged, so an empty result set means a
    /// concurrent writer won
    #[instrument(skip(self, patch))]
    async fn write_profile_guarded(
        &self,
        user_id: &str,
        expected_points: i64,
        patch: &ProfilePatch,
    ) -> Result<Option<ProfileRow>> {
        let url = self.rest_url(
            "profiles",
            &format!("id=eq.{}&total_points=eq.{}", user_id, expected_points),
        );
        let body = serde_json::to_value(patch)?;

        let rows: Vec<ProfileRow> = self.patch_rows(&url, &body).await?;
        if rows.is_empty() {
            debug!("Guarded update matched nothing (expected {} points)", expected_points);
        }
        Ok(rows.into_iter().next())
    }

    /// Get the quest catalog in creation order (cache-aware)
    #[instrument(skip(self))]
    async fn read_quest_catalog(&self) -> Result<Vec<QuestRow>> {
        // Check cache first
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get_quests() {
                debug!("Cache hit for quest catalog");
                return Ok(cached);
            }
        }

        let url = self.rest_url(QUEST_TABLE, "select=*&order=created_at.asc");

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Quest catalog request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let quests: Vec<QuestRow> = response.json().await.map_err(|e| {
            error!("Failed to parse quest catalog: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Quest catalog fetched: {} quests", quests.len());

        // Store in cache
        if let Some(ref cache) = self.cache {
            cache.put_quests(quests.clone());
        }

        Ok(quests)
    }

    /// Get the viewer's quest progress rows
    #[instrument(skip(self))]
    async fn read_user_quest_statuses(&self, user_id: &str) -> Result<Vec<UserQuestRow>> {
        let url = self.rest_url(
            "user_quests",
            &format!("user_id=eq.{}&select=quest_id,status,completed_at", user_id),
        );

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Quest status request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let statuses: Vec<UserQuestRow> = response.json().await.map_err(|e| {
            error!("Failed to parse quest statuses: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Fetched {} quest status rows", statuses.len());
        Ok(statuses)
    }

    /// Insert or update a progress row without clobbering terminal states.
    ///
    /// Runs as two legs so the transition report stays race-safe without a
    /// transaction: a filtered PATCH that only matches open rows, then an
    /// insert with duplicates ignored. A non-empty result set from either
    /// leg is the transition; two empty result sets mean the row was
    /// already terminal.
    #[instrument(skip(self))]
    async fn upsert_user_quest_status(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let patch_url = self.rest_url(
            "user_quests",
            &format!(
                "user_id=eq.{}&quest_id=eq.{}&status=in.(AVAILABLE,IN_PROGRESS)",
                user_id, quest_id
            ),
        );
        let patch_body = serde_json::json!({
            "status": status,
            "completed_at": completed_at,
        });

        let updated: Vec<UserQuestRow> = self.patch_rows(&patch_url, &patch_body).await?;
        if !updated.is_empty() {
            debug!("Quest {} transitioned to {:?}", quest_id, status);
            return Ok(true);
        }

        // No open row matched: either the row does not exist yet, or it is
        // already terminal. An ignored-duplicates insert settles which.
        let insert_url = self.rest_url("user_quests", "on_conflict=user_id,quest_id");
        let insert_body = serde_json::json!({
            "user_id": user_id,
            "quest_id": quest_id,
            "status": status,
            "completed_at": completed_at,
        });

        let response = self
            .http
            .post(&insert_url)
            .headers(self.default_headers())
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(&insert_body)
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let status_code = response.status();
        if status_code.is_client_error() || status_code.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            error!("Progress insert failed: HTTP {} — {}", status_code, body);
            return Err(Error::ApiError(format!("HTTP {}: {}", status_code, body)));
        }

        let inserted: Vec<UserQuestRow> = response.json().await.map_err(|e| {
            error!("Failed to parse inserted progress row: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        if inserted.is_empty() {
            debug!("Quest {} already recorded, no transition", quest_id);
            return Ok(false);
        }
        Ok(true)
    }

    /// Get the redeemables catalog ordered by ascending cost (cache-aware)
    #[instrument(skip(self))]
    async fn read_redeemable_catalog(&self) -> Result<Vec<RedeemableRow>> {
        // Check cache first
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get_redeemables() {
                debug!("Cache hit for redeemables catalog");
                return Ok(cached);
            }
        }

        let url = self.rest_url(REDEEMABLE_TABLE, "select=*&order=cost.asc");

        let response = self
            .http
            .get(&url)
            .headers(self.default_headers())
            .send()
            .await?;

        if let Some(err) = Self::check_auth_error(&response) {
            return Err(err);
        }

        let response = response.error_for_status().map_err(|e| {
            error!("Redeemables request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let rewards: Vec<RedeemableRow> = response.json().await.map_err(|e| {
            error!("Failed to parse redeemables: {}", e);
            Error::InvalidData(e.to_string())
        })?;

        debug!("Redeemables catalog fetched: {} rewards", rewards.len());

        // Store in cache
        if let Some(ref cache) = self.cache {
            cache.put_redeemables(rewards.clone());
        }

        Ok(rewards)
    }

    /// Get the authenticated user, mapping an expired token to anonymous
    #[instrument(skip(self))]
    async fn read_authenticated_identity(&self) -> Result<Option<AuthIdentity>> {
        match self.verify_auth().await {
            Ok(identity) => Ok(Some(identity)),
            Err(Error::TokenExpired) => {
                warn!("Bearer token no longer valid, treating as anonymous");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
