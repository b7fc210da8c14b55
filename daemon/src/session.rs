//! Saved session and backend configuration
//!
//! The access token lives in the local database encrypted under the
//! machine-bound key. `FLOWVA_ACCESS_TOKEN` overrides the saved token;
//! `FLOWVA_SUPABASE_URL` / `FLOWVA_SUPABASE_ANON_KEY` override the saved
//! backend endpoint.

use crate::state::AppState;
use flowva_networking::FlowvaClient;
use flowva_persistence::sqlite;
use tracing::debug;

/// Environment override for the access token
pub const ACCESS_TOKEN_ENV: &str = "FLOWVA_ACCESS_TOKEN";
/// Environment override for the backend project URL
pub const BACKEND_URL_ENV: &str = "FLOWVA_SUPABASE_URL";
/// Environment override for the publishable API key
pub const ANON_KEY_ENV: &str = "FLOWVA_SUPABASE_ANON_KEY";

const BACKEND_URL_SETTING: &str = "backend_url";
const ANON_KEY_SETTING: &str = "backend_anon_key";

/// Where the backend lives and how to talk to it
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

/// A ready-to-use client bound to the signed-in user
pub struct ActiveSession {
    pub client: FlowvaClient,
    pub user_id: String,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve the backend endpoint: environment first, then the settings table.
pub async fn resolve_backend_config(state: &AppState) -> Result<BackendConfig, String> {
    if let (Some(url), Some(anon_key)) =
        (env_non_empty(BACKEND_URL_ENV), env_non_empty(ANON_KEY_ENV))
    {
        return Ok(BackendConfig { url, anon_key });
    }

    let db_guard = state.db.read().await;
    let db = db_guard.as_ref().ok_or("Database not initialized")?;
    let url = sqlite::get_setting(db.pool(), BACKEND_URL_SETTING)
        .await
        .map_err(|e| e.to_string())?;
    let anon_key = sqlite::get_setting(db.pool(), ANON_KEY_SETTING)
        .await
        .map_err(|e| e.to_string())?;

    match (url, anon_key) {
        (Some(url), Some(anon_key)) => Ok(BackendConfig { url, anon_key }),
        _ => Err(format!(
            "Backend not configured — set {} and {} and run `login` once",
            BACKEND_URL_ENV, ANON_KEY_ENV
        )),
    }
}

/// Persist the backend endpoint so later runs work without the env vars
pub async fn save_backend_config(state: &AppState, config: &BackendConfig) {
    let db_guard = state.db.read().await;
    let Some(db) = db_guard.as_ref() else { return };
    let _ = sqlite::set_setting(db.pool(), BACKEND_URL_SETTING, &config.url).await;
    let _ = sqlite::set_setting(db.pool(), ANON_KEY_SETTING, &config.anon_key).await;
}

/// Seal and save the session token
pub async fn store(state: &AppState, token: &str, user_id: &str) -> Result<(), String> {
    let sealed = state.cipher.seal(token).map_err(|e| e.to_string())?;

    let db_guard = state.db.read().await;
    let db = db_guard.as_ref().ok_or("Database not initialized")?;
    sqlite::save_session(db.pool(), &sealed, Some(user_id))
        .await
        .map_err(|e| e.to_string())
}

/// Drop the saved session
pub async fn clear(state: &AppState) -> Result<(), String> {
    let db_guard = state.db.read().await;
    let db = db_guard.as_ref().ok_or("Database not initialized")?;
    sqlite::clear_session(db.pool())
        .await
        .map_err(|e| e.to_string())
}

/// Open a client session: env token override first, then the saved session.
pub async fn open(state: &AppState) -> Result<ActiveSession, String> {
    let config = resolve_backend_config(state).await?;

    if let Some(token) = env_non_empty(ACCESS_TOKEN_ENV) {
        debug!("Using access token from {}", ACCESS_TOKEN_ENV);
        let client = FlowvaClient::new_with_cache(
            &config.url,
            &config.anon_key,
            &token,
            state.catalog_cache.clone(),
        );
        let identity = client.verify_auth().await.map_err(|e| e.to_string())?;
        return Ok(ActiveSession {
            client,
            user_id: identity.id,
        });
    }

    let saved = {
        let db_guard = state.db.read().await;
        let db = db_guard.as_ref().ok_or("Database not initialized")?;
        sqlite::get_session(db.pool())
            .await
            .map_err(|e| e.to_string())?
    };
    let Some(saved) = saved else {
        return Err("Not logged in — run `flowva-daemon login <access-token>` first".to_string());
    };

    let token = state
        .cipher
        .open(&saved.sealed_token)
        .map_err(|e| e.to_string())?;
    let client = FlowvaClient::new_with_cache(
        &config.url,
        &config.anon_key,
        &token,
        state.catalog_cache.clone(),
    );

    // A session saved without a user id resolves it from the auth endpoint
    let user_id = match saved.user_id {
        Some(id) => id,
        None => client.verify_auth().await.map_err(|e| e.to_string())?.id,
    };

    Ok(ActiveSession { client, user_id })
}
