//! Profile models: the per-user rewards record and its projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// Row shape of the `profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default, deserialize_with = "wire::deserialize_u32_lenient")]
    pub streak: u32,
    #[serde(default, deserialize_with = "wire::deserialize_i64_lenient")]
    pub total_points: i64,
    #[serde(default, deserialize_with = "wire::deserialize_u32_lenient")]
    pub referrals: u32,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Doubles as the last check-in marker; written only by the daily check-in
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sparse update payload for the `profiles` table.
///
/// Only the fields that are `Some` are written. Point-only mutations must
/// leave `updated_at` unset so they cannot mask the last check-in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregated stats for the dashboard header (internal representation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_points: i64,
    pub streak: u32,
    pub referrals: u32,
    /// Leaderboard rank; fixed at 1 until ranking ships
    pub rank: u32,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub last_check_in: Option<DateTime<Utc>>,
}

impl ProfileRow {
    /// Convert to UserStats, borrowing the identity for missing name fields
    pub fn into_user_stats(self, identity: Option<&AuthIdentity>) -> UserStats {
        let full_name = match self.full_name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => identity.map(AuthIdentity::display_name).unwrap_or_else(|| "User".to_string()),
        };
        UserStats {
            // Stored balances can predate the guarded writes; never show below zero
            total_points: self.total_points.max(0),
            streak: self.streak,
            referrals: self.referrals,
            rank: 1,
            full_name,
            avatar_url: self.avatar_url,
            last_check_in: self.updated_at,
        }
    }
}

/// Identity of the authenticated user (internal representation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthIdentity {
    /// Name shown for a user with no profile row yet: metadata name,
    /// then the email local part, then "User"
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(local) = self.email.as_deref().and_then(|e| e.split('@').next()) {
            if !local.is_empty() {
                return local.to_string();
            }
        }
        "User".to_string()
    }

    /// Zero-valued stats for a user whose profile row does not exist yet
    pub fn new_user_stats(&self) -> UserStats {
        UserStats {
            total_points: 0,
            streak: 0,
            referrals: 0,
            rank: 1,
            full_name: self.display_name(),
            avatar_url: self.avatar_url.clone(),
            last_check_in: None,
        }
    }
}

/// Response from the auth user endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata block attached to the auth user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthUserResponse {
    /// Convert to AuthIdentity for internal use
    pub fn into_identity(self) -> AuthIdentity {
        AuthIdentity {
            id: self.id,
            email: self.email,
            full_name: self.user_metadata.full_name,
            avatar_url: self.user_metadata.avatar_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: Option<&str>, full_name: Option<&str>) -> AuthIdentity {
        AuthIdentity {
            id: "u-1".to_string(),
            email: email.map(String::from),
            full_name: full_name.map(String::from),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name_prefers_metadata_name() {
        let id = identity(Some("ada@flowva.io"), Some("Ada Lovelace"));
        assert_eq!(id.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let id = identity(Some("ada@flowva.io"), None);
        assert_eq!(id.display_name(), "ada");
    }

    #[test]
    fn test_display_name_last_resort_is_user() {
        assert_eq!(identity(None, None).display_name(), "User");
        assert_eq!(identity(Some(""), Some("")).display_name(), "User");
    }

    #[test]
    fn test_stats_clamp_negative_balance_to_zero() {
        let row = ProfileRow {
            id: "u-1".to_string(),
            streak: 2,
            total_points: -250,
            referrals: 0,
            full_name: Some("Ada".to_string()),
            avatar_url: None,
            updated_at: None,
        };
        let stats = row.into_user_stats(None);
        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.streak, 2);
    }
}
