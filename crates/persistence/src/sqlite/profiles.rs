//! Profile row operations for the local mirror

use chrono::{DateTime, Utc};
use flowva_core::{Error, ProfilePatch, ProfileRow, Result};
use sqlx::SqlitePool;

/// Database row for a profile
#[derive(Debug, sqlx::FromRow)]
struct ProfileRecord {
    id: String,
    streak: i64,
    total_points: i64,
    referrals: i64,
    full_name: Option<String>,
    avatar_url: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProfileRecord> for ProfileRow {
    fn from(row: ProfileRecord) -> Self {
        ProfileRow {
            id: row.id,
            streak: row.streak.max(0) as u32,
            total_points: row.total_points,
            referrals: row.referrals.max(0) as u32,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            updated_at: row.updated_at,
        }
    }
}

/// Insert a full profile row (seeding and tests)
pub async fn create_profile(pool: &SqlitePool, profile: &ProfileRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, streak, total_points, referrals, full_name, avatar_url, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.id)
    .bind(profile.streak)
    .bind(profile.total_points)
    .bind(profile.referrals)
    .bind(&profile.full_name)
    .bind(&profile.avatar_url)
    .bind(profile.updated_at)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Get a profile row by user id
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<ProfileRow>> {
    let row: Option<ProfileRecord> = sqlx::query_as(
        r#"
        SELECT id, streak, total_points, referrals, full_name, avatar_url, updated_at
        FROM profiles
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(ProfileRow::from))
}

/// Apply a sparse patch to a profile row.
///
/// Returns the updated row, or `None` when no row matched.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    patch: &ProfilePatch,
) -> Result<Option<ProfileRow>> {
    let affected = run_patch(pool, user_id, None, patch).await?;
    if affected == 0 {
        return Ok(None);
    }
    get_profile(pool, user_id).await
}

/// Apply a sparse patch only while `total_points` still equals
/// `expected_points`.
///
/// Returns the updated row, or `None` when the row is missing or the guard
/// failed. Callers that need to tell those apart re-read the row.
pub async fn update_profile_guarded(
    pool: &SqlitePool,
    user_id: &str,
    expected_points: i64,
    patch: &ProfilePatch,
) -> Result<Option<ProfileRow>> {
    let affected = run_patch(pool, user_id, Some(expected_points), patch).await?;
    if affected == 0 {
        return Ok(None);
    }
    get_profile(pool, user_id).await
}

/// Build and execute the UPDATE for the fields present in the patch
async fn run_patch(
    pool: &SqlitePool,
    user_id: &str,
    expected_points: Option<i64>,
    patch: &ProfilePatch,
) -> Result<u64> {
    let mut sets = Vec::new();
    if patch.streak.is_some() {
        sets.push("streak = ?");
    }
    if patch.total_points.is_some() {
        sets.push("total_points = ?");
    }
    if patch.updated_at.is_some() {
        sets.push("updated_at = ?");
    }
    if sets.is_empty() {
        return Err(Error::InvalidData("empty profile patch".to_string()));
    }

    let mut query = format!("UPDATE profiles SET {} WHERE id = ?", sets.join(", "));
    if expected_points.is_some() {
        query.push_str(" AND total_points = ?");
    }

    let mut builder = sqlx::query(&query);
    if let Some(streak) = patch.streak {
        builder = builder.bind(streak);
    }
    if let Some(points) = patch.total_points {
        builder = builder.bind(points);
    }
    if let Some(ts) = patch.updated_at {
        builder = builder.bind(ts);
    }
    builder = builder.bind(user_id);
    if let Some(expected) = expected_points {
        builder = builder.bind(expected);
    }

    let result = builder
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;

    fn profile(id: &str, points: i64, streak: u32) -> ProfileRow {
        ProfileRow {
            id: id.to_string(),
            streak,
            total_points: points,
            referrals: 0,
            full_name: Some("Ada".to_string()),
            avatar_url: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_patch_updates_only_present_fields() {
        let db = Database::connect_in_memory().await.unwrap();
        create_profile(db.pool(), &profile("u-1", 500, 3)).await.unwrap();

        let patch = ProfilePatch {
            total_points: Some(750),
            ..Default::default()
        };
        let updated = update_profile(db.pool(), "u-1", &patch).await.unwrap().unwrap();

        assert_eq!(updated.total_points, 750);
        assert_eq!(updated.streak, 3);
        assert!(updated.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_patch_on_missing_row_matches_nothing() {
        let db = Database::connect_in_memory().await.unwrap();

        let patch = ProfilePatch {
            total_points: Some(100),
            ..Default::default()
        };
        let updated = update_profile(db.pool(), "ghost", &patch).await.unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_guarded_patch_rejects_stale_expectation() {
        let db = Database::connect_in_memory().await.unwrap();
        create_profile(db.pool(), &profile("u-1", 500, 3)).await.unwrap();

        let patch = ProfilePatch {
            total_points: Some(400),
            ..Default::default()
        };

        // Guard built from a stale read
        let stale = update_profile_guarded(db.pool(), "u-1", 450, &patch).await.unwrap();
        assert!(stale.is_none());

        let fresh = update_profile_guarded(db.pool(), "u-1", 500, &patch).await.unwrap();
        assert_eq!(fresh.unwrap().total_points, 400);
    }
}
