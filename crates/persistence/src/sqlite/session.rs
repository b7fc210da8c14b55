//! Saved session operations (single sealed token)

use flowva_core::{Error, Result};
use sqlx::SqlitePool;

/// Saved session loaded from the database
#[derive(Debug)]
pub struct SavedSession {
    /// Sealed token blob as produced by the session cipher
    pub sealed_token: Vec<u8>,
    pub user_id: Option<String>,
}

/// Save the sealed session token, replacing any existing session
pub async fn save_session(
    pool: &SqlitePool,
    sealed_token: &[u8],
    user_id: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO session (id, sealed_token, user_id)
        VALUES (1, ?1, ?2)
        ON CONFLICT(id) DO UPDATE
        SET sealed_token = ?1, user_id = ?2, saved_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(sealed_token)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Load the saved session, if any
pub async fn get_session(pool: &SqlitePool) -> Result<Option<SavedSession>> {
    let row: Option<(Vec<u8>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT sealed_token, user_id
        FROM session
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(|(sealed_token, user_id)| SavedSession {
        sealed_token,
        user_id,
    }))
}

/// Delete the saved session
pub async fn clear_session(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM session WHERE id = 1")
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::SessionCipher;
    use crate::sqlite::Database;

    #[tokio::test]
    async fn test_session_roundtrip_and_replace() {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = SessionCipher::from_key(&[9u8; 32]);

        let first = cipher.seal("token-one").unwrap();
        save_session(db.pool(), &first, Some("u-1")).await.unwrap();

        let second = cipher.seal("token-two").unwrap();
        save_session(db.pool(), &second, Some("u-2")).await.unwrap();

        let saved = get_session(db.pool()).await.unwrap().unwrap();
        assert_eq!(saved.user_id.as_deref(), Some("u-2"));
        assert_eq!(cipher.open(&saved.sealed_token).unwrap(), "token-two");

        clear_session(db.pool()).await.unwrap();
        assert!(get_session(db.pool()).await.unwrap().is_none());
    }
}
