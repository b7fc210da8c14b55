//! Quest catalog and per-user progress operations

use chrono::{DateTime, Utc};
use flowva_core::{Error, QuestCategory, QuestRow, QuestStatus, Result, UserQuestRow};
use sqlx::SqlitePool;

/// Database row for a catalog quest
#[derive(Debug, sqlx::FromRow)]
struct QuestRecord {
    id: String,
    title: String,
    description: String,
    reward_amount: i64,
    icon: Option<String>,
    category: String,
    action_label: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<QuestRecord> for QuestRow {
    fn from(row: QuestRecord) -> Self {
        let category = match row.category.as_str() {
            "Activity" => QuestCategory::Activity,
            "Special" => QuestCategory::Special,
            "On-chain" => QuestCategory::OnChain,
            _ => QuestCategory::Social,
        };
        QuestRow {
            id: row.id,
            title: row.title,
            description: row.description,
            reward_amount: row.reward_amount,
            icon: row.icon,
            category,
            action_label: row.action_label,
            created_at: row.created_at,
        }
    }
}

/// Insert or replace a catalog quest (seeding and tests)
pub async fn upsert_quest(pool: &SqlitePool, quest: &QuestRow) -> Result<()> {
    let category = match quest.category {
        QuestCategory::Social => "Social",
        QuestCategory::Activity => "Activity",
        QuestCategory::Special => "Special",
        QuestCategory::OnChain => "On-chain",
    };

    sqlx::query(
        r#"
        INSERT INTO rewards (id, title, description, reward_amount, icon, category, action_label, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, COALESCE(?8, CURRENT_TIMESTAMP))
        ON CONFLICT(id) DO UPDATE
        SET title = ?2, description = ?3, reward_amount = ?4, icon = ?5, category = ?6, action_label = ?7
        "#,
    )
    .bind(&quest.id)
    .bind(&quest.title)
    .bind(&quest.description)
    .bind(quest.reward_amount)
    .bind(&quest.icon)
    .bind(category)
    .bind(&quest.action_label)
    .bind(quest.created_at)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// List the quest catalog in creation order
pub async fn list_quests(pool: &SqlitePool) -> Result<Vec<QuestRow>> {
    let rows: Vec<QuestRecord> = sqlx::query_as(
        r#"
        SELECT id, title, description, reward_amount, icon, category, action_label, created_at
        FROM rewards
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows.into_iter().map(QuestRow::from).collect())
}

/// Get the viewer's quest progress rows
pub async fn get_user_quest_statuses(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<UserQuestRow>> {
    let rows: Vec<(String, String, Option<DateTime<Utc>>)> = sqlx::query_as(
        r#"
        SELECT quest_id, status, completed_at
        FROM user_quests
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    rows.into_iter()
        .map(|(quest_id, status, completed_at)| {
            Ok(UserQuestRow {
                quest_id,
                status: status.parse()?,
                completed_at,
            })
        })
        .collect()
}

/// Insert or update a `(user, quest)` progress row.
///
/// Rows already at `COMPLETED` or `CLAIMED` are left untouched; the return
/// value reports whether the stored status actually transitioned.
pub async fn upsert_user_quest_status(
    pool: &SqlitePool,
    user_id: &str,
    quest_id: &str,
    status: QuestStatus,
    completed_at: Option<DateTime<Utc>>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_quests (user_id, quest_id, status, completed_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id, quest_id) DO UPDATE
        SET status = ?3, completed_at = ?4
        WHERE user_quests.status NOT IN ('COMPLETED', 'CLAIMED')
        "#,
    )
    .bind(user_id)
    .bind(quest_id)
    .bind(status.as_str())
    .bind(completed_at)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}
