//! Redeemable catalog operations

use flowva_core::{CatalogStatus, Error, RedeemableRow, Result};
use sqlx::SqlitePool;

/// Database row for a redeemable
#[derive(Debug, sqlx::FromRow)]
struct RedeemableRecord {
    id: String,
    title: String,
    description: String,
    cost: i64,
    icon: Option<String>,
    color_class: Option<String>,
    status: String,
}

impl From<RedeemableRecord> for RedeemableRow {
    fn from(row: RedeemableRecord) -> Self {
        let status = if row.status == "coming" {
            CatalogStatus::Coming
        } else {
            CatalogStatus::Available
        };
        RedeemableRow {
            id: row.id,
            title: row.title,
            description: row.description,
            cost: row.cost,
            icon: row.icon,
            color_class: row.color_class,
            status,
        }
    }
}

/// Insert or replace a catalog redeemable (seeding and tests)
pub async fn upsert_redeemable(pool: &SqlitePool, reward: &RedeemableRow) -> Result<()> {
    let status = match reward.status {
        CatalogStatus::Available => "available",
        CatalogStatus::Coming => "coming",
    };

    sqlx::query(
        r#"
        INSERT INTO redeemables (id, title, description, cost, icon, color_class, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE
        SET title = ?2, description = ?3, cost = ?4, icon = ?5, color_class = ?6, status = ?7
        "#,
    )
    .bind(&reward.id)
    .bind(&reward.title)
    .bind(&reward.description)
    .bind(reward.cost)
    .bind(&reward.icon)
    .bind(&reward.color_class)
    .bind(status)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// List the redeemables catalog ordered by ascending cost
pub async fn list_redeemables(pool: &SqlitePool) -> Result<Vec<RedeemableRow>> {
    let rows: Vec<RedeemableRecord> = sqlx::query_as(
        r#"
        SELECT id, title, description, cost, icon, color_class, status
        FROM redeemables
        ORDER BY cost ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows.into_iter().map(RedeemableRow::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;

    fn reward(id: &str, cost: i64, status: CatalogStatus) -> RedeemableRow {
        RedeemableRow {
            id: id.to_string(),
            title: "Amazon gift card".to_string(),
            description: String::new(),
            cost,
            icon: None,
            color_class: None,
            status,
        }
    }

    #[tokio::test]
    async fn test_catalog_is_ordered_by_cost() {
        let db = Database::connect_in_memory().await.unwrap();

        upsert_redeemable(db.pool(), &reward("r-big", 5000, CatalogStatus::Available))
            .await
            .unwrap();
        upsert_redeemable(db.pool(), &reward("r-small", 500, CatalogStatus::Coming))
            .await
            .unwrap();

        let rewards = list_redeemables(db.pool()).await.unwrap();
        assert_eq!(rewards[0].id, "r-small");
        assert_eq!(rewards[0].status, CatalogStatus::Coming);
        assert_eq!(rewards[1].id, "r-big");
    }
}
