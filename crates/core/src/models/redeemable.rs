//! Redeemable reward catalog models

use serde::{Deserialize, Serialize};

use super::wire;

/// Availability state carried on the catalog row itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    Available,
    Coming,
}

/// Row shape of the `redeemables` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemableRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "wire::deserialize_i64_lenient")]
    pub cost: i64,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color_class: Option<String>,
    #[serde(default, deserialize_with = "wire::deserialize_or_default")]
    pub status: CatalogStatus,
}

/// Display state of a redeemable for a given point balance.
///
/// Derived on read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeemStatus {
    Unlocked,
    Locked,
    Coming,
}

/// Catalog row joined with the viewer's point balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redeemable {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cost: i64,
    pub icon: Option<String>,
    pub color_class: Option<String>,
    pub status: RedeemStatus,
}

impl RedeemableRow {
    /// Join with the viewer's balance; `coming` rows stay coming regardless
    /// of points
    pub fn into_redeemable(self, total_points: i64) -> Redeemable {
        let status = match self.status {
            CatalogStatus::Coming => RedeemStatus::Coming,
            CatalogStatus::Available if total_points >= self.cost => RedeemStatus::Unlocked,
            CatalogStatus::Available => RedeemStatus::Locked,
        };
        Redeemable {
            id: self.id,
            title: self.title,
            description: self.description,
            cost: self.cost,
            icon: self.icon,
            color_class: self.color_class,
            status,
        }
    }
}

/// Result of redeeming a reward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub reward_id: String,
    pub cost: i64,
    pub new_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cost: i64, status: CatalogStatus) -> RedeemableRow {
        RedeemableRow {
            id: "r1".to_string(),
            title: "1 month of Pro".to_string(),
            description: String::new(),
            cost,
            icon: None,
            color_class: None,
            status,
        }
    }

    #[test]
    fn test_balance_at_or_above_cost_unlocks() {
        assert_eq!(
            row(500, CatalogStatus::Available).into_redeemable(500).status,
            RedeemStatus::Unlocked
        );
        assert_eq!(
            row(500, CatalogStatus::Available).into_redeemable(499).status,
            RedeemStatus::Locked
        );
    }

    #[test]
    fn test_coming_rows_stay_coming() {
        assert_eq!(
            row(500, CatalogStatus::Coming).into_redeemable(10_000).status,
            RedeemStatus::Coming
        );
    }

    #[test]
    fn test_unknown_status_string_is_rejected() {
        let err = serde_json::from_str::<RedeemableRow>(
            r#"{"id": "r1", "title": "Sticker pack", "cost": 100, "status": "retired"}"#,
        );
        assert!(err.is_err());
    }
}
