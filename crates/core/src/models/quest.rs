//! Quest catalog and per-user progress models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// Per-user quest progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    Available,
    InProgress,
    Completed,
    Claimed,
}

impl QuestStatus {
    /// Wire/database string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Available => "AVAILABLE",
            QuestStatus::InProgress => "IN_PROGRESS",
            QuestStatus::Completed => "COMPLETED",
            QuestStatus::Claimed => "CLAIMED",
        }
    }

    /// Whether this status still accepts a completion transition
    pub fn is_open(&self) -> bool {
        matches!(self, QuestStatus::Available | QuestStatus::InProgress)
    }
}

impl std::str::FromStr for QuestStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "AVAILABLE" => Ok(QuestStatus::Available),
            "IN_PROGRESS" => Ok(QuestStatus::InProgress),
            "COMPLETED" => Ok(QuestStatus::Completed),
            "CLAIMED" => Ok(QuestStatus::Claimed),
            other => Err(crate::Error::InvalidData(format!(
                "unknown quest status: {other}"
            ))),
        }
    }
}

/// Catalog grouping for quests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestCategory {
    #[default]
    Social,
    Activity,
    Special,
    #[serde(rename = "On-chain")]
    OnChain,
}

/// Row shape of the quest catalog table (`rewards` in the hosted schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "wire::deserialize_i64_lenient")]
    pub reward_amount: i64,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "wire::deserialize_or_default")]
    pub category: QuestCategory,
    #[serde(default)]
    pub action_label: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row shape of the `user_quests` join table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuestRow {
    pub quest_id: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Catalog quest joined with the viewer's progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward_amount: i64,
    pub icon: Option<String>,
    pub category: QuestCategory,
    pub action_label: Option<String>,
    pub status: QuestStatus,
}

impl QuestRow {
    /// Join with the viewer's progress; unjoined quests are available
    pub fn into_quest(self, status: Option<QuestStatus>) -> Quest {
        Quest {
            id: self.id,
            title: self.title,
            description: self.description,
            reward_amount: self.reward_amount,
            icon: self.icon,
            category: self.category,
            action_label: self.action_label,
            status: status.unwrap_or(QuestStatus::Available),
        }
    }
}

/// Result of recording a quest completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub points_awarded: i64,
    pub new_points: i64,
}
