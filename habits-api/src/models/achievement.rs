use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A badge unlocked server-side. Read-only from the client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub achievement_type: String,
    pub unlocked_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Achievement {
    /// Icon sent by the server, or one derived from the achievement type.
    pub fn display_icon(&self) -> &str {
        if !self.icon.is_empty() {
            return &self.icon;
        }
        match self.achievement_type.as_str() {
            "CONSISTENCY" => "🎯",
            "MILESTONE" => "🏆",
            "STREAK" => "🔥",
            "DEDICATION" => "💪",
            "OVERACHIEVER" => "⭐",
            "VARIETY" => "🌈",
            "EARLY_BIRD" => "🌅",
            "PERSEVERANCE" => "🗿",
            _ => "🏅",
        }
    }
}

/// Rarity bucket for a rarity percentage (share of users holding the badge).
pub fn rarity_label(rarity: f64) -> &'static str {
    if rarity >= 90.0 {
        "Common"
    } else if rarity >= 70.0 {
        "Uncommon"
    } else if rarity >= 40.0 {
        "Rare"
    } else if rarity >= 15.0 {
        "Epic"
    } else {
        "Legendary"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    pub total_achievements: u32,
    #[serde(default)]
    pub total_possible_achievements: u32,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub achievements_by_type: HashMap<String, u32>,
    #[serde(default)]
    pub last_achievement_date: Option<String>,
    #[serde(default)]
    pub last_achievement_name: Option<String>,
    #[serde(default)]
    pub achievements_this_week: u32,
    #[serde(default)]
    pub achievements_this_month: u32,
    #[serde(default)]
    pub next_possible_achievement: Option<String>,
    #[serde(default)]
    pub progress_to_next_achievement: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCheckRequest {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCheckResponse {
    pub user_id: i64,
    #[serde(default)]
    pub total_checked: u32,
    #[serde(default)]
    pub new_achievements_unlocked: u32,
    #[serde(default)]
    pub new_achievements: Vec<Achievement>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_buckets() {
        assert_eq!(rarity_label(95.0), "Common");
        assert_eq!(rarity_label(40.0), "Rare");
        assert_eq!(rarity_label(3.0), "Legendary");
    }
}
