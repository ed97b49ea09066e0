use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStat {
    pub day: String,
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTrend {
    pub month: String,
    pub progress: f64,
    pub habits: u32,
}

/// Aggregated statistics from GET /users/:id/statistics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    #[serde(default)]
    pub habit_count: u32,
    #[serde(default)]
    pub active_habits: u32,
    #[serde(default)]
    pub total_progress: u32,
    #[serde(default)]
    pub streak_count: u32,
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub weekly_stats: Vec<DayStat>,
    #[serde(default)]
    pub monthly_trends: Vec<MonthTrend>,
}

/// Headline numbers for the dashboard, computed client-side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_habits: u32,
    pub active_habits: u32,
    pub completed_today: u32,
    pub current_streak: u32,
    pub weekly_progress: u32,
}
