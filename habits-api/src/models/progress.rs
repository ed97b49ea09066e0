use serde::{Deserialize, Serialize};
use time::Date;

/// One measurement for one habit on one calendar day.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: i64,
    pub user_id: i64,
    pub habit_id: i64,
    #[serde(with = "super::iso_date")]
    pub date: Date,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    // Enrichment added by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reached: Option<bool>,
}

impl Progress {
    /// Percentage of the habit target reached, 0 when no target is known.
    pub fn completion_percentage(&self) -> f64 {
        match self.habit_target {
            Some(target) if target > 0.0 => (self.value / target * 100.0).round(),
            _ => 0.0,
        }
    }

    pub fn is_target_reached(&self) -> bool {
        match self.habit_target {
            Some(target) if target > 0.0 => self.value >= target,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgressRequest {
    #[serde(with = "super::iso_date")]
    pub date: Date,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "super::iso_date::option"
    )]
    pub date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Query parameters for paged progress lists.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }
}

/// Statistics for one habit over a window of days.
///
/// This is the shape served by GET /habits/:id/progress/stats and also the
/// shape produced locally by [`crate::stats::compute_progress_stats`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub habit_id: i64,
    pub habit_title: String,
    pub habit_unit: String,
    #[serde(default)]
    pub habit_target: Option<f64>,

    #[serde(with = "super::iso_date")]
    pub start_date: Date,
    #[serde(with = "super::iso_date")]
    pub end_date: Date,
    pub total_days: u32,

    pub total_entries: u32,
    pub consecutive_days: u32,
    pub completion_rate: f64,

    pub total_value: f64,
    pub average_value: f64,
    pub max_value: f64,
    pub min_value: f64,
    pub last_value: f64,

    #[serde(default)]
    pub progress_trend: f64,
    #[serde(default)]
    pub improvement_detected: bool,

    pub days_target_reached: u32,
    pub target_reach_rate: f64,

    pub consistency_score: f64,
    #[serde(default, with = "super::iso_date::option")]
    pub last_entry_date: Option<Date>,
    pub days_since_last_entry: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn create_request_serializes_plain_date() {
        let req = CreateProgressRequest {
            date: date!(2024 - 02 - 09),
            value: 2.5,
            note: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "date": "2024-02-09", "value": 2.5 })
        );
    }

    #[test]
    fn completion_uses_enriched_target() {
        let progress: Progress = serde_json::from_value(json!({
            "id": 1, "userId": 1, "habitId": 2, "date": "2024-02-09",
            "value": 3.0, "habitTarget": 4.0
        }))
        .unwrap();

        assert_eq!(progress.completion_percentage(), 75.0);
        assert!(!progress.is_target_reached());
    }
}
