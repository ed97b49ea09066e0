use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HabitCategory {
    Sport,
    Sante,
    Education,
    Travail,
    Lifestyle,
    Social,
    Creativite,
    Finance,
    Autre,
}

impl HabitCategory {
    pub const ALL: [HabitCategory; 9] = [
        HabitCategory::Sport,
        HabitCategory::Sante,
        HabitCategory::Education,
        HabitCategory::Travail,
        HabitCategory::Lifestyle,
        HabitCategory::Social,
        HabitCategory::Creativite,
        HabitCategory::Finance,
        HabitCategory::Autre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HabitCategory::Sport => "SPORT",
            HabitCategory::Sante => "SANTE",
            HabitCategory::Education => "EDUCATION",
            HabitCategory::Travail => "TRAVAIL",
            HabitCategory::Lifestyle => "LIFESTYLE",
            HabitCategory::Social => "SOCIAL",
            HabitCategory::Creativite => "CREATIVITE",
            HabitCategory::Finance => "FINANCE",
            HabitCategory::Autre => "AUTRE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HabitCategory::Sport => "Sport",
            HabitCategory::Sante => "Health",
            HabitCategory::Education => "Education",
            HabitCategory::Travail => "Work",
            HabitCategory::Lifestyle => "Lifestyle",
            HabitCategory::Social => "Social",
            HabitCategory::Creativite => "Creativity",
            HabitCategory::Finance => "Finance",
            HabitCategory::Autre => "Other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            HabitCategory::Sport => "🏃",
            HabitCategory::Sante => "🏥",
            HabitCategory::Education => "📚",
            HabitCategory::Travail => "💼",
            HabitCategory::Lifestyle => "🌱",
            HabitCategory::Social => "👥",
            HabitCategory::Creativite => "🎨",
            HabitCategory::Finance => "💰",
            HabitCategory::Autre => "📌",
        }
    }
}

impl fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HabitCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HabitCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown habit category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Daily, Frequency::Weekly, Frequency::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown frequency: {}", s))
    }
}

/// A habit owned by one user, with the server's derived statistics when present.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: HabitCategory,
    pub unit: String,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_completion: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::iso_date::option"
    )]
    pub last_progress_date: Option<Date>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: HabitCategory,
    pub unit: String,
    pub frequency: Frequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<HabitCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Query parameters of GET /habits.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HabitQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<HabitCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_backend_habit() {
        let habit: Habit = serde_json::from_value(json!({
            "id": 4,
            "userId": 1,
            "title": "Run",
            "category": "SPORT",
            "unit": "km",
            "frequency": "DAILY",
            "targetValue": 5.0,
            "isActive": false,
            "createdAt": "2024-03-01T08:00:00",
            "lastProgressDate": "2024-03-04"
        }))
        .unwrap();

        assert_eq!(habit.category, HabitCategory::Sport);
        assert_eq!(habit.target_value, Some(5.0));
        assert!(!habit.is_active);
        assert_eq!(
            habit.last_progress_date,
            Some(time::macros::date!(2024 - 03 - 04))
        );
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("creativite".parse::<HabitCategory>(), Ok(HabitCategory::Creativite));
        assert!("yoga".parse::<HabitCategory>().is_err());
        assert_eq!("Weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
    }

    #[test]
    fn update_request_only_sends_set_fields() {
        let req = UpdateHabitRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "isActive": false }));
    }
}
