use anyhow::Result;
use habits_api::models::{AchievementSummary, Role, User, UserStatistics};

use crate::app::App;
use crate::ui::navigation::{header, Section};
use crate::ui::widgets::{card, progress_bar, sparkline};

pub struct ProfilePage {
    user: User,
    days: u32,
    statistics: Option<UserStatistics>,
    achievements: Option<AchievementSummary>,
}

impl ProfilePage {
    /// Statistics and achievement summary are optional; the account block
    /// always renders.
    pub async fn load(app: &App, days: u32) -> Result<Self> {
        let user = app.require_user()?;
        let (statistics, achievements) = tokio::join!(
            app.statistics.user_statistics(user.id, days),
            app.achievements.summary(user.id),
        );

        let statistics = statistics
            .map_err(|e| tracing::warn!(error = %e, "user statistics unavailable"))
            .ok();
        let achievements = achievements
            .map_err(|e| tracing::warn!(error = %e, "achievement summary unavailable"))
            .ok();
        if statistics.is_none() {
            app.notifications
                .warning("Statistics are unavailable right now", None);
        }

        Ok(Self {
            user,
            days,
            statistics,
            achievements,
        })
    }

    pub fn render(&self) -> String {
        let mut out = vec![header(Section::Profile, Some(&self.user)), String::new()];

        let mut account = vec![
            format!("Name: {}", self.user.display_name()),
            format!("Username: {}", self.user.username),
            format!("Email: {}", self.user.email),
        ];
        if self.user.role == Role::Admin {
            account.push("Role: admin".to_string());
        }
        if let Some(created) = &self.user.created_at {
            account.push(format!("Member since: {}", created.split('T').next().unwrap_or_default()));
        }
        out.push(card("Account", &account));

        if let Some(stats) = &self.statistics {
            let mut lines = vec![
                format!("Habits: {} ({} active)", stats.habit_count, stats.active_habits),
                format!("Entries: {}", stats.total_progress),
                format!("Streak: {} days", stats.streak_count),
                format!("Completion: {}", progress_bar(stats.completion_rate, 20)),
            ];
            if !stats.weekly_stats.is_empty() {
                let days: Vec<String> = stats
                    .weekly_stats
                    .iter()
                    .map(|d| format!("{} {}/{}", d.day, d.completed, d.total))
                    .collect();
                lines.push(format!("Week: {}", days.join("  ")));
            }
            if !stats.monthly_trends.is_empty() {
                let values: Vec<f64> = stats.monthly_trends.iter().map(|m| m.progress).collect();
                lines.push(format!("Monthly trend: {}", sparkline(&values)));
            }
            out.push(card(&format!("Last {} days", self.days), &lines));
        }

        if let Some(summary) = &self.achievements {
            out.push(card(
                "Achievements",
                &[format!(
                    "{} of {} {}",
                    summary.total_achievements,
                    summary.total_possible_achievements,
                    progress_bar(summary.completion_percentage, 20)
                )],
            ));
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_account_without_optional_blocks() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "username": "alice", "email": "a@x.io",
            "firstName": "Alice", "createdAt": "2024-01-02T10:00:00"
        }))
        .unwrap();
        let page = ProfilePage {
            user,
            days: 30,
            statistics: None,
            achievements: None,
        };
        let out = page.render();
        assert!(out.contains("Name: Alice"));
        assert!(out.contains("Member since: 2024-01-02"));
        assert!(!out.contains("Last 30 days"));
    }
}
