use anyhow::{Context, Result};
use habits_api::models::{rarity_label, Achievement, AchievementCheckRequest, AchievementSummary, PageQuery, User};

use crate::app::App;
use crate::ui::navigation::{header, Section};
use crate::ui::widgets::{badge, card, progress_bar};

const PAGE_SIZE: u32 = 50;

pub struct AchievementsPage {
    user: User,
    achievements: Vec<Achievement>,
    summary: Option<AchievementSummary>,
    recent_days: Option<u32>,
}

impl AchievementsPage {
    pub async fn load(app: &App, recent_days: Option<u32>, check_first: bool) -> Result<Self> {
        let user = app.require_user()?;

        if check_first {
            let request = AchievementCheckRequest {
                user_id: user.id,
                habit_id: None,
                trigger_type: Some("MANUAL".to_string()),
            };
            match app.achievements.check(&request).await {
                Ok(response) if response.new_achievements_unlocked > 0 => {
                    app.notifications.success(
                        format!("{} new achievement(s) unlocked", response.new_achievements_unlocked),
                        Some(response.message),
                    );
                }
                Ok(_) => {
                    app.notifications.info("No new achievements", None);
                }
                Err(e) => tracing::warn!(error = %e, "achievement check failed"),
            }
        }

        let achievements = match recent_days {
            Some(days) => app
                .retry
                .run(|| app.achievements.recent(user.id, days))
                .await
                .context("Failed to load recent achievements")?,
            None => {
                app.retry
                    .run(|| app.achievements.list_for_user(user.id, PageQuery::new(0, PAGE_SIZE)))
                    .await
                    .context("Failed to load achievements")?
                    .content
            }
        };

        let summary = match app.achievements.summary(user.id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(error = %e, "achievement summary unavailable");
                None
            }
        };

        Ok(Self {
            user,
            achievements,
            summary,
            recent_days,
        })
    }

    pub fn render(&self) -> String {
        let mut out = vec![header(Section::Achievements, Some(&self.user)), String::new()];

        if let Some(summary) = &self.summary {
            let mut lines = vec![
                format!(
                    "{} of {} unlocked {}",
                    summary.total_achievements,
                    summary.total_possible_achievements,
                    progress_bar(summary.completion_percentage, 20)
                ),
                format!(
                    "This week: {}   This month: {}",
                    summary.achievements_this_week, summary.achievements_this_month
                ),
            ];
            if let Some(next) = &summary.next_possible_achievement {
                lines.push(format!(
                    "Next: {} {}",
                    next,
                    progress_bar(summary.progress_to_next_achievement, 10)
                ));
            }
            out.push(card("Summary", &lines));
        }

        if self.achievements.is_empty() {
            out.push(match self.recent_days {
                Some(days) => format!("Nothing unlocked in the last {} days.", days),
                None => "No achievements yet. Keep logging progress!".to_string(),
            });
        } else {
            out.extend(self.achievements.iter().map(achievement_row));
        }
        out.join("\n")
    }
}

pub fn achievement_row(achievement: &Achievement) -> String {
    let mut row = format!("{} {}", achievement.display_icon(), achievement.name);
    if achievement.is_new == Some(true) {
        row.push_str(&format!(" {}", badge("new")));
    }
    if let Some(rarity) = achievement.rarity {
        row.push_str(&format!(" {}", badge(rarity_label(rarity))));
    }
    let unlocked = achievement.unlocked_at.split('T').next().unwrap_or_default();
    row.push_str(&format!("  {}", unlocked));
    if !achievement.description.is_empty() {
        row.push_str(&format!("\n    {}", achievement.description));
    }
    row
}
