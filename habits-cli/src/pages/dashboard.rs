use std::collections::HashMap;

use anyhow::{Context, Result};
use habits_api::models::{Achievement, DashboardStats, Habit, PageQuery, Progress, User};
use habits_api::stats::{dashboard_stats, habit_with_derived_stats};
use time::Date;

use crate::app::App;
use crate::ui::habit_card::format_value;
use crate::ui::navigation::{header, Section};
use crate::ui::widgets::{card, progress_bar};

const RECENT_PROGRESS: u32 = 100;
const RECENT_ACHIEVEMENT_DAYS: u32 = 7;

pub struct DashboardPage {
    user: User,
    today: Date,
    habits: Vec<Habit>,
    today_entries: Vec<Progress>,
    stats: DashboardStats,
    recent_achievements: Vec<Achievement>,
}

impl DashboardPage {
    pub async fn load(app: &App) -> Result<Self> {
        let user = app.require_user()?;
        let today = app.today();

        let (habits, progress) = tokio::try_join!(
            app.retry.run(|| app.habits.list_all()),
            app.retry
                .run(|| app.progress.list_for_user(user.id, PageQuery::new(0, RECENT_PROGRESS))),
        )
        .context("Failed to load dashboard")?;
        let progress = progress.content;

        let today_entries = match app.progress.today(user.id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "today's progress unavailable, using recent entries");
                progress.iter().filter(|p| p.date == today).cloned().collect()
            }
        };

        let recent_achievements = match app.achievements.recent(user.id, RECENT_ACHIEVEMENT_DAYS).await {
            Ok(achievements) => achievements,
            Err(e) => {
                tracing::warn!(error = %e, "recent achievements unavailable");
                Vec::new()
            }
        };

        Ok(Self::from_parts(user, today, habits, progress, today_entries, recent_achievements))
    }

    pub fn from_parts(
        user: User,
        today: Date,
        habits: Vec<Habit>,
        progress: Vec<Progress>,
        today_entries: Vec<Progress>,
        recent_achievements: Vec<Achievement>,
    ) -> Self {
        let stats = dashboard_stats(&habits, &progress, today);

        let mut by_habit: HashMap<i64, Vec<Progress>> = HashMap::new();
        for entry in progress {
            by_habit.entry(entry.habit_id).or_default().push(entry);
        }
        let habits = habits
            .into_iter()
            .map(|habit| {
                let entries = by_habit.remove(&habit.id).unwrap_or_default();
                habit_with_derived_stats(habit, &entries, today)
            })
            .collect();

        Self {
            user,
            today,
            habits,
            today_entries,
            stats,
            recent_achievements,
        }
    }

    pub fn render(&self) -> String {
        let mut out = vec![header(Section::Dashboard, Some(&self.user)), String::new()];

        out.push(card(
            &format!("Today, {}", self.today),
            &[
                format!(
                    "Habits: {} active of {}",
                    self.stats.active_habits, self.stats.total_habits
                ),
                format!("Completed today: {}", self.stats.completed_today),
                format!("Current streak: {} days", self.stats.current_streak),
                format!("This week: {}", progress_bar(f64::from(self.stats.weekly_progress), 20)),
            ],
        ));

        let active: Vec<&Habit> = self.habits.iter().filter(|h| h.is_active).collect();
        if active.is_empty() {
            out.push("No active habits yet. Create one with `habits habits create`.".into());
        } else {
            let lines: Vec<String> = active.iter().map(|h| self.today_line(h)).collect();
            out.push(card("Active habits", &lines));
        }

        if !self.recent_achievements.is_empty() {
            let lines: Vec<String> = self
                .recent_achievements
                .iter()
                .map(|a| format!("{} {}", a.display_icon(), a.name))
                .collect();
            out.push(card("Recently unlocked", &lines));
        }

        out.join("\n")
    }

    fn today_line(&self, habit: &Habit) -> String {
        let logged: f64 = self
            .today_entries
            .iter()
            .filter(|p| p.habit_id == habit.id)
            .map(|p| p.value)
            .sum();
        let done = self.today_entries.iter().any(|p| p.habit_id == habit.id);
        let mark = if done { "✔" } else { "·" };
        let streak = habit.current_streak.unwrap_or(0);

        match habit.target_value {
            Some(target) if target > 0.0 => format!(
                "{} #{} {}  {} / {} {}  {}  🔥 {}",
                mark,
                habit.id,
                habit.title,
                format_value(logged),
                format_value(target),
                habit.unit,
                progress_bar(logged / target * 100.0, 10),
                streak
            ),
            _ => format!(
                "{} #{} {}  {} {}  🔥 {}",
                mark,
                habit.id,
                habit.title,
                format_value(logged),
                habit.unit,
                streak
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 10);

    fn user() -> User {
        serde_json::from_value(json!({"id": 1, "username": "alice", "email": "a@x.io"})).unwrap()
    }

    fn habit(id: i64, title: &str, active: bool) -> Habit {
        serde_json::from_value(json!({
            "id": id, "userId": 1, "title": title, "category": "SPORT",
            "unit": "km", "frequency": "DAILY", "targetValue": 5.0, "isActive": active
        }))
        .unwrap()
    }

    fn entry(id: i64, habit_id: i64, date: &str, value: f64) -> Progress {
        serde_json::from_value(json!({
            "id": id, "userId": 1, "habitId": habit_id, "date": date, "value": value
        }))
        .unwrap()
    }

    #[test]
    fn derives_streaks_per_habit() {
        let progress = vec![
            entry(1, 1, "2024-03-09", 4.0),
            entry(2, 1, "2024-03-10", 6.0),
            entry(3, 2, "2024-03-01", 1.0),
        ];
        let today_entries = vec![progress[1].clone()];
        let page = DashboardPage::from_parts(
            user(),
            TODAY,
            vec![habit(1, "Run", true), habit(2, "Swim", true), habit(3, "Old", false)],
            progress,
            today_entries,
            Vec::new(),
        );

        assert_eq!(page.habits[0].current_streak, Some(2));
        assert_eq!(page.habits[1].current_streak, Some(0));
        assert_eq!(page.stats.completed_today, 1);
        assert_eq!(page.stats.active_habits, 2);

        let out = page.render();
        assert!(out.contains("✔ #1 Run  6 / 5 km"), "{out}");
        assert!(out.contains("· #2 Swim  0 / 5 km"), "{out}");
        assert!(!out.contains("Old"));
        assert!(!out.contains("Recently unlocked"));
    }

    #[test]
    fn empty_dashboard_suggests_creating_a_habit() {
        let page = DashboardPage::from_parts(user(), TODAY, vec![], vec![], vec![], vec![]);
        assert!(page.render().contains("habits habits create"));
    }
}
