use std::path::Path;

use anyhow::{bail, Context, Result};
use habits_api::chart::sparkline_svg;
use habits_api::models::{
    AchievementCheckRequest, CreateProgressRequest, Habit, PageQuery, Progress, ProgressStats,
    UpdateProgressRequest, User,
};
use habits_api::services::StatsSource;
use habits_api::NewNotification;
use habits_api::NotificationKind;
use time::Date;

use crate::app::App;
use crate::ui::habit_card::{format_value, progress_row};
use crate::ui::navigation::{header, Section};
use crate::ui::widgets::{card, confirm, progress_bar, sparkline};

const CHART_WIDTH: u32 = 320;
const CHART_HEIGHT: u32 = 64;

/// Statistics block shared by `progress stats` and `habits show`.
pub fn stats_lines(stats: &ProgressStats, source: StatsSource) -> Vec<String> {
    let unit = &stats.habit_unit;
    let mut lines = vec![
        format!("{} → {}", stats.start_date, stats.end_date),
        format!(
            "Entries: {}   Streak: {} days   Consistency: {:.0}",
            stats.total_entries, stats.consecutive_days, stats.consistency_score
        ),
        format!("Completion: {}", progress_bar(stats.completion_rate, 20)),
        format!(
            "Total {} {}   avg {} · min {} · max {}",
            format_value(stats.total_value),
            unit,
            format_value(stats.average_value),
            format_value(stats.min_value),
            format_value(stats.max_value),
        ),
    ];

    if stats.habit_target.is_some() {
        lines.push(format!(
            "Target reached on {} days ({:.0}%)",
            stats.days_target_reached, stats.target_reach_rate
        ));
    }
    if stats.total_entries > 0 {
        let trend = if stats.improvement_detected {
            "improving ↗"
        } else if stats.progress_trend < 0.0 {
            "declining ↘"
        } else {
            "steady →"
        };
        lines.push(format!("Trend: {} ({:+.1})", trend, stats.progress_trend));
    }
    match stats.last_entry_date {
        Some(date) if stats.total_entries > 0 => lines.push(format!(
            "Last entry: {} ({} days ago)",
            date, stats.days_since_last_entry
        )),
        _ => lines.push("No entries in this period".to_string()),
    }
    if source == StatsSource::Local {
        lines.push("(computed locally)".to_string());
    }
    lines
}

pub struct ProgressListPage {
    user: User,
    habit: Habit,
    entries: Vec<Progress>,
    page_number: u32,
    total_pages: u32,
}

impl ProgressListPage {
    pub async fn load(app: &App, habit_id: i64, page: u32) -> Result<Self> {
        let user = app.require_user()?;
        let habit = app
            .habits
            .get(habit_id)
            .await
            .with_context(|| format!("Failed to load habit #{habit_id}"))?;
        let query = PageQuery::new(page, app.config.page_size);
        let page = app
            .retry
            .run(|| app.progress.list_for_habit(habit_id, query))
            .await
            .context("Failed to load progress")?;

        Ok(Self {
            user,
            habit,
            entries: page.content,
            page_number: page.pageable.page_number,
            total_pages: page.total_pages,
        })
    }

    pub fn render(&self) -> String {
        let mut out = vec![header(Section::Progress, Some(&self.user)), String::new()];
        out.push(format!("{} {}", self.habit.category.icon(), self.habit.title));
        if self.entries.is_empty() {
            out.push(format!(
                "No progress yet. Log some with `habits progress add {} <value>`.",
                self.habit.id
            ));
            return out.join("\n");
        }
        out.extend(
            self.entries
                .iter()
                .map(|p| progress_row(p, Some(&self.habit.unit))),
        );
        out.push(format!("Page {} of {}", self.page_number + 1, self.total_pages));
        out.join("\n")
    }
}

pub async fn add(
    app: &App,
    habit_id: i64,
    value: f64,
    date: Option<Date>,
    note: Option<String>,
) -> Result<()> {
    let user = app.require_user()?;
    let request = CreateProgressRequest {
        date: date.unwrap_or_else(|| app.today()),
        value,
        note: note.filter(|n| !n.trim().is_empty()),
    };

    let entry = app
        .progress
        .create(habit_id, &request)
        .await
        .context("Could not record progress")?;
    app.notifications.success(
        "Progress recorded",
        Some(format!("{} on {}", format_value(entry.value), entry.date)),
    );

    check_achievements(app, &user, habit_id).await;
    Ok(())
}

/// Ask the server to evaluate achievements. Failures are logged only.
async fn check_achievements(app: &App, user: &User, habit_id: i64) {
    let request = AchievementCheckRequest {
        user_id: user.id,
        habit_id: Some(habit_id),
        trigger_type: Some("PROGRESS_ADDED".to_string()),
    };
    match app.achievements.check(&request).await {
        Ok(response) => {
            for achievement in response.new_achievements {
                app.notifications.add(
                    NewNotification::new(
                        NotificationKind::Success,
                        format!("{} Achievement unlocked: {}", achievement.display_icon(), achievement.name),
                    )
                    .message(achievement.description),
                );
            }
        }
        Err(e) => tracing::warn!(habit_id, error = %e, "achievement check failed"),
    }
}

pub async fn edit(
    app: &App,
    id: i64,
    value: Option<f64>,
    date: Option<Date>,
    note: Option<String>,
) -> Result<()> {
    app.require_user()?;
    if value.is_none() && date.is_none() && note.is_none() {
        bail!("Nothing to change. Pass --value, --date or --note");
    }

    let request = UpdateProgressRequest { date, value, note };
    let entry = app
        .progress
        .update(id, &request)
        .await
        .with_context(|| format!("Could not update entry #{id}"))?;
    app.notifications.success("Progress updated", None);
    println!("{}", progress_row(&entry, None));
    Ok(())
}

pub async fn delete(app: &App, id: i64, assume_yes: bool) -> Result<()> {
    app.require_user()?;
    if !assume_yes && !confirm(&format!("Delete progress entry #{id}?"))? {
        app.notifications.info("Nothing deleted", None);
        return Ok(());
    }
    app.progress
        .delete(id)
        .await
        .with_context(|| format!("Could not delete entry #{id}"))?;
    app.notifications.success("Progress deleted", None);
    Ok(())
}

pub struct ProgressStatsPage {
    stats: ProgressStats,
    source: StatsSource,
    /// Oldest first
    values: Vec<f64>,
}

impl ProgressStatsPage {
    pub async fn load(app: &App, habit_id: i64, days: u32) -> Result<Self> {
        app.require_user()?;
        let habit = app
            .habits
            .get(habit_id)
            .await
            .with_context(|| format!("Failed to load habit #{habit_id}"))?;
        let (stats, source) = app
            .progress
            .stats_or_fallback(&habit, days, app.today())
            .await
            .context("Failed to load statistics")?;

        let values = match app.progress.list_all_for_habit(habit_id).await {
            Ok(entries) => chart_values(&entries, stats.start_date, stats.end_date),
            Err(e) => {
                tracing::warn!(habit_id, error = %e, "entries for chart unavailable");
                Vec::new()
            }
        };

        Ok(Self {
            stats,
            source,
            values,
        })
    }

    pub fn render(&self) -> String {
        let mut lines = stats_lines(&self.stats, self.source);
        if !self.values.is_empty() {
            lines.push(format!("Values: {}", sparkline(&self.values)));
        }
        card(
            &format!("{} · last {} days", self.stats.habit_title, self.stats.total_days),
            &lines,
        )
    }

    pub fn write_svg(&self, path: &Path) -> Result<()> {
        let svg = sparkline_svg(&self.values, CHART_WIDTH, CHART_HEIGHT);
        std::fs::write(path, svg)
            .with_context(|| format!("Failed to write chart to {}", path.display()))
    }
}

/// Values inside the window, ordered by date.
fn chart_values(entries: &[Progress], start: Date, end: Date) -> Vec<f64> {
    let mut in_window: Vec<&Progress> = entries
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .collect();
    in_window.sort_by_key(|p| p.date);
    in_window.into_iter().map(|p| p.value).collect()
}
