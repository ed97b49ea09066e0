use anyhow::{bail, Context, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use habits_api::models::{Habit, HabitQuery, PageQuery, Progress, ProgressStats, User};
use habits_api::services::StatsSource;
use habits_api::Page;

use crate::app::App;
use crate::cli::{HabitFields, ListArgs};
use crate::pages::progress::stats_lines;
use crate::ui::habit_card::{habit_details, habit_row, progress_row};
use crate::ui::habit_form::HabitForm;
use crate::ui::navigation::{header, Section};
use crate::ui::widgets::{card, confirm, sparkline};

const RECENT_ENTRIES: u32 = 10;

/// Best matches first; habits that don't match at all are dropped.
pub fn fuzzy_filter(habits: Vec<Habit>, needle: &str) -> Vec<Habit> {
    let needle = needle.trim();
    if needle.is_empty() {
        return habits;
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(Habit, i64)> = habits
        .into_iter()
        .filter_map(|habit| {
            let haystack = match &habit.description {
                Some(description) => format!("{} {}", habit.title, description),
                None => habit.title.clone(),
            };
            matcher
                .fuzzy_match(&haystack, needle)
                .map(|score| (habit, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(habit, _)| habit).collect()
}

pub struct HabitListPage {
    user: User,
    habits: Vec<Habit>,
    /// Set when the list is one server page rather than a search result
    page: Option<(u32, u32, u64)>,
    search: Option<String>,
}

impl HabitListPage {
    /// A search scans every habit so typos still match across pages;
    /// otherwise one server page is shown.
    pub async fn load(app: &App, args: &ListArgs) -> Result<Self> {
        let user = app.require_user()?;
        let search = args.search.clone().filter(|s| !s.trim().is_empty());

        if let Some(needle) = &search {
            let all = app
                .retry
                .run(|| app.habits.list_all())
                .await
                .context("Failed to load habits")?;
            let filtered: Vec<Habit> = all
                .into_iter()
                .filter(|h| args.category.map_or(true, |c| h.category == c))
                .filter(|h| args.active_filter().map_or(true, |a| h.is_active == a))
                .collect();
            return Ok(Self {
                user,
                habits: fuzzy_filter(filtered, needle),
                page: None,
                search,
            });
        }

        let query = HabitQuery {
            page: Some(args.page),
            size: Some(app.config.page_size),
            search: None,
            category: args.category,
            active: args.active_filter(),
        };
        let page: Page<Habit> = app
            .retry
            .run(|| app.habits.list(&query))
            .await
            .context("Failed to load habits")?;

        Ok(Self {
            user,
            page: Some((page.pageable.page_number, page.total_pages, page.total_elements)),
            habits: page.content,
            search,
        })
    }

    pub fn render(&self) -> String {
        let mut out = vec![header(Section::Habits, Some(&self.user)), String::new()];

        if self.habits.is_empty() {
            out.push(match &self.search {
                Some(needle) => format!("No habits match \"{}\".", needle),
                None => "No habits yet. Create one with `habits habits create`.".to_string(),
            });
            return out.join("\n");
        }

        out.extend(self.habits.iter().map(habit_row));
        if let Some((number, pages, total)) = self.page {
            out.push(String::new());
            let mut footer = format!("Page {} of {} · {} habits", number + 1, pages, total);
            if number + 1 < pages {
                footer.push_str(&format!(" · next: --page {}", number + 1));
            }
            out.push(footer);
        }
        out.join("\n")
    }
}

pub struct HabitDetailPage {
    habit: Habit,
    stats: ProgressStats,
    source: StatsSource,
    recent: Vec<Progress>,
}

impl HabitDetailPage {
    pub async fn load(app: &App, id: i64, days: u32) -> Result<Self> {
        app.require_user()?;
        let habit = app
            .habits
            .get(id)
            .await
            .with_context(|| format!("Failed to load habit #{id}"))?;

        let (stats, source) = app
            .progress
            .stats_or_fallback(&habit, days, app.today())
            .await
            .context("Failed to load statistics")?;
        if source == StatsSource::Local {
            app.notifications.info(
                "Statistics computed locally",
                Some("The server could not provide them right now".to_string()),
            );
        }

        let recent = match app
            .progress
            .list_for_habit(id, PageQuery::new(0, RECENT_ENTRIES))
            .await
        {
            Ok(page) => page.content,
            Err(e) => {
                tracing::warn!(habit_id = id, error = %e, "recent progress unavailable");
                Vec::new()
            }
        };

        Ok(Self {
            habit,
            stats,
            source,
            recent,
        })
    }

    pub fn render(&self) -> String {
        let mut out = vec![card(&format!("Habit #{}", self.habit.id), &habit_details(&self.habit))];
        out.push(card(
            &format!("Last {} days", self.stats.total_days),
            &stats_lines(&self.stats, self.source),
        ));

        if !self.recent.is_empty() {
            let mut lines: Vec<String> = self
                .recent
                .iter()
                .map(|p| progress_row(p, Some(&self.habit.unit)))
                .collect();
            let mut values: Vec<(time::Date, f64)> =
                self.recent.iter().map(|p| (p.date, p.value)).collect();
            values.sort_by_key(|(date, _)| *date);
            let values: Vec<f64> = values.into_iter().map(|(_, v)| v).collect();
            lines.push(format!("Trend: {}", sparkline(&values)));
            out.push(card("Recent entries", &lines));
        }
        out.join("\n")
    }
}

pub async fn create(app: &App, fields: HabitFields) -> Result<()> {
    app.require_user()?;
    let mut form = HabitForm::from(fields);
    form.complete_interactively()?;

    let habit = app
        .habits
        .create(&form.to_create_request())
        .await
        .context("Could not create habit")?;
    app.notifications.success(
        "Habit created",
        Some(format!("#{} {}", habit.id, habit.title)),
    );
    println!("{}", habit_row(&habit));
    Ok(())
}

pub async fn update(app: &App, id: i64, fields: HabitFields, active: Option<bool>) -> Result<()> {
    app.require_user()?;
    let form = HabitForm::from(fields);
    if form.is_empty() && active.is_none() {
        bail!("Nothing to update. Pass at least one field, e.g. --title or --target");
    }

    let current = app
        .habits
        .get(id)
        .await
        .with_context(|| format!("Failed to load habit #{id}"))?;
    let request = form.to_update_request(&current, active);
    let habit = app
        .habits
        .update(id, &request)
        .await
        .context("Could not update habit")?;
    app.notifications.success("Habit updated", Some(habit.title.clone()));
    println!("{}", habit_row(&habit));
    Ok(())
}

pub async fn toggle(app: &App, id: i64) -> Result<()> {
    app.require_user()?;
    let habit = app
        .habits
        .toggle(id)
        .await
        .context("Could not change habit status")?;
    let state = if habit.is_active { "resumed" } else { "paused" };
    app.notifications
        .success(format!("Habit {}", state), Some(habit.title.clone()));
    Ok(())
}

pub async fn delete(app: &App, id: i64, assume_yes: bool) -> Result<()> {
    app.require_user()?;
    let habit = app
        .habits
        .get(id)
        .await
        .with_context(|| format!("Failed to load habit #{id}"))?;

    if !assume_yes
        && !confirm(&format!(
            "Delete \"{}\" and all of its progress? This cannot be undone",
            habit.title
        ))?
    {
        app.notifications.info("Nothing deleted", None);
        return Ok(());
    }

    app.habits
        .delete(id)
        .await
        .context("Could not delete habit")?;
    app.notifications.success("Habit deleted", Some(habit.title));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn habit(id: i64, title: &str, description: Option<&str>) -> Habit {
        serde_json::from_value(json!({
            "id": id, "userId": 1, "title": title, "description": description,
            "category": "SANTE", "unit": "x", "frequency": "DAILY"
        }))
        .unwrap()
    }

    #[test]
    fn fuzzy_filter_ranks_and_drops() {
        let habits = vec![
            habit(1, "Drink water", None),
            habit(2, "Read", Some("twenty pages")),
            habit(3, "Walk", Some("after dinner")),
        ];
        let found = fuzzy_filter(habits.clone(), "watr");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);

        let by_description = fuzzy_filter(habits.clone(), "pages");
        assert_eq!(by_description[0].id, 2);

        assert_eq!(fuzzy_filter(habits, "  ").len(), 3);
    }

    #[test]
    fn list_footer_points_to_next_page() {
        let user = serde_json::from_value(json!({"id": 1, "username": "alice", "email": "a@x.io"})).unwrap();
        let page = HabitListPage {
            user,
            habits: vec![habit(1, "Drink water", None)],
            page: Some((0, 3, 41)),
            search: None,
        };
        let out = page.render();
        assert!(out.ends_with("Page 1 of 3 · 41 habits · next: --page 1"), "{out}");
    }
}
