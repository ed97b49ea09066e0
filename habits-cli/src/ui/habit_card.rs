use habits_api::models::{Habit, Progress};

use super::widgets::{badge, progress_bar};

/// Single-line summary used in lists.
pub fn habit_row(habit: &Habit) -> String {
    let status = if habit.is_active { "" } else { " (paused)" };
    let target = match habit.target_value {
        Some(target) => format!("{} {}", format_value(target), habit.unit),
        None => habit.unit.clone(),
    };
    let streak = habit
        .current_streak
        .filter(|s| *s > 0)
        .map(|s| format!("  🔥 {}", s))
        .unwrap_or_default();

    format!(
        "#{:<4} {} {}{}  {} {}{}",
        habit.id,
        habit.category.icon(),
        habit.title,
        status,
        badge(habit.frequency.as_str()),
        target,
        streak
    )
}

/// Multi-line detail block for `habits show`.
pub fn habit_details(habit: &Habit) -> Vec<String> {
    let mut lines = vec![
        format!("{} {}", habit.category.icon(), habit.title),
        format!(
            "Category: {}   Frequency: {}   Status: {}",
            habit.category.label(),
            habit.frequency,
            if habit.is_active { "active" } else { "paused" }
        ),
    ];
    if let Some(description) = habit.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    match habit.target_value {
        Some(target) => lines.push(format!("Target: {} {}", format_value(target), habit.unit)),
        None => lines.push(format!("Unit: {}", habit.unit)),
    }
    if let Some(total) = habit.total_progress {
        lines.push(format!("Entries: {}", total));
    }
    if let Some(streak) = habit.current_streak {
        lines.push(format!("Current streak: {} days", streak));
    }
    if let Some(average) = habit.average_completion {
        lines.push(format!("Completion: {}", progress_bar(average, 20)));
    }
    if let Some(last) = habit.last_progress_date {
        lines.push(format!("Last entry: {}", last));
    }
    lines
}

pub fn progress_row(entry: &Progress, unit: Option<&str>) -> String {
    let unit = unit.or(entry.habit_unit.as_deref()).unwrap_or_default();
    let mut row = format!(
        "#{:<5} {}  {:>8} {}",
        entry.id,
        entry.date,
        format_value(entry.value),
        unit
    );
    if entry.habit_target.is_some() {
        let mark = if entry.is_target_reached() { "✔" } else { " " };
        row.push_str(&format!("  {} {:.0}%", mark, entry.completion_percentage()));
    }
    if let Some(note) = entry.note.as_deref().filter(|n| !n.is_empty()) {
        row.push_str(&format!("  \"{}\"", note));
    }
    row
}

/// Drop the fraction for whole numbers: `5` rather than `5.0`.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
