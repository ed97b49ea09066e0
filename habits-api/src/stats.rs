//! Statistics derived locally from raw progress entries, used when the
//! backend cannot serve them.

use std::collections::BTreeSet;

use time::{Date, Duration};

use crate::models::{DashboardStats, Habit, Progress, ProgressStats};

/// Longest streak the backward walk will count.
pub const MAX_STREAK_DAYS: u32 = 365;
/// A streak of this many days gives a consistency score of 100.
pub const CONSISTENCY_BASELINE_DAYS: f64 = 30.0;

/// Compute [`ProgressStats`] for `habit` from every one of its entries.
///
/// The result has the same shape and units as the backend's statistics
/// endpoint (rates are percentages).
pub fn compute_progress_stats(habit: &Habit, entries: &[Progress], today: Date) -> ProgressStats {
    let mut stats = ProgressStats {
        habit_id: habit.id,
        habit_title: habit.title.clone(),
        habit_unit: habit.unit.clone(),
        habit_target: habit.target_value,
        start_date: today,
        end_date: today,
        total_days: 0,
        total_entries: 0,
        consecutive_days: 0,
        completion_rate: 0.0,
        total_value: 0.0,
        average_value: 0.0,
        max_value: 0.0,
        min_value: 0.0,
        last_value: 0.0,
        progress_trend: 0.0,
        improvement_detected: false,
        days_target_reached: 0,
        target_reach_rate: 0.0,
        consistency_score: 0.0,
        last_entry_date: Some(today),
        days_since_last_entry: 0,
    };
    if entries.is_empty() {
        return stats;
    }

    let mut sorted: Vec<&Progress> = entries.iter().collect();
    sorted.sort_by_key(|p| p.date);

    let count = sorted.len() as f64;
    let total_value: f64 = sorted.iter().map(|p| p.value).sum();
    let max_value = sorted.iter().map(|p| p.value).fold(f64::MIN, f64::max);
    let min_value = sorted.iter().map(|p| p.value).fold(f64::MAX, f64::min);

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];

    let streak = streak_ending(today, entries.iter().map(|p| p.date));
    let days_target_reached = sorted
        .iter()
        .filter(|p| reaches_target(p.value, habit.target_value))
        .count() as u32;
    let target_reach_rate = f64::from(days_target_reached) / count * 100.0;
    let trend = progress_trend(&sorted);

    stats.start_date = first.date;
    stats.end_date = last.date;
    stats.total_days = ((last.date - first.date).whole_days() + 1) as u32;
    stats.total_entries = sorted.len() as u32;
    stats.consecutive_days = streak;
    stats.completion_rate = target_reach_rate;
    stats.total_value = total_value;
    stats.average_value = total_value / count;
    stats.max_value = max_value;
    stats.min_value = min_value;
    stats.last_value = last.value;
    stats.progress_trend = trend;
    stats.improvement_detected = trend > 0.0;
    stats.days_target_reached = days_target_reached;
    stats.target_reach_rate = target_reach_rate;
    stats.consistency_score = consistency_score(streak);
    stats.last_entry_date = Some(last.date);
    stats.days_since_last_entry = (today - last.date).whole_days();
    stats
}

/// Consecutive days with at least one entry, walking back from `today`.
/// A missing `today` yields 0.
pub fn streak_ending(today: Date, dates: impl IntoIterator<Item = Date>) -> u32 {
    let dates: BTreeSet<Date> = dates.into_iter().collect();
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if streak >= MAX_STREAK_DAYS || !dates.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.previous_day();
    }
    streak
}

pub fn consistency_score(streak: u32) -> f64 {
    (f64::from(streak) / CONSISTENCY_BASELINE_DAYS * 100.0).min(100.0)
}

/// No target (or a non-positive one) counts every entry as reached.
fn reaches_target(value: f64, target: Option<f64>) -> bool {
    match target {
        Some(target) if target > 0.0 => value >= target,
        _ => true,
    }
}

/// Mean of the later half of the entries minus mean of the earlier half.
fn progress_trend(sorted: &[&Progress]) -> f64 {
    if sorted.len() < 2 {
        return 0.0;
    }
    let (earlier, later) = sorted.split_at(sorted.len() / 2);
    mean(later) - mean(earlier)
}

fn mean(entries: &[&Progress]) -> f64 {
    entries.iter().map(|p| p.value).sum::<f64>() / entries.len() as f64
}

/// Fill a habit's derived fields (entry count, streak, average completion,
/// last progress date) from its entries.
pub fn habit_with_derived_stats(mut habit: Habit, entries: &[Progress], today: Date) -> Habit {
    if entries.is_empty() {
        return habit;
    }

    let count = entries.len();
    let average = entries.iter().map(|p| p.value).sum::<f64>() / count as f64;

    habit.total_progress = Some(count as u32);
    habit.current_streak = Some(streak_ending(today, entries.iter().map(|p| p.date)));
    habit.average_completion = Some(match habit.target_value {
        Some(target) if target > 0.0 => average / target * 100.0,
        _ => 0.0,
    });
    habit.last_progress_date = entries.iter().map(|p| p.date).max();
    habit
}

/// Dashboard headline numbers from the user's habits and their progress.
pub fn dashboard_stats(habits: &[Habit], progress: &[Progress], today: Date) -> DashboardStats {
    let active_habits = habits.iter().filter(|h| h.is_active).count() as u32;
    let week_start = today - Duration::days(6);
    let this_week = progress
        .iter()
        .filter(|p| p.date >= week_start && p.date <= today)
        .count() as f64;

    let weekly_progress = if active_habits > 0 {
        (this_week / f64::from(active_habits * 7) * 100.0)
            .round()
            .min(100.0) as u32
    } else {
        0
    };

    DashboardStats {
        total_habits: habits.len() as u32,
        active_habits,
        completed_today: progress.iter().filter(|p| p.date == today).count() as u32,
        current_streak: streak_ending(today, progress.iter().map(|p| p.date)),
        weekly_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, HabitCategory};
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 10);

    fn habit(target: Option<f64>) -> Habit {
        Habit {
            id: 1,
            user_id: 1,
            title: "Run".into(),
            description: None,
            category: HabitCategory::Sport,
            unit: "km".into(),
            frequency: Frequency::Daily,
            target_value: target,
            is_active: true,
            created_at: None,
            total_progress: None,
            current_streak: None,
            average_completion: None,
            last_progress_date: None,
        }
    }

    fn entry(id: i64, days_ago: i64, value: f64) -> Progress {
        Progress {
            id,
            user_id: 1,
            habit_id: 1,
            date: TODAY - Duration::days(days_ago),
            value,
            note: None,
            created_at: None,
            habit_title: None,
            habit_unit: None,
            habit_target: None,
            completion_percentage: None,
            target_reached: None,
        }
    }

    #[test]
    fn three_consecutive_days_make_a_streak_of_three() {
        let entries = [entry(1, 0, 5.0), entry(2, 1, 3.0), entry(3, 2, 4.0)];
        let stats = compute_progress_stats(&habit(Some(4.0)), &entries, TODAY);

        assert_eq!(stats.consecutive_days, 3);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_value, 12.0);
        assert_eq!(stats.average_value, 4.0);
        assert_eq!(stats.max_value, 5.0);
        assert_eq!(stats.min_value, 3.0);
        assert_eq!(stats.last_value, 5.0);
        assert_eq!(stats.days_target_reached, 2);
        assert_eq!(stats.start_date, date!(2024 - 03 - 08));
        assert_eq!(stats.end_date, TODAY);
        assert_eq!(stats.total_days, 3);
        assert_eq!(stats.consistency_score, 10.0);
        assert_eq!(stats.days_since_last_entry, 0);
    }

    #[test]
    fn a_gap_breaks_the_streak() {
        let entries = [entry(1, 0, 1.0), entry(2, 3, 1.0)];
        let stats = compute_progress_stats(&habit(None), &entries, TODAY);
        assert_eq!(stats.consecutive_days, 1);
        assert_eq!(stats.total_days, 4);
    }

    #[test]
    fn no_entry_today_means_no_streak() {
        let entries = [entry(1, 1, 1.0), entry(2, 2, 1.0)];
        let stats = compute_progress_stats(&habit(None), &entries, TODAY);
        assert_eq!(stats.consecutive_days, 0);
        assert_eq!(stats.days_since_last_entry, 1);
    }

    #[test]
    fn empty_entries_give_zeros_and_today() {
        let stats = compute_progress_stats(&habit(Some(10.0)), &[], TODAY);

        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.consecutive_days, 0);
        for value in [
            stats.completion_rate,
            stats.total_value,
            stats.average_value,
            stats.max_value,
            stats.min_value,
            stats.last_value,
            stats.progress_trend,
            stats.target_reach_rate,
            stats.consistency_score,
        ] {
            assert_eq!(value, 0.0);
        }
        assert_eq!(stats.start_date, TODAY);
        assert_eq!(stats.end_date, TODAY);
        assert_eq!(stats.last_entry_date, Some(TODAY));
        assert_eq!(stats.days_since_last_entry, 0);
    }

    #[test]
    fn missing_or_zero_target_counts_every_entry() {
        let entries = [entry(1, 0, 0.5), entry(2, 1, 2.0)];
        for target in [None, Some(0.0)] {
            let stats = compute_progress_stats(&habit(target), &entries, TODAY);
            assert_eq!(stats.days_target_reached, 2);
            assert_eq!(stats.target_reach_rate, 100.0);
            assert_eq!(stats.completion_rate, 100.0);
        }
    }

    #[test]
    fn trend_compares_later_half_to_earlier_half() {
        let entries = [
            entry(1, 3, 1.0),
            entry(2, 2, 1.0),
            entry(3, 1, 3.0),
            entry(4, 0, 3.0),
        ];
        let stats = compute_progress_stats(&habit(None), &entries, TODAY);
        assert_eq!(stats.progress_trend, 2.0);
        assert!(stats.improvement_detected);
    }

    #[test]
    fn consistency_is_capped() {
        assert_eq!(consistency_score(15), 50.0);
        assert_eq!(consistency_score(60), 100.0);
    }

    #[test]
    fn streak_is_bounded() {
        let dates = (0..400).map(|i| TODAY - Duration::days(i));
        assert_eq!(streak_ending(TODAY, dates), MAX_STREAK_DAYS);
    }

    #[test]
    fn derived_habit_fields() {
        let entries = [entry(1, 0, 2.0), entry(2, 1, 4.0)];
        let derived = habit_with_derived_stats(habit(Some(4.0)), &entries, TODAY);
        assert_eq!(derived.total_progress, Some(2));
        assert_eq!(derived.current_streak, Some(2));
        assert_eq!(derived.average_completion, Some(75.0));
        assert_eq!(derived.last_progress_date, Some(TODAY));
    }

    #[test]
    fn dashboard_counts_today_and_week() {
        let mut paused = habit(None);
        paused.id = 2;
        paused.is_active = false;
        let habits = [habit(None), paused];
        let progress = [entry(1, 0, 1.0), entry(2, 1, 1.0), entry(3, 10, 1.0)];

        let stats = dashboard_stats(&habits, &progress, TODAY);
        assert_eq!(stats.total_habits, 2);
        assert_eq!(stats.active_habits, 1);
        assert_eq!(stats.completed_today, 1);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.weekly_progress, 29);
    }
}
