//! Typed wrappers over the REST endpoints. Each service is a cheap clone of
//! the shared [`HttpClient`](crate::HttpClient).

use serde::Serialize;

mod achievements;
mod auth;
mod habits;
mod progress;
mod statistics;

pub use achievements::AchievementService;
pub use auth::AuthService;
pub use habits::HabitService;
pub use progress::{ProgressService, ProgressSummary, StatsSource};
pub use statistics::StatisticsService;

/// Page size used by the `list_all*` helpers.
const FETCH_ALL_PAGE_SIZE: u32 = 100;

/// Upper bound on pages followed by the `list_all*` helpers.
const MAX_PAGES: u32 = 1_000;

/// `?days=N` window shared by the statistics endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
struct DaysQuery {
    days: u32,
}
