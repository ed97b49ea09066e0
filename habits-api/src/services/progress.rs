use serde_json::{Map, Value};
use time::Date;
use tracing::instrument;

use super::{DaysQuery, FETCH_ALL_PAGE_SIZE, MAX_PAGES};
use crate::error::{ApiError, Result};
use crate::http::HttpClient;
use crate::models::{
    CreateProgressRequest, Habit, PageQuery, Progress, ProgressStats, UpdateProgressRequest,
};
use crate::normalize::{normalize_list, unwrap_entities, unwrap_entity, Page, Resource};
use crate::stats::compute_progress_stats;
use crate::validation;

/// Free-form counters from GET /users/:id/progress/summary.
pub type ProgressSummary = Map<String, Value>;

/// Where a [`ProgressStats`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Backend,
    /// Computed locally because the backend call failed.
    Local,
}

#[derive(Debug, Clone)]
pub struct ProgressService {
    client: HttpClient,
}

impl ProgressService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: i64) -> Result<Progress> {
        let raw: Value = self.client.get(&format!("progress/{id}")).await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "ProgressService::update", skip(self, request))]
    pub async fn update(&self, id: i64, request: &UpdateProgressRequest) -> Result<Progress> {
        validation::validate_update_progress(request)?;
        let raw: Value = self.client.put(&format!("progress/{id}"), request).await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "ProgressService::delete", skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("progress/{id}")).await
    }

    #[instrument(name = "ProgressService::list_for_habit", skip(self))]
    pub async fn list_for_habit(&self, habit_id: i64, query: PageQuery) -> Result<Page<Progress>> {
        let raw: Value = self
            .client
            .get_with_query(&format!("habits/{habit_id}/progress"), &query)
            .await?;
        normalize_list(raw, Resource::Progress)
    }

    /// Every entry of one habit, following pages until the last one.
    pub async fn list_all_for_habit(&self, habit_id: i64) -> Result<Vec<Progress>> {
        let mut entries = Vec::new();
        for page_number in 0..MAX_PAGES {
            let page = self
                .list_for_habit(habit_id, PageQuery::new(page_number, FETCH_ALL_PAGE_SIZE))
                .await?;
            let done = page.ends_paging(page_number);
            entries.extend(page.content);
            if done {
                return Ok(entries);
            }
        }
        tracing::warn!(habit_id, pages = MAX_PAGES, "stopped following progress pages");
        Ok(entries)
    }

    #[instrument(name = "ProgressService::create", skip(self, request), fields(date = %request.date))]
    pub async fn create(&self, habit_id: i64, request: &CreateProgressRequest) -> Result<Progress> {
        validation::validate_create_progress(request)?;
        let raw: Value = self
            .client
            .post(&format!("habits/{habit_id}/progress"), request)
            .await?;
        unwrap_entity(raw)
    }

    /// Authoritative statistics over the last `days` days.
    #[instrument(name = "ProgressService::stats", skip(self))]
    pub async fn stats(&self, habit_id: i64, days: u32) -> Result<ProgressStats> {
        let raw: Value = self
            .client
            .get_with_query(&format!("habits/{habit_id}/progress/stats"), &DaysQuery { days })
            .await?;
        unwrap_entity(raw)
    }

    /// Backend statistics, or statistics computed from the habit's entries
    /// when the backend call fails. A terminated session is not papered over.
    pub async fn stats_or_fallback(
        &self,
        habit: &Habit,
        days: u32,
        today: Date,
    ) -> Result<(ProgressStats, StatsSource)> {
        match self.stats(habit.id, days).await {
            Ok(stats) => Ok((stats, StatsSource::Backend)),
            Err(e @ (ApiError::AuthExpired | ApiError::RefreshFailed(_))) => Err(e),
            Err(e) => {
                tracing::warn!(habit_id = habit.id, error = %e, "statistics endpoint failed, computing locally");
                let entries = self.list_all_for_habit(habit.id).await?;
                Ok((compute_progress_stats(habit, &entries, today), StatsSource::Local))
            }
        }
    }

    pub async fn list_for_user(&self, user_id: i64, query: PageQuery) -> Result<Page<Progress>> {
        let raw: Value = self
            .client
            .get_with_query(&format!("users/{user_id}/progress"), &query)
            .await?;
        normalize_list(raw, Resource::Progress)
    }

    pub async fn today(&self, user_id: i64) -> Result<Vec<Progress>> {
        let raw: Value = self
            .client
            .get(&format!("users/{user_id}/progress/today"))
            .await?;
        unwrap_entities(raw)
    }

    pub async fn summary(&self, user_id: i64, days: u32) -> Result<ProgressSummary> {
        self.client
            .get_with_query(&format!("users/{user_id}/progress/summary"), &DaysQuery { days })
            .await
    }
}
