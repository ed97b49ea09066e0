use serde_json::Value;
use tracing::instrument;

use super::{FETCH_ALL_PAGE_SIZE, MAX_PAGES};
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{CreateHabitRequest, Frequency, Habit, HabitCategory, HabitQuery, UpdateHabitRequest};
use crate::normalize::{normalize_list, unwrap_entity, Page, Resource};
use crate::validation;

#[derive(Debug, Clone)]
pub struct HabitService {
    client: HttpClient,
}

impl HabitService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[instrument(name = "HabitService::list", skip(self))]
    pub async fn list(&self, query: &HabitQuery) -> Result<Page<Habit>> {
        let raw: Value = self.client.get_with_query("habits", query).await?;
        normalize_list(raw, Resource::Habit)
    }

    /// Every habit of the current user, following pages until the last one.
    pub async fn list_all(&self) -> Result<Vec<Habit>> {
        let mut habits = Vec::new();
        for page_number in 0..MAX_PAGES {
            let query = HabitQuery {
                page: Some(page_number),
                size: Some(FETCH_ALL_PAGE_SIZE),
                ..Default::default()
            };
            let page = self.list(&query).await?;
            let done = page.ends_paging(page_number);
            habits.extend(page.content);
            if done {
                return Ok(habits);
            }
        }
        tracing::warn!(pages = MAX_PAGES, "stopped following habit pages");
        Ok(habits)
    }

    pub async fn get(&self, id: i64) -> Result<Habit> {
        let raw: Value = self.client.get(&format!("habits/{id}")).await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "HabitService::create", skip(self, request), fields(title = %request.title))]
    pub async fn create(&self, request: &CreateHabitRequest) -> Result<Habit> {
        validation::validate_create_habit(request)?;
        let raw: Value = self.client.post("habits", request).await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "HabitService::update", skip(self, request))]
    pub async fn update(&self, id: i64, request: &UpdateHabitRequest) -> Result<Habit> {
        validation::validate_update_habit(request)?;
        let raw: Value = self.client.put(&format!("habits/{id}"), request).await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "HabitService::delete", skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("habits/{id}")).await
    }

    /// Flip `is_active` server-side and return the updated habit.
    #[instrument(name = "HabitService::toggle", skip(self))]
    pub async fn toggle(&self, id: i64) -> Result<Habit> {
        let raw: Value = self.client.patch(&format!("habits/{id}/toggle")).await?;
        unwrap_entity(raw)
    }

    pub async fn categories(&self) -> Result<Vec<HabitCategory>> {
        self.client.get("habits/categories").await
    }

    pub async fn frequencies(&self) -> Result<Vec<Frequency>> {
        self.client.get("habits/frequencies").await
    }
}
