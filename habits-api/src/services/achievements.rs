use serde_json::Value;
use tracing::instrument;

use super::DaysQuery;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{Achievement, AchievementCheckRequest, AchievementCheckResponse, AchievementSummary, PageQuery};
use crate::normalize::{normalize_list, unwrap_entities, unwrap_entity, Page, Resource};

/// Achievements are unlocked server-side; the client only reads them and
/// asks for a re-check after recording progress.
#[derive(Debug, Clone)]
pub struct AchievementService {
    client: HttpClient,
}

impl AchievementService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn list_for_user(&self, user_id: i64, query: PageQuery) -> Result<Page<Achievement>> {
        let raw: Value = self
            .client
            .get_with_query(&format!("users/{user_id}/achievements"), &query)
            .await?;
        normalize_list(raw, Resource::Achievement)
    }

    pub async fn recent(&self, user_id: i64, days: u32) -> Result<Vec<Achievement>> {
        let raw: Value = self
            .client
            .get_with_query(&format!("users/{user_id}/achievements/recent"), &DaysQuery { days })
            .await?;
        unwrap_entities(raw)
    }

    pub async fn summary(&self, user_id: i64) -> Result<AchievementSummary> {
        let raw: Value = self
            .client
            .get(&format!("users/{user_id}/achievements/summary"))
            .await?;
        unwrap_entity(raw)
    }

    #[instrument(name = "AchievementService::check", skip(self))]
    pub async fn check(&self, request: &AchievementCheckRequest) -> Result<AchievementCheckResponse> {
        self.client.post("achievements/check", request).await
    }

    pub async fn types(&self) -> Result<Vec<String>> {
        self.client.get("achievements/types").await
    }
}
