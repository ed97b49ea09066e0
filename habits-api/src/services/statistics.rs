use serde_json::Value;
use tracing::instrument;

use super::DaysQuery;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::UserStatistics;
use crate::normalize::unwrap_entity;

#[derive(Debug, Clone)]
pub struct StatisticsService {
    client: HttpClient,
}

impl StatisticsService {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    #[instrument(name = "StatisticsService::user_statistics", skip(self))]
    pub async fn user_statistics(&self, user_id: i64, days: u32) -> Result<UserStatistics> {
        let raw: Value = self
            .client
            .get_with_query(&format!("users/{user_id}/statistics"), &DaysQuery { days })
            .await?;
        unwrap_entity(raw)
    }
}
