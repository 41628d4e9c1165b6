use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    api::{ListFilters, Page},
    error::{ClientError, Result},
    http::{HttpClient, RequestBody, query_pairs},
    models::{DataEnvelope, ListEnvelope, Review},
};

const REVIEWS_PATH: &str = "/reviews";
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ReviewFilters {
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }
}

impl ListFilters for ReviewFilters {
    fn limit(&self) -> Option<usize> {
        self.limit.map(|limit| limit as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub project_id: String,
    pub name: String,
    pub rating: u8,
    pub comment: String,
}

impl ReviewDraft {
    /// Local checks run before the review is sent.
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(ClientError::validation("Please choose a project to review"));
        }
        if self.rating == 0 {
            return Err(ClientError::validation("Please select a rating"));
        }
        if self.rating > MAX_RATING {
            return Err(ClientError::validation(format!(
                "Rating must be between 1 and {MAX_RATING}"
            )));
        }
        if self.comment.trim().is_empty() {
            return Err(ClientError::validation("Please enter a comment"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ReviewsApi {
    http: HttpClient,
}

impl ReviewsApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, filters: &ReviewFilters) -> Result<Page<Review>> {
        let query = query_pairs(filters)?;
        let envelope: ListEnvelope<Review> = self.http.get(REVIEWS_PATH, &query).await?;
        Ok(envelope.into())
    }

    pub async fn create(&self, draft: &ReviewDraft) -> Result<Review> {
        draft.validate()?;
        let envelope: DataEnvelope<Review> = self
            .http
            .post(REVIEWS_PATH, RequestBody::json(draft)?)
            .await?;
        debug!(review = %envelope.data.id, project = %draft.project_id, "submitted review");
        Ok(envelope.data)
    }

    /// Admin-only on the backend.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::validation("review id is required"));
        }
        let _: Value = self.http.delete(&format!("{REVIEWS_PATH}/{id}")).await?;
        Ok(())
    }
}
