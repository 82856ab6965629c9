use std::sync::Arc;

use serde_json::json;

use crate::models::credit::{CreditRequest, CreditRequestPayload, CreditVersion};
use crate::services::api_client::{ApiClient, ApiError};

pub struct CreditClient {
    api: Arc<ApiClient>,
}

impl CreditClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn create(&self, payload: &CreditRequestPayload, token: &str) -> Result<(), ApiError> {
        self.api.post_unit("/credits", token, payload).await
    }

    /// Requests submitted by the signed-in user.
    pub async fn mine(&self, token: &str) -> Result<Vec<CreditRequest>, ApiError> {
        self.api.get("/credits/user", token).await
    }

    /// Requests awaiting an admin decision.
    pub async fn pending(&self, token: &str) -> Result<Vec<CreditRequest>, ApiError> {
        self.api.get("/credits/pending", token).await
    }

    pub async fn get(&self, id: i64, token: &str) -> Result<CreditRequest, ApiError> {
        self.api.get(&format!("/credits/{id}"), token).await
    }

    pub async fn versions(&self, id: i64, token: &str) -> Result<Vec<CreditVersion>, ApiError> {
        self.api.get(&format!("/credits/{id}/versions"), token).await
    }

    pub async fn approve(&self, id: i64, token: &str) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/credits/{id}/approve"), token, None::<&()>)
            .await
    }

    pub async fn reject(&self, id: i64, token: &str) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/credits/{id}/reject"), token, None::<&()>)
            .await
    }

    /// Open a revision cycle with a note for the requester.
    pub async fn request_revision(&self, id: i64, note: &str, token: &str) -> Result<(), ApiError> {
        self.api
            .post_unit(&format!("/credits/{id}/revision"), token, &json!({ "note": note }))
            .await
    }

    /// Resubmit an amended payload against an open revision, producing the
    /// next version of the request.
    pub async fn resolve(
        &self,
        id: i64,
        payload: &CreditRequestPayload,
        token: &str,
    ) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/credits/{id}/resolve"), token, Some(payload))
            .await
    }
}
