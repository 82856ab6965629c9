use std::sync::Arc;

use crate::models::withdrawal::{Withdrawal, WithdrawalPayload};
use crate::services::api_client::{ApiClient, ApiError};

pub struct WithdrawalClient {
    api: Arc<ApiClient>,
}

impl WithdrawalClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn create(&self, payload: &WithdrawalPayload, token: &str) -> Result<(), ApiError> {
        self.api.post_unit("/withdrawals", token, payload).await
    }

    pub async fn mine(&self, token: &str) -> Result<Vec<Withdrawal>, ApiError> {
        self.api.get("/withdrawals/user", token).await
    }

    pub async fn pending(&self, token: &str) -> Result<Vec<Withdrawal>, ApiError> {
        self.api.get("/withdrawals/pending", token).await
    }

    pub async fn approve(&self, id: i64, token: &str) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/withdrawals/{id}/approve"), token, None::<&()>)
            .await
    }

    pub async fn reject(&self, id: i64, token: &str) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/withdrawals/{id}/reject"), token, None::<&()>)
            .await
    }
}
