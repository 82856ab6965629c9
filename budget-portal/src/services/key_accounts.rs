use std::sync::Arc;

use crate::models::key_account::{KeyAccount, KeyAccountUpsert};
use crate::services::api_client::{ApiClient, ApiError};

pub struct KeyAccountClient {
    api: Arc<ApiClient>,
}

impl KeyAccountClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<KeyAccount>, ApiError> {
        self.api.get("/key-accounts", token).await
    }

    /// Catalog enriched with `used_amount`/`available_amount`.
    pub async fn list_with_usage(&self, token: &str) -> Result<Vec<KeyAccount>, ApiError> {
        self.api.get("/key-accounts/usage/all", token).await
    }

    pub async fn upsert(&self, payload: &KeyAccountUpsert, token: &str) -> Result<(), ApiError> {
        self.api.post_unit("/key-accounts", token, payload).await
    }
}
