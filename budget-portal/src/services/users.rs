use std::sync::Arc;

use serde_json::json;

use crate::models::user::ManagedUser;
use crate::services::api_client::{ApiClient, ApiError};

pub struct UserClient {
    api: Arc<ApiClient>,
}

impl UserClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<ManagedUser>, ApiError> {
        self.api.get("/users", token).await
    }

    pub async fn set_role(&self, id: i64, role: &str, token: &str) -> Result<(), ApiError> {
        self.api
            .put_unit(&format!("/users/{id}/role"), token, Some(&json!({ "role": role })))
            .await
    }

    pub async fn set_department(
        &self,
        id: i64,
        department_id: i64,
        token: &str,
    ) -> Result<(), ApiError> {
        self.api
            .put_unit(
                &format!("/users/{id}/department"),
                token,
                Some(&json!({ "department_id": department_id })),
            )
            .await
    }

    pub async fn delete(&self, id: i64, token: &str) -> Result<(), ApiError> {
        self.api.delete(&format!("/users/{id}"), token).await
    }
}
