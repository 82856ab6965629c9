use std::sync::Arc;

use crate::models::department::Department;
use crate::services::api_client::{ApiClient, ApiError};

pub struct DepartmentClient {
    api: Arc<ApiClient>,
}

impl DepartmentClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, token: &str) -> Result<Vec<Department>, ApiError> {
        self.api.get("/departments", token).await
    }

    pub async fn get(&self, id: i64, token: &str) -> Result<Department, ApiError> {
        self.api.get(&format!("/departments/{id}"), token).await
    }
}
