use std::sync::Arc;

use crate::models::budget::BudgetMasterRow;
use crate::services::api_client::{ApiClient, ApiError};

pub struct BudgetClient {
    api: Arc<ApiClient>,
}

impl BudgetClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Budget-master rows scoped to one department (the primary source for
    /// the credit-request entry table).
    pub async fn department_rows(
        &self,
        department_id: i64,
        token: &str,
    ) -> Result<Vec<BudgetMasterRow>, ApiError> {
        self.api
            .get(&format!("/credits/budget-master/department/{department_id}"), token)
            .await
    }

    /// The full budget-master table, used as a client-side-filtered fallback
    /// when the department-scoped endpoint comes back empty.
    pub async fn all_rows(&self, token: &str) -> Result<Vec<BudgetMasterRow>, ApiError> {
        self.api.get("/credits/budget-master", token).await
    }
}
