use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::models::user::UserProfile;
use crate::services::api_client::{ApiClient, ApiError};

/// Response of `POST /auth/login` and `POST /auth/verify-otp`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.api
            .post(
                "/auth/login",
                None,
                &json!({ "email": email, "password": password }),
            )
            .await
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .api
            .post(
                "/auth/register",
                None,
                &json!({ "email": email, "password": password, "name": name }),
            )
            .await?;
        Ok(())
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<LoginResponse, ApiError> {
        self.api
            .post(
                "/auth/verify-otp",
                None,
                &json!({ "email": email, "otp": code }),
            )
            .await
    }

    pub async fn profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.api.get("/auth/profile", token).await
    }
}
