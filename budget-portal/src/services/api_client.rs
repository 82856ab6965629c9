//! Shared REST client for the budget backend.
//!
//! Every service module goes through this one client so bearer-token
//! attachment, response-envelope normalization, and error-shape extraction
//! live in a single place. A 401 from any endpoint maps to
//! [`ApiError::Unauthorized`], which renders as a redirect to the login
//! screen.

use portal_core::envelope::Envelope;
use portal_core::error::AppError;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Your session has expired. Please sign in again.")]
    Unauthorized,

    /// Error message extracted from the backend response body, surfaced to
    /// the user verbatim.
    #[error("{0}")]
    Message(String),

    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Banner text for the screen that issued the call.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => AppError::Unauthorized("session expired".to_string()),
            ApiError::Message(msg) => AppError::Backend(msg),
            ApiError::Transport(err) => AppError::Backend(format!("Backend unreachable: {err}")),
        }
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        self.send_json(Method::GET, path, Some(token), None::<&()>)
            .await
    }

    pub async fn post<T, B>(&self, path: &str, token: Option<&str>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.send_json(Method::POST, path, token, Some(body)).await
    }

    /// POST where the caller only cares about success, not the body.
    pub async fn post_unit<B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.send_unit(Method::POST, path, Some(token), Some(body))
            .await
    }

    /// PUT where the caller only cares about success, not the body.
    pub async fn put_unit<B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        self.send_unit(Method::PUT, path, Some(token), body).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(), ApiError> {
        self.send_unit(Method::DELETE, path, Some(token), None::<&()>)
            .await
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self.send(method, path, token, body).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.into_inner())
    }

    async fn send_unit<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        self.send(method, path, token, body).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        let mut request = self.http.request(method.clone(), url.as_str());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, %url, error = %e, "backend request failed to send");
            portal_core::observability::metrics::record_backend_request(method.as_str(), "transport");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            portal_core::observability::metrics::record_backend_request(method.as_str(), "error");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = extract_error(response, status).await;
            tracing::warn!(%method, %url, %status, %message, "backend rejected request");
            portal_core::observability::metrics::record_backend_request(method.as_str(), "error");
            return Err(ApiError::Message(message));
        }

        portal_core::observability::metrics::record_backend_request(method.as_str(), "ok");
        Ok(response)
    }
}

/// Pull a human-readable message out of an error body, trying the `error`
/// and `message` keys before falling back to the status line.
async fn extract_error(response: reqwest::Response, status: StatusCode) -> String {
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {status}")),
        Err(_) => format!("Request failed with status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_login_redirecting_error() {
        let app_err: AppError = ApiError::Unauthorized.into();
        assert!(matches!(app_err, AppError::Unauthorized(_)));
    }

    #[test]
    fn message_surfaces_verbatim() {
        let err = ApiError::Message("Department has no budget master".to_string());
        assert_eq!(err.user_message(), "Department has no budget master");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:9000/api/");
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }
}
