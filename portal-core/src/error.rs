use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the bearer token. Rendering this error clears the
    /// screen back to the login page rather than showing a banner.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backend answered with an error body or was unreachable.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Session no longer valid: force navigation to the login screen.
            AppError::Unauthorized(_) => return Redirect::to("/login").into_response(),
            AppError::ValidationError(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Backend(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Html(error_banner(&message))).into_response()
    }
}

/// Inline banner markup shared by error responses and handler-rendered
/// fragments, so every failure path looks the same on screen.
pub fn error_banner(message: &str) -> String {
    format!(
        "<div class='bg-red-500/10 text-red-400 text-sm rounded-xl px-4 py-3' role='alert'>{}</div>",
        html_escape(message)
    )
}

/// Matching banner for success messages.
pub fn success_banner(message: &str) -> String {
    format!(
        "<div class='bg-emerald-500/10 text-emerald-400 text-sm rounded-xl px-4 py-3' role='status'>{}</div>",
        html_escape(message)
    )
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_redirects_to_login() {
        let response = AppError::Unauthorized("expired".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[test]
    fn backend_error_is_bad_gateway() {
        let response = AppError::Backend("credit service down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn banner_escapes_markup() {
        let banner = error_banner("<script>alert(1)</script>");
        assert!(!banner.contains("<script>"));
        assert!(banner.contains("&lt;script&gt;"));
    }
}
