use askama::Template;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect},
    Form,
};
use portal_core::error::{error_banner, success_banner};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {}

#[derive(Template)]
#[template(path = "verify_otp.html")]
pub struct VerifyOtpTemplate {
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct OtpPageParams {
    pub email: Option<String>,
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {}
}

pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {}
}

pub async fn verify_otp_page(Query(params): Query<OtpPageParams>) -> impl IntoResponse {
    VerifyOtpTemplate {
        email: params.email.unwrap_or_default(),
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> impl IntoResponse {
    // Validation failures never leave the portal.
    if payload.validate().is_err() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(error_banner("Enter a valid email and password")),
        )
            .into_response();
    }

    match state.auth.login(&payload.email, &payload.password).await {
        Ok(login) => match state.auth.establish_session(&session, login).await {
            Ok(profile) => {
                let target = if profile.is_admin() { "/admin" } else { "/dashboard" };
                let mut headers = HeaderMap::new();
                headers.insert("HX-Redirect", target.parse().unwrap());
                (StatusCode::OK, headers, "").into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to establish session after login");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(error_banner("Authentication error")),
                )
                    .into_response()
            }
        },
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(error_banner(&err.user_message())),
        )
            .into_response(),
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(err) = payload.validate() {
        tracing::debug!(error = %err, "registration form failed validation");
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(error_banner(
                "Registration needs a valid email, a name, and a password of at least 8 characters",
            )),
        )
            .into_response();
    }

    match state
        .auth
        .register(&payload.email, &payload.password, &payload.name)
        .await
    {
        Ok(()) => {
            let mut headers = HeaderMap::new();
            let target = format!("/verify-otp?email={}", payload.email);
            headers.insert("HX-Redirect", target.parse().unwrap());
            (StatusCode::OK, headers, "").into_response()
        }
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(error_banner(&err.user_message())),
        )
            .into_response(),
    }
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<VerifyOtpRequest>,
) -> impl IntoResponse {
    match state.auth.verify_otp(&payload.email, &payload.otp).await {
        Ok(login) => match state.auth.establish_session(&session, login).await {
            Ok(_) => {
                let mut headers = HeaderMap::new();
                headers.insert("HX-Redirect", "/dashboard".parse().unwrap());
                (StatusCode::OK, headers, "").into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to establish session after OTP verification");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(error_banner("Authentication error")),
                )
                    .into_response()
            }
        },
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(error_banner(&err.user_message())),
        )
            .into_response(),
    }
}

pub async fn logout_handler(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    state.auth.logout(&session).await;
    Redirect::to("/login")
}

// Used by the verify-otp page to show a resend hint without a backend round
// trip; kept as a fragment so the page can swap it in place.
pub async fn otp_hint_fragment() -> impl IntoResponse {
    Html(success_banner(
        "A one-time code was sent to your email. It is valid for 10 minutes.",
    ))
}
