use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Routes behind this guard need a signed-in session; anonymous visitors are
/// sent to the login screen.
pub async fn auth_middleware(
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let access_token: Option<String> = session.get("access_token").await.unwrap_or(None);

    if access_token.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    Ok(next.run(request).await)
}

/// Admin-area guard: signed-in non-admins land back on their own dashboard.
pub async fn admin_middleware(
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let role: Option<String> = session.get("role").await.unwrap_or(None);

    match role.as_deref() {
        Some("admin") => Ok(next.run(request).await),
        Some(_) => Ok(Redirect::to("/dashboard").into_response()),
        None => Ok(Redirect::to("/login").into_response()),
    }
}
