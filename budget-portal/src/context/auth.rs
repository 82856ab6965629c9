//! Session-backed auth context.
//!
//! Owns the mapping between the external auth API and the portal session:
//! the session carries the bearer token plus a cached copy of the profile,
//! restored on every request by the `AuthUser` extractor. This replaces the
//! browser-local-storage `token`/`user` pair of a client-rendered app.

use std::sync::Arc;

use anyhow::Result;
use tower_sessions::Session;

use crate::models::user::{AuthUser, UserProfile};
use crate::services::api_client::ApiError;
use crate::services::auth::{AuthClient, LoginResponse};
use crate::utils::jwt::decode_jwt_claims;

pub const SESSION_TOKEN: &str = "access_token";
pub const SESSION_USER: &str = "user";

pub struct AuthContext {
    auth: Arc<AuthClient>,
}

impl AuthContext {
    pub fn new(auth: Arc<AuthClient>) -> Self {
        Self { auth }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.auth.login(email, password).await
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<(), ApiError> {
        self.auth.register(email, password, name).await
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<LoginResponse, ApiError> {
        self.auth.verify_otp(email, code).await
    }

    /// Store the freshly issued token and the resolved profile in the
    /// session. Profile resolution prefers the login response's embedded
    /// user, falls back to token claims, and is then refreshed from
    /// `GET /auth/profile`; a failed refresh degrades to the claims copy.
    pub async fn establish_session(
        &self,
        session: &Session,
        login: LoginResponse,
    ) -> Result<UserProfile> {
        let mut profile = match login.user {
            Some(user) => user,
            None => profile_from_token(&login.token)?,
        };

        match self.auth.profile(&login.token).await {
            Ok(resolved) => profile = resolved,
            Err(err) => {
                tracing::warn!(error = %err, "profile fetch failed after login, using token claims");
            }
        }

        session.insert(SESSION_TOKEN, &login.token).await?;
        session.insert("user_id", profile.id.to_string()).await?;
        session.insert("email", &profile.email).await?;
        session.insert("role", &profile.role).await?;
        session.insert(SESSION_USER, &profile).await?;

        tracing::info!(
            user_id = profile.id,
            email = %profile.email,
            role = %profile.role,
            "User logged in successfully"
        );

        Ok(profile)
    }

    /// Profile for the current request: live from the backend when possible,
    /// else the session copy, else a minimal profile from the session keys.
    pub async fn current_profile(&self, session: &Session, user: &AuthUser) -> UserProfile {
        match self.auth.profile(&user.access_token).await {
            Ok(profile) => {
                if let Err(err) = session.insert(SESSION_USER, &profile).await {
                    tracing::warn!(error = %err, "failed to refresh session profile copy");
                }
                profile
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile fetch failed, falling back to session copy");
                session
                    .get::<UserProfile>(SESSION_USER)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| UserProfile {
                        id: user.user_id.parse().unwrap_or(0),
                        email: user.email.clone(),
                        name: String::new(),
                        role: user.role.clone(),
                        department_id: None,
                        department_name: None,
                        verified: false,
                    })
            }
        }
    }

    /// Teardown: drop everything the session holds, tokens included.
    pub async fn logout(&self, session: &Session) {
        session.clear().await;
    }
}

fn profile_from_token(token: &str) -> Result<UserProfile> {
    let claims = decode_jwt_claims(token)?;
    Ok(UserProfile {
        id: claims.sub.parse().unwrap_or(0),
        email: claims.email,
        name: String::new(),
        role: claims.role.unwrap_or_else(|| "user".to_string()),
        department_id: claims.department_id,
        department_name: None,
        verified: true,
    })
}
