use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    #[serde(default)]
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

fn default_role() -> String {
    ROLE_USER.to_string()
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.email.split('@').next().unwrap_or("User").to_string()
    }

    pub fn initials(&self) -> String {
        let name = self.display_name();
        if name.len() >= 2 {
            name[0..2].to_uppercase()
        } else if !name.is_empty() {
            name[0..1].to_uppercase()
        } else {
            "U".to_string()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Authenticated user context extracted from session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub access_token: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let access_token: Option<String> = session.get("access_token").await.unwrap_or(None);
        let user_id: Option<String> = session.get("user_id").await.unwrap_or(None);
        let email: Option<String> = session.get("email").await.unwrap_or(None);

        match (access_token, user_id, email) {
            (Some(token), Some(uid), Some(email_val)) => {
                let role: Option<String> = session.get("role").await.unwrap_or(None);

                Ok(AuthUser {
                    user_id: uid,
                    email: email_val,
                    role: role.unwrap_or_else(default_role),
                    access_token: token,
                })
            }
            _ => Err(Redirect::to("/login").into_response()),
        }
    }
}

/// Admin-only variant: same session context, but non-admin roles are sent
/// back to their own dashboard instead of the admin area.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(Redirect::to("/dashboard").into_response());
        }
        Ok(AdminUser(user))
    }
}

/// Row shape for the admin user-management table.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ManagedUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub department_name: Option<String>,
}

impl ManagedUser {
    pub fn is_in_department(&self, id: &i64) -> bool {
        self.department_id == Some(*id)
    }

    pub fn department_label(&self) -> String {
        self.department_name
            .clone()
            .unwrap_or_else(|| "Unassigned".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email_prefix() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"email":"finance.lead@example.com"}"#).unwrap();
        assert_eq!(profile.display_name(), "finance.lead");
        assert_eq!(profile.initials(), "FI");
        assert_eq!(profile.role, ROLE_USER);
    }
}
