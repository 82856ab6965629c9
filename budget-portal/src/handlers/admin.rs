//! Admin reference-data screens: user management, key-account upserts, and
//! the department directory.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use portal_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::department::Department;
use crate::models::key_account::KeyAccountUpsert;
use crate::models::user::{AdminUser, ManagedUser, UserProfile};
use crate::reconcile::format_amount;
use crate::services::api_client::ApiError;
use crate::AppState;

/// `/admin` itself is just the pending-credits queue.
pub async fn admin_home() -> impl IntoResponse {
    Redirect::to("/admin/credits")
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub users: Vec<ManagedUser>,
    pub departments: Vec<Department>,
    pub error: String,
}

pub async fn users_page(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (users, error) = match state.users.list(&user.access_token).await {
        Ok(users) => (users, String::new()),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    // Department options for the assignment dropdowns; a failure leaves the
    // dropdowns empty but the user table still renders.
    let departments = match state.departments.list(&user.access_token).await {
        Ok(departments) => departments,
        Err(err) => {
            tracing::warn!(error = %err, "department fetch failed for user admin");
            Vec::new()
        }
    };

    Ok(AdminUsersTemplate {
        user: profile,
        current_page: "admin-users",
        users,
        departments,
        error,
    }
    .into_response())
}

#[derive(Deserialize)]
pub struct RoleForm {
    pub role: String,
}

pub async fn set_user_role(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> Result<Response, AppError> {
    state
        .users
        .set_role(id, &form.role, &user.access_token)
        .await?;
    tracing::info!(user_id = id, role = %form.role, admin = %user.email, "user role changed");
    Ok(Redirect::to("/admin/users").into_response())
}

#[derive(Deserialize)]
pub struct DepartmentAssignForm {
    pub department_id: String,
}

pub async fn set_user_department(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
    Form(form): Form<DepartmentAssignForm>,
) -> Result<Response, AppError> {
    let Ok(department_id) = form.department_id.parse::<i64>() else {
        return Ok(Redirect::to("/admin/users").into_response());
    };

    state
        .users
        .set_department(id, department_id, &user.access_token)
        .await?;
    tracing::info!(user_id = id, department_id, admin = %user.email, "user department changed");
    Ok(Redirect::to("/admin/users").into_response())
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.users.delete(id, &user.access_token).await?;
    tracing::info!(user_id = id, admin = %user.email, "user deleted");
    Ok(Redirect::to("/admin/users").into_response())
}

// ---------------------------------------------------------------------------
// Key accounts
// ---------------------------------------------------------------------------

pub struct KeyAccountRow {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub total: String,
    pub used: String,
    pub available: String,
    pub percent: u32,
}

#[derive(Template)]
#[template(path = "admin_key_accounts.html")]
pub struct AdminKeyAccountsTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub rows: Vec<KeyAccountRow>,
    pub error: String,
}

pub async fn key_accounts_page(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (rows, error) = match state.key_accounts.usage(&user.access_token).await {
        Ok(accounts) => (
            accounts
                .iter()
                .map(|account| KeyAccountRow {
                    id: account.id,
                    name: account.name.clone(),
                    account_type: account.account_type.clone(),
                    total: format_amount(account.total_budget.unwrap_or(0.0)),
                    used: format_amount(account.used_amount.unwrap_or(0.0)),
                    available: format_amount(account.available()),
                    percent: account.used_percent(),
                })
                .collect(),
            String::new(),
        ),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    Ok(AdminKeyAccountsTemplate {
        user: profile,
        current_page: "admin-key-accounts",
        rows,
        error,
    }
    .into_response())
}

#[derive(Deserialize)]
pub struct KeyAccountForm {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub total_budget: String,
}

pub async fn upsert_key_account(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Form(form): Form<KeyAccountForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Account name is required".to_string()));
    }
    let Ok(total_budget) = form.total_budget.trim().parse::<f64>() else {
        return Err(AppError::BadRequest(
            "Total budget must be a number".to_string(),
        ));
    };

    let payload = KeyAccountUpsert {
        id: form.id.trim().parse::<i64>().ok(),
        name: name.to_string(),
        account_type: form.account_type.trim().to_string(),
        total_budget,
    };

    state
        .key_accounts
        .upsert(&payload, &user.access_token)
        .await?;
    tracing::info!(account = %payload.name, admin = %user.email, "key account upserted");
    Ok(Redirect::to("/admin/key-accounts").into_response())
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "admin_departments.html")]
pub struct AdminDepartmentsTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub departments: Vec<Department>,
    pub error: String,
}

pub async fn departments_page(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (departments, error) = match state.departments.list(&user.access_token).await {
        Ok(departments) => (departments, String::new()),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    Ok(AdminDepartmentsTemplate {
        user: profile,
        current_page: "admin-departments",
        departments,
        error,
    }
    .into_response())
}
