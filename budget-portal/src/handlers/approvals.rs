//! Admin approval queues: pending credit requests and withdrawals, with
//! approve / reject / request-revision transitions. Actions post plain forms
//! and redirect back to the queue, which re-fetches the fresh state.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use portal_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::user::{AdminUser, UserProfile};
use crate::reconcile::format_amount;
use crate::services::api_client::ApiError;
use crate::utils::format::short_date;
use crate::AppState;

pub struct PendingCreditRow {
    pub id: i64,
    pub department_name: String,
    pub requested_by: String,
    pub version: i64,
    pub total: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "admin_credits.html")]
pub struct AdminCreditsTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub rows: Vec<PendingCreditRow>,
    pub error: String,
}

pub async fn pending_credits(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (rows, error) = match state.credits.pending(&user.access_token).await {
        Ok(requests) => (
            requests
                .iter()
                .map(|request| PendingCreditRow {
                    id: request.id,
                    department_name: request.department_name.clone(),
                    requested_by: request.requested_by.clone(),
                    version: request.version,
                    total: format_amount(request.total_amount()),
                    created_at: short_date(&request.created_at),
                })
                .collect(),
            String::new(),
        ),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    Ok(AdminCreditsTemplate {
        user: profile,
        current_page: "admin-credits",
        rows,
        error,
    }
    .into_response())
}

pub async fn approve_credit(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.credits.approve(id, &user.access_token).await?;
    tracing::info!(credit_id = id, admin = %user.email, "credit request approved");
    Ok(Redirect::to("/admin/credits").into_response())
}

pub async fn reject_credit(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.credits.reject(id, &user.access_token).await?;
    tracing::info!(credit_id = id, admin = %user.email, "credit request rejected");
    Ok(Redirect::to("/admin/credits").into_response())
}

#[derive(Deserialize)]
pub struct RevisionForm {
    #[serde(default)]
    pub note: String,
}

pub async fn request_credit_revision(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
    Form(form): Form<RevisionForm>,
) -> Result<Response, AppError> {
    state
        .credits
        .request_revision(id, form.note.trim(), &user.access_token)
        .await?;
    tracing::info!(credit_id = id, admin = %user.email, "revision requested");
    Ok(Redirect::to("/admin/credits").into_response())
}

pub struct PendingWithdrawalRow {
    pub id: i64,
    pub key_account_name: String,
    pub requested_by: String,
    pub amount: String,
    pub reason: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "admin_withdrawals.html")]
pub struct AdminWithdrawalsTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub rows: Vec<PendingWithdrawalRow>,
    pub error: String,
}

pub async fn pending_withdrawals(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (rows, error) = match state.withdrawals.pending(&user.access_token).await {
        Ok(withdrawals) => (
            withdrawals
                .iter()
                .map(|withdrawal| PendingWithdrawalRow {
                    id: withdrawal.id,
                    key_account_name: withdrawal.key_account_name.clone(),
                    requested_by: withdrawal.requested_by.clone(),
                    amount: format_amount(withdrawal.amount.unwrap_or(0.0)),
                    reason: withdrawal.reason.clone(),
                    created_at: short_date(&withdrawal.created_at),
                })
                .collect(),
            String::new(),
        ),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    Ok(AdminWithdrawalsTemplate {
        user: profile,
        current_page: "admin-withdrawals",
        rows,
        error,
    }
    .into_response())
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.withdrawals.approve(id, &user.access_token).await?;
    tracing::info!(withdrawal_id = id, admin = %user.email, "withdrawal approved");
    Ok(Redirect::to("/admin/withdrawals").into_response())
}

pub async fn reject_withdrawal(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.withdrawals.reject(id, &user.access_token).await?;
    tracing::info!(withdrawal_id = id, admin = %user.email, "withdrawal rejected");
    Ok(Redirect::to("/admin/withdrawals").into_response())
}
