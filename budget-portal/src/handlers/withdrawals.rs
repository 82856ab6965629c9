use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use portal_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::user::{AuthUser, UserProfile};
use crate::models::withdrawal::WithdrawalPayload;
use crate::reconcile::format_amount;
use crate::services::api_client::ApiError;
use crate::utils::format::short_date;
use crate::AppState;

pub struct WithdrawalRow {
    pub id: i64,
    pub key_account_name: String,
    pub amount: String,
    pub reason: String,
    pub status: String,
    pub status_class: &'static str,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "withdrawals_list.html")]
pub struct WithdrawalsListTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub rows: Vec<WithdrawalRow>,
    pub error: String,
}

pub async fn list_mine(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (rows, error) = match state.withdrawals.mine(&user.access_token).await {
        Ok(withdrawals) => (
            withdrawals
                .iter()
                .map(|withdrawal| WithdrawalRow {
                    id: withdrawal.id,
                    key_account_name: withdrawal.key_account_name.clone(),
                    amount: format_amount(withdrawal.amount.unwrap_or(0.0)),
                    reason: withdrawal.reason.clone(),
                    status: withdrawal.status.clone(),
                    status_class: withdrawal.status_class(),
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

    Ok(WithdrawalsListTemplate {
        user: profile,
        current_page: "withdrawals",
        rows,
        error,
    }
    .into_response())
}

pub struct AccountChoice {
    pub id: i64,
    pub label: String,
    pub available: String,
}

#[derive(Template)]
#[template(path = "withdrawal_new.html")]
pub struct WithdrawalNewTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub accounts: Vec<AccountChoice>,
    pub error: String,
}

async fn account_choices(state: &AppState, token: &str) -> Vec<AccountChoice> {
    // Prefer the usage-enriched list so the form can show what is left on
    // each account; degrade to the plain catalog.
    let accounts = match state.key_accounts.usage(token).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "usage fetch failed for withdrawal form");
            state.key_accounts.accounts(token).await.unwrap_or_default()
        }
    };

    accounts
        .iter()
        .map(|account| AccountChoice {
            id: account.id,
            label: account.name.clone(),
            available: format_amount(account.available()),
        })
        .collect()
}

pub async fn new_page(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;
    let accounts = account_choices(&state, &user.access_token).await;

    Ok(WithdrawalNewTemplate {
        user: profile,
        current_page: "withdrawals",
        accounts,
        error: String::new(),
    }
    .into_response())
}

#[derive(Deserialize)]
pub struct WithdrawalForm {
    pub key_account_id: String,
    pub amount: String,
    #[serde(default)]
    pub reason: String,
}

async fn render_form(
    state: AppState,
    session: Session,
    user: AuthUser,
    error: String,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;
    let accounts = account_choices(&state, &user.access_token).await;
    Ok(WithdrawalNewTemplate {
        user: profile,
        current_page: "withdrawals",
        accounts,
        error,
    }
    .into_response())
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(form): Form<WithdrawalForm>,
) -> Result<Response, AppError> {
    // Validation failures re-render the form without touching the backend.
    let Ok(key_account_id) = form.key_account_id.parse::<i64>() else {
        return render_form(state, session, user, "Please choose a key account".to_string()).await;
    };

    let amount = match form.amount.trim().parse::<f64>() {
        Ok(value) if value > 0.0 => value,
        _ => {
            return render_form(
                state,
                session,
                user,
                "Please enter a positive amount".to_string(),
            )
            .await;
        }
    };

    let payload = WithdrawalPayload {
        key_account_id,
        amount,
        reason: form.reason.trim().to_string(),
        status: "pending".to_string(),
    };

    match state.withdrawals.create(&payload, &user.access_token).await {
        Ok(()) => Ok(Redirect::to("/withdrawals").into_response()),
        Err(ApiError::Unauthorized) => {
            Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => {
            let message = err.user_message();
            render_form(state, session, user, message).await
        }
    }
}
