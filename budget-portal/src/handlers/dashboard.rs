use askama::Template;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;

use crate::models::user::{AuthUser, UserProfile};
use crate::utils::format::short_date;
use crate::AppState;

pub struct UsageRow {
    pub name: String,
    pub account_type: String,
    pub used: String,
    pub total: String,
    pub available: String,
    pub percent: u32,
}

pub struct RequestRow {
    pub id: i64,
    pub label: String,
    pub status: String,
    pub status_class: &'static str,
    pub amount: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub usage: Vec<UsageRow>,
    pub recent_credits: Vec<RequestRow>,
    pub recent_withdrawals: Vec<RequestRow>,
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    session: Session,
    auth_user: AuthUser,
) -> impl IntoResponse {
    let user = state.auth.current_profile(&session, &auth_user).await;

    // Optional enrichments: each failure degrades its own card and is
    // logged, the dashboard still renders.
    let usage = match state.key_accounts.usage(&auth_user.access_token).await {
        Ok(accounts) => accounts
            .iter()
            .map(|account| UsageRow {
                name: account.name.clone(),
                account_type: account.account_type.clone(),
                used: crate::reconcile::format_amount(account.used_amount.unwrap_or(0.0)),
                total: crate::reconcile::format_amount(account.total_budget.unwrap_or(0.0)),
                available: crate::reconcile::format_amount(account.available()),
                percent: account.used_percent(),
            })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch key-account usage for dashboard");
            Vec::new()
        }
    };

    let recent_credits = match state.credits.mine(&auth_user.access_token).await {
        Ok(requests) => requests
            .iter()
            .take(5)
            .map(|request| RequestRow {
                id: request.id,
                label: request.department_name.clone(),
                status: request.status.clone(),
                status_class: request.status_class(),
                amount: crate::reconcile::format_amount(request.total_amount()),
                created_at: short_date(&request.created_at),
            })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch credit requests for dashboard");
            Vec::new()
        }
    };

    let recent_withdrawals = match state.withdrawals.mine(&auth_user.access_token).await {
        Ok(withdrawals) => withdrawals
            .iter()
            .take(5)
            .map(|withdrawal| RequestRow {
                id: withdrawal.id,
                label: withdrawal.key_account_name.clone(),
                status: withdrawal.status.clone(),
                status_class: withdrawal.status_class(),
                amount: crate::reconcile::format_amount(withdrawal.amount.unwrap_or(0.0)),
                created_at: short_date(&withdrawal.created_at),
            })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to fetch withdrawals for dashboard");
            Vec::new()
        }
    };

    DashboardTemplate {
        user,
        current_page: "dashboard",
        usage,
        recent_credits,
        recent_withdrawals,
    }
}
