use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use portal_core::middleware::{
    metrics::metrics_middleware, request_id::request_id_middleware,
    security_headers::security_headers_middleware,
};
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{admin, app, approvals, auth, credits, dashboard, metrics, withdrawals};
use crate::middleware::auth::{admin_middleware, auth_middleware};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let user_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route("/credits", get(credits::list_mine))
        .route("/credits/new", get(credits::new_page_user))
        .route("/credits/new/editor", get(credits::editor_user))
        .route(
            "/credits/new/department",
            post(credits::select_department_user),
        )
        .route(
            "/credits/new/entries/:index",
            post(credits::update_entry_user),
        )
        .route("/credits/new/accounts", post(credits::add_account_user))
        .route(
            "/credits/new/accounts/:index/remove",
            post(credits::remove_account_user),
        )
        .route("/credits/new/submit", post(credits::submit_user))
        .route("/credits/:id", get(credits::detail_user))
        .route("/credits/:id/resolve", get(credits::start_resolution))
        .route("/withdrawals", get(withdrawals::list_mine))
        .route(
            "/withdrawals/new",
            get(withdrawals::new_page).post(withdrawals::create),
        )
        .layer(from_fn(auth_middleware));

    let admin_routes = Router::new()
        .route("/", get(admin::admin_home))
        .route("/credits", get(approvals::pending_credits))
        .route("/credits/new", get(credits::new_page_admin))
        .route("/credits/new/editor", get(credits::editor_admin))
        .route(
            "/credits/new/department",
            post(credits::select_department_admin),
        )
        .route(
            "/credits/new/entries/:index",
            post(credits::update_entry_admin),
        )
        .route("/credits/new/accounts", post(credits::add_account_admin))
        .route(
            "/credits/new/accounts/:index/remove",
            post(credits::remove_account_admin),
        )
        .route("/credits/new/submit", post(credits::submit_admin))
        .route("/credits/:id", get(credits::detail_admin))
        .route("/credits/:id/approve", post(approvals::approve_credit))
        .route("/credits/:id/reject", post(approvals::reject_credit))
        .route(
            "/credits/:id/revision",
            post(approvals::request_credit_revision),
        )
        .route("/withdrawals", get(approvals::pending_withdrawals))
        .route(
            "/withdrawals/:id/approve",
            post(approvals::approve_withdrawal),
        )
        .route(
            "/withdrawals/:id/reject",
            post(approvals::reject_withdrawal),
        )
        .route("/users", get(admin::users_page))
        .route("/users/:id/role", post(admin::set_user_role))
        .route("/users/:id/department", post(admin::set_user_department))
        .route("/users/:id/delete", post(admin::delete_user))
        .route(
            "/key-accounts",
            get(admin::key_accounts_page).post(admin::upsert_key_account),
        )
        .route("/departments", get(admin::departments_page))
        .layer(from_fn(admin_middleware))
        .layer(from_fn(auth_middleware));

    Router::new()
        .route("/", get(app::index))
        .route("/health", get(app::health_check))
        .route("/metrics", get(metrics::metrics))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_handler),
        )
        .route(
            "/verify-otp",
            get(auth::verify_otp_page).post(auth::verify_otp_handler),
        )
        .route("/verify-otp/hint", get(auth::otp_hint_fragment))
        .route("/logout", get(auth::logout_handler))
        .merge(user_routes)
        .nest("/admin", admin_routes)
        .nest_service("/static", ServeDir::new("budget-portal/static"))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state)
}
