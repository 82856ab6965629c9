//! Credit-request screens: the draft editor (self-service and admin
//! variants), the request list, the detail view, and the revision-resolve
//! flow. The editor state lives in the session as a [`CreditDraft`]; every
//! mutation endpoint re-renders the editor fragment for HTMX to swap in.

use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use portal_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::key_account::KeyAccount;
use crate::models::user::{AdminUser, AuthUser, UserProfile};
use crate::reconcile::{
    self, AccountSources, AmountPolicy, CreditDraft, SubmitMode,
};
use crate::services::api_client::ApiError;
use crate::utils::format::short_date;
use crate::AppState;

/// Which of the two creation screens an editor endpoint serves. The admin
/// variant keeps its own session draft and a stricter amount policy.
#[derive(Clone, Copy)]
pub struct EditorScope {
    pub policy: AmountPolicy,
    pub session_key: &'static str,
    pub base_path: &'static str,
    pub redirect_to: &'static str,
    pub page: &'static str,
}

pub const SELF_SERVICE: EditorScope = EditorScope {
    policy: AmountPolicy::AllowZero,
    session_key: "credit_draft",
    base_path: "/credits/new",
    redirect_to: "/credits",
    page: "credits",
};

pub const ADMIN_CREATE: EditorScope = EditorScope {
    policy: AmountPolicy::RequirePositive,
    session_key: "admin_credit_draft",
    base_path: "/admin/credits/new",
    redirect_to: "/admin/credits",
    page: "admin-credits",
};

/// The three account catalogs, fetched per request. The usage list and the
/// fully fetched fallback are optional enrichments: a failure is logged and
/// the screen degrades, it does not abort.
pub struct OwnedSources {
    pub usage: Vec<KeyAccount>,
    pub catalog: Vec<KeyAccount>,
    pub fallback: Vec<KeyAccount>,
}

impl OwnedSources {
    pub fn as_sources(&self) -> AccountSources<'_> {
        AccountSources {
            usage: &self.usage,
            catalog: &self.catalog,
            fallback: &self.fallback,
        }
    }

    /// Catalog for the add-account dropdown: the fully fetched list when we
    /// have one, else the context cache.
    pub fn dropdown_catalog(&self) -> &[KeyAccount] {
        if !self.fallback.is_empty() {
            &self.fallback
        } else {
            &self.catalog
        }
    }
}

pub async fn load_sources(state: &AppState, token: &str) -> OwnedSources {
    let usage = match state.key_accounts.usage(token).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "usage-enriched key-account fetch failed");
            Vec::new()
        }
    };
    let catalog = match state.key_accounts.accounts(token).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "cached key-account fetch failed");
            Vec::new()
        }
    };
    let fallback = match state.key_account_client.list(token).await {
        Ok(list) => list,
        Err(err) => {
            tracing::warn!(error = %err, "full key-account fetch failed");
            Vec::new()
        }
    };

    OwnedSources {
        usage,
        catalog,
        fallback,
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub struct DeptOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "credits_new.html")]
pub struct CreditsNewTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub title: &'static str,
    pub base_path: &'static str,
    pub departments: Vec<DeptOption>,
    pub locked_department: bool,
    pub department_name: String,
    pub error: String,
}

pub struct EntryRow {
    pub index: usize,
    pub name: String,
    pub account_type: String,
    pub amount: String,
    pub reason: String,
    pub available: String,
    pub total: String,
}

pub struct AccountOption {
    pub id: i64,
    pub label: String,
}

#[derive(Template)]
#[template(path = "fragments/draft_editor.html")]
pub struct DraftEditorTemplate {
    pub base_path: &'static str,
    pub redirect_to: &'static str,
    pub department_name: String,
    pub has_department: bool,
    pub submitted: bool,
    pub error: String,
    pub success: String,
    pub rows: Vec<EntryRow>,
    pub options: Vec<AccountOption>,
    pub can_add: bool,
}

fn render_editor(
    draft: &CreditDraft,
    sources: &OwnedSources,
    scope: EditorScope,
    error: &str,
    success: &str,
) -> Response {
    let rows = draft
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| EntryRow {
            index,
            name: entry.key_account_name.clone(),
            account_type: entry.account_type.clone(),
            amount: entry.amount.clone(),
            reason: entry.reason.clone(),
            available: reconcile::format_amount(entry.available),
            total: reconcile::format_amount(entry.total),
        })
        .collect();

    let options: Vec<AccountOption> =
        reconcile::selectable_accounts(sources.dropdown_catalog(), &draft.entries)
            .into_iter()
            .map(|account| AccountOption {
                id: account.id,
                label: account.name,
            })
            .collect();

    let can_add = !options.is_empty();

    DraftEditorTemplate {
        base_path: scope.base_path,
        redirect_to: scope.redirect_to,
        department_name: draft.department_name.clone(),
        has_department: draft.department_id.is_some(),
        submitted: draft.submitted,
        error: error.to_string(),
        success: success.to_string(),
        rows,
        options,
        can_add,
    }
    .into_response()
}

// ---------------------------------------------------------------------------
// Session draft helpers
// ---------------------------------------------------------------------------

async fn load_draft(session: &Session, scope: EditorScope) -> CreditDraft {
    session
        .get::<CreditDraft>(scope.session_key)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| CreditDraft::new(scope.policy))
}

async fn save_draft(
    session: &Session,
    scope: EditorScope,
    draft: &CreditDraft,
) -> Result<(), AppError> {
    session
        .insert(scope.session_key, draft)
        .await
        .map_err(|err| AppError::InternalError(anyhow::Error::new(err)))
}

/// Copy posted `amount_<i>` / `reason_<i>` fields into the draft before the
/// actual mutation, so edits that never triggered their own change event are
/// not lost.
fn sync_entries(draft: &mut CreditDraft, fields: &HashMap<String, String>) {
    for index in 0..draft.entries.len() {
        let amount = fields.get(&format!("amount_{index}")).cloned();
        let reason = fields.get(&format!("reason_{index}")).cloned();
        if amount.is_none() && reason.is_none() {
            continue;
        }
        let current = &draft.entries[index];
        let amount = amount.unwrap_or_else(|| current.amount.clone());
        let reason = reason.unwrap_or_else(|| current.reason.clone());
        draft.update_entry(index, &amount, &reason);
    }
}

// ---------------------------------------------------------------------------
// Shared endpoint implementations
// ---------------------------------------------------------------------------

async fn new_credit_page(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    title: &'static str,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;
    let draft = load_draft(&session, scope).await;

    let (departments, error) = match state.departments.list(&user.access_token).await {
        Ok(list) => (list, String::new()),
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => (Vec::new(), err.user_message()),
    };

    let departments = departments
        .into_iter()
        .map(|d| DeptOption {
            selected: draft.department_id == Some(d.id),
            id: d.id,
            name: d.name,
        })
        .collect();

    Ok(CreditsNewTemplate {
        user: profile,
        current_page: scope.page,
        title,
        base_path: scope.base_path,
        departments,
        locked_department: matches!(draft.mode, SubmitMode::Resolve { .. }),
        department_name: draft.department_name,
        error,
    }
    .into_response())
}

async fn editor_fragment(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
) -> Result<Response, AppError> {
    let draft = load_draft(&session, scope).await;
    let sources = load_sources(&state, &user.access_token).await;
    Ok(render_editor(&draft, &sources, scope, "", ""))
}

#[derive(Deserialize)]
pub struct DepartmentForm {
    pub department_id: String,
}

async fn select_department(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    form: DepartmentForm,
) -> Result<Response, AppError> {
    let sources;
    let token = user.access_token.as_str();

    let Ok(department_id) = form.department_id.parse::<i64>() else {
        let draft = load_draft(&session, scope).await;
        sources = load_sources(&state, token).await;
        return Ok(render_editor(
            &draft,
            &sources,
            scope,
            "Please select a department",
            "",
        ));
    };

    let department_name = match state.departments.get(department_id, token).await {
        Ok(department) => department.name,
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => {
            tracing::warn!(error = %err, department_id, "department lookup failed");
            String::new()
        }
    };

    // Reset the working set and record the generation of the load we are
    // about to issue before any await that another request could interleave
    // with.
    let mut draft = load_draft(&session, scope).await;
    let generation = draft.select_department(department_id, &department_name);
    save_draft(&session, scope, &draft).await?;

    let mut error = String::new();
    let mut rows = match state.budgets.department_rows(department_id, token).await {
        Ok(rows) => rows,
        Err(ApiError::Unauthorized) => {
            return Err(AppError::Unauthorized("session expired".to_string()))
        }
        Err(err) => {
            error = err.user_message();
            Vec::new()
        }
    };

    sources = load_sources(&state, token).await;

    if rows.is_empty() && error.is_empty() {
        // Department-scoped endpoint had nothing: fall back to filtering the
        // full table, then to zero-amount placeholders from the catalog.
        match state.budgets.all_rows(token).await {
            Ok(all) => {
                rows = reconcile::rows_for_department(&all, department_id, &department_name);
            }
            Err(err) => {
                tracing::warn!(error = %err, "full budget-master fetch failed");
            }
        }
        if rows.is_empty() {
            let srcs = sources.as_sources();
            rows = reconcile::placeholder_rows(department_id, &department_name, srcs.any_catalog());
        }
    }

    // Re-read: the user may have switched department again while the
    // fetches above were in flight. apply_rows drops the stale result.
    let mut draft = load_draft(&session, scope).await;
    draft.apply_rows(generation, &rows, &sources.as_sources());
    save_draft(&session, scope, &draft).await?;

    Ok(render_editor(&draft, &sources, scope, &error, ""))
}

async fn update_entry(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    index: usize,
    fields: HashMap<String, String>,
) -> Result<Response, AppError> {
    let mut draft = load_draft(&session, scope).await;

    let amount = fields
        .get(&format!("amount_{index}"))
        .cloned()
        .unwrap_or_default();
    let reason = fields
        .get(&format!("reason_{index}"))
        .cloned()
        .unwrap_or_default();
    draft.update_entry(index, &amount, &reason);

    save_draft(&session, scope, &draft).await?;
    let sources = load_sources(&state, &user.access_token).await;
    Ok(render_editor(&draft, &sources, scope, "", ""))
}

async fn add_account(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    fields: HashMap<String, String>,
) -> Result<Response, AppError> {
    let mut draft = load_draft(&session, scope).await;
    sync_entries(&mut draft, &fields);

    let sources = load_sources(&state, &user.access_token).await;

    let error = match fields
        .get("key_account_id")
        .and_then(|raw| raw.parse::<i64>().ok())
    {
        Some(id) => {
            match reconcile::add_account(&mut draft.entries, id, &sources.as_sources()) {
                Ok(()) => String::new(),
                Err(err) => err.to_string(),
            }
        }
        None => "Please choose an account to add".to_string(),
    };

    save_draft(&session, scope, &draft).await?;
    Ok(render_editor(&draft, &sources, scope, &error, ""))
}

async fn remove_account(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    index: usize,
    fields: HashMap<String, String>,
) -> Result<Response, AppError> {
    let mut draft = load_draft(&session, scope).await;
    sync_entries(&mut draft, &fields);
    reconcile::remove_account(&mut draft.entries, index);

    save_draft(&session, scope, &draft).await?;
    let sources = load_sources(&state, &user.access_token).await;
    Ok(render_editor(&draft, &sources, scope, "", ""))
}

async fn submit(
    state: AppState,
    session: Session,
    user: AuthUser,
    scope: EditorScope,
    fields: HashMap<String, String>,
) -> Result<Response, AppError> {
    let mut draft = load_draft(&session, scope).await;
    sync_entries(&mut draft, &fields);
    save_draft(&session, scope, &draft).await?;

    let sources = load_sources(&state, &user.access_token).await;

    // Client-side validation: a failure here never reaches the backend.
    let payload = match draft.payload() {
        Ok(payload) => payload,
        Err(err) => {
            return Ok(render_editor(&draft, &sources, scope, &err.to_string(), ""));
        }
    };

    let result = match draft.mode {
        SubmitMode::Create => state.credits.create(&payload, &user.access_token).await,
        SubmitMode::Resolve { credit_id, .. } => {
            state
                .credits
                .resolve(credit_id, &payload, &user.access_token)
                .await
        }
    };

    match result {
        Ok(()) => {
            draft.submitted = true;
            // The working set is done with; the next visit starts fresh.
            let _ = session.remove::<CreditDraft>(scope.session_key).await;
            Ok(render_editor(
                &draft,
                &sources,
                scope,
                "",
                "Credit request submitted successfully. Redirecting…",
            ))
        }
        Err(ApiError::Unauthorized) => {
            Err(AppError::Unauthorized("session expired".to_string()))
        }
        // Server message verbatim; the entries stay editable, no retry.
        Err(err) => Ok(render_editor(&draft, &sources, scope, &err.user_message(), "")),
    }
}

// ---------------------------------------------------------------------------
// Self-service routes
// ---------------------------------------------------------------------------

pub async fn new_page_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Response, AppError> {
    new_credit_page(state, session, user, SELF_SERVICE, "New credit request").await
}

pub async fn editor_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Response, AppError> {
    editor_fragment(state, session, user, SELF_SERVICE).await
}

pub async fn select_department_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(form): Form<DepartmentForm>,
) -> Result<Response, AppError> {
    select_department(state, session, user, SELF_SERVICE, form).await
}

pub async fn update_entry_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(index): Path<usize>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    update_entry(state, session, user, SELF_SERVICE, index, fields).await
}

pub async fn add_account_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    add_account(state, session, user, SELF_SERVICE, fields).await
}

pub async fn remove_account_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(index): Path<usize>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    remove_account(state, session, user, SELF_SERVICE, index, fields).await
}

pub async fn submit_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    submit(state, session, user, SELF_SERVICE, fields).await
}

// ---------------------------------------------------------------------------
// Admin-creation routes
// ---------------------------------------------------------------------------

pub async fn new_page_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    new_credit_page(state, session, user, ADMIN_CREATE, "New credit request (admin)").await
}

pub async fn editor_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    editor_fragment(state, session, user, ADMIN_CREATE).await
}

pub async fn select_department_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Form(form): Form<DepartmentForm>,
) -> Result<Response, AppError> {
    select_department(state, session, user, ADMIN_CREATE, form).await
}

pub async fn update_entry_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Path(index): Path<usize>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    update_entry(state, session, user, ADMIN_CREATE, index, fields).await
}

pub async fn add_account_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    add_account(state, session, user, ADMIN_CREATE, fields).await
}

pub async fn remove_account_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Path(index): Path<usize>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    remove_account(state, session, user, ADMIN_CREATE, index, fields).await
}

pub async fn submit_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    submit(state, session, user, ADMIN_CREATE, fields).await
}

// ---------------------------------------------------------------------------
// List / detail / resolve
// ---------------------------------------------------------------------------

pub struct ListRow {
    pub id: i64,
    pub department_name: String,
    pub status: String,
    pub status_class: &'static str,
    pub version: i64,
    pub total: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "credits_list.html")]
pub struct CreditsListTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub rows: Vec<ListRow>,
    pub error: String,
}

pub async fn list_mine(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;

    let (rows, error) = match state.credits.mine(&user.access_token).await {
        Ok(requests) => (
            requests
                .iter()
                .map(|request| ListRow {
                    id: request.id,
                    department_name: request.department_name.clone(),
                    status: request.status.clone(),
                    status_class: request.status_class(),
                    version: request.version,
                    total: reconcile::format_amount(request.total_amount()),
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

    Ok(CreditsListTemplate {
        user: profile,
        current_page: "credits",
        rows,
        error,
    }
    .into_response())
}

pub struct DetailEntry {
    pub name: String,
    pub amount: String,
    pub reason: String,
}

pub struct VersionRow {
    pub version: i64,
    pub status: String,
    pub created_at: String,
    pub total: String,
}

#[derive(Template)]
#[template(path = "credit_detail.html")]
pub struct CreditDetailTemplate {
    pub user: UserProfile,
    pub current_page: &'static str,
    pub id: i64,
    pub department_name: String,
    pub status: String,
    pub status_class: &'static str,
    pub version: i64,
    pub created_at: String,
    pub requested_by: String,
    pub revision_note: String,
    pub total: String,
    pub entries: Vec<DetailEntry>,
    pub versions: Vec<VersionRow>,
    pub can_resolve: bool,
    pub admin_actions: bool,
}

async fn detail(
    state: AppState,
    session: Session,
    user: AuthUser,
    id: i64,
    admin_actions: bool,
) -> Result<Response, AppError> {
    let profile = state.auth.current_profile(&session, &user).await;
    let request = state.credits.get(id, &user.access_token).await?;

    // Version history is an enrichment; the detail still renders without it.
    let versions = match state.credits.versions(id, &user.access_token).await {
        Ok(versions) => versions
            .iter()
            .map(|v| VersionRow {
                version: v.version,
                status: v.status.clone(),
                created_at: short_date(&v.created_at),
                total: reconcile::format_amount(
                    v.entries.iter().filter_map(|e| e.amount).sum::<f64>(),
                ),
            })
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, credit_id = id, "version history fetch failed");
            Vec::new()
        }
    };

    let entries = request
        .entries
        .iter()
        .map(|entry| DetailEntry {
            name: entry.key_account_name.clone(),
            amount: reconcile::format_amount(entry.amount.unwrap_or(0.0)),
            reason: entry.reason.clone(),
        })
        .collect();

    let can_resolve = !admin_actions && request.needs_resolution();

    Ok(CreditDetailTemplate {
        user: profile,
        current_page: if admin_actions { "admin-credits" } else { "credits" },
        id: request.id,
        department_name: request.department_name.clone(),
        status: request.status.clone(),
        status_class: request.status_class(),
        version: request.version,
        created_at: short_date(&request.created_at),
        requested_by: request.requested_by.clone(),
        revision_note: request.revision_note.clone().unwrap_or_default(),
        total: reconcile::format_amount(request.total_amount()),
        entries,
        versions,
        can_resolve,
        admin_actions,
    }
    .into_response())
}

pub async fn detail_user(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    detail(state, session, user, id, false).await
}

pub async fn detail_admin(
    State(state): State<AppState>,
    session: Session,
    AdminUser(user): AdminUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    detail(state, session, user, id, true).await
}

/// Seed the draft editor from an open revision and hand over to the normal
/// creation screen; submitting there resubmits the next version.
pub async fn start_resolution(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let request = state.credits.get(id, &user.access_token).await?;

    if !request.needs_resolution() {
        return Ok(Redirect::to(&format!("/credits/{id}")).into_response());
    }

    let sources = load_sources(&state, &user.access_token).await;
    let srcs = sources.as_sources();

    let entries = request
        .entries
        .iter()
        .map(|entry| {
            let resolved = srcs.resolve(entry.key_account_id);
            crate::reconcile::AccountEntry {
                key_account_id: entry.key_account_id,
                key_account_name: if entry.key_account_name.is_empty() {
                    resolved.map(|a| a.name.clone()).unwrap_or_default()
                } else {
                    entry.key_account_name.clone()
                },
                amount: entry
                    .amount
                    .map(reconcile::format_amount)
                    .unwrap_or_default(),
                reason: entry.reason.clone(),
                available: srcs.available_amount(entry.key_account_id),
                account_type: resolved.map(|a| a.account_type.clone()).unwrap_or_default(),
                total: resolved.and_then(|a| a.total_budget).unwrap_or(0.0),
            }
        })
        .collect();

    let draft = CreditDraft::for_resolution(
        SELF_SERVICE.policy,
        request.id,
        request.version,
        request.department_id,
        &request.department_name,
        entries,
    );

    save_draft(&session, SELF_SERVICE, &draft).await?;
    Ok(Redirect::to(SELF_SERVICE.base_path).into_response())
}
