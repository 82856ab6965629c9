pub mod config;
pub mod context;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod startup;
pub mod utils;

use std::sync::Arc;

use config::Settings;
use context::auth::AuthContext;
use context::key_accounts::KeyAccountStore;
use services::api_client::ApiClient;
use services::auth::AuthClient;
use services::budgets::BudgetClient;
use services::credits::CreditClient;
use services::departments::DepartmentClient;
use services::key_accounts::KeyAccountClient;
use services::users::UserClient;
use services::withdrawals::WithdrawalClient;

/// Shared application state containing the service clients and context
/// stores. Everything is constructed once in `main` and injected; nothing
/// is looked up from ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthContext>,
    pub departments: Arc<DepartmentClient>,
    pub budgets: Arc<BudgetClient>,
    pub credits: Arc<CreditClient>,
    pub withdrawals: Arc<WithdrawalClient>,
    pub users: Arc<UserClient>,
    /// Cached catalog shared across screens.
    pub key_accounts: Arc<KeyAccountStore>,
    /// Direct, uncached client for the fully fetched fallback list.
    pub key_account_client: Arc<KeyAccountClient>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let api = Arc::new(ApiClient::new(&settings.backend.base_url));

        Self {
            auth: Arc::new(AuthContext::new(Arc::new(AuthClient::new(api.clone())))),
            departments: Arc::new(DepartmentClient::new(api.clone())),
            budgets: Arc::new(BudgetClient::new(api.clone())),
            credits: Arc::new(CreditClient::new(api.clone())),
            withdrawals: Arc::new(WithdrawalClient::new(api.clone())),
            users: Arc::new(UserClient::new(api.clone())),
            key_accounts: Arc::new(KeyAccountStore::new(KeyAccountClient::new(api.clone()))),
            key_account_client: Arc::new(KeyAccountClient::new(api)),
        }
    }
}
