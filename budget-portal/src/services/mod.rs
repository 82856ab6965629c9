pub mod api_client;
pub mod auth;
pub mod budgets;
pub mod credits;
pub mod departments;
pub mod key_accounts;
pub mod users;
pub mod withdrawals;
