pub mod admin;
pub mod app;
pub mod approvals;
pub mod auth;
pub mod credits;
pub mod dashboard;
pub mod metrics;
pub mod withdrawals;
