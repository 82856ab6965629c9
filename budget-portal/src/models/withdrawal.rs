use serde::{Deserialize, Serialize};

use super::de_flexible_amount;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Withdrawal {
    pub id: i64,
    pub key_account_id: i64,
    #[serde(default)]
    pub key_account_name: String,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: String, // pending | approved | rejected
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub created_at: String,
}

impl Withdrawal {
    pub fn status_class(&self) -> &'static str {
        match self.status.as_str() {
            "approved" => "bg-emerald-500/10 text-emerald-400",
            "rejected" => "bg-red-500/10 text-red-400",
            _ => "bg-blue-500/10 text-blue-400",
        }
    }
}

/// Payload for `POST /withdrawals`.
#[derive(Debug, Serialize, Clone)]
pub struct WithdrawalPayload {
    pub key_account_id: i64,
    pub amount: f64,
    pub reason: String,
    pub status: String,
}
