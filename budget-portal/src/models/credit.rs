use serde::{Deserialize, Serialize};

use super::de_flexible_amount;

/// A credit request as returned by the backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreditRequest {
    pub id: i64,
    pub department_id: i64,
    #[serde(default)]
    pub department_name: String,
    pub status: String, // pending | revision | approved | rejected
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default)]
    pub entries: Vec<CreditEntry>,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub revision_note: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

fn default_version() -> i64 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreditEntry {
    pub key_account_id: i64,
    #[serde(default)]
    pub key_account_name: String,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub reason: String,
}

/// One historical version of a request, from `GET /credits/:id/versions`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreditVersion {
    pub version: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub entries: Vec<CreditEntry>,
    #[serde(default)]
    pub created_at: String,
}

/// Payload posted on submission and on revision resolution.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CreditRequestPayload {
    pub department_id: i64,
    pub entries: Vec<EntryPayload>,
    pub version: i64,
    pub status: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EntryPayload {
    pub key_account_id: i64,
    pub amount: f64,
    pub reason: String,
}

impl CreditRequest {
    pub fn total_amount(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.amount).sum()
    }

    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }

    pub fn needs_resolution(&self) -> bool {
        self.status == "revision"
    }

    /// Badge colour classes per status, shared by list and detail screens.
    pub fn status_class(&self) -> &'static str {
        match self.status.as_str() {
            "approved" => "bg-emerald-500/10 text-emerald-400",
            "rejected" => "bg-red-500/10 text-red-400",
            "revision" => "bg-amber-500/10 text-amber-400",
            _ => "bg-blue-500/10 text-blue-400",
        }
    }
}
