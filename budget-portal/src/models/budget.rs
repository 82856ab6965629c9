use serde::{Deserialize, Serialize};

use super::de_flexible_amount;

/// One department x key-account allocation fact from the budget master.
/// Read-only; the client only groups and sums these.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BudgetMasterRow {
    #[serde(default)]
    pub department: i64,
    #[serde(default)]
    pub department_name: String,
    pub key_account: i64,
    #[serde(default)]
    pub key_account_name: String,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub overall: Option<f64>,
    #[serde(default, rename = "type")]
    pub row_type: String,
}
