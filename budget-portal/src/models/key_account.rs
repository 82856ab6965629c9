use serde::{Deserialize, Serialize};

use super::de_flexible_amount;

/// A budget line departments draw funds against.
///
/// `used_amount`/`available_amount` are only present when the record came
/// from the usage-enriched endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeyAccount {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub total_budget: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub used_amount: Option<f64>,
    #[serde(default, deserialize_with = "de_flexible_amount")]
    pub available_amount: Option<f64>,
}

impl KeyAccount {
    /// Remaining budget: the explicit `available_amount` when the backend
    /// provided one, otherwise `total_budget - used_amount` with a missing
    /// usage figure treated as 0.
    pub fn available(&self) -> f64 {
        match self.available_amount {
            Some(available) => available,
            None => self.total_budget.unwrap_or(0.0) - self.used_amount.unwrap_or(0.0),
        }
    }

    /// Share of the budget already consumed, clamped to 0..=100 for
    /// progress-bar rendering.
    pub fn used_percent(&self) -> u32 {
        let total = self.total_budget.unwrap_or(0.0);
        if total <= 0.0 {
            return 0;
        }
        let used = self.used_amount.unwrap_or(0.0);
        ((used / total * 100.0).clamp(0.0, 100.0)).round() as u32
    }
}

/// Payload for `POST /key-accounts` (upsert).
#[derive(Debug, Serialize, Clone)]
pub struct KeyAccountUpsert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub account_type: String,
    pub total_budget: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(total: Option<f64>, used: Option<f64>, available: Option<f64>) -> KeyAccount {
        KeyAccount {
            id: 1,
            name: "Travel".to_string(),
            account_type: "opex".to_string(),
            total_budget: total,
            used_amount: used,
            available_amount: available,
        }
    }

    #[test]
    fn explicit_available_wins() {
        assert_eq!(account(Some(1000.0), Some(900.0), Some(250.0)).available(), 250.0);
    }

    #[test]
    fn derives_available_from_total_minus_used() {
        assert_eq!(account(Some(1000.0), Some(400.0), None).available(), 600.0);
    }

    #[test]
    fn missing_usage_counts_as_zero() {
        assert_eq!(account(Some(1000.0), None, None).available(), 1000.0);
    }

    #[test]
    fn used_percent_clamps() {
        assert_eq!(account(Some(100.0), Some(250.0), None).used_percent(), 100);
        assert_eq!(account(None, Some(50.0), None).used_percent(), 0);
        assert_eq!(account(Some(200.0), Some(50.0), None).used_percent(), 25);
    }
}
