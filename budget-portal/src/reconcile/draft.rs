//! Session-held working state for the credit-request screens.
//!
//! A draft is created when the screen opens, mutated by the HTMX endpoints
//! (department select, add/remove account, amount edits), and turned into a
//! submission payload once validation passes. Department budget loads are
//! tagged with a generation counter so a response that raced a department
//! switch is discarded instead of overwriting newer state.

use serde::{Deserialize, Serialize};

use super::{group_rows, AccountEntry, AccountSources, ReconcileError};
use crate::models::budget::BudgetMasterRow;
use crate::models::credit::{CreditRequestPayload, EntryPayload};

/// Amount validation policy: the self-service screen accepts zero amounts,
/// the admin creation screen requires strictly positive ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountPolicy {
    AllowZero,
    RequirePositive,
}

/// What submitting the draft does: create a new request, or resolve an open
/// revision by resubmitting the next version of an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitMode {
    Create,
    Resolve { credit_id: i64, version: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditDraft {
    pub policy: AmountPolicy,
    pub mode: SubmitMode,
    pub department_id: Option<i64>,
    pub department_name: String,
    pub entries: Vec<AccountEntry>,
    pub generation: u64,
    pub submitted: bool,
}

impl CreditDraft {
    pub fn new(policy: AmountPolicy) -> Self {
        Self {
            policy,
            mode: SubmitMode::Create,
            department_id: None,
            department_name: String::new(),
            entries: Vec::new(),
            generation: 0,
            submitted: false,
        }
    }

    /// Draft seeded from an existing request for the revision-resolve flow.
    /// The department is fixed; submitting issues the next version.
    pub fn for_resolution(
        policy: AmountPolicy,
        credit_id: i64,
        current_version: i64,
        department_id: i64,
        department_name: &str,
        entries: Vec<AccountEntry>,
    ) -> Self {
        Self {
            policy,
            mode: SubmitMode::Resolve {
                credit_id,
                version: current_version + 1,
            },
            department_id: Some(department_id),
            department_name: department_name.to_string(),
            entries,
            generation: 0,
            submitted: false,
        }
    }

    /// Switch department: full reset of the working set and banners, and a
    /// new generation for the budget load about to be issued.
    pub fn select_department(&mut self, id: i64, name: &str) -> u64 {
        self.department_id = Some(id);
        self.department_name = name.to_string();
        self.entries.clear();
        self.submitted = false;
        self.generation += 1;
        self.generation
    }

    /// Install grouped entries from a budget load. Returns false (and leaves
    /// the draft untouched) when the response is stale or when the user
    /// already has edits or a submitted form on screen.
    pub fn apply_rows(
        &mut self,
        generation: u64,
        rows: &[BudgetMasterRow],
        sources: &AccountSources,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "discarding superseded budget load"
            );
            return false;
        }
        if !self.entries.is_empty() || self.submitted {
            return false;
        }
        self.entries = group_rows(rows, sources);
        true
    }

    pub fn update_entry(&mut self, index: usize, amount: &str, reason: &str) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.amount = amount.trim().to_string();
            entry.reason = reason.to_string();
        }
    }

    pub fn version(&self) -> i64 {
        match self.mode {
            SubmitMode::Create => 1,
            SubmitMode::Resolve { version, .. } => version,
        }
    }

    /// Validate and build the submission payload. Entries whose amount is
    /// empty, unparseable, negative, or zero under `RequirePositive` are
    /// filtered out; an empty result is a validation error, surfaced before
    /// any network call is made.
    pub fn payload(&self) -> Result<CreditRequestPayload, ReconcileError> {
        let department_id = self.department_id.ok_or(ReconcileError::MissingDepartment)?;

        let entries: Vec<EntryPayload> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let raw = entry.amount.trim();
                if raw.is_empty() {
                    return None;
                }
                let amount: f64 = raw.parse().ok()?;
                let valid = match self.policy {
                    AmountPolicy::AllowZero => amount >= 0.0,
                    AmountPolicy::RequirePositive => amount > 0.0,
                };
                valid.then(|| EntryPayload {
                    key_account_id: entry.key_account_id,
                    amount,
                    reason: entry.reason.trim().to_string(),
                })
            })
            .collect();

        if entries.is_empty() {
            return Err(ReconcileError::NoValidEntries);
        }

        Ok(CreditRequestPayload {
            department_id,
            entries,
            version: self.version(),
            status: "pending".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::budget::BudgetMasterRow;

    fn entry(id: i64, amount: &str) -> AccountEntry {
        AccountEntry {
            key_account_id: id,
            key_account_name: format!("Account {id}"),
            amount: amount.to_string(),
            reason: "  supplies  ".to_string(),
            available: 0.0,
            account_type: "opex".to_string(),
            total: 0.0,
        }
    }

    fn row(key_account: i64, overall: f64) -> BudgetMasterRow {
        BudgetMasterRow {
            department: 1,
            department_name: "Finance".to_string(),
            key_account,
            key_account_name: format!("Account {key_account}"),
            amount: None,
            overall: Some(overall),
            row_type: "opex".to_string(),
        }
    }

    fn empty_sources() -> AccountSources<'static> {
        AccountSources {
            usage: &[],
            catalog: &[],
            fallback: &[],
        }
    }

    #[test]
    fn payload_requires_a_department() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        draft.entries.push(entry(1, "100"));

        assert_eq!(draft.payload().unwrap_err(), ReconcileError::MissingDepartment);
    }

    #[test]
    fn payload_with_no_valid_amounts_is_rejected_before_any_network_call() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        draft.select_department(1, "Finance");
        draft.entries.push(entry(1, ""));
        draft.entries.push(entry(2, "abc"));
        draft.entries.push(entry(3, "-5"));

        let err = draft.payload().unwrap_err();
        assert_eq!(err, ReconcileError::NoValidEntries);
        assert_eq!(
            err.to_string(),
            "Please add at least one account with a valid amount"
        );
    }

    #[test]
    fn zero_amounts_pass_self_service_policy_but_not_admin_policy() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        draft.select_department(1, "Finance");
        draft.entries.push(entry(1, "0"));
        let payload = draft.payload().unwrap();
        assert_eq!(payload.entries.len(), 1);
        assert_eq!(payload.entries[0].amount, 0.0);

        let mut admin_draft = CreditDraft::new(AmountPolicy::RequirePositive);
        admin_draft.select_department(1, "Finance");
        admin_draft.entries.push(entry(1, "0"));
        assert_eq!(
            admin_draft.payload().unwrap_err(),
            ReconcileError::NoValidEntries
        );
    }

    #[test]
    fn payload_carries_department_version_and_pending_status() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        draft.select_department(4, "Research");
        draft.entries.push(entry(1, "250.5"));
        draft.entries.push(entry(2, "")); // filtered

        let payload = draft.payload().unwrap();
        assert_eq!(payload.department_id, 4);
        assert_eq!(payload.version, 1);
        assert_eq!(payload.status, "pending");
        assert_eq!(payload.entries.len(), 1);
        assert_eq!(payload.entries[0].amount, 250.5);
        assert_eq!(payload.entries[0].reason, "supplies");
    }

    #[test]
    fn resolution_draft_submits_the_next_version() {
        let draft = CreditDraft::for_resolution(
            AmountPolicy::AllowZero,
            12,
            3,
            1,
            "Finance",
            vec![entry(1, "10")],
        );

        assert_eq!(draft.mode, SubmitMode::Resolve { credit_id: 12, version: 4 });
        assert_eq!(draft.payload().unwrap().version, 4);
    }

    #[test]
    fn department_switch_resets_working_state_and_bumps_generation() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        let first = draft.select_department(1, "Finance");
        draft.entries.push(entry(1, "10"));
        draft.submitted = true;

        let second = draft.select_department(2, "Operations");
        assert_eq!(second, first + 1);
        assert!(draft.entries.is_empty());
        assert!(!draft.submitted);
        assert_eq!(draft.department_name, "Operations");
    }

    #[test]
    fn stale_budget_load_is_discarded() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        let stale = draft.select_department(1, "Finance");
        draft.select_department(2, "Operations");

        assert!(!draft.apply_rows(stale, &[row(1, 100.0)], &empty_sources()));
        assert!(draft.entries.is_empty());
    }

    #[test]
    fn budget_load_never_clobbers_in_progress_edits() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        let generation = draft.select_department(1, "Finance");
        assert!(draft.apply_rows(generation, &[row(1, 100.0)], &empty_sources()));

        draft.update_entry(0, "42", "printer paper");

        // Re-running the same load must not rebuild the entries.
        assert!(!draft.apply_rows(generation, &[row(1, 100.0)], &empty_sources()));
        assert_eq!(draft.entries[0].amount, "42");
        assert_eq!(draft.entries[0].reason, "printer paper");
    }

    #[test]
    fn update_entry_ignores_out_of_range_indices() {
        let mut draft = CreditDraft::new(AmountPolicy::AllowZero);
        draft.update_entry(3, "10", "nope");
        assert!(draft.entries.is_empty());
    }
}
