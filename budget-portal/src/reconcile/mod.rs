//! Account-entry reconciliation for the credit-request screens.
//!
//! Budget-master rows arrive keyed by department x key account, possibly
//! several rows per account. The screens need exactly one editable entry per
//! account, with the allocation total accumulated across rows and the
//! remaining budget resolved from whichever catalog happens to know the
//! account. Everything in this module is pure; the handlers do the fetching.

mod draft;

pub use draft::{AmountPolicy, CreditDraft, SubmitMode};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use portal_core::lookup::first_match;

use crate::models::budget::BudgetMasterRow;
use crate::models::key_account::KeyAccount;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("This account has already been added")]
    DuplicateAccount,

    #[error("Account could not be found in any catalog")]
    UnknownAccount,

    #[error("Please select a department first")]
    MissingDepartment,

    #[error("Please add at least one account with a valid amount")]
    NoValidEntries,
}

/// One editable row of the credit-request form. Derived, never persisted
/// as-is; the submission payload is built from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountEntry {
    pub key_account_id: i64,
    pub key_account_name: String,
    /// Form-field content: empty until seeded or typed, parsed on submit.
    pub amount: String,
    pub reason: String,
    pub available: f64,
    pub account_type: String,
    /// Allocation total, accumulated across every contributing row.
    pub total: f64,
}

/// The three candidate catalogs an account may be resolved from, in the
/// priority order each operation prescribes.
pub struct AccountSources<'a> {
    /// Usage-enriched list (`/key-accounts/usage/all`).
    pub usage: &'a [KeyAccount],
    /// The context-cached plain catalog.
    pub catalog: &'a [KeyAccount],
    /// A fully fetched fallback list.
    pub fallback: &'a [KeyAccount],
}

impl AccountSources<'_> {
    /// Remaining budget for `id`: first hit wins across usage, then the
    /// plain catalog, then the fallback; 0 when no source knows the account.
    pub fn available_amount(&self, id: i64) -> f64 {
        first_match(&[self.usage, self.catalog, self.fallback], |a: &KeyAccount| {
            a.id == id
        })
        .map(KeyAccount::available)
        .unwrap_or(0.0)
    }

    /// Display-field resolution for manual adds: the fully fetched list is
    /// the freshest, then the cached catalog, then the usage list.
    pub fn resolve(&self, id: i64) -> Option<&KeyAccount> {
        first_match(&[self.fallback, self.catalog, self.usage], |a: &KeyAccount| {
            a.id == id
        })
    }

    /// First non-empty catalog, used when fabricating placeholder rows.
    pub fn any_catalog(&self) -> &[KeyAccount] {
        if !self.fallback.is_empty() {
            self.fallback
        } else if !self.catalog.is_empty() {
            self.catalog
        } else {
            self.usage
        }
    }
}

/// Group budget-master rows into one entry per distinct key account.
///
/// The first row for an account seeds `amount` (only when parseable and
/// strictly positive, otherwise the field starts empty) and its name/type;
/// every row, first included, accumulates `overall` into `total`. Later rows
/// never re-seed `amount`.
pub fn group_rows(rows: &[BudgetMasterRow], sources: &AccountSources) -> Vec<AccountEntry> {
    let mut entries: Vec<AccountEntry> = Vec::new();

    for row in rows {
        let overall = row.overall.unwrap_or(0.0);

        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.key_account_id == row.key_account)
        {
            existing.total += overall;
            continue;
        }

        let amount = match row.amount {
            Some(value) if value > 0.0 => format_amount(value),
            _ => String::new(),
        };

        let resolved = sources.resolve(row.key_account);
        let key_account_name = if row.key_account_name.is_empty() {
            resolved.map(|a| a.name.clone()).unwrap_or_default()
        } else {
            row.key_account_name.clone()
        };
        let account_type = if row.row_type.is_empty() {
            resolved.map(|a| a.account_type.clone()).unwrap_or_default()
        } else {
            row.row_type.clone()
        };

        entries.push(AccountEntry {
            key_account_id: row.key_account,
            key_account_name,
            amount,
            reason: String::new(),
            available: sources.available_amount(row.key_account),
            account_type,
            total: overall,
        });
    }

    entries
}

/// Catalog minus the accounts already present in the working set. The add
/// dropdown is populated from this, so dropdown and entries stay disjoint.
pub fn selectable_accounts(catalog: &[KeyAccount], entries: &[AccountEntry]) -> Vec<KeyAccount> {
    catalog
        .iter()
        .filter(|account| !entries.iter().any(|e| e.key_account_id == account.id))
        .cloned()
        .collect()
}

/// Append a zero-amount entry for `id`. Duplicates and unresolvable ids are
/// user-visible errors and leave the working set untouched.
pub fn add_account(
    entries: &mut Vec<AccountEntry>,
    id: i64,
    sources: &AccountSources,
) -> Result<(), ReconcileError> {
    if entries.iter().any(|e| e.key_account_id == id) {
        return Err(ReconcileError::DuplicateAccount);
    }

    let account = sources.resolve(id).ok_or(ReconcileError::UnknownAccount)?;

    entries.push(AccountEntry {
        key_account_id: id,
        key_account_name: account.name.clone(),
        amount: String::new(),
        reason: String::new(),
        available: sources.available_amount(id),
        account_type: account.account_type.clone(),
        total: account.total_budget.unwrap_or(0.0),
    });

    Ok(())
}

/// Positional removal; indices always come from the live working set.
pub fn remove_account(entries: &mut Vec<AccountEntry>, index: usize) {
    if index < entries.len() {
        entries.remove(index);
    }
}

/// Client-side filter for the full budget-master table: match on department
/// id, or on case-insensitive department name when the id does not line up.
pub fn rows_for_department(
    all_rows: &[BudgetMasterRow],
    department_id: i64,
    department_name: &str,
) -> Vec<BudgetMasterRow> {
    all_rows
        .iter()
        .filter(|row| {
            row.department == department_id
                || (!department_name.is_empty()
                    && row.department_name.eq_ignore_ascii_case(department_name))
        })
        .cloned()
        .collect()
}

/// Fabricate zero-amount rows from the account catalog so the entry table
/// always has something to render when no budget master exists yet.
pub fn placeholder_rows(
    department_id: i64,
    department_name: &str,
    accounts: &[KeyAccount],
) -> Vec<BudgetMasterRow> {
    accounts
        .iter()
        .map(|account| BudgetMasterRow {
            department: department_id,
            department_name: department_name.to_string(),
            key_account: account.id,
            key_account_name: account.name.clone(),
            amount: None,
            overall: Some(0.0),
            row_type: account.account_type.clone(),
        })
        .collect()
}

/// Render a float the way a form field expects it: no trailing `.0` on
/// whole numbers.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key_account: i64, amount: Option<f64>, overall: f64) -> BudgetMasterRow {
        BudgetMasterRow {
            department: 1,
            department_name: "Finance".to_string(),
            key_account,
            key_account_name: format!("Account {key_account}"),
            amount,
            overall: Some(overall),
            row_type: "opex".to_string(),
        }
    }

    fn account(id: i64, total: f64) -> KeyAccount {
        KeyAccount {
            id,
            name: format!("Account {id}"),
            account_type: "opex".to_string(),
            total_budget: Some(total),
            used_amount: None,
            available_amount: None,
        }
    }

    fn no_sources() -> AccountSources<'static> {
        AccountSources {
            usage: &[],
            catalog: &[],
            fallback: &[],
        }
    }

    #[test]
    fn one_entry_per_distinct_key_account() {
        let rows = vec![
            row(1, Some(500.0), 2000.0),
            row(1, Some(0.0), 2000.0),
            row(2, Some(300.0), 900.0),
            row(1, Some(999.0), 100.0),
        ];

        let entries = group_rows(&rows, &no_sources());
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn totals_accumulate_across_all_contributing_rows() {
        let rows = vec![
            row(1, Some(500.0), 2000.0),
            row(1, Some(0.0), 2000.0),
            row(2, Some(300.0), 900.0),
        ];

        let entries = group_rows(&rows, &no_sources());
        let first = entries.iter().find(|e| e.key_account_id == 1).unwrap();
        let second = entries.iter().find(|e| e.key_account_id == 2).unwrap();

        assert_eq!(first.amount, "500");
        assert_eq!(first.total, 4000.0);
        assert_eq!(second.amount, "300");
        assert_eq!(second.total, 900.0);
    }

    #[test]
    fn amount_is_seeded_once_and_never_reseeded() {
        // First row has no positive amount; a later row for the same account
        // does. The entry keeps its empty amount.
        let rows = vec![row(1, Some(0.0), 100.0), row(1, Some(750.0), 100.0)];

        let entries = group_rows(&rows, &no_sources());
        assert_eq!(entries[0].amount, "");
        assert_eq!(entries[0].total, 200.0);
    }

    #[test]
    fn non_positive_and_missing_amounts_seed_empty() {
        let rows = vec![row(1, None, 50.0), row(2, Some(-10.0), 60.0)];

        let entries = group_rows(&rows, &no_sources());
        assert!(entries.iter().all(|e| e.amount.is_empty()));
    }

    #[test]
    fn grouping_resolves_available_through_source_chain() {
        let usage = vec![KeyAccount {
            used_amount: Some(400.0),
            ..account(1, 1000.0)
        }];
        let catalog = vec![account(1, 1000.0), account(2, 300.0)];
        let sources = AccountSources {
            usage: &usage,
            catalog: &catalog,
            fallback: &[],
        };

        let entries = group_rows(&[row(1, Some(10.0), 0.0), row(2, None, 0.0)], &sources);
        assert_eq!(entries[0].available, 600.0); // usage list wins
        assert_eq!(entries[1].available, 300.0); // plain catalog fallback
    }

    #[test]
    fn available_defaults_to_zero_when_unknown_everywhere() {
        let entries = group_rows(&[row(9, None, 0.0)], &no_sources());
        assert_eq!(entries[0].available, 0.0);
    }

    #[test]
    fn available_amount_from_fallback_catalog_only() {
        // Account 7 exists only in the fully fetched fallback list with a
        // total budget of 1000 and no usage record.
        let fallback = vec![account(7, 1000.0)];
        let sources = AccountSources {
            usage: &[],
            catalog: &[],
            fallback: &fallback,
        };

        assert_eq!(sources.available_amount(7), 1000.0);
    }

    #[test]
    fn dropdown_and_entries_stay_disjoint() {
        let catalog = vec![account(1, 100.0), account(2, 100.0), account(3, 100.0)];
        let sources = AccountSources {
            usage: &[],
            catalog: &catalog,
            fallback: &[],
        };

        let mut entries = group_rows(&[row(1, None, 0.0)], &sources);
        add_account(&mut entries, 2, &sources).unwrap();

        let selectable = selectable_accounts(&catalog, &entries);
        assert_eq!(selectable.len(), 1);
        assert!(selectable
            .iter()
            .all(|a| !entries.iter().any(|e| e.key_account_id == a.id)));
    }

    #[test]
    fn duplicate_add_fails_without_mutating_entries() {
        let catalog = vec![account(1, 100.0)];
        let sources = AccountSources {
            usage: &[],
            catalog: &catalog,
            fallback: &[],
        };

        let mut entries = Vec::new();
        add_account(&mut entries, 1, &sources).unwrap();
        let before = entries.clone();

        let err = add_account(&mut entries, 1, &sources).unwrap_err();
        assert_eq!(err, ReconcileError::DuplicateAccount);
        assert_eq!(entries, before);
    }

    #[test]
    fn unknown_account_add_fails_without_mutating_entries() {
        let mut entries = Vec::new();
        let err = add_account(&mut entries, 42, &no_sources()).unwrap_err();
        assert_eq!(err, ReconcileError::UnknownAccount);
        assert!(entries.is_empty());
    }

    #[test]
    fn manual_add_resolves_from_fallback_before_catalog() {
        let fallback = vec![KeyAccount {
            name: "Fresh name".to_string(),
            ..account(5, 800.0)
        }];
        let catalog = vec![KeyAccount {
            name: "Stale name".to_string(),
            ..account(5, 700.0)
        }];
        let sources = AccountSources {
            usage: &[],
            catalog: &catalog,
            fallback: &fallback,
        };

        let mut entries = Vec::new();
        add_account(&mut entries, 5, &sources).unwrap();
        assert_eq!(entries[0].key_account_name, "Fresh name");
        assert_eq!(entries[0].amount, "");
        assert_eq!(entries[0].total, 800.0);
    }

    #[test]
    fn remove_is_positional_and_bounds_checked() {
        let catalog = vec![account(1, 100.0), account(2, 100.0)];
        let sources = AccountSources {
            usage: &[],
            catalog: &catalog,
            fallback: &[],
        };

        let mut entries = Vec::new();
        add_account(&mut entries, 1, &sources).unwrap();
        add_account(&mut entries, 2, &sources).unwrap();

        remove_account(&mut entries, 0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key_account_id, 2);

        remove_account(&mut entries, 5); // out of range: no-op
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn department_filter_matches_id_or_name_case_insensitively() {
        let mut other = row(3, None, 10.0);
        other.department = 2;
        other.department_name = "Operations".to_string();

        let mut by_name = row(4, None, 20.0);
        by_name.department = 99;
        by_name.department_name = "FINANCE".to_string();

        let all = vec![row(1, None, 5.0), other, by_name];
        let filtered = rows_for_department(&all, 1, "finance");

        let keys: Vec<i64> = filtered.iter().map(|r| r.key_account).collect();
        assert_eq!(keys, vec![1, 4]);
    }

    #[test]
    fn placeholders_cover_the_whole_catalog_with_zero_amounts() {
        let catalog = vec![account(1, 100.0), account(2, 200.0)];
        let rows = placeholder_rows(7, "Research", &catalog);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.amount.is_none()));
        assert!(rows.iter().all(|r| r.overall == Some(0.0)));
        assert!(rows.iter().all(|r| r.department == 7));

        let entries = group_rows(
            &rows,
            &AccountSources {
                usage: &[],
                catalog: &catalog,
                fallback: &[],
            },
        );
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.amount.is_empty() && e.total == 0.0));
    }

    #[test]
    fn format_amount_drops_trailing_zero_fraction() {
        assert_eq!(format_amount(500.0), "500");
        assert_eq!(format_amount(300.5), "300.5");
    }
}
