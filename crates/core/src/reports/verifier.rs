//! Balance verification of trial balances and stored entries.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use fiscus_shared::LedgerConfig;
use fiscus_shared::types::AccountId;
use fiscus_shared::types::money::within_tolerance;

use super::error::ReportError;
use super::trial_balance::{DEFAULT_BALANCE_TOLERANCE, leaf_totals};
use super::types::TrialBalance;
use crate::ledger::{EntryTotals, JournalEntry, JournalItem, LedgerError};

/// Rollup columns, in the order they are compared.
const ROLLUP_FIELDS: [&str; 4] = [
    "opening_balance",
    "period_debits",
    "period_credits",
    "closing_balance",
];

/// Outcome of the double-entry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceCheck {
    /// Sum of leaf period debits.
    pub total_debits: Decimal,
    /// Sum of leaf period credits.
    pub total_credits: Decimal,
    /// `total_debits - total_credits`.
    pub difference: Decimal,
    /// Whether the difference is within tolerance.
    pub is_balanced: bool,
}

/// Checks the double-entry invariant.
#[derive(Debug, Clone, Copy)]
pub struct BalanceVerifier {
    tolerance: Decimal,
}

impl Default for BalanceVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE_TOLERANCE)
    }
}

impl BalanceVerifier {
    /// Creates a verifier with the given tolerance.
    #[must_use]
    pub const fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Creates a verifier from the ledger configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.balance_tolerance)
    }

    /// Recomputes leaf totals of a report and checks them.
    ///
    /// Imbalance is reported, never corrected.
    ///
    /// # Errors
    ///
    /// Returns `TotalsOverflow` if the leaf totals exceed the decimal range.
    pub fn verify(&self, report: &TrialBalance) -> Result<BalanceCheck, ReportError> {
        let totals = leaf_totals(&report.accounts)?;
        Ok(BalanceCheck {
            total_debits: totals.total_debits,
            total_credits: totals.total_credits,
            difference: totals.difference,
            is_balanced: within_tolerance(
                totals.total_debits,
                totals.total_credits,
                self.tolerance,
            ),
        })
    }

    /// Checks that every group row equals the sum of its leaf descendants.
    ///
    /// # Errors
    ///
    /// Returns `RollupMismatch` naming the first group row and column that
    /// disagree, or `AmountOverflow` if a group's leaf sum exceeds the
    /// decimal range.
    pub fn verify_rollups(report: &TrialBalance) -> Result<(), ReportError> {
        let parents: HashMap<AccountId, Option<AccountId>> = report
            .accounts
            .iter()
            .map(|row| (row.account_id, row.parent_id))
            .collect();

        // [opening, debits, credits, closing] per group
        let mut expected: HashMap<AccountId, [Decimal; 4]> = HashMap::new();
        for leaf in report.leaves() {
            let figures = [
                leaf.opening_balance,
                leaf.period_debits,
                leaf.period_credits,
                leaf.closing_balance,
            ];
            let mut next = leaf.parent_id;
            let mut remaining = report.accounts.len();
            while let Some(ancestor) = next {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
                let sums = expected.entry(ancestor).or_insert([Decimal::ZERO; 4]);
                for (sum, value) in sums.iter_mut().zip(figures) {
                    *sum = sum
                        .checked_add(value)
                        .ok_or(ReportError::AmountOverflow(ancestor))?;
                }
                next = parents.get(&ancestor).copied().flatten();
            }
        }

        for row in report.accounts.iter().filter(|row| !row.is_leaf) {
            let sums = expected
                .get(&row.account_id)
                .copied()
                .unwrap_or([Decimal::ZERO; 4]);
            let actual = [
                row.opening_balance,
                row.period_debits,
                row.period_credits,
                row.closing_balance,
            ];
            for ((field, expected), actual) in ROLLUP_FIELDS.into_iter().zip(sums).zip(actual) {
                if expected != actual {
                    return Err(ReportError::RollupMismatch {
                        account_id: row.account_id,
                        field,
                        expected,
                        actual,
                    });
                }
            }
        }

        Ok(())
    }

    /// Post-hoc check of a stored entry: items balance exactly and carry
    /// non-negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `CorruptItem` or `CorruptEntry`.
    pub fn verify_entry(entry: &JournalEntry, items: &[JournalItem]) -> Result<(), LedgerError> {
        if items
            .iter()
            .any(|i| i.debit < Decimal::ZERO || i.credit < Decimal::ZERO)
        {
            return Err(LedgerError::CorruptItem(entry.id));
        }

        let totals = EntryTotals::from_amounts(items.iter().map(|i| (i.debit, i.credit)))
            .ok_or(LedgerError::CorruptItem(entry.id))?;
        if !totals.is_balanced {
            return Err(LedgerError::CorruptEntry {
                entry_id: entry.id,
                debit: totals.total_debit,
                credit: totals.total_credit,
            });
        }

        Ok(())
    }
}
