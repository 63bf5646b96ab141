//! Trial balance aggregation over the account hierarchy.
//!
//! Leaf figures come from postings; group figures are always derived as the
//! sum of their children, walking the pre-order in reverse so every child is
//! finished before its parent.

use std::collections::HashMap;

use rayon::prelude::*;
use rust_decimal::Decimal;
use fiscus_shared::LedgerConfig;
use fiscus_shared::types::AccountId;
use fiscus_shared::types::money::within_tolerance;

use super::error::ReportError;
use super::types::{HierarchicalBalance, TrialBalance, TrialBalanceQuery, TrialBalanceTotals};
use crate::account::{Account, AccountTree, Nature};
use crate::ledger::LedgerItem;

/// Default tolerance for the debit/credit check.
pub const DEFAULT_BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Raw debit and credit sums of one account, split at the start date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Movement {
    prior_debits: Decimal,
    prior_credits: Decimal,
    period_debits: Decimal,
    period_credits: Decimal,
}

impl Movement {
    fn checked_merge(self, other: Self) -> Option<Self> {
        Some(Self {
            prior_debits: self.prior_debits.checked_add(other.prior_debits)?,
            prior_credits: self.prior_credits.checked_add(other.prior_credits)?,
            period_debits: self.period_debits.checked_add(other.period_debits)?,
            period_credits: self.period_credits.checked_add(other.period_credits)?,
        })
    }
}

/// Signed figures of one row.
#[derive(Debug, Clone, Copy, Default)]
struct Figures {
    opening: Decimal,
    debits: Decimal,
    credits: Decimal,
    closing: Decimal,
}

impl Figures {
    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self {
            opening: self.opening.checked_add(rhs.opening)?,
            debits: self.debits.checked_add(rhs.debits)?,
            credits: self.credits.checked_add(rhs.credits)?,
            closing: self.closing.checked_add(rhs.closing)?,
        })
    }

    fn of_leaf(nature: Nature, m: Movement) -> Option<Self> {
        let opening = nature.signed(m.prior_debits, m.prior_credits)?;
        let movement = nature.signed(m.period_debits, m.period_credits)?;
        Some(Self {
            opening,
            debits: m.period_debits,
            credits: m.period_credits,
            closing: opening.checked_add(movement)?,
        })
    }
}

/// Computes trial balances.
#[derive(Debug, Clone, Copy)]
pub struct TrialBalanceAggregator {
    tolerance: Decimal,
}

impl Default for TrialBalanceAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE_TOLERANCE)
    }
}

impl TrialBalanceAggregator {
    /// Creates an aggregator with the given balance tolerance.
    #[must_use]
    pub const fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Creates an aggregator from the ledger configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.balance_tolerance)
    }

    /// Balance tolerance in use.
    #[must_use]
    pub const fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Computes the trial balance of `query` from `accounts` and `items`.
    ///
    /// Inactive accounts and accounts of excluded types are dropped first;
    /// items referencing dropped or unknown accounts, items of entries that
    /// do not participate, and items dated after the end date are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - start_date > end_date
    /// - stored parent links form a cycle
    /// - a participating item posts to an account with children
    pub fn compute(
        &self,
        query: &TrialBalanceQuery,
        accounts: impl IntoIterator<Item = Account>,
        items: &[LedgerItem],
    ) -> Result<TrialBalance, ReportError> {
        if query.start_date > query.end_date {
            return Err(ReportError::InvalidDateRange {
                start: query.start_date,
                end: query.end_date,
            });
        }

        let tree = AccountTree::build(
            accounts
                .into_iter()
                .filter(|a| a.is_active && query.includes(a.account_type)),
        )?;

        let movements = accumulate(&tree, query, items)?;
        let order = tree.preorder();

        // Children precede parents in reverse pre-order
        let mut figures: HashMap<AccountId, Figures> = HashMap::with_capacity(order.len());
        for &(id, _) in order.iter().rev() {
            let Some(account) = tree.get(id) else {
                continue;
            };
            let row = if tree.is_leaf(id) {
                let m = movements.get(&id).copied().unwrap_or_default();
                Figures::of_leaf(account.nature(), m)
            } else {
                tree.children(id)
                    .iter()
                    .filter_map(|child| figures.get(child).copied())
                    .try_fold(Figures::default(), Figures::checked_add)
            };
            figures.insert(id, row.ok_or(ReportError::AmountOverflow(id))?);
        }

        let rows: Vec<HierarchicalBalance> = order
            .iter()
            .filter_map(|&(id, depth)| {
                let account = tree.get(id)?;
                let f = figures.get(&id).copied().unwrap_or_default();
                Some(HierarchicalBalance {
                    account_id: id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    nature: account.nature(),
                    parent_id: tree.parent_of(id),
                    depth,
                    is_leaf: tree.is_leaf(id),
                    opening_balance: f.opening,
                    period_debits: f.debits,
                    period_credits: f.credits,
                    closing_balance: f.closing,
                })
            })
            .collect();

        let totals = leaf_totals(&rows)?;
        let is_balanced = within_tolerance(totals.total_debits, totals.total_credits, self.tolerance);

        Ok(TrialBalance {
            start_date: query.start_date,
            end_date: query.end_date,
            accounts: rows,
            totals,
            is_balanced,
        })
    }
}

/// Sums period debits and credits over leaf rows.
pub(crate) fn leaf_totals(rows: &[HierarchicalBalance]) -> Result<TrialBalanceTotals, ReportError> {
    let (total_debits, total_credits) = rows
        .iter()
        .filter(|row| row.is_leaf)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(d, c), row| {
            Some((d.checked_add(row.period_debits)?, c.checked_add(row.period_credits)?))
        })
        .ok_or(ReportError::TotalsOverflow)?;
    Ok(TrialBalanceTotals {
        total_debits,
        total_credits,
        difference: total_debits
            .checked_sub(total_credits)
            .ok_or(ReportError::TotalsOverflow)?,
    })
}

/// Per-account movements of the participating items in scope.
fn accumulate(
    tree: &AccountTree,
    query: &TrialBalanceQuery,
    items: &[LedgerItem],
) -> Result<HashMap<AccountId, Movement>, ReportError> {
    items
        .par_iter()
        .filter(|item| {
            item.participates && item.entry_date <= query.end_date && tree.contains(item.account_id)
        })
        .try_fold(HashMap::new, |mut acc: HashMap<AccountId, Movement>, item| {
            if !tree.is_leaf(item.account_id) {
                return Err(ReportError::DirectPostingToGroup {
                    account_id: item.account_id,
                    entry_id: item.entry_id,
                });
            }
            let m = acc.entry(item.account_id).or_default();
            let posted = if item.entry_date < query.start_date {
                Movement {
                    prior_debits: item.debit,
                    prior_credits: item.credit,
                    ..Movement::default()
                }
            } else {
                Movement {
                    period_debits: item.debit,
                    period_credits: item.credit,
                    ..Movement::default()
                }
            };
            *m = m
                .checked_merge(posted)
                .ok_or(ReportError::AmountOverflow(item.account_id))?;
            Ok(acc)
        })
        .try_reduce(HashMap::new, |mut left, right| {
            for (id, m) in right {
                let merged = left.entry(id).or_default();
                *merged = merged
                    .checked_merge(m)
                    .ok_or(ReportError::AmountOverflow(id))?;
            }
            Ok(left)
        })
}
