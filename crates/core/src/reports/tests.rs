//! Property-based tests for the trial balance.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::trial_balance::TrialBalanceAggregator;
use super::types::TrialBalanceQuery;
use super::verifier::BalanceVerifier;
use crate::account::hierarchy::tests::account;
use crate::account::{Account, AccountTree, AccountType};
use crate::ledger::LedgerItem;
use fiscus_shared::types::JournalEntryId;

/// Node `i` optionally links to an earlier node; roots draw a type.
fn forest_strategy() -> impl Strategy<Value = Vec<(Option<prop::sample::Index>, AccountType)>> {
    prop::collection::vec(
        (
            any::<Option<prop::sample::Index>>(),
            prop::sample::select(AccountType::ALL.to_vec()),
        ),
        2..24,
    )
}

fn build_accounts(shape: &[(Option<prop::sample::Index>, AccountType)]) -> Vec<Account> {
    let mut accounts: Vec<Account> = Vec::with_capacity(shape.len());
    for (i, (link, account_type)) in shape.iter().enumerate() {
        let parent = match link {
            Some(idx) if i > 0 => Some(idx.index(i)),
            _ => None,
        };
        let (parent_account, account_type) = match parent {
            Some(p) => (Some(&accounts[p]), accounts[p].account_type),
            None => (None, *account_type),
        };
        let child = account(&format!("{i:04}"), account_type, parent_account, false);
        accounts.push(child);
    }
    let parent_ids: Vec<_> = accounts.iter().filter_map(|a| a.parent_id).collect();
    for a in &mut accounts {
        a.is_parent = parent_ids.contains(&a.id);
    }
    accounts
}

/// Entries as (debit leaf index, credit leaf index, cents, day offset).
fn entries_strategy() -> impl Strategy<Value = Vec<(prop::sample::Index, prop::sample::Index, i64, i64)>> {
    prop::collection::vec(
        (
            any::<prop::sample::Index>(),
            any::<prop::sample::Index>(),
            1i64..10_000_000,
            0i64..730,
        ),
        0..40,
    )
}

fn build_items(
    accounts: &[Account],
    entries: &[(prop::sample::Index, prop::sample::Index, i64, i64)],
) -> Vec<LedgerItem> {
    let leaves: Vec<&Account> = accounts.iter().filter(|a| !a.is_parent).collect();
    let first_day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut items = Vec::with_capacity(entries.len() * 2);
    for (debit_idx, credit_idx, cents, offset) in entries {
        let entry_id = JournalEntryId::new();
        let entry_date = first_day + Duration::days(*offset);
        let amount = Decimal::new(*cents, 2);
        items.push(LedgerItem {
            entry_id,
            account_id: debit_idx.get(&leaves).id,
            entry_date,
            debit: amount,
            credit: Decimal::ZERO,
            participates: true,
        });
        items.push(LedgerItem {
            entry_id,
            account_id: credit_idx.get(&leaves).id,
            entry_date,
            debit: Decimal::ZERO,
            credit: amount,
            participates: true,
        });
    }
    items
}

fn query_2024() -> TrialBalanceQuery {
    TrialBalanceQuery::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every group row equals the exact sum of its transitive leaf
    /// descendants, and balanced entries give a balanced report.
    #[test]
    fn prop_parent_rows_sum_leaf_descendants(
        shape in forest_strategy(),
        entries in entries_strategy(),
    ) {
        let accounts = build_accounts(&shape);
        let items = build_items(&accounts, &entries);
        let tree = AccountTree::build(accounts.clone()).unwrap();

        let tb = TrialBalanceAggregator::default()
            .compute(&query_2024(), accounts, &items)
            .unwrap();

        prop_assert!(BalanceVerifier::verify_rollups(&tb).is_ok());
        for row in tb.accounts.iter().filter(|r| !r.is_leaf) {
            let leaves = tree.leaf_descendants(row.account_id);
            let debits: Decimal = leaves.iter().map(|id| tb.row(*id).unwrap().period_debits).sum();
            let credits: Decimal = leaves.iter().map(|id| tb.row(*id).unwrap().period_credits).sum();
            prop_assert_eq!(row.period_debits, debits);
            prop_assert_eq!(row.period_credits, credits);
        }

        prop_assert_eq!(tb.totals.difference, Decimal::ZERO);
        prop_assert!(tb.is_balanced);
        prop_assert!(BalanceVerifier::default().verify(&tb).unwrap().is_balanced);
    }

    /// Identical inputs give identical reports, whatever the item order.
    #[test]
    fn prop_trial_balance_is_idempotent(
        shape in forest_strategy(),
        entries in entries_strategy(),
    ) {
        let accounts = build_accounts(&shape);
        let items = build_items(&accounts, &entries);
        let aggregator = TrialBalanceAggregator::default();

        let first = aggregator.compute(&query_2024(), accounts.clone(), &items).unwrap();
        let second = aggregator.compute(&query_2024(), accounts.clone(), &items).unwrap();
        prop_assert_eq!(&first, &second);

        let mut reversed = items.clone();
        reversed.reverse();
        let third = aggregator.compute(&query_2024(), accounts, &reversed).unwrap();
        prop_assert_eq!(&first, &third);
    }

    /// Closing balances carry forward: the closing balance of one year is
    /// the opening balance of the next.
    #[test]
    fn prop_closing_rolls_into_next_opening(
        shape in forest_strategy(),
        entries in entries_strategy(),
    ) {
        let accounts = build_accounts(&shape);
        let items = build_items(&accounts, &entries);
        let aggregator = TrialBalanceAggregator::default();

        let year_2023 = TrialBalanceQuery::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        );
        let before = aggregator.compute(&year_2023, accounts.clone(), &items).unwrap();
        let after = aggregator.compute(&query_2024(), accounts, &items).unwrap();

        for (prev, next) in before.accounts.iter().zip(&after.accounts) {
            prop_assert_eq!(prev.account_id, next.account_id);
            prop_assert_eq!(prev.closing_balance, next.opening_balance);
        }
    }
}
