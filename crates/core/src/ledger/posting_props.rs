//! Property tests for posting line validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::posting::tests::{credit, debit};
use super::posting::validate_lines;
use crate::account::AccountType;
use crate::account::hierarchy::tests::account;

/// Amounts from 0.0001 to 1,000,000.0000.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Debits split across any number of lines against one balancing credit
    /// are accepted, and totals are exact sums.
    #[test]
    fn prop_balanced_lines_accepted(amounts in prop::collection::vec(positive_amount(), 1..12)) {
        let expense = account("5000000", AccountType::Expense, None, false);
        let cash = account("1000000", AccountType::Asset, None, false);
        let total: Decimal = amounts.iter().copied().sum();

        let mut lines: Vec<_> = amounts.iter().map(|a| debit(&expense, *a)).collect();
        lines.push(credit(&cash, total));

        let totals = validate_lines(&lines).unwrap();
        prop_assert_eq!(totals.total_debit, total);
        prop_assert_eq!(totals.total_credit, total);
        prop_assert!(totals.is_balanced);
    }

    /// Any difference between the sides, however small, is rejected.
    #[test]
    fn prop_any_imbalance_rejected(amount in positive_amount(), delta in positive_amount()) {
        let expense = account("5000000", AccountType::Expense, None, false);
        let cash = account("1000000", AccountType::Asset, None, false);
        let lines = vec![debit(&expense, amount), credit(&cash, amount + delta / Decimal::from(1000))];

        let is_unbalanced = matches!(validate_lines(&lines), Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }

    /// Negative amounts are rejected whatever the balance.
    #[test]
    fn prop_negative_amount_rejected(amount in positive_amount()) {
        let expense = account("5000000", AccountType::Expense, None, false);
        let cash = account("1000000", AccountType::Asset, None, false);
        let lines = vec![debit(&expense, -amount), credit(&cash, -amount)];

        let is_negative = matches!(validate_lines(&lines), Err(LedgerError::NegativeAmount(1)));
        prop_assert!(is_negative);
    }
}
