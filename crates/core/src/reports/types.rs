//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use fiscus_shared::types::AccountId;

use crate::account::{AccountType, Nature};

/// Trial balance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceQuery {
    /// First day of the period, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Account types to include; empty means all.
    #[serde(default)]
    pub account_types: Vec<AccountType>,
}

impl TrialBalanceQuery {
    /// Creates a query over all account types.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            account_types: Vec::new(),
        }
    }

    /// Restricts the query to the given account types.
    #[must_use]
    pub fn with_types(mut self, account_types: impl IntoIterator<Item = AccountType>) -> Self {
        self.account_types = account_types.into_iter().collect();
        self
    }

    /// Returns true if accounts of `account_type` are in scope.
    #[must_use]
    pub fn includes(&self, account_type: AccountType) -> bool {
        self.account_types.is_empty() || self.account_types.contains(&account_type)
    }
}

/// One row of the trial balance.
///
/// Balances are signed by the account's nature: positive means the balance
/// sits on its normal side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Normal balance side.
    pub nature: Nature,
    /// Parent account in the report, if any.
    pub parent_id: Option<AccountId>,
    /// Distance from the root, roots are 0.
    pub depth: usize,
    /// Whether the row has no children in the report.
    pub is_leaf: bool,
    /// Balance before the start date.
    pub opening_balance: Decimal,
    /// Debits within the range.
    pub period_debits: Decimal,
    /// Credits within the range.
    pub period_credits: Decimal,
    /// Opening balance plus the range's signed movement.
    pub closing_balance: Decimal,
}

impl HierarchicalBalance {
    /// Closing balance shown in the debit column, zero if it sits on the
    /// credit side.
    #[must_use]
    pub fn closing_debit(&self) -> Decimal {
        match self.nature {
            Nature::Debit => self.closing_balance.max(Decimal::ZERO),
            Nature::Credit => (-self.closing_balance).max(Decimal::ZERO),
        }
    }

    /// Closing balance shown in the credit column, zero if it sits on the
    /// debit side.
    #[must_use]
    pub fn closing_credit(&self) -> Decimal {
        match self.nature {
            Nature::Debit => (-self.closing_balance).max(Decimal::ZERO),
            Nature::Credit => self.closing_balance.max(Decimal::ZERO),
        }
    }
}

/// Trial balance totals, summed over leaf rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debits: Decimal,
    /// Total credit.
    pub total_credits: Decimal,
    /// `total_debits - total_credits`.
    pub difference: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Rows in hierarchy pre-order, siblings by code.
    pub accounts: Vec<HierarchicalBalance>,
    /// Leaf totals.
    pub totals: TrialBalanceTotals,
    /// Whether the difference is within tolerance.
    pub is_balanced: bool,
}

impl TrialBalance {
    /// Leaf rows only.
    pub fn leaves(&self) -> impl Iterator<Item = &HierarchicalBalance> {
        self.accounts.iter().filter(|row| row.is_leaf)
    }

    /// Finds the row of an account.
    #[must_use]
    pub fn row(&self, account_id: AccountId) -> Option<&HierarchicalBalance> {
        self.accounts.iter().find(|row| row.account_id == account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn row(nature: Nature, closing_balance: Decimal) -> HierarchicalBalance {
        HierarchicalBalance {
            account_id: AccountId::new(),
            code: "1000000".to_string(),
            name: "Cash".to_string(),
            account_type: AccountType::Asset,
            nature,
            parent_id: None,
            depth: 0,
            is_leaf: true,
            opening_balance: Decimal::ZERO,
            period_debits: Decimal::ZERO,
            period_credits: Decimal::ZERO,
            closing_balance,
        }
    }

    #[rstest]
    #[case(Nature::Debit, dec!(800), dec!(800), dec!(0))]
    #[case(Nature::Debit, dec!(-50), dec!(0), dec!(50))]
    #[case(Nature::Credit, dec!(800), dec!(0), dec!(800))]
    #[case(Nature::Credit, dec!(-12.5), dec!(12.5), dec!(0))]
    fn test_closing_columns(
        #[case] nature: Nature,
        #[case] closing: Decimal,
        #[case] debit: Decimal,
        #[case] credit: Decimal,
    ) {
        let r = row(nature, closing);
        assert_eq!(r.closing_debit(), debit);
        assert_eq!(r.closing_credit(), credit);
    }

    #[test]
    fn test_query_type_filter() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let all = TrialBalanceQuery::new(start, end);
        assert!(all.includes(AccountType::Memo));

        let some = all.with_types([AccountType::Asset, AccountType::Income]);
        assert!(some.includes(AccountType::Income));
        assert!(!some.includes(AccountType::Expense));
    }
}
