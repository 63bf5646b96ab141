//! Account domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use fiscus_shared::types::{AccountId, OrganizationId};

use super::error::AccountError;

/// Classification of an account. Determines its nature and code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owners' residual interest.
    Equity,
    /// Earned revenue.
    Income,
    /// Operating expenses.
    Expense,
    /// Cost of sales.
    Cost,
    /// Off-balance memorandum accounts.
    Memo,
}

impl AccountType {
    /// Every account type, in code-prefix order.
    pub const ALL: [Self; 7] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
        Self::Cost,
        Self::Memo,
    ];

    /// Side on which balances of this type normally sit.
    ///
    /// - Asset/Expense/Cost/Memo: debit-normal
    /// - Liability/Equity/Income: credit-normal
    #[must_use]
    pub const fn nature(self) -> Nature {
        match self {
            Self::Asset | Self::Expense | Self::Cost | Self::Memo => Nature::Debit,
            Self::Liability | Self::Equity | Self::Income => Nature::Credit,
        }
    }

    /// Leading digit of every root code of this type.
    #[must_use]
    pub const fn code_prefix(self) -> char {
        match self {
            Self::Asset => '1',
            Self::Liability => '2',
            Self::Equity => '3',
            Self::Income => '4',
            Self::Expense => '5',
            Self::Cost => '6',
            Self::Memo => '9',
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Cost => "cost",
            Self::Memo => "memo",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AccountError::UnknownAccountType(s.to_string()))
    }
}

/// Normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nature {
    /// Balance grows with debits.
    Debit,
    /// Balance grows with credits.
    Credit,
}

impl Nature {
    /// Signed balance movement for the given debit and credit amounts.
    ///
    /// - Debit-normal: debit - credit
    /// - Credit-normal: credit - debit
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn signed(self, debit: Decimal, credit: Decimal) -> Option<Decimal> {
        match self {
            Self::Debit => debit.checked_sub(credit),
            Self::Credit => credit.checked_sub(debit),
        }
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Hierarchical code; always prefixed by the parent's code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Parent group account, if any.
    pub parent_id: Option<AccountId>,
    /// Whether this account groups subaccounts instead of receiving postings.
    pub is_parent: bool,
    /// Inactive accounts are excluded from reports and postings.
    pub is_active: bool,
}

impl Account {
    /// Normal balance side of this account.
    #[must_use]
    pub const fn nature(&self) -> Nature {
        self.account_type.nature()
    }
}

/// Request to open an account. The code is generated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Account classification; must equal the parent's.
    pub account_type: AccountType,
    /// Parent group account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// Whether the account groups subaccounts.
    #[serde(default)]
    pub is_parent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_nature_by_type() {
        assert_eq!(AccountType::Asset.nature(), Nature::Debit);
        assert_eq!(AccountType::Expense.nature(), Nature::Debit);
        assert_eq!(AccountType::Cost.nature(), Nature::Debit);
        assert_eq!(AccountType::Memo.nature(), Nature::Debit);
        assert_eq!(AccountType::Liability.nature(), Nature::Credit);
        assert_eq!(AccountType::Equity.nature(), Nature::Credit);
        assert_eq!(AccountType::Income.nature(), Nature::Credit);
    }

    #[test]
    fn test_signed_movement() {
        assert_eq!(Nature::Debit.signed(dec!(500), dec!(200)), Some(dec!(300)));
        assert_eq!(Nature::Credit.signed(dec!(500), dec!(200)), Some(dec!(-300)));
        assert_eq!(Nature::Debit.signed(Decimal::MIN, Decimal::MAX), None);
    }

    #[test]
    fn test_code_prefixes_are_distinct() {
        let prefixes: std::collections::HashSet<char> =
            AccountType::ALL.iter().map(|t| t.code_prefix()).collect();
        assert_eq!(prefixes.len(), AccountType::ALL.len());
    }

    #[test]
    fn test_parse_account_type() {
        assert_eq!("Income".parse::<AccountType>().unwrap(), AccountType::Income);
        assert_eq!(" memo ".parse::<AccountType>().unwrap(), AccountType::Memo);
        assert!("revenue".parse::<AccountType>().is_err());
    }
}
