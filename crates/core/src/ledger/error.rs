//! Ledger error types for posting and voiding journal entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use fiscus_shared::types::{AccountId, JournalEntryId};
use uuid::Uuid;

use crate::auth::AuthorizationError;
use crate::error::{DomainError, ErrorKind};
use crate::fiscal::PeriodScope;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line carries neither a debit nor a credit.
    #[error("Line {0} has neither a debit nor a credit amount")]
    ZeroLine(usize),

    /// Line amount cannot be negative.
    #[error("Line {0} has a negative amount")]
    NegativeAmount(usize),

    /// Line must specify either debit or credit, not both.
    #[error("Line {0} specifies both a debit and a credit amount")]
    BothSides(usize),

    /// Line amount carries more fractional digits than the ledger stores.
    #[error("Line {line} has {scale} fractional digits; at most {max} are allowed")]
    ExcessPrecision {
        /// 1-based line number.
        line: usize,
        /// Fractional digits supplied.
        scale: u32,
        /// Fractional digits stored.
        max: u32,
    },

    /// Line amount does not fit the ledger's amount column.
    #[error("Line {0} amount exceeds the largest storable amount")]
    AmountOutOfRange(usize),

    /// Entry totals do not fit the ledger's amount column.
    #[error("Journal entry totals exceed the largest storable amount")]
    TotalOutOfRange,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Group accounts only aggregate their children.
    #[error("Account {0} is a parent (group) account and cannot receive postings")]
    GroupAccount(AccountId),

    // ========== Period Errors ==========
    /// No monthly period covers the entry date.
    #[error("No monthly period covers {0}")]
    NoPeriodForDate(NaiveDate),

    /// Posting or voiding inside a closed period.
    #[error("{scope} {id} is closed")]
    PeriodClosed {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Posting inside an inactive period.
    #[error("{scope} {id} is inactive")]
    PeriodInactive {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    // ========== Entry State Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Voiding a voided entry.
    #[error("Journal entry {0} is already voided")]
    AlreadyVoided(JournalEntryId),

    // ========== Integrity Errors ==========
    /// A stored entry's items do not balance.
    #[error("Stored journal entry {entry_id} is not balanced. Debit: {debit}, Credit: {credit}")]
    CorruptEntry {
        /// Offending entry.
        entry_id: JournalEntryId,
        /// Sum of item debits.
        debit: Decimal,
        /// Sum of item credits.
        credit: Decimal,
    },

    /// A stored entry carries a negative item amount.
    #[error("Stored journal entry {0} has a negative item amount")]
    CorruptItem(JournalEntryId),

    /// Actor lacks the permission.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
}

impl DomainError for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::Unbalanced { .. }
            | Self::ZeroLine(_)
            | Self::NegativeAmount(_)
            | Self::BothSides(_)
            | Self::ExcessPrecision { .. }
            | Self::AmountOutOfRange(_)
            | Self::TotalOutOfRange
            | Self::AccountNotFound(_)
            | Self::AccountInactive(_)
            | Self::GroupAccount(_)
            | Self::NoPeriodForDate(_) => ErrorKind::Validation,
            Self::PeriodClosed { .. } | Self::PeriodInactive { .. } | Self::AlreadyVoided(_) => {
                ErrorKind::StateConflict
            }
            Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::CorruptEntry { .. } | Self::CorruptItem(_) => ErrorKind::Integrity,
            Self::Unauthorized(e) => e.kind(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::ZeroLine(_) => "ZERO_LINE",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::BothSides(_) => "BOTH_SIDES",
            Self::ExcessPrecision { .. } => "EXCESS_PRECISION",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::TotalOutOfRange => "TOTAL_OUT_OF_RANGE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::GroupAccount(_) => "GROUP_ACCOUNT",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::PeriodInactive { .. } => "PERIOD_INACTIVE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::CorruptEntry { .. } => "CORRUPT_ENTRY",
            Self::CorruptItem(_) => "CORRUPT_ITEM",
            Self::Unauthorized(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientLines.error_code(),
            "INSUFFICIENT_LINES"
        );
        assert_eq!(
            LedgerError::Unbalanced {
                debit: dec!(100),
                credit: dec!(50)
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
    }

    #[test]
    fn test_http_status_codes() {
        let period = PeriodScope::MonthlyPeriod;
        assert_eq!(LedgerError::InsufficientLines.http_status_code(), 400);
        assert_eq!(
            LedgerError::PeriodClosed {
                scope: period,
                id: Uuid::nil()
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::CorruptItem(JournalEntryId::new()).http_status_code(),
            422
        );
        assert_eq!(
            LedgerError::EntryNotFound(JournalEntryId::new()).http_status_code(),
            404
        );
    }
}
