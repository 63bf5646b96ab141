//! Report error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use fiscus_shared::types::{AccountId, JournalEntryId};

use crate::account::AccountError;
use crate::error::{DomainError, ErrorKind};

/// Errors that can occur during report generation and verification.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// An approved posting references a group account.
    #[error("Journal entry {entry_id} posts directly to group account {account_id}")]
    DirectPostingToGroup {
        /// Group account.
        account_id: AccountId,
        /// Offending entry.
        entry_id: JournalEntryId,
    },

    /// A group row is not the sum of its leaf descendants.
    #[error(
        "Group account {account_id} {field} is {actual}, but its leaf descendants sum to {expected}"
    )]
    RollupMismatch {
        /// Group account.
        account_id: AccountId,
        /// Column that disagrees.
        field: &'static str,
        /// Sum of leaf descendants.
        expected: Decimal,
        /// Value in the report.
        actual: Decimal,
    },

    /// Accumulated figures exceed the decimal range.
    #[error("Figures of account {0} overflow the decimal range")]
    AmountOverflow(AccountId),

    /// Report totals exceed the decimal range.
    #[error("Trial balance totals overflow the decimal range")]
    TotalsOverflow,

    /// The account hierarchy could not be built.
    #[error(transparent)]
    Hierarchy(#[from] AccountError),
}

impl DomainError for ReportError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateRange { .. } => ErrorKind::Validation,
            Self::DirectPostingToGroup { .. }
            | Self::RollupMismatch { .. }
            | Self::AmountOverflow(_)
            | Self::TotalsOverflow => ErrorKind::Integrity,
            Self::Hierarchy(e) => e.kind(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::DirectPostingToGroup { .. } => "DIRECT_POSTING_TO_GROUP",
            Self::RollupMismatch { .. } => "ROLLUP_MISMATCH",
            Self::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            Self::TotalsOverflow => "TOTALS_OVERFLOW",
            Self::Hierarchy(e) => e.error_code(),
        }
    }
}
