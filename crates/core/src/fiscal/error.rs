//! Fiscal calendar and lifecycle errors.
//!
//! Every lifecycle rejection names the precondition that failed; callers
//! never see a generic "invalid transition".

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::lifecycle::PeriodScope;
use super::period::FiscalYearType;
use crate::auth::AuthorizationError;
use crate::error::{DomainError, ErrorKind};

/// Errors raised by the period hierarchy manager and lifecycle machine.
#[derive(Debug, Error)]
pub enum FiscalError {
    // ========== Creation ==========
    /// Start date must be before end date.
    #[error("Start date {start} must be before end date {end}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// The range is not the twelve months of the convention.
    #[error(
        "Range {start}..{end} is not a full {fiscal_year_type} fiscal year \
         (must start on the 1st of its first month and end on the last day of its twelfth)"
    )]
    NotConventionSpan {
        /// Convention requested.
        fiscal_year_type: FiscalYearType,
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// The company already uses another convention.
    #[error("Company fiscal years use the {expected} convention, not {requested}")]
    ConventionMismatch {
        /// Convention fixed by existing fiscal years.
        expected: FiscalYearType,
        /// Convention requested.
        requested: FiscalYearType,
    },

    /// Fiscal year overlaps with an existing year.
    #[error("Fiscal year overlaps with existing year: {0}")]
    OverlappingYear(String),

    /// Fiscal year name is blank.
    #[error("Fiscal year name must not be empty")]
    EmptyName,

    /// Monthly periods were already generated.
    #[error("Monthly periods already exist for fiscal year {0}")]
    PeriodsAlreadyInitialized(Uuid),

    /// Generated periods do not tile the fiscal year.
    #[error("Monthly periods do not partition fiscal year {0} exactly")]
    PartitionMismatch(Uuid),

    // ========== Lookup ==========
    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(Uuid),

    /// Monthly period not found.
    #[error("Monthly period not found: {0}")]
    PeriodNotFound(Uuid),

    /// No monthly period covers the date.
    #[error("No monthly period covers {0}")]
    NoPeriodForDate(NaiveDate),

    /// A monthly period was paired with a fiscal year it does not belong to.
    #[error("Monthly period {period} does not belong to fiscal year {fiscal_year}")]
    ParentMismatch {
        /// Monthly period.
        period: Uuid,
        /// Fiscal year given as its parent.
        fiscal_year: Uuid,
    },

    // ========== Lifecycle ==========
    /// Activation of an active period.
    #[error("{scope} {id} is already active")]
    AlreadyActive {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Deactivation of an inactive period.
    #[error("{scope} {id} is already inactive")]
    AlreadyInactive {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Closing a closed period.
    #[error("{scope} {id} is already closed")]
    AlreadyClosed {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Activation or deactivation of a closed period.
    #[error("{scope} {id} is closed")]
    PeriodClosed {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Reopening a period that is not closed.
    #[error("{scope} {id} is not closed")]
    NotClosed {
        /// Kind of period.
        scope: PeriodScope,
        /// Period id.
        id: Uuid,
    },

    /// Parent fiscal year is inactive.
    #[error("Parent fiscal year {0} is inactive")]
    ParentInactive(Uuid),

    /// Parent fiscal year is closed.
    #[error("Parent fiscal year {0} is closed")]
    ParentClosed(Uuid),

    /// Reopen without a justification.
    #[error("Reopening requires a non-empty reason")]
    ReopenReasonRequired,

    /// Actor lacks the permission.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
}

impl DomainError for FiscalError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateRange { .. }
            | Self::NotConventionSpan { .. }
            | Self::ConventionMismatch { .. }
            | Self::OverlappingYear(_)
            | Self::EmptyName
            | Self::NoPeriodForDate(_)
            | Self::ReopenReasonRequired => ErrorKind::Validation,
            Self::PeriodsAlreadyInitialized(_)
            | Self::AlreadyActive { .. }
            | Self::AlreadyInactive { .. }
            | Self::AlreadyClosed { .. }
            | Self::PeriodClosed { .. }
            | Self::NotClosed { .. }
            | Self::ParentInactive(_)
            | Self::ParentClosed(_) => ErrorKind::StateConflict,
            Self::PartitionMismatch(_) | Self::ParentMismatch { .. } => ErrorKind::Integrity,
            Self::FiscalYearNotFound(_) | Self::PeriodNotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(e) => e.kind(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::NotConventionSpan { .. } => "NOT_CONVENTION_SPAN",
            Self::ConventionMismatch { .. } => "CONVENTION_MISMATCH",
            Self::OverlappingYear(_) => "OVERLAPPING_FISCAL_YEAR",
            Self::EmptyName => "EMPTY_NAME",
            Self::PeriodsAlreadyInitialized(_) => "PERIODS_ALREADY_INITIALIZED",
            Self::PartitionMismatch(_) => "PARTITION_MISMATCH",
            Self::FiscalYearNotFound(_) => "FISCAL_YEAR_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::ParentMismatch { .. } => "PARENT_MISMATCH",
            Self::AlreadyActive { .. } => "ALREADY_ACTIVE",
            Self::AlreadyInactive { .. } => "ALREADY_INACTIVE",
            Self::AlreadyClosed { .. } => "ALREADY_CLOSED",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::NotClosed { .. } => "NOT_CLOSED",
            Self::ParentInactive(_) => "PARENT_FISCAL_YEAR_INACTIVE",
            Self::ParentClosed(_) => "PARENT_FISCAL_YEAR_CLOSED",
            Self::ReopenReasonRequired => "REOPEN_REASON_REQUIRED",
            Self::Unauthorized(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_errors_are_state_conflicts() {
        let id = Uuid::nil();
        let scope = PeriodScope::MonthlyPeriod;
        for err in [
            FiscalError::AlreadyActive { scope, id },
            FiscalError::AlreadyClosed { scope, id },
            FiscalError::PeriodClosed { scope, id },
            FiscalError::ParentInactive(id),
            FiscalError::ParentClosed(id),
            FiscalError::PeriodsAlreadyInitialized(id),
        ] {
            assert_eq!(err.kind(), ErrorKind::StateConflict, "{err}");
            assert_eq!(err.http_status_code(), 409);
        }
    }

    #[test]
    fn test_messages_name_the_precondition() {
        let id = Uuid::nil();
        assert_eq!(
            FiscalError::AlreadyClosed {
                scope: PeriodScope::FiscalYear,
                id
            }
            .to_string(),
            format!("fiscal year {id} is already closed")
        );
        assert_eq!(
            FiscalError::ParentInactive(id).to_string(),
            format!("Parent fiscal year {id} is inactive")
        );
        assert_eq!(
            FiscalError::ReopenReasonRequired.kind(),
            ErrorKind::Validation
        );
    }
}
