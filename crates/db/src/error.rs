//! Repository error type.

use sea_orm::{DbErr, RuntimeErr};
use fiscus_core::account::AccountError;
use fiscus_core::auth::AuthorizationError;
use fiscus_core::fiscal::FiscalError;
use fiscus_core::ledger::LedgerError;
use fiscus_core::reports::ReportError;
use fiscus_core::{DomainError, ErrorKind};

/// Error returned by every repository.
///
/// Domain rejections pass through untouched; storage failures are
/// infrastructure errors.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Fiscal calendar or lifecycle rule violated.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Account hierarchy rule violated.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Posting rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Report could not be computed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Actor lacks the permission.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    /// Background computation was cancelled or panicked.
    #[error("Report computation failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns true when the database rejected a write on a unique index.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(e) if is_unique_violation(e))
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

impl DomainError for RepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Fiscal(e) => e.kind(),
            Self::Account(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Report(e) => e.kind(),
            Self::Unauthorized(e) => e.kind(),
            Self::Task(_) | Self::Database(_) => ErrorKind::Infrastructure,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Fiscal(e) => e.error_code(),
            Self::Account(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Unauthorized(e) => e.error_code(),
            Self::Task(_) => "COMPUTATION_FAILED",
            Self::Database(DbErr::RecordNotFound(_)) => "RECORD_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Connection-level failures only. Callers still decide whether the
    /// operation itself is safe to repeat.
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(
                DbErr::ConnectionAcquire(_) | DbErr::Conn(RuntimeErr::SqlxError(_))
            )
        )
    }
}
