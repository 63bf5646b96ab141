//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant corresponds to one class of failure a caller may react to
/// differently: fix the input, refresh state, escalate, or retry.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The actor lacks the required permission.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation is illegal in the subject's current lifecycle state.
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Stored data breaks a ledger invariant.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Storage failure or timeout.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::StateConflict(_) => 409,
            Self::Integrity(_) => 422,
            Self::Infrastructure(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Infrastructure(_) => "INFRASTRUCTURE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
