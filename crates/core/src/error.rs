//! Error taxonomy shared by every core module.
//!
//! Module errors stay specific (`AccountError`, `FiscalError`, ...) but each
//! one classifies itself into an [`ErrorKind`], which is what callers branch
//! on: fix input, refresh state, escalate, or retry.

use serde::Serialize;

/// Class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input or a violated creation rule.
    Validation,
    /// The actor lacks the required permission.
    Authorization,
    /// The referenced record does not exist.
    NotFound,
    /// The operation is illegal in the subject's current lifecycle state.
    StateConflict,
    /// Stored data breaks a ledger invariant and needs review.
    Integrity,
    /// Storage failure or timeout.
    Infrastructure,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authorization => 403,
            Self::NotFound => 404,
            Self::StateConflict => 409,
            Self::Integrity => 422,
            Self::Infrastructure => 503,
        }
    }

    /// Returns the lowercase name used in logs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::StateConflict => "state_conflict",
            Self::Integrity => "integrity",
            Self::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every error surfaced from the domain.
pub trait DomainError: std::error::Error {
    /// Class of this failure.
    fn kind(&self) -> ErrorKind;

    /// Stable SCREAMING_SNAKE code for API responses.
    fn error_code(&self) -> &'static str;

    /// HTTP status code for this failure.
    fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Whether the same call may succeed if repeated unchanged.
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_codes() {
        assert_eq!(ErrorKind::Validation.http_status_code(), 400);
        assert_eq!(ErrorKind::Authorization.http_status_code(), 403);
        assert_eq!(ErrorKind::NotFound.http_status_code(), 404);
        assert_eq!(ErrorKind::StateConflict.http_status_code(), 409);
        assert_eq!(ErrorKind::Integrity.http_status_code(), 422);
        assert_eq!(ErrorKind::Infrastructure.http_status_code(), 503);
    }

    #[test]
    fn test_display_matches_serde_name() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::StateConflict,
            ErrorKind::NotFound,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
