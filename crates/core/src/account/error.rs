//! Account hierarchy and code generation errors.

use thiserror::Error;
use fiscus_shared::types::AccountId;

use super::types::AccountType;
use crate::auth::AuthorizationError;
use crate::error::{DomainError, ErrorKind};

/// Errors that can occur while building or changing the account tree.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Account name is blank.
    #[error("Account name must not be empty")]
    EmptyName,

    /// The requested parent does not exist.
    #[error("Parent account {0} does not exist")]
    ParentNotFound(AccountId),

    /// The requested parent is not flagged as a group account.
    #[error("Parent account {0} is not a parent (group) account")]
    ParentNotGroup(AccountId),

    /// The requested parent is inactive.
    #[error("Parent account {0} is inactive")]
    ParentInactive(AccountId),

    /// Child and parent types differ.
    #[error("Account type {child} does not match parent type {parent}")]
    TypeMismatch {
        /// Type of the child account.
        child: AccountType,
        /// Type of the parent account.
        parent: AccountType,
    },

    /// An account cannot be its own parent.
    #[error("Account {0} cannot be its own parent")]
    SelfParent(AccountId),

    /// Moving the account under the parent would create a cycle.
    #[error("Moving account {account} under {parent} would create a cycle")]
    Cycle {
        /// Account being moved.
        account: AccountId,
        /// Requested new parent (a descendant of `account`).
        parent: AccountId,
    },

    /// No free code remains at this level.
    #[error("No free account code remains under prefix '{0}'")]
    CodeSpaceExhausted(String),

    /// Every generated code collided with an existing one.
    #[error("Could not allocate a unique account code after {0} attempts")]
    CodeCollision(u32),

    /// Code widths or attempt limits are unusable.
    #[error("Invalid account code layout: {0}")]
    InvalidCodeLayout(String),

    /// Stored parent links form a cycle.
    #[error("Stored account hierarchy is corrupt: account {0} is part of a cycle")]
    CorruptHierarchy(AccountId),

    /// Unknown account type name.
    #[error("Unknown account type '{0}'")]
    UnknownAccountType(String),

    /// Actor lacks the permission.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
}

impl DomainError for AccountError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EmptyName
            | Self::ParentNotFound(_)
            | Self::ParentNotGroup(_)
            | Self::ParentInactive(_)
            | Self::TypeMismatch { .. }
            | Self::SelfParent(_)
            | Self::Cycle { .. }
            | Self::CodeSpaceExhausted(_)
            | Self::InvalidCodeLayout(_)
            | Self::UnknownAccountType(_) => ErrorKind::Validation,
            Self::CodeCollision(_) | Self::CorruptHierarchy(_) => ErrorKind::Integrity,
            Self::Unauthorized(e) => e.kind(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::EmptyName => "ACCOUNT_NAME_REQUIRED",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentNotGroup(_) => "PARENT_NOT_GROUP",
            Self::ParentInactive(_) => "PARENT_INACTIVE",
            Self::TypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::SelfParent(_) => "SELF_PARENT",
            Self::Cycle { .. } => "HIERARCHY_CYCLE",
            Self::CodeSpaceExhausted(_) => "CODE_SPACE_EXHAUSTED",
            Self::CodeCollision(_) => "CODE_COLLISION",
            Self::InvalidCodeLayout(_) => "INVALID_CODE_LAYOUT",
            Self::CorruptHierarchy(_) => "CORRUPT_HIERARCHY",
            Self::UnknownAccountType(_) => "UNKNOWN_ACCOUNT_TYPE",
            Self::Unauthorized(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let id = AccountId::new();
        assert_eq!(AccountError::ParentNotGroup(id).kind(), ErrorKind::Validation);
        assert_eq!(AccountError::CodeCollision(5).kind(), ErrorKind::Integrity);
        assert_eq!(AccountError::NotFound(id).http_status_code(), 404);
        assert!(!AccountError::CodeCollision(5).is_retryable());
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = AccountError::TypeMismatch {
            child: AccountType::Expense,
            parent: AccountType::Asset,
        };
        assert_eq!(
            err.to_string(),
            "Account type expense does not match parent type asset"
        );
    }
}
