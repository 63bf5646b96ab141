//! Roles and permissions of the actors driving ledger operations.
//!
//! Identity itself lives outside this crate; every operation here receives an
//! [`Actor`] (user id + role) and checks the [`Permission`] it needs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use fiscus_shared::types::UserId;

use crate::error::{DomainError, ErrorKind};

/// User roles within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, can transfer ownership.
    Owner,
    /// Full access except ownership transfer.
    Admin,
    /// Maintains the chart of accounts, posts entries, toggles periods.
    Accountant,
    /// Read-only access.
    Viewer,
}

impl UserRole {
    /// Returns true for the administrator roles.
    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Returns true if this role may activate or deactivate periods.
    #[must_use]
    pub const fn can_toggle_periods(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Accountant)
    }

    /// Returns true if this role may post and void journal entries.
    #[must_use]
    pub const fn can_post_entries(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Accountant)
    }

    /// Returns true if this role may create or move accounts.
    #[must_use]
    pub const fn can_manage_accounts(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Accountant)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Accountant => write!(f, "accountant"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = AuthorizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "accountant" => Ok(Self::Accountant),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AuthorizationError::UnknownRole(s.to_string())),
        }
    }
}

/// A permission checked before an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Create fiscal years and generate their periods.
    ManageFiscalCalendar,
    /// Activate or deactivate a period.
    TogglePeriod,
    /// Close a period.
    ClosePeriod,
    /// Reopen a closed period.
    ReopenPeriod,
    /// Create or re-parent accounts.
    ManageAccounts,
    /// Post or void journal entries.
    PostEntries,
    /// Read reports.
    ViewReports,
}

impl Permission {
    /// Returns true if `role` holds this permission.
    #[must_use]
    pub const fn granted_to(self, role: UserRole) -> bool {
        match self {
            Self::ManageFiscalCalendar | Self::ClosePeriod | Self::ReopenPeriod => {
                role.is_administrator()
            }
            Self::TogglePeriod => role.can_toggle_periods(),
            Self::ManageAccounts => role.can_manage_accounts(),
            Self::PostEntries => role.can_post_entries(),
            Self::ViewReports => true,
        }
    }

    /// Returns the snake_case name of this permission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageFiscalCalendar => "manage_fiscal_calendar",
            Self::TogglePeriod => "toggle_period",
            Self::ClosePeriod => "close_period",
            Self::ReopenPeriod => "reopen_period",
            Self::ManageAccounts => "manage_accounts",
            Self::PostEntries => "post_entries",
            Self::ViewReports => "view_reports",
        }
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Role of the user in the current organization.
    pub role: UserRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Fails unless this actor holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AuthorizationError> {
        if permission.granted_to(self.role) {
            Ok(())
        } else {
            Err(AuthorizationError::MissingPermission {
                permission: permission.as_str(),
                role: self.role,
            })
        }
    }
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// The role does not carry the permission.
    #[error("role '{role}' lacks permission '{permission}'")]
    MissingPermission {
        /// Required permission.
        permission: &'static str,
        /// Role of the actor.
        role: UserRole,
    },

    /// The role string is not recognised.
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

impl DomainError for AuthorizationError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Authorization
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingPermission { .. } => "PERMISSION_DENIED",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UserRole::Owner, true, true, true)]
    #[case(UserRole::Admin, true, true, true)]
    #[case(UserRole::Accountant, false, true, true)]
    #[case(UserRole::Viewer, false, false, true)]
    fn test_permission_matrix(
        #[case] role: UserRole,
        #[case] admin: bool,
        #[case] toggle: bool,
        #[case] view: bool,
    ) {
        assert_eq!(Permission::ManageFiscalCalendar.granted_to(role), admin);
        assert_eq!(Permission::ClosePeriod.granted_to(role), admin);
        assert_eq!(Permission::ReopenPeriod.granted_to(role), admin);
        assert_eq!(Permission::TogglePeriod.granted_to(role), toggle);
        assert_eq!(Permission::PostEntries.granted_to(role), toggle);
        assert_eq!(Permission::ViewReports.granted_to(role), view);
    }

    #[test]
    fn test_require_names_permission() {
        let actor = Actor::new(UserId::new(), UserRole::Accountant);
        let err = actor.require(Permission::ClosePeriod).unwrap_err();
        assert_eq!(
            err.to_string(),
            "role 'accountant' lacks permission 'close_period'"
        );
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("viewer".parse::<UserRole>().unwrap(), UserRole::Viewer);
        assert!(matches!(
            "auditor".parse::<UserRole>(),
            Err(AuthorizationError::UnknownRole(_))
        ));
    }
}
