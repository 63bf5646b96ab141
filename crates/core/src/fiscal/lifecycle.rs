//! Period lifecycle state machine.
//!
//! ```text
//!   OpenInactive --activate--> OpenActive
//!   OpenActive --deactivate--> OpenInactive
//!   OpenInactive | OpenActive --close--> Closed
//!   Closed --reopen(reason)--> OpenActive
//! ```
//!
//! Transitions are planned here, fully validated, before anything is written.
//! The caller persists a [`TransitionPlan`] atomically: the primary flip, every
//! cascaded flip and one audit row per [`TransitionRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use fiscus_shared::types::UserId;
use uuid::Uuid;

use super::error::FiscalError;
use super::period::{FiscalYear, MonthlyPeriod, PeriodStatus};
use crate::auth::{Actor, Permission, UserRole};

/// Lifecycle state of a fiscal year or monthly period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// Open but not accepting postings.
    OpenInactive,
    /// Open and accepting postings.
    OpenActive,
    /// Closed; postings dated inside are rejected.
    Closed,
}

impl PeriodState {
    /// Derives the state from the stored flags. `is_closed` wins.
    #[must_use]
    pub const fn from_flags(is_active: bool, is_closed: bool) -> Self {
        match (is_active, is_closed) {
            (_, true) => Self::Closed,
            (true, false) => Self::OpenActive,
            (false, false) => Self::OpenInactive,
        }
    }

    /// Returns true unless closed.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenInactive => "open_inactive",
            Self::OpenActive => "open_active",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PeriodState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodAction {
    /// Start accepting postings.
    Activate,
    /// Stop accepting postings.
    Deactivate,
    /// Close the period.
    Close,
    /// Reopen a closed period (exceptional, justified).
    Reopen,
}

impl PeriodAction {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::Activate, Self::Deactivate, Self::Close, Self::Reopen];

    /// Permission the actor needs for this action.
    #[must_use]
    pub const fn required_permission(self) -> Permission {
        match self {
            Self::Activate | Self::Deactivate => Permission::TogglePeriod,
            Self::Close => Permission::ClosePeriod,
            Self::Reopen => Permission::ReopenPeriod,
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }
}

impl std::fmt::Display for PeriodAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of period a transition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodScope {
    /// A fiscal year.
    FiscalYear,
    /// A monthly period.
    MonthlyPeriod,
}

impl PeriodScope {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiscalYear => "fiscal_year",
            Self::MonthlyPeriod => "monthly_period",
        }
    }
}

impl std::fmt::Display for PeriodScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FiscalYear => write!(f, "fiscal year"),
            Self::MonthlyPeriod => write!(f, "monthly period"),
        }
    }
}

/// One accepted state flip, written as an audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// Kind of period.
    pub scope: PeriodScope,
    /// Fiscal year or monthly period id.
    pub subject_id: Uuid,
    /// Action taken.
    pub action: PeriodAction,
    /// State before.
    pub from: PeriodState,
    /// State after.
    pub to: PeriodState,
    /// Acting user.
    pub actor_id: UserId,
    /// Role of the acting user.
    pub actor_role: UserRole,
    /// Trimmed justification, mandatory for reopen.
    pub reason: Option<String>,
    /// When the transition was planned.
    pub occurred_at: DateTime<Utc>,
}

/// A validated transition together with its cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    /// The requested transition.
    pub primary: TransitionRecord,
    /// Monthly periods closed along with their fiscal year.
    pub cascaded: Vec<TransitionRecord>,
}

impl TransitionPlan {
    /// All records, primary first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        std::iter::once(&self.primary).chain(self.cascaded.iter())
    }
}

/// Period lifecycle rules.
pub struct PeriodLifecycle;

impl PeriodLifecycle {
    /// Resulting state of `action` applied in `current`.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle error naming the violated precondition.
    pub fn next_state(
        scope: PeriodScope,
        id: Uuid,
        current: PeriodState,
        action: PeriodAction,
    ) -> Result<PeriodState, FiscalError> {
        use PeriodAction as A;
        use PeriodState as S;

        match (action, current) {
            (A::Activate, S::OpenInactive) => Ok(S::OpenActive),
            (A::Activate, S::OpenActive) => Err(FiscalError::AlreadyActive { scope, id }),
            (A::Deactivate, S::OpenActive) => Ok(S::OpenInactive),
            (A::Deactivate, S::OpenInactive) => Err(FiscalError::AlreadyInactive { scope, id }),
            (A::Activate | A::Deactivate, S::Closed) => Err(FiscalError::PeriodClosed { scope, id }),
            (A::Close, S::OpenInactive | S::OpenActive) => Ok(S::Closed),
            (A::Close, S::Closed) => Err(FiscalError::AlreadyClosed { scope, id }),
            (A::Reopen, S::Closed) => Ok(S::OpenActive),
            (A::Reopen, S::OpenInactive | S::OpenActive) => {
                Err(FiscalError::NotClosed { scope, id })
            }
        }
    }

    /// Plans a transition of a fiscal year.
    ///
    /// Closing cascades to every monthly period of the year that is not
    /// already closed. Reopening does not cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks the permission, a reopen has no
    /// reason, or the year's state forbids the action.
    pub fn plan_fiscal_year(
        actor: &Actor,
        fiscal_year: &FiscalYear,
        periods: &[MonthlyPeriod],
        action: PeriodAction,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TransitionPlan, FiscalError> {
        actor.require(action.required_permission())?;
        let reason = normalize_reason(action, reason)?;

        let scope = PeriodScope::FiscalYear;
        let from = fiscal_year.state();
        let to = Self::next_state(scope, fiscal_year.id.into_inner(), from, action)?;

        let cascaded = if action == PeriodAction::Close {
            periods
                .iter()
                .filter(|p| p.fiscal_year_id == fiscal_year.id && p.state().is_open())
                .map(|p| TransitionRecord {
                    scope: PeriodScope::MonthlyPeriod,
                    subject_id: p.id.into_inner(),
                    action,
                    from: p.state(),
                    to: PeriodState::Closed,
                    actor_id: actor.user_id,
                    actor_role: actor.role,
                    reason: None,
                    occurred_at: now,
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(TransitionPlan {
            primary: TransitionRecord {
                scope,
                subject_id: fiscal_year.id.into_inner(),
                action,
                from,
                to,
                actor_id: actor.user_id,
                actor_role: actor.role,
                reason,
                occurred_at: now,
            },
            cascaded,
        })
    }

    /// Plans a transition of a monthly period under `fiscal_year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks the permission, a reopen has no
    /// reason, the period's state forbids the action, or the parent fiscal
    /// year is inactive or closed (activate, reopen).
    pub fn plan_monthly_period(
        actor: &Actor,
        period: &MonthlyPeriod,
        fiscal_year: &FiscalYear,
        action: PeriodAction,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TransitionPlan, FiscalError> {
        actor.require(action.required_permission())?;
        let reason = normalize_reason(action, reason)?;

        if period.fiscal_year_id != fiscal_year.id {
            return Err(FiscalError::ParentMismatch {
                period: period.id.into_inner(),
                fiscal_year: fiscal_year.id.into_inner(),
            });
        }

        let scope = PeriodScope::MonthlyPeriod;
        let from = period.state();
        let to = Self::next_state(scope, period.id.into_inner(), from, action)?;

        let parent_id = fiscal_year.id.into_inner();
        match (action, fiscal_year.state()) {
            (PeriodAction::Activate | PeriodAction::Reopen, PeriodState::Closed) => {
                return Err(FiscalError::ParentClosed(parent_id));
            }
            // Both land the month in OpenActive
            (PeriodAction::Activate | PeriodAction::Reopen, PeriodState::OpenInactive) => {
                return Err(FiscalError::ParentInactive(parent_id));
            }
            _ => {}
        }

        Ok(TransitionPlan {
            primary: TransitionRecord {
                scope,
                subject_id: period.id.into_inner(),
                action,
                from,
                to,
                actor_id: actor.user_id,
                actor_role: actor.role,
                reason,
                occurred_at: now,
            },
            cascaded: Vec::new(),
        })
    }

    /// Applies a planned record to a period's flags and audit stamps.
    pub fn apply(status: &mut PeriodStatus, record: &TransitionRecord) {
        match record.action {
            PeriodAction::Activate => status.is_active = true,
            PeriodAction::Deactivate => status.is_active = false,
            PeriodAction::Close => {
                status.is_active = false;
                status.is_closed = true;
                if status.was_reopened() {
                    status.reclosed_at = Some(record.occurred_at);
                    status.reclosed_by = Some(record.actor_id);
                } else {
                    status.closed_at = Some(record.occurred_at);
                    status.closed_by = Some(record.actor_id);
                }
            }
            PeriodAction::Reopen => {
                status.is_closed = false;
                status.is_active = true;
                status.reopened_at = Some(record.occurred_at);
                status.reopened_by = Some(record.actor_id);
                status.reopen_reason.clone_from(&record.reason);
            }
        }
    }
}

/// Trims the reason; reopen requires a non-empty one.
fn normalize_reason(
    action: PeriodAction,
    reason: Option<&str>,
) -> Result<Option<String>, FiscalError> {
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(ToString::to_string);

    if action == PeriodAction::Reopen && reason.is_none() {
        return Err(FiscalError::ReopenReasonRequired);
    }
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::calendar::FiscalCalendar;
    use crate::fiscal::calendar::tests::{actor, fiscal_year};
    use crate::fiscal::period::FiscalYearType;
    use rstest::rstest;

    fn open_year(is_active: bool) -> (FiscalYear, Vec<MonthlyPeriod>) {
        let mut fy = fiscal_year(FiscalYearType::Calendar, 2024);
        let periods =
            FiscalCalendar::generate_monthly_periods(&actor(UserRole::Admin), &fy, &[]).unwrap();
        fy.status.is_active = is_active;
        (fy, periods)
    }

    fn closed(mut period: MonthlyPeriod) -> MonthlyPeriod {
        period.status.is_closed = true;
        period
    }

    #[rstest]
    #[case(PeriodState::OpenInactive, PeriodAction::Activate, Some(PeriodState::OpenActive))]
    #[case(PeriodState::OpenActive, PeriodAction::Activate, None)]
    #[case(PeriodState::Closed, PeriodAction::Activate, None)]
    #[case(PeriodState::OpenActive, PeriodAction::Deactivate, Some(PeriodState::OpenInactive))]
    #[case(PeriodState::OpenInactive, PeriodAction::Deactivate, None)]
    #[case(PeriodState::OpenInactive, PeriodAction::Close, Some(PeriodState::Closed))]
    #[case(PeriodState::OpenActive, PeriodAction::Close, Some(PeriodState::Closed))]
    #[case(PeriodState::Closed, PeriodAction::Close, None)]
    #[case(PeriodState::Closed, PeriodAction::Reopen, Some(PeriodState::OpenActive))]
    #[case(PeriodState::OpenActive, PeriodAction::Reopen, None)]
    fn test_transition_table(
        #[case] from: PeriodState,
        #[case] action: PeriodAction,
        #[case] expected: Option<PeriodState>,
    ) {
        let result = PeriodLifecycle::next_state(PeriodScope::FiscalYear, Uuid::nil(), from, action);
        assert_eq!(result.ok(), expected);
    }

    #[test]
    fn test_rejections_name_the_precondition() {
        let id = Uuid::nil();
        let scope = PeriodScope::MonthlyPeriod;
        assert!(matches!(
            PeriodLifecycle::next_state(scope, id, PeriodState::Closed, PeriodAction::Close),
            Err(FiscalError::AlreadyClosed { .. })
        ));
        assert!(matches!(
            PeriodLifecycle::next_state(scope, id, PeriodState::Closed, PeriodAction::Deactivate),
            Err(FiscalError::PeriodClosed { .. })
        ));
        assert!(matches!(
            PeriodLifecycle::next_state(scope, id, PeriodState::OpenInactive, PeriodAction::Reopen),
            Err(FiscalError::NotClosed { .. })
        ));
    }

    #[test]
    fn test_close_fiscal_year_cascades_to_open_months_only() {
        let (fy, mut periods) = open_year(true);
        periods.truncate(3);
        periods[0].status.is_active = true;
        periods[1] = closed(periods[1].clone());

        let admin = actor(UserRole::Admin);
        let plan = PeriodLifecycle::plan_fiscal_year(
            &admin,
            &fy,
            &periods,
            PeriodAction::Close,
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.primary.to, PeriodState::Closed);
        let cascaded: Vec<Uuid> = plan.cascaded.iter().map(|r| r.subject_id).collect();
        assert_eq!(
            cascaded,
            vec![periods[0].id.into_inner(), periods[2].id.into_inner()]
        );
        assert_eq!(plan.cascaded[0].from, PeriodState::OpenActive);
        assert_eq!(plan.cascaded[1].from, PeriodState::OpenInactive);
        assert_eq!(plan.records().count(), 3);

        let mut fy_status = fy.status.clone();
        PeriodLifecycle::apply(&mut fy_status, &plan.primary);
        assert!(fy_status.is_closed);
        assert!(!fy_status.is_active);
        assert_eq!(fy_status.closed_by, Some(admin.user_id));
    }

    #[test]
    fn test_close_closed_fiscal_year_is_explicit_conflict() {
        let (mut fy, periods) = open_year(false);
        fy.status.is_closed = true;
        let err = PeriodLifecycle::plan_fiscal_year(
            &actor(UserRole::Owner),
            &fy,
            &periods,
            PeriodAction::Close,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::AlreadyClosed { scope: PeriodScope::FiscalYear, .. }));
    }

    #[test]
    fn test_reopen_fiscal_year_does_not_cascade() {
        let (mut fy, periods) = open_year(false);
        fy.status.is_closed = true;
        let periods: Vec<MonthlyPeriod> = periods.into_iter().map(closed).collect();

        let plan = PeriodLifecycle::plan_fiscal_year(
            &actor(UserRole::Admin),
            &fy,
            &periods,
            PeriodAction::Reopen,
            Some("  audit adjustment "),
            Utc::now(),
        )
        .unwrap();

        assert!(plan.cascaded.is_empty());
        assert_eq!(plan.primary.to, PeriodState::OpenActive);
        assert_eq!(plan.primary.reason.as_deref(), Some("audit adjustment"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_reopen_requires_reason(#[case] reason: Option<&str>) {
        let (mut fy, periods) = open_year(false);
        fy.status.is_closed = true;
        let err = PeriodLifecycle::plan_fiscal_year(
            &actor(UserRole::Admin),
            &fy,
            &periods,
            PeriodAction::Reopen,
            reason,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ReopenReasonRequired));
    }

    #[test]
    fn test_activate_month_requires_active_parent() {
        let (fy, periods) = open_year(false);
        let err = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Accountant),
            &periods[0],
            &fy,
            PeriodAction::Activate,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ParentInactive(_)));

        let (fy, periods) = open_year(true);
        let plan = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Accountant),
            &periods[0],
            &fy,
            PeriodAction::Activate,
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.primary.to, PeriodState::OpenActive);
    }

    #[test]
    fn test_reopen_month_requires_active_parent() {
        let (fy, periods) = open_year(false);
        let month = closed(periods[0].clone());
        let err = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Admin),
            &month,
            &fy,
            PeriodAction::Reopen,
            Some("late invoice"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ParentInactive(id) if id == fy.id.into_inner()));
        assert_eq!(month.state(), PeriodState::Closed);

        let (fy, periods) = open_year(true);
        let month = closed(periods[0].clone());
        let plan = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Admin),
            &month,
            &fy,
            PeriodAction::Reopen,
            Some("late invoice"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.primary.to, PeriodState::OpenActive);
    }

    #[test]
    fn test_month_under_closed_year() {
        let (mut fy, periods) = open_year(false);
        fy.status.is_closed = true;
        let admin = actor(UserRole::Admin);

        let err = PeriodLifecycle::plan_monthly_period(
            &admin,
            &periods[0],
            &fy,
            PeriodAction::Activate,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ParentClosed(_)));

        let month = closed(periods[0].clone());
        let err = PeriodLifecycle::plan_monthly_period(
            &admin,
            &month,
            &fy,
            PeriodAction::Reopen,
            Some("late invoice"),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ParentClosed(_)));
    }

    #[test]
    fn test_accountant_toggles_but_cannot_close() {
        let (fy, periods) = open_year(true);
        let accountant = actor(UserRole::Accountant);

        let err = PeriodLifecycle::plan_monthly_period(
            &accountant,
            &periods[0],
            &fy,
            PeriodAction::Close,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::Unauthorized(_)));

        let err = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Viewer),
            &periods[0],
            &fy,
            PeriodAction::Activate,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::Unauthorized(_)));
    }

    #[test]
    fn test_authorization_checked_before_state() {
        let (mut fy, periods) = open_year(false);
        fy.status.is_closed = true;
        let err = PeriodLifecycle::plan_fiscal_year(
            &actor(UserRole::Accountant),
            &fy,
            &periods,
            PeriodAction::Close,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::Unauthorized(_)));
    }

    #[test]
    fn test_parent_mismatch() {
        let (fy, _) = open_year(true);
        let (_, other_periods) = open_year(true);
        let err = PeriodLifecycle::plan_monthly_period(
            &actor(UserRole::Admin),
            &other_periods[0],
            &fy,
            PeriodAction::Deactivate,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, FiscalError::ParentMismatch { .. }));
    }

    #[test]
    fn test_reclose_after_reopen_records_reclosed_stamps() {
        let (fy, periods) = open_year(true);
        let admin = actor(UserRole::Admin);
        let mut month = periods[0].clone();

        for (action, reason) in [
            (PeriodAction::Close, None),
            (PeriodAction::Reopen, Some("correction")),
            (PeriodAction::Close, None),
        ] {
            let plan = PeriodLifecycle::plan_monthly_period(
                &admin,
                &month,
                &fy,
                action,
                reason,
                Utc::now(),
            )
            .unwrap();
            PeriodLifecycle::apply(&mut month.status, &plan.primary);
        }

        assert_eq!(month.state(), PeriodState::Closed);
        assert!(month.status.closed_at.is_some());
        assert!(month.status.reclosed_at.is_some());
        assert_eq!(month.status.reopen_reason.as_deref(), Some("correction"));
        assert!(month.status.reclosed_at >= month.status.closed_at);
    }
}
