//! Property tests for the period lifecycle.

use chrono::Utc;
use proptest::prelude::*;

use super::calendar::FiscalCalendar;
use super::calendar::tests::{actor, fiscal_year};
use super::lifecycle::{PeriodAction, PeriodLifecycle, PeriodState};
use super::period::FiscalYearType;
use crate::auth::UserRole;

fn action() -> impl Strategy<Value = PeriodAction> {
    prop::sample::select(PeriodAction::ALL.to_vec())
}

fn action_without_reopen() -> impl Strategy<Value = PeriodAction> {
    prop::sample::select(vec![
        PeriodAction::Activate,
        PeriodAction::Deactivate,
        PeriodAction::Close,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Once closed, no sequence of actions other than reopen returns a
    /// monthly period to an open state, and every attempt is rejected.
    #[test]
    fn prop_closure_is_monotonic(actions in prop::collection::vec(action_without_reopen(), 1..20)) {
        let admin = actor(UserRole::Admin);
        let mut fy = fiscal_year(FiscalYearType::Calendar, 2024);
        fy.status.is_active = true;
        let periods = FiscalCalendar::generate_monthly_periods(&admin, &fy, &[]).unwrap();
        let mut month = periods[0].clone();

        let close = PeriodLifecycle::plan_monthly_period(
            &admin, &month, &fy, PeriodAction::Close, None, Utc::now(),
        ).unwrap();
        PeriodLifecycle::apply(&mut month.status, &close.primary);

        for action in actions {
            let result = PeriodLifecycle::plan_monthly_period(
                &admin, &month, &fy, action, None, Utc::now(),
            );
            prop_assert!(result.is_err(), "{} accepted on a closed period", action);
            prop_assert_eq!(month.state(), PeriodState::Closed);
        }
    }

    /// Applying any accepted plan leaves the stored flags in exactly the
    /// planned state; rejected plans change nothing.
    #[test]
    fn prop_applied_state_matches_plan(actions in prop::collection::vec(action(), 1..30)) {
        let admin = actor(UserRole::Admin);
        let mut fy = fiscal_year(FiscalYearType::JulyJune, 2024);
        let mut periods = FiscalCalendar::generate_monthly_periods(&admin, &fy, &[]).unwrap();

        for action in actions {
            let before = fy.status.clone();
            match PeriodLifecycle::plan_fiscal_year(
                &admin, &fy, &periods, action, Some("review"), Utc::now(),
            ) {
                Ok(plan) => {
                    prop_assert_eq!(plan.primary.from, fy.state());
                    PeriodLifecycle::apply(&mut fy.status, &plan.primary);
                    prop_assert_eq!(fy.state(), plan.primary.to);

                    for record in &plan.cascaded {
                        let month = periods
                            .iter_mut()
                            .find(|p| p.id.into_inner() == record.subject_id)
                            .unwrap();
                        PeriodLifecycle::apply(&mut month.status, record);
                    }
                    if fy.state() == PeriodState::Closed {
                        prop_assert!(periods.iter().all(|p| p.state() == PeriodState::Closed));
                    }
                }
                Err(_) => prop_assert_eq!(&fy.status, &before),
            }
        }
    }
}
