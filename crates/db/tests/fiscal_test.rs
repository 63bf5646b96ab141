//! Integration tests for the fiscal calendar repository.

mod common;

use fiscus_core::fiscal::{FiscalError, PeriodAction, PeriodScope, PeriodState};
use fiscus_core::DomainError;
use fiscus_db::{FiscalRepository, RepositoryError};
use fiscus_shared::types::OrganizationId;

use common::{TestDatabase, admin, accountant, calendar_year, date, open_calendar_year, request};

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_initialize_periods_partitions_calendar_year() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let actor = admin();

    let fy = fiscal
        .create_fiscal_year(&actor, org, calendar_year(2024))
        .await
        .expect("create fiscal year");
    let periods = fiscal
        .initialize_periods(&actor, org, fy.id)
        .await
        .expect("initialize periods");

    assert_eq!(periods.len(), 12);
    assert_eq!(periods[0].start_date, date(2024, 1, 1));
    assert_eq!(periods[0].end_date, date(2024, 1, 31));
    assert_eq!(periods[11].start_date, date(2024, 12, 1));
    assert_eq!(periods[11].end_date, date(2024, 12, 31));
    assert!(periods.iter().all(|p| p.state() == PeriodState::OpenInactive));

    let again = fiscal.initialize_periods(&actor, org, fy.id).await;
    assert!(matches!(
        again,
        Err(RepositoryError::Fiscal(FiscalError::PeriodsAlreadyInitialized(_)))
    ));
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_overlapping_fiscal_year_is_rejected() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let actor = admin();

    fiscal
        .create_fiscal_year(&actor, org, calendar_year(2024))
        .await
        .expect("create fiscal year");
    let err = fiscal
        .create_fiscal_year(&actor, org, calendar_year(2024))
        .await
        .expect_err("overlap must be rejected");
    assert_eq!(err.error_code(), "OVERLAPPING_FISCAL_YEAR");

    // Another organization has its own calendar.
    fiscal
        .create_fiscal_year(&actor, OrganizationId::new(), calendar_year(2024))
        .await
        .expect("other organization");
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_closing_fiscal_year_cascades_to_open_months() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let actor = admin();
    let fy = open_calendar_year(&fiscal, org, 2024, &[1, 2]).await;

    fiscal
        .transition(
            &actor,
            org,
            &request(
                PeriodScope::MonthlyPeriod,
                fy.periods[0].id.into_inner(),
                PeriodAction::Close,
                None,
            ),
        )
        .await
        .expect("close january");

    let plan = fiscal
        .transition(
            &actor,
            org,
            &request(
                PeriodScope::FiscalYear,
                fy.fiscal_year.id.into_inner(),
                PeriodAction::Close,
                None,
            ),
        )
        .await
        .expect("close fiscal year");
    assert_eq!(plan.cascaded.len(), 11);

    let closed = fiscal
        .find_fiscal_year(org, fy.fiscal_year.id)
        .await
        .expect("reload");
    assert!(closed.fiscal_year.status.is_closed);
    assert!(!closed.fiscal_year.status.is_active);
    assert!(closed.periods.iter().all(|p| p.status.is_closed));

    // January was closed by its own transition, not by the cascade.
    let january = fiscal
        .audit_trail(org, fy.periods[0].id.into_inner())
        .await
        .expect("audit trail");
    let closes = january
        .iter()
        .filter(|r| r.action == PeriodAction::Close)
        .count();
    assert_eq!(closes, 1);

    let year_trail = fiscal
        .audit_trail(org, fy.fiscal_year.id.into_inner())
        .await
        .expect("audit trail");
    assert_eq!(year_trail.last().map(|r| r.to), Some(PeriodState::Closed));
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_reopen_requires_reason_and_administrator() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let fy = open_calendar_year(&fiscal, org, 2024, &[3]).await;
    let march = fy.periods[2].id.into_inner();

    fiscal
        .transition(
            &admin(),
            org,
            &request(PeriodScope::MonthlyPeriod, march, PeriodAction::Close, None),
        )
        .await
        .expect("close march");

    let no_reason = fiscal
        .transition(
            &admin(),
            org,
            &request(PeriodScope::MonthlyPeriod, march, PeriodAction::Reopen, Some("  ")),
        )
        .await;
    assert!(matches!(
        no_reason,
        Err(RepositoryError::Fiscal(FiscalError::ReopenReasonRequired))
    ));

    let not_admin = fiscal
        .transition(
            &accountant(),
            org,
            &request(
                PeriodScope::MonthlyPeriod,
                march,
                PeriodAction::Reopen,
                Some("Late supplier invoice"),
            ),
        )
        .await
        .expect_err("accountants cannot reopen");
    assert_eq!(not_admin.http_status_code(), 403);

    let plan = fiscal
        .transition(
            &admin(),
            org,
            &request(
                PeriodScope::MonthlyPeriod,
                march,
                PeriodAction::Reopen,
                Some("Late supplier invoice"),
            ),
        )
        .await
        .expect("reopen march");
    assert_eq!(plan.primary.to, PeriodState::OpenActive);

    let context = fiscal
        .resolve_period(org, date(2024, 3, 15))
        .await
        .expect("resolve");
    assert_eq!(context.period.state(), PeriodState::OpenActive);
    assert_eq!(
        context.period.status.reopen_reason.as_deref(),
        Some("Late supplier invoice")
    );
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_month_cannot_activate_under_inactive_year() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let actor = admin();

    let fy = fiscal
        .create_fiscal_year(&actor, org, calendar_year(2025))
        .await
        .expect("create fiscal year");
    let periods = fiscal
        .initialize_periods(&actor, org, fy.id)
        .await
        .expect("initialize periods");

    let err = fiscal
        .transition(
            &actor,
            org,
            &request(
                PeriodScope::MonthlyPeriod,
                periods[0].id.into_inner(),
                PeriodAction::Activate,
                None,
            ),
        )
        .await
        .expect_err("parent inactive");
    assert_eq!(err.error_code(), "PARENT_FISCAL_YEAR_INACTIVE");

    // Nothing was written for the rejected request.
    let trail = fiscal
        .audit_trail(org, periods[0].id.into_inner())
        .await
        .expect("audit trail");
    assert!(trail.is_empty());
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_resolve_period_outside_calendar() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    open_calendar_year(&fiscal, org, 2024, &[]).await;

    let err = fiscal
        .resolve_period(org, date(2023, 12, 31))
        .await
        .expect_err("no period");
    assert!(matches!(
        err,
        RepositoryError::Fiscal(FiscalError::NoPeriodForDate(_))
    ));
}

#[tokio::test]
#[ignore = "requires a container runtime"]
async fn test_concurrent_creation_admits_one_year() {
    let test_db = TestDatabase::start().await;
    let fiscal = FiscalRepository::new(test_db.db.clone());
    let org = OrganizationId::new();
    let actor = admin();

    let attempts = (0..4).map(|_| fiscal.create_fiscal_year(&actor, org, calendar_year(2026)));
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.error_code() == "OVERLAPPING_FISCAL_YEAR")
    );
    assert_eq!(fiscal.list_fiscal_years(org).await.expect("list").len(), 1);
}
