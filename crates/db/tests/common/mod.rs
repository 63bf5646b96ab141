//! Shared fixtures for repository integration tests.
//!
//! Every test gets its own Postgres container with the schema migrated, so
//! tests never see each other's rows.

#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

use fiscus_core::auth::{Actor, UserRole};
use fiscus_core::fiscal::{FiscalYearType, NewFiscalYear, PeriodAction, PeriodScope};
use fiscus_db::migration::Migrator;
use fiscus_db::{FiscalRepository, FiscalYearWithPeriods, PeriodTransition};
use fiscus_shared::types::{OrganizationId, UserId};

/// A migrated database. The container stops when this is dropped.
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub db: DatabaseConnection,
}

impl TestDatabase {
    pub async fn start() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start postgres container");
        let host = container.get_host().await.expect("container host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("container port");
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

        let db = Database::connect(&url)
            .await
            .expect("Failed to connect to database");
        Migrator::up(&db, None).await.expect("Failed to migrate");

        Self {
            _container: container,
            db,
        }
    }
}

pub fn admin() -> Actor {
    Actor::new(UserId::new(), UserRole::Admin)
}

pub fn accountant() -> Actor {
    Actor::new(UserId::new(), UserRole::Accountant)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn calendar_year(year: i32) -> NewFiscalYear {
    NewFiscalYear {
        name: format!("FY{year}"),
        start_date: date(year, 1, 1),
        end_date: date(year, 12, 31),
        fiscal_year_type: FiscalYearType::Calendar,
    }
}

pub fn request(
    scope: PeriodScope,
    period_id: uuid::Uuid,
    action: PeriodAction,
    reason: Option<&str>,
) -> PeriodTransition {
    PeriodTransition {
        scope,
        period_id,
        action,
        reason: reason.map(str::to_string),
    }
}

/// Creates a calendar fiscal year with its periods, activates the year and
/// the listed months (1-based).
pub async fn open_calendar_year(
    fiscal: &FiscalRepository,
    org: OrganizationId,
    year: i32,
    active_months: &[usize],
) -> FiscalYearWithPeriods {
    let actor = admin();
    let fy = fiscal
        .create_fiscal_year(&actor, org, calendar_year(year))
        .await
        .expect("create fiscal year");
    let periods = fiscal
        .initialize_periods(&actor, org, fy.id)
        .await
        .expect("initialize periods");

    fiscal
        .transition(
            &actor,
            org,
            &request(PeriodScope::FiscalYear, fy.id.into_inner(), PeriodAction::Activate, None),
        )
        .await
        .expect("activate fiscal year");
    for month in active_months {
        fiscal
            .transition(
                &actor,
                org,
                &request(
                    PeriodScope::MonthlyPeriod,
                    periods[month - 1].id.into_inner(),
                    PeriodAction::Activate,
                    None,
                ),
            )
            .await
            .expect("activate month");
    }

    fiscal
        .find_fiscal_year(org, fy.id)
        .await
        .expect("reload fiscal year")
}
