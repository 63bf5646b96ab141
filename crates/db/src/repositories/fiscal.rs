//! Fiscal year and monthly period repository.
//!
//! Loads calendar state, lets the core plan the change, and persists the
//! result in one transaction. Lifecycle transitions lock the fiscal year row
//! before any monthly period row, the same order used by posting.

use std::slice;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use fiscus_core::auth::Actor;
use fiscus_core::fiscal::{
    FiscalCalendar, FiscalError, FiscalYear, MonthlyPeriod, NewFiscalYear, PeriodAction,
    PeriodLifecycle, PeriodScope, TransitionPlan, TransitionRecord,
};
use fiscus_shared::types::{FiscalYearId, MonthlyPeriodId, OrganizationId};

use crate::convert;
use crate::entities::{fiscal_years, monthly_periods, period_audit_log};
use crate::error::RepositoryError;

/// Fiscal year with its monthly periods, ordered by period number.
#[derive(Debug, Clone, Serialize)]
pub struct FiscalYearWithPeriods {
    /// The fiscal year.
    pub fiscal_year: FiscalYear,
    /// Its monthly periods.
    pub periods: Vec<MonthlyPeriod>,
}

/// A monthly period together with its fiscal year.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodContext {
    /// Owning fiscal year.
    pub fiscal_year: FiscalYear,
    /// The monthly period.
    pub period: MonthlyPeriod,
}

/// A requested lifecycle transition.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodTransition {
    /// Whether `period_id` names a fiscal year or a monthly period.
    pub scope: PeriodScope,
    /// Fiscal year or monthly period id.
    pub period_id: Uuid,
    /// Requested action.
    pub action: PeriodAction,
    /// Justification, mandatory for reopen.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Fiscal calendar repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: DatabaseConnection,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fiscal year. Periods are generated separately.
    ///
    /// Creations are serialized per organization so that the overlap and
    /// convention checks see every committed year.
    pub async fn create_fiscal_year(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        input: NewFiscalYear,
    ) -> Result<FiscalYear, RepositoryError> {
        let txn = self.db.begin().await?;
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
            [organization_id.to_string().into()],
        ))
        .await?;

        let existing: Vec<FiscalYear> = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_asc(fiscal_years::Column::StartDate)
            .all(&txn)
            .await?
            .into_iter()
            .map(FiscalYear::from)
            .collect();

        let fiscal_year =
            match FiscalCalendar::create_fiscal_year(actor, organization_id, input, &existing) {
                Ok(fy) => fy,
                Err(e) => {
                    warn!(
                        organization_id = %organization_id,
                        actor_id = %actor.user_id,
                        error = %e,
                        "Fiscal year rejected"
                    );
                    return Err(e.into());
                }
            };

        let stored = convert::new_fiscal_year(&fiscal_year).insert(&txn).await?;
        txn.commit().await?;

        info!(
            fiscal_year_id = %stored.id,
            organization_id = %organization_id,
            actor_id = %actor.user_id,
            start_date = %stored.start_date,
            end_date = %stored.end_date,
            "Fiscal year created"
        );
        Ok(stored.into())
    }

    /// Generates and stores the twelve monthly periods of a fiscal year.
    pub async fn initialize_periods(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        fiscal_year_id: FiscalYearId,
    ) -> Result<Vec<MonthlyPeriod>, RepositoryError> {
        let txn = self.db.begin().await?;
        let fiscal_year =
            lock_fiscal_year(&txn, organization_id, fiscal_year_id.into_inner()).await?;
        let existing = periods_of(&txn, fiscal_year_id.into_inner(), None).await?;

        let periods = FiscalCalendar::generate_monthly_periods(actor, &fiscal_year, &existing)?;

        monthly_periods::Entity::insert_many(periods.iter().map(convert::new_monthly_period))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            fiscal_year_id = %fiscal_year_id,
            actor_id = %actor.user_id,
            count = periods.len(),
            "Monthly periods initialized"
        );
        Ok(periods)
    }

    /// Applies a lifecycle transition.
    ///
    /// The plan (primary flip, cascaded monthly closes and audit rows) is
    /// validated in full before anything is written, then committed at once.
    pub async fn transition(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        request: &PeriodTransition,
    ) -> Result<TransitionPlan, RepositoryError> {
        let now = Utc::now();
        let reason = request.reason.as_deref();
        let txn = self.db.begin().await?;

        let planned = match request.scope {
            PeriodScope::FiscalYear => {
                let fiscal_year =
                    lock_fiscal_year(&txn, organization_id, request.period_id).await?;
                let periods =
                    periods_of(&txn, request.period_id, Some(LockType::Update)).await?;
                PeriodLifecycle::plan_fiscal_year(
                    actor,
                    &fiscal_year,
                    &periods,
                    request.action,
                    reason,
                    now,
                )
                .map(|plan| (plan, Some(fiscal_year), periods))
            }
            PeriodScope::MonthlyPeriod => {
                let fiscal_year_id = monthly_periods::Entity::find_by_id(request.period_id)
                    .one(&txn)
                    .await?
                    .ok_or(FiscalError::PeriodNotFound(request.period_id))?
                    .fiscal_year_id;
                let fiscal_year = lock_fiscal_year(&txn, organization_id, fiscal_year_id)
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Fiscal(FiscalError::FiscalYearNotFound(_)) => {
                            FiscalError::PeriodNotFound(request.period_id).into()
                        }
                        other => other,
                    })?;
                let period: MonthlyPeriod =
                    monthly_periods::Entity::find_by_id(request.period_id)
                        .lock_exclusive()
                        .one(&txn)
                        .await?
                        .ok_or(FiscalError::PeriodNotFound(request.period_id))?
                        .into();
                PeriodLifecycle::plan_monthly_period(
                    actor,
                    &period,
                    &fiscal_year,
                    request.action,
                    reason,
                    now,
                )
                .map(|plan| (plan, None, vec![period]))
            }
        };

        let (plan, fiscal_year, periods) = match planned {
            Ok(planned) => planned,
            Err(e) => {
                warn!(
                    scope = request.scope.as_str(),
                    period_id = %request.period_id,
                    action = request.action.as_str(),
                    actor_id = %actor.user_id,
                    error_code = fiscus_core::DomainError::error_code(&e),
                    "Period transition rejected"
                );
                return Err(e.into());
            }
        };

        for record in plan.records() {
            match record.scope {
                PeriodScope::FiscalYear => {
                    let Some(fy) = fiscal_year.as_ref() else {
                        continue;
                    };
                    let mut status = fy.status.clone();
                    PeriodLifecycle::apply(&mut status, record);
                    convert::fiscal_year_status(fy.id, &status, now)
                        .update(&txn)
                        .await?;
                }
                PeriodScope::MonthlyPeriod => {
                    let id = MonthlyPeriodId::from_uuid(record.subject_id);
                    let Some(period) = periods.iter().find(|p| p.id == id) else {
                        continue;
                    };
                    let mut status = period.status.clone();
                    PeriodLifecycle::apply(&mut status, record);
                    convert::monthly_period_status(id, &status, now)
                        .update(&txn)
                        .await?;
                }
            }
        }

        period_audit_log::Entity::insert_many(
            plan.records()
                .map(|record| convert::audit_row(organization_id, record)),
        )
        .exec(&txn)
        .await?;
        txn.commit().await?;

        info!(
            scope = request.scope.as_str(),
            period_id = %request.period_id,
            action = request.action.as_str(),
            from = plan.primary.from.as_str(),
            to = plan.primary.to.as_str(),
            actor_id = %actor.user_id,
            cascaded = plan.cascaded.len(),
            "Period transition applied"
        );
        Ok(plan)
    }

    /// Lists fiscal years with their periods, newest first.
    pub async fn list_fiscal_years(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<FiscalYearWithPeriods>, RepositoryError> {
        let years = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
            .order_by_desc(fiscal_years::Column::StartDate)
            .all(&self.db)
            .await?;

        let mut results = Vec::with_capacity(years.len());
        for fy in years {
            let periods = periods_of(&self.db, fy.id, None).await?;
            results.push(FiscalYearWithPeriods {
                fiscal_year: fy.into(),
                periods,
            });
        }
        Ok(results)
    }

    /// Finds a fiscal year with its periods.
    pub async fn find_fiscal_year(
        &self,
        organization_id: OrganizationId,
        fiscal_year_id: FiscalYearId,
    ) -> Result<FiscalYearWithPeriods, RepositoryError> {
        let fy = fiscal_years::Entity::find_by_id(fiscal_year_id.into_inner())
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(FiscalError::FiscalYearNotFound(fiscal_year_id.into_inner()))?;
        let periods = periods_of(&self.db, fy.id, None).await?;
        Ok(FiscalYearWithPeriods {
            fiscal_year: fy.into(),
            periods,
        })
    }

    /// Finds a monthly period with its fiscal year.
    pub async fn find_period(
        &self,
        organization_id: OrganizationId,
        period_id: MonthlyPeriodId,
    ) -> Result<PeriodContext, RepositoryError> {
        let not_found = || FiscalError::PeriodNotFound(period_id.into_inner());
        let (period, fy) = monthly_periods::Entity::find_by_id(period_id.into_inner())
            .find_also_related(fiscal_years::Entity)
            .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(not_found)?;
        let fy = fy.ok_or_else(not_found)?;
        Ok(PeriodContext {
            fiscal_year: fy.into(),
            period: period.into(),
        })
    }

    /// Resolves the monthly period containing `date`, on demand.
    pub async fn resolve_period(
        &self,
        organization_id: OrganizationId,
        date: NaiveDate,
    ) -> Result<PeriodContext, RepositoryError> {
        context_for_date(&self.db, organization_id, date, None)
            .await?
            .ok_or_else(|| FiscalError::NoPeriodForDate(date).into())
    }

    /// Accepted transitions of a fiscal year or monthly period, oldest first.
    pub async fn audit_trail(
        &self,
        organization_id: OrganizationId,
        subject_id: Uuid,
    ) -> Result<Vec<TransitionRecord>, RepositoryError> {
        let rows = period_audit_log::Entity::find()
            .filter(period_audit_log::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(period_audit_log::Column::SubjectId.eq(subject_id))
            .order_by_asc(period_audit_log::Column::OccurredAt)
            .order_by_asc(period_audit_log::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(TransitionRecord::from).collect())
    }
}

async fn lock_fiscal_year<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    fiscal_year_id: Uuid,
) -> Result<FiscalYear, RepositoryError> {
    let row = fiscal_years::Entity::find_by_id(fiscal_year_id)
        .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(FiscalError::FiscalYearNotFound(fiscal_year_id))?;
    Ok(row.into())
}

async fn periods_of<C: ConnectionTrait>(
    conn: &C,
    fiscal_year_id: Uuid,
    lock: Option<LockType>,
) -> Result<Vec<MonthlyPeriod>, RepositoryError> {
    let mut query = monthly_periods::Entity::find()
        .filter(monthly_periods::Column::FiscalYearId.eq(fiscal_year_id))
        .order_by_asc(monthly_periods::Column::PeriodNumber);
    if let Some(lock) = lock {
        query = query.lock(lock);
    }
    Ok(query
        .all(conn)
        .await?
        .into_iter()
        .map(MonthlyPeriod::from)
        .collect())
}

/// Loads the fiscal year and monthly period covering `date`, optionally
/// locking both rows (fiscal year first).
pub(crate) async fn context_for_date<C: ConnectionTrait>(
    conn: &C,
    organization_id: OrganizationId,
    date: NaiveDate,
    lock: Option<LockType>,
) -> Result<Option<PeriodContext>, RepositoryError> {
    let mut year_query = fiscal_years::Entity::find()
        .filter(fiscal_years::Column::OrganizationId.eq(organization_id.into_inner()))
        .filter(fiscal_years::Column::StartDate.lte(date))
        .filter(fiscal_years::Column::EndDate.gte(date));
    if let Some(lock) = lock {
        year_query = year_query.lock(lock);
    }
    let Some(fiscal_year) = year_query.one(conn).await? else {
        return Ok(None);
    };

    let mut period_query = monthly_periods::Entity::find()
        .filter(monthly_periods::Column::FiscalYearId.eq(fiscal_year.id))
        .filter(monthly_periods::Column::StartDate.lte(date))
        .filter(monthly_periods::Column::EndDate.gte(date));
    if let Some(lock) = lock {
        period_query = period_query.lock(lock);
    }
    let periods: Vec<MonthlyPeriod> = period_query
        .all(conn)
        .await?
        .into_iter()
        .map(MonthlyPeriod::from)
        .collect();

    let fiscal_year = FiscalYear::from(fiscal_year);
    Ok(
        FiscalCalendar::resolve(date, slice::from_ref(&fiscal_year), &periods)
            .ok()
            .map(|resolved| PeriodContext {
                fiscal_year: resolved.fiscal_year.clone(),
                period: resolved.period.clone(),
            }),
    )
}
