//! Report repository.
//!
//! Loads the chart of accounts and the participating journal lines, then
//! runs the trial balance on the blocking pool. Nothing is cached; two calls
//! with no write in between return identical reports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, RelationTrait,
};
use sea_orm::sea_query::JoinType;
use tracing::{debug, warn};
use uuid::Uuid;

use fiscus_core::account::{Account, AccountType};
use fiscus_core::auth::{Actor, Permission};
use fiscus_core::fiscal::PeriodScope;
use fiscus_core::ledger::LedgerItem;
use fiscus_core::reports::{
    ReportError, TrialBalance, TrialBalanceAggregator, TrialBalanceQuery,
};
use fiscus_shared::types::{
    AccountId, FiscalYearId, JournalEntryId, MonthlyPeriodId, OrganizationId,
};

use super::fiscal::FiscalRepository;
use crate::entities::sea_orm_active_enums as db_enum;
use crate::entities::{accounts, journal_entries, journal_entry_items};
use crate::error::RepositoryError;

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
    aggregator: TrialBalanceAggregator,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, aggregator: TrialBalanceAggregator) -> Self {
        Self { db, aggregator }
    }

    /// Computes the trial balance over a custom date range.
    pub async fn trial_balance(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        query: TrialBalanceQuery,
    ) -> Result<TrialBalance, RepositoryError> {
        actor.require(Permission::ViewReports)?;
        if query.start_date > query.end_date {
            return Err(ReportError::InvalidDateRange {
                start: query.start_date,
                end: query.end_date,
            }
            .into());
        }

        let accounts: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Account::from)
            .collect();
        let items = self.ledger_items(organization_id, query.end_date).await?;
        debug!(
            organization_id = %organization_id,
            accounts = accounts.len(),
            items = items.len(),
            "Computing trial balance"
        );

        let aggregator = self.aggregator;
        let report = tokio::task::spawn_blocking(move || {
            aggregator.compute(&query, accounts, &items)
        })
        .await??;

        if !report.is_balanced {
            warn!(
                organization_id = %organization_id,
                start_date = %report.start_date,
                end_date = %report.end_date,
                difference = %report.totals.difference,
                "Trial balance is out of balance"
            );
        }
        Ok(report)
    }

    /// Computes the trial balance bounded by a fiscal year or monthly period.
    pub async fn trial_balance_for_period(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        scope: PeriodScope,
        period_id: Uuid,
        account_types: Vec<AccountType>,
    ) -> Result<TrialBalance, RepositoryError> {
        let fiscal = FiscalRepository::new(self.db.clone());
        let (start, end) = match scope {
            PeriodScope::FiscalYear => {
                let fy = fiscal
                    .find_fiscal_year(organization_id, FiscalYearId::from_uuid(period_id))
                    .await?
                    .fiscal_year;
                (fy.start_date, fy.end_date)
            }
            PeriodScope::MonthlyPeriod => {
                let period = fiscal
                    .find_period(organization_id, MonthlyPeriodId::from_uuid(period_id))
                    .await?
                    .period;
                (period.start_date, period.end_date)
            }
        };
        let query = TrialBalanceQuery::new(start, end).with_types(account_types);
        self.trial_balance(actor, organization_id, query).await
    }

    /// Lines of approved, balanced entries dated on or before `end_date`.
    async fn ledger_items(
        &self,
        organization_id: OrganizationId,
        end_date: NaiveDate,
    ) -> Result<Vec<LedgerItem>, RepositoryError> {
        let rows: Vec<(Uuid, Uuid, NaiveDate, Decimal, Decimal)> =
            journal_entry_items::Entity::find()
                .select_only()
                .column(journal_entry_items::Column::EntryId)
                .column(journal_entry_items::Column::AccountId)
                .column(journal_entries::Column::EntryDate)
                .column(journal_entry_items::Column::Debit)
                .column(journal_entry_items::Column::Credit)
                .join(
                    JoinType::InnerJoin,
                    journal_entry_items::Relation::JournalEntries.def(),
                )
                .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
                .filter(journal_entries::Column::Status.eq(db_enum::EntryStatus::Approved))
                .filter(journal_entries::Column::IsBalanced.eq(true))
                .filter(journal_entries::Column::EntryDate.lte(end_date))
                .into_tuple()
                .all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(entry_id, account_id, entry_date, debit, credit)| LedgerItem {
                entry_id: JournalEntryId::from_uuid(entry_id),
                account_id: AccountId::from_uuid(account_id),
                entry_date,
                debit,
                credit,
                participates: true,
            })
            .collect())
    }
}
