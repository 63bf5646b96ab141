//! Journal entry repository.
//!
//! Posting holds a shared lock on the fiscal year and monthly period rows of
//! the entry date until commit, so a concurrent close waits for in-flight
//! postings and later postings see the closed flags.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};

use fiscus_core::DomainError;
use fiscus_core::account::Account;
use fiscus_core::auth::{Actor, Permission};
use fiscus_core::fiscal::{FiscalError, FiscalYear, MonthlyPeriod};
use fiscus_core::ledger::{
    EntryStatus, JournalEntry, JournalItem, LedgerError, NewJournalEntry, PostingGuard,
    validate_lines,
};
use fiscus_core::reports::BalanceVerifier;
use fiscus_shared::types::{AccountId, JournalEntryId, OrganizationId, UserId};

use super::fiscal::context_for_date;
use crate::convert;
use crate::entities::{accounts, fiscal_years, journal_entries, journal_entry_items, monthly_periods};
use crate::error::RepositoryError;

/// A journal entry with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntryWithItems {
    /// Header.
    pub entry: JournalEntry,
    /// Lines, in posting order.
    pub items: Vec<JournalItem>,
}

/// Journal entry repository.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores an approved, balanced entry.
    pub async fn post(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        input: &NewJournalEntry,
    ) -> Result<JournalEntryWithItems, RepositoryError> {
        // Input-only rules fail before a connection is taken
        actor.require(Permission::PostEntries)?;
        if let Err(e) = validate_lines(&input.lines) {
            warn!(
                organization_id = %organization_id,
                entry_date = %input.entry_date,
                actor_id = %actor.user_id,
                error_code = e.error_code(),
                "Journal entry rejected"
            );
            return Err(e.into());
        }

        let txn = self.db.begin().await?;

        let context =
            context_for_date(&txn, organization_id, input.entry_date, Some(LockType::Share))
                .await?;

        let account_ids: BTreeSet<AccountId> =
            input.lines.iter().map(|line| line.account_id).collect();
        let accounts: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(accounts::Column::Id.is_in(account_ids.iter().map(|id| id.into_inner())))
            .all(&txn)
            .await?
            .into_iter()
            .map(Account::from)
            .collect();

        let prepared = match PostingGuard::prepare(
            actor,
            organization_id,
            input,
            &accounts,
            context.as_ref().map(|c| (&c.period, &c.fiscal_year)),
            Utc::now(),
        ) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(
                    organization_id = %organization_id,
                    entry_date = %input.entry_date,
                    actor_id = %actor.user_id,
                    error_code = e.error_code(),
                    "Journal entry rejected"
                );
                return Err(e.into());
            }
        };

        convert::new_journal_entry(&prepared.entry)
            .insert(&txn)
            .await?;
        journal_entry_items::Entity::insert_many(prepared.items.iter().map(convert::new_journal_item))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            entry_id = %prepared.entry.id,
            monthly_period_id = %prepared.entry.monthly_period_id,
            actor_id = %actor.user_id,
            total_debit = %prepared.entry.total_debit,
            lines = prepared.items.len(),
            "Journal entry posted"
        );
        Ok(JournalEntryWithItems {
            entry: prepared.entry,
            items: prepared.items,
        })
    }

    /// Voids an entry whose period is not closed.
    pub async fn void(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, RepositoryError> {
        let txn = self.db.begin().await?;

        let entry: JournalEntry = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?
            .into();

        let period_id = entry.monthly_period_id.into_inner();
        let fiscal_year_id = monthly_periods::Entity::find_by_id(period_id)
            .one(&txn)
            .await?
            .ok_or(FiscalError::PeriodNotFound(period_id))?
            .fiscal_year_id;
        let fiscal_year: FiscalYear = fiscal_years::Entity::find_by_id(fiscal_year_id)
            .lock_shared()
            .one(&txn)
            .await?
            .ok_or(FiscalError::FiscalYearNotFound(fiscal_year_id))?
            .into();
        let period: MonthlyPeriod = monthly_periods::Entity::find_by_id(period_id)
            .lock_shared()
            .one(&txn)
            .await?
            .ok_or(FiscalError::PeriodNotFound(period_id))?
            .into();

        let voided =
            match PostingGuard::void(actor, &entry, &period, &fiscal_year, Utc::now()) {
                Ok(voided) => voided,
                Err(e) => {
                    warn!(
                        entry_id = %entry_id,
                        actor_id = %actor.user_id,
                        error_code = e.error_code(),
                        "Journal entry void rejected"
                    );
                    return Err(e.into());
                }
            };

        journal_entries::ActiveModel {
            id: Unchanged(voided.id.into_inner()),
            status: Set(EntryStatus::Voided.into()),
            voided_by: Set(voided.voided_by.map(UserId::into_inner)),
            voided_at: Set(voided.voided_at.map(|t| t.fixed_offset())),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        txn.commit().await?;

        info!(entry_id = %entry_id, actor_id = %actor.user_id, "Journal entry voided");
        Ok(voided)
    }

    /// Finds an entry with its lines.
    pub async fn find(
        &self,
        organization_id: OrganizationId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntryWithItems, RepositoryError> {
        let entry = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::OrganizationId.eq(organization_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let items = journal_entry_items::Entity::find()
            .filter(journal_entry_items::Column::EntryId.eq(entry.id))
            .order_by_asc(journal_entry_items::Column::Id)
            .all(&self.db)
            .await?;
        Ok(JournalEntryWithItems {
            entry: entry.into(),
            items: items.into_iter().map(JournalItem::from).collect(),
        })
    }

    /// Re-checks a stored entry against its lines.
    pub async fn verify(
        &self,
        organization_id: OrganizationId,
        entry_id: JournalEntryId,
    ) -> Result<(), RepositoryError> {
        let stored = self.find(organization_id, entry_id).await?;
        BalanceVerifier::verify_entry(&stored.entry, &stored.items).map_err(|e| {
            warn!(entry_id = %entry_id, error = %e, "Stored journal entry failed verification");
            RepositoryError::from(e)
        })
    }
}
