//! Conversions between stored rows and core domain types.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use fiscus_core::account::{self, Account};
use fiscus_core::auth;
use fiscus_core::fiscal::{
    self, FiscalYear, MonthlyPeriod, PeriodStatus, TransitionRecord,
};
use fiscus_core::ledger::{self, JournalEntry, JournalItem};
use fiscus_shared::types::{
    AccountId, FiscalYearId, JournalEntryId, JournalItemId, MonthlyPeriodId, OrganizationId,
    UserId,
};

use crate::entities::sea_orm_active_enums as db_enum;
use crate::entities::{
    accounts, fiscal_years, journal_entries, journal_entry_items, monthly_periods,
    period_audit_log,
};

fn to_utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

macro_rules! mirror_enum {
    ($core:ty, $db:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                type Source = $core;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                type Source = $db;
                match value {
                    $(Source::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(
    account::AccountType,
    db_enum::AccountType,
    [Asset, Liability, Equity, Income, Expense, Cost, Memo]
);
mirror_enum!(
    fiscal::FiscalYearType,
    db_enum::FiscalYearType,
    [Calendar, AprilMarch, JulyJune, OctoberSeptember]
);
mirror_enum!(
    ledger::EntryStatus,
    db_enum::EntryStatus,
    [Pending, Approved, Voided]
);
mirror_enum!(
    fiscal::PeriodScope,
    db_enum::PeriodScope,
    [FiscalYear, MonthlyPeriod]
);
mirror_enum!(
    fiscal::PeriodAction,
    db_enum::PeriodAction,
    [Activate, Deactivate, Close, Reopen]
);
mirror_enum!(
    fiscal::PeriodState,
    db_enum::PeriodState,
    [OpenInactive, OpenActive, Closed]
);
mirror_enum!(
    auth::UserRole,
    db_enum::UserRole,
    [Owner, Admin, Accountant, Viewer]
);

// ========== Fiscal calendar ==========

impl From<fiscal_years::Model> for FiscalYear {
    fn from(m: fiscal_years::Model) -> Self {
        Self {
            id: FiscalYearId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            name: m.name,
            start_date: m.start_date,
            end_date: m.end_date,
            fiscal_year_type: m.fiscal_year_type.into(),
            status: PeriodStatus {
                is_active: m.is_active,
                is_closed: m.is_closed,
                closed_at: m.closed_at.map(to_utc),
                closed_by: m.closed_by.map(UserId::from_uuid),
                reopened_at: m.reopened_at.map(to_utc),
                reopened_by: m.reopened_by.map(UserId::from_uuid),
                reopen_reason: m.reopen_reason,
                reclosed_at: m.reclosed_at.map(to_utc),
                reclosed_by: m.reclosed_by.map(UserId::from_uuid),
            },
        }
    }
}

impl From<monthly_periods::Model> for MonthlyPeriod {
    fn from(m: monthly_periods::Model) -> Self {
        Self {
            id: MonthlyPeriodId::from_uuid(m.id),
            fiscal_year_id: FiscalYearId::from_uuid(m.fiscal_year_id),
            period_number: m.period_number,
            name: m.name,
            year: m.year,
            month: m.month.unsigned_abs(),
            start_date: m.start_date,
            end_date: m.end_date,
            status: PeriodStatus {
                is_active: m.is_active,
                is_closed: m.is_closed,
                closed_at: m.closed_at.map(to_utc),
                closed_by: m.closed_by.map(UserId::from_uuid),
                reopened_at: m.reopened_at.map(to_utc),
                reopened_by: m.reopened_by.map(UserId::from_uuid),
                reopen_reason: m.reopen_reason,
                reclosed_at: m.reclosed_at.map(to_utc),
                reclosed_by: m.reclosed_by.map(UserId::from_uuid),
            },
        }
    }
}

pub(crate) fn new_fiscal_year(fy: &FiscalYear) -> fiscal_years::ActiveModel {
    fiscal_years::ActiveModel {
        id: Set(fy.id.into_inner()),
        organization_id: Set(fy.organization_id.into_inner()),
        name: Set(fy.name.clone()),
        start_date: Set(fy.start_date),
        end_date: Set(fy.end_date),
        fiscal_year_type: Set(fy.fiscal_year_type.into()),
        is_active: Set(fy.status.is_active),
        is_closed: Set(fy.status.is_closed),
        ..Default::default()
    }
}

pub(crate) fn new_monthly_period(period: &MonthlyPeriod) -> monthly_periods::ActiveModel {
    monthly_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        fiscal_year_id: Set(period.fiscal_year_id.into_inner()),
        period_number: Set(period.period_number),
        name: Set(period.name.clone()),
        year: Set(period.year),
        month: Set(period.month.cast_signed()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        is_active: Set(period.status.is_active),
        is_closed: Set(period.status.is_closed),
        ..Default::default()
    }
}

/// Lifecycle columns of a fiscal year, keyed by id.
pub(crate) fn fiscal_year_status(
    id: FiscalYearId,
    status: &PeriodStatus,
    now: DateTime<Utc>,
) -> fiscal_years::ActiveModel {
    fiscal_years::ActiveModel {
        id: Unchanged(id.into_inner()),
        is_active: Set(status.is_active),
        is_closed: Set(status.is_closed),
        closed_at: Set(status.closed_at.map(|t| t.fixed_offset())),
        closed_by: Set(status.closed_by.map(UserId::into_inner)),
        reopened_at: Set(status.reopened_at.map(|t| t.fixed_offset())),
        reopened_by: Set(status.reopened_by.map(UserId::into_inner)),
        reopen_reason: Set(status.reopen_reason.clone()),
        reclosed_at: Set(status.reclosed_at.map(|t| t.fixed_offset())),
        reclosed_by: Set(status.reclosed_by.map(UserId::into_inner)),
        updated_at: Set(now.fixed_offset()),
        ..Default::default()
    }
}

/// Lifecycle columns of a monthly period, keyed by id.
pub(crate) fn monthly_period_status(
    id: MonthlyPeriodId,
    status: &PeriodStatus,
    now: DateTime<Utc>,
) -> monthly_periods::ActiveModel {
    monthly_periods::ActiveModel {
        id: Unchanged(id.into_inner()),
        is_active: Set(status.is_active),
        is_closed: Set(status.is_closed),
        closed_at: Set(status.closed_at.map(|t| t.fixed_offset())),
        closed_by: Set(status.closed_by.map(UserId::into_inner)),
        reopened_at: Set(status.reopened_at.map(|t| t.fixed_offset())),
        reopened_by: Set(status.reopened_by.map(UserId::into_inner)),
        reopen_reason: Set(status.reopen_reason.clone()),
        reclosed_at: Set(status.reclosed_at.map(|t| t.fixed_offset())),
        reclosed_by: Set(status.reclosed_by.map(UserId::into_inner)),
        updated_at: Set(now.fixed_offset()),
        ..Default::default()
    }
}

pub(crate) fn audit_row(
    organization_id: OrganizationId,
    record: &TransitionRecord,
) -> period_audit_log::ActiveModel {
    period_audit_log::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        organization_id: Set(organization_id.into_inner()),
        scope: Set(record.scope.into()),
        subject_id: Set(record.subject_id),
        action: Set(record.action.into()),
        from_state: Set(record.from.into()),
        to_state: Set(record.to.into()),
        actor_id: Set(record.actor_id.into_inner()),
        actor_role: Set(record.actor_role.into()),
        reason: Set(record.reason.clone()),
        occurred_at: Set(record.occurred_at.fixed_offset()),
    }
}

impl From<period_audit_log::Model> for TransitionRecord {
    fn from(m: period_audit_log::Model) -> Self {
        Self {
            scope: m.scope.into(),
            subject_id: m.subject_id,
            action: m.action.into(),
            from: m.from_state.into(),
            to: m.to_state.into(),
            actor_id: UserId::from_uuid(m.actor_id),
            actor_role: m.actor_role.into(),
            reason: m.reason,
            occurred_at: to_utc(m.occurred_at),
        }
    }
}

// ========== Chart of accounts ==========

impl From<accounts::Model> for Account {
    fn from(m: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            code: m.code,
            name: m.name,
            account_type: m.account_type.into(),
            parent_id: m.parent_id.map(AccountId::from_uuid),
            is_parent: m.is_parent,
            is_active: m.is_active,
        }
    }
}

pub(crate) fn new_account(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        organization_id: Set(account.organization_id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        account_type: Set(account.account_type.into()),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        is_parent: Set(account.is_parent),
        is_active: Set(account.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
}

// ========== Journal ==========

impl From<journal_entries::Model> for JournalEntry {
    fn from(m: journal_entries::Model) -> Self {
        Self {
            id: JournalEntryId::from_uuid(m.id),
            organization_id: OrganizationId::from_uuid(m.organization_id),
            entry_date: m.entry_date,
            monthly_period_id: MonthlyPeriodId::from_uuid(m.monthly_period_id),
            description: m.description,
            status: m.status.into(),
            is_balanced: m.is_balanced,
            total_debit: m.total_debit,
            total_credit: m.total_credit,
            created_by: UserId::from_uuid(m.created_by),
            created_at: to_utc(m.created_at),
            voided_by: m.voided_by.map(UserId::from_uuid),
            voided_at: m.voided_at.map(to_utc),
        }
    }
}

impl From<journal_entry_items::Model> for JournalItem {
    fn from(m: journal_entry_items::Model) -> Self {
        Self {
            id: JournalItemId::from_uuid(m.id),
            entry_id: JournalEntryId::from_uuid(m.entry_id),
            account_id: AccountId::from_uuid(m.account_id),
            debit: m.debit,
            credit: m.credit,
            description: m.description,
        }
    }
}

pub(crate) fn new_journal_entry(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        organization_id: Set(entry.organization_id.into_inner()),
        entry_date: Set(entry.entry_date),
        monthly_period_id: Set(entry.monthly_period_id.into_inner()),
        description: Set(entry.description.clone()),
        status: Set(entry.status.into()),
        is_balanced: Set(entry.is_balanced),
        total_debit: Set(entry.total_debit),
        total_credit: Set(entry.total_credit),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.fixed_offset()),
        voided_by: Set(entry.voided_by.map(UserId::into_inner)),
        voided_at: Set(entry.voided_at.map(|t| t.fixed_offset())),
    }
}

pub(crate) fn new_journal_item(item: &JournalItem) -> journal_entry_items::ActiveModel {
    journal_entry_items::ActiveModel {
        id: Set(item.id.into_inner()),
        entry_id: Set(item.entry_id.into_inner()),
        account_id: Set(item.account_id.into_inner()),
        debit: Set(item.debit),
        credit: Set(item.credit),
        description: Set(item.description.clone()),
    }
}
