//! Posting guard: the rules a journal entry must pass before it is stored.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use fiscus_shared::types::{JournalEntryId, JournalItemId, OrganizationId};

use super::error::LedgerError;
use super::types::{
    AMOUNT_CEILING, AMOUNT_SCALE, EntryStatus, EntryTotals, JournalEntry, JournalItem,
    NewJournalEntry, PostingLine, PreparedEntry,
};
use crate::account::Account;
use crate::auth::{Actor, Permission};
use crate::fiscal::{FiscalYear, MonthlyPeriod, PeriodScope, PeriodState};

/// Validates the lines of an entry and returns its totals.
///
/// Each line carries exactly one non-negative, non-zero side that fits the
/// stored precision and range; the entry has at least two lines and
/// balances exactly.
///
/// # Errors
///
/// Returns the first violated rule.
pub fn validate_lines(lines: &[PostingLine]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    for (index, line) in lines.iter().enumerate() {
        let line_no = index + 1;
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(line_no));
        }
        if line.debit.is_zero() && line.credit.is_zero() {
            return Err(LedgerError::ZeroLine(line_no));
        }
        if !line.debit.is_zero() && !line.credit.is_zero() {
            return Err(LedgerError::BothSides(line_no));
        }
        check_storable(line.debit, line_no)?;
        check_storable(line.credit, line_no)?;
    }

    let totals = EntryTotals::from_amounts(lines.iter().map(|l| (l.debit, l.credit)))
        .ok_or(LedgerError::TotalOutOfRange)?;
    if totals.total_debit >= AMOUNT_CEILING || totals.total_credit >= AMOUNT_CEILING {
        return Err(LedgerError::TotalOutOfRange);
    }
    if !totals.is_balanced {
        return Err(LedgerError::Unbalanced {
            debit: totals.total_debit,
            credit: totals.total_credit,
        });
    }

    Ok(totals)
}

/// Rejects amounts the amount columns would round or refuse.
fn check_storable(amount: Decimal, line: usize) -> Result<(), LedgerError> {
    let scale = amount.normalize().scale();
    if scale > AMOUNT_SCALE {
        return Err(LedgerError::ExcessPrecision {
            line,
            scale,
            max: AMOUNT_SCALE,
        });
    }
    if amount >= AMOUNT_CEILING {
        return Err(LedgerError::AmountOutOfRange(line));
    }
    Ok(())
}

/// Checks that `account` may receive postings.
///
/// # Errors
///
/// Returns an error if the account is inactive or a group account.
pub fn check_posting_account(account: &Account) -> Result<(), LedgerError> {
    if !account.is_active {
        return Err(LedgerError::AccountInactive(account.id));
    }
    if account.is_parent {
        return Err(LedgerError::GroupAccount(account.id));
    }
    Ok(())
}

/// Checks that `date` may be posted into `period` of `fiscal_year`.
///
/// # Errors
///
/// Returns an error if the period does not contain the date, either the
/// period or its fiscal year is closed, or either one is inactive.
pub fn check_posting_period(
    date: NaiveDate,
    period: &MonthlyPeriod,
    fiscal_year: &FiscalYear,
) -> Result<(), LedgerError> {
    if !period.contains_date(date) || period.fiscal_year_id != fiscal_year.id {
        return Err(LedgerError::NoPeriodForDate(date));
    }

    for (scope, id, state) in [
        (
            PeriodScope::FiscalYear,
            fiscal_year.id.into_inner(),
            fiscal_year.state(),
        ),
        (
            PeriodScope::MonthlyPeriod,
            period.id.into_inner(),
            period.state(),
        ),
    ] {
        match state {
            PeriodState::Closed => return Err(LedgerError::PeriodClosed { scope, id }),
            PeriodState::OpenInactive => return Err(LedgerError::PeriodInactive { scope, id }),
            PeriodState::OpenActive => {}
        }
    }

    Ok(())
}

/// Journal posting rules.
pub struct PostingGuard;

impl PostingGuard {
    /// Validates a new entry and builds the approved, balanced records to
    /// store.
    ///
    /// `accounts` must contain every account the lines reference; `period`
    /// is the monthly period resolved for the entry date, `None` if none.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` for the first violated rule, checked in order:
    /// permission, lines, accounts, period.
    pub fn prepare(
        actor: &Actor,
        organization_id: OrganizationId,
        input: &NewJournalEntry,
        accounts: &[Account],
        period: Option<(&MonthlyPeriod, &FiscalYear)>,
        now: DateTime<Utc>,
    ) -> Result<PreparedEntry, LedgerError> {
        actor.require(Permission::PostEntries)?;

        let totals = validate_lines(&input.lines)?;

        for line in &input.lines {
            let account = accounts
                .iter()
                .find(|a| a.id == line.account_id && a.organization_id == organization_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id))?;
            check_posting_account(account)?;
        }

        let (period, fiscal_year) = period.ok_or(LedgerError::NoPeriodForDate(input.entry_date))?;
        check_posting_period(input.entry_date, period, fiscal_year)?;

        let entry_id = JournalEntryId::new();
        let items = input
            .lines
            .iter()
            .map(|line| JournalItem {
                id: JournalItemId::new(),
                entry_id,
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                description: line.description.clone(),
            })
            .collect();

        Ok(PreparedEntry {
            entry: JournalEntry {
                id: entry_id,
                organization_id,
                entry_date: input.entry_date,
                monthly_period_id: period.id,
                description: input.description.clone(),
                status: EntryStatus::Approved,
                is_balanced: totals.is_balanced,
                total_debit: totals.total_debit,
                total_credit: totals.total_credit,
                created_by: actor.user_id,
                created_at: now,
                voided_by: None,
                voided_at: None,
            },
            items,
        })
    }

    /// Checks that `entry` may be voided and returns it voided.
    ///
    /// Voiding is allowed in inactive periods but not in closed ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks the permission, the entry is
    /// already voided, or its period or fiscal year is closed.
    pub fn void(
        actor: &Actor,
        entry: &JournalEntry,
        period: &MonthlyPeriod,
        fiscal_year: &FiscalYear,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        actor.require(Permission::PostEntries)?;

        if entry.status == EntryStatus::Voided {
            return Err(LedgerError::AlreadyVoided(entry.id));
        }
        if fiscal_year.state() == PeriodState::Closed {
            return Err(LedgerError::PeriodClosed {
                scope: PeriodScope::FiscalYear,
                id: fiscal_year.id.into_inner(),
            });
        }
        if period.state() == PeriodState::Closed {
            return Err(LedgerError::PeriodClosed {
                scope: PeriodScope::MonthlyPeriod,
                id: period.id.into_inner(),
            });
        }

        Ok(JournalEntry {
            status: EntryStatus::Voided,
            voided_by: Some(actor.user_id),
            voided_at: Some(now),
            ..entry.clone()
        })
    }
}
