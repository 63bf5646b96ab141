//! Period hierarchy: creating fiscal years and partitioning them into months.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use fiscus_shared::types::{FiscalYearId, MonthlyPeriodId, OrganizationId};

use super::error::FiscalError;
use super::period::{FiscalYear, FiscalYearType, MonthlyPeriod, PeriodStatus};
use crate::auth::{Actor, Permission};

/// Number of monthly periods in every fiscal year.
pub const MONTHS_PER_FISCAL_YEAR: usize = 12;

/// Input for creating a fiscal year.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFiscalYear {
    /// Year name (e.g., "FY2024").
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Convention of the range.
    pub fiscal_year_type: FiscalYearType,
}

/// A date resolved to its monthly period and fiscal year.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPeriod<'a> {
    /// Fiscal year containing the date.
    pub fiscal_year: &'a FiscalYear,
    /// Monthly period containing the date.
    pub period: &'a MonthlyPeriod,
}

/// Validates that `start` is strictly before `end`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FiscalError> {
    if start >= end {
        return Err(FiscalError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if:
/// a_start <= b_end AND a_end >= b_start
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Returns the last day of a month, or `None` for an invalid month.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month?.pred_opt()
}

/// Returns the English month name.
#[must_use]
pub const fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Fiscal calendar rules.
///
/// Pure functions over already-loaded fiscal years and periods; the caller
/// persists whatever they return.
pub struct FiscalCalendar;

impl FiscalCalendar {
    /// Validates and builds a new fiscal year, starting `OpenInactive`.
    ///
    /// `existing` must hold every fiscal year of the organization.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the actor is not an administrator
    /// - the name is blank
    /// - start_date >= end_date
    /// - the range is not exactly one year of the convention
    /// - the convention differs from the organization's existing years
    /// - the range overlaps an existing fiscal year
    pub fn create_fiscal_year(
        actor: &Actor,
        organization_id: OrganizationId,
        input: NewFiscalYear,
        existing: &[FiscalYear],
    ) -> Result<FiscalYear, FiscalError> {
        actor.require(Permission::ManageFiscalCalendar)?;
        Self::validate_new_year(&input, existing)?;

        Ok(FiscalYear {
            id: FiscalYearId::new(),
            organization_id,
            name: input.name.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            fiscal_year_type: input.fiscal_year_type,
            status: PeriodStatus::default(),
        })
    }

    /// Runs the creation rules without building anything.
    ///
    /// # Errors
    ///
    /// See [`FiscalCalendar::create_fiscal_year`].
    pub fn validate_new_year(
        input: &NewFiscalYear,
        existing: &[FiscalYear],
    ) -> Result<(), FiscalError> {
        if input.name.trim().is_empty() {
            return Err(FiscalError::EmptyName);
        }

        validate_date_range(input.start_date, input.end_date)?;

        if !input
            .fiscal_year_type
            .is_exact_span(input.start_date, input.end_date)
        {
            return Err(FiscalError::NotConventionSpan {
                fiscal_year_type: input.fiscal_year_type,
                start: input.start_date,
                end: input.end_date,
            });
        }

        // The first fiscal year fixes the convention for the organization
        if let Some(expected) = existing.first().map(|fy| fy.fiscal_year_type)
            && expected != input.fiscal_year_type
        {
            return Err(FiscalError::ConventionMismatch {
                expected,
                requested: input.fiscal_year_type,
            });
        }

        if let Some(overlapping) = existing.iter().find(|fy| {
            date_ranges_overlap(fy.start_date, fy.end_date, input.start_date, input.end_date)
        }) {
            return Err(FiscalError::OverlappingYear(overlapping.name.clone()));
        }

        Ok(())
    }

    /// Generates the twelve monthly periods of a fiscal year.
    ///
    /// `existing` must hold the periods already stored for the year.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the actor is not an administrator
    /// - periods already exist for the year
    /// - the generated periods do not partition the year exactly
    pub fn generate_monthly_periods(
        actor: &Actor,
        fiscal_year: &FiscalYear,
        existing: &[MonthlyPeriod],
    ) -> Result<Vec<MonthlyPeriod>, FiscalError> {
        actor.require(Permission::ManageFiscalCalendar)?;

        if !existing.is_empty() {
            return Err(FiscalError::PeriodsAlreadyInitialized(
                fiscal_year.id.into_inner(),
            ));
        }

        let periods = monthly_partition(fiscal_year)?;
        Self::verify_partition(fiscal_year, &periods)?;
        Ok(periods)
    }

    /// Checks that `periods`, ordered by number, tile the fiscal year with
    /// no gaps and no overlaps.
    ///
    /// # Errors
    ///
    /// Returns `PartitionMismatch` on any deviation.
    pub fn verify_partition(
        fiscal_year: &FiscalYear,
        periods: &[MonthlyPeriod],
    ) -> Result<(), FiscalError> {
        let mismatch = || FiscalError::PartitionMismatch(fiscal_year.id.into_inner());

        if periods.len() != MONTHS_PER_FISCAL_YEAR {
            return Err(mismatch());
        }

        let mut expected_start = fiscal_year.start_date;
        for (index, period) in periods.iter().enumerate() {
            let expected_number = i16::try_from(index + 1).map_err(|_| mismatch())?;
            if period.fiscal_year_id != fiscal_year.id
                || period.period_number != expected_number
                || period.start_date != expected_start
                || period.end_date < period.start_date
            {
                return Err(mismatch());
            }
            expected_start = match period.end_date.succ_opt() {
                Some(next) => next,
                None => return Err(mismatch()),
            };
        }

        let last_end = periods.last().map(|p| p.end_date);
        if last_end != Some(fiscal_year.end_date) {
            return Err(mismatch());
        }

        Ok(())
    }

    /// Finds the monthly period and fiscal year containing `date`.
    ///
    /// # Errors
    ///
    /// Returns `NoPeriodForDate` if no period covers the date, or
    /// `FiscalYearNotFound` if the covering period's year is not in `years`.
    pub fn resolve<'a>(
        date: NaiveDate,
        years: &'a [FiscalYear],
        periods: &'a [MonthlyPeriod],
    ) -> Result<ResolvedPeriod<'a>, FiscalError> {
        let period = periods
            .iter()
            .find(|p| p.contains_date(date))
            .ok_or(FiscalError::NoPeriodForDate(date))?;

        let fiscal_year = years
            .iter()
            .find(|fy| fy.id == period.fiscal_year_id)
            .ok_or(FiscalError::FiscalYearNotFound(
                period.fiscal_year_id.into_inner(),
            ))?;

        Ok(ResolvedPeriod {
            fiscal_year,
            period,
        })
    }
}

/// Splits the fiscal year at month boundaries.
fn monthly_partition(fiscal_year: &FiscalYear) -> Result<Vec<MonthlyPeriod>, FiscalError> {
    let mismatch = || FiscalError::PartitionMismatch(fiscal_year.id.into_inner());

    let mut periods = Vec::with_capacity(MONTHS_PER_FISCAL_YEAR);
    let mut current = fiscal_year.start_date;
    let mut period_number: i16 = 1;

    while current <= fiscal_year.end_date {
        let month_end = last_day_of_month(current.year(), current.month()).ok_or_else(mismatch)?;
        let period_end = month_end.min(fiscal_year.end_date);

        periods.push(MonthlyPeriod {
            id: MonthlyPeriodId::new(),
            fiscal_year_id: fiscal_year.id,
            period_number,
            name: format!("{} {}", month_name(current.month()), current.year()),
            year: current.year(),
            month: current.month(),
            start_date: current,
            end_date: period_end,
            status: PeriodStatus::default(),
        });

        current = match period_end.succ_opt() {
            Some(next) => next,
            None => break,
        };
        period_number += 1;
    }

    Ok(periods)
}
