//! Fiscal years, monthly periods and their lifecycle.
//!
//! - `calendar` - creating fiscal years and partitioning them into months
//! - `lifecycle` - activate / deactivate / close / reopen state machine
//! - `period` - fiscal year and monthly period types

pub mod calendar;
pub mod error;
pub mod lifecycle;
pub mod period;

#[cfg(test)]
mod calendar_props;
#[cfg(test)]
mod lifecycle_props;

pub use calendar::{
    FiscalCalendar, MONTHS_PER_FISCAL_YEAR, NewFiscalYear, ResolvedPeriod, date_ranges_overlap,
    last_day_of_month, month_name, validate_date_range,
};
pub use error::FiscalError;
pub use lifecycle::{
    PeriodAction, PeriodLifecycle, PeriodScope, PeriodState, TransitionPlan, TransitionRecord,
};
pub use period::{FiscalYear, FiscalYearType, MonthlyPeriod, PeriodStatus};
