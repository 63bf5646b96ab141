//! Fiscal year and monthly period types.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use fiscus_shared::types::{FiscalYearId, MonthlyPeriodId, OrganizationId, UserId};

use super::calendar::last_day_of_month;
use super::lifecycle::PeriodState;

/// Fiscal year convention, fixed company-wide once the first year exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalYearType {
    /// January to December.
    Calendar,
    /// April to March.
    AprilMarch,
    /// July to June.
    JulyJune,
    /// October to September.
    OctoberSeptember,
}

impl FiscalYearType {
    /// Every convention.
    pub const ALL: [Self; 4] = [
        Self::Calendar,
        Self::AprilMarch,
        Self::JulyJune,
        Self::OctoberSeptember,
    ];

    /// Calendar month (1-12) in which fiscal years of this type start.
    #[must_use]
    pub const fn start_month(self) -> u32 {
        match self {
            Self::Calendar => 1,
            Self::AprilMarch => 4,
            Self::JulyJune => 7,
            Self::OctoberSeptember => 10,
        }
    }

    /// Canonical `[start, end]` of the fiscal year starting in calendar `year`.
    ///
    /// Returns `None` only when the dates fall outside chrono's range.
    #[must_use]
    pub fn span_starting(self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, self.start_month(), 1)?;
        let (end_year, end_month) = if self.start_month() == 1 {
            (year, 12)
        } else {
            (year + 1, self.start_month() - 1)
        };
        Some((start, last_day_of_month(end_year, end_month)?))
    }

    /// Returns true if `[start, end]` is exactly one fiscal year of this type.
    #[must_use]
    pub fn is_exact_span(self, start: NaiveDate, end: NaiveDate) -> bool {
        self.span_starting(start.year()) == Some((start, end))
    }

    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::AprilMarch => "april_march",
            Self::JulyJune => "july_june",
            Self::OctoberSeptember => "october_september",
        }
    }
}

impl std::fmt::Display for FiscalYearType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FiscalYearType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fiscal year type '{s}'"))
    }
}

/// Lifecycle flags and audit stamps shared by fiscal years and monthly periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodStatus {
    /// Open for postings.
    pub is_active: bool,
    /// Closed; no postings dated inside the period are accepted.
    pub is_closed: bool,
    /// First close.
    pub closed_at: Option<DateTime<Utc>>,
    /// Actor of the first close.
    pub closed_by: Option<UserId>,
    /// Latest reopen.
    pub reopened_at: Option<DateTime<Utc>>,
    /// Actor of the latest reopen.
    pub reopened_by: Option<UserId>,
    /// Justification given for the latest reopen.
    pub reopen_reason: Option<String>,
    /// Latest close after a reopen.
    pub reclosed_at: Option<DateTime<Utc>>,
    /// Actor of the latest close after a reopen.
    pub reclosed_by: Option<UserId>,
}

impl PeriodStatus {
    /// Lifecycle state derived from the flags.
    #[must_use]
    pub const fn state(&self) -> PeriodState {
        PeriodState::from_flags(self.is_active, self.is_closed)
    }

    /// Returns true if this period was reopened at least once.
    #[must_use]
    pub const fn was_reopened(&self) -> bool {
        self.reopened_at.is_some()
    }
}

/// A fiscal year of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Unique identifier.
    pub id: FiscalYearId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Year name (e.g., "FY2024").
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Convention the range follows.
    pub fiscal_year_type: FiscalYearType,
    /// Lifecycle flags.
    #[serde(flatten)]
    pub status: PeriodStatus,
}

impl FiscalYear {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PeriodState {
        self.status.state()
    }

    /// Returns true if the given date falls within this fiscal year.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// One month of a fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    /// Unique identifier.
    pub id: MonthlyPeriodId,
    /// Parent fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// Position within the fiscal year, 1-12.
    pub period_number: i16,
    /// Display name (e.g., "January 2024").
    pub name: String,
    /// Calendar year of the month.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Lifecycle flags.
    #[serde(flatten)]
    pub status: PeriodStatus,
}

impl MonthlyPeriod {
    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PeriodState {
        self.status.state()
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(FiscalYearType::Calendar, 2024, date(2024, 1, 1), date(2024, 12, 31))]
    #[case(FiscalYearType::AprilMarch, 2024, date(2024, 4, 1), date(2025, 3, 31))]
    #[case(FiscalYearType::JulyJune, 2023, date(2023, 7, 1), date(2024, 6, 30))]
    #[case(FiscalYearType::OctoberSeptember, 2024, date(2024, 10, 1), date(2025, 9, 30))]
    fn test_span_starting(
        #[case] fy_type: FiscalYearType,
        #[case] year: i32,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        assert_eq!(fy_type.span_starting(year), Some((start, end)));
        assert!(fy_type.is_exact_span(start, end));
    }

    #[test]
    fn test_inexact_spans_rejected() {
        let calendar = FiscalYearType::Calendar;
        assert!(!calendar.is_exact_span(date(2024, 1, 2), date(2024, 12, 31)));
        assert!(!calendar.is_exact_span(date(2024, 1, 1), date(2024, 12, 30)));
        assert!(!calendar.is_exact_span(date(2024, 4, 1), date(2025, 3, 31)));
        assert!(FiscalYearType::AprilMarch.is_exact_span(date(2024, 4, 1), date(2025, 3, 31)));
    }

    #[test]
    fn test_parse_fiscal_year_type() {
        assert_eq!(
            "july_june".parse::<FiscalYearType>().unwrap(),
            FiscalYearType::JulyJune
        );
        assert!("jan_dec".parse::<FiscalYearType>().is_err());
    }

    #[test]
    fn test_default_status_is_open_inactive() {
        let status = PeriodStatus::default();
        assert_eq!(status.state(), PeriodState::OpenInactive);
        assert!(!status.was_reopened());
    }

    #[test]
    fn test_status_flattened_in_json() {
        let fy = FiscalYear {
            id: FiscalYearId::new(),
            organization_id: OrganizationId::new(),
            name: "FY2024".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            fiscal_year_type: FiscalYearType::Calendar,
            status: PeriodStatus {
                is_active: true,
                ..PeriodStatus::default()
            },
        };
        let json = serde_json::to_value(&fy).unwrap();
        assert_eq!(json["is_active"], true);
        assert_eq!(json["is_closed"], false);
        assert_eq!(json["fiscal_year_type"], "calendar");
    }
}
