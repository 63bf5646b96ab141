//! Property tests for the period hierarchy.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use super::calendar::tests::{actor, fiscal_year};
use super::calendar::{FiscalCalendar, date_ranges_overlap, validate_date_range};
use super::error::FiscalError;
use super::period::FiscalYearType;
use crate::auth::UserRole;

fn fiscal_year_type() -> impl Strategy<Value = FiscalYearType> {
    prop::sample::select(FiscalYearType::ALL.to_vec())
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..=2090, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

fn date_range() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (date_strategy(), 1i64..=400).prop_map(|(start, days)| (start, start + Duration::days(days)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Generated periods tile the fiscal year: 12 of them, contiguous,
    /// and every day of the year lies in exactly one.
    #[test]
    fn prop_monthly_periods_partition_the_year(
        fy_type in fiscal_year_type(),
        year in 1990i32..=2100,
    ) {
        let fy = fiscal_year(fy_type, year);
        let periods =
            FiscalCalendar::generate_monthly_periods(&actor(UserRole::Admin), &fy, &[]).unwrap();

        prop_assert_eq!(periods.len(), 12);
        prop_assert!(FiscalCalendar::verify_partition(&fy, &periods).is_ok());
        prop_assert_eq!(periods[0].start_date, fy.start_date);
        prop_assert_eq!(periods[11].end_date, fy.end_date);

        for pair in periods.windows(2) {
            prop_assert_eq!(pair[0].end_date.succ_opt(), Some(pair[1].start_date));
        }

        let mut day = fy.start_date;
        while day <= fy.end_date {
            let covering = periods.iter().filter(|p| p.contains_date(day)).count();
            prop_assert_eq!(covering, 1, "day {} covered {} times", day, covering);
            day = day.succ_opt().unwrap();
        }
    }

    /// Any range that is not the exact convention span is rejected.
    #[test]
    fn prop_shifted_spans_rejected(
        fy_type in fiscal_year_type(),
        year in 2000i32..=2090,
        shift in 1i64..=27,
    ) {
        let (start, end) = fy_type.span_starting(year).unwrap();
        prop_assert!(!fy_type.is_exact_span(start + Duration::days(shift), end));
        prop_assert!(!fy_type.is_exact_span(start, end - Duration::days(shift)));
    }

    /// Ranges with start >= end are rejected.
    #[test]
    fn prop_invalid_date_range_rejected(date in date_strategy(), back in 0i64..=30) {
        let result = validate_date_range(date, date - Duration::days(back));
        prop_assert!(
            matches!(result, Err(FiscalError::InvalidDateRange { .. })),
            "expected InvalidDateRange, got {:?}",
            result
        );
    }

    /// Overlap detection is symmetric.
    #[test]
    fn prop_overlap_is_symmetric(
        (a_start, a_end) in date_range(),
        (b_start, b_end) in date_range(),
    ) {
        prop_assert_eq!(
            date_ranges_overlap(a_start, a_end, b_start, b_end),
            date_ranges_overlap(b_start, b_end, a_start, a_end)
        );
    }

    /// A range starting the day after another ends does not overlap it.
    #[test]
    fn prop_adjacent_ranges_do_not_overlap((a_start, a_end) in date_range(), len in 0i64..=400) {
        let b_start = a_end + Duration::days(1);
        prop_assert!(!date_ranges_overlap(a_start, a_end, b_start, b_start + Duration::days(len)));
    }
}
