//! Decimal money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All ledger arithmetic stays in `rust_decimal::Decimal` at full precision;
//! rounding happens only here, at the presentation boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits shown in reports and API responses.
pub const PRESENTATION_SCALE: u32 = 2;

/// Rounds an amount for display using banker's rounding.
///
/// Must not be fed back into further computation.
#[must_use]
pub fn present(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(PRESENTATION_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true when `a` and `b` differ by at most `tolerance`.
///
/// A difference too large to represent is never within tolerance.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1.005), dec!(1.00))]
    #[case(dec!(1.015), dec!(1.02))]
    #[case(dec!(1.0151), dec!(1.02))]
    #[case(dec!(-2.675), dec!(-2.68))]
    #[case(dec!(800), dec!(800))]
    fn test_present_uses_bankers_rounding(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(present(input), expected);
    }

    #[test]
    fn test_within_tolerance_is_inclusive() {
        assert!(within_tolerance(dec!(100.00), dec!(100.01), dec!(0.01)));
        assert!(within_tolerance(dec!(100.01), dec!(100.00), dec!(0.01)));
        assert!(!within_tolerance(dec!(100.00), dec!(100.02), dec!(0.01)));
        assert!(!within_tolerance(Decimal::MAX, Decimal::MIN, dec!(0.01)));
    }
}
