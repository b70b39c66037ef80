//! Money arithmetic helpers
//!
//! All monetary math runs on [`Decimal`] and is rounded to two places
//! half-up before storage or comparison. Floats never enter the
//! pipeline.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values.
pub const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed quantity per order line.
pub const MAX_QUANTITY: i64 = 9999;

/// Round to two decimal places, midpoint away from zero.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Line total for one item: unit price times quantity, rounded.
#[inline]
pub fn line_total(unit_price: Decimal, quantity: i64) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Compare two monetary values within the 0.01 tolerance.
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_half_up() {
        // 0.005 rounds up to 0.01
        assert_eq!(round_money(Decimal::new(5, 3)), Decimal::new(1, 2));
        // 0.004 rounds down to 0.00
        assert_eq!(round_money(Decimal::new(4, 3)), Decimal::ZERO);
        // -0.005 rounds away from zero to -0.01
        assert_eq!(round_money(Decimal::new(-5, 3)), Decimal::new(-1, 2));
    }

    #[test]
    fn test_line_total() {
        // 10.99 * 3 = 32.97
        assert_eq!(line_total(Decimal::new(1099, 2), 3), Decimal::new(3297, 2));
        // 45.50 * 2 = 91.00
        assert_eq!(line_total(Decimal::new(4550, 2), 2), Decimal::new(9100, 2));
    }

    #[test]
    fn test_accumulation_precision() {
        // Sum 0.01 one thousand times
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += Decimal::new(1, 2);
        }
        assert_eq!(total, Decimal::new(10, 0));
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(Decimal::new(10000, 2), Decimal::new(10000, 2)));
        assert!(money_eq(Decimal::new(100004, 3), Decimal::new(100006, 3)));
        assert!(!money_eq(Decimal::new(10000, 2), Decimal::new(10002, 2)));
    }
}
