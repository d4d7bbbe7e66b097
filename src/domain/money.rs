use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, RoundingMode, Zero};

/// Number of fraction digits every monetary amount is stored and rendered with.
pub const MONEY_SCALE: i64 = 2;

/// Largest amount a `NUMERIC(10, 2)` column holds, in cents.
const MAX_AMOUNT_CENTS: i64 = 9_999_999_999;

/// `99999999.99`
pub fn max_amount() -> BigDecimal {
    BigDecimal::new(BigInt::from(MAX_AMOUNT_CENTS), MONEY_SCALE)
}

pub fn exceeds_max(value: &BigDecimal) -> bool {
    value > &max_amount()
}

/// Round to cents, half away from zero.
pub fn to_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// `unit_price × quantity`, exact before the final rounding to cents.
pub fn line_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    to_cents(&(unit_price * BigDecimal::from(quantity)))
}

/// Render an amount with exactly two fraction digits, e.g. `"25.00"`.
pub fn format_money(value: &BigDecimal) -> String {
    let (cents, _) = to_cents(value)
        .with_scale(MONEY_SCALE)
        .into_bigint_and_exponent();
    let digits = format!("{:0>3}", cents.magnitude().to_string());
    let (units, fraction) = digits.split_at(digits.len() - 2);
    let sign = if cents.sign() == Sign::Minus { "-" } else { "" };
    format!("{sign}{units}.{fraction}")
}

pub fn is_positive(value: &BigDecimal) -> bool {
    value > &BigDecimal::zero()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn line_total_multiplies_exactly() {
        assert_eq!(line_total(&dec("10.00"), 2), dec("20.00"));
        assert_eq!(line_total(&dec("0.10"), 3), dec("0.30"));
    }

    #[test]
    fn format_pads_to_two_digits() {
        assert_eq!(format_money(&dec("25")), "25.00");
        assert_eq!(format_money(&dec("5.5")), "5.50");
        assert_eq!(format_money(&dec("0")), "0.00");
        assert_eq!(format_money(&dec("0.004")), "0.00");
        assert_eq!(format_money(&dec("0.07")), "0.07");
        assert_eq!(format_money(&dec("-3.1")), "-3.10");
    }

    #[test]
    fn max_amount_is_the_column_limit() {
        assert_eq!(max_amount(), dec("99999999.99"));
        assert!(!exceeds_max(&dec("99999999.99")));
        assert!(exceeds_max(&dec("100000000.00")));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(to_cents(&dec("1.005")), dec("1.01"));
        assert_eq!(to_cents(&dec("1.004")), dec("1.00"));
    }

    #[test]
    fn positivity() {
        assert!(is_positive(&dec("0.01")));
        assert!(!is_positive(&dec("0")));
        assert!(!is_positive(&dec("-1.00")));
    }
}
