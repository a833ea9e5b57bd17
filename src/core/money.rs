use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

/// Rounds to cents, half away from zero, and pins the scale to 2 so that
/// serialized amounts always read like `"6300.00"`.
pub fn round2(value: Decimal) -> Decimal {
    round_to(value, 2)
}

pub(crate) fn round_to(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

/// Parses a user-typed amount or rate. Blank input reads as zero, the way a
/// browser number coercion does; anything else must be a finite decimal,
/// optionally in scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Coerces a JSON number or numeric string into a decimal.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) if !s.trim().is_empty() => parse_decimal(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
        assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
        assert_eq!(round2(dec!(572.5)), dec!(572.50));
        assert_eq!(round2(dec!(0.124999)), dec!(0.12));
    }

    #[test]
    fn round2_pins_two_decimal_places() {
        assert_eq!(round2(dec!(5000)).to_string(), "5000.00");
        assert_eq!(round2(dec!(1.5)).to_string(), "1.50");
    }

    #[test]
    fn parse_decimal_accepts_blank_plain_and_scientific() {
        assert_eq!(parse_decimal(""), Some(Decimal::ZERO));
        assert_eq!(parse_decimal("  "), Some(Decimal::ZERO));
        assert_eq!(parse_decimal(" 1000.00 "), Some(dec!(1000.00)));
        assert_eq!(parse_decimal("-0.05"), Some(dec!(-0.05)));
        assert_eq!(parse_decimal("1e3"), Some(dec!(1000)));
    }

    #[test]
    fn parse_decimal_rejects_non_numbers() {
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("Infinity"), None);
        assert_eq!(parse_decimal("12abc"), None);
    }

    #[test]
    fn decimal_from_json_reads_numbers_and_strings() {
        assert_eq!(decimal_from_json(&json!(6300)), Some(dec!(6300)));
        assert_eq!(decimal_from_json(&json!(0.1)), Some(dec!(0.1)));
        assert_eq!(decimal_from_json(&json!("6300.00")), Some(dec!(6300.00)));
        assert_eq!(decimal_from_json(&json!("")), None);
        assert_eq!(decimal_from_json(&json!(null)), None);
        assert_eq!(decimal_from_json(&json!(true)), None);
    }
}
