use crate::error::MoneyError;
use regex::Regex;
use std::sync::LazyLock;

/// Unit suffix of the canonical wire form
pub const MONTHLY_SUFFIX: &str = "/month";

/// Largest monthly amount accepted as a savings estimate
pub const MAX_MONTHLY_AMOUNT: f64 = 1.0e12;

static MONEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$€£]?\s*(-?(?:\d[\d,]*(?:\.\d+)?|\.\d+))\s*(?:/\s*(?:month|mo))?$")
        .expect("money pattern is valid")
});

/// Parse a currency-formatted amount such as `"$12.34/month"`.
///
/// Accepts an optional leading currency symbol, an optional `/month` (or
/// `/mo`) suffix, surrounding whitespace and thousands separators.
pub fn parse(text: &str) -> Result<f64, MoneyError> {
    let trimmed = text.trim();
    let captures = MONEY_PATTERN
        .captures(trimmed)
        .ok_or_else(|| MoneyError::InvalidMonetaryFormat(text.to_string()))?;

    let literal = captures[1].replace(',', "");
    let value: f64 = literal
        .parse()
        .map_err(|_| MoneyError::InvalidMonetaryFormat(text.to_string()))?;

    if !value.is_finite() {
        return Err(MoneyError::InvalidMonetaryFormat(text.to_string()));
    }
    Ok(value)
}

/// Render an amount in the canonical wire form, `"$X.XX/month"`.
pub fn format(amount: f64) -> String {
    format!("{}{}", format_amount(amount), MONTHLY_SUFFIX)
}

/// Render an amount as `"$X.XX"` for tables and reports.
pub fn format_amount(amount: f64) -> String {
    // avoid printing "-0.00"
    let amount = if amount == 0.0 { 0.0 } else { amount };
    format!("${:.2}", amount)
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Round a savings estimate to cents, rejecting negative, non-finite and
/// implausibly large amounts so totals stay finite and format back to a
/// parseable wire string.
pub fn checked_savings(amount: f64) -> Result<f64, MoneyError> {
    if !amount.is_finite() || amount < 0.0 || amount > MAX_MONTHLY_AMOUNT {
        return Err(MoneyError::OutOfRange(amount.to_string()));
    }
    Ok(round_cents(amount))
}

/// Serde adapter: `f64` in memory, currency string on the wire.
pub mod wire {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_form() {
        assert_eq!(parse("$12.34/month").unwrap(), 12.34);
        assert_eq!(parse("$0.00/month").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_lenient_forms() {
        assert_eq!(parse("  $45.5 / month ").unwrap(), 45.5);
        assert_eq!(parse("120").unwrap(), 120.0);
        assert_eq!(parse("$1,250.75").unwrap(), 1250.75);
        assert_eq!(parse("€30/mo").unwrap(), 30.0);
        assert_eq!(parse(".5").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "$", "/month", "$abc/month", "twelve dollars", "$12.34/year", "NaN", "inf"] {
            assert_eq!(
                parse(bad),
                Err(MoneyError::InvalidMonetaryFormat(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format(80.0), "$80.00/month");
        assert_eq!(format(12.345), "$12.35/month");
        assert_eq!(format_amount(1.5), "$1.50");
        assert_eq!(format_amount(-0.0), "$0.00");
    }

    #[test]
    fn test_round_trip_two_decimals() {
        for cents in [0u64, 1, 99, 100, 1234, 4000, 8000, 99999, 123456789] {
            let amount = cents as f64 / 100.0;
            assert_eq!(parse(&format(amount)).unwrap(), amount);
        }
    }

    #[test]
    fn test_checked_savings_bounds() {
        assert_eq!(checked_savings(11.899999).unwrap(), 11.9);
        assert_eq!(checked_savings(0.0).unwrap(), 0.0);
        assert_eq!(checked_savings(MAX_MONTHLY_AMOUNT).unwrap(), MAX_MONTHLY_AMOUNT);

        for bad in [-5.0, 1.7e308, f64::INFINITY, f64::NAN, MAX_MONTHLY_AMOUNT * 2.0] {
            assert!(
                matches!(checked_savings(bad), Err(MoneyError::OutOfRange(_))),
                "{bad} should be out of range"
            );
        }
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(60.000000001), 60.0);
        assert_eq!(round_cents(11.899999), 11.9);
    }
}
