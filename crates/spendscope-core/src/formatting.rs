use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal with thousands separators and a fixed number of decimal
/// places (half away from zero).
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use rust_decimal::Decimal;
/// use spendscope_core::formatting::format_amount;
///
/// let d = |s: &str| Decimal::from_str(s).unwrap();
/// assert_eq!(format_amount(d("1234.5"), 1), "1,234.5");
/// assert_eq!(format_amount(d("1234567"), 0), "1,234,567");
/// assert_eq!(format_amount(d("0"), 2), "0.00");
/// assert_eq!(format_amount(d("-9876.5"), 1), "-9,876.5");
/// ```
pub fn format_amount(value: Decimal, decimals: u32) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);

    // `{:.N}` pads the fraction with zeros to exactly N places.
    let plain = format!("{:.prec$}", rounded, prec = decimals as usize);
    let (int_str, frac_str) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (plain, None),
    };

    let grouped = group_thousands(&int_str);
    let body = match frac_str {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    };

    if value.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a monetary amount with two decimal places and thousands
/// separators.
///
/// ```
/// use std::str::FromStr;
/// use rust_decimal::Decimal;
/// use spendscope_core::formatting::format_currency;
///
/// assert_eq!(format_currency(Decimal::from_str("1234.56").unwrap()), "$1,234.56");
/// assert_eq!(format_currency(Decimal::ZERO), "$0.00");
/// assert_eq!(format_currency(Decimal::from_str("-9.99").unwrap()), "$-9.99");
/// ```
pub fn format_currency(amount: Decimal) -> String {
    format!("${}", format_amount(amount, 2))
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: Decimal, whole: Decimal, decimal_places: u32) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    let raw = (part / whole) * Decimal::ONE_HUNDRED;
    raw.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Insert `,` every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
