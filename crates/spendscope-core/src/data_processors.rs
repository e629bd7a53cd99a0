use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::models::CellValue;
use crate::time_utils::{parse_local_date, serial_to_date};

// ── DateParser ────────────────────────────────────────────────────────────────

/// Resolves a cell into a calendar date.
pub struct DateParser;

impl DateParser {
    /// Attempt to read `cell` as a date.
    ///
    /// Tried in order:
    /// * native date cell → used as-is
    /// * number           → spreadsheet serial date
    /// * text             → calendar date with any time of day stripped
    pub fn parse(cell: &CellValue) -> Option<NaiveDate> {
        match cell {
            CellValue::Date(d) => Some(*d),
            CellValue::Number(n) => serial_to_date(*n),
            CellValue::Text(s) => parse_local_date(s),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }
}

// ── AmountParser ──────────────────────────────────────────────────────────────

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<open>\()?\s*",
            r"(?P<sign>[+-])?\s*[$€£¥]?\s*(?P<sign2>[+-])?\s*",
            r"(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d*)?|\d+(?:\.\d*)?|\.\d+)",
            r"(?P<exp>[eE][+-]?\d+)?",
            r"\s*(?P<close>\))?$",
        ))
        .expect("regex is valid")
    })
}

/// Largest accepted amount magnitude (one quadrillion).
///
/// Summing billions of rows at this size stays far below the `Decimal`
/// maximum, so aggregation totals cannot overflow.
pub const MAX_AMOUNT_MAGNITUDE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Coerces a cell into a signed decimal amount.
pub struct AmountParser;

impl AmountParser {
    /// Attempt to read `cell` as an amount.
    ///
    /// Numbers must be finite. Text must be a complete number after
    /// trimming; a currency symbol, comma thousands grouping and accounting
    /// parentheses (`"(40.00)"` is `-40`) are accepted. Everything else,
    /// including `"Infinity"` and magnitudes above [`MAX_AMOUNT_MAGNITUDE`],
    /// yields `None`.
    pub fn parse(cell: &CellValue) -> Option<Decimal> {
        let amount = match cell {
            CellValue::Number(n) if n.is_finite() => Decimal::from_f64(*n),
            CellValue::Text(s) => Self::parse_str(s),
            _ => None,
        }?;
        (amount.abs() <= MAX_AMOUNT_MAGNITUDE).then_some(amount)
    }

    fn parse_str(s: &str) -> Option<Decimal> {
        let caps = amount_regex().captures(s.trim())?;

        let parenthesised = caps.name("open").is_some();
        if parenthesised != caps.name("close").is_some() {
            return None;
        }
        let sign = match (caps.name("sign"), caps.name("sign2")) {
            (Some(_), Some(_)) => return None,
            (Some(m), None) | (None, Some(m)) => m.as_str(),
            (None, None) => "+",
        };
        if parenthesised && sign == "-" {
            return None;
        }

        let digits = caps.name("num")?.as_str().replace(',', "");
        let magnitude = match caps.name("exp") {
            Some(exp) => {
                let value: f64 = format!("{}{}", digits, exp.as_str()).parse().ok()?;
                if !value.is_finite() {
                    return None;
                }
                Decimal::from_f64(value)?
            }
            None => Self::decimal_from_digits(&digits)?,
        };

        if sign == "-" || parenthesised {
            Some(-magnitude)
        } else {
            Some(magnitude)
        }
    }

    /// Parse an unsigned digit string such as `"12"`, `"12."` or `".5"`.
    fn decimal_from_digits(digits: &str) -> Option<Decimal> {
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let canonical = if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac_part)
        };

        // Beyond 28 significant digits Decimal rejects the literal; fall back
        // to the nearest float.
        Decimal::from_str(&canonical).ok().or_else(|| {
            canonical
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .and_then(Decimal::from_f64)
        })
    }
}

// ── TextExtractor ─────────────────────────────────────────────────────────────

/// Reads free-text fields out of cells.
pub struct TextExtractor;

impl TextExtractor {
    /// The trimmed cell text, or `None` when the cell is blank.
    pub fn optional(cell: &CellValue) -> Option<String> {
        let text = cell.to_text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
