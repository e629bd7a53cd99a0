//! Calendar-date conventions shared by import and aggregation.
//!
//! Every date in spendscope is a [`NaiveDate`]: there is no time-of-day and
//! no timezone, so a value parsed as "the 5th" can never drift to the 4th.
//! Only years 1 through 9999 are accepted, which keeps month keys four
//! digits wide.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};

/// Years an imported date may fall in.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// Whether `date` lies in [`SUPPORTED_YEARS`].
pub fn within_supported_years(date: NaiveDate) -> bool {
    SUPPORTED_YEARS.contains(&date.year())
}

// ── Spreadsheet serial dates ──────────────────────────────────────────────────

/// Day zero of the spreadsheet serial-date convention (1899-12-30), counted
/// in days from 0001-01-01 the way [`Datelike::num_days_from_ce`] does.
///
/// Counting from 1899-12-30 makes every serial after 60 agree with what
/// Excel displays; below that the phantom 1900-02-29 shifts Excel by a day.
pub const SPREADSHEET_EPOCH_DAYS_FROM_CE: i32 = 693_594;

/// The spreadsheet epoch as a date.
pub fn spreadsheet_epoch() -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(SPREADSHEET_EPOCH_DAYS_FROM_CE)
}

/// Convert a spreadsheet serial number into the calendar day it names.
///
/// Any fractional part (time of day) is discarded. Returns `None` for
/// non-finite serials and for days outside [`SUPPORTED_YEARS`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use spendscope_core::time_utils::serial_to_date;
///
/// assert_eq!(serial_to_date(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
/// assert_eq!(serial_to_date(1.0), NaiveDate::from_ymd_opt(1899, 12, 31));
/// ```
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.floor();
    if days.abs() > i32::MAX as f64 {
        return None;
    }
    let days_from_ce = SPREADSHEET_EPOCH_DAYS_FROM_CE.checked_add(days as i32)?;
    NaiveDate::from_num_days_from_ce_opt(days_from_ce).filter(|d| within_supported_years(*d))
}

// ── Date strings ──────────────────────────────────────────────────────────────

/// Calendar formats accepted for text date cells, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a date string as a local calendar day.
///
/// Anything after a `T` or the first whitespace (a time of day, an offset)
/// is dropped before parsing. A bare `YYYY-MM` resolves to the first of the
/// month. Dates outside [`SUPPORTED_YEARS`] are rejected.
pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    parse_date_part(s).filter(|d| within_supported_years(*d))
}

fn parse_date_part(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let date_part = trimmed
        .split('T')
        .next()
        .and_then(|p| p.split_whitespace().next())?;

    if date_part.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(date);
        }
    }

    // Year-month only.
    NaiveDate::parse_from_str(&format!("{}-01", date_part), "%Y-%m-%d").ok()
}

// ── Month keys ────────────────────────────────────────────────────────────────

/// Bucket key for the month containing `date`, zero-padded `"YYYY-MM"`.
///
/// Zero padding makes lexicographic order equal chronological order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Display label for a month key: abbreviated month and two-digit year.
///
/// The label is derived from the 2nd day of the month.
///
/// ```
/// use spendscope_core::time_utils::month_label;
///
/// assert_eq!(month_label("2024-01").as_deref(), Some("Jan 24"));
/// assert_eq!(month_label("garbage"), None);
/// ```
pub fn month_label(key: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(&format!("{}-02", key), "%Y-%m-%d").ok()?;
    Some(date.format("%b %y").to_string())
}
