//! Ingestion normalizer: maps an arbitrary header row onto the canonical
//! transaction schema and converts data rows one at a time.
//!
//! A bad header is fatal for the whole grid; a bad data row is logged,
//! recorded in [`NormalizedImport::skipped_rows`] and otherwise ignored.

use spendscope_core::data_processors::{AmountParser, DateParser, TextExtractor};
use spendscope_core::models::{CanonicalField, CellValue, Transaction, DESCRIPTION_PLACEHOLDER};
use spendscope_core::SchemaError;
use tracing::{debug, warn};
use uuid::Uuid;

// ── Header synonyms ───────────────────────────────────────────────────────────

/// Accepted header spellings per canonical field, in priority order.
pub const HEADER_SYNONYMS: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::Date, &["date"]),
    (CanonicalField::Description, &["description", "desc", "details"]),
    (CanonicalField::Amount, &["amount", "value", "total"]),
    (CanonicalField::Category, &["category", "group"]),
    (CanonicalField::Account, &["account", "source"]),
];

fn synonyms_for(field: CanonicalField) -> &'static [&'static str] {
    HEADER_SYNONYMS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Column index of every canonical field that the header row resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub amount: usize,
    pub description: Option<usize>,
    pub category: Option<usize>,
    pub account: Option<usize>,
}

/// Find the column for `field`.
///
/// Synonyms are tried in priority order; for each one the first header that
/// equals it exactly (after trimming and lower-casing) wins.
fn find_column(headers: &[String], field: CanonicalField) -> Option<usize> {
    synonyms_for(field)
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

/// Resolve the header row into a [`ColumnMap`].
///
/// Fails when either required field (date, amount) has no matching column.
pub fn resolve_columns(header_row: &[CellValue]) -> Result<ColumnMap, SchemaError> {
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_text().trim().to_lowercase())
        .collect();

    let date = find_column(&headers, CanonicalField::Date);
    let amount = find_column(&headers, CanonicalField::Amount);

    match (date, amount) {
        (Some(date), Some(amount)) => Ok(ColumnMap {
            date,
            amount,
            description: find_column(&headers, CanonicalField::Description),
            category: find_column(&headers, CanonicalField::Category),
            account: find_column(&headers, CanonicalField::Account),
        }),
        (date, amount) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push(CanonicalField::Date);
            }
            if amount.is_none() {
                missing.push(CanonicalField::Amount);
            }
            Err(SchemaError::MissingRequiredColumns { missing })
        }
    }
}

// ── Output types ──────────────────────────────────────────────────────────────

/// Why a data row was left out of the import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidDate,
    InvalidAmount,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidDate => f.write_str("invalid date"),
            SkipReason::InvalidAmount => f.write_str("invalid amount"),
        }
    }
}

/// A data row that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based row number as shown by a spreadsheet (the header is row 1).
    pub row_number: usize,
    pub reason: SkipReason,
}

/// Everything produced by one normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizedImport {
    /// Canonical records in input row order.
    pub transactions: Vec<Transaction>,
    pub skipped_rows: Vec<SkippedRow>,
}

impl NormalizedImport {
    /// Number of data rows seen (accepted plus skipped).
    pub fn rows_seen(&self) -> usize {
        self.transactions.len() + self.skipped_rows.len()
    }
}

// ── Normalizer ────────────────────────────────────────────────────────────────

/// Normalize a decoded grid whose first row is the header row.
///
/// Returns a [`SchemaError`] before touching any data row when the header
/// row is absent or lacks a date or amount column. Individual rows with an
/// unparseable date or amount are skipped with a warning.
pub fn normalize(grid: &[Vec<CellValue>]) -> Result<NormalizedImport, SchemaError> {
    let (header_row, data_rows) = grid.split_first().ok_or(SchemaError::MissingHeaderRow)?;
    let columns = resolve_columns(header_row)?;

    debug!(
        ?columns,
        data_rows = data_rows.len(),
        "resolved import columns"
    );

    let mut out = NormalizedImport::default();

    for (i, row) in data_rows.iter().enumerate() {
        // Header is spreadsheet row 1, so data row i is row i + 2.
        let row_number = i + 2;
        match map_row(row, &columns) {
            Ok(txn) => out.transactions.push(txn),
            Err(reason) => {
                warn!("Skipping invalid row {}: {}", row_number, reason);
                out.skipped_rows.push(SkippedRow { row_number, reason });
            }
        }
    }

    debug!(
        accepted = out.transactions.len(),
        skipped = out.skipped_rows.len(),
        "normalization finished"
    );

    Ok(out)
}

/// Convert one data row. Cells beyond the end of a short row count as empty.
fn map_row(row: &[CellValue], columns: &ColumnMap) -> Result<Transaction, SkipReason> {
    let cell = |idx: usize| row.get(idx).unwrap_or(&CellValue::Empty);
    let optional = |idx: Option<usize>| idx.and_then(|i| TextExtractor::optional(cell(i)));

    let date = DateParser::parse(cell(columns.date)).ok_or(SkipReason::InvalidDate)?;
    let amount = AmountParser::parse(cell(columns.amount)).ok_or(SkipReason::InvalidAmount)?;

    Ok(Transaction {
        id: Uuid::new_v4().to_string(),
        date,
        description: optional(columns.description)
            .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
        amount,
        category: optional(columns.category),
        account: optional(columns.account),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
