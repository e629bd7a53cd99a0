//! Statement file discovery and decoding.
//!
//! Turns a CSV or spreadsheet file into a [`Grid`] of [`CellValue`]s without
//! interpreting any of it; header resolution and type coercion belong to
//! the normalizer.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, ExcelDateTimeType, Reader};
use chrono::NaiveDate;
use spendscope_core::models::{CellValue, Grid};
use spendscope_core::time_utils::serial_to_date;
use spendscope_core::{Result, SpendError};
use tracing::{debug, warn};

// ── Formats ───────────────────────────────────────────────────────────────────

/// How a statement file is decoded, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    /// Delimited text; the delimiter is sniffed from the content.
    Delimited,
    /// Any workbook calamine can open (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
}

const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

impl StatementFormat {
    /// Pick the format for `path`, or `None` for unsupported extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(StatementFormat::Delimited)
        } else if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(StatementFormat::Workbook)
        } else {
            None
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all supported statement files recursively under `dir`, sorted by path.
pub fn find_statement_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Statement path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && StatementFormat::from_path(entry.path()).is_some()
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Decode `path` into a grid. Only the first worksheet of a workbook is read.
pub fn read_grid(path: &Path) -> Result<Grid> {
    let format = StatementFormat::from_path(path)
        .ok_or_else(|| SpendError::UnsupportedFormat(path.to_path_buf()))?;

    let grid = match format {
        StatementFormat::Delimited => read_delimited(path)?,
        StatementFormat::Workbook => read_workbook(path)?,
    };

    debug!("Decoded {} rows from {}", grid.len(), path.display());
    Ok(grid)
}

// ── Delimited text ────────────────────────────────────────────────────────────

fn read_delimited(path: &Path) -> Result<Grid> {
    let bytes = std::fs::read(path).map_err(|source| SpendError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = String::from_utf8_lossy(&bytes);
    let content: &str = &decoded;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    parse_delimited(content, sniff_delimiter(content)).map_err(|e| SpendError::Spreadsheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Guess the field delimiter from the first lines of `content`.
///
/// Each candidate scores `lines agreeing with line 1's field count × field
/// count`; a candidate must split line 1 into more than one field. Falls
/// back to `,`.
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in CANDIDATES {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = match counts.first() {
            Some(&n) if n > 1 => n,
            _ => continue,
        };
        let score = counts.iter().filter(|&&c| c == target).count() * target;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn parse_delimited(content: &str, delimiter: u8) -> std::result::Result<Grid, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Grid::new();
    for record in reader.records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

// ── Workbooks ─────────────────────────────────────────────────────────────────

fn read_workbook(path: &Path) -> Result<Grid> {
    let spreadsheet_err = |message: String| SpendError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| spreadsheet_err("workbook contains no sheets".to_string()))?;

    if sheet_names.len() > 1 {
        debug!(
            "Reading sheet '{}' of {} in {}",
            first,
            sheet_names.len(),
            path.display()
        );
    }

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| spreadsheet_err(format!("failed to read sheet '{}': {}", first, e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect())
}

/// Map a calamine cell onto [`CellValue`].
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match workbook_date(dt) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Days between the 1900-system epoch and 1904-01-01.
const EPOCH_1904_OFFSET_DAYS: f64 = 1462.0;

/// Calendar day of a date-formatted cell, honouring the workbook's 1900 or
/// 1904 epoch. Duration cells have no calendar day.
fn workbook_date(dt: &ExcelDateTime) -> Option<NaiveDate> {
    if !dt.is_datetime() {
        return None;
    }
    let serial = dt.as_f64();
    let is_1904 = *dt == ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, true);
    if is_1904 {
        serial_to_date(serial + EPOCH_1904_OFFSET_DAYS)
    } else {
        serial_to_date(serial)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    // ── StatementFormat ───────────────────────────────────────────────────────

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            StatementFormat::from_path(Path::new("a/b.CSV")),
            Some(StatementFormat::Delimited)
        );
        assert_eq!(
            StatementFormat::from_path(Path::new("jan.xlsx")),
            Some(StatementFormat::Workbook)
        );
        assert_eq!(
            StatementFormat::from_path(Path::new("jan.ods")),
            Some(StatementFormat::Workbook)
        );
        assert_eq!(StatementFormat::from_path(Path::new("notes.pdf")), None);
        assert_eq!(StatementFormat::from_path(Path::new("README")), None);
    }

    // ── find_statement_files ──────────────────────────────────────────────────

    #[test]
    fn test_find_statement_files_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.csv"), "Date,Amount\n").unwrap();
        fs::write(nested.join("a.xlsx"), b"").unwrap();
        fs::write(dir.path().join("ignore.pdf"), b"").unwrap();

        let files = find_statement_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2024/a.xlsx"));
        assert!(files[1].ends_with("b.csv"));
    }

    #[test]
    fn test_find_statement_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(find_statement_files(&dir.path().join("nope")).is_empty());
    }

    // ── sniff_delimiter ───────────────────────────────────────────────────────

    #[test]
    fn test_sniff_comma() {
        assert_eq!(sniff_delimiter("Date,Amount\n2024-01-05,10\n"), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_decimal_commas() {
        let content = "Date;Amount;Description\n2024-01-05;10,50;Coffee\n2024-01-06;3,20;Bus\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_tab_and_pipe() {
        assert_eq!(sniff_delimiter("Date\tAmount\n2024-01-05\t10\n"), b'\t');
        assert_eq!(sniff_delimiter("Date|Amount\n2024-01-05|10\n"), b'|');
    }

    #[test]
    fn test_sniff_single_column_defaults_to_comma() {
        assert_eq!(sniff_delimiter("Date\n2024-01-05\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    // ── read_grid: delimited ──────────────────────────────────────────────────

    #[test]
    fn test_read_csv_keeps_cells_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stmt.csv");
        fs::write(
            &path,
            "\u{feff}Date,Amount,Description\n2024-01-05,\"1,000.50\",Rent\n2024-01-06,-4,\n",
        )
        .unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec![text("Date"), text("Amount"), text("Description")]);
        assert_eq!(grid[1], vec![text("2024-01-05"), text("1,000.50"), text("Rent")]);
        assert_eq!(grid[2], vec![text("2024-01-06"), text("-4"), CellValue::Empty]);
    }

    #[test]
    fn test_read_csv_flexible_row_lengths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "Date,Amount,Category\n2024-01-05,10\n").unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid[1].len(), 2);
    }

    #[test]
    fn test_read_tsv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stmt.tsv");
        fs::write(&path, "Date\tValue\n2024-02-01\t-7.5\n").unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid[1], vec![text("2024-02-01"), text("-7.5")]);
    }

    #[test]
    fn test_read_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stmt.pdf");
        fs::write(&path, "whatever").unwrap();
        assert!(matches!(
            read_grid(&path),
            Err(SpendError::UnsupportedFormat(p)) if p == path
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_grid(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(SpendError::FileRead { .. })));
    }

    // ── read_grid: workbooks ──────────────────────────────────────────────────

    #[test]
    fn test_read_xlsx_first_sheet() {
        use rust_xlsxwriter::{Format, Workbook};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stmt.xlsx");

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Date").unwrap();
        sheet.write_string(0, 1, "Amount").unwrap();
        sheet.write_string(0, 2, "Category").unwrap();
        sheet
            .write_number_with_format(1, 0, 45292.0, &date_format)
            .unwrap();
        sheet.write_number(1, 1, -40.0).unwrap();
        sheet.write_string(1, 2, "Food").unwrap();
        sheet.write_number(2, 0, 45323.0).unwrap();
        sheet.write_number(2, 1, 100.0).unwrap();

        let second = workbook.add_worksheet();
        second.write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][0], text("Date"));
        assert_eq!(
            grid[1][0],
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(grid[1][1], CellValue::Number(-40.0));
        assert_eq!(grid[1][2], text("Food"));
        // Unformatted serials stay numeric; the normalizer converts them.
        assert_eq!(grid[2][0], CellValue::Number(45323.0));
        assert_eq!(grid[2][2], CellValue::Empty);
    }

    #[test]
    fn test_read_corrupt_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            read_grid(&path),
            Err(SpendError::Spreadsheet { .. })
        ));
    }

    // ── convert_cell ──────────────────────────────────────────────────────────

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(convert_cell(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(convert_cell(&Data::Bool(false)), CellValue::Bool(false));
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-05T10:00:00".to_string())),
            text("2024-01-05T10:00:00")
        );
    }

    #[test]
    fn test_convert_cell_date_epochs() {
        let cell = |serial: f64, is_1904: bool| {
            convert_cell(&Data::DateTime(ExcelDateTime::new(
                serial,
                ExcelDateTimeType::DateTime,
                is_1904,
            )))
        };
        assert_eq!(
            cell(43830.0, false),
            CellValue::Date(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap())
        );
        // Mac workbooks count from 1904-01-01.
        assert_eq!(
            cell(43830.0, true),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            cell(0.0, true),
            CellValue::Date(NaiveDate::from_ymd_opt(1904, 1, 1).unwrap())
        );
        assert_eq!(
            cell(45292.75, false),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_convert_cell_unusable_dates_stay_numeric() {
        let huge = Data::DateTime(ExcelDateTime::new(1e300, ExcelDateTimeType::DateTime, false));
        assert_eq!(convert_cell(&huge), CellValue::Number(1e300));

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(convert_cell(&duration), CellValue::Number(1.5));
    }
}
