use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category name used for expenses that carry no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Description used when the source has no description column or a blank cell.
pub const DESCRIPTION_PLACEHOLDER: &str = "N/A";

// ── Spreadsheet cells ─────────────────────────────────────────────────────────

/// A single decoded cell from a spreadsheet or delimited-text file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A cell the source format already typed as a calendar date.
    Date(NaiveDate),
}

impl CellValue {
    /// Render the cell the way a spreadsheet shows it when coerced to text.
    ///
    /// Integral numbers drop their fraction (`5.0` → `"5"`), dates use
    /// `YYYY-MM-DD`, and empty cells become `""`.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// `true` for empty cells and text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

/// Rows of cells; row 0 is the header row.
pub type Grid = Vec<Vec<CellValue>>;

// ── Canonical fields ──────────────────────────────────────────────────────────

/// The columns of the canonical transaction schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Description,
    Amount,
    Category,
    Account,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Description => "description",
            CanonicalField::Amount => "amount",
            CanonicalField::Category => "category",
            CanonicalField::Account => "account",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A transaction that has passed normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque identifier assigned at import time.
    pub id: String,
    /// Calendar date, no time-of-day.
    pub date: NaiveDate,
    pub description: String,
    /// Positive is income, zero or negative is expense.
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl Transaction {
    /// `true` only for strictly positive amounts.
    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Category name, or [`UNCATEGORIZED`] when absent.
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

// ── Analysis output ───────────────────────────────────────────────────────────

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Display label such as `"Jan 24"`.
    #[serde(rename = "month")]
    pub month_label: String,
    pub income: Decimal,
    /// Absolute value of the month's expenses.
    pub expenses: Decimal,
}

/// Total spend for one expense category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub value: Decimal,
}

/// Result of running the aggregation engine over a transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAnalysis {
    pub total_income: Decimal,
    /// Sum of all non-positive amounts; never greater than zero.
    pub total_expenses: Decimal,
    pub net_savings: Decimal,
    pub monthly_summaries: Vec<MonthlySummary>,
    pub category_summaries: Vec<CategorySummary>,
    /// The input transactions, unchanged.
    pub transactions: Vec<Transaction>,
}

// ── AI summarization contract ─────────────────────────────────────────────────

/// Structured insights returned by the external summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub overall_summary: String,
    pub income_analysis: String,
    pub expense_analysis: String,
    pub actionable_insights: Vec<String>,
}

/// The reduced transaction shape handed to the summarization service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTransaction {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// A category proposed by the summarization service for one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySuggestion {
    pub id: String,
    pub category_name: String,
}
