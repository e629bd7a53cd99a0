//! Plain-text and JSON rendering of the analysis views.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use spendscope_core::formatting::{format_currency, percentage};
use spendscope_core::models::{FinancialAnalysis, Transaction};
use spendscope_data::insights::SummaryRequest;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Widest a free-text column may grow before it is truncated.
const MAX_TEXT_WIDTH: usize = 40;

// ── View ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Transactions,
    Monthly,
    Categories,
    /// The request that would be sent to the summarization service.
    AiPrompt,
}

impl View {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "dashboard" => View::Dashboard,
            "transactions" => View::Transactions,
            "monthly" => View::Monthly,
            "categories" => View::Categories,
            "ai-prompt" => View::AiPrompt,
            other => bail!("Unknown view mode: {}", other),
        })
    }
}

/// Everything a view may need.
pub struct ReportContext<'a> {
    pub analysis: &'a FinancialAnalysis,
    /// Label of the active account selection.
    pub account_label: &'a str,
    /// Every account present in the import, before filtering.
    pub accounts: &'a [String],
}

/// Render `view` as a text table or as pretty JSON.
pub fn render(view: View, ctx: &ReportContext<'_>, json: bool) -> Result<String> {
    let analysis = ctx.analysis;
    if json {
        let out = match view {
            View::Dashboard => serde_json::to_string_pretty(analysis)?,
            View::Transactions => serde_json::to_string_pretty(&analysis.transactions)?,
            View::Monthly => serde_json::to_string_pretty(&analysis.monthly_summaries)?,
            View::Categories => serde_json::to_string_pretty(&analysis.category_summaries)?,
            View::AiPrompt => serde_json::to_string_pretty(&SummaryRequest::for_transactions(
                &analysis.transactions,
            ))?,
        };
        return Ok(out);
    }

    Ok(match view {
        View::Dashboard => render_dashboard(ctx),
        View::Transactions => transactions_table(&analysis.transactions).render(),
        View::Monthly => monthly_table(analysis).render(),
        View::Categories => categories_table(analysis).render(),
        View::AiPrompt => SummaryRequest::for_transactions(&analysis.transactions).prompt,
    })
}

// ── Views ─────────────────────────────────────────────────────────────────────

fn render_dashboard(ctx: &ReportContext<'_>) -> String {
    let a = ctx.analysis;
    let mut summary = TextTable::new(&[("Metric", Align::Left), ("Value", Align::Right)]);
    summary.push(vec!["Total Income".into(), format_currency(a.total_income)]);
    summary.push(vec!["Total Expenses".into(), format_currency(a.total_expenses)]);
    summary.push(vec!["Net Savings".into(), format_currency(a.net_savings)]);
    summary.push(vec!["Transactions".into(), a.transactions.len().to_string()]);

    let mut out = format!("Account: {}\n", ctx.account_label);
    if !ctx.accounts.is_empty() {
        out.push_str(&format!("Available accounts: {}\n", ctx.accounts.join(", ")));
    }
    out.push('\n');
    out.push_str(&summary.render());
    out.push_str("\nMonthly\n");
    out.push_str(&monthly_table(a).render());
    out.push_str("\nSpending by category\n");
    out.push_str(&categories_table(a).render());
    out
}

fn transactions_table(transactions: &[Transaction]) -> TextTable {
    let mut table = TextTable::new(&[
        ("Date", Align::Left),
        ("Description", Align::Left),
        ("Category", Align::Left),
        ("Account", Align::Left),
        ("Amount", Align::Right),
    ]);

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    for t in sorted {
        table.push(vec![
            t.date.format("%Y-%m-%d").to_string(),
            t.description.clone(),
            t.category.clone().unwrap_or_default(),
            t.account.clone().unwrap_or_default(),
            format_currency(t.amount),
        ]);
    }
    table
}

fn monthly_table(analysis: &FinancialAnalysis) -> TextTable {
    let mut table = TextTable::new(&[
        ("Month", Align::Left),
        ("Income", Align::Right),
        ("Expenses", Align::Right),
        ("Net", Align::Right),
    ]);
    for m in &analysis.monthly_summaries {
        table.push(vec![
            m.month_label.clone(),
            format_currency(m.income),
            format_currency(m.expenses),
            format_currency(m.income - m.expenses),
        ]);
    }
    table
}

fn categories_table(analysis: &FinancialAnalysis) -> TextTable {
    let mut table = TextTable::new(&[
        ("Category", Align::Left),
        ("Spent", Align::Right),
        ("Share", Align::Right),
    ]);
    let total: Decimal = analysis.total_expenses.abs();
    for c in &analysis.category_summaries {
        table.push(vec![
            c.name.clone(),
            format_currency(c.value),
            format!("{:.1}%", percentage(c.value, total, 1)),
        ]);
    }
    table
}

// ── TextTable ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Column-aligned plain-text table measured in display columns.
struct TextTable {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(columns: &[(&str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| h.to_string()).collect(),
            aligns: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(
            row.into_iter()
                .map(|cell| truncate_display(&cell, MAX_TEXT_WIDTH))
                .collect(),
        );
    }

    fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headers.len())
            .map(|i| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .chain(std::iter::once(&self.headers[i]))
                    .map(|s| UnicodeWidthStr::width(s.as_str()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&self.render_row(&self.headers, &widths));
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(&self.render_row(row, &widths));
        }
        if self.rows.is_empty() {
            out.push_str("(no data)\n");
        }
        out
    }

    fn render_row(&self, cells: &[String], widths: &[usize]) -> String {
        let line = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = " ".repeat(w.saturating_sub(UnicodeWidthStr::width(cell)));
                match self.aligns[i] {
                    Align::Left => format!("{}{}", cell, pad),
                    Align::Right => format!("{}{}", pad, cell),
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    }
}

/// Truncate `s` to at most `width` display columns, marking the cut with "..".
fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    out.push_str("..");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use spendscope_core::models::{CategorySummary, MonthlySummary};

    fn sample() -> FinancialAnalysis {
        FinancialAnalysis {
            total_income: Decimal::from(100),
            total_expenses: Decimal::from(-1_000_040),
            net_savings: Decimal::from(-999_940),
            monthly_summaries: vec![MonthlySummary {
                month_label: "Jan 24".to_string(),
                income: Decimal::from(100),
                expenses: Decimal::from(40),
            }],
            category_summaries: vec![
                CategorySummary {
                    name: "Uncategorized".to_string(),
                    value: Decimal::from(1_000_000),
                },
                CategorySummary {
                    name: "Food".to_string(),
                    value: Decimal::from(40),
                },
            ],
            transactions: vec![Transaction {
                id: "t1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                description: "Groceries".to_string(),
                amount: Decimal::from(-40),
                category: Some("Food".to_string()),
                account: Some("Visa".to_string()),
            }],
        }
    }

    fn ctx(analysis: &FinancialAnalysis) -> ReportContext<'_> {
        ReportContext {
            analysis,
            account_label: "All Accounts",
            accounts: &[],
        }
    }

    #[test]
    fn test_view_parse() {
        assert_eq!(View::parse("ai-prompt").unwrap(), View::AiPrompt);
        assert!(View::parse("realtime").is_err());
    }

    #[test]
    fn test_dashboard_text() {
        let a = sample();
        let out = render(View::Dashboard, &ctx(&a), false).unwrap();
        assert!(out.starts_with("Account: All Accounts\n"));
        assert!(out.contains("$-1,000,040.00"));
        assert!(out.contains("$-999,940.00"));
        assert!(out.contains("Jan 24"));
        assert!(out.contains("Uncategorized"));
    }

    #[test]
    fn test_columns_right_aligned() {
        let out = monthly_table(&sample()).render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Month    Income  Expenses     Net");
        assert_eq!(lines[2], "Jan 24  $100.00    $40.00  $60.00");
    }

    #[test]
    fn test_category_share() {
        let out = categories_table(&sample()).render();
        assert!(out.contains("100.0%"));
        assert!(out.contains("0.0%"));
    }

    #[test]
    fn test_empty_table_placeholder() {
        let mut a = sample();
        a.monthly_summaries.clear();
        assert!(monthly_table(&a).render().ends_with("(no data)\n"));
    }

    #[test]
    fn test_json_views() {
        let a = sample();
        let dashboard: serde_json::Value =
            serde_json::from_str(&render(View::Dashboard, &ctx(&a), true).unwrap()).unwrap();
        assert!(dashboard.get("netSavings").is_some());

        let categories: serde_json::Value =
            serde_json::from_str(&render(View::Categories, &ctx(&a), true).unwrap()).unwrap();
        assert_eq!(categories[0]["name"], "Uncategorized");

        let prompt: serde_json::Value =
            serde_json::from_str(&render(View::AiPrompt, &ctx(&a), true).unwrap()).unwrap();
        assert_eq!(prompt["model"], "gemini-2.5-flash");
    }

    #[test]
    fn test_truncate_display() {
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("abcdefghij", 6), "abcd..");
        // Wide characters count as two columns.
        assert_eq!(truncate_display("日本語テキスト", 7), "日本..");
    }
}
