//! Request and response handling for the AI summarization service.
//!
//! The service itself is reached through a [`SummaryProvider`]; this module
//! only builds prompts, declares the expected response shape and validates
//! what comes back.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{json, Value};
use spendscope_core::models::{AiSummary, CategorySuggestion, SummaryTransaction, Transaction};
use spendscope_core::{Result, SpendError};
use tracing::{debug, warn};

/// Most transactions ever sent in one summary request.
pub const SUMMARY_TRANSACTION_LIMIT: usize = 200;

pub const SUMMARY_MODEL: &str = "gemini-2.5-flash";
pub const SUMMARY_TEMPERATURE: f32 = 0.5;

// ── Projection ────────────────────────────────────────────────────────────────

/// Reduce `transactions` to the payload shape, most recent first, capped at
/// [`SUMMARY_TRANSACTION_LIMIT`]. Same-day transactions keep input order.
pub fn project_for_summary(transactions: &[Transaction]) -> Vec<SummaryTransaction> {
    let mut recent: Vec<&Transaction> = transactions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    recent
        .into_iter()
        .take(SUMMARY_TRANSACTION_LIMIT)
        .map(|t| SummaryTransaction {
            date: t.date.format("%Y-%m-%d").to_string(),
            amount: t.amount.to_f64().unwrap_or(0.0),
            category: t.category.clone(),
            description: t.description.clone(),
            account: t.account.clone(),
        })
        .collect()
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One call to the summarization service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub model: String,
    pub temperature: f32,
    pub prompt: String,
    /// JSON schema the response must conform to.
    pub response_schema: Value,
}

impl SummaryRequest {
    /// Financial summary request over the most recent transactions.
    pub fn for_transactions(transactions: &[Transaction]) -> Self {
        let payload = project_for_summary(transactions);
        let prompt = format!(
            "Analyze the following financial transactions from one or more accounts.\n\
             A positive amount indicates income, and a negative amount indicates an expense.\n\
             Provide a concise and helpful financial summary. \
             Consider trends across different accounts if applicable.\n\n\
             Transactions:\n{}\n",
            to_json(&payload)
        );
        Self::new(prompt, summary_response_schema())
    }

    /// Category suggestion request for every uncategorized transaction.
    pub fn for_category_suggestions(transactions: &[Transaction], category_names: &[String]) -> Self {
        Self::new(
            build_category_prompt(transactions, category_names),
            category_response_schema(),
        )
    }

    fn new(prompt: String, response_schema: Value) -> Self {
        Self {
            model: SUMMARY_MODEL.to_string(),
            temperature: SUMMARY_TEMPERATURE,
            prompt,
            response_schema,
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    // Plain data structs always serialize.
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Response schema for [`AiSummary`].
pub fn summary_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallSummary": {
                "type": "STRING",
                "description": "A brief, one-sentence overview of the user's financial health based on the data."
            },
            "incomeAnalysis": {
                "type": "STRING",
                "description": "A short paragraph analyzing income sources and trends."
            },
            "expenseAnalysis": {
                "type": "STRING",
                "description": "A short paragraph analyzing spending habits, highlighting top categories, and identifying potential areas to save."
            },
            "actionableInsights": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of 3-5 concrete, actionable suggestions for financial improvement."
            }
        },
        "required": ["overallSummary", "incomeAnalysis", "expenseAnalysis", "actionableInsights"]
    })
}

/// Response schema for a list of [`CategorySuggestion`]s.
pub fn category_response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "categoryName": { "type": "STRING" }
            },
            "required": ["id", "categoryName"]
        }
    })
}

// ── Responses ─────────────────────────────────────────────────────────────────

fn non_blank(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(SpendError::EmptyAiResponse)
    } else {
        Ok(trimmed)
    }
}

/// Parse the service's answer to a summary request.
pub fn parse_summary_response(text: &str) -> Result<AiSummary> {
    Ok(serde_json::from_str(non_blank(text)?)?)
}

// ── Provider seam ─────────────────────────────────────────────────────────────

/// Anything that can answer a [`SummaryRequest`] with the raw response text.
pub trait SummaryProvider {
    fn generate(&self, request: &SummaryRequest) -> Result<String>;
}

/// Ask `provider` for a financial summary of `transactions`.
pub fn request_summary<P: SummaryProvider + ?Sized>(
    provider: &P,
    transactions: &[Transaction],
) -> Result<AiSummary> {
    let request = SummaryRequest::for_transactions(transactions);
    debug!(
        model = %request.model,
        prompt_len = request.prompt.len(),
        "requesting financial summary"
    );

    let result = provider
        .generate(&request)
        .and_then(|text| parse_summary_response(&text));
    if let Err(e) = &result {
        warn!("Failed to generate financial summary: {}", e);
    }
    result
}

/// Ask `provider` to categorize every transaction that has no category.
///
/// Returns no suggestions, without calling the provider, when nothing needs
/// a category or no categories are available.
pub fn request_category_suggestions<P: SummaryProvider + ?Sized>(
    provider: &P,
    transactions: &[Transaction],
    category_names: &[String],
) -> Result<Vec<CategorySuggestion>> {
    if category_names.is_empty() || transactions.iter().all(|t| t.category.is_some()) {
        return Ok(Vec::new());
    }
    let request = SummaryRequest::for_category_suggestions(transactions, category_names);
    let text = provider.generate(&request)?;
    parse_category_suggestions(&text, category_names)
}

// ── Category suggestions ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct UncategorizedTransaction<'a> {
    id: &'a str,
    description: &'a str,
}

/// Prompt asking for one category per uncategorized transaction, chosen from
/// `category_names`.
pub fn build_category_prompt(transactions: &[Transaction], category_names: &[String]) -> String {
    let pending: Vec<UncategorizedTransaction<'_>> = transactions
        .iter()
        .filter(|t| t.category.is_none())
        .map(|t| UncategorizedTransaction {
            id: &t.id,
            description: &t.description,
        })
        .collect();

    format!(
        "You are an expert financial assistant. Your task is to categorize financial transactions.\n\
         Based on the transaction description, assign the most appropriate category from the following list.\n\
         Do not use any category that is not in this list.\n\n\
         Available Categories:\n{}\n\n\
         Here are the transactions to categorize. Each has a unique 'id' and a 'description'.\n\
         For each transaction, return the original 'id' and the chosen 'categoryName'.\n\n\
         Transactions:\n{}\n",
        category_names.join(", "),
        to_json(&pending)
    )
}

/// Parse suggested categories, keeping only names from `allowed`.
///
/// Names match case-insensitively and come back in the allowed spelling.
pub fn parse_category_suggestions(text: &str, allowed: &[String]) -> Result<Vec<CategorySuggestion>> {
    let raw: Vec<CategorySuggestion> = serde_json::from_str(non_blank(text)?)?;

    let canonical: HashMap<String, &String> = allowed
        .iter()
        .map(|name| (name.trim().to_lowercase(), name))
        .collect();

    let total = raw.len();
    let kept: Vec<CategorySuggestion> = raw
        .into_iter()
        .filter_map(|s| {
            canonical
                .get(&s.category_name.trim().to_lowercase())
                .map(|name| CategorySuggestion {
                    id: s.id,
                    category_name: (*name).clone(),
                })
        })
        .collect();

    if kept.len() < total {
        warn!(
            "Discarded {} category suggestions outside the allowed list",
            total - kept.len()
        );
    }
    Ok(kept)
}

/// Fill in the category of uncategorized transactions from `suggestions`.
///
/// Existing categories are never overwritten. Returns how many transactions
/// changed.
pub fn apply_category_suggestions(
    transactions: &mut [Transaction],
    suggestions: &[CategorySuggestion],
) -> usize {
    let by_id: HashMap<&str, &str> = suggestions
        .iter()
        .map(|s| (s.id.as_str(), s.category_name.as_str()))
        .collect();

    let mut applied = 0;
    for txn in transactions.iter_mut().filter(|t| t.category.is_none()) {
        if let Some(name) = by_id.get(txn.id.as_str()) {
            txn.category = Some((*name).to_string());
            applied += 1;
        }
    }
    applied
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use rust_decimal::Decimal;
    use std::cell::RefCell;
    use std::str::FromStr;

    fn make_txn(id: &str, date: NaiveDate, amount: &str, category: Option<&str>) -> Transaction {
        Transaction {
            id: id.to_string(),
            date,
            description: format!("desc {}", id),
            amount: Decimal::from_str(amount).unwrap(),
            category: category.map(str::to_string),
            account: None,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Provider that records requests and replays a canned answer.
    struct CannedProvider {
        answer: Result<String>,
        seen: RefCell<Vec<SummaryRequest>>,
    }

    impl CannedProvider {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl SummaryProvider for CannedProvider {
        fn generate(&self, request: &SummaryRequest) -> Result<String> {
            self.seen.borrow_mut().push(request.clone());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(SpendError::Config("provider unavailable".to_string())),
            }
        }
    }

    const SUMMARY_JSON: &str = r#"{
        "overallSummary": "Spending exceeds income.",
        "incomeAnalysis": "One salary payment.",
        "expenseAnalysis": "Rent dominates.",
        "actionableInsights": ["Cut dining", "Automate savings"]
    }"#;

    // ── project_for_summary ───────────────────────────────────────────────────

    #[test]
    fn test_projection_caps_at_limit_by_recency() {
        let start = ymd(2024, 1, 1);
        let txns: Vec<Transaction> = (0..250)
            .map(|i| make_txn(&i.to_string(), start + Duration::days(i), "-1", None))
            .collect();

        let projected = project_for_summary(&txns);
        assert_eq!(projected.len(), SUMMARY_TRANSACTION_LIMIT);
        assert_eq!(projected[0].date, (start + Duration::days(249)).format("%Y-%m-%d").to_string());
        assert_eq!(projected[199].date, (start + Duration::days(50)).format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_projection_same_day_keeps_input_order() {
        let d = ymd(2024, 3, 1);
        let txns = vec![
            make_txn("a", d, "1", None),
            make_txn("b", ymd(2024, 2, 1), "2", None),
            make_txn("c", d, "3", None),
        ];
        let projected = project_for_summary(&txns);
        let descs: Vec<&str> = projected.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(descs, vec!["desc a", "desc c", "desc b"]);
    }

    #[test]
    fn test_projection_shape() {
        let txns = vec![make_txn("x", ymd(2024, 1, 10), "-40.25", Some("Food"))];
        let projected = project_for_summary(&txns);
        assert_eq!(projected[0].date, "2024-01-10");
        assert!((projected[0].amount + 40.25).abs() < 1e-9);
        assert_eq!(projected[0].category.as_deref(), Some("Food"));

        let json = serde_json::to_value(&projected[0]).unwrap();
        assert!(json.get("account").is_none());
        assert!(json.get("id").is_none());
    }

    // ── SummaryRequest ────────────────────────────────────────────────────────

    #[test]
    fn test_summary_request_parameters() {
        let txns = vec![make_txn("x", ymd(2024, 1, 10), "100", None)];
        let req = SummaryRequest::for_transactions(&txns);
        assert_eq!(req.model, "gemini-2.5-flash");
        assert!((req.temperature - 0.5).abs() < f32::EPSILON);
        assert!(req.prompt.contains("A positive amount indicates income"));
        assert!(req.prompt.contains("\"date\":\"2024-01-10\""));
        assert_eq!(req.response_schema["required"].as_array().unwrap().len(), 4);
    }

    // ── parse_summary_response ────────────────────────────────────────────────

    #[test]
    fn test_parse_summary_response() {
        let summary = parse_summary_response(SUMMARY_JSON).unwrap();
        assert_eq!(summary.overall_summary, "Spending exceeds income.");
        assert_eq!(summary.actionable_insights.len(), 2);
    }

    #[test]
    fn test_parse_summary_empty_response() {
        assert!(matches!(
            parse_summary_response("   \n"),
            Err(SpendError::EmptyAiResponse)
        ));
    }

    #[test]
    fn test_parse_summary_missing_field() {
        let result = parse_summary_response(r#"{"overallSummary": "x"}"#);
        assert!(matches!(result, Err(SpendError::JsonParse(_))));
    }

    // ── request_summary ───────────────────────────────────────────────────────

    #[test]
    fn test_request_summary_round_trip() {
        let provider = CannedProvider::answering(SUMMARY_JSON);
        let txns = vec![make_txn("x", ymd(2024, 1, 10), "100", None)];
        let summary = request_summary(&provider, &txns).unwrap();
        assert_eq!(summary.income_analysis, "One salary payment.");
        assert_eq!(provider.seen.borrow().len(), 1);
    }

    #[test]
    fn test_request_summary_propagates_provider_error() {
        let provider = CannedProvider {
            answer: Err(SpendError::EmptyAiResponse),
            seen: RefCell::new(Vec::new()),
        };
        assert!(request_summary(&provider, &[]).is_err());
    }

    // ── category suggestions ──────────────────────────────────────────────────

    #[test]
    fn test_category_prompt_lists_only_uncategorized() {
        let txns = vec![
            make_txn("t1", ymd(2024, 1, 1), "-5", None),
            make_txn("t2", ymd(2024, 1, 2), "-6", Some("Food")),
        ];
        let prompt = build_category_prompt(&txns, &names(&["Food", "Transport"]));
        assert!(prompt.contains("Food, Transport"));
        assert!(prompt.contains(r#"{"id":"t1","description":"desc t1"}"#));
        assert!(!prompt.contains("\"t2\""));
    }

    #[test]
    fn test_parse_category_suggestions_filters_and_canonicalizes() {
        let text = r#"[
            {"id": "t1", "categoryName": "food"},
            {"id": "t2", "categoryName": "Groceries"},
            {"id": "t3", "categoryName": " Transport "}
        ]"#;
        let parsed = parse_category_suggestions(text, &names(&["Food", "Transport"])).unwrap();
        assert_eq!(
            parsed,
            vec![
                CategorySuggestion {
                    id: "t1".to_string(),
                    category_name: "Food".to_string()
                },
                CategorySuggestion {
                    id: "t3".to_string(),
                    category_name: "Transport".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_category_suggestions_empty() {
        assert!(matches!(
            parse_category_suggestions("", &names(&["Food"])),
            Err(SpendError::EmptyAiResponse)
        ));
    }

    #[test]
    fn test_apply_category_suggestions_never_overwrites() {
        let mut txns = vec![
            make_txn("t1", ymd(2024, 1, 1), "-5", None),
            make_txn("t2", ymd(2024, 1, 2), "-6", Some("Food")),
            make_txn("t3", ymd(2024, 1, 3), "-7", None),
        ];
        let suggestions = vec![
            CategorySuggestion {
                id: "t1".to_string(),
                category_name: "Transport".to_string(),
            },
            CategorySuggestion {
                id: "t2".to_string(),
                category_name: "Transport".to_string(),
            },
            CategorySuggestion {
                id: "missing".to_string(),
                category_name: "Food".to_string(),
            },
        ];

        assert_eq!(apply_category_suggestions(&mut txns, &suggestions), 1);
        assert_eq!(txns[0].category.as_deref(), Some("Transport"));
        assert_eq!(txns[1].category.as_deref(), Some("Food"));
        assert_eq!(txns[2].category, None);
    }

    #[test]
    fn test_request_category_suggestions_skips_provider_when_nothing_to_do() {
        let provider = CannedProvider::answering("[]");
        let txns = vec![make_txn("t1", ymd(2024, 1, 1), "-5", Some("Food"))];
        let out = request_category_suggestions(&provider, &txns, &names(&["Food"])).unwrap();
        assert!(out.is_empty());
        assert!(provider.seen.borrow().is_empty());
    }

    #[test]
    fn test_request_category_suggestions_uses_category_schema() {
        let provider = CannedProvider::answering(r#"[{"id":"t1","categoryName":"Food"}]"#);
        let txns = vec![make_txn("t1", ymd(2024, 1, 1), "-5", None)];
        let out = request_category_suggestions(&provider, &txns, &names(&["Food"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(provider.seen.borrow()[0].response_schema["type"], "ARRAY");
    }
}
