//! Aggregation engine: totals, monthly buckets and expense categories.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use spendscope_core::models::{CategorySummary, FinancialAnalysis, MonthlySummary, Transaction};
use spendscope_core::time_utils::{month_key, month_label};

// ── MonthTotals ───────────────────────────────────────────────────────────────

/// Income and expense magnitudes accumulated for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthTotals {
    pub income: Decimal,
    /// Always non-negative.
    pub expenses: Decimal,
}

impl MonthTotals {
    fn add(&mut self, txn: &Transaction) {
        if txn.is_income() {
            self.income += txn.amount;
        } else {
            self.expenses += txn.amount.abs();
        }
    }
}

// ── CategoryTotals ────────────────────────────────────────────────────────────

/// Expense totals per category, remembering the order categories first appear.
#[derive(Debug, Default)]
struct CategoryTotals {
    order: Vec<CategorySummary>,
    index: HashMap<String, usize>,
}

impl CategoryTotals {
    fn add(&mut self, name: &str, value: Decimal) {
        match self.index.get(name) {
            Some(&i) => self.order[i].value += value,
            None => {
                self.index.insert(name.to_string(), self.order.len());
                self.order.push(CategorySummary {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }

    /// Categories by descending value. `sort_by` is stable, so equal values
    /// keep first-seen order.
    fn into_sorted(self) -> Vec<CategorySummary> {
        let mut out = self.order;
        out.sort_by(|a, b| b.value.cmp(&a.value));
        out
    }
}

// ── TransactionAggregator ─────────────────────────────────────────────────────

/// Stateless helper that turns a transaction list into a [`FinancialAnalysis`].
pub struct TransactionAggregator;

impl TransactionAggregator {
    /// Aggregate `transactions` in a single pass.
    ///
    /// Positive amounts are income. Zero and negative amounts are expenses
    /// and feed the month's expense total and the category breakdown by
    /// absolute value. Months come out in chronological order, categories
    /// by descending spend.
    pub fn analyze(transactions: &[Transaction]) -> FinancialAnalysis {
        let mut total_income = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;
        let mut months: BTreeMap<String, MonthTotals> = BTreeMap::new();
        let mut categories = CategoryTotals::default();

        for txn in transactions {
            months.entry(month_key(txn.date)).or_default().add(txn);

            if txn.is_income() {
                total_income += txn.amount;
            } else {
                total_expenses += txn.amount;
                categories.add(txn.category_name(), txn.amount.abs());
            }
        }

        FinancialAnalysis {
            total_income,
            total_expenses,
            net_savings: total_income + total_expenses,
            monthly_summaries: Self::monthly_summaries(months),
            category_summaries: categories.into_sorted(),
            transactions: transactions.to_vec(),
        }
    }

    /// Distinct account names, sorted. Transactions without an account are
    /// ignored.
    pub fn account_names(transactions: &[Transaction]) -> Vec<String> {
        transactions
            .iter()
            .filter_map(|t| t.account.as_deref())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn monthly_summaries(months: BTreeMap<String, MonthTotals>) -> Vec<MonthlySummary> {
        months
            .into_iter()
            .map(|(key, totals)| MonthlySummary {
                // Keys always come from `month_key`, so the label resolves.
                month_label: month_label(&key).unwrap_or(key),
                income: totals.income,
                expenses: totals.expenses,
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
