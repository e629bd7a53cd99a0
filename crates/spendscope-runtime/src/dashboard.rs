//! Account filtering in front of the aggregation engine.

use spendscope_core::models::{FinancialAnalysis, Transaction};
use spendscope_core::settings::{selected_account, Settings};
use spendscope_data::aggregator::TransactionAggregator;
use tracing::debug;

/// Which transactions the dashboard covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountFilter {
    #[default]
    All,
    /// Only transactions whose account equals this name exactly.
    Named(String),
}

impl AccountFilter {
    /// Build a filter from the `--account` setting. The sentinel
    /// `"All Accounts"` and blank values select everything.
    pub fn from_setting(value: &str) -> Self {
        match selected_account(value) {
            Some(name) => AccountFilter::Named(name.to_string()),
            None => AccountFilter::All,
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Named(name) => txn.account.as_deref() == Some(name.as_str()),
        }
    }
}

impl From<&Settings> for AccountFilter {
    fn from(settings: &Settings) -> Self {
        AccountFilter::from_setting(&settings.account)
    }
}

/// Filter `transactions` by account, then aggregate what remains.
pub fn build_dashboard(transactions: &[Transaction], filter: &AccountFilter) -> FinancialAnalysis {
    let selected: Vec<Transaction> = match filter {
        AccountFilter::All => transactions.to_vec(),
        AccountFilter::Named(_) => transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect(),
    };

    debug!(
        ?filter,
        selected = selected.len(),
        total = transactions.len(),
        "building dashboard"
    );

    TransactionAggregator::analyze(&selected)
}
