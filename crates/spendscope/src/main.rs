mod bootstrap;
mod report;

use std::path::PathBuf;

use anyhow::{bail, Result};
use spendscope_core::settings::{Settings, ALL_ACCOUNTS};
use spendscope_core::SpendError;
use spendscope_data::aggregator::TransactionAggregator;
use spendscope_runtime::dashboard::{build_dashboard, AccountFilter};
use spendscope_runtime::importer::Importer;
use spendscope_runtime::parse_cache::MemoryParseCache;

use crate::report::{ReportContext, View};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("spendscope v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Format: {}, Account: {}",
        settings.view,
        settings.format,
        settings.account_filter().unwrap_or(ALL_ACCOUNTS)
    );

    if settings.inputs.is_empty() {
        if settings.clear {
            return Ok(());
        }
        bail!("No input files given; pass one or more statement files or directories");
    }

    let view = View::parse(&settings.view)?;

    let mut importer = Importer::new(MemoryParseCache::new());
    let transactions = importer.import_paths(&settings.inputs)?;
    if transactions.is_empty() {
        return Err(SpendError::NoTransactions(describe_inputs(&settings.inputs)).into());
    }

    let accounts = TransactionAggregator::account_names(&transactions);
    let filter = AccountFilter::from(&settings);
    let analysis = build_dashboard(&transactions, &filter);

    let ctx = ReportContext {
        analysis: &analysis,
        account_label: settings.account_filter().unwrap_or(ALL_ACCOUNTS),
        accounts: &accounts,
    };
    println!("{}", report::render(view, &ctx, settings.wants_json())?);

    Ok(())
}

/// The single input path, or the inputs joined for the error message.
fn describe_inputs(inputs: &[PathBuf]) -> PathBuf {
    match inputs {
        [single] => single.clone(),
        many => PathBuf::from(
            many.iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}
