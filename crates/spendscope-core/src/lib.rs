//! Shared domain types for spendscope.
//!
//! Holds the canonical transaction model, the error type, cell coercion
//! helpers, date conventions, formatting and the CLI settings layer. Nothing
//! in here performs file I/O except the persisted settings file.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, SchemaError, SpendError};
pub use models::{
    CanonicalField, CategorySummary, CellValue, FinancialAnalysis, Grid, MonthlySummary,
    Transaction,
};
