//! Runtime layer for spendscope.
//!
//! Drives imports through an injected parse cache and prepares the
//! account-filtered dashboard.

pub mod dashboard;
pub mod importer;
pub mod parse_cache;

pub use spendscope_core as core;
pub use spendscope_data as data;
