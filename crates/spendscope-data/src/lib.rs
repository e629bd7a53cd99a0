//! Data layer for spendscope.
//!
//! Decodes statement files into cell grids, normalizes grids into canonical
//! transactions, aggregates transactions into a financial analysis and
//! prepares the payloads exchanged with the AI summarization service.

pub mod aggregator;
pub mod insights;
pub mod normalizer;
pub mod reader;

pub use spendscope_core as core;
