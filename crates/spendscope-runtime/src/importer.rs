//! File import pipeline: fingerprint, cache lookup, decode, normalize.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use spendscope_core::models::Transaction;
use spendscope_core::Result;
use spendscope_data::normalizer;
use spendscope_data::reader::{find_statement_files, read_grid};
use tracing::{debug, info, warn};

use crate::parse_cache::{FileFingerprint, ParseCache};

/// Imports statement files through a [`ParseCache`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use spendscope_runtime::importer::Importer;
/// use spendscope_runtime::parse_cache::MemoryParseCache;
///
/// let mut importer = Importer::new(MemoryParseCache::new());
/// let txns = importer.import_file(Path::new("statement.csv"))?;
/// println!("{} transactions", txns.len());
/// # Ok::<(), spendscope_core::SpendError>(())
/// ```
pub struct Importer<C: ParseCache> {
    cache: C,
}

impl<C: ParseCache> Importer<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Import one file.
    ///
    /// An unchanged file (same fingerprint) is served from the cache. A
    /// header that cannot be mapped fails the whole file; bad data rows are
    /// dropped and only counted.
    pub fn import_file(&mut self, path: &Path) -> Result<Vec<Transaction>> {
        let fingerprint = FileFingerprint::from_path(path)?;

        if let Some(cached) = self.cache.get(&fingerprint) {
            debug!("Serving parsed data from cache for {}", path.display());
            return Ok(cached);
        }

        let grid = read_grid(path)?;
        let import = normalizer::normalize(&grid)?;

        if !import.skipped_rows.is_empty() {
            warn!(
                "Skipped {} of {} rows in {}",
                import.skipped_rows.len(),
                import.rows_seen(),
                path.display()
            );
        }
        info!(
            "Imported {} transactions from {}",
            import.transactions.len(),
            path.display()
        );

        self.cache.insert(fingerprint, import.transactions.clone());
        Ok(import.transactions)
    }

    /// Import every path in order. Directories expand to the statement files
    /// found beneath them.
    pub fn import_paths(&mut self, paths: &[PathBuf]) -> Result<Vec<Transaction>> {
        let mut all = Vec::new();
        for file in expand_paths(paths) {
            all.extend(self.import_file(&file)?);
        }
        debug!("Imported {} transactions in total", all.len());
        Ok(all)
    }
}

/// Replace each directory in `paths` with the statement files below it.
///
/// A file reached more than once, directly or through a directory, is kept
/// only at its first position.
pub fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .flat_map(|p| {
            if p.is_dir() {
                find_statement_files(p)
            } else {
                vec![p.clone()]
            }
        })
        .filter(|file| {
            let key = std::fs::canonicalize(file).unwrap_or_else(|_| file.clone());
            let fresh = seen.insert(key);
            if !fresh {
                debug!("Ignoring repeated input {}", file.display());
            }
            fresh
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
