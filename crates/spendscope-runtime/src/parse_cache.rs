//! Parse-result cache keyed by file fingerprint.
//!
//! Re-importing a statement that has not changed on disk returns the
//! transactions produced the first time, including their ids. The cache is
//! an injected capability: the importer owns whichever implementation it is
//! given, and nothing is process-global.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use spendscope_core::models::Transaction;
use spendscope_core::{Result, SpendError};

// ── FileFingerprint ───────────────────────────────────────────────────────────

/// Identity of a file's contents as far as the cache is concerned: its name,
/// size and modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileFingerprint {
    pub name: String,
    pub size: u64,
    /// `None` on platforms that do not report modification times.
    pub modified: Option<SystemTime>,
}

impl FileFingerprint {
    /// Fingerprint the file at `path` from its metadata.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path).map_err(|source| SpendError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ── ParseCache ────────────────────────────────────────────────────────────────

/// Storage for parsed transactions, keyed by [`FileFingerprint`].
pub trait ParseCache {
    /// Cached transactions for `key`, if present and still fresh.
    fn get(&self, key: &FileFingerprint) -> Option<Vec<Transaction>>;

    fn insert(&mut self, key: FileFingerprint, transactions: Vec<Transaction>);

    /// Drop one entry. Returns `true` when something was removed.
    fn invalidate(&mut self, key: &FileFingerprint) -> bool;

    fn clear(&mut self);
}

// ── MemoryParseCache ──────────────────────────────────────────────────────────

struct CacheEntry {
    transactions: Vec<Transaction>,
    stored_at: Instant,
}

/// In-memory cache with an optional time-to-live.
#[derive(Default)]
pub struct MemoryParseCache {
    entries: HashMap<FileFingerprint, CacheEntry>,
    ttl: Option<Duration>,
}

impl MemoryParseCache {
    /// Cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire `ttl` after insertion.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() < ttl,
            None => true,
        }
    }
}

impl ParseCache for MemoryParseCache {
    fn get(&self, key: &FileFingerprint) -> Option<Vec<Transaction>> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.transactions.clone())
    }

    fn insert(&mut self, key: FileFingerprint, transactions: Vec<Transaction>) {
        self.entries.insert(
            key,
            CacheEntry {
                transactions,
                stored_at: Instant::now(),
            },
        );
    }

    fn invalidate(&mut self, key: &FileFingerprint) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── NoParseCache ──────────────────────────────────────────────────────────────

/// A cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoParseCache;

impl ParseCache for NoParseCache {
    fn get(&self, _key: &FileFingerprint) -> Option<Vec<Transaction>> {
        None
    }

    fn insert(&mut self, _key: FileFingerprint, _transactions: Vec<Transaction>) {}

    fn invalidate(&mut self, _key: &FileFingerprint) -> bool {
        false
    }

    fn clear(&mut self) {}
}

// ── Tests ─────────────────────────────────────────────────────────────────────
