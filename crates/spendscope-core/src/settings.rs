use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Account selector value meaning "do not filter".
pub const ALL_ACCOUNTS: &str = "All Accounts";

/// The account named by an account selector value, or `None` when the value
/// is blank or [`ALL_ACCOUNTS`].
pub fn selected_account(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == ALL_ACCOUNTS {
        None
    } else {
        Some(trimmed)
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Import bank and card exports and summarize income, spending and savings
#[derive(Parser, Debug, Clone)]
#[command(
    name = "spendscope",
    about = "Import bank and card exports and summarize income, spending and savings",
    version
)]
pub struct Settings {
    /// Spreadsheet / CSV files or directories to import
    pub inputs: Vec<PathBuf>,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "transactions", "monthly", "categories", "ai-prompt"])]
    pub view: String,

    /// Only analyse transactions from this account
    #[arg(long, default_value = ALL_ACCOUNTS)]
    pub account: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.spendscope/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".spendscope").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent directories
    /// if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the default config file if it exists.
    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation with an explicit argument list and config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Raw ArgMatches are needed to query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_overrides(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "account") {
            if let Some(v) = last.account {
                settings.account = v;
            }
        }

        settings = Self::apply_overrides(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used settings");
        }

        settings
    }

    /// `--debug` forces the DEBUG log level.
    fn apply_overrides(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The account filter value, or `None` for all accounts.
    pub fn account_filter(&self) -> Option<&str> {
        selected_account(&self.account)
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            view: Some(s.view.clone()),
            format: Some(s.format.clone()),
            account: Some(s.account.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
