use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR_NAME: &str = ".spendscope";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// The `~/.spendscope/` directory (or `./.spendscope/` without a home).
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Ensure the standard `~/.spendscope/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.spendscope/`
/// - `~/.spendscope/logs/`
/// - `~/.spendscope/cache/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let app_dir = app_dir();
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("cache"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` value onto an [`EnvFilter`] directive.
///
/// Unknown values pass through unchanged so `RUST_LOG`-style directives
/// such as `"spendscope_data=debug"` still work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, or is appended to `log_file` when one is given.
/// Falls back to `"info"` if the level string is not a valid directive.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };
    let stderr_layer = file_layer.is_none().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
