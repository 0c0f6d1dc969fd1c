use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use dashboard_core::error::DashboardError;
use dashboard_core::models::FilterCriteria;
use dashboard_core::settings::ViewKind;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map an upper-case level name (`WARNING`, `CRITICAL`, ...) to a `tracing`
/// filter directive.
///
/// Unrecognised names pass through lowercased so that full `EnvFilter`
/// directives (e.g. `"dashboard_data=debug"`) still work.
pub fn normalise_level(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive,
/// falling back to `"info"` if it does not parse. With `log_file`, output is
/// appended to that file without ANSI colours. Otherwise it goes to stderr
/// when `console` is set and is discarded when it is not, since stderr
/// shares the terminal with the full-screen dashboard.
pub fn setup_logging(
    log_level: &str,
    log_file: Option<&Path>,
    console: bool,
) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(normalise_level(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    let stderr_layer = (console && file_layer.is_none()).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

/// Console logging is only safe when nothing else owns the terminal.
pub fn logs_to_console(view: ViewKind) -> bool {
    view == ViewKind::Report
}

/// Whether a load failure should be shown on the blocking error screen
/// before exiting.
pub fn shows_error_screen(error: &DashboardError, view: ViewKind) -> bool {
    view == ViewKind::Dashboard && error.is_blocking()
}

// ── Selection bootstrap ────────────────────────────────────────────────────────

/// Initial selection from the `--year` / `--month` flags.
///
/// A requested year missing from `years` falls back to the first available
/// year with a warning. Returns `None` when there are no dated rows.
pub fn initial_criteria(
    years: &[i32],
    requested_year: Option<i32>,
    month: u32,
) -> Option<FilterCriteria> {
    let first = *years.first()?;
    let year = match requested_year {
        Some(y) if years.contains(&y) => y,
        Some(y) => {
            tracing::warn!(
                requested = y,
                fallback = first,
                "requested year not present in data; using first available year"
            );
            first
        }
        None => first,
    };
    FilterCriteria::new(year, month).ok()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
