use clap::Parser;
use std::path::PathBuf;

use crate::error::{DashboardError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Interactive virology results dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "virology-dashboard",
    about = "Interactive virology results dashboard",
    version
)]
pub struct Settings {
    /// CSV file of results data to upload
    pub file: PathBuf,

    /// Year to select initially (defaults to the earliest year in the data)
    #[arg(long)]
    pub year: Option<i32>,

    /// Month to select initially (1-12)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report"])]
    pub view: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// How the binary presents the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Interactive terminal dashboard.
    Dashboard,
    /// One-shot JSON report on stdout.
    Report,
}

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Typed view mode.
    pub fn view_kind(&self) -> Result<ViewKind> {
        match self.view.as_str() {
            "dashboard" => Ok(ViewKind::Dashboard),
            "report" => Ok(ViewKind::Report),
            other => Err(DashboardError::Config(format!("unknown view: {}", other))),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
