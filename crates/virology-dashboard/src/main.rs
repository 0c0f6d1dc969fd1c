mod bootstrap;

use anyhow::{Context, Result};
use dashboard_core::models::CONTACT_INFO;
use dashboard_core::settings::{Settings, ViewKind};
use dashboard_data::analysis::report_to_json;
use dashboard_data::filter::available_years;
use dashboard_runtime::session::DashboardSession;
use dashboard_runtime::upload::read_table;
use dashboard_ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    let view = settings.view_kind()?;

    bootstrap::setup_logging(
        &settings.log_level,
        settings.log_file.as_deref(),
        bootstrap::logs_to_console(view),
    )?;

    tracing::info!("Virology Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "File: {}, View: {}, Theme: {}",
        settings.file.display(),
        settings.view,
        settings.theme
    );

    let table = match read_table(&settings.file).await {
        Ok(table) => table,
        Err(e) if bootstrap::shows_error_screen(&e, view) => {
            tracing::error!(error = %e, "upload rejected");
            App::run_error_screen(&settings.theme, &e.to_string()).await?;
            return Err(e).with_context(|| format!("failed to load {}", settings.file.display()));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load {}", settings.file.display()));
        }
    };

    let criteria =
        bootstrap::initial_criteria(&available_years(&table), settings.year, settings.month);
    if criteria.is_none() {
        tracing::warn!("no rows carry a valid Collection Date; nothing to filter");
    }
    let session = DashboardSession::with_criteria(table, &settings.file, criteria);

    match view {
        ViewKind::Report => {
            tracing::info!("Writing JSON report...");
            match session.report() {
                Some(report) => println!("{}", report_to_json(report)?),
                None => {
                    let empty = serde_json::json!({
                        "criteria": null,
                        "source": session.table().summary(),
                        "contact": CONTACT_INFO,
                    });
                    println!("{}", serde_json::to_string_pretty(&empty)?);
                }
            }
        }

        ViewKind::Dashboard => {
            tracing::info!("Starting interactive dashboard...");
            let app = App::new(&settings.theme, session);

            // The TUI handles 'q' / Ctrl+C itself; the OS-level listener covers
            // signals delivered outside raw mode.
            tokio::select! {
                result = app.run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; shutting down");
                }
            }
        }
    }

    Ok(())
}
