//! Hemocast: post-transfusion hemoglobin predictor.
//!
//! Main entry point for the terminal application.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hemocast::adapters::sanitize::SanitizingMakeWriter;
use hemocast::application::AssessmentService;
use hemocast::tui::App;
use hemocast::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Logging to the terminal would corrupt the alternate screen, so interactive
    // runs log to a file unless told otherwise.
    let use_file = config.log_mode.use_file(std::io::stdout().is_terminal());

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(SanitizingMakeWriter::with_limit(
                    writer,
                    config.sanitize_max_bytes,
                )),
        )
        .init();

    tracing::info!("Starting Hemocast...");

    let service = AssessmentService::startup(&config);
    if !service.is_ready() {
        tracing::warn!("Prediction disabled: artifacts failed to load");
    }

    let mut app = App::new(service);
    app.run()?;

    tracing::info!("Hemocast shutdown complete.");
    Ok(())
}
