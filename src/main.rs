//! CV Builder
//!
//! Reads edit commands from stdin, keeps the CV preview in sync with the
//! form state, and exports the preview to `my_cv.png` on `export`.
//!
//! See `cv_builder::event` for the command language and
//! `cv_builder::config::AppConfig` for environment variables.

use anyhow::Result;
use cv_builder::config::{self, AppConfig, LogFormat};
use cv_builder::converter::SvgToPngConverter;
use cv_builder::export::{DirectorySink, ExportOutcome, Exporter};
use cv_builder::form::FormStore;
use cv_builder::session::{Reply, Session};
use cv_builder::surface::SurfaceLayout;
use cv_builder::telemetry;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    if let Some(endpoint) = &config.otlp_endpoint {
        if let Err(e) = telemetry::init_telemetry(endpoint) {
            warn!("Failed to initialize telemetry: {}", e);
        }
    }

    info!(
        output_dir = %config.output_dir.display(),
        preview_width = config.preview_width,
        export_scale = config.export_scale,
        "Starting CV builder"
    );

    let store = match &config.form_path {
        Some(path) => FormStore::from_snapshot(config::load_form(path)?),
        None => FormStore::new(),
    };

    let converter = SvgToPngConverter::new().with_scale(config.export_scale);
    let exporter = Exporter::new(
        Arc::new(converter),
        Arc::new(DirectorySink::new(&config.output_dir)),
    );
    let mut session = Session::new(
        store,
        SurfaceLayout::with_width(config.preview_width),
        exporter,
    );

    let stdin = BufReader::new(tokio::io::stdin());
    session
        .run(stdin, |reply| match reply {
            Reply::Preview(text) => println!("{text}"),
            Reply::ExportStarted => info!("Export started"),
            Reply::Updated => {}
        })
        .await;

    info!("Input closed, waiting for exports to finish...");
    for outcome in session.finish_exports().await {
        match outcome {
            ExportOutcome::Saved(path) => println!("{}", path.display()),
            ExportOutcome::Skipped => info!("Export skipped, preview not mounted"),
        }
    }

    telemetry::shutdown_telemetry();
    info!("CV builder shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    // Logs go to stderr; stdout carries command output.
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
