//! Export of the mounted preview surface to a downloadable PNG.

use crate::converter::SvgToPngConverter;
use crate::job::ExportJob;
use crate::surface::{Page, Surface, PREVIEW_SURFACE_ID};
use crate::telemetry;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Filename every export is saved under.
pub const EXPORT_FILENAME: &str = "my_cv.png";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("rasterization failed: {0:#}")]
    Rasterize(anyhow::Error),

    #[error("saving {filename} failed: {error:#}")]
    Save {
        filename: String,
        error: anyhow::Error,
    },

    #[error("export task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No preview surface was mounted; nothing was saved.
    Skipped,
    Saved(PathBuf),
}

/// Destination for exported images.
#[cfg_attr(test, mockall::automock)]
pub trait DownloadSink: Send + Sync {
    /// Stores `bytes` under `filename` and returns where it landed.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves downloads into a directory, overwriting earlier files of the same
/// name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    /// Writes to a temp file in the target directory and renames it into
    /// place, so concurrent saves never leave a mixed file behind.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.dir.join(filename);
        let mut temp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {}", self.dir.display()))?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .with_context(|| format!("Failed to write {}", temp.path().display()))?;
        temp.persist(&path)
            .with_context(|| format!("Failed to move export into {}", path.display()))?;
        Ok(path)
    }
}

/// Rasterizes the mounted preview and hands the PNG to a download sink.
#[derive(Clone)]
pub struct Exporter {
    converter: Arc<SvgToPngConverter>,
    sink: Arc<dyn DownloadSink>,
}

impl Exporter {
    pub fn new(converter: Arc<SvgToPngConverter>, sink: Arc<dyn DownloadSink>) -> Self {
        Self { converter, sink }
    }

    /// Exports whatever the preview surface shows right now.
    ///
    /// Returns [`ExportOutcome::Skipped`] when nothing is mounted under
    /// [`PREVIEW_SURFACE_ID`].
    pub async fn export_preview(&self, page: &Page) -> Result<ExportOutcome, ExportError> {
        let surface = page.find(PREVIEW_SURFACE_ID).cloned();
        self.export_surface(surface).await
    }

    /// Fire-and-forget export.
    ///
    /// The surface is captured before this returns, so later edits do not
    /// affect the file. Failures are logged and yield `None`.
    pub fn spawn_export(&self, page: &Page) -> JoinHandle<Option<ExportOutcome>> {
        let surface = page.find(PREVIEW_SURFACE_ID).cloned();
        let exporter = self.clone();

        tokio::spawn(async move {
            match exporter.export_surface(surface).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(error = %e, "CV export failed");
                    None
                }
            }
        })
    }

    async fn export_surface(&self, surface: Option<Surface>) -> Result<ExportOutcome, ExportError> {
        let mut job = ExportJob::new(PREVIEW_SURFACE_ID, EXPORT_FILENAME);

        let Some(surface) = surface else {
            debug!(surface_id = PREVIEW_SURFACE_ID, "Preview surface not mounted, skipping export");
            job.mark_skipped();
            telemetry::record_export_telemetry(&job);
            return Ok(ExportOutcome::Skipped);
        };

        job.start_processing();
        info!(
            job_id = %job.job_id,
            width = surface.width(),
            height = surface.height(),
            "Exporting CV preview"
        );

        let converter = self.converter.clone();
        let sink = self.sink.clone();
        let result = tokio::task::spawn_blocking(move || {
            let png = converter
                .convert(surface.svg())
                .map_err(ExportError::Rasterize)?;
            let path = sink
                .save(EXPORT_FILENAME, &png)
                .map_err(|error| ExportError::Save {
                    filename: EXPORT_FILENAME.to_string(),
                    error,
                })?;
            Ok::<_, ExportError>((path, png.len()))
        })
        .await
        .map_err(ExportError::from)
        .and_then(|r| r);

        match result {
            Ok((path, bytes)) => {
                job.mark_complete(bytes);
                telemetry::record_export_telemetry(&job);
                info!(job_id = %job.job_id, path = %path.display(), "CV saved");
                Ok(ExportOutcome::Saved(path))
            }
            Err(e) => {
                job.mark_failed(e.to_string());
                telemetry::record_export_telemetry(&job);
                Err(e)
            }
        }
    }
}
