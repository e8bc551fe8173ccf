//! Export job records used for logging and telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One invocation of the preview export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub job_id: String,
    pub surface_id: String,
    pub filename: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub output_bytes: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Complete,
    Skipped,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Skipped => write!(f, "skipped"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl ExportJob {
    pub fn new(surface_id: impl Into<String>, filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4().to_string(),
            surface_id: surface_id.into(),
            filename: filename.into(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            output_bytes: None,
            error: None,
        }
    }

    pub fn start_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
    }

    pub fn mark_complete(&mut self, output_bytes: usize) {
        self.status = JobStatus::Complete;
        self.updated_at = Utc::now();
        self.output_bytes = Some(output_bytes);
        self.error = None;
    }

    /// The surface was not mounted; nothing was rendered.
    pub fn mark_skipped(&mut self) {
        self.status = JobStatus::Skipped;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.updated_at = Utc::now();
        self.error = Some(error);
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            JobStatus::Complete | JobStatus::Skipped | JobStatus::Failed
        )
    }

    pub fn processing_duration_ms(&self) -> Option<i64> {
        if self.is_finished() {
            Some(self.updated_at.signed_duration_since(self.created_at).num_milliseconds())
        } else {
            None
        }
    }
}
