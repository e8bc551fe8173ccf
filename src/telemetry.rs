//! Telemetry and structured logging for preview exports.

use crate::job::{ExportJob, JobStatus};
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::{global, KeyValue};
use tracing::{info, warn};

const TRACER_NAME: &str = "cv-builder";

/// Exports slower than this are logged as warnings.
const SLOW_EXPORT_MS: i64 = 2000;

/// Records telemetry for a finished export.
///
/// Emits an OpenTelemetry span plus structured logs with the duration,
/// status, output size and error (if failed). Without an installed tracer
/// provider the span goes to the global no-op tracer.
pub fn record_export_telemetry(job: &ExportJob) {
    let tracer = global::tracer(TRACER_NAME);
    let mut span = tracer.start("cv_export");

    span.set_attribute(KeyValue::new("job_id", job.job_id.clone()));
    span.set_attribute(KeyValue::new("surface_id", job.surface_id.clone()));
    span.set_attribute(KeyValue::new("filename", job.filename.clone()));
    span.set_attribute(KeyValue::new("status", job.status.to_string()));

    if let Some(bytes) = job.output_bytes {
        span.set_attribute(KeyValue::new("output_bytes", bytes as i64));
    }

    if let Some(duration_ms) = job.processing_duration_ms() {
        span.set_attribute(KeyValue::new("duration_ms", duration_ms));

        info!(
            job_id = %job.job_id,
            surface_id = %job.surface_id,
            duration_ms = duration_ms,
            status = %job.status,
            "CV export finished"
        );

        if duration_ms > SLOW_EXPORT_MS {
            warn!(
                job_id = %job.job_id,
                duration_ms = duration_ms,
                "CV export exceeded performance threshold ({}ms)",
                SLOW_EXPORT_MS
            );
        }
    }

    if job.status == JobStatus::Failed {
        if let Some(ref error) = job.error {
            span.set_attribute(KeyValue::new("error", error.clone()));
            warn!(job_id = %job.job_id, error = %error, "CV export failed");
        }
    }

    span.end();
}

/// Installs an OTLP trace pipeline exporting to `endpoint`.
///
/// Must be called from within a tokio runtime.
pub fn init_telemetry(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::Config;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| TRACER_NAME.to_string());

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(Config::default().with_resource(
            opentelemetry_sdk::Resource::new(vec![
                KeyValue::new("service.name", service_name),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    if let Some(provider) = tracer.provider() {
        global::set_tracer_provider(provider);
    }

    info!(endpoint = %endpoint, "Telemetry initialized");
    Ok(())
}

/// Flushes pending spans. Call before process exit.
pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_complete_export() {
        let mut job = ExportJob::new("cv-preview", "my_cv.png");
        job.start_processing();
        job.mark_complete(2048);

        // No provider installed; must not panic.
        record_export_telemetry(&job);
    }

    #[test]
    fn test_record_failed_export() {
        let mut job = ExportJob::new("cv-preview", "my_cv.png");
        job.mark_failed("Failed to parse SVG content".to_string());

        record_export_telemetry(&job);
    }
}
