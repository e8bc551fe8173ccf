//! Runtime configuration loaded from environment variables.

use crate::form::FormSnapshot;
use crate::surface::DEFAULT_WIDTH;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration.
///
/// Environment variables:
/// - `CV_OUTPUT_DIR`: directory exports are saved into (default: `.`)
/// - `CV_FORM_PATH`: optional JSON form snapshot to start from
/// - `CV_PREVIEW_WIDTH`: preview surface width in px (default: 800)
/// - `CV_EXPORT_SCALE`: raster scale factor (default: 1.0)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for human-readable
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: enables OTLP trace export when set
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub form_path: Option<PathBuf>,
    pub preview_width: u32,
    pub export_scale: f32,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // .env is optional
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let preview_width: u32 = parse_or(&lookup, "CV_PREVIEW_WIDTH", DEFAULT_WIDTH)?;
        if preview_width == 0 {
            anyhow::bail!("CV_PREVIEW_WIDTH must be greater than zero");
        }

        let export_scale: f32 = parse_or(&lookup, "CV_EXPORT_SCALE", 1.0)?;
        if !export_scale.is_finite() || export_scale <= 0.0 {
            anyhow::bail!("CV_EXPORT_SCALE must be a positive number, got {}", export_scale);
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            output_dir: lookup("CV_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            form_path: lookup("CV_FORM_PATH").filter(|p| !p.is_empty()).map(PathBuf::from),
            preview_width,
            export_scale,
            log_format,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// Reads a JSON form snapshot. Missing fields take their defaults.
pub fn load_form(path: &Path) -> Result<FormSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse form file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.form_path, None);
        assert_eq!(config.preview_width, DEFAULT_WIDTH);
        assert_eq!(config.export_scale, 1.0);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("CV_OUTPUT_DIR", "/tmp/cv"),
            ("CV_FORM_PATH", "form.json"),
            ("CV_PREVIEW_WIDTH", "1024"),
            ("CV_EXPORT_SCALE", "2"),
            ("LOG_FORMAT", "json"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        ]))
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/cv"));
        assert_eq!(config.form_path, Some(PathBuf::from("form.json")));
        assert_eq!(config.preview_width, 1024);
        assert_eq!(config.export_scale, 2.0);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("CV_PREVIEW_WIDTH", "wide")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("CV_PREVIEW_WIDTH", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("CV_EXPORT_SCALE", "-1")])).is_err());
    }

    #[test]
    fn test_load_form() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"personal": {{"name": "Grace"}}, "skills": ["COBOL"]}}"#).unwrap();

        let snapshot = load_form(file.path()).unwrap();

        assert_eq!(snapshot.personal.name, "Grace");
        assert_eq!(&*snapshot.skills[0], "COBOL");
    }

    #[test]
    fn test_load_form_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_form(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse form file"));
    }
}
