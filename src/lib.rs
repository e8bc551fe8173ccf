//! CV Builder Library
//!
//! Form state for a CV (personal details, experience, education, skills), a
//! live preview derived from it, and export of that preview as a PNG.
//!
//! ## Module Overview
//!
//! - `form`: index-addressed form state store
//! - `preview`: pure projection of a snapshot into a display tree
//! - `surface`: SVG layout of the preview and the page it is mounted on
//! - `converter`: SVG to PNG rasterization using resvg
//! - `export`: preview export to a download sink
//! - `job`: export job records
//! - `event`: textual input events
//! - `session`: event handling loop state
//! - `config`: environment configuration
//! - `telemetry`: OpenTelemetry integration and structured logging
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cv_builder::{
//!     converter::SvgToPngConverter,
//!     export::{DirectorySink, Exporter, ExportOutcome},
//!     form::{ExperienceField, FormStore, PersonalField},
//!     preview::render,
//!     surface::{Page, SurfaceLayout, PREVIEW_SURFACE_ID},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut store = FormStore::new();
//!     store.update_personal(PersonalField::Name, "Ada Lovelace");
//!     store.update_experience(0, ExperienceField::Company, "Acme").unwrap();
//!
//!     let mut page = Page::new();
//!     let surface = SurfaceLayout::default().layout(&render(&store.snapshot()));
//!     page.mount(PREVIEW_SURFACE_ID, surface);
//!
//!     let exporter = Exporter::new(
//!         Arc::new(SvgToPngConverter::new()),
//!         Arc::new(DirectorySink::new("/tmp")),
//!     );
//!     let outcome = exporter.export_preview(&page).await.unwrap();
//!     assert!(matches!(outcome, ExportOutcome::Saved(_)));
//! }
//! ```

pub mod config;
pub mod converter;
pub mod event;
pub mod export;
pub mod form;
pub mod job;
pub mod preview;
pub mod session;
pub mod surface;
pub mod telemetry;
