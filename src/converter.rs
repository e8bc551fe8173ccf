//! SVG to PNG rasterization via resvg.

use anyhow::{Context, Result};
use resvg::tiny_skia::{Pixmap, Transform};
use std::sync::Arc;
use tracing::{info, warn};
use usvg::fontdb;

/// SVG to PNG converter using resvg.
///
/// System fonts are loaded once at construction and shared by every
/// conversion. The generic `sans-serif` family is bound to a face that is
/// actually installed.
pub struct SvgToPngConverter {
    fontdb: Arc<fontdb::Database>,
    has_text_font: bool,
    scale: f32,
}

impl SvgToPngConverter {
    /// Creates a converter at 1:1 scale with system fonts loaded.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self::with_fontdb(db)
    }

    /// Creates a converter over an already populated font database.
    pub fn with_fontdb(mut db: fontdb::Database) -> Self {
        if !resolves_sans_serif(&db) {
            if let Some(family) = fallback_family(&db) {
                info!(family = %family, "Using fallback sans-serif family");
                db.set_sans_serif_family(family);
            }
        }

        let has_text_font = resolves_sans_serif(&db);
        if !has_text_font {
            warn!(faces = db.len(), "No usable font face loaded, text cannot be rasterized");
        }

        Self {
            fontdb: Arc::new(db),
            has_text_font,
            scale: 1.0,
        }
    }

    /// Whether text in the SVG can be drawn with a loaded face.
    pub fn has_text_font(&self) -> bool {
        self.has_text_font
    }

    /// Sets the pixel scale factor applied to the SVG's own size.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rasterizes SVG content and returns the encoded PNG bytes.
    ///
    /// # Errors
    ///
    /// - SVG parsing errors (malformed XML, unsupported features)
    /// - Invalid dimensions (zero-sized document or scale)
    /// - Text content with no usable font face loaded
    /// - PNG encoding errors
    pub fn convert(&self, svg_content: &str) -> Result<Vec<u8>> {
        if !self.has_text_font && svg_content.contains("<text") {
            anyhow::bail!("No font face available to render SVG text");
        }

        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb.clone();

        let tree =
            usvg::Tree::from_str(svg_content, &options).context("Failed to parse SVG content")?;

        let size = tree.size();
        if size.width() <= 0.0 || size.height() <= 0.0 {
            anyhow::bail!(
                "Invalid SVG dimensions: {}x{}",
                size.width(),
                size.height()
            );
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            anyhow::bail!("Invalid export scale: {}", self.scale);
        }

        let width = (size.width() * self.scale).ceil() as u32;
        let height = (size.height() * self.scale).ceil() as u32;
        let mut pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Failed to allocate {}x{} pixmap", width, height))?;

        resvg::render(
            &tree,
            Transform::from_scale(self.scale, self.scale),
            &mut pixmap.as_mut(),
        );

        let png = pixmap.encode_png().context("Failed to encode PNG")?;

        info!(width, height, bytes = png.len(), "Rasterized surface to PNG");
        Ok(png)
    }
}

fn resolves_sans_serif(db: &fontdb::Database) -> bool {
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        ..fontdb::Query::default()
    };
    db.query(&query).is_some()
}

/// Picks a loaded family to stand in for `sans-serif`: a proportional sans
/// face when one exists, otherwise whatever face was loaded first.
fn fallback_family(db: &fontdb::Database) -> Option<String> {
    let families: Vec<&str> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.as_str()))
        .collect();

    families
        .iter()
        .find(|name| name.contains("Sans") && !name.contains("Mono"))
        .or_else(|| families.first())
        .map(|name| name.to_string())
}

impl Default for SvgToPngConverter {
    fn default() -> Self {
        Self::new()
    }
}
