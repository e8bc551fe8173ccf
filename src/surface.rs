//! Preview surface: SVG layout of the preview tree and the page it is
//! mounted on.

use crate::preview::{BlockKind, PreviewTree};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Id under which the CV preview is mounted on the page.
pub const PREVIEW_SURFACE_ID: &str = "cv-preview";

/// Default surface width in px.
pub const DEFAULT_WIDTH: u32 = 800;

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const HEADING_COLOR: &str = "#3730a3";
const TEXT_COLOR: &str = "#111827";

/// Approximate advance of one display column, as a fraction of font size.
const CHAR_WIDTH_RATIO: f32 = 0.55;

struct TextStyle {
    size: f32,
    bold: bool,
    color: &'static str,
    space_before: f32,
    indent: f32,
}

fn style_for(kind: BlockKind) -> TextStyle {
    let (size, bold, color, space_before, indent) = match kind {
        BlockKind::Title => (24.0, true, HEADING_COLOR, 0.0, 0.0),
        BlockKind::Name => (20.0, true, TEXT_COLOR, 8.0, 0.0),
        BlockKind::Contact => (16.0, false, TEXT_COLOR, 2.0, 0.0),
        BlockKind::SectionHeading => (18.0, true, TEXT_COLOR, 16.0, 0.0),
        BlockKind::EntryHeading => (16.0, true, TEXT_COLOR, 8.0, 0.0),
        BlockKind::Caption => (14.0, false, TEXT_COLOR, 0.0, 0.0),
        BlockKind::Paragraph => (16.0, false, TEXT_COLOR, 0.0, 0.0),
        BlockKind::Bullet => (16.0, false, TEXT_COLOR, 0.0, 20.0),
    };
    TextStyle {
        size,
        bold,
        color,
        space_before,
        indent,
    }
}

/// A laid-out SVG rendering of a preview tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    svg: Arc<str>,
    width: u32,
    height: u32,
}

impl Surface {
    pub fn new(svg: impl Into<Arc<str>>, width: u32, height: u32) -> Self {
        Self {
            svg: svg.into(),
            width,
            height,
        }
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Lays a preview tree out on a fixed-width canvas.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceLayout {
    pub width: u32,
    pub padding: f32,
    pub line_spacing: f32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            padding: 24.0,
            line_spacing: 1.4,
        }
    }
}

impl SurfaceLayout {
    pub fn with_width(width: u32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Renders `tree` into an SVG surface. Height follows the content.
    pub fn layout(&self, tree: &PreviewTree) -> Surface {
        let mut body = String::new();
        let mut y = self.padding;

        for (kind, text) in tree.blocks() {
            let style = style_for(kind);
            y += style.space_before;

            let available = self.width as f32 - 2.0 * self.padding - style.indent;
            let max_columns = (available / (style.size * CHAR_WIDTH_RATIO)).max(1.0) as usize;

            for (i, line) in wrap(text, max_columns).iter().enumerate() {
                y += style.size * self.line_spacing;
                let x = self.padding + style.indent;
                if kind == BlockKind::Bullet && i == 0 {
                    let _ = writeln!(
                        body,
                        r#"  <circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"/>"#,
                        x - 10.0,
                        y - style.size * 0.35,
                        style.color
                    );
                }
                if line.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    body,
                    r#"  <text x="{:.1}" y="{:.1}" font-size="{}" font-weight="{}" fill="{}">{}</text>"#,
                    x,
                    y,
                    style.size,
                    if style.bold { "bold" } else { "normal" },
                    style.color,
                    xml_escape(line)
                );
            }
        }

        let height = (y + self.padding).ceil() as u32;
        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
                "\n",
                r#"  <rect width="100%" height="100%" fill="white"/>"#,
                "\n{body}</svg>\n"
            ),
            w = self.width,
            h = height,
            font = FONT_FAMILY,
            body = body
        );

        Surface::new(svg, self.width, height)
    }
}

/// Greedy word wrap by display width. Words wider than a line are broken
/// between characters. Always yields at least one line so empty blocks
/// still take up vertical space.
fn wrap(text: &str, max_columns: usize) -> Vec<String> {
    let max_columns = max_columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed > max_columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if word.width() > max_columns {
                let mut pieces = split_word(word, max_columns);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current = last;
                continue;
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    lines
}

/// Breaks `word` into pieces no wider than `max_columns`. A single
/// character wider than the limit gets a piece of its own.
fn split_word(word: &str, max_columns: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut columns = 0;

    for ch in word.chars() {
        let w = ch.width().unwrap_or(0);
        if columns + w > max_columns && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            columns = 0;
        }
        piece.push(ch);
        columns += w;
    }
    pieces.push(piece);

    pieces
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Host for rendered surfaces, addressed by a unique id.
#[derive(Debug, Default)]
pub struct Page {
    surfaces: HashMap<String, Surface>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `surface` under `id`, replacing any previous surface there.
    pub fn mount(&mut self, id: impl Into<String>, surface: Surface) {
        let id = id.into();
        debug!(id = %id, width = surface.width, height = surface.height, "Mounted surface");
        self.surfaces.insert(id, surface);
    }

    pub fn unmount(&mut self, id: &str) -> Option<Surface> {
        self.surfaces.remove(id)
    }

    pub fn find(&self, id: &str) -> Option<&Surface> {
        self.surfaces.get(id)
    }
}
