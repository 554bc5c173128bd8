use std::{
    fmt::Write as _,
    sync::{Arc, OnceLock},
};

use anyhow::Context;

use crate::{
    foundation::error::{RigError, RigResult},
    render::composite::over_in_place,
};

const MIN_FONT_PX: u32 = 8;
const WIDTH_PER_FONT_PX: u32 = 64;

/// Placement of diagnostic label lines on a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelLayout {
    pub font_px: u32,
    /// Baseline distance between consecutive lines.
    pub line_step: u32,
    pub margin: u32,
}

impl LabelLayout {
    /// Layout for a canvas `width` pixels wide. Text scales with the canvas.
    pub fn for_width(width: u32) -> Self {
        let font_px = (width / WIDTH_PER_FONT_PX).max(MIN_FONT_PX);
        Self {
            font_px,
            line_step: font_px * 3 / 2,
            margin: font_px / 2,
        }
    }

    /// Baseline of line `index` (0-based, top to bottom).
    pub fn baseline(&self, index: usize) -> u32 {
        self.margin + self.font_px + self.line_step * index as u32
    }
}

fn fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded label fonts");
        Arc::new(db)
    })
    .clone()
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// SVG document with one monospace text line per label.
pub(crate) fn label_svg(width: u32, height: u32, lines: &[String]) -> String {
    let layout = LabelLayout::for_width(width);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    for (i, line) in lines.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" font-family="monospace" font-size="{fs}" fill="white" stroke="black" stroke-width="{sw}" paint-order="stroke">{text}</text>"#,
            x = layout.margin,
            y = layout.baseline(i),
            fs = layout.font_px,
            sw = (layout.font_px / 8).max(1),
            text = escape_xml(line),
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Draw `lines` over a premultiplied `width x height` canvas.
///
/// Glyphs come from the system font database; lines whose font cannot be resolved are skipped.
pub(crate) fn draw_labels(
    canvas: &mut [u8],
    width: u32,
    height: u32,
    lines: &[String],
) -> RigResult<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let svg = label_svg(width, height, lines);
    let opts = usvg::Options {
        fontdb: fontdb(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).context("parse label svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RigError::resource("failed to allocate label pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    over_in_place(canvas, pixmap.data())
}

#[cfg(test)]
#[path = "../../tests/unit/render/labels.rs"]
mod tests;
