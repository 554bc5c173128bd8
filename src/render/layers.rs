use std::io::Write;

use anyhow::Context;
use image::{
    ExtendedColorType, ImageEncoder,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{RigError, RigResult},
    render::{
        composite::{over_in_place, unpremultiply_in_place},
        decode::LayerImage,
        labels::draw_labels,
    },
};

/// Largest accepted canvas edge, in pixels.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// PNG compression effort passed through to the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    #[default]
    Default,
    Fast,
    Best,
}

impl PngCompression {
    fn encoder_type(self) -> CompressionType {
        match self {
            Self::Default => CompressionType::Default,
            Self::Fast => CompressionType::Fast,
            Self::Best => CompressionType::Best,
        }
    }
}

pub(crate) fn validate_canvas(width: u32, height: u32) -> RigResult<()> {
    if width == 0 || height == 0 {
        return Err(RigError::validation(format!(
            "canvas must be non-empty, got {width}x{height}"
        )));
    }
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(RigError::validation(format!(
            "canvas {width}x{height} exceeds {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM}"
        )));
    }
    Ok(())
}

/// Stacks layers onto one canvas and encodes it as PNG.
///
/// Layers are drawn source-over in the order they are added, so call order is z-order. Images
/// whose size differs from the canvas are bilinear-scaled to fit first. With labels enabled, the
/// label of each layer is written top to bottom in monospace when the canvas is encoded.
///
/// The canvas is owned by one renderer and consumed by [`LayerRenderer::write`].
#[derive(Debug)]
pub struct LayerRenderer {
    width: u32,
    height: u32,
    labels: bool,
    canvas: Vec<u8>,
    lines: Vec<String>,
    layers: usize,
}

impl LayerRenderer {
    pub fn new(width: u32, height: u32, labels: bool) -> RigResult<Self> {
        validate_canvas(width, height)?;
        Ok(Self {
            width,
            height,
            labels,
            canvas: vec![0u8; width as usize * height as usize * 4],
            lines: Vec::new(),
            layers: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layer_count(&self) -> usize {
        self.layers
    }

    pub fn add_layer(&mut self, image: &LayerImage, label: &str) -> RigResult<()> {
        if image.dimensions() == (self.width, self.height) {
            over_in_place(&mut self.canvas, image.premul_rgba8())?;
        } else {
            let scaled = image.resized(self.width, self.height);
            over_in_place(&mut self.canvas, scaled.premul_rgba8())?;
        }
        if self.labels {
            self.lines.push(label.to_string());
        }
        self.layers += 1;
        Ok(())
    }

    /// Encode the canvas as PNG into `out`, consuming the renderer.
    #[tracing::instrument(level = "debug", skip(self, out), fields(w = self.width, h = self.height, layers = self.layers))]
    pub fn write<W: Write>(mut self, out: W, compression: PngCompression) -> RigResult<()> {
        if self.labels {
            draw_labels(&mut self.canvas, self.width, self.height, &self.lines)?;
        }
        unpremultiply_in_place(&mut self.canvas);

        PngEncoder::new_with_quality(out, compression.encoder_type(), FilterType::Adaptive)
            .write_image(
                &self.canvas,
                self.width,
                self.height,
                ExtendedColorType::Rgba8,
            )
            .context("encode png")?;
        Ok(())
    }

    /// [`LayerRenderer::write`] into a fresh buffer.
    pub fn encode(self, compression: PngCompression) -> RigResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf, compression)?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layers.rs"]
mod tests;
