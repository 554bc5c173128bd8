use anyhow::Context;
use image::{RgbaImage, imageops::FilterType};

use crate::{
    foundation::error::{RigError, RigResult},
    render::composite::premultiply_in_place,
};

/// A decoded layer in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerImage {
    pixels: RgbaImage,
}

impl LayerImage {
    /// Wrap straight-alpha pixels, premultiplying them.
    pub fn from_straight(mut rgba: RgbaImage) -> Self {
        premultiply_in_place(&mut rgba);
        Self { pixels: rgba }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn premul_rgba8(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Bilinear resample to `width x height`.
    pub fn resized(&self, width: u32, height: u32) -> LayerImage {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        LayerImage {
            pixels: image::imageops::resize(&self.pixels, width, height, FilterType::Triangle),
        }
    }
}

/// Decode PNG, JPEG or GIF bytes into a premultiplied layer.
pub fn decode_layer(bytes: &[u8]) -> RigResult<LayerImage> {
    let img = image::load_from_memory(bytes).context("decode layer image from memory")?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(RigError::resource("layer image has zero size"));
    }
    Ok(LayerImage::from_straight(rgba))
}

#[cfg(test)]
#[path = "../../tests/unit/render/decode.rs"]
mod tests;
