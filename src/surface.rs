//! Pixel surfaces that flow through one render.
//!
//! A request decodes its upload into a [`SourceImage`], turns it into a
//! mutable [`Canvas`] for the layers to draw on, and may carry a fetched
//! [`LogoAsset`]. None of these outlive the request.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{ComposeError, ComposeResult};
use crate::layer::svg::alpha_blend;

/// Opaque background that non-opaque pixels are flattened onto.
pub const MATTE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size of an RGBA image.
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

// ============================================================================
// SourceImage
// ============================================================================

/// The decoded upload.
///
/// Immutable once decoded. The format is guessed from the bytes themselves,
/// so any raster format the `image` crate can read is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    data: RgbaImage,
}

impl SourceImage {
    /// Decodes raw upload bytes.
    ///
    /// Empty or unrecognized input is a [`ComposeError::Decode`].
    pub fn decode(bytes: &[u8]) -> ComposeResult<Self> {
        let image = image::load_from_memory(bytes).map_err(ComposeError::Decode)?;
        Ok(Self {
            data: image.to_rgba8(),
        })
    }

    /// Wraps an already decoded image.
    pub fn from_rgba(data: RgbaImage) -> Self {
        Self { data }
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    pub fn dimensions(&self) -> SizePx {
        SizePx::of(&self.data)
    }

    /// Draws the source at the origin of a new opaque canvas of the same
    /// size. Transparent regions show the [`MATTE`].
    pub fn into_canvas(self) -> Canvas {
        Canvas {
            data: flatten(self.data),
        }
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// The mutable drawing surface owned by one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub data: RgbaImage,
}

impl Canvas {
    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    pub fn dimensions(&self) -> SizePx {
        SizePx::of(&self.data)
    }

    /// Encodes the canvas as a baseline JPEG.
    ///
    /// JPEG has no alpha channel, so any non-opaque pixel is composited
    /// onto the [`MATTE`] before the alpha channel is dropped. `quality` is
    /// clamped to 1-100.
    pub fn encode_jpeg(&self, quality: u8) -> ComposeResult<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(flatten(self.data.clone())).to_rgb8();
        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(ComposeError::Encode)?;
        Ok(buf.into_inner())
    }
}

/// Composites every non-opaque pixel onto the matte.
fn flatten(mut data: RgbaImage) -> RgbaImage {
    for pixel in data.pixels_mut() {
        if pixel[3] != 255 {
            *pixel = alpha_blend(*pixel, MATTE);
        }
    }
    data
}

// ============================================================================
// LogoAsset
// ============================================================================

/// A logo fetched for a single request, at its original size.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoAsset {
    pub data: RgbaImage,
}

impl LogoAsset {
    pub fn new(data: RgbaImage) -> Self {
        Self { data }
    }

    /// Decodes fetched logo bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::load_from_memory(bytes)?.to_rgba8()))
    }

    /// Returns the size of the logo as fetched.
    pub fn original_size(&self) -> SizePx {
        SizePx::of(&self.data)
    }
}
