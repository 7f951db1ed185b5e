// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Encoding of rendered layer images for transport (PNG, JPEG).

use image::{ImageFormat, RgbaImage};
use psdwerk_core::error::{PsdwerkError, Result};
use tracing::{debug, instrument};

/// Output formats a rendered image can be encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    Png,
    Jpeg,
}

impl EncodedFormat {
    /// Parse a user-supplied format name (`png`, `jpeg`, `jpg`; any case).
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            _ => Err(PsdwerkError::UnsupportedFormat(name.to_owned())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Encode `image`. JPEG output drops the alpha channel.
    #[instrument(skip(image), fields(width = image.width(), height = image.height()))]
    pub fn encode(&self, image: &RgbaImage, jpeg_quality: u8) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Png => encode_png(image)?,
            Self::Jpeg => encode_jpeg(image, jpeg_quality)?,
        };
        debug!(len = bytes.len(), "image encoded");
        Ok(bytes)
    }
}

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| PsdwerkError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode an RGBA image as JPEG bytes with the given quality (1-100).
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| PsdwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}
