// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mask resolution — turns a leaf layer's source pixels plus its transparency
// mask and raster layer mask into the straight-alpha RGBA image that gets
// composited.

use image::{GrayImage, RgbaImage};
use psdwerk_core::Rect;
use tracing::{instrument, trace};

use crate::layer::{LayerMask, LayerNode};

/// Produce the effective RGBA image of a leaf layer.
///
/// The transparency mask is applied first (only when the source carries no
/// alpha channel of its own), then the layer mask multiplies the result. A
/// layer without pixels resolves to a 0x0 image.
#[instrument(skip_all, fields(layer = %layer.id))]
pub fn resolve(layer: &LayerNode) -> RgbaImage {
    let Some(source) = layer
        .image
        .as_ref()
        .filter(|img| img.width() > 0 && img.height() > 0)
    else {
        return RgbaImage::new(0, 0);
    };

    let has_alpha = source.color().has_alpha();
    let mut rgba = source.to_rgba8();

    if let Some(mask) = &layer.transparency_mask {
        if has_alpha {
            trace!("source has alpha, transparency mask ignored");
        } else {
            apply_transparency_mask(&mut rgba, mask);
        }
    }

    if let Some(mask) = &layer.layer_mask {
        apply_layer_mask(&mut rgba, layer.rect, mask);
    }

    rgba
}

/// Replace alpha with the mask byte wherever image and mask overlap.
pub fn apply_transparency_mask(image: &mut RgbaImage, mask: &GrayImage) {
    let width = image.width().min(mask.width());
    let height = image.height().min(mask.height());
    for y in 0..height {
        for x in 0..width {
            image.get_pixel_mut(x, y).0[3] = mask.get_pixel(x, y).0[0];
        }
    }
}

/// Multiply alpha by the layer mask coverage.
///
/// `rect` is the image's placement in document coordinates; mask pixels are
/// looked up through the mask's own rectangle, and positions outside it use
/// the mask's default color.
pub fn apply_layer_mask(image: &mut RgbaImage, rect: Rect, mask: &LayerMask) {
    let dx = i64::from(rect.x) - i64::from(mask.rect.x);
    let dy = i64::from(rect.y) - i64::from(mask.rect.y);
    let mask_w = i64::from(mask.image.width());
    let mask_h = i64::from(mask.image.height());

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let mx = i64::from(x) + dx;
        let my = i64::from(y) + dy;
        let coverage = if mx >= 0 && my >= 0 && mx < mask_w && my < mask_h {
            mask.image.get_pixel(mx as u32, my as u32).0[0]
        } else {
            mask.default_color
        };
        pixel.0[3] = mul_div_255(pixel.0[3], coverage);
    }
}

/// `round(a * b / 255)` in integer arithmetic.
pub(crate) fn mul_div_255(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}
