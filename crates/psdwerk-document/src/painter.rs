// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A minimal raster painter: draws straight-alpha RGBA images onto a canvas
// with a current blend mode and global opacity, and keeps a save/restore stack
// for that state.

use image::RgbaImage;
use psdwerk_core::BlendMode;

use crate::blend::{blend_pixel, composition_operator_for};

#[derive(Debug, Clone, Copy)]
struct PainterState {
    opacity: f32,
    blend_mode: BlendMode,
}

impl Default for PainterState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

/// Paints into a borrowed canvas.
pub struct Painter<'a> {
    canvas: &'a mut RgbaImage,
    state: PainterState,
    saved: Vec<PainterState>,
}

impl<'a> Painter<'a> {
    pub fn new(canvas: &'a mut RgbaImage) -> Self {
        Self {
            canvas,
            state: PainterState::default(),
            saved: Vec::new(),
        }
    }

    pub fn opacity(&self) -> f32 {
        self.state.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.state.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend_mode
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend_mode = mode;
    }

    /// Push the current opacity and blend mode.
    pub fn save(&mut self) {
        self.saved.push(self.state);
    }

    /// Pop the state pushed by the matching [`Painter::save`].
    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    /// Run `f` between a save and a restore.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.save();
        let result = f(self);
        self.restore();
        result
    }

    /// Draw `image` with its top-left corner at canvas position `(x, y)`,
    /// clipped to the canvas.
    pub fn draw_image(&mut self, x: i32, y: i32, image: &RgbaImage) {
        let opacity = self.state.opacity;
        if opacity <= 0.0 {
            return;
        }
        let op = composition_operator_for(self.state.blend_mode);
        let fast_copy = matches!(
            self.state.blend_mode,
            BlendMode::Normal | BlendMode::PassThrough
        ) && opacity >= 1.0;

        let (canvas_w, canvas_h) = (self.canvas.width() as i64, self.canvas.height() as i64);
        let x0 = (x as i64).max(0);
        let y0 = (y as i64).max(0);
        let x1 = (x as i64 + image.width() as i64).min(canvas_w);
        let y1 = (y as i64 + image.height() as i64).min(canvas_h);

        for cy in y0..y1 {
            for cx in x0..x1 {
                let src = *image.get_pixel((cx - x as i64) as u32, (cy - y as i64) as u32);
                let dst = self.canvas.get_pixel_mut(cx as u32, cy as u32);
                if fast_copy && src.0[3] == 255 {
                    *dst = src;
                } else {
                    *dst = blend_pixel(*dst, src, op, opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn save_restore_round_trips_state() {
        let mut canvas = RgbaImage::new(1, 1);
        let mut painter = Painter::new(&mut canvas);
        painter.save();
        painter.set_opacity(0.25);
        painter.set_blend_mode(BlendMode::Multiply);
        painter.restore();
        assert_eq!(painter.opacity(), 1.0);
        assert_eq!(painter.blend_mode(), BlendMode::Normal);
    }

    #[test]
    fn scoped_state_does_not_leak() {
        let mut canvas = RgbaImage::new(1, 1);
        let mut painter = Painter::new(&mut canvas);
        painter.scoped(|p| p.set_opacity(0.0));
        assert_eq!(painter.opacity(), 1.0);
    }

    #[test]
    fn draw_is_clipped_to_canvas() {
        let mut canvas = RgbaImage::new(4, 4);
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        {
            let mut painter = Painter::new(&mut canvas);
            painter.draw_image(2, -2, &red);
        }
        assert_eq!(*canvas.get_pixel(2, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(3, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*canvas.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn fully_outside_draw_is_noop() {
        let mut canvas = RgbaImage::new(2, 2);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        Painter::new(&mut canvas).draw_image(5, 5, &red);
        assert!(canvas.pixels().all(|p| p.0[3] == 0));
    }
}
