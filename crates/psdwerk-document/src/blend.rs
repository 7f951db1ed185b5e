// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blend-mode operators.
//
// Colors are straight-alpha and normalised to [0, 1]. Each blend mode maps to
// an `Operator` that mixes a backdrop color `b` with a source color `s`; the
// result is then composited source-over with the separable compositing
// formula:
//
//   Cs' = (1 - ab) * Cs + ab * B(Cb, Cs)
//   ao  = as + ab * (1 - as)
//   Co  = (as * Cs' + ab * (1 - as) * Cb) / ao

use image::Rgba;
use psdwerk_core::BlendMode;

type Rgb = [f32; 3];

/// Per-pixel mixing function for one blend mode.
#[derive(Clone, Copy)]
pub enum Operator {
    /// Applied to each color channel independently.
    Separable(fn(f32, f32) -> f32),
    /// Needs all three channels at once (hue, saturation, color, luminosity).
    NonSeparable(fn(Rgb, Rgb) -> Rgb),
}

impl Operator {
    fn mix(&self, backdrop: Rgb, source: Rgb) -> Rgb {
        match self {
            Self::Separable(f) => [
                f(backdrop[0], source[0]),
                f(backdrop[1], source[1]),
                f(backdrop[2], source[2]),
            ],
            Self::NonSeparable(f) => f(backdrop, source),
        }
    }
}

/// Map a blend mode to its compositing operator.
///
/// `PassThrough` has no operator of its own; when a pass-through group ever
/// reaches a draw call it behaves as `Normal`.
pub fn composition_operator_for(mode: BlendMode) -> Operator {
    use Operator::{NonSeparable, Separable};
    match mode {
        BlendMode::Normal | BlendMode::PassThrough => Separable(normal),
        BlendMode::Multiply => Separable(multiply),
        BlendMode::Screen => Separable(screen),
        BlendMode::Overlay => Separable(overlay),
        BlendMode::SoftLight => Separable(soft_light),
        BlendMode::HardLight => Separable(hard_light),
        BlendMode::Darken => Separable(f32::min),
        BlendMode::Lighten => Separable(f32::max),
        BlendMode::ColorBurn => Separable(color_burn),
        BlendMode::ColorDodge => Separable(color_dodge),
        BlendMode::Difference => Separable(difference),
        BlendMode::Exclusion => Separable(exclusion),
        BlendMode::LinearDodge => Separable(linear_dodge),
        BlendMode::LinearBurn => Separable(linear_burn),
        BlendMode::LinearLight => Separable(linear_light),
        BlendMode::VividLight => Separable(vivid_light),
        BlendMode::PinLight => Separable(pin_light),
        BlendMode::HardMix => Separable(hard_mix),
        BlendMode::Hue => NonSeparable(hue),
        BlendMode::Saturation => NonSeparable(saturation),
        BlendMode::Color => NonSeparable(color),
        BlendMode::Luminosity => NonSeparable(luminosity),
    }
}

/// Composite `src` over `dst` with `op`, scaling the source alpha by
/// `opacity`.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, op: Operator, opacity: f32) -> Rgba<u8> {
    let src_a = to_unit(src.0[3]) * opacity.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return dst;
    }
    let dst_a = to_unit(dst.0[3]);

    let s = [to_unit(src.0[0]), to_unit(src.0[1]), to_unit(src.0[2])];
    let b = [to_unit(dst.0[0]), to_unit(dst.0[1]), to_unit(dst.0[2])];
    // Without a backdrop the mixing result is weighted by zero anyway.
    let mixed = if dst_a > 0.0 { op.mix(b, s) } else { s };

    let out_a = src_a + dst_a * (1.0 - src_a);
    let channel = |i: usize| {
        let cs = (1.0 - dst_a) * s[i] + dst_a * mixed[i].clamp(0.0, 1.0);
        (src_a * cs + dst_a * (1.0 - src_a) * b[i]) / out_a
    };

    Rgba([
        from_unit(channel(0)),
        from_unit(channel(1)),
        from_unit(channel(2)),
        from_unit(out_a),
    ])
}

fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

fn from_unit(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// -- Separable modes ----------------------------------------------------------

fn normal(_b: f32, s: f32) -> f32 {
    s
}

fn multiply(b: f32, s: f32) -> f32 {
    b * s
}

fn screen(b: f32, s: f32) -> f32 {
    b + s - b * s
}

fn hard_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        multiply(b, 2.0 * s)
    } else {
        screen(b, 2.0 * s - 1.0)
    }
}

fn overlay(b: f32, s: f32) -> f32 {
    hard_light(s, b)
}

fn soft_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        let d = if b <= 0.25 {
            ((16.0 * b - 12.0) * b + 4.0) * b
        } else {
            b.sqrt()
        };
        b + (2.0 * s - 1.0) * (d - b)
    }
}

fn color_dodge(b: f32, s: f32) -> f32 {
    if b <= 0.0 {
        0.0
    } else if s >= 1.0 {
        1.0
    } else {
        (b / (1.0 - s)).min(1.0)
    }
}

fn color_burn(b: f32, s: f32) -> f32 {
    if b >= 1.0 {
        1.0
    } else if s <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - b) / s).min(1.0)
    }
}

fn difference(b: f32, s: f32) -> f32 {
    (b - s).abs()
}

fn exclusion(b: f32, s: f32) -> f32 {
    b + s - 2.0 * b * s
}

fn linear_dodge(b: f32, s: f32) -> f32 {
    (b + s).min(1.0)
}

fn linear_burn(b: f32, s: f32) -> f32 {
    (b + s - 1.0).max(0.0)
}

fn linear_light(b: f32, s: f32) -> f32 {
    (b + 2.0 * s - 1.0).clamp(0.0, 1.0)
}

fn vivid_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        color_burn(b, 2.0 * s)
    } else {
        color_dodge(b, 2.0 * (s - 0.5))
    }
}

fn pin_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b.min(2.0 * s)
    } else {
        b.max(2.0 * s - 1.0)
    }
}

fn hard_mix(b: f32, s: f32) -> f32 {
    if b + s >= 1.0 { 1.0 } else { 0.0 }
}

// -- Non-separable modes ------------------------------------------------------

fn lum(c: Rgb) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: Rgb) -> Rgb {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: Rgb, l: f32) -> Rgb {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: Rgb) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: Rgb, s: f32) -> Rgb {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max <= min {
        return [0.0; 3];
    }
    c.map(|v| {
        if v == max {
            s
        } else if v == min {
            0.0
        } else {
            (v - min) * s / (max - min)
        }
    })
}

fn hue(b: Rgb, s: Rgb) -> Rgb {
    set_lum(set_sat(s, sat(b)), lum(b))
}

fn saturation(b: Rgb, s: Rgb) -> Rgb {
    set_lum(set_sat(b, sat(s)), lum(b))
}

fn color(b: Rgb, s: Rgb) -> Rgb {
    set_lum(s, lum(b))
}

fn luminosity(b: Rgb, s: Rgb) -> Rgb {
    set_lum(b, lum(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn blend(mode: BlendMode, dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
        blend_pixel(dst, src, composition_operator_for(mode), 1.0)
    }

    #[test]
    fn normal_over_transparent_copies_source() {
        assert_eq!(blend(BlendMode::Normal, CLEAR, RED), RED);
        let half = Rgba([10, 20, 30, 128]);
        assert_eq!(blend(BlendMode::Normal, CLEAR, half), half);
    }

    #[test]
    fn every_mode_over_transparent_is_the_source() {
        // With no backdrop the mixing function never contributes.
        let src = Rgba([200, 100, 50, 255]);
        for mode in [
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Difference,
            BlendMode::ColorBurn,
            BlendMode::Hue,
            BlendMode::Luminosity,
        ] {
            assert_eq!(blend(mode, CLEAR, src), src, "{mode:?}");
        }
    }

    #[test]
    fn opaque_normal_replaces_backdrop() {
        assert_eq!(blend(BlendMode::Normal, BLUE, RED), RED);
    }

    #[test]
    fn zero_opacity_is_noop() {
        let out = blend_pixel(BLUE, RED, composition_operator_for(BlendMode::Normal), 0.0);
        assert_eq!(out, BLUE);
    }

    #[test]
    fn half_opacity_mixes_evenly() {
        let out = blend_pixel(BLUE, RED, composition_operator_for(BlendMode::Normal), 0.5);
        assert_eq!(out, Rgba([128, 0, 128, 255]));
    }

    #[test]
    fn multiply_and_screen() {
        let grey = Rgba([128, 128, 128, 255]);
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(blend(BlendMode::Multiply, white, grey), grey);
        assert_eq!(blend(BlendMode::Multiply, BLUE, RED), Rgba([0, 0, 0, 255]));
        assert_eq!(blend(BlendMode::Screen, BLUE, RED), Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn difference_of_identical_is_black() {
        let c = Rgba([90, 160, 30, 255]);
        assert_eq!(blend(BlendMode::Difference, c, c), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn hard_mix_thresholds() {
        let dark = Rgba([50, 50, 50, 255]);
        let light = Rgba([220, 220, 220, 255]);
        assert_eq!(blend(BlendMode::HardMix, dark, dark), Rgba([0, 0, 0, 255]));
        assert_eq!(blend(BlendMode::HardMix, light, light), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn luminosity_of_grey_source_greys_the_backdrop() {
        let grey = Rgba([128, 128, 128, 255]);
        let out = blend(BlendMode::Luminosity, RED, grey);
        let l = 0.3 * out.0[0] as f32 + 0.59 * out.0[1] as f32 + 0.11 * out.0[2] as f32;
        assert!((l - 128.0).abs() <= 1.5, "luma {l}");
    }

    #[test]
    fn color_keeps_backdrop_luma() {
        let grey = Rgba([100, 100, 100, 255]);
        let out = blend(BlendMode::Color, grey, RED);
        let l = 0.3 * out.0[0] as f32 + 0.59 * out.0[1] as f32 + 0.11 * out.0[2] as f32;
        assert!((l - 100.0).abs() <= 1.5, "luma {l}");
        assert!(out.0[0] > out.0[1]);
    }

    #[test]
    fn opaque_modes_match_reference_values() {
        let backdrop = Rgba([64, 128, 192, 255]);
        let source = Rgba([200, 100, 30, 255]);
        let table: [(BlendMode, [u8; 3]); 15] = [
            (BlendMode::Overlay, [100, 101, 144]),
            (BlendMode::SoftLight, [100, 114, 156]),
            (BlendMode::HardLight, [173, 100, 45]),
            (BlendMode::Darken, [64, 100, 30]),
            (BlendMode::Lighten, [200, 128, 192]),
            (BlendMode::ColorBurn, [11, 0, 0]),
            (BlendMode::ColorDodge, [255, 211, 218]),
            (BlendMode::Exclusion, [164, 128, 177]),
            (BlendMode::LinearDodge, [255, 228, 222]),
            (BlendMode::LinearBurn, [9, 0, 0]),
            (BlendMode::LinearLight, [209, 73, 0]),
            (BlendMode::VividLight, [148, 93, 0]),
            (BlendMode::PinLight, [145, 128, 60]),
            (BlendMode::Hue, [174, 99, 46]),
            (BlendMode::Saturation, [47, 132, 217]),
        ];

        for (mode, expected) in table {
            let out = blend(mode, backdrop, source);
            assert_eq!(out.0[3], 255, "{mode:?}");
            for i in 0..3 {
                let diff = (out.0[i] as i16 - expected[i] as i16).abs();
                assert!(diff <= 1, "{mode:?} channel {i}: got {:?}, want {expected:?}", out.0);
            }
        }
    }

    #[test]
    fn dodge_and_burn_limits() {
        assert_eq!(color_dodge(0.0, 0.5), 0.0);
        assert_eq!(color_dodge(0.0, 1.0), 0.0);
        assert_eq!(color_dodge(1.0, 0.5), 1.0);
        assert_eq!(color_dodge(0.5, 0.0), 0.5);
        assert_eq!(color_dodge(0.5, 1.0), 1.0);

        assert_eq!(color_burn(1.0, 0.5), 1.0);
        assert_eq!(color_burn(1.0, 0.0), 1.0);
        assert_eq!(color_burn(0.0, 0.5), 0.0);
        assert_eq!(color_burn(0.5, 0.0), 0.0);
        assert_eq!(color_burn(0.5, 1.0), 0.5);
    }

    #[test]
    fn set_sat_of_grey_is_black() {
        assert_eq!(set_sat([0.5, 0.5, 0.5], 1.0), [0.0; 3]);
    }
}
