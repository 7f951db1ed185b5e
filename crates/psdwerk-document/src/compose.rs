// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layer compositor — renders a folder by recursively compositing its visible
// descendants, bottom layer first.
//
// Folders with a regular blend mode are isolated: their children are drawn
// into a private transparent buffer that is then drawn onto the outer canvas
// with the folder's blend mode and opacity. Pass-through folders have no
// buffer; their children draw straight onto the outer canvas and the folder's
// own opacity and blend mode are ignored.

use image::RgbaImage;
use psdwerk_core::error::{PsdwerkError, Result};
use psdwerk_core::{LayerId, Rect};
use tracing::{debug, instrument, trace};

use crate::layer::LayerNode;
use crate::mask;
use crate::painter::Painter;
use crate::tree::LayerTree;

/// Renders folders and layers of a borrowed layer tree.
pub struct Compositor<'a, T: LayerTree + ?Sized> {
    tree: &'a T,
}

impl<'a, T: LayerTree + ?Sized> Compositor<'a, T> {
    pub fn new(tree: &'a T) -> Self {
        Self { tree }
    }

    /// Render the layer with `id`, or the whole document when `id` is `None`.
    ///
    /// Leaves come back mask-resolved at their own size; folders come back as
    /// a composite covering the bounding rectangle of their visible leaves. A
    /// folder with nothing visible renders to a 0x0 image.
    #[instrument(skip(self))]
    pub fn render(&self, id: Option<LayerId>) -> Result<RgbaImage> {
        match id {
            None => self.render_children(None, false),
            Some(id) => {
                let node = self
                    .tree
                    .find_by_id(id)
                    .ok_or(PsdwerkError::LayerNotFound(id.into()))?;
                self.render_node(node)
            }
        }
    }

    /// Render a node of the tree.
    pub fn render_node(&self, node: &'a LayerNode) -> Result<RgbaImage> {
        if !node.is_folder() {
            return Ok(mask::resolve(node));
        }
        // There is nothing outside the top-level folder, so its own opacity
        // and blend mode never apply here.
        self.render_children(Some(node), node.blend_mode.is_pass_through())
    }

    /// Union of the rects of all visible leaves below `parent`.
    pub fn bounding_rect(&self, parent: Option<&'a LayerNode>) -> Rect {
        let mut bounds = Rect::default();
        for row in 0..self.tree.row_count(parent) {
            let Some(child) = self.tree.child(parent, row) else {
                continue;
            };
            if !child.visible {
                continue;
            }
            let rect = if child.is_folder() {
                self.bounding_rect(Some(child))
            } else {
                child.rect
            };
            bounds = bounds.united(&rect);
        }
        bounds
    }

    fn render_children(&self, parent: Option<&'a LayerNode>, pass_through: bool) -> Result<RgbaImage> {
        let bounds = self.bounding_rect(parent);
        if bounds.is_empty() {
            debug!("nothing visible to render");
            return Ok(RgbaImage::new(0, 0));
        }

        let (width, height) = bounds.size();
        let mut canvas = allocate_canvas(width, height)?;
        {
            let mut painter = Painter::new(&mut canvas);
            self.composite(parent, &mut painter, bounds.top_left(), pass_through)?;
        }
        debug!(width, height, x = bounds.x, y = bounds.y, "composite rendered");
        Ok(canvas)
    }

    /// Draw the children of `parent` onto `painter`, whose canvas has its
    /// top-left corner at `origin` in document coordinates.
    ///
    /// `pass_through` records whether `parent` draws straight into an outer
    /// canvas. It is carried through the recursion for tracing only; pixels
    /// come out the same either way, since the painter already holds the
    /// right canvas.
    #[instrument(level = "trace", skip_all, fields(parent = ?parent.map(|p| p.id), pass_through = pass_through))]
    fn composite(
        &self,
        parent: Option<&'a LayerNode>,
        painter: &mut Painter<'_>,
        origin: (i32, i32),
        pass_through: bool,
    ) -> Result<()> {
        for row in (0..self.tree.row_count(parent)).rev() {
            let Some(child) = self.tree.child(parent, row) else {
                continue;
            };
            if !child.visible {
                trace!(layer = %child.id, "skipping hidden layer");
                continue;
            }

            if child.is_folder() {
                if child.blend_mode.is_pass_through() {
                    self.composite(Some(child), painter, origin, true)?;
                    continue;
                }

                let child_bounds = self.bounding_rect(Some(child));
                if child_bounds.is_empty() {
                    continue;
                }
                let (width, height) = child_bounds.size();
                let mut buffer = allocate_canvas(width, height)?;
                {
                    let mut group = Painter::new(&mut buffer);
                    self.composite(Some(child), &mut group, child_bounds.top_left(), false)?;
                }
                draw_layer(painter, child, child_bounds, origin, &buffer);
            } else {
                let image = mask::resolve(child);
                if image.width() == 0 || image.height() == 0 {
                    continue;
                }
                draw_layer(painter, child, child.rect, origin, &image);
            }
        }
        Ok(())
    }
}

fn draw_layer(painter: &mut Painter<'_>, layer: &LayerNode, at: Rect, origin: (i32, i32), image: &RgbaImage) {
    let offset = |pos: i32, origin: i32| i32::try_from(i64::from(pos) - i64::from(origin)).ok();
    let (Some(x), Some(y)) = (offset(at.x, origin.0), offset(at.y, origin.1)) else {
        trace!(layer = %layer.id, "layer lies outside the addressable canvas");
        return;
    };
    painter.scoped(|p| {
        p.set_opacity(p.opacity() * layer.opacity * layer.fill_opacity);
        p.set_blend_mode(layer.blend_mode);
        p.draw_image(x, y, image);
    });
}

/// Largest canvas side; PSB documents are capped at 300,000 pixels.
const MAX_CANVAS_SIDE: u32 = 300_000;

/// Allocate a fully transparent `width` x `height` canvas, reporting
/// allocation failure instead of aborting.
fn allocate_canvas(width: u32, height: u32) -> Result<RgbaImage> {
    let exhausted = || PsdwerkError::ResourceExhausted { width, height };
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(exhausted());
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(exhausted)?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|_| exhausted())?;
    pixels.resize(len, 0u8);
    RgbaImage::from_raw(width, height, pixels).ok_or_else(exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma, Rgba};
    use psdwerk_core::BlendMode;

    use crate::layer::LayerDocument;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(id: u32, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) -> LayerNode {
        LayerNode::image_layer(
            LayerId(id),
            format!("layer {id}"),
            x,
            y,
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, color)),
        )
    }

    fn doc(layers: Vec<LayerNode>) -> LayerDocument {
        LayerDocument::new("test.psd", 100, 100, layers)
    }

    fn render_root(doc: &LayerDocument) -> RgbaImage {
        Compositor::new(doc).render(None).unwrap()
    }

    /// Red above blue, overlapping in [5, 10) x [5, 10).
    fn overlapping_pair() -> Vec<LayerNode> {
        vec![solid(2, 5, 5, 10, 10, RED), solid(1, 0, 0, 10, 10, BLUE)]
    }

    #[test]
    fn single_opaque_leaf() {
        let out = render_root(&doc(vec![solid(1, 0, 0, 10, 10, RED)]));
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| *p == RED));
    }

    #[test]
    fn bottom_layer_is_painted_first() {
        let out = render_root(&doc(overlapping_pair()));
        assert_eq!(out.dimensions(), (15, 15));
        assert_eq!(*out.get_pixel(7, 7), RED);
        assert_eq!(*out.get_pixel(2, 2), BLUE);
        assert_eq!(*out.get_pixel(12, 12), RED);
        assert_eq!(*out.get_pixel(12, 2), CLEAR);
        assert_eq!(*out.get_pixel(2, 12), CLEAR);
    }

    #[test]
    fn fully_masked_leaf_is_transparent() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(10, 10, image::Rgb([255, 0, 0])));
        let leaf = LayerNode::image_layer(LayerId(1), "masked", 0, 0, rgb)
            .with_transparency_mask(GrayImage::from_pixel(10, 10, Luma([0])));
        let out = render_root(&doc(vec![leaf]));
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn normal_folder_matches_flat_layers() {
        let flat = render_root(&doc(overlapping_pair()));
        let grouped = render_root(&doc(vec![LayerNode::folder(LayerId(10), "group", overlapping_pair())]));
        assert_eq!(flat, grouped);

        let d = doc(vec![LayerNode::folder(LayerId(10), "group", overlapping_pair())]);
        assert_eq!(Compositor::new(&d).render(Some(LayerId(10))).unwrap(), flat);
    }

    #[test]
    fn pass_through_folder_ignores_its_opacity() {
        let folder = LayerNode::folder(LayerId(10), "pass", vec![solid(1, 0, 0, 10, 10, RED)])
            .with_blend_mode(BlendMode::PassThrough)
            .with_opacity(0.5);
        let d = doc(vec![folder]);
        let out = Compositor::new(&d).render(Some(LayerId(10))).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| *p == RED));
    }

    #[test]
    fn layer_mask_reveals_top_left_square() {
        let leaf = solid(1, 20, 30, 10, 10, RED).with_layer_mask(
            GrayImage::from_pixel(5, 5, Luma([255])),
            Rect::new(20, 30, 5, 5),
            0,
        );
        let out = render_root(&doc(vec![leaf]));
        assert_eq!(out.dimensions(), (10, 10));
        for (x, y, p) in out.enumerate_pixels() {
            if x < 5 && y < 5 {
                assert_eq!(*p, RED, "({x}, {y})");
            } else {
                assert_eq!(p.0[3], 0, "({x}, {y})");
            }
        }
    }

    #[test]
    fn folder_without_visible_children_is_empty() {
        let d = doc(vec![LayerNode::folder(
            LayerId(10),
            "hidden inside",
            vec![solid(1, 0, 0, 4, 4, RED).with_visible(false)],
        )]);
        let out = Compositor::new(&d).render(Some(LayerId(10))).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
        assert_eq!(render_root(&d).dimensions(), (0, 0));
        assert_eq!(render_root(&LayerDocument::default()).dimensions(), (0, 0));
    }

    #[test]
    fn hidden_zero_opacity_leaf_changes_nothing() {
        let ghost = solid(3, 2, 2, 4, 4, RED).with_opacity(0.0);
        let mut layers = vec![ghost.clone()];
        layers.extend(overlapping_pair());
        let shown = render_root(&doc(layers));

        let mut layers = vec![ghost.with_visible(false)];
        layers.extend(overlapping_pair());
        let hidden = render_root(&doc(layers));
        assert_eq!(shown, hidden);
    }

    #[test]
    fn opacity_and_fill_multiply() {
        let split = render_root(&doc(vec![
            solid(2, 0, 0, 6, 6, RED).with_opacity(0.5).with_fill_opacity(0.8),
            solid(1, 0, 0, 6, 6, BLUE),
        ]));
        let combined = render_root(&doc(vec![
            solid(2, 0, 0, 6, 6, RED).with_opacity(0.4),
            solid(1, 0, 0, 6, 6, BLUE),
        ]));
        for (a, b) in split.pixels().zip(combined.pixels()) {
            for c in 0..4 {
                assert!(a.0[c].abs_diff(b.0[c]) <= 1, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn pass_through_equals_flattened_children() {
        let backdrop = solid(1, 0, 0, 12, 12, Rgba([40, 120, 200, 255]));
        let children = vec![
            solid(3, 2, 2, 6, 6, Rgba([250, 200, 10, 255])).with_blend_mode(BlendMode::Multiply),
            solid(2, 4, 4, 6, 6, Rgba([90, 10, 60, 180])).with_blend_mode(BlendMode::Screen),
        ];

        let mut flat = children.clone();
        flat.push(backdrop.clone());
        let flat = render_root(&doc(flat));

        let grouped = render_root(&doc(vec![
            LayerNode::folder(LayerId(10), "pass", children).with_blend_mode(BlendMode::PassThrough),
            backdrop,
        ]));
        assert_eq!(flat, grouped);
    }

    #[test]
    fn isolated_group_hides_backdrop_from_children() {
        // A multiply child inside an isolated group sees transparency, not the
        // red backdrop, so the group draws the child's own color over red.
        let child = solid(2, 0, 0, 4, 4, BLUE).with_blend_mode(BlendMode::Multiply);
        let backdrop = solid(1, 0, 0, 4, 4, RED);

        let isolated = render_root(&doc(vec![
            LayerNode::folder(LayerId(10), "group", vec![child.clone()]),
            backdrop.clone(),
        ]));
        assert_eq!(*isolated.get_pixel(1, 1), BLUE);

        let passed = render_root(&doc(vec![
            LayerNode::folder(LayerId(10), "group", vec![child]).with_blend_mode(BlendMode::PassThrough),
            backdrop,
        ]));
        assert_eq!(*passed.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn isolated_group_with_single_leaf_matches_leaf() {
        let leaf = solid(1, 3, 4, 5, 5, Rgba([12, 34, 56, 255]));
        let alone = Compositor::new(&doc(vec![leaf.clone()])).render(Some(LayerId(1))).unwrap();
        let d = doc(vec![LayerNode::folder(LayerId(10), "group", vec![leaf])]);
        let grouped = Compositor::new(&d).render(Some(LayerId(10))).unwrap();
        assert_eq!(alone, grouped);
    }

    #[test]
    fn group_opacity_applies_to_buffer() {
        let d = doc(vec![
            LayerNode::folder(LayerId(10), "group", vec![solid(2, 0, 0, 2, 2, RED)])
                .with_opacity(0.5),
            solid(1, 0, 0, 2, 2, BLUE),
        ]);
        let out = render_root(&d);
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 0, 128, 255]));
    }

    #[test]
    fn bounds_skip_hidden_subtrees_and_are_stable() {
        let d = doc(vec![
            LayerNode::folder(
                LayerId(10),
                "group",
                vec![
                    solid(2, 5, 5, 5, 5, RED),
                    LayerNode::folder(LayerId(11), "hidden", vec![solid(3, 50, 50, 5, 5, RED)])
                        .with_visible(false),
                ],
            ),
            solid(1, -2, 0, 3, 3, BLUE),
        ]);
        let compositor = Compositor::new(&d);
        let first = compositor.bounding_rect(None);
        assert_eq!(first, Rect::new(-2, 0, 12, 10));
        assert_eq!(compositor.bounding_rect(None), first);

        let group = d.find_by_id(LayerId(10)).unwrap();
        assert_eq!(compositor.bounding_rect(Some(group)), Rect::new(5, 5, 5, 5));
    }

    #[test]
    fn leaf_render_returns_resolved_pixels() {
        let d = doc(vec![solid(1, 40, 40, 3, 2, RED)]);
        let out = Compositor::new(&d).render(Some(LayerId(1))).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn unknown_id_is_reported() {
        let d = doc(Vec::new());
        let err = Compositor::new(&d).render(Some(LayerId(42))).unwrap_err();
        assert!(matches!(err, PsdwerkError::LayerNotFound(42)));
    }

    #[test]
    fn far_apart_layers_do_not_overflow() {
        let d = doc(vec![
            solid(1, -2_000_000_000, 0, 1, 1, RED),
            solid(2, 2_000_000_000, 0, 1, 1, BLUE),
        ]);
        let compositor = Compositor::new(&d);
        assert_eq!(compositor.bounding_rect(None).width, i32::MAX);
        let err = compositor.render(None).unwrap_err();
        assert!(matches!(err, PsdwerkError::ResourceExhausted { .. }));

        let group = LayerNode::folder(
            LayerId(9),
            "far",
            vec![solid(3, 2_000_000_000, 2_000_000_000, 2, 2, RED)],
        );
        let d = doc(vec![group]);
        let image = Compositor::new(&d).render(Some(LayerId(9))).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(*image.get_pixel(1, 1), RED);
    }

    #[test]
    fn oversized_canvas_is_resource_exhausted() {
        let err = allocate_canvas(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, PsdwerkError::ResourceExhausted { .. }));
    }
}
