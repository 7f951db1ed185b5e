// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layer records and the document that owns them.
//
// Documents are produced by an external loader (PSD parsing lives outside this
// workspace). Everything here is plain owned data; the compositor only ever
// borrows it.

use image::{DynamicImage, GrayImage};
use psdwerk_core::{BlendMode, FolderInfo, ImageInfo, LayerId, LayerKind, Rect};

/// Raster layer mask with its own placement and an out-of-bounds fill value.
#[derive(Debug, Clone)]
pub struct LayerMask {
    /// 8-bit coverage (0 = hidden, 255 = shown).
    pub image: GrayImage,
    /// Placement of `image` in document coordinates.
    pub rect: Rect,
    /// Coverage used for layer pixels outside `rect`.
    pub default_color: u8,
}

/// A single node in a document's layer tree.
///
/// Children are ordered top-first: index 0 is drawn last, over its siblings.
#[derive(Debug, Clone)]
pub struct LayerNode {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub visible: bool,
    /// Pixel rectangle of `image` in document coordinates.
    pub rect: Rect,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f32,
    pub blend_mode: BlendMode,
    /// Source pixels sized to `rect`; `None` for folders.
    pub image: Option<DynamicImage>,
    /// Coverage map aligned with `rect`, used when `image` has no alpha.
    pub transparency_mask: Option<GrayImage>,
    pub layer_mask: Option<LayerMask>,
    pub children: Vec<LayerNode>,
}

impl LayerNode {
    pub fn new(id: LayerId, name: impl Into<String>, kind: LayerKind, rect: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            visible: true,
            rect,
            opacity: 1.0,
            fill_opacity: 1.0,
            blend_mode: BlendMode::Normal,
            image: None,
            transparency_mask: None,
            layer_mask: None,
            children: Vec::new(),
        }
    }

    /// A folder holding `children` (top-first).
    pub fn folder(id: LayerId, name: impl Into<String>, children: Vec<LayerNode>) -> Self {
        let mut node = Self::new(id, name, LayerKind::Folder(FolderInfo::default()), Rect::default());
        node.children = children;
        node
    }

    /// A pixel layer whose image is placed at `(x, y)`.
    pub fn image_layer(id: LayerId, name: impl Into<String>, x: i32, y: i32, image: DynamicImage) -> Self {
        let rect = Rect::new(x, y, image.width() as i32, image.height() as i32);
        let mut node = Self::new(id, name, LayerKind::Image(ImageInfo::default()), rect);
        node.image = Some(image);
        node
    }

    pub fn with_kind(mut self, kind: LayerKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_fill_opacity(mut self, fill_opacity: f32) -> Self {
        self.fill_opacity = fill_opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_transparency_mask(mut self, mask: GrayImage) -> Self {
        self.transparency_mask = Some(mask);
        self
    }

    pub fn with_layer_mask(mut self, image: GrayImage, rect: Rect, default_color: u8) -> Self {
        self.layer_mask = Some(LayerMask {
            image,
            rect,
            default_color,
        });
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}

/// A loaded layered document.
#[derive(Debug, Clone, Default)]
pub struct LayerDocument {
    /// Path or name the document was loaded from.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Top-level layers, top-first.
    pub layers: Vec<LayerNode>,
}

impl LayerDocument {
    pub fn new(file_name: impl Into<String>, width: u32, height: u32, layers: Vec<LayerNode>) -> Self {
        Self {
            file_name: file_name.into(),
            width,
            height,
            layers,
        }
    }
}
