// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the psdwerk layer service.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stable identifier of a layer, unique within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl From<LayerId> for i64 {
    fn from(id: LayerId) -> Self {
        i64::from(id.0)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry -----------------------------------------------------------------

/// Integer pixel rectangle in document coordinates.
///
/// A rectangle with a non-positive width or height is empty. Empty rectangles
/// are the identity of [`Rect::united`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge. Widened so that edges past `i32::MAX` stay exact.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Width and height clamped to zero.
    pub fn size(&self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && i64::from(x) < self.right() && y >= self.y && i64::from(y) < self.bottom()
    }

    /// Smallest rectangle covering both. Empty operands are ignored.
    ///
    /// A union wider or taller than `i32::MAX` saturates at `i32::MAX`.
    pub fn united(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, saturating_extent(x, right), saturating_extent(y, bottom))
    }

    /// Overlap of both rectangles; empty when they do not touch.
    pub fn intersected(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= i64::from(x) || bottom <= i64::from(y) {
            return Rect::default();
        }
        Rect::new(x, y, saturating_extent(x, right), saturating_extent(y, bottom))
    }
}

fn saturating_extent(start: i32, end: i64) -> i32 {
    i32::try_from(end - i64::from(start)).unwrap_or(i32::MAX)
}

/// An opaque RGB color, reported as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase hex name, e.g. `#ff8000`.
    pub fn name(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// -- Blend modes --------------------------------------------------------------

/// Closed set of layer blend modes.
///
/// `PassThrough` is only meaningful on folders: the folder does not isolate its
/// children, who composite directly against whatever lies below the folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    Darken,
    Lighten,
    ColorBurn,
    ColorDodge,
    Difference,
    Exclusion,
    LinearDodge,
    LinearBurn,
    LinearLight,
    VividLight,
    PinLight,
    HardMix,
    Hue,
    Saturation,
    Color,
    Luminosity,
    PassThrough,
}

impl BlendMode {
    /// Map a four-character PSD blend key (e.g. `"mul "`, `"pass"`) to a mode.
    ///
    /// Keys outside the supported set resolve to `Normal` and are logged.
    pub fn from_key(key: &str) -> Self {
        match key {
            "norm" => Self::Normal,
            "mul " => Self::Multiply,
            "scrn" => Self::Screen,
            "over" => Self::Overlay,
            "sLit" => Self::SoftLight,
            "hLit" => Self::HardLight,
            "dark" => Self::Darken,
            "lite" => Self::Lighten,
            "idiv" => Self::ColorBurn,
            "div " => Self::ColorDodge,
            "diff" => Self::Difference,
            "smud" => Self::Exclusion,
            "lddg" => Self::LinearDodge,
            "lbrn" => Self::LinearBurn,
            "lLit" => Self::LinearLight,
            "vLit" => Self::VividLight,
            "pLit" => Self::PinLight,
            "hMix" => Self::HardMix,
            "hue " => Self::Hue,
            "sat " => Self::Saturation,
            "colr" => Self::Color,
            "lum " => Self::Luminosity,
            "pass" => Self::PassThrough,
            other => {
                warn!(key = other, "unsupported blend mode key, using normal");
                Self::Normal
            }
        }
    }

    /// Stable lower-camel name used in JSON replies.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::SoftLight => "softLight",
            Self::HardLight => "hardLight",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorBurn => "colorBurn",
            Self::ColorDodge => "colorDodge",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::LinearDodge => "linearDodge",
            Self::LinearBurn => "linearBurn",
            Self::LinearLight => "linearLight",
            Self::VividLight => "vividLight",
            Self::PinLight => "pinLight",
            Self::HardMix => "hardMix",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
            Self::PassThrough => "passThrough",
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough)
    }
}

// -- Kind-specific layer metadata ---------------------------------------------

/// One styled run of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextType {
    #[default]
    Point,
    Paragraph,
}

impl TextType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Paragraph => "paragraph",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextInfo {
    pub runs: Vec<TextRun>,
    pub text_type: TextType,
}

/// Geometry class of a vector shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PathType {
    #[default]
    None,
    Rectangle,
    RoundedRectangle { radius: f64 },
    Path,
}

impl PathType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rectangle => "rectangle",
            Self::RoundedRectangle { .. } => "roundedRectangle",
            Self::Path => "path",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeInfo {
    pub path_type: PathType,
    pub brush_color: Color,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Name of the linked (placed) file, if the layer is a smart object link.
    pub linked_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artboard {
    pub preset_name: String,
    pub background: Color,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub is_opened: bool,
    pub artboard: Option<Artboard>,
}

/// Layer kind with the metadata specific to that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerKind {
    Text(TextInfo),
    Shape(ShapeInfo),
    Image(ImageInfo),
    Folder(FolderInfo),
}

impl LayerKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// Short type name used in JSON replies.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
            Self::Image(_) => "image",
            Self::Folder(_) => "folder",
        }
    }
}
