// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// psdwerk-document — Layer documents and the layer composition engine.
//
// Provides a read-only view over a loaded layer tree, per-layer mask
// resolution (transparency mask, raster layer mask), blend-mode operators, a
// recursive folder compositor with pass-through semantics, and PNG/JPEG
// encoding of rendered images.

pub mod blend;
pub mod compose;
pub mod encode;
pub mod layer;
pub mod mask;
pub mod painter;
pub mod tree;

// Re-export the primary types so callers can use `psdwerk_document::Compositor` etc.
pub use compose::Compositor;
pub use encode::EncodedFormat;
pub use layer::{LayerDocument, LayerMask, LayerNode};
pub use tree::LayerTree;
