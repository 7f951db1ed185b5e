// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loading seam. Parsing layered files is the host's job; the tool
// server only needs something that turns a path into a `LayerDocument`.

use std::path::Path;

use psdwerk_core::error::Result;
use psdwerk_document::LayerDocument;

/// Turns a file path into a loaded layer document.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<LayerDocument>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&Path) -> Result<LayerDocument>,
{
    fn load(&self, path: &Path) -> Result<LayerDocument> {
        self(path)
    }
}
