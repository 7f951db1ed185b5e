// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exporter plugins — the seam through which a loaded document and its hints
// are turned into some target format. Concrete exporters live with the host.

use std::collections::BTreeMap;
use std::path::Path;

use psdwerk_core::error::{PsdwerkError, Result};
use psdwerk_document::LayerDocument;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::hints::HintStore;

/// Whether an exporter writes a directory tree or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Directory,
    File,
}

impl ExportType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

/// Options handed to an exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    pub font_scale_factor: f64,
    pub image_scaling: bool,
    pub make_compact: bool,
}

impl ExportOptions {
    /// Defaults for a document of the given size.
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font_scale_factor: 1.0,
            image_scaling: false,
            make_compact: false,
        }
    }

    /// Read options from a JSON object. Missing keys keep their defaults, and
    /// a non-positive `width`/`height` means the document size.
    pub fn from_json(value: &serde_json::Value, doc_width: u32, doc_height: u32) -> Self {
        let positive = |key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_i64)
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok())
        };
        let flag = |key: &str| value.get(key).and_then(serde_json::Value::as_bool).unwrap_or(false);

        Self {
            width: positive("width").unwrap_or(doc_width),
            height: positive("height").unwrap_or(doc_height),
            font_scale_factor: value
                .get("fontScaleFactor")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(1.0),
            image_scaling: flag("imageScaling"),
            make_compact: flag("makeCompact"),
        }
    }
}

/// An export back-end.
pub trait Exporter: Send + Sync {
    /// Stable lookup key (e.g. `"qtquick"`).
    fn key(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    fn export_type(&self) -> ExportType;

    /// Write `document` into `output_dir`, honouring `hints`.
    fn export_to(
        &self,
        document: &LayerDocument,
        hints: &HintStore,
        output_dir: &Path,
        options: &ExportOptions,
    ) -> Result<()>;
}

/// Exporters available to the service, ordered by key.
#[derive(Default)]
pub struct ExporterRegistry {
    exporters: BTreeMap<String, Box<dyn Exporter>>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exporter, replacing any previous one with the same key.
    pub fn register(&mut self, exporter: Box<dyn Exporter>) {
        info!(key = exporter.key(), name = exporter.name(), "exporter registered");
        self.exporters.insert(exporter.key().to_owned(), exporter);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Exporter> {
        self.exporters.get(key).map(|e| e.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Exporter> {
        self.exporters.values().map(|e| e.as_ref())
    }

    /// Run the exporter registered under `key`.
    ///
    /// The output directory is created when missing. Any exporter failure is
    /// reported as `ExportFailed`.
    #[instrument(skip(self, document, hints, output_dir, options), fields(output_dir = %output_dir.display()))]
    pub fn export(
        &self,
        key: &str,
        document: &LayerDocument,
        hints: &HintStore,
        output_dir: &Path,
        options: &ExportOptions,
    ) -> Result<()> {
        let exporter = self
            .get(key)
            .ok_or_else(|| PsdwerkError::UnknownExporter(key.to_owned()))?;

        if !output_dir.is_dir() {
            std::fs::create_dir_all(output_dir)
                .map_err(|_| PsdwerkError::CreateDirectory(output_dir.display().to_string()))?;
        }

        exporter
            .export_to(document, hints, output_dir, options)
            .map_err(|e| {
                error!(error = %e, "exporter failed");
                PsdwerkError::ExportFailed(e.to_string())
            })?;

        info!(width = options.width, height = options.height, "export complete");
        Ok(())
    }
}
