// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export hints — per-layer export policy and its JSON sidecar.
//
// Sidecar layout (`<document><suffix>`, pretty JSON):
//   {
//     "source":     "<document path>",
//     "sourceHash": "<sha-256 hex of the document, if it was readable>",
//     "savedAt":    "<RFC 3339 timestamp>",
//     "hints":      { "<layer id>": { ...ExportHint... } }
//   }

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use psdwerk_core::LayerId;
use psdwerk_core::error::{PsdwerkError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::integrity::{hash_file, verify_hash};

/// How an exporter should treat a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintType {
    /// Export the layer as part of its parent.
    #[default]
    Embed,
    /// Flatten the layer (and its children) into a single image.
    Merge,
    /// Export as a reusable custom component.
    Custom,
    /// Map onto a native element of the target toolkit.
    Native,
    /// Leave the layer out of the export.
    Skip,
    None,
}

impl HintType {
    /// Parse a hint type name, ignoring case.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "embed" => Ok(Self::Embed),
            "merge" => Ok(Self::Merge),
            "custom" => Ok(Self::Custom),
            "native" => Ok(Self::Native),
            "skip" => Ok(Self::Skip),
            "none" => Ok(Self::None),
            _ => Err(PsdwerkError::UnknownHintType(name.to_owned())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::Merge => "merge",
            Self::Custom => "custom",
            Self::Native => "native",
            Self::Skip => "skip",
            Self::None => "none",
        }
    }
}

/// Native element a `Native` hint maps a layer onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NativeElement {
    #[default]
    Container,
    TouchArea,
    Button,
    #[serde(rename = "Button_Highlighted")]
    ButtonHighlighted,
}

impl NativeElement {
    /// Look up an element by name; unknown names map to `Container`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "TouchArea" => Self::TouchArea,
            "Button" => Self::Button,
            "Button_Highlighted" => Self::ButtonHighlighted,
            _ => Self::Container,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Container => "Container",
            Self::TouchArea => "TouchArea",
            Self::Button => "Button",
            Self::ButtonHighlighted => "Button_Highlighted",
        }
    }
}

/// Export policy for a single layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportHint {
    #[serde(rename = "type")]
    pub hint_type: HintType,
    /// Identifier exporters use to name the generated element.
    pub id: String,
    /// Component name for `Custom` hints.
    pub component_name: String,
    /// Target element for `Native` hints.
    pub base_element: NativeElement,
    pub visible: bool,
    /// Attributes exported as bindable properties (e.g. `visible`, `color`,
    /// `position`, `text`, `size`, `image`).
    pub properties: BTreeSet<String>,
}

impl Default for ExportHint {
    fn default() -> Self {
        Self {
            hint_type: HintType::Embed,
            id: String::new(),
            component_name: String::new(),
            base_element: NativeElement::Container,
            visible: true,
            properties: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sidecar {
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_hash: Option<String>,
    saved_at: DateTime<Utc>,
    hints: BTreeMap<LayerId, ExportHint>,
}

/// Export hints of one document, keyed by layer id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintStore {
    hints: BTreeMap<LayerId, ExportHint>,
}

impl HintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hint for `id`, or the default hint if none was set.
    pub fn get(&self, id: LayerId) -> ExportHint {
        self.hints.get(&id).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, id: LayerId, hint: ExportHint) {
        self.hints.insert(id, hint);
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Path of the sidecar belonging to `document`.
    pub fn sidecar_path(document: impl AsRef<Path>, suffix: &str) -> PathBuf {
        let mut name = document.as_ref().as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Load the sidecar of `document`. A missing sidecar yields an empty store.
    ///
    /// A sidecar written for a different revision of the document is still
    /// applied; the mismatch is only logged.
    #[instrument(skip_all, fields(document = %document.as_ref().display()))]
    pub fn load(document: impl AsRef<Path>, suffix: &str) -> Result<Self> {
        let path = Self::sidecar_path(document.as_ref(), suffix);
        if !path.exists() {
            debug!(sidecar = %path.display(), "no hint sidecar");
            return Ok(Self::new());
        }

        let data = std::fs::read_to_string(&path)?;
        let sidecar: Sidecar = serde_json::from_str(&data)?;

        if let Some(expected) = sidecar.source_hash.as_deref() {
            match std::fs::read(document.as_ref()) {
                Ok(bytes) => {
                    if let Err(e) = verify_hash(&bytes, expected) {
                        warn!(error = %e, "hint sidecar was written for a different revision");
                    }
                }
                Err(e) => warn!(error = %e, "cannot fingerprint document"),
            }
        }

        info!(count = sidecar.hints.len(), "export hints loaded");
        Ok(Self {
            hints: sidecar.hints,
        })
    }

    /// Write all hints to the sidecar of `document`, returning its path.
    #[instrument(skip_all, fields(document = %document.as_ref().display()))]
    pub fn save(&self, document: impl AsRef<Path>, suffix: &str) -> Result<PathBuf> {
        let document = document.as_ref();
        let source_hash = match hash_file(document) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "saving hints without a document fingerprint");
                None
            }
        };

        let sidecar = Sidecar {
            source: document.display().to_string(),
            source_hash,
            saved_at: Utc::now(),
            hints: self.hints.clone(),
        };
        let path = Self::sidecar_path(document, suffix);
        std::fs::write(&path, serde_json::to_string_pretty(&sidecar)?)?;

        info!(sidecar = %path.display(), count = self.hints.len(), "export hints saved");
        Ok(path)
    }
}
