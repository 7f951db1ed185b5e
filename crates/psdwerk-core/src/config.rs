// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Persistent service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// JPEG quality (1-100) for layer images requested as JPEG.
    pub jpeg_quality: u8,
    /// Suffix appended to the document path to name the export-hint sidecar.
    pub hint_sidecar_suffix: String,
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Image format used when a layer image request names none.
    pub default_image_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            hint_sidecar_suffix: ".hints.json".into(),
            log_filter: "info".into(),
            default_image_format: "png".into(),
        }
    }
}

impl ServiceConfig {
    /// Read a configuration file written by [`ServiceConfig::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Like [`ServiceConfig::load`], but falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
