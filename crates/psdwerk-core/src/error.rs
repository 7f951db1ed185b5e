// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for psdwerk.
//
// The `Display` text of each variant is what the tool surface reports back in
// its `{"error": ...}` replies, so keep the wording user-facing.

use thiserror::Error;

use crate::types::LayerId;

/// Top-level error type for all psdwerk operations.
#[derive(Debug, Error)]
pub enum PsdwerkError {
    // -- Document errors --
    #[error("No PSD file loaded")]
    NoDocument,

    #[error("failed to load document: {0}")]
    Load(String),

    /// The id as the caller gave it, which may lie outside the `LayerId` range.
    #[error("Layer {0} not found")]
    LayerNotFound(i64),

    #[error("Layer {0} has no image data")]
    NoImageData(LayerId),

    // -- Rendering --
    #[error("cannot allocate a {width}x{height} pixel buffer")]
    ResourceExhausted { width: u32, height: u32 },

    #[error("Unsupported format: {0}. Use: png, jpeg")]
    UnsupportedFormat(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Export --
    #[error("Unknown type: {0}. Use: embed, merge, custom, native, skip, none")]
    UnknownHintType(String),

    #[error("Unknown exporter: {0}")]
    UnknownExporter(String),

    #[error("Cannot create directory: {0}")]
    CreateDirectory(String),

    #[error("Export failed")]
    ExportFailed(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Tool surface --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PsdwerkError>;
