// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// psdwerk-export — How layers should be exported, and who exports them.
//
// Export hints record a per-layer export policy and persist next to the
// document in a JSON sidecar fingerprinted with the document's SHA-256.
// Exporter plugins are supplied by the host and looked up by key.

pub mod exporter;
pub mod hints;
pub mod integrity;

pub use exporter::{ExportOptions, ExportType, Exporter, ExporterRegistry};
pub use hints::{ExportHint, HintStore, HintType, NativeElement};
pub use integrity::{hash_bytes, hash_file, verify_hash};
