// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// psdwerk-server — Tool-call surface over a loaded layered document.
//
// Each tool takes named JSON arguments and answers with a compact JSON
// object; failures are answered as `{"error": "..."}`. The transport that
// carries these calls is up to the host.

pub mod describe;
pub mod loader;
pub mod logging;
pub mod tools;

pub use loader::DocumentLoader;
pub use tools::ToolServer;
