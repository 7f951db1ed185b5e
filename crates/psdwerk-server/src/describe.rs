// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool and argument descriptions advertised to clients.

use std::collections::BTreeMap;

/// Descriptions keyed by `tool` and `tool/argument`.
pub fn tool_descriptions() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("load_psd", "Load a PSD file for inspection and export"),
        ("load_psd/path", "Absolute path to the PSD file"),
        ("get_layer_tree", "Get the layer tree structure of the loaded PSD file"),
        ("get_layer_details", "Get detailed information about a specific layer"),
        ("get_layer_details/layerId", "Layer ID to inspect"),
        ("set_export_hint", "Configure how a layer should be exported"),
        ("set_export_hint/layerId", "Layer ID to configure"),
        (
            "set_export_hint/type",
            "Export type: embed, merge, custom, native, skip, or none",
        ),
        (
            "set_export_hint/options",
            "JSON object with optional keys: visible (bool), componentName (string, for custom type), \
             baseElement (string: Container, TouchArea, Button, Button_Highlighted, for native type), \
             properties (array of strings: visible, color, position, text, size, image; controls which \
             attributes are exported as bindable properties)",
        ),
        ("do_export", "Export the loaded PSD to a target format and directory"),
        (
            "do_export/format",
            "Exporter plugin key (use list_exporters to see available ones)",
        ),
        ("do_export/outputDir", "Absolute path to the output directory"),
        (
            "do_export/options",
            "JSON object with optional keys: width (int), height (int), fontScaleFactor (double), \
             imageScaling (bool), makeCompact (bool). Width/height 0 or omitted = original size",
        ),
        ("list_exporters", "List all available exporter plugins"),
        ("save_hints", "Persist current export hints to the PSD sidecar file"),
        (
            "get_layer_image",
            "Get the rendered image of a specific layer as base64-encoded data",
        ),
        ("get_layer_image/layerId", "Layer ID to get the image from"),
        ("get_layer_image/format", "Image format: png (default) or jpeg"),
    ])
}
