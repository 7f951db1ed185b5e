// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The eight document tools and their JSON replies.
//
// Every tool returns `Result<Value>`; `ToolServer::call` is the only place
// where errors are folded into `{"error": "..."}` replies.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use psdwerk_core::error::{PsdwerkError, Result};
use psdwerk_core::{LayerId, LayerKind, PathType, ServiceConfig};
use psdwerk_document::{Compositor, EncodedFormat, LayerDocument, LayerNode, LayerTree};
use psdwerk_export::{ExportHint, ExportOptions, Exporter, ExporterRegistry, HintStore, HintType, NativeElement};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::loader::DocumentLoader;

/// The currently loaded document and its hints.
struct Session {
    path: PathBuf,
    document: LayerDocument,
    hints: HintStore,
}

/// Serves tool calls against at most one loaded document.
pub struct ToolServer<L: DocumentLoader> {
    config: ServiceConfig,
    loader: L,
    exporters: ExporterRegistry,
    session: Option<Session>,
}

impl<L: DocumentLoader> ToolServer<L> {
    pub fn new(config: ServiceConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            exporters: ExporterRegistry::new(),
            session: None,
        }
    }

    pub fn register_exporter(&mut self, exporter: Box<dyn Exporter>) {
        self.exporters.register(exporter);
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// See [`crate::describe::tool_descriptions`].
    pub fn tool_descriptions() -> BTreeMap<&'static str, &'static str> {
        crate::describe::tool_descriptions()
    }

    /// Dispatch `tool` with named `args` and return the compact JSON reply.
    #[instrument(skip(self, args))]
    pub fn call(&mut self, tool: &str, args: &Value) -> String {
        let reply = match tool {
            "load_psd" => str_arg(args, "path").and_then(|p| self.load_psd(Path::new(p))),
            "get_layer_tree" => self.get_layer_tree(),
            "get_layer_details" => self.layer_arg(args).and_then(|id| self.get_layer_details(id)),
            "set_export_hint" => self.layer_arg(args).and_then(|id| {
                let hint_type = str_arg(args, "type")?;
                let options = opt_str_arg(args, "options")?.unwrap_or("{}");
                self.set_export_hint(id, hint_type, options)
            }),
            "do_export" => str_arg(args, "format").and_then(|format| {
                let output_dir = str_arg(args, "outputDir")?;
                let options = opt_str_arg(args, "options")?.unwrap_or("{}");
                self.do_export(format, Path::new(output_dir), options)
            }),
            "list_exporters" => Ok(self.list_exporters()),
            "save_hints" => self.save_hints(),
            "get_layer_image" => self.layer_arg(args).and_then(|id| {
                let format = opt_str_arg(args, "format")?;
                self.get_layer_image(id, format)
            }),
            _ => Err(PsdwerkError::InvalidArgument(format!("unknown tool `{tool}`"))),
        };

        let value = reply.unwrap_or_else(|e| {
            debug!(error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        });
        value.to_string()
    }

    /// Load a document, replacing the current one.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn load_psd(&mut self, path: &Path) -> Result<Value> {
        self.session = None;
        let document = self.loader.load(path)?;

        let hints = HintStore::load(path, &self.config.hint_sidecar_suffix).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable hint sidecar");
            HintStore::new()
        });

        let reply = json!({
            "file": document.file_name,
            "width": document.width,
            "height": document.height,
            "layerCount": document.count_all(),
        });
        info!(layers = document.count_all(), hints = hints.len(), "document loaded");

        self.session = Some(Session {
            path: path.to_path_buf(),
            document,
            hints,
        });
        Ok(reply)
    }

    pub fn get_layer_tree(&self) -> Result<Value> {
        let session = self.session()?;
        Ok(json!({
            "file": session.document.file_name,
            "layers": tree_entries(&session.document, &session.hints, None),
        }))
    }

    pub fn get_layer_details(&self, id: LayerId) -> Result<Value> {
        let session = self.session()?;
        let node = session
            .document
            .find_by_id(id)
            .ok_or(PsdwerkError::LayerNotFound(id.into()))?;

        let mut details = Map::new();
        details.insert("layerId".into(), json!(node.id));
        details.insert("name".into(), json!(node.name));
        details.insert(
            "rect".into(),
            json!({
                "x": node.rect.x,
                "y": node.rect.y,
                "width": node.rect.width,
                "height": node.rect.height,
            }),
        );
        details.insert("opacity".into(), json!(node.opacity));
        details.insert("fillOpacity".into(), json!(node.fill_opacity));
        details.insert("blendMode".into(), json!(node.blend_mode.name()));
        details.insert("type".into(), json!(node.kind.name()));
        insert_kind_fields(&mut details, node);
        details.insert("exportHint".into(), hint_details(&session.hints.get(id)));

        Ok(Value::Object(details))
    }

    /// Update the hint of a layer. `options` is a JSON object string; a
    /// malformed one is treated as empty.
    #[instrument(skip(self, options))]
    pub fn set_export_hint(&mut self, id: LayerId, hint_type: &str, options: &str) -> Result<Value> {
        let session = self.session.as_mut().ok_or(PsdwerkError::NoDocument)?;
        if session.document.find_by_id(id).is_none() {
            return Err(PsdwerkError::LayerNotFound(id.into()));
        }
        let hint_type = HintType::parse(hint_type)?;
        let options = parse_options(options);

        let mut hint = session.hints.get(id);
        hint.hint_type = hint_type;
        if let Some(visible) = options.get("visible") {
            hint.visible = visible.as_bool().unwrap_or(false);
        }
        if let Some(name) = non_empty_str(&options, "componentName") {
            hint.component_name = name.to_owned();
        }
        if let Some(name) = non_empty_str(&options, "baseElement") {
            hint.base_element = NativeElement::from_name(name);
        }
        if let Some(props) = options.get("properties").and_then(Value::as_array) {
            hint.properties = props
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect();
        }

        let reply = json!({
            "layerId": id,
            "type": hint.hint_type.name(),
            "componentName": hint.component_name,
            "baseElement": hint.base_element.name(),
            "visible": hint.visible,
            "properties": hint.properties,
        });
        session.hints.set(id, hint);
        Ok(reply)
    }

    #[instrument(skip(self, output_dir, options), fields(output_dir = %output_dir.display()))]
    pub fn do_export(&self, format: &str, output_dir: &Path, options: &str) -> Result<Value> {
        let session = self.session()?;
        let options = ExportOptions::from_json(
            &parse_options(options),
            session.document.width,
            session.document.height,
        );

        self.exporters
            .export(format, &session.document, &session.hints, output_dir, &options)?;

        Ok(json!({
            "format": format,
            "outputDir": output_dir.display().to_string(),
            "width": options.width,
            "height": options.height,
        }))
    }

    pub fn list_exporters(&self) -> Value {
        let exporters: Vec<Value> = self
            .exporters
            .iter()
            .map(|e| {
                json!({
                    "key": e.key(),
                    "name": e.name(),
                    "type": e.export_type().name(),
                })
            })
            .collect();
        json!({ "exporters": exporters })
    }

    pub fn save_hints(&self) -> Result<Value> {
        let session = self.session()?;
        session
            .hints
            .save(&session.path, &self.config.hint_sidecar_suffix)?;
        Ok(json!({ "saved": true }))
    }

    /// Render a layer (or a folder's composite) and return it base64-encoded.
    ///
    /// An unknown layer is reported first, then an empty render, then an
    /// unsupported format.
    #[instrument(skip(self))]
    pub fn get_layer_image(&self, id: LayerId, format: Option<&str>) -> Result<Value> {
        let session = self.session()?;
        let image = Compositor::new(&session.document).render(Some(id))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PsdwerkError::NoImageData(id));
        }

        let format_name = format.unwrap_or(self.config.default_image_format.as_str());
        let format = EncodedFormat::parse(format_name)?;
        let bytes = format.encode(&image, self.config.jpeg_quality)?;
        debug!(bytes = bytes.len(), "layer image encoded");

        Ok(json!({
            "layerId": id,
            "width": image.width(),
            "height": image.height(),
            "format": format_name.to_lowercase(),
            "mimeType": format.mime_type(),
            "data": BASE64.encode(&bytes),
        }))
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(PsdwerkError::NoDocument)
    }

    /// Read `layerId`. A missing document is reported before an id that
    /// cannot name any layer, such as a negative one.
    fn layer_arg(&self, args: &Value) -> Result<LayerId> {
        let raw = args
            .get("layerId")
            .and_then(Value::as_i64)
            .ok_or_else(|| PsdwerkError::InvalidArgument("missing integer argument `layerId`".into()))?;
        self.session()?;
        u32::try_from(raw)
            .map(LayerId)
            .map_err(|_| PsdwerkError::LayerNotFound(raw))
    }
}

fn tree_entries(document: &LayerDocument, hints: &HintStore, parent: Option<&LayerNode>) -> Vec<Value> {
    (0..document.row_count(parent))
        .filter_map(|row| document.child(parent, row))
        .map(|node| {
            let hint = hints.get(node.id);
            let mut entry = Map::new();
            entry.insert("layerId".into(), json!(node.id));
            entry.insert("name".into(), json!(node.name));
            entry.insert("type".into(), json!(node.kind.name()));
            entry.insert("hintType".into(), json!(hint.hint_type.name()));
            entry.insert("visible".into(), json!(hint.visible));
            if !hint.properties.is_empty() {
                entry.insert("properties".into(), json!(hint.properties));
            }
            if document.row_count(Some(node)) > 0 {
                entry.insert("children".into(), json!(tree_entries(document, hints, Some(node))));
            }
            Value::Object(entry)
        })
        .collect()
}

fn insert_kind_fields(details: &mut Map<String, Value>, node: &LayerNode) {
    match &node.kind {
        LayerKind::Text(text) => {
            let runs: Vec<Value> = text
                .runs
                .iter()
                .map(|run| {
                    json!({
                        "text": run.text,
                        "font": run.font_family,
                        "fontSize": run.font_size,
                        "color": run.color.name(),
                    })
                })
                .collect();
            details.insert("runs".into(), json!(runs));
            details.insert("textType".into(), json!(text.text_type.name()));
        }
        LayerKind::Shape(shape) => {
            details.insert("pathType".into(), json!(shape.path_type.name()));
            if let PathType::RoundedRectangle { radius } = shape.path_type {
                details.insert("cornerRadius".into(), json!(radius));
            }
            details.insert("brushColor".into(), json!(shape.brush_color.name()));
        }
        LayerKind::Image(image) => {
            if let Some(linked) = &image.linked_file {
                details.insert("linkedFile".into(), json!(linked));
            }
        }
        LayerKind::Folder(folder) => {
            details.insert("isOpened".into(), json!(folder.is_opened));
            if let Some(artboard) = &folder.artboard {
                details.insert(
                    "artboard".into(),
                    json!({
                        "presetName": artboard.preset_name,
                        "background": artboard.background.name(),
                    }),
                );
            }
            details.insert("childCount".into(), json!(node.children.len()));
        }
    }
}

fn hint_details(hint: &ExportHint) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(hint.hint_type.name()));
    if !hint.id.is_empty() {
        out.insert("id".into(), json!(hint.id));
    }
    if !hint.component_name.is_empty() {
        out.insert("componentName".into(), json!(hint.component_name));
    }
    if hint.hint_type == HintType::Native {
        out.insert("baseElement".into(), json!(hint.base_element.name()));
    }
    out.insert("visible".into(), json!(hint.visible));
    if !hint.properties.is_empty() {
        out.insert("properties".into(), json!(hint.properties));
    }
    Value::Object(out)
}

fn parse_options(options: &str) -> Value {
    match serde_json::from_str::<Value>(options) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            if !options.trim().is_empty() {
                warn!("options are not a JSON object; using defaults");
            }
            Value::Object(Map::new())
        }
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| PsdwerkError::InvalidArgument(format!("missing string argument `{name}`")))
}

fn opt_str_arg<'a>(args: &'a Value, name: &str) -> Result<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PsdwerkError::InvalidArgument(format!("`{name}` must be a string"))),
    }
}
