//! Persisted map documents: JSON decode/encode and the post-load shape.
//!
//! A document stores only `mapName`, the ordered layers, and per module the
//! `moduleKey`, position, rotation and mirror. No pixel data, archetype
//! dimensions or transient session flags ever land on disk. Freshly decoded
//! instances are unresolved until [`crate::Map::link_archetypes`] runs.

use crate::error::MapError;
use crate::geom::TilePoint;
use crate::layer::Layer;
use crate::map::Map;
use crate::module::ModuleInstance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonModule {
    module_key: String,
    #[serde(default)]
    position: TilePoint,
    #[serde(default)]
    rotation: i32,
    #[serde(default)]
    mirror: i32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(default = "default_true")]
    is_visible: bool,
    #[serde(default = "default_true")]
    show_shadows: bool,
    #[serde(default)]
    modules: Vec<JsonModule>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonMapDoc {
    #[serde(default)]
    map_name: String,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

fn doc_to_map(doc: JsonMapDoc) -> Result<Map, MapError> {
    let mut layers = Vec::with_capacity(doc.layers.len());
    for jl in doc.layers {
        let mut layer = Layer::new(jl.name);
        layer.visible = jl.is_visible;
        layer.show_shadows = jl.show_shadows;
        for jm in jl.modules {
            if jm.module_key.is_empty() {
                return Err(MapError::InvalidDocument(format!(
                    "layer {:?}: module entry with empty moduleKey",
                    layer.name
                )));
            }
            // out-of-range rotation/mirror canonicalize here
            layer.add_module(ModuleInstance::unresolved(
                jm.module_key,
                jm.position,
                jm.rotation,
                jm.mirror,
            ));
        }
        layers.push(layer);
    }
    Ok(Map::from_layers(doc.map_name, layers))
}

fn map_to_doc(map: &Map) -> JsonMapDoc {
    JsonMapDoc {
        map_name: map.name.clone(),
        layers: map
            .layers()
            .iter()
            .map(|layer| JsonLayer {
                name: layer.name.clone(),
                is_visible: layer.visible,
                show_shadows: layer.show_shadows,
                modules: layer
                    .modules()
                    .iter()
                    .map(|m| JsonModule {
                        module_key: m.module_key().to_owned(),
                        position: m.position(),
                        rotation: m.rotation().quarter_turns() as i32,
                        mirror: m.mirror().index() as i32,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Decodes a map document from a JSON string.
pub fn decode_map_str(json: &str) -> Result<Map, MapError> {
    let doc: JsonMapDoc = serde_json::from_str(json).map_err(|source| MapError::Json {
        path: PathBuf::from("<string>"),
        source,
    })?;
    doc_to_map(doc)
}

/// Reads and decodes a map document file. JSON only.
pub fn decode_map_file(path: &Path) -> Result<Map, MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: JsonMapDoc = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut map = doc_to_map(doc)?;
    map.source_path = Some(path.to_path_buf());
    Ok(map)
}

/// Encodes a map to the persisted document form.
pub fn encode_map_string(map: &Map) -> Result<String, MapError> {
    serde_json::to_string_pretty(&map_to_doc(map)).map_err(|source| MapError::Json {
        path: map.source_path.clone().unwrap_or_else(|| PathBuf::from("<string>")),
        source,
    })
}

/// Encodes and writes a map document file. JSON only.
pub fn encode_map_file(map: &Map, path: &Path) -> Result<(), MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }
    let txt = encode_map_string(map)?;
    std::fs::write(path, txt).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}
