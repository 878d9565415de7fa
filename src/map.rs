//! The map: an ordered, never-empty stack of layers plus metadata.

use crate::archetype::ArchetypeCatalog;
use crate::geom::TilePoint;
use crate::layer::Layer;
use crate::loader::json_loader;
use anyhow::Context;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name given to the layer a fresh or cleared map starts with.
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// A floor-plan map: ordered layers, a display name and, once saved, the
/// path it came from.
///
/// A map always contains at least one layer; `new`, `clear` and
/// `remove_layer` all uphold that.
#[derive(Debug, Clone)]
pub struct Map {
    /// Display name, serialized as `mapName`.
    pub name: String,
    /// Where the map was last loaded from or saved to; `None` until then.
    pub source_path: Option<PathBuf>,
    layers: Vec<Layer>,
}

impl Map {
    /// An empty map with one default layer.
    pub fn new(name: impl Into<String>) -> Self {
        Map {
            name: name.into(),
            source_path: None,
            layers: vec![Layer::new(DEFAULT_LAYER_NAME)],
        }
    }

    /// Builds a map from pre-assembled layers. An empty list still yields
    /// one default layer.
    pub fn from_layers(name: impl Into<String>, layers: Vec<Layer>) -> Self {
        let mut map = Map {
            name: name.into(),
            source_path: None,
            layers,
        };
        if map.layers.is_empty() {
            map.layers.push(Layer::new(DEFAULT_LAYER_NAME));
        }
        map
    }

    /// The layers in draw order.
    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The layer at `idx`, if any.
    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// Mutable access to the layer at `idx`.
    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    /// How many layers the map has (always >= 1).
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Appends a layer, returning its index.
    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Removes the layer at `idx`, unless it is the last one left.
    ///
    /// Maps are never empty; asking to remove the final layer is a logged
    /// no-op returning `None`.
    pub fn remove_layer(&mut self, idx: usize) -> Option<Layer> {
        if idx >= self.layers.len() {
            return None;
        }
        if self.layers.len() == 1 {
            warn!("map {:?}: refusing to remove the last layer", self.name);
            return None;
        }
        Some(self.layers.remove(idx))
    }

    /// Drops everything, leaving a single empty default layer. The map name
    /// and source path are kept.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.layers.push(Layer::new(DEFAULT_LAYER_NAME));
    }

    /// Total number of module instances across all layers.
    pub fn module_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Cross-layer pick: the topmost instance containing `p`, searching
    /// layers from last (drawn on top) to first.
    ///
    /// Placement legality never consults other layers; this lookup exists
    /// for pickers and inspectors only.
    pub fn module_at(&self, p: TilePoint) -> Option<(usize, usize)> {
        for (li, layer) in self.layers.iter().enumerate().rev() {
            if let Some(mi) = layer.module_at(p) {
                return Some((li, mi));
            }
        }
        None
    }

    /// Resolves every instance's `moduleKey` against `catalog`.
    ///
    /// Keys missing from the catalog are collected (first occurrence order,
    /// deduped) and returned; their instances stay unlinked and inert
    /// rather than failing the load.
    pub fn link_archetypes(&mut self, catalog: &ArchetypeCatalog) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        let mut linked = 0usize;
        for layer in &mut self.layers {
            for m in layer.modules_mut() {
                if m.is_resolved() {
                    continue;
                }
                match catalog.get(m.module_key()) {
                    Some(archetype) => {
                        m.resolve(Arc::clone(archetype));
                        linked += 1;
                    }
                    None => {
                        if !missing.iter().any(|k| k == m.module_key()) {
                            missing.push(m.module_key().to_owned());
                        }
                    }
                }
            }
        }
        debug!(
            "map {:?}: linked {} instances, {} unresolved keys",
            self.name,
            linked,
            missing.len()
        );
        if !missing.is_empty() {
            warn!("map {:?}: unresolved archetype keys {:?}", self.name, missing);
        }
        missing
    }

    /// Loads a persisted map document. Instances come back unresolved;
    /// link them with [`Map::link_archetypes`] before they participate in
    /// occupancy or rendering.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        json_loader::decode_map_file(path)
            .with_context(|| format!("Loading map file {}", path.display()))
    }

    /// Decodes a map document from a JSON string.
    pub fn load_str(json: &str) -> anyhow::Result<Self> {
        Ok(json_loader::decode_map_str(json).context("Parsing map document")?)
    }

    /// Writes the persisted document form and remembers `path` as the
    /// map's source.
    pub fn save(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        json_loader::encode_map_file(self, path)
            .with_context(|| format!("Saving map file {}", path.display()))?;
        self.source_path = Some(path.to_path_buf());
        Ok(())
    }

    /// The persisted document form as a JSON string.
    pub fn to_document_string(&self) -> anyhow::Result<String> {
        Ok(json_loader::encode_map_string(self).context("Serializing map document")?)
    }

    /// Drains the geometry-dirty flags of every instance on every layer;
    /// true if anything moved, rotated or mirrored since the last poll.
    pub fn take_geometry_dirty(&mut self) -> bool {
        let mut any = false;
        for layer in &mut self.layers {
            any |= layer.take_geometry_dirty();
        }
        any
    }
}

impl Default for Map {
    fn default() -> Self {
        Map::new("")
    }
}
