//! Module archetypes and the read-only catalog that owns them.
//!
//! Archetypes are loaded once by the asset collaborator and outlive any
//! number of map sessions; the core only ever reads them. Visual variants
//! (one per orientation index) are the renderer's business and opaque here.

use indexmap::IndexMap;
use std::sync::Arc;

/// Immutable shape and identity of a placeable piece.
///
/// `width`/`height` describe the footprint at rotation 0 and are both >= 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleArchetype {
    /// Stable, globally unique key used for persistence.
    pub key: String,
    /// Footprint width in tiles at rotation 0.
    pub width: i32,
    /// Footprint height in tiles at rotation 0.
    pub height: i32,
}

impl ModuleArchetype {
    /// Builds an archetype, clamping degenerate dimensions up to 1x1.
    pub fn new(key: impl Into<String>, width: i32, height: i32) -> Self {
        ModuleArchetype {
            key: key.into(),
            width: width.max(1),
            height: height.max(1),
        }
    }
}

/// Mapping from stable key to shared archetype, in load order.
///
/// Insertion order is kept so catalog listings and post-load link reports
/// stay deterministic.
#[derive(Debug, Default, Clone)]
pub struct ArchetypeCatalog {
    entries: IndexMap<String, Arc<ModuleArchetype>>,
}

impl ArchetypeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        ArchetypeCatalog {
            entries: IndexMap::new(),
        }
    }

    /// Registers an archetype, replacing any previous entry with the same key.
    pub fn insert(&mut self, archetype: ModuleArchetype) -> Arc<ModuleArchetype> {
        let shared = Arc::new(archetype);
        self.entries.insert(shared.key.clone(), Arc::clone(&shared));
        shared
    }

    /// Looks up an archetype by its stable key.
    pub fn get(&self, key: &str) -> Option<&Arc<ModuleArchetype>> {
        self.entries.get(key)
    }

    /// Number of registered archetypes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Archetypes in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModuleArchetype>> {
        self.entries.values()
    }
}
