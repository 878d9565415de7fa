//! Layers: ordered module lists plus the chunk-bucketed occupancy index.
//!
//! Module order inside a layer has no geometric meaning, but it defines
//! z-order for rendering and the tie-break order for occupancy queries.

use crate::geom::{TilePoint, TileRect};
use crate::module::ModuleInstance;
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;

/// Edge length of one occupancy bucket, in tiles.
pub const CHUNK_SIZE: i32 = 16;

/// Buckets kept around the viewport when culling, so pieces straddling the
/// edge are not dropped.
const CULL_MARGIN_CHUNKS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ChunkCoord {
    x: i32,
    y: i32,
}

#[inline]
fn tile_to_chunk(p: TilePoint) -> ChunkCoord {
    ChunkCoord {
        x: p.x.div_euclid(CHUNK_SIZE),
        y: p.y.div_euclid(CHUNK_SIZE),
    }
}

/// Chunk coordinates covered by `rect`, padded by `margin` chunks.
fn covering_chunks(rect: &TileRect, margin: i32) -> impl Iterator<Item = ChunkCoord> {
    let mut cx_min = rect.x.div_euclid(CHUNK_SIZE);
    let mut cy_min = rect.y.div_euclid(CHUNK_SIZE);
    // the SE corner is exclusive
    let mut cx_max = (rect.x + rect.w - 1).div_euclid(CHUNK_SIZE);
    let mut cy_max = (rect.y + rect.h - 1).div_euclid(CHUNK_SIZE);

    if cx_min > cx_max {
        std::mem::swap(&mut cx_min, &mut cx_max);
    }
    if cy_min > cy_max {
        std::mem::swap(&mut cy_min, &mut cy_max);
    }

    cx_min -= margin;
    cy_min -= margin;
    cx_max += margin;
    cy_max += margin;

    (cy_min..=cy_max)
        .flat_map(move |cy| (cx_min..=cx_max).map(move |cx| ChunkCoord { x: cx, y: cy }))
}

/// Spatial index over one layer's resolved instances.
///
/// Each bucket holds module indices in layer order. The index is rebuilt
/// lazily after mutations, so a frame that only queries a clean layer never
/// rescans the full module list.
#[derive(Debug, Default, Clone)]
struct OccupancyIndex {
    buckets: HashMap<ChunkCoord, Vec<usize>>,
    dirty: bool,
}

impl OccupancyIndex {
    fn new() -> Self {
        OccupancyIndex {
            buckets: HashMap::new(),
            dirty: true,
        }
    }

    fn rebuild(&mut self, modules: &[ModuleInstance]) {
        self.buckets.clear();
        for (idx, m) in modules.iter().enumerate() {
            // unresolved instances have no footprint and stay out of the index
            let Some(rect) = m.occupied_rect() else {
                continue;
            };
            for cc in covering_chunks(&rect, 0) {
                self.buckets.entry(cc).or_default().push(idx);
            }
        }
        self.dirty = false;
    }

    /// Module indices whose buckets intersect `rect`, ascending and deduped
    /// (ascending index order equals insertion order).
    fn candidates_for_rect(&self, rect: &TileRect, margin: i32) -> Vec<usize> {
        let mut out = Vec::new();
        for cc in covering_chunks(rect, margin) {
            if let Some(bucket) = self.buckets.get(&cc) {
                out.extend_from_slice(bucket);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn candidates_for_tile(&self, p: TilePoint) -> Vec<usize> {
        match self.buckets.get(&tile_to_chunk(p)) {
            Some(bucket) => bucket.clone(),
            None => Vec::new(),
        }
    }
}

/// One z-slice of the map: an ordered run of module instances with its own
/// visibility flags and occupancy index.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Display name, may be empty.
    pub name: String,
    /// Hidden layers are still edited and serialized, just not drawn.
    pub visible: bool,
    /// Whether the renderer should draw drop shadows for this layer.
    pub show_shadows: bool,
    modules: Vec<ModuleInstance>,
    index: RefCell<OccupancyIndex>,
}

impl Layer {
    /// Creates an empty, visible layer.
    pub fn new(name: impl Into<String>) -> Self {
        Layer {
            name: name.into(),
            visible: true,
            show_shadows: true,
            modules: Vec::new(),
            index: RefCell::new(OccupancyIndex::new()),
        }
    }

    /// Number of module instances on the layer.
    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when the layer holds no instances.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The instances in z-order.
    pub fn modules(&self) -> &[ModuleInstance] {
        &self.modules
    }

    /// The instance at `idx`, if any.
    pub fn module(&self, idx: usize) -> Option<&ModuleInstance> {
        self.modules.get(idx)
    }

    /// Mutable access to one instance. Conservatively invalidates the
    /// occupancy index, since the caller may change geometry.
    pub fn module_mut(&mut self, idx: usize) -> Option<&mut ModuleInstance> {
        self.index.get_mut().dirty = true;
        self.modules.get_mut(idx)
    }

    /// Mutable access to the whole run, invalidating the index.
    pub fn modules_mut(&mut self) -> &mut [ModuleInstance] {
        self.index.get_mut().dirty = true;
        &mut self.modules
    }

    /// Appends an instance, returning its index (= z-position).
    pub fn add_module(&mut self, module: ModuleInstance) -> usize {
        self.index.get_mut().dirty = true;
        self.modules.push(module);
        self.modules.len() - 1
    }

    /// Removes and returns the instance at `idx`. Later indices shift down.
    pub fn remove_module(&mut self, idx: usize) -> ModuleInstance {
        self.index.get_mut().dirty = true;
        self.modules.remove(idx)
    }

    /// Removes every instance, keeping the layer itself.
    pub fn clear(&mut self) {
        self.index.get_mut().dirty = true;
        self.modules.clear();
    }

    /// Draw-rules placement: adds `module` only if its footprint is free.
    ///
    /// A blocked placement is a logged no-op returning `None`; the layer is
    /// left exactly as it was. Unresolved modules have no footprint and
    /// place unconditionally (they occupy nothing).
    pub fn try_place(&mut self, module: ModuleInstance) -> Option<usize> {
        if let Some(rect) = module.occupied_rect() {
            if self.is_rect_occupied(&rect) {
                warn!(
                    "placement of {:?} at ({}, {}) rejected: tiles occupied",
                    module.module_key(),
                    rect.x,
                    rect.y
                );
                return None;
            }
        }
        Some(self.add_module(module))
    }

    /// Paint-rules placement: removes every instance overlapping `module`'s
    /// footprint, re-checks occupancy, then places.
    ///
    /// Returns how many instances were overwritten and the new index.
    pub fn place_overwrite(&mut self, module: ModuleInstance) -> (usize, Option<usize>) {
        let Some(rect) = module.occupied_rect() else {
            return (0, Some(self.add_module(module)));
        };
        let conflicting = self.overlapping_indices(&rect);
        let removed = conflicting.len();
        self.index.get_mut().dirty = true;
        // back to front so earlier indices stay valid
        for idx in conflicting.into_iter().rev() {
            let gone = self.modules.remove(idx);
            debug!("overwrote {:?} at ({}, {})", gone.module_key(), rect.x, rect.y);
        }
        (removed, self.try_place(module))
    }

    fn with_index<R>(&self, f: impl FnOnce(&OccupancyIndex) -> R) -> R {
        let mut index = self.index.borrow_mut();
        if index.dirty {
            index.rebuild(&self.modules);
        }
        f(&index)
    }

    /// True iff any resolved instance in the layer contains `p`.
    pub fn is_tile_occupied(&self, p: TilePoint) -> bool {
        self.with_index(|ix| {
            ix.candidates_for_tile(p)
                .iter()
                .any(|&i| self.modules[i].contains_tile(p))
        })
    }

    /// True iff any resolved instance genuinely overlaps `rect`.
    pub fn is_rect_occupied(&self, rect: &TileRect) -> bool {
        self.with_index(|ix| {
            ix.candidates_for_rect(rect, 0)
                .iter()
                .any(|&i| self.modules[i].overlaps(rect))
        })
    }

    /// Index of the first instance (in layer order) containing `p`.
    ///
    /// Well-formed layers never cover one tile twice; if that invariant is
    /// violated the tie-break is insertion order, and the violation is
    /// logged rather than repaired.
    pub fn module_at(&self, p: TilePoint) -> Option<usize> {
        self.with_index(|ix| {
            let mut hits = ix
                .candidates_for_tile(p)
                .into_iter()
                .filter(|&i| self.modules[i].contains_tile(p));
            let first = hits.next()?;
            if hits.next().is_some() {
                warn!(
                    "layer {:?}: tile ({}, {}) covered by more than one module, \
                     picking the earliest",
                    self.name, p.x, p.y
                );
            }
            Some(first)
        })
    }

    /// Indices of every resolved instance overlapping `rect`, in z-order.
    pub fn overlapping_indices(&self, rect: &TileRect) -> Vec<usize> {
        self.with_index(|ix| {
            ix.candidates_for_rect(rect, 0)
                .into_iter()
                .filter(|&i| self.modules[i].overlaps(rect))
                .collect()
        })
    }

    /// Indices of the instances a renderer must draw for `viewport`, in
    /// z-order. Served from the occupancy buckets (with a one-chunk margin)
    /// so a 100x100-tile map is not rescanned per frame.
    pub fn visible_modules(&self, viewport: &TileRect) -> Vec<usize> {
        self.with_index(|ix| {
            ix.candidates_for_rect(viewport, CULL_MARGIN_CHUNKS)
                .into_iter()
                .filter(|&i| self.modules[i].overlaps(viewport))
                .collect()
        })
    }

    /// Indices of all currently selected instances, in z-order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_selected())
            .map(|(i, _)| i)
            .collect()
    }

    /// Deselects everything; returns how many flags were cleared.
    pub fn clear_selection(&mut self) -> usize {
        let mut cleared = 0;
        for m in &mut self.modules {
            if m.is_selected() {
                m.set_selected(false);
                cleared += 1;
            }
        }
        cleared
    }

    /// Removes every selected instance; returns how many were destroyed.
    pub fn delete_selected(&mut self) -> usize {
        let before = self.modules.len();
        self.index.get_mut().dirty = true;
        self.modules.retain(|m| !m.is_selected());
        before - self.modules.len()
    }

    /// Removes every instance flagged for deletion; returns the count.
    pub fn delete_marked(&mut self) -> usize {
        let before = self.modules.len();
        self.index.get_mut().dirty = true;
        self.modules.retain(|m| !m.is_marked_for_deletion());
        before - self.modules.len()
    }

    /// Drains the geometry-dirty flag of every instance; true if any was set.
    pub fn take_geometry_dirty(&mut self) -> bool {
        let mut any = false;
        for m in &mut self.modules {
            any |= m.take_geometry_dirty();
        }
        any
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::new("")
    }
}
