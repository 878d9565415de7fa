//! A placed (or in-hand) occurrence of a module archetype.

use crate::archetype::ModuleArchetype;
use crate::geom::{tile, TilePoint, TileRect};
use crate::orient::{Mirror, Rotation};
use std::sync::Arc;

/// One placement of an archetype: position, orientation, and the transient
/// flags of the editing session.
///
/// The archetype link may be unset right after deserialization, before the
/// document is linked against a catalog. An unlinked instance is inert: it
/// has no footprint and is excluded from occupancy queries and rendering
/// until [`ModuleInstance::resolve`] gives it an archetype.
#[derive(Debug, Clone)]
pub struct ModuleInstance {
    module_key: String,
    archetype: Option<Arc<ModuleArchetype>>,
    position: TilePoint,
    rotation: Rotation,
    mirror: Mirror,
    // Session-only state, never persisted.
    selected: bool,
    in_hand: bool,
    marked_for_deletion: bool,
    geometry_dirty: bool,
}

impl ModuleInstance {
    /// Creates an instance of a known archetype at the origin.
    pub fn from_archetype(archetype: Arc<ModuleArchetype>) -> Self {
        ModuleInstance {
            module_key: archetype.key.clone(),
            archetype: Some(archetype),
            position: TilePoint::default(),
            rotation: Rotation::R0,
            mirror: Mirror::None,
            selected: false,
            in_hand: false,
            marked_for_deletion: false,
            geometry_dirty: false,
        }
    }

    /// Creates an unlinked instance carrying only its persisted state.
    ///
    /// Rotation and mirror are canonicalized here, so out-of-range values
    /// in a document load as valid orientations.
    pub fn unresolved(
        module_key: impl Into<String>,
        position: TilePoint,
        rotation: i32,
        mirror: i32,
    ) -> Self {
        ModuleInstance {
            module_key: module_key.into(),
            archetype: None,
            position,
            rotation: Rotation::normalize(rotation),
            mirror: Mirror::normalize(mirror),
            selected: false,
            in_hand: false,
            marked_for_deletion: false,
            geometry_dirty: false,
        }
    }

    /// Stable archetype key, kept even while the link is unresolved.
    pub fn module_key(&self) -> &str {
        &self.module_key
    }

    /// The linked archetype, if any.
    pub fn archetype(&self) -> Option<&Arc<ModuleArchetype>> {
        self.archetype.as_ref()
    }

    /// True once the instance is linked and may participate in occupancy.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.archetype.is_some()
    }

    /// Links the instance to its archetype. The key must match.
    pub fn resolve(&mut self, archetype: Arc<ModuleArchetype>) {
        debug_assert_eq!(archetype.key, self.module_key);
        self.archetype = Some(archetype);
        self.geometry_dirty = true;
    }

    /// Top-left (NW) tile of the footprint.
    #[inline]
    pub fn position(&self) -> TilePoint {
        self.position
    }

    /// Current rotation, canonical in 0..4 quarter turns.
    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current mirror state.
    #[inline]
    pub fn mirror(&self) -> Mirror {
        self.mirror
    }

    /// The `(mirror, rotation)` pair a renderer uses to pick one of the 16
    /// precomputed variants. Both halves are always in `0..4`.
    #[inline]
    pub fn orientation_index(&self) -> (u8, u8) {
        (self.mirror.index(), self.rotation.quarter_turns())
    }

    /// Moves the instance; records geometry-dirty on actual change.
    pub fn set_position(&mut self, position: TilePoint) {
        if self.position != position {
            self.position = position;
            self.geometry_dirty = true;
        }
    }

    /// Moves the instance by `(dx, dy)` tiles.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        if dx != 0 || dy != 0 {
            self.position = self.position.offset(dx, dy);
            self.geometry_dirty = true;
        }
    }

    /// Assigns a rotation from any integer quarter-turn count.
    pub fn set_rotation(&mut self, turns: i32) {
        let r = Rotation::normalize(turns);
        if self.rotation != r {
            self.rotation = r;
            self.geometry_dirty = true;
        }
    }

    /// Spins the piece by `delta` quarter turns (`+1` clockwise).
    pub fn rotate(&mut self, delta: i32) {
        if delta % 4 != 0 {
            self.rotation = self.rotation.rotated(delta);
            self.geometry_dirty = true;
        }
    }

    /// Assigns a mirror state from any integer index.
    pub fn set_mirror(&mut self, index: i32) {
        let m = Mirror::normalize(index);
        if self.mirror != m {
            self.mirror = m;
            self.geometry_dirty = true;
        }
    }

    /// Composes a horizontal flip onto the current mirror state.
    pub fn mirror_horizontal(&mut self) {
        self.mirror = self.mirror.flipped_horizontal();
        self.geometry_dirty = true;
    }

    /// Composes a vertical flip onto the current mirror state.
    pub fn mirror_vertical(&mut self) {
        self.mirror = self.mirror.flipped_vertical();
        self.geometry_dirty = true;
    }

    /// Footprint under the current rotation; `None` while unresolved.
    pub fn effective_size(&self) -> Option<(i32, i32)> {
        let a = self.archetype.as_ref()?;
        Some(self.rotation.apply_to_size(a.width, a.height))
    }

    /// The occupied region, or `None` while unresolved.
    pub fn occupied_rect(&self) -> Option<TileRect> {
        let (w, h) = self.effective_size()?;
        Some(TileRect::new(self.position.x, self.position.y, w, h))
    }

    /// North-west corner (equals `position`).
    #[inline]
    pub fn nw(&self) -> TilePoint {
        self.position
    }

    /// South-east corner, one past the footprint; `None` while unresolved.
    pub fn se(&self) -> Option<TilePoint> {
        let (w, h) = self.effective_size()?;
        Some(tile(self.position.x + w, self.position.y + h))
    }

    /// Half-open containment test. Unresolved instances contain nothing.
    pub fn contains_tile(&self, p: TilePoint) -> bool {
        self.occupied_rect().is_some_and(|r| r.contains(p))
    }

    /// True if the footprint genuinely overlaps `rect` (touching is not
    /// overlapping). Unresolved instances overlap nothing.
    pub fn overlaps(&self, rect: &TileRect) -> bool {
        self.occupied_rect().is_some_and(|r| r.intersects(rect))
    }

    /// An independently mutable copy sharing the same archetype.
    ///
    /// Copies position, rotation and mirror; session flags reset to their
    /// defaults so the clone starts life unselected and out of hand.
    pub fn clone_placed(&self) -> Self {
        ModuleInstance {
            module_key: self.module_key.clone(),
            archetype: self.archetype.clone(),
            position: self.position,
            rotation: self.rotation,
            mirror: self.mirror,
            selected: false,
            in_hand: false,
            marked_for_deletion: false,
            geometry_dirty: false,
        }
    }

    /// Session flag: part of the current selection.
    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the selection flag.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Session flag: following the cursor, not yet on a layer.
    #[inline]
    pub fn is_in_hand(&self) -> bool {
        self.in_hand
    }

    /// Sets the in-hand flag.
    pub fn set_in_hand(&mut self, in_hand: bool) {
        self.in_hand = in_hand;
    }

    /// Session flag: erase-hover highlight.
    #[inline]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Sets the erase-hover mark.
    pub fn set_marked_for_deletion(&mut self, marked: bool) {
        self.marked_for_deletion = marked;
    }

    /// Reads and clears the geometry-changed flag.
    ///
    /// Geometry mutations only record the flag; whoever drives redraws
    /// polls it. This keeps the core free of any rendering dependency.
    pub fn take_geometry_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.geometry_dirty, false)
    }

    /// Peeks at the geometry-changed flag without clearing it.
    #[inline]
    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty
    }
}
