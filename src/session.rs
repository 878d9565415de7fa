//! The editing session: interaction modes and the event-driven state
//! machine that decides which mutation an input event triggers.
//!
//! The machine is input-device agnostic. The host translates its pointer
//! and keyboard plumbing into `pick_archetype` / `press` / `drag` /
//! `hover` / `release` / `cancel` calls; everything else happens here.

use crate::archetype::ModuleArchetype;
use crate::geom::{TilePoint, TileRect};
use crate::group::{self, Spin};
use crate::layer::Layer;
use crate::map::Map;
use crate::module::ModuleInstance;
use log::{debug, warn};
use std::sync::Arc;

/// Active editor mode. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Select and inspect placed modules.
    #[default]
    Select,
    /// Drag the current selection by whole tiles.
    Move,
    /// Place clones of the in-hand module on free tiles.
    Draw,
    /// Like Draw, but overwrites whatever is in the way.
    Paint,
    /// Remove modules under the cursor.
    Erase,
}

/// Per-session editing state: the active mode, the in-hand set, and the
/// bookkeeping the event handlers need between events.
///
/// The in-hand set exists only in `Draw`/`Paint`; the selection only
/// matters in `Select`/`Move`. Entering either side clears the other.
#[derive(Debug, Default)]
pub struct EditorSession {
    mode: EditorMode,
    active_layer: usize,
    in_hand: Vec<ModuleInstance>,
    /// Tile of the last press/drag/hover event, for tile-change detection.
    last_tile: Option<TilePoint>,
    button_held: bool,
}

impl EditorSession {
    /// A fresh session: `Select` mode, first layer active, empty hand.
    pub fn new() -> Self {
        EditorSession::default()
    }

    /// The active mode.
    #[inline]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Index of the layer placements and selections act on.
    #[inline]
    pub fn active_layer(&self) -> usize {
        self.active_layer
    }

    /// Picks which layer placements and selections act on. Out-of-range
    /// indices clamp to the last layer.
    pub fn set_active_layer(&mut self, map: &Map, idx: usize) {
        self.active_layer = idx.min(map.layer_count() - 1);
    }

    /// The in-hand instances (empty outside `Draw`/`Paint`).
    pub fn in_hand(&self) -> &[ModuleInstance] {
        &self.in_hand
    }

    /// Switches mode, applying the entry rules: entering `Select`, `Move`
    /// or `Erase` discards the in-hand set; entering `Draw` or `Paint`
    /// clears the selection. Leaving `Erase` drops hover marks.
    pub fn enter_mode(&mut self, map: &mut Map, mode: EditorMode) {
        if self.mode == mode {
            return;
        }
        debug!("mode {:?} -> {:?}", self.mode, mode);

        if self.mode == EditorMode::Erase {
            clear_deletion_marks(map);
        }

        match mode {
            EditorMode::Select | EditorMode::Move | EditorMode::Erase => {
                if !self.in_hand.is_empty() {
                    debug!("discarding {} in-hand instance(s)", self.in_hand.len());
                    self.in_hand.clear();
                }
            }
            EditorMode::Draw | EditorMode::Paint => {
                for layer in 0..map.layer_count() {
                    map.layer_mut(layer).unwrap().clear_selection();
                }
            }
        }
        self.mode = mode;
    }

    /// Catalog pick: puts a fresh instance of `archetype` in hand and
    /// enters `Draw`. Ignored mid-gesture.
    pub fn pick_archetype(&mut self, map: &mut Map, archetype: Arc<ModuleArchetype>) {
        if self.button_held {
            return;
        }
        self.enter_mode(map, EditorMode::Draw);
        let mut instance = ModuleInstance::from_archetype(archetype);
        instance.set_in_hand(true);
        if let Some(p) = self.last_tile {
            instance.set_position(p);
        }
        self.in_hand = vec![instance];
    }

    /// Primary-button press at tile `p`.
    pub fn press(&mut self, map: &mut Map, p: TilePoint) {
        self.button_held = true;
        self.last_tile = Some(p);

        match self.mode {
            EditorMode::Select => {
                let Some(layer) = map.layer(self.active_layer) else {
                    return;
                };
                match layer.module_at(p) {
                    Some(idx) if layer.modules()[idx].is_selected() => {
                        // grabbing an already-selected piece starts a move
                        self.enter_mode(map, EditorMode::Move);
                    }
                    Some(idx) => {
                        let layer = map.layer_mut(self.active_layer).unwrap();
                        layer.clear_selection();
                        layer.module_mut(idx).unwrap().set_selected(true);
                    }
                    None => {
                        map.layer_mut(self.active_layer).unwrap().clear_selection();
                    }
                }
            }
            EditorMode::Move => {}
            EditorMode::Draw => {
                self.position_in_hand(p);
                if self
                    .map_layer(map)
                    .is_some_and(|l| l.is_tile_occupied(p))
                {
                    // overwrite intent: the gesture starts on occupied ground
                    self.enter_mode(map, EditorMode::Paint);
                    self.stamp_overwrite(map, p);
                } else {
                    self.try_drop(map, p);
                }
            }
            EditorMode::Paint => {
                self.position_in_hand(p);
                self.stamp_overwrite(map, p);
            }
            EditorMode::Erase => {
                self.erase_at(map, p);
            }
        }
    }

    /// Pointer motion with the primary button held, already quantized to a
    /// tile. Events on the same tile as the previous one are no-ops.
    pub fn drag(&mut self, map: &mut Map, p: TilePoint) {
        if !self.button_held {
            self.hover(map, p);
            return;
        }
        let prev = self.last_tile;
        if prev == Some(p) {
            return;
        }
        self.last_tile = Some(p);

        match self.mode {
            EditorMode::Select => {}
            EditorMode::Move => {
                if let Some(from) = prev {
                    self.move_selection(map, p.x - from.x, p.y - from.y);
                }
            }
            EditorMode::Draw => {
                // overwrite intent only escalates on the first gesture tile;
                // mid-gesture collisions are plain rejected drops
                self.position_in_hand(p);
                self.try_drop(map, p);
            }
            EditorMode::Paint => {
                self.position_in_hand(p);
                self.stamp_overwrite(map, p);
            }
            EditorMode::Erase => {
                self.erase_at(map, p);
            }
        }
    }

    /// Pointer motion without the button. Moves the in-hand preview in
    /// `Draw`/`Paint` and maintains the erase hover mark in `Erase`.
    pub fn hover(&mut self, map: &mut Map, p: TilePoint) {
        self.last_tile = Some(p);
        match self.mode {
            EditorMode::Draw | EditorMode::Paint => self.position_in_hand(p),
            EditorMode::Erase => {
                clear_deletion_marks(map);
                if let Some(layer) = map.layer(self.active_layer) {
                    if let Some(idx) = layer.module_at(p) {
                        map.layer_mut(self.active_layer)
                            .unwrap()
                            .module_mut(idx)
                            .unwrap()
                            .set_marked_for_deletion(true);
                    }
                }
            }
            _ => {}
        }
    }

    /// Primary-button release. `Move` falls back to `Select`, `Paint`
    /// falls back to `Draw`.
    pub fn release(&mut self, map: &mut Map) {
        self.button_held = false;
        match self.mode {
            EditorMode::Move => self.enter_mode(map, EditorMode::Select),
            EditorMode::Paint => self.enter_mode(map, EditorMode::Draw),
            _ => {}
        }
    }

    /// Cancel signal (e.g. Escape): from any state back to `Select`,
    /// dropping the selection, hover marks and any in-hand instances.
    pub fn cancel(&mut self, map: &mut Map) {
        self.button_held = false;
        self.last_tile = None;
        self.in_hand.clear();
        clear_deletion_marks(map);
        for layer in 0..map.layer_count() {
            map.layer_mut(layer).unwrap().clear_selection();
        }
        debug!("cancel: mode {:?} -> Select", self.mode);
        self.mode = EditorMode::Select;
    }

    /// Selects every instance on the active layer overlapping `rect`.
    /// Returns how many are selected afterwards.
    pub fn select_rect(&mut self, map: &mut Map, rect: &TileRect, additive: bool) -> usize {
        let Some(layer) = map.layer(self.active_layer) else {
            return 0;
        };
        let hits = layer.overlapping_indices(rect);
        let layer = map.layer_mut(self.active_layer).unwrap();
        if !additive {
            layer.clear_selection();
        }
        for idx in hits {
            layer.module_mut(idx).unwrap().set_selected(true);
        }
        layer.selected_indices().len()
    }

    /// Deletes the current selection on the active layer.
    pub fn delete_selection(&mut self, map: &mut Map) -> usize {
        map.layer_mut(self.active_layer)
            .map(Layer::delete_selected)
            .unwrap_or(0)
    }

    /// Rotates the working set (in-hand in `Draw`/`Paint`, otherwise the
    /// selection) as a rigid body. Returns how many instances turned.
    pub fn rotate_working_set(&mut self, map: &mut Map, spin: Spin) -> usize {
        match self.mode {
            EditorMode::Draw | EditorMode::Paint => {
                let mut members: Vec<&mut ModuleInstance> = self.in_hand.iter_mut().collect();
                group::rotate_group(&mut members, spin)
            }
            _ => with_selection(map, self.active_layer, |members| {
                group::rotate_group(members, spin)
            }),
        }
    }

    /// Mirrors the working set horizontally (each piece in place).
    pub fn mirror_working_set_horizontal(&mut self, map: &mut Map) -> usize {
        match self.mode {
            EditorMode::Draw | EditorMode::Paint => {
                let mut members: Vec<&mut ModuleInstance> = self.in_hand.iter_mut().collect();
                group::mirror_group_horizontal(&mut members)
            }
            _ => with_selection(map, self.active_layer, group::mirror_group_horizontal),
        }
    }

    /// Mirrors the working set vertically (each piece in place).
    pub fn mirror_working_set_vertical(&mut self, map: &mut Map) -> usize {
        match self.mode {
            EditorMode::Draw | EditorMode::Paint => {
                let mut members: Vec<&mut ModuleInstance> = self.in_hand.iter_mut().collect();
                group::mirror_group_vertical(&mut members)
            }
            _ => with_selection(map, self.active_layer, group::mirror_group_vertical),
        }
    }

    fn map_layer<'m>(&self, map: &'m Map) -> Option<&'m Layer> {
        map.layer(self.active_layer)
    }

    fn position_in_hand(&mut self, p: TilePoint) {
        for m in &mut self.in_hand {
            m.set_position(p);
        }
    }

    /// Drops clones of the in-hand set at `p` under Draw rules: every
    /// footprint must be free, a blocked drop is a no-op.
    fn try_drop(&mut self, map: &mut Map, p: TilePoint) -> bool {
        if self.in_hand.is_empty() {
            return false;
        }
        self.position_in_hand(p);
        let Some(layer) = map.layer(self.active_layer) else {
            return false;
        };
        let blocked = self.in_hand.iter().any(|m| {
            m.occupied_rect()
                .is_some_and(|rect| layer.is_rect_occupied(&rect))
        });
        if blocked {
            warn!("drop at ({}, {}) rejected: tiles occupied", p.x, p.y);
            return false;
        }
        let layer = map.layer_mut(self.active_layer).unwrap();
        for m in &self.in_hand {
            layer.add_module(m.clone_placed());
        }
        debug!("dropped {} instance(s) at ({}, {})", self.in_hand.len(), p.x, p.y);
        true
    }

    /// Paint-mode stamp: overwrite placement of every in-hand clone.
    fn stamp_overwrite(&mut self, map: &mut Map, p: TilePoint) -> bool {
        self.position_in_hand(p);
        let Some(layer) = map.layer_mut(self.active_layer) else {
            return false;
        };
        let mut placed_any = false;
        for m in &self.in_hand {
            let (_, placed) = layer.place_overwrite(m.clone_placed());
            placed_any |= placed.is_some();
        }
        placed_any
    }

    fn erase_at(&mut self, map: &mut Map, p: TilePoint) {
        let Some(layer) = map.layer_mut(self.active_layer) else {
            return;
        };
        if let Some(idx) = layer.module_at(p) {
            let removed = layer.remove_module(idx);
            debug!("erased {:?} at ({}, {})", removed.module_key(), p.x, p.y);
        }
    }

    /// Translates the selection by whole tiles, reverting the step if any
    /// moved piece would land on an unselected one.
    fn move_selection(&mut self, map: &mut Map, dx: i32, dy: i32) -> bool {
        if dx == 0 && dy == 0 {
            return true;
        }
        let Some(layer) = map.layer_mut(self.active_layer) else {
            return false;
        };
        let selected = layer.selected_indices();
        if selected.is_empty() {
            return false;
        }

        for &idx in &selected {
            layer.module_mut(idx).unwrap().translate(dx, dy);
        }

        let mut blocked = false;
        for &idx in &selected {
            let Some(rect) = layer.modules()[idx].occupied_rect() else {
                continue;
            };
            if layer
                .overlapping_indices(&rect)
                .iter()
                .any(|hit| !selected.contains(hit))
            {
                blocked = true;
                break;
            }
        }

        if blocked {
            for &idx in &selected {
                layer.module_mut(idx).unwrap().translate(-dx, -dy);
            }
            warn!("move by ({dx}, {dy}) rejected: destination occupied");
        }
        !blocked
    }
}

fn clear_deletion_marks(map: &mut Map) {
    for li in 0..map.layer_count() {
        for m in map.layer_mut(li).unwrap().modules_mut() {
            m.set_marked_for_deletion(false);
        }
    }
}

/// Runs `f` over the selection of `layer_idx` as a working set.
fn with_selection<F>(map: &mut Map, layer_idx: usize, f: F) -> usize
where
    F: FnOnce(&mut [&mut ModuleInstance]) -> usize,
{
    let Some(layer) = map.layer_mut(layer_idx) else {
        return 0;
    };
    let mut members: Vec<&mut ModuleInstance> = layer
        .modules_mut()
        .iter_mut()
        .filter(|m| m.is_selected())
        .collect();
    if members.is_empty() {
        return 0;
    }
    f(&mut members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::{ArchetypeCatalog, ModuleArchetype};
    use crate::geom::tile;

    fn square() -> Arc<ModuleArchetype> {
        Arc::new(ModuleArchetype::new("square", 2, 2))
    }

    fn session_with_map() -> (EditorSession, Map) {
        (EditorSession::new(), Map::new("test"))
    }

    #[test]
    fn pick_enters_draw_with_in_hand() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        assert_eq!(s.mode(), EditorMode::Draw);
        assert_eq!(s.in_hand().len(), 1);
        assert!(s.in_hand()[0].is_in_hand());
    }

    #[test]
    fn draw_drops_on_free_ground_and_keeps_hand() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);
        assert_eq!(map.layers()[0].len(), 1);
        assert_eq!(s.mode(), EditorMode::Draw);
        assert_eq!(s.in_hand().len(), 1);

        // dropped clone is a placed piece, not in hand
        let placed = &map.layers()[0].modules()[0];
        assert!(!placed.is_in_hand());
        assert!(map.layers()[0].is_tile_occupied(tile(1, 1)));
    }

    #[test]
    fn draw_rejects_drop_whose_footprint_overlaps() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);
        assert_eq!(map.layers()[0].len(), 1);

        // press tile (-1, 0) is free, but the 2x2 footprint from there
        // overlaps the placed square: rejected, no overwrite intent.
        s.hover(&mut map, tile(-1, 0));
        s.press(&mut map, tile(-1, 0));
        s.release(&mut map);
        assert_eq!(s.mode(), EditorMode::Draw);
        assert_eq!(map.layers()[0].len(), 1);
        assert_eq!(map.layers()[0].modules()[0].position(), tile(0, 0));
    }

    #[test]
    fn draw_on_occupied_tile_switches_to_paint_and_overwrites() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);

        s.press(&mut map, tile(1, 1));
        assert_eq!(s.mode(), EditorMode::Paint);
        // old piece removed, new one dropped at (1,1)
        assert_eq!(map.layers()[0].len(), 1);
        assert_eq!(map.layers()[0].modules()[0].position(), tile(1, 1));

        s.release(&mut map);
        assert_eq!(s.mode(), EditorMode::Draw);
    }

    #[test]
    fn free_start_gesture_never_escalates_mid_drag() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.hover(&mut map, tile(10, 10));
        s.press(&mut map, tile(10, 10));
        s.release(&mut map);
        assert_eq!(map.layers()[0].len(), 1);

        // gesture starts on free ground, then sweeps across the placed
        // square: the colliding drops are rejected, never overwritten
        s.hover(&mut map, tile(0, 0));
        s.press(&mut map, tile(0, 0));
        s.drag(&mut map, tile(10, 10));
        assert_eq!(s.mode(), EditorMode::Draw);
        assert_eq!(map.layers()[0].len(), 2);
        assert_eq!(map.layers()[0].modules()[0].position(), tile(10, 10));
        s.release(&mut map);
    }

    #[test]
    fn select_then_grab_enters_move_and_release_returns() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);

        s.enter_mode(&mut map, EditorMode::Select);
        assert!(s.in_hand().is_empty());

        s.press(&mut map, tile(0, 0)); // selects
        s.release(&mut map);
        assert!(map.layers()[0].modules()[0].is_selected());

        s.press(&mut map, tile(1, 1)); // grabs the selected piece
        assert_eq!(s.mode(), EditorMode::Move);
        s.drag(&mut map, tile(4, 1));
        assert_eq!(map.layers()[0].modules()[0].position(), tile(3, 0));
        s.release(&mut map);
        assert_eq!(s.mode(), EditorMode::Select);
    }

    #[test]
    fn blocked_move_leaves_positions_intact() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.hover(&mut map, tile(2, 0));
        s.press(&mut map, tile(2, 0));
        assert_eq!(map.layers()[0].len(), 2);

        s.enter_mode(&mut map, EditorMode::Select);
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);
        s.press(&mut map, tile(0, 0));
        assert_eq!(s.mode(), EditorMode::Move);
        // one tile right would overlap the second square
        s.drag(&mut map, tile(1, 0));
        assert_eq!(map.layers()[0].modules()[0].position(), tile(0, 0));
    }

    #[test]
    fn erase_hover_marks_exclusively_and_held_erases() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.hover(&mut map, tile(5, 0));
        s.press(&mut map, tile(5, 0));
        s.release(&mut map);
        assert_eq!(map.layers()[0].len(), 2);

        s.enter_mode(&mut map, EditorMode::Erase);
        s.hover(&mut map, tile(0, 0));
        assert!(map.layers()[0].modules()[0].is_marked_for_deletion());
        s.hover(&mut map, tile(5, 0));
        assert!(!map.layers()[0].modules()[0].is_marked_for_deletion());
        assert!(map.layers()[0].modules()[1].is_marked_for_deletion());

        s.press(&mut map, tile(5, 0));
        assert_eq!(map.layers()[0].len(), 1);
        s.drag(&mut map, tile(0, 0));
        assert_eq!(map.layers()[0].len(), 0);
        s.release(&mut map);
    }

    #[test]
    fn cancel_returns_to_select_and_discards_everything() {
        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, square());
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);
        assert_eq!(s.mode(), EditorMode::Draw);

        s.cancel(&mut map);
        assert_eq!(s.mode(), EditorMode::Select);
        assert!(s.in_hand().is_empty());
        assert!(map.layers()[0].selected_indices().is_empty());
        // placed modules survive a cancel
        assert_eq!(map.layers()[0].len(), 1);
    }

    #[test]
    fn rotating_in_hand_swaps_drop_footprint() {
        let (mut s, mut map) = session_with_map();
        let hall = Arc::new(ModuleArchetype::new("hall", 2, 1));
        s.pick_archetype(&mut map, hall);
        assert_eq!(s.rotate_working_set(&mut map, Spin::Clockwise), 1);
        s.press(&mut map, tile(0, 0));
        s.release(&mut map);

        let layer = &map.layers()[0];
        assert_eq!(layer.modules()[0].effective_size(), Some((1, 2)));
        assert!(layer.is_tile_occupied(tile(0, 1)));
        assert!(!layer.is_tile_occupied(tile(1, 0)));
    }

    #[test]
    fn rect_selection_and_group_rotate() {
        let (mut s, mut map) = session_with_map();
        let small = Arc::new(ModuleArchetype::new("small", 1, 1));
        s.pick_archetype(&mut map, small);
        s.press(&mut map, tile(0, 0));
        s.hover(&mut map, tile(3, 3));
        s.press(&mut map, tile(3, 3));
        s.release(&mut map);

        s.enter_mode(&mut map, EditorMode::Select);
        let n = s.select_rect(&mut map, &TileRect::new(0, 0, 5, 5), false);
        assert_eq!(n, 2);
        assert_eq!(s.rotate_working_set(&mut map, Spin::Clockwise), 2);
    }

    #[test]
    fn catalog_linking_feeds_session_placement() {
        // placements on a loaded-and-linked map behave like fresh ones
        let mut catalog = ArchetypeCatalog::new();
        let arch = catalog.insert(ModuleArchetype::new("room", 3, 2));

        let (mut s, mut map) = session_with_map();
        s.pick_archetype(&mut map, arch);
        s.press(&mut map, tile(2, 2));
        s.release(&mut map);
        assert!(map.layers()[0].is_tile_occupied(tile(4, 3)));
        assert!(!map.layers()[0].is_tile_occupied(tile(5, 2)));
    }
}
