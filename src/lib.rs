#![warn(missing_docs)]

//! Tile-grid spatial model & transform engine for a modular floor-plan
//! editor.
//!
//! The crate covers the editor core only: placed-module entities and
//! layers, the orientation math (90-degree rotation steps, four-state
//! mirroring, effective sizes), per-layer occupancy with viewport culling,
//! rigid-body group transforms around a shared pivot, the
//! Select/Move/Draw/Paint/Erase interaction state machine, and the
//! persisted JSON document with its post-load archetype linking. Pixel
//! rendering, asset loading and UI-toolkit wiring are the host's business.

mod archetype;
mod error;
mod geom;
mod group;
mod layer;
mod loader {
    pub mod json_loader;
}
mod map;
mod module;
mod orient;
mod session;

pub use archetype::{ArchetypeCatalog, ModuleArchetype};
pub use error::MapError;
pub use geom::{tile, TilePoint, TileRect};
pub use group::{group_bounds, mirror_group_horizontal, mirror_group_vertical, rotate_group, Spin};
pub use layer::{Layer, CHUNK_SIZE};
pub use map::{Map, DEFAULT_LAYER_NAME};
pub use module::ModuleInstance;
pub use orient::{Mirror, Rotation};
pub use session::{EditorMode, EditorSession};
