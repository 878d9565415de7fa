//! Rigid-body transforms over a working set of module instances.
//!
//! The working set is either the in-hand set or the current selection,
//! handed in as mutable references so the same engine serves both. The
//! position mapping is a pure function of the pivot; self-rotation and the
//! re-anchoring translation are applied as separate explicit steps, which
//! keeps the math testable and free of aliasing.

use crate::geom::{tile, TilePoint, TileRect};
use crate::module::ModuleInstance;
use log::debug;

/// Rotation direction for group transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    /// +90 degrees per application.
    Clockwise,
    /// -90 degrees per application.
    CounterClockwise,
}

/// Bounding rectangle over the resolved members of a working set, from the
/// min NW corner to the max SE corner. `None` if nothing is resolved.
pub fn group_bounds(members: &[&mut ModuleInstance]) -> Option<TileRect> {
    let mut nw: Option<TilePoint> = None;
    let mut se: Option<TilePoint> = None;
    for m in members {
        let Some(m_se) = m.se() else { continue };
        let m_nw = m.nw();
        nw = Some(match nw {
            Some(p) => tile(p.x.min(m_nw.x), p.y.min(m_nw.y)),
            None => m_nw,
        });
        se = Some(match se {
            Some(p) => tile(p.x.max(m_se.x), p.y.max(m_se.y)),
            None => m_se,
        });
    }
    Some(TileRect::from_corners(nw?, se?))
}

/// Pure position mapping: `p` rotated a quarter turn about `pivot`,
/// rounded to the nearest tile with ties away from zero.
fn rotate_about(p: TilePoint, pivot: (f64, f64), spin: Spin) -> TilePoint {
    let dx = p.x as f64 - pivot.0;
    let dy = p.y as f64 - pivot.1;
    // standard 2D rotation with theta = +-90 degrees
    let (rx, ry) = match spin {
        Spin::Clockwise => (-dy, dx),
        Spin::CounterClockwise => (dy, -dx),
    };
    tile((pivot.0 + rx).round() as i32, (pivot.1 + ry).round() as i32)
}

/// Rotates a working set as a rigid body about the center of its bounding
/// box, then re-anchors so the group's NW corner stays put (no drift under
/// repeated application).
///
/// Each member also spins its own rotation field one quarter turn, so the
/// pieces turn with the formation. Unresolved members are left untouched.
/// Returns how many instances were transformed.
pub fn rotate_group(members: &mut [&mut ModuleInstance], spin: Spin) -> usize {
    let Some(bounds) = group_bounds(members) else {
        return 0;
    };
    let pivot = (
        bounds.x as f64 + bounds.w as f64 / 2.0,
        bounds.y as f64 + bounds.h as f64 / 2.0,
    );
    let delta = match spin {
        Spin::Clockwise => 1,
        Spin::CounterClockwise => -1,
    };

    let mut touched = 0;
    for m in members.iter_mut() {
        if !m.is_resolved() {
            continue;
        }
        m.rotate(delta);
        m.set_position(rotate_about(m.position(), pivot, spin));
        touched += 1;
    }

    // re-anchor the group NW corner to its pre-rotation position
    if let Some(after) = group_bounds(members) {
        let dx = bounds.x - after.x;
        let dy = bounds.y - after.y;
        if dx != 0 || dy != 0 {
            for m in members.iter_mut() {
                if m.is_resolved() {
                    m.translate(dx, dy);
                }
            }
        }
    }

    debug!("group rotate {spin:?}: {touched} instances about {pivot:?}");
    touched
}

/// Flips each member's mirror state horizontally, in place.
///
/// Member positions within the group are not rearranged: a multi-module
/// selection flips piece by piece without reflecting the group layout.
/// Longstanding behavior, kept as is. Unresolved members are left
/// untouched, as in [`rotate_group`].
pub fn mirror_group_horizontal(members: &mut [&mut ModuleInstance]) -> usize {
    let mut touched = 0;
    for m in members.iter_mut() {
        if !m.is_resolved() {
            continue;
        }
        m.mirror_horizontal();
        touched += 1;
    }
    touched
}

/// Flips each member's mirror state vertically, in place. Same layout
/// caveat as [`mirror_group_horizontal`].
pub fn mirror_group_vertical(members: &mut [&mut ModuleInstance]) -> usize {
    let mut touched = 0;
    for m in members.iter_mut() {
        if !m.is_resolved() {
            continue;
        }
        m.mirror_vertical();
        touched += 1;
    }
    touched
}
