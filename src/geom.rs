//! Integer tile-space geometry: points and rectangles.
//!
//! All coordinates in the core are grid units; pixel scaling is a
//! rendering concern and never happens here.

use serde::{Deserialize, Serialize};

/// A position in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePoint {
    /// Column, growing rightwards.
    pub x: i32,
    /// Row, growing downwards.
    pub y: i32,
}

/// Shorthand constructor for a [`TilePoint`].
#[inline]
pub const fn tile(x: i32, y: i32) -> TilePoint {
    TilePoint { x, y }
}

impl TilePoint {
    /// The point moved by `(dx, dy)` tiles.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        TilePoint {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An axis-aligned rectangle in tile units. `w`/`h` are always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileRect {
    /// Left edge (NW corner x).
    pub x: i32,
    /// Top edge (NW corner y).
    pub y: i32,
    /// Width in tiles.
    pub w: i32,
    /// Height in tiles.
    pub h: i32,
}

impl TileRect {
    /// Builds a rectangle from its NW corner and size.
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        TileRect { x, y, w, h }
    }

    /// Builds the rectangle spanning `nw` (inclusive) to `se` (exclusive).
    pub fn from_corners(nw: TilePoint, se: TilePoint) -> Self {
        TileRect {
            x: nw.x,
            y: nw.y,
            w: (se.x - nw.x).max(0),
            h: (se.y - nw.y).max(0),
        }
    }

    /// North-west corner, the tile at (x, y).
    #[inline]
    pub fn nw(&self) -> TilePoint {
        tile(self.x, self.y)
    }

    /// South-east corner, one past the last covered tile on both axes.
    #[inline]
    pub fn se(&self) -> TilePoint {
        tile(self.x + self.w, self.y + self.h)
    }

    /// True when the rectangle covers no tiles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Half-open containment: the tile one past the far edge is NOT inside.
    #[inline]
    pub fn contains(&self, p: TilePoint) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }

    /// True on non-empty overlap. Rectangles that merely touch edges do
    /// not intersect.
    pub fn intersects(&self, other: &TileRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}
