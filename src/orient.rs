//! Orientation model: quarter-turn rotation and the four-state mirror group.
//!
//! The pair `(mirror, rotation)` is the orientation index a renderer uses
//! to pick one of 16 precomputed visual variants. The core guarantees both
//! halves are always canonical in `0..4` and never touches pixels.

/// Clockwise quarter turns from an archetype's native orientation.
///
/// Always canonical: every constructor and composition normalizes with
/// `((r % 4) + 4) % 4`, so negative and oversized inputs are safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotation(u8);

impl Rotation {
    /// No rotation.
    pub const R0: Rotation = Rotation(0);
    /// One quarter turn clockwise.
    pub const R90: Rotation = Rotation(1);
    /// Half turn.
    pub const R180: Rotation = Rotation(2);
    /// Three quarter turns clockwise.
    pub const R270: Rotation = Rotation(3);

    /// Canonicalizes any integer quarter-turn count, including negatives.
    #[inline]
    pub fn normalize(turns: i32) -> Self {
        Rotation(((turns % 4 + 4) % 4) as u8)
    }

    /// Quarter turns in `0..4`.
    #[inline]
    pub fn quarter_turns(self) -> u8 {
        self.0
    }

    /// Composes `delta` quarter turns on top of this one. `+1` is
    /// clockwise, `-1` (or `+3`) counter-clockwise.
    #[inline]
    pub fn rotated(self, delta: i32) -> Self {
        Rotation::normalize(self.0 as i32 + delta)
    }

    /// Odd quarter turns swap an archetype's width and height.
    #[inline]
    pub fn swaps_axes(self) -> bool {
        self.0 % 2 == 1
    }

    /// Effective footprint of a `w x h` archetype under this rotation.
    #[inline]
    pub fn apply_to_size(self, w: i32, h: i32) -> (i32, i32) {
        if self.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }
}

/// Mirror state of a placed module.
///
/// The four states form a Klein four-group under [`Mirror::flipped_horizontal`]
/// and [`Mirror::flipped_vertical`]: each flip is self-inverse and the two
/// flips commute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mirror {
    /// Not mirrored.
    #[default]
    None = 0,
    /// Flipped left-right.
    Horizontal = 1,
    /// Flipped top-bottom.
    Vertical = 2,
    /// Flipped on both axes (equals a 180 degree rotation of the image).
    Both = 3,
}

impl Mirror {
    /// Canonicalizes any integer mirror index, including negatives.
    #[inline]
    pub fn normalize(index: i32) -> Self {
        match (index % 4 + 4) % 4 {
            0 => Mirror::None,
            1 => Mirror::Horizontal,
            2 => Mirror::Vertical,
            _ => Mirror::Both,
        }
    }

    /// Index in `0..4`, stable across persistence.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Applies a horizontal flip on top of the current state.
    pub fn flipped_horizontal(self) -> Self {
        match self {
            Mirror::None => Mirror::Horizontal,
            Mirror::Horizontal => Mirror::None,
            Mirror::Vertical => Mirror::Both,
            Mirror::Both => Mirror::Vertical,
        }
    }

    /// Applies a vertical flip on top of the current state.
    pub fn flipped_vertical(self) -> Self {
        match self {
            Mirror::None => Mirror::Vertical,
            Mirror::Horizontal => Mirror::Both,
            Mirror::Vertical => Mirror::None,
            Mirror::Both => Mirror::Horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_covers_negatives() {
        for turns in -9..=9 {
            let r = Rotation::normalize(turns);
            assert!(r.quarter_turns() < 4, "turns={turns}");
        }
        assert_eq!(Rotation::normalize(-1), Rotation::R270);
        assert_eq!(Rotation::normalize(-4), Rotation::R0);
        assert_eq!(Rotation::normalize(5), Rotation::R90);
    }

    #[test]
    fn rotated_composes_mod_four() {
        assert_eq!(Rotation::R270.rotated(1), Rotation::R0);
        assert_eq!(Rotation::R0.rotated(-1), Rotation::R270);
        assert_eq!(Rotation::R90.rotated(3), Rotation::R0);
    }

    #[test]
    fn odd_turns_swap_axes() {
        assert_eq!(Rotation::R0.apply_to_size(2, 1), (2, 1));
        assert_eq!(Rotation::R90.apply_to_size(2, 1), (1, 2));
        assert_eq!(Rotation::R180.apply_to_size(2, 1), (2, 1));
        assert_eq!(Rotation::R270.apply_to_size(2, 1), (1, 2));
    }

    const ALL: [Mirror; 4] = [Mirror::None, Mirror::Horizontal, Mirror::Vertical, Mirror::Both];

    #[test]
    fn flips_are_self_inverse() {
        for m in ALL {
            assert_eq!(m.flipped_horizontal().flipped_horizontal(), m);
            assert_eq!(m.flipped_vertical().flipped_vertical(), m);
        }
    }

    #[test]
    fn flips_commute() {
        for m in ALL {
            assert_eq!(
                m.flipped_horizontal().flipped_vertical(),
                m.flipped_vertical().flipped_horizontal()
            );
        }
    }

    #[test]
    fn composition_table_is_exact() {
        use Mirror::*;
        assert_eq!(None.flipped_horizontal(), Horizontal);
        assert_eq!(None.flipped_vertical(), Vertical);
        assert_eq!(Horizontal.flipped_horizontal(), None);
        assert_eq!(Horizontal.flipped_vertical(), Both);
        assert_eq!(Vertical.flipped_horizontal(), Both);
        assert_eq!(Vertical.flipped_vertical(), None);
        assert_eq!(Both.flipped_horizontal(), Vertical);
        assert_eq!(Both.flipped_vertical(), Horizontal);
    }

    #[test]
    fn mirror_normalize_wraps() {
        assert_eq!(Mirror::normalize(-1), Mirror::Both);
        assert_eq!(Mirror::normalize(4), Mirror::None);
        assert_eq!(Mirror::normalize(6), Mirror::Vertical);
    }
}
