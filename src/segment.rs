//! Segment-level value type for seven-segment/VFD glyphs.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

// ============================================================================
// SegmentMask
// ============================================================================

/// One display cell's worth of lit segments.
///
/// Bits A through G are the seven conventional segments; bit H is the
/// decimal point. Masks combine with ordinary bitwise operators, so glyphs,
/// overlays, and animation fragments can be OR'd together freely without
/// mixing with unrelated byte values.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentMask(u8);

impl SegmentMask {
    /// Segment A, the top bar.
    pub const A: Self = Self(0b_0000_0001);
    /// Segment B, the upper-right vertical.
    pub const B: Self = Self(0b_0000_0010);
    /// Segment C, the lower-right vertical.
    pub const C: Self = Self(0b_0000_0100);
    /// Segment D, the bottom bar.
    pub const D: Self = Self(0b_0000_1000);
    /// Segment E, the lower-left vertical.
    pub const E: Self = Self(0b_0001_0000);
    /// Segment F, the upper-left vertical.
    pub const F: Self = Self(0b_0010_0000);
    /// Segment G, the middle bar.
    pub const G: Self = Self(0b_0100_0000);
    /// The decimal point, bit H.
    pub const DOT: Self = Self(0b_1000_0000);

    /// No segments lit.
    pub const BLANK: Self = Self(0);

    /// Both verticals on the right side, which a colon cell lights as its
    /// two dots.
    pub const COLON: Self = Self(Self::B.0 | Self::C.0);

    /// Wraps a raw segment byte.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// The mask holding only segment number `index` (A is 0, the dot is 7).
    /// Out-of-range indices yield [`Self::BLANK`].
    #[must_use]
    pub const fn single(index: usize) -> Self {
        if index < 8 { Self(1 << index) } else { Self::BLANK }
    }

    /// The raw segment byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` when no segment is lit.
    #[must_use]
    pub const fn is_blank(self) -> bool {
        self.0 == 0
    }

    /// `true` when every segment of `other` is lit in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` when nothing beyond the middle bar and the decimal point is lit.
    ///
    /// A dash or a lone dot reads as filler between fields, not as a glyph.
    #[must_use]
    pub const fn is_filler(self) -> bool {
        self.0 & !(Self::G.0 | Self::DOT.0) == 0
    }

    /// `self` with the segments of `other` cleared.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// The glyph pushed up one half-row: G moves to A, E to F, C to B,
    /// D to G; everything else scrolls off the top.
    #[must_use]
    pub const fn shift_up_one(self) -> Self {
        let mut bits = 0;
        if self.contains(Self::G) {
            bits |= Self::A.0;
        }
        if self.contains(Self::E) {
            bits |= Self::F.0;
        }
        if self.contains(Self::C) {
            bits |= Self::B.0;
        }
        if self.contains(Self::D) {
            bits |= Self::G.0;
        }
        Self(bits)
    }

    /// The glyph pushed up two half-rows: only D survives, as A.
    #[must_use]
    pub const fn shift_up_two(self) -> Self {
        if self.contains(Self::D) {
            Self::A
        } else {
            Self::BLANK
        }
    }

    /// The glyph pushed down one half-row: A moves to G, F to E, B to C,
    /// G to D; everything else scrolls off the bottom.
    #[must_use]
    pub const fn shift_down_one(self) -> Self {
        let mut bits = 0;
        if self.contains(Self::A) {
            bits |= Self::G.0;
        }
        if self.contains(Self::F) {
            bits |= Self::E.0;
        }
        if self.contains(Self::B) {
            bits |= Self::C.0;
        }
        if self.contains(Self::G) {
            bits |= Self::D.0;
        }
        Self(bits)
    }

    /// The glyph pushed down two half-rows: only A survives, as D.
    #[must_use]
    pub const fn shift_down_two(self) -> Self {
        if self.contains(Self::A) {
            Self::D
        } else {
            Self::BLANK
        }
    }

    /// Mid-scroll blend of the two glyphs straddling a cell boundary.
    ///
    /// `left` is the glyph exiting leftward, `right` the one entering from
    /// the right. The result lights F from `left`'s B, E from `left`'s E,
    /// B from `right`'s F, and C from `right`'s E; no other bit is ever set.
    #[must_use]
    pub const fn combine_left_right(left: Self, right: Self) -> Self {
        let mut bits = 0;
        if left.contains(Self::B) {
            bits |= Self::F.0;
        }
        if left.contains(Self::E) {
            bits |= Self::E.0;
        }
        if right.contains(Self::F) {
            bits |= Self::B.0;
        }
        if right.contains(Self::E) {
            bits |= Self::C.0;
        }
        Self(bits)
    }
}

impl BitOr for SegmentMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SegmentMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SegmentMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for SegmentMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}
