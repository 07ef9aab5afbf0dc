//! Double-buffered frame state for the display positions.

use crate::font::{self, Glyph, GlyphSet};
use crate::segment::SegmentMask;

// ============================================================================
// Constants
// ============================================================================

/// The number of display positions, left to right.
pub(crate) const CELL_COUNT_U8: u8 = 9;
/// The number of display positions, as an index bound.
pub const CELL_COUNT: usize = CELL_COUNT_U8 as usize;

/// The number of segment lines per position (seven segments plus the dot).
pub(crate) const SEGMENT_COUNT_U8: u8 = 8;
/// The number of segment lines per position, as an index bound.
pub const SEGMENT_COUNT: usize = SEGMENT_COUNT_U8 as usize;

// ============================================================================
// PositionSet
// ============================================================================

/// A set of display positions, used for the colon and blinking-dot
/// overlays and for driving several positions at once.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionSet(u16);

impl PositionSet {
    /// The set with no positions.
    pub const EMPTY: Self = Self(0);

    /// The set holding only `pos`.
    #[must_use]
    pub fn single(pos: usize) -> Self {
        let mut set = Self::EMPTY;
        set.insert(pos);
        set
    }

    /// Adds `pos`; out-of-range positions are ignored.
    pub fn insert(&mut self, pos: usize) {
        if pos < CELL_COUNT {
            self.0 |= 1 << pos;
        }
    }

    /// Removes `pos`.
    pub fn remove(&mut self, pos: usize) {
        if pos < CELL_COUNT {
            self.0 &= !(1 << pos);
        }
    }

    /// Adds or removes `pos`.
    pub fn set(&mut self, pos: usize, member: bool) {
        if member {
            self.insert(pos);
        } else {
            self.remove(pos);
        }
    }

    /// `true` when `pos` is in the set.
    #[must_use]
    pub fn contains(self, pos: usize) -> bool {
        pos < CELL_COUNT && self.0 & (1 << pos) != 0
    }

    /// `true` when no position is in the set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The member positions in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..CELL_COUNT).filter(move |&pos| self.contains(pos))
    }
}

// ============================================================================
// Pad
// ============================================================================

/// How [`FrameBuffer::write_two_digit`] fills a two-cell field.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pad {
    /// Right-adjusted with a leading zero.
    #[default]
    Zero,
    /// Right-adjusted with a leading space.
    Space,
    /// Single digits move to the left cell and blank the right one.
    LeftAdjust,
}

// ============================================================================
// FrameBuffer
// ============================================================================

/// The pending and shown segment arrays plus their overlay sets.
///
/// Foreground writes land in `pending`; the transition engine is the only
/// mutator of `shown`, either instantly or at the end of an animation.
/// While no transition is staged the two halves are equal.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pending: [SegmentMask; CELL_COUNT],
    shown: [SegmentMask; CELL_COUNT],
    pending_colons: PositionSet,
    shown_colons: PositionSet,
    pending_blink_dots: PositionSet,
    shown_blink_dots: PositionSet,
}

impl FrameBuffer {
    /// An all-blank buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: [SegmentMask::BLANK; CELL_COUNT],
            shown: [SegmentMask::BLANK; CELL_COUNT],
            pending_colons: PositionSet::EMPTY,
            shown_colons: PositionSet::EMPTY,
            pending_blink_dots: PositionSet::EMPTY,
            shown_blink_dots: PositionSet::EMPTY,
        }
    }

    /// The staged mask at `pos`, blank when out of range.
    #[must_use]
    pub fn pending_at(&self, pos: usize) -> SegmentMask {
        self.pending.get(pos).copied().unwrap_or(SegmentMask::BLANK)
    }

    /// The displayed mask at `pos`, blank when out of range.
    #[must_use]
    pub fn shown_at(&self, pos: usize) -> SegmentMask {
        self.shown.get(pos).copied().unwrap_or(SegmentMask::BLANK)
    }

    /// Positions staged as colon cells.
    #[must_use]
    pub const fn pending_colons(&self) -> PositionSet {
        self.pending_colons
    }

    /// Positions currently displayed as colon cells.
    #[must_use]
    pub const fn shown_colons(&self) -> PositionSet {
        self.shown_colons
    }

    /// Positions staged as blinking-dot separators.
    #[must_use]
    pub const fn pending_blink_dots(&self) -> PositionSet {
        self.pending_blink_dots
    }

    /// Positions currently displayed as blinking-dot separators.
    #[must_use]
    pub const fn shown_blink_dots(&self) -> PositionSet {
        self.shown_blink_dots
    }

    /// Writes one character at `pos`. A colon claims the cell as a colon
    /// overlay position instead of drawing a glyph.
    pub fn write_char(&mut self, pos: usize, ch: char, set: GlyphSet) {
        match font::encode(ch, set) {
            Glyph::Mask(mask) => self.set_cell(pos, mask),
            Glyph::Colon => {
                self.set_cell(pos, SegmentMask::BLANK);
                self.pending_colons.insert(pos);
            }
        }
    }

    /// Writes the digit `n % 10` at `pos`.
    pub fn write_digit(&mut self, pos: usize, n: u8, alt_nine: bool) {
        self.set_cell(pos, font::digit_mask(n, alt_nine));
    }

    /// Writes `value` into the two cells at `pos` and `pos + 1`.
    ///
    /// Negative values render as a minus sign followed by the magnitude's
    /// last digit; everything else is reduced modulo 100 first.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "Modulo is required for digit extraction"
    )]
    pub fn write_two_digit(&mut self, pos: usize, value: i16, pad: Pad, alt_nine: bool) {
        let right = pos.saturating_add(1);
        if value < 0 {
            let ones = u8::try_from(value.unsigned_abs() % 10).unwrap_or(0);
            self.set_cell(pos, SegmentMask::G);
            self.write_digit(right, ones, alt_nine);
            return;
        }

        let reduced = u8::try_from(value.unsigned_abs() % 100).unwrap_or(0);
        let tens = reduced / 10;
        let ones = reduced % 10;
        match pad {
            Pad::Zero => {
                self.write_digit(pos, tens, alt_nine);
                self.write_digit(right, ones, alt_nine);
            }
            Pad::Space => {
                if tens == 0 {
                    self.set_cell(pos, SegmentMask::BLANK);
                } else {
                    self.write_digit(pos, tens, alt_nine);
                }
                self.write_digit(right, ones, alt_nine);
            }
            Pad::LeftAdjust => {
                if tens == 0 {
                    self.write_digit(pos, ones, alt_nine);
                    self.set_cell(right, SegmentMask::BLANK);
                } else {
                    self.write_digit(pos, tens, alt_nine);
                    self.write_digit(right, ones, alt_nine);
                }
            }
        }
    }

    /// Writes `text` starting at `start`, truncating at the buffer end.
    ///
    /// Starting at position 0 replaces the whole line: the leading cell is
    /// cleared first and cells past the text are padded with blanks.
    pub fn write_str(&mut self, start: usize, text: &str, set: GlyphSet) {
        if start == 0 {
            self.clear(0);
        }
        let mut pos = start;
        for ch in text.chars() {
            if pos >= CELL_COUNT {
                break;
            }
            self.write_char(pos, ch, set);
            pos = pos.saturating_add(1);
        }
        if start == 0 {
            while pos < CELL_COUNT {
                self.set_cell(pos, SegmentMask::BLANK);
                pos = pos.saturating_add(1);
            }
        }
    }

    /// Blanks the cell at `pos`.
    pub fn clear(&mut self, pos: usize) {
        self.set_cell(pos, SegmentMask::BLANK);
    }

    /// Blanks every cell and drops all staged overlays.
    pub fn clear_all(&mut self) {
        self.pending = [SegmentMask::BLANK; CELL_COUNT];
        self.pending_colons = PositionSet::EMPTY;
        self.pending_blink_dots = PositionSet::EMPTY;
    }

    /// Lights the decimal point on `first..=last`, skipping cells that are
    /// blank once the middle bar and the dot itself are ignored.
    pub fn dot_select(&mut self, first: usize, last: usize) {
        for pos in first..=last.min(CELL_COUNT.saturating_sub(1)) {
            if let Some(cell) = self.pending.get_mut(pos) {
                if !cell.is_filler() {
                    *cell |= SegmentMask::DOT;
                }
            }
        }
    }

    /// Flags or unflags `pos` as a blinking-dot separator, lighting or
    /// clearing its decimal point to match.
    pub fn set_blink_dot(&mut self, pos: usize, enabled: bool) {
        self.pending_blink_dots.set(pos, enabled);
        if let Some(cell) = self.pending.get_mut(pos) {
            if enabled {
                *cell |= SegmentMask::DOT;
            } else {
                *cell = cell.without(SegmentMask::DOT);
            }
        }
    }

    /// Publishes the staged half: masks and both overlay sets.
    pub(crate) fn commit(&mut self) {
        self.shown = self.pending;
        self.shown_colons = self.pending_colons;
        self.shown_blink_dots = self.pending_blink_dots;
    }

    /// Paints `pattern` into every colon cell of both halves and drives
    /// each preceding cell's decimal point per `dot_before`.
    pub(crate) fn paint_colons(&mut self, pattern: SegmentMask, dot_before: bool) {
        for pos in self.pending_colons.iter() {
            if let Some(cell) = self.pending.get_mut(pos) {
                *cell = pattern;
            }
            Self::drive_dot(&mut self.pending, pos, dot_before);
        }
        for pos in self.shown_colons.iter() {
            if let Some(cell) = self.shown.get_mut(pos) {
                *cell = pattern;
            }
            Self::drive_dot(&mut self.shown, pos, dot_before);
        }
    }

    /// Applies the blink-dot hidden flag to every flagged cell of both
    /// halves.
    pub(crate) fn apply_dot_hidden(&mut self, hidden: bool) {
        for pos in self.pending_blink_dots.iter() {
            if let Some(cell) = self.pending.get_mut(pos) {
                *cell = if hidden {
                    cell.without(SegmentMask::DOT)
                } else {
                    *cell | SegmentMask::DOT
                };
            }
        }
        for pos in self.shown_blink_dots.iter() {
            if let Some(cell) = self.shown.get_mut(pos) {
                *cell = if hidden {
                    cell.without(SegmentMask::DOT)
                } else {
                    *cell | SegmentMask::DOT
                };
            }
        }
    }

    /// `true` when the staged and displayed halves are identical.
    #[must_use]
    pub fn halves_match(&self) -> bool {
        self.pending == self.shown
            && self.pending_colons == self.shown_colons
            && self.pending_blink_dots == self.shown_blink_dots
    }

    fn set_cell(&mut self, pos: usize, mask: SegmentMask) {
        if let Some(cell) = self.pending.get_mut(pos) {
            *cell = mask;
            self.pending_colons.remove(pos);
        }
    }

    fn drive_dot(cells: &mut [SegmentMask; CELL_COUNT], colon_pos: usize, lit: bool) {
        let Some(before) = colon_pos.checked_sub(1) else {
            return;
        };
        if let Some(cell) = cells.get_mut(before) {
            *cell = if lit {
                *cell | SegmentMask::DOT
            } else {
                cell.without(SegmentMask::DOT)
            };
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    #[test]
    fn test_write_digit_lands_in_pending_only() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(2, 7, false);
        assert_eq!(frame.pending_at(2), SegmentMask::new(0b_0000_0111));
        assert_eq!(frame.shown_at(2), SegmentMask::BLANK);
    }

    #[test]
    fn test_out_of_range_writes_are_ignored() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(CELL_COUNT, 5, false);
        frame.write_char(CELL_COUNT.saturating_add(3), 'x', GlyphSet::Lowercase);
        assert_eq!(frame, FrameBuffer::new());
    }

    #[test]
    fn test_two_digit_padding_modes() {
        let mut frame = FrameBuffer::new();
        frame.write_two_digit(1, 7, Pad::Zero, false);
        assert_eq!(frame.pending_at(1), crate::font::digit_mask(0, false));
        assert_eq!(frame.pending_at(2), crate::font::digit_mask(7, false));

        frame.write_two_digit(1, 7, Pad::Space, false);
        assert_eq!(frame.pending_at(1), SegmentMask::BLANK);

        frame.write_two_digit(1, 7, Pad::LeftAdjust, false);
        assert_eq!(frame.pending_at(1), crate::font::digit_mask(7, false));
        assert_eq!(frame.pending_at(2), SegmentMask::BLANK);

        frame.write_two_digit(1, 42, Pad::LeftAdjust, false);
        assert_eq!(frame.pending_at(1), crate::font::digit_mask(4, false));
        assert_eq!(frame.pending_at(2), crate::font::digit_mask(2, false));
    }

    #[test]
    fn test_two_digit_negative_shows_sign_and_magnitude() {
        let mut frame = FrameBuffer::new();
        frame.write_two_digit(4, -3, Pad::Zero, false);
        assert_eq!(frame.pending_at(4), SegmentMask::G);
        assert_eq!(frame.pending_at(5), crate::font::digit_mask(3, false));
    }

    #[test]
    fn test_write_str_truncates_at_buffer_end() {
        let mut frame = FrameBuffer::new();
        frame.write_str(7, "abc", GlyphSet::Lowercase);
        assert_ne!(frame.pending_at(7), SegmentMask::BLANK);
        assert_ne!(frame.pending_at(8), SegmentMask::BLANK);
        // 'c' fell off the end.
        assert_eq!(frame.pending_at(6), SegmentMask::BLANK);
    }

    #[test]
    fn test_write_str_from_zero_pads_the_tail() {
        let mut frame = FrameBuffer::new();
        frame.write_str(3, "xxxxxx", GlyphSet::Lowercase);
        frame.write_str(0, "hi", GlyphSet::Lowercase);
        assert_ne!(frame.pending_at(0), SegmentMask::BLANK);
        assert_ne!(frame.pending_at(1), SegmentMask::BLANK);
        for pos in 2..CELL_COUNT {
            assert_eq!(frame.pending_at(pos), SegmentMask::BLANK, "tail at {pos}");
        }
    }

    #[test]
    fn test_write_str_from_nonzero_leaves_neighbors_alone() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(1, 8, false);
        frame.write_str(4, "no", GlyphSet::Lowercase);
        assert_eq!(frame.pending_at(1), crate::font::digit_mask(8, false));
    }

    #[test]
    fn test_colon_character_claims_the_cell() {
        let mut frame = FrameBuffer::new();
        frame.write_str(1, "1:2", GlyphSet::Lowercase);
        assert!(frame.pending_colons().contains(2));
        assert_eq!(frame.pending_at(2), SegmentMask::BLANK);
        // Overwriting the cell with a glyph releases the claim.
        frame.write_digit(2, 0, false);
        assert!(!frame.pending_colons().contains(2));
    }

    #[test]
    fn test_dot_select_skips_filler_cells() {
        let mut frame = FrameBuffer::new();
        frame.clear_all();
        frame.dot_select(0, CELL_COUNT.saturating_sub(1));
        assert_eq!(frame, FrameBuffer::new());

        frame.write_digit(2, 1, false);
        frame.write_char(3, '-', GlyphSet::Lowercase);
        frame.dot_select(2, 3);
        assert!(frame.pending_at(2).contains(SegmentMask::DOT));
        // The dash is filler; no stray dot.
        assert_eq!(frame.pending_at(3), SegmentMask::G);
    }

    #[test]
    fn test_commit_copies_masks_and_overlays() {
        let mut frame = FrameBuffer::new();
        frame.write_str(0, "1:23", GlyphSet::Lowercase);
        frame.set_blink_dot(4, true);
        assert!(!frame.halves_match());
        frame.commit();
        assert!(frame.halves_match());
        assert!(frame.shown_colons().contains(1));
        assert!(frame.shown_blink_dots().contains(4));
    }

    #[test]
    fn test_blink_dot_toggle_drives_the_dot_segment() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(5, 2, false);
        frame.set_blink_dot(5, true);
        assert!(frame.pending_at(5).contains(SegmentMask::DOT));
        frame.set_blink_dot(5, false);
        assert!(!frame.pending_at(5).contains(SegmentMask::DOT));
        assert!(frame.pending_blink_dots().is_empty());
    }

    #[test]
    fn test_paint_colons_touches_both_halves_and_the_preceding_dot() {
        let mut frame = FrameBuffer::new();
        frame.write_str(0, "1:2", GlyphSet::Lowercase);
        frame.commit();
        let pattern = SegmentMask::B | SegmentMask::C;
        frame.paint_colons(pattern, true);
        assert_eq!(frame.pending_at(1), pattern);
        assert_eq!(frame.shown_at(1), pattern);
        assert!(frame.pending_at(0).contains(SegmentMask::DOT));
        assert!(frame.shown_at(0).contains(SegmentMask::DOT));
        frame.paint_colons(pattern, false);
        assert!(!frame.pending_at(0).contains(SegmentMask::DOT));
    }

    #[test]
    fn test_position_set_iteration_order() {
        let mut set = PositionSet::EMPTY;
        set.insert(6);
        set.insert(1);
        set.insert(CELL_COUNT); // ignored
        let positions: [Option<usize>; 3] = {
            let mut iter = set.iter();
            [iter.next(), iter.next(), iter.next()]
        };
        assert_eq!(positions, [Some(1), Some(6), None]);
    }
}
