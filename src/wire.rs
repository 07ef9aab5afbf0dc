//! Serialization to the external shift-register display driver.
//!
//! The driver latches a fixed-width bit vector, one bit per output line.
//! Which line selects which grid position or segment anode is a property
//! of the board wiring, captured here as a [`DriverMap`].

use crate::frame::{CELL_COUNT, PositionSet, SEGMENT_COUNT};
use crate::segment::SegmentMask;

/// Output lines on the driver chip.
pub const OUTPUT_LINE_COUNT: usize = 20;

// ============================================================================
// DriveWord
// ============================================================================

/// One latch-full of driver output lines.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveWord(u32);

impl DriveWord {
    /// Every line low; the display shows nothing.
    pub const EMPTY: Self = Self(0);

    /// The raw line bits, line 0 in bit 0.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `true` when output line `index` is high.
    #[must_use]
    pub const fn line(self, index: usize) -> bool {
        index < OUTPUT_LINE_COUNT && self.0 & (1 << index) != 0
    }

    /// Drives output line `index` high; out-of-range lines are ignored.
    pub fn set_line(&mut self, index: usize) {
        if index < OUTPUT_LINE_COUNT {
            self.0 |= 1 << index;
        }
    }
}

// ============================================================================
// DriverMap
// ============================================================================

/// Board wiring: which driver line selects each grid position and each
/// segment anode.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverMap {
    digit_lines: [u8; CELL_COUNT],
    segment_lines: [u8; SEGMENT_COUNT],
}

impl DriverMap {
    /// The wiring of an IV-18 tube on a 20-line driver: grids on the low
    /// lines in display order, segment anodes A through the dot on the
    /// high lines.
    #[must_use]
    pub const fn iv18() -> Self {
        Self {
            digit_lines: [0, 1, 2, 3, 4, 5, 6, 7, 8],
            segment_lines: [12, 13, 14, 15, 16, 17, 18, 19],
        }
    }

    /// The drive word lighting `mask` on every position in `positions`.
    #[must_use]
    pub fn compose(&self, positions: PositionSet, mask: SegmentMask) -> DriveWord {
        let mut word = DriveWord::EMPTY;
        for pos in positions.iter() {
            if let Some(&line) = self.digit_lines.get(pos) {
                word.set_line(usize::from(line));
            }
        }
        for segment in 0..SEGMENT_COUNT {
            if mask.contains(SegmentMask::single(segment)) {
                if let Some(&line) = self.segment_lines.get(segment) {
                    word.set_line(usize::from(line));
                }
            }
        }
        word
    }
}

impl Default for DriverMap {
    fn default() -> Self {
        Self::iv18()
    }
}

// ============================================================================
// DriverBus
// ============================================================================

/// The electrical seam to the driver chip. Implemented over real pins on
/// hardware and over recorders in tests.
pub trait DriverBus {
    /// Asserts or releases the driver's blank input.
    fn set_blank(&mut self, blanked: bool);
    /// Clocks one bit into the shift register.
    fn shift_bit(&mut self, high: bool);
    /// Pulses the latch strobe, committing the shift register to the
    /// output latches.
    fn strobe(&mut self);
    /// Updates the brightness duty value.
    fn set_duty(&mut self, duty: u8);
}

/// Shifts `word` out to the driver.
///
/// The bracket is mandatory: blank before shifting, strobe, then unblank.
/// Skipping it shows transitional shift-register states as ghosting.
pub fn transmit(bus: &mut impl DriverBus, word: DriveWord) {
    bus.set_blank(true);
    for index in (0..OUTPUT_LINE_COUNT).rev() {
        bus.shift_bit(word.line(index));
    }
    bus.strobe();
    bus.set_blank(false);
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBus {
        blanked: bool,
        shifted: u32,
        bit_count: usize,
        shifts_while_unblanked: usize,
        strobes_while_unblanked: usize,
        strobe_bit_mark: Option<usize>,
    }

    impl DriverBus for RecordingBus {
        fn set_blank(&mut self, blanked: bool) {
            self.blanked = blanked;
        }

        fn shift_bit(&mut self, high: bool) {
            if !self.blanked {
                self.shifts_while_unblanked += 1;
            }
            self.shifted = (self.shifted << 1) | u32::from(high);
            self.bit_count += 1;
        }

        fn strobe(&mut self) {
            if !self.blanked {
                self.strobes_while_unblanked += 1;
            }
            self.strobe_bit_mark = Some(self.bit_count);
        }

        fn set_duty(&mut self, _duty: u8) {}
    }

    #[test]
    fn test_set_line_roundtrip_and_range_guard() {
        let mut word = DriveWord::EMPTY;
        word.set_line(0);
        word.set_line(19);
        word.set_line(20);
        word.set_line(usize::MAX);
        assert_eq!(word.bits(), (1 << 19) | 1);
        assert!(word.line(0));
        assert!(word.line(19));
        assert!(!word.line(20));
    }

    #[test]
    fn test_iv18_compose_selects_grid_and_anode_lines() {
        let map = DriverMap::iv18();
        let word = map.compose(PositionSet::single(0), SegmentMask::A);
        assert!(word.line(0));
        assert!(word.line(12));
        assert_eq!(word.bits().count_ones(), 2);

        let every_cell = {
            let mut set = PositionSet::EMPTY;
            for pos in 0..CELL_COUNT {
                set.insert(pos);
            }
            set
        };
        let word = map.compose(every_cell, !SegmentMask::BLANK);
        // Lines 9..=11 are unwired and stay low.
        assert_eq!(word.bits(), 0b_1111_1111_0001_1111_1111);
    }

    #[test]
    fn test_transmit_is_msb_first_inside_the_blank_bracket() {
        let map = DriverMap::iv18();
        let word = map.compose(PositionSet::single(4), SegmentMask::COLON);
        let mut bus = RecordingBus::default();
        transmit(&mut bus, word);

        assert_eq!(bus.bit_count, OUTPUT_LINE_COUNT);
        // Shifting MSB-first reproduces the word in arrival order.
        assert_eq!(bus.shifted, word.bits());
        assert_eq!(bus.shifts_while_unblanked, 0);
        assert_eq!(bus.strobes_while_unblanked, 0);
        assert_eq!(bus.strobe_bit_mark, Some(OUTPUT_LINE_COUNT));
        // The bracket released blank at the end.
        assert!(!bus.blanked);
    }

    #[test]
    fn test_empty_word_still_gets_a_full_frame_of_low_bits() {
        let mut bus = RecordingBus::default();
        transmit(&mut bus, DriveWord::EMPTY);
        assert_eq!(bus.bit_count, OUTPUT_LINE_COUNT);
        assert_eq!(bus.shifted, 0);
    }
}
