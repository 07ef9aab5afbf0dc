//! Colon and blinking-dot overlays, animated on the semitick independently
//! of the main transition machinery.

use serde::{Deserialize, Serialize};

use crate::frame::FrameBuffer;
use crate::segment::SegmentMask;

// ============================================================================
// Colon animation
// ============================================================================

/// One frame of a colon animation. A `hold` of zero marks the end of a
/// style table and wraps playback to the first frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColonFrame {
    /// Semiticks this frame stays up.
    hold: u16,
    /// Light the decimal point of the cell left of the colon.
    dot_before: bool,
    pattern: SegmentMask,
}

const END_MARK: ColonFrame = ColonFrame {
    hold: 0,
    dot_before: false,
    pattern: SegmentMask::BLANK,
};

/// Both colon dots, held steady.
const STYLE_STEADY: [ColonFrame; 2] = [
    ColonFrame {
        hold: 500,
        dot_before: false,
        pattern: SegmentMask::COLON,
    },
    END_MARK,
];

/// Both dots blinking at 1 Hz.
const STYLE_BLINK: [ColonFrame; 3] = [
    ColonFrame {
        hold: 500,
        dot_before: false,
        pattern: SegmentMask::COLON,
    },
    ColonFrame {
        hold: 500,
        dot_before: false,
        pattern: SegmentMask::BLANK,
    },
    END_MARK,
];

/// A single dot bouncing top to bottom, catching the neighboring decimal
/// point on the way down.
const STYLE_BOUNCE: [ColonFrame; 3] = [
    ColonFrame {
        hold: 250,
        dot_before: false,
        pattern: SegmentMask::B,
    },
    ColonFrame {
        hold: 250,
        dot_before: true,
        pattern: SegmentMask::C,
    },
    END_MARK,
];

fn style_table(style: u8) -> &'static [ColonFrame] {
    match style {
        1 => &STYLE_BLINK,
        2 => &STYLE_BOUNCE,
        _ => &STYLE_STEADY,
    }
}

/// Plays the selected colon style into every colon cell of the frame.
///
/// Ticked only while no transition is in flight; a paused animation
/// resumes exactly where it left off.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct ColonAnimator {
    style: u8,
    frame_index: u8,
    countdown: u16,
}

impl ColonAnimator {
    /// Number of selectable styles; style indices wrap modulo this.
    pub const STYLE_COUNT: u8 = 3;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: 0,
            frame_index: 0,
            countdown: 0,
        }
    }

    /// The active style index.
    #[must_use]
    pub const fn style(&self) -> u8 {
        self.style
    }

    /// Selects a style and restarts it from its first frame on the next
    /// tick. Out-of-range indices wrap.
    pub fn set_style(&mut self, style: u8) {
        self.style = style % Self::STYLE_COUNT;
        self.frame_index = 0;
        self.countdown = 0;
    }

    /// Advances one semitick, repainting the colon cells on frame change.
    pub fn tick(&mut self, frame: &mut FrameBuffer) {
        if self.countdown > 0 {
            self.countdown = self.countdown.saturating_sub(1);
            return;
        }
        let entry = self.next_frame();
        frame.paint_colons(entry.pattern, entry.dot_before);
        self.countdown = entry.hold.saturating_sub(1);
    }

    /// Returns the frame at the cursor and moves the cursor along,
    /// wrapping at the end marker.
    fn next_frame(&mut self) -> ColonFrame {
        let table = style_table(self.style);
        let mut entry = table
            .get(usize::from(self.frame_index))
            .copied()
            .unwrap_or(END_MARK);
        if entry.hold == 0 {
            self.frame_index = 0;
            entry = table.first().copied().unwrap_or(END_MARK);
        }
        self.frame_index = self.frame_index.saturating_add(1);
        entry
    }
}

// ============================================================================
// Dot blink
// ============================================================================

/// How fast flagged separator dots blink.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DotBlinkRate {
    /// Separator dots stay lit.
    #[default]
    Off,
    /// Toggle every half second.
    Slow,
    /// Toggle four times a second.
    Fast,
}

impl DotBlinkRate {
    const fn interval(self) -> u16 {
        match self {
            Self::Off => 0,
            Self::Slow => 500,
            Self::Fast => 125,
        }
    }
}

/// Blinks every cell flagged as a separator dot by toggling one shared
/// hidden flag.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct DotBlink {
    rate: DotBlinkRate,
    hidden: bool,
    countdown: u16,
}

impl DotBlink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rate: DotBlinkRate::Off,
            hidden: false,
            countdown: 0,
        }
    }

    /// The active rate.
    #[must_use]
    pub const fn rate(&self) -> DotBlinkRate {
        self.rate
    }

    /// Changes the blink rate. Turning blinking off restores any dots the
    /// previous rate had hidden.
    pub fn set_rate(&mut self, rate: DotBlinkRate, frame: &mut FrameBuffer) {
        self.rate = rate;
        self.countdown = 0;
        if rate == DotBlinkRate::Off && self.hidden {
            self.hidden = false;
            frame.apply_dot_hidden(false);
        }
    }

    /// Advances one semitick, toggling the shared hidden flag each time
    /// the rate's interval elapses.
    pub fn tick(&mut self, frame: &mut FrameBuffer) {
        if self.rate == DotBlinkRate::Off {
            return;
        }
        if self.countdown > 0 {
            self.countdown = self.countdown.saturating_sub(1);
            return;
        }
        self.hidden = !self.hidden;
        frame.apply_dot_hidden(self.hidden);
        self.countdown = self.rate.interval().saturating_sub(1);
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;
    use crate::font::GlyphSet;

    fn clock_frame() -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        frame.write_str(0, "12:34:56 ", GlyphSet::Lowercase);
        frame.commit();
        frame
    }

    #[test]
    fn test_steady_style_paints_both_halves_once() {
        let mut frame = clock_frame();
        let mut colon = ColonAnimator::new();
        colon.tick(&mut frame);
        assert_eq!(frame.pending_at(2), SegmentMask::COLON);
        assert_eq!(frame.shown_at(2), SegmentMask::COLON);
        assert_eq!(frame.shown_at(5), SegmentMask::COLON);
        // The glyph cells around the colons are untouched.
        assert_ne!(frame.shown_at(3), SegmentMask::BLANK);
    }

    #[test]
    fn test_blink_style_alternates_after_each_hold() {
        let mut frame = clock_frame();
        let mut colon = ColonAnimator::new();
        colon.set_style(1);
        colon.tick(&mut frame);
        assert_eq!(frame.shown_at(2), SegmentMask::COLON);
        for _ in 0..500 {
            colon.tick(&mut frame);
        }
        assert_eq!(frame.shown_at(2), SegmentMask::BLANK);
        for _ in 0..500 {
            colon.tick(&mut frame);
        }
        assert_eq!(frame.shown_at(2), SegmentMask::COLON);
    }

    #[test]
    fn test_bounce_style_drives_the_preceding_dot() {
        let mut frame = clock_frame();
        let mut colon = ColonAnimator::new();
        colon.set_style(2);
        colon.tick(&mut frame);
        assert_eq!(frame.shown_at(2), SegmentMask::B);
        assert!(!frame.shown_at(1).contains(SegmentMask::DOT));
        for _ in 0..250 {
            colon.tick(&mut frame);
        }
        assert_eq!(frame.shown_at(2), SegmentMask::C);
        assert!(frame.shown_at(1).contains(SegmentMask::DOT));
        // Wraparound clears the neighbor dot again.
        for _ in 0..250 {
            colon.tick(&mut frame);
        }
        assert_eq!(frame.shown_at(2), SegmentMask::B);
        assert!(!frame.shown_at(1).contains(SegmentMask::DOT));
    }

    #[test]
    fn test_style_indices_wrap() {
        let mut colon = ColonAnimator::new();
        colon.set_style(ColonAnimator::STYLE_COUNT);
        assert_eq!(colon.style(), 0);
    }

    #[test]
    fn test_dot_blink_toggles_flagged_cells() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(3, 7, false);
        frame.set_blink_dot(3, true);
        frame.commit();
        let mut dots = DotBlink::new();
        dots.set_rate(DotBlinkRate::Fast, &mut frame);
        assert!(frame.shown_at(3).contains(SegmentMask::DOT));

        dots.tick(&mut frame);
        assert!(!frame.shown_at(3).contains(SegmentMask::DOT));
        for _ in 0..125 {
            dots.tick(&mut frame);
        }
        assert!(frame.shown_at(3).contains(SegmentMask::DOT));
    }

    #[test]
    fn test_dot_blink_off_restores_hidden_dots() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(3, 7, false);
        frame.set_blink_dot(3, true);
        frame.commit();
        let mut dots = DotBlink::new();
        dots.set_rate(DotBlinkRate::Slow, &mut frame);
        dots.tick(&mut frame);
        assert!(!frame.shown_at(3).contains(SegmentMask::DOT));

        dots.set_rate(DotBlinkRate::Off, &mut frame);
        assert!(frame.shown_at(3).contains(SegmentMask::DOT));
        // Further ticks are inert.
        for _ in 0..1000 {
            dots.tick(&mut frame);
        }
        assert!(frame.shown_at(3).contains(SegmentMask::DOT));
    }

    #[test]
    fn test_unflagged_cells_ignore_the_hidden_flag() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(1, 5, false);
        frame.dot_select(1, 1);
        frame.commit();
        let mut dots = DotBlink::new();
        dots.set_rate(DotBlinkRate::Fast, &mut frame);
        dots.tick(&mut frame);
        assert!(frame.shown_at(1).contains(SegmentMask::DOT));
    }
}
