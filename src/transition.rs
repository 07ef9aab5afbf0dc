//! The state machine that animates staged content onto the display.

use core::cmp::Ordering;

use crate::frame::{CELL_COUNT, CELL_COUNT_U8, FrameBuffer};
use crate::segment::SegmentMask;

// ============================================================================
// Constants
// ============================================================================

/// Steps armed for a vertical roll: four visible shift phases plus the
/// arming step consumed by the first advance.
const ROLL_STEPS: u8 = 5;

/// Steps armed for a horizontal scroll; the seam crosses every cell in
/// half-cell increments.
const SCROLL_STEPS: u8 = 2 * CELL_COUNT_U8;

/// Semiticks between roll steps.
const ROLL_STEP_DELAY: u8 = 10;

/// Semiticks between scroll steps. Zero keeps the scroll at one step per
/// advance, so a full scroll takes exactly [`SCROLL_STEPS`] advances.
const SCROLL_STEP_DELAY: u8 = 0;

// ============================================================================
// TransitionKind
// ============================================================================

/// How staged content replaces displayed content.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionKind {
    /// Swap with no animation.
    #[default]
    Instant,
    /// Old glyphs roll off the top, new ones rise in from below.
    Up,
    /// Old glyphs roll off the bottom, new ones descend from above.
    Down,
    /// New content scrolls in from the right.
    Left,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Up,
    Down,
    Left,
}

impl Phase {
    const fn step_delay(self) -> u8 {
        match self {
            Self::Up | Self::Down => ROLL_STEP_DELAY,
            Self::Left => SCROLL_STEP_DELAY,
            Self::Idle => 0,
        }
    }
}

// ============================================================================
// Transition
// ============================================================================

/// One in-flight transition at most; requests made while one is running
/// are dropped, not queued.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct Transition {
    phase: Phase,
    steps_remaining: u8,
    inter_step_delay: u8,
}

impl Transition {
    /// A transition at rest.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            steps_remaining: 0,
            inter_step_delay: 0,
        }
    }

    /// `true` while an animation is in flight.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.steps_remaining != 0
    }

    /// Stages a transition. With animations disabled every kind collapses
    /// to [`TransitionKind::Instant`]. A request while one is in flight is
    /// silently ignored.
    pub fn request(
        &mut self,
        kind: TransitionKind,
        frame: &mut FrameBuffer,
        animations_enabled: bool,
    ) {
        if self.is_active() {
            return;
        }
        let kind = if animations_enabled {
            kind
        } else {
            TransitionKind::Instant
        };
        match kind {
            TransitionKind::Instant => frame.commit(),
            TransitionKind::Up => self.arm(Phase::Up, ROLL_STEPS),
            TransitionKind::Down => self.arm(Phase::Down, ROLL_STEPS),
            TransitionKind::Left => self.arm(Phase::Left, SCROLL_STEPS),
        }
    }

    /// Advances one semitick. On the final step the staged half is
    /// published and the machine returns to rest.
    pub fn advance(&mut self, frame: &mut FrameBuffer) {
        if !self.is_active() {
            return;
        }
        if self.inter_step_delay > 0 {
            self.inter_step_delay = self.inter_step_delay.saturating_sub(1);
            return;
        }
        self.steps_remaining = self.steps_remaining.saturating_sub(1);
        if self.steps_remaining == 0 {
            frame.commit();
            self.phase = Phase::Idle;
        } else {
            self.inter_step_delay = self.phase.step_delay();
        }
    }

    /// The instantaneous mask for `pos` at the current animation step.
    ///
    /// Position 0 sits out of every animation and renders blank while one
    /// is in flight; the leftmost cell carries the mode indicator and must
    /// hold still.
    #[must_use]
    pub fn resolve(&self, frame: &FrameBuffer, pos: usize) -> SegmentMask {
        if !self.is_active() {
            return frame.shown_at(pos);
        }
        if pos == 0 {
            return SegmentMask::BLANK;
        }
        match self.phase {
            Phase::Idle => frame.shown_at(pos),
            Phase::Up => match self.steps_remaining {
                4 => frame.shown_at(pos).shift_up_one(),
                3 => frame.shown_at(pos).shift_up_two(),
                2 => frame.pending_at(pos).shift_down_two(),
                1 => frame.pending_at(pos).shift_down_one(),
                _ => frame.shown_at(pos),
            },
            Phase::Down => match self.steps_remaining {
                4 => frame.shown_at(pos).shift_down_one(),
                3 => frame.shown_at(pos).shift_down_two(),
                2 => frame.pending_at(pos).shift_up_two(),
                1 => frame.pending_at(pos).shift_up_one(),
                _ => frame.shown_at(pos),
            },
            Phase::Left => self.resolve_scroll(frame, pos),
        }
    }

    #[expect(
        clippy::arithmetic_side_effects,
        reason = "steps_remaining <= 2 * CELL_COUNT and pos < CELL_COUNT keep every term in range"
    )]
    fn resolve_scroll(&self, frame: &FrameBuffer, pos: usize) -> SegmentMask {
        let t = usize::from(self.steps_remaining);
        let idx = CELL_COUNT + pos - (t >> 1);
        let entering = tape_glyph(frame, idx);
        if t & 1 == 1 {
            let leaving = tape_glyph(frame, idx - 1);
            SegmentMask::combine_left_right(leaving, entering)
        } else {
            entering
        }
    }

    fn arm(&mut self, phase: Phase, steps: u8) {
        self.phase = phase;
        self.steps_remaining = steps;
        self.inter_step_delay = 0;
    }
}

/// Reads the virtual scroll tape: shown content, one blank seam cell, then
/// pending content.
#[expect(
    clippy::arithmetic_side_effects,
    reason = "idx > CELL_COUNT in the subtracting arm"
)]
fn tape_glyph(frame: &FrameBuffer, idx: usize) -> SegmentMask {
    match idx.cmp(&CELL_COUNT) {
        Ordering::Less => frame.shown_at(idx),
        Ordering::Equal => SegmentMask::BLANK,
        Ordering::Greater => frame.pending_at(idx - CELL_COUNT),
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;
    use crate::font::GlyphSet;

    /// Advances needed to finish a vertical roll.
    const ROLL_ADVANCES: usize =
        ROLL_STEPS as usize + (ROLL_STEPS as usize - 1) * ROLL_STEP_DELAY as usize;

    fn staged_frame(shown: &str, pending: &str) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        frame.write_str(0, shown, GlyphSet::Lowercase);
        frame.commit();
        frame.write_str(0, pending, GlyphSet::Lowercase);
        frame
    }

    #[test]
    fn test_instant_request_when_settled_is_idempotent() {
        let mut frame = staged_frame("same", "same");
        let snapshot = frame.clone();
        let mut transition = Transition::new();
        transition.request(TransitionKind::Instant, &mut frame, true);
        assert!(!transition.is_active());
        assert_eq!(frame, snapshot);
    }

    #[test]
    fn test_requests_while_in_flight_are_dropped() {
        let mut frame = staged_frame("old", "new");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Up, &mut frame, true);
        assert!(transition.is_active());
        // Even an Instant request must not preempt the running roll.
        transition.request(TransitionKind::Instant, &mut frame, true);
        assert!(transition.is_active());
        assert!(!frame.halves_match());
    }

    #[test]
    fn test_animations_disabled_forces_instant() {
        let mut frame = staged_frame("old", "new");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Left, &mut frame, false);
        assert!(!transition.is_active());
        assert!(frame.halves_match());
    }

    #[test]
    fn test_roll_completes_within_its_bound() {
        let mut frame = staged_frame("old", "new");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Up, &mut frame, true);
        for _ in 0..ROLL_ADVANCES {
            transition.advance(&mut frame);
        }
        assert!(!transition.is_active());
        assert!(frame.halves_match());
    }

    #[test]
    fn test_scroll_completes_in_exactly_two_n_advances() {
        let mut frame = staged_frame("previous", "time disp");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Left, &mut frame, true);
        for step in 0..SCROLL_STEPS {
            assert!(transition.is_active(), "still scrolling at step {step}");
            transition.advance(&mut frame);
        }
        assert!(!transition.is_active());
        assert!(frame.halves_match());
    }

    #[test]
    fn test_position_zero_is_blank_during_any_animation() {
        let mut frame = staged_frame("888888888", "111111111");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Down, &mut frame, true);
        transition.advance(&mut frame);
        assert_eq!(transition.resolve(&frame, 0), SegmentMask::BLANK);
    }

    #[test]
    fn test_roll_phases_apply_the_shift_functions_in_order() {
        let mut frame = FrameBuffer::new();
        frame.write_digit(1, 8, false);
        frame.commit();
        frame.write_digit(1, 4, false);
        let old = frame.shown_at(1);
        let new = frame.pending_at(1);

        let mut transition = Transition::new();
        transition.request(TransitionKind::Up, &mut frame, true);

        let mut seen = [SegmentMask::BLANK; 4];
        for phase in 0..4 {
            transition.advance(&mut frame);
            seen[phase] = transition.resolve(&frame, 1);
            for _ in 0..ROLL_STEP_DELAY {
                transition.advance(&mut frame);
            }
        }
        assert_eq!(seen[0], old.shift_up_one());
        assert_eq!(seen[1], old.shift_up_two());
        assert_eq!(seen[2], new.shift_down_two());
        assert_eq!(seen[3], new.shift_down_one());

        transition.advance(&mut frame);
        assert!(!transition.is_active());
        assert_eq!(frame.shown_at(1), new);
    }

    #[test]
    fn test_scroll_starts_from_shown_and_blends_on_odd_steps() {
        let mut frame = staged_frame("abcdefghi", "rstuvwxyz");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Left, &mut frame, true);

        // Before the first advance every cell but 0 still shows old content.
        for pos in 1..CELL_COUNT {
            assert_eq!(transition.resolve(&frame, pos), frame.shown_at(pos));
        }

        // First advance lands on an odd step: each cell blends its own old
        // glyph with the one arriving from its right.
        transition.advance(&mut frame);
        let blended = transition.resolve(&frame, 3);
        let expected =
            SegmentMask::combine_left_right(frame.shown_at(3), frame.shown_at(4));
        assert_eq!(blended, expected);

        // One more advance: content has moved one whole cell left.
        transition.advance(&mut frame);
        assert_eq!(transition.resolve(&frame, 3), frame.shown_at(4));
    }

    #[test]
    fn test_scroll_seam_renders_blank() {
        let mut frame = staged_frame("888888888", "888888888");
        let mut transition = Transition::new();
        transition.request(TransitionKind::Left, &mut frame, true);
        // After two advances the seam (virtual index N) sits at cell N-1.
        transition.advance(&mut frame);
        transition.advance(&mut frame);
        assert_eq!(
            transition.resolve(&frame, CELL_COUNT - 1),
            SegmentMask::BLANK
        );
    }
}
