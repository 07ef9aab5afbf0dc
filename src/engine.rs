//! One owned engine struct tying the display subsystems together.
//!
//! The engine has three externally driven entry points at distinct
//! cadences: [`DisplayEngine::mux_step`] at the fast multiplex rate,
//! [`DisplayEngine::tick_semi`] at roughly 1 kHz, and
//! [`DisplayEngine::ambient_sample`] at 1 Hz. Everything else is the
//! foreground write and settings API.

use crate::animator::{ColonAnimator, DotBlink, DotBlinkRate};
use crate::brightness::{BrightnessControl, BrightnessMode};
use crate::config::{DisplayConfig, OffHours};
use crate::font::GlyphSet;
use crate::frame::{CELL_COUNT, FrameBuffer, Pad, PositionSet};
use crate::mux::{MuxPass, MuxSchedule, MuxStrategy};
use crate::segment::SegmentMask;
use crate::transition::{Transition, TransitionKind};
use crate::wire::{DriveWord, DriverMap};

/// Semiticks between breathing-effect steps.
const PULSE_INTERVAL: u8 = 50;

/// Fast ticks to idle between steps while the display is off.
const DISABLED_HOLD: u16 = 40;

// ============================================================================
// MuxStep
// ============================================================================

/// One refresh slice, ready for the wire.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxStep {
    /// The driver lines to latch.
    pub word: DriveWord,
    /// Fast ticks to hold the latched lines.
    pub hold_ticks: u16,
    /// Brightness duty to apply alongside.
    pub duty: u8,
}

// ============================================================================
// DisplayEngine
// ============================================================================

/// The display rendering, animation, and brightness engine.
///
/// # Example
///
/// ```
/// use vfd_kit::{DisplayEngine, TransitionKind};
///
/// let mut engine = DisplayEngine::new();
/// engine.write_str(0, "hello");
/// engine.request_transition(TransitionKind::Instant);
/// let step = engine.mux_step();
/// assert!(step.hold_ticks >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct DisplayEngine {
    frame: FrameBuffer,
    transition: Transition,
    colon: ColonAnimator,
    dots: DotBlink,
    brightness: BrightnessControl,
    schedule: MuxSchedule,
    map: DriverMap,
    glyph_set: GlyphSet,
    alt_nine: bool,
    animations_enabled: bool,
    display_enabled: bool,
    auto_off: Option<OffHours>,
    pulse_divider: u8,
}

impl DisplayEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
            transition: Transition::new(),
            colon: ColonAnimator::new(),
            dots: DotBlink::new(),
            brightness: BrightnessControl::new(),
            schedule: MuxSchedule::new(),
            map: DriverMap::iv18(),
            glyph_set: GlyphSet::Lowercase,
            alt_nine: false,
            animations_enabled: true,
            display_enabled: true,
            auto_off: None,
            pulse_divider: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Applies a loaded configuration to every subsystem.
    pub fn apply_config(&mut self, config: &DisplayConfig) {
        self.brightness.set_mode(config.brightness);
        self.schedule.set_on_times(config.on_times);
        self.schedule.set_strategy(config.strategy);
        self.glyph_set = config.glyph_set;
        self.alt_nine = config.alt_nine;
        self.animations_enabled = config.animations;
        self.colon.set_style(config.colon_style);
        self.dots.set_rate(config.dot_blink, &mut self.frame);
        self.auto_off = config.auto_off;
    }

    /// Snapshots the current settings, bounds already clamped, for
    /// persistence.
    #[must_use]
    pub fn config(&self) -> DisplayConfig {
        DisplayConfig {
            brightness: self.brightness.mode(),
            on_times: self.schedule.on_times(),
            strategy: self.schedule.strategy(),
            glyph_set: self.glyph_set,
            alt_nine: self.alt_nine,
            animations: self.animations_enabled,
            colon_style: self.colon.style(),
            dot_blink: self.dots.rate(),
            auto_off: self.auto_off,
        }
    }

    pub fn set_brightness_mode(&mut self, mode: BrightnessMode) {
        self.brightness.set_mode(mode);
    }

    pub fn set_strategy(&mut self, strategy: MuxStrategy) {
        self.schedule.set_strategy(strategy);
    }

    pub fn set_on_time(&mut self, pos: usize, ticks: u16) {
        self.schedule.set_on_time(pos, ticks);
    }

    pub fn set_glyph_set(&mut self, set: GlyphSet) {
        self.glyph_set = set;
    }

    pub fn set_alt_nine(&mut self, enabled: bool) {
        self.alt_nine = enabled;
    }

    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.animations_enabled = enabled;
    }

    pub fn set_colon_style(&mut self, style: u8) {
        self.colon.set_style(style);
    }

    /// Steps to the next colon style, returning the new index.
    pub fn next_colon_style(&mut self) -> u8 {
        let style = self.colon.style().wrapping_add(1) % ColonAnimator::STYLE_COUNT;
        self.colon.set_style(style);
        style
    }

    pub fn set_dot_blink(&mut self, rate: DotBlinkRate) {
        self.dots.set_rate(rate, &mut self.frame);
    }

    pub fn set_auto_off(&mut self, schedule: Option<OffHours>) {
        self.auto_off = schedule;
    }

    /// Engages or releases the breathing effect.
    pub fn set_pulsing(&mut self, pulsing: bool) {
        self.brightness.set_pulsing(pulsing);
    }

    #[must_use]
    pub const fn is_pulsing(&self) -> bool {
        self.brightness.is_pulsing()
    }

    /// The brightness index currently in effect, lag and pulse included.
    #[must_use]
    pub const fn brightness_level(&self) -> u8 {
        self.brightness.level()
    }

    /// Forces the display on or off, overriding the auto-off schedule
    /// until the schedule next fires.
    pub fn set_display_enabled(&mut self, enabled: bool) {
        self.display_enabled = enabled;
    }

    #[must_use]
    pub const fn display_enabled(&self) -> bool {
        self.display_enabled
    }

    /// Applies the auto-off schedule for the wall-clock hour, returning
    /// whether the display is now enabled. Without a schedule this leaves
    /// the display alone.
    pub fn apply_auto_off(&mut self, hour: u8) -> bool {
        if let Some(window) = self.auto_off {
            self.display_enabled = !window.contains(hour);
        }
        self.display_enabled
    }

    // ------------------------------------------------------------------------
    // Foreground writes
    // ------------------------------------------------------------------------

    /// Stages one character through the active glyph set.
    pub fn write_char(&mut self, pos: usize, ch: char) {
        self.frame.write_char(pos, ch, self.glyph_set);
    }

    /// Stages one decimal digit (`n` modulo 10).
    pub fn write_digit(&mut self, pos: usize, n: u8) {
        self.frame.write_digit(pos, n, self.alt_nine);
    }

    /// Stages a two-cell number at `pos` and `pos + 1`.
    pub fn write_two_digit(&mut self, pos: usize, value: i16, pad: Pad) {
        self.frame.write_two_digit(pos, value, pad, self.alt_nine);
    }

    /// Stages a string from `start`, truncating at the display edge.
    pub fn write_str(&mut self, start: usize, text: &str) {
        self.frame.write_str(start, text, self.glyph_set);
    }

    /// Stages a blank at `pos`.
    pub fn clear(&mut self, pos: usize) {
        self.frame.clear(pos);
    }

    /// Stages a fully blank display.
    pub fn clear_all(&mut self) {
        self.frame.clear_all();
    }

    /// Lights the decimal point across `first..=last`, skipping cells
    /// with nothing but filler on them.
    pub fn dot_select(&mut self, first: usize, last: usize) {
        self.frame.dot_select(first, last);
    }

    /// Flags or unflags `pos` as a blinking separator dot.
    pub fn set_blink_dot(&mut self, pos: usize, enabled: bool) {
        self.frame.set_blink_dot(pos, enabled);
    }

    /// Starts moving staged content onto the display.
    pub fn request_transition(&mut self, kind: TransitionKind) {
        self.transition
            .request(kind, &mut self.frame, self.animations_enabled);
    }

    /// `true` while a transition animation is in flight.
    #[must_use]
    pub const fn transition_active(&self) -> bool {
        self.transition.is_active()
    }

    /// The frame state, staged and displayed halves both.
    #[must_use]
    pub const fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    // ------------------------------------------------------------------------
    // Periodic entry points
    // ------------------------------------------------------------------------

    /// Medium-cadence tick: advances the in-flight transition, or the
    /// colon and dot animators while none is in flight, plus the
    /// breathing divider.
    pub fn tick_semi(&mut self) {
        if self.transition.is_active() {
            self.transition.advance(&mut self.frame);
        } else {
            self.colon.tick(&mut self.frame);
            self.dots.tick(&mut self.frame);
        }
        self.pulse_divider = self.pulse_divider.wrapping_add(1);
        if self.pulse_divider >= PULSE_INTERVAL {
            self.pulse_divider = 0;
            self.brightness.pulse_tick();
        }
    }

    /// Slow-cadence tick: folds one raw ambient-light reading into the
    /// brightness estimator.
    pub fn ambient_sample(&mut self, raw: u16) {
        self.brightness.ambient_sample(raw);
    }

    /// Fast-cadence step: the next refresh slice for the wire.
    #[must_use]
    pub fn mux_step(&mut self) -> MuxStep {
        if !self.display_enabled {
            return MuxStep {
                word: DriveWord::EMPTY,
                hold_ticks: DISABLED_HOLD,
                duty: 0,
            };
        }
        let (word, hold_ticks) = match self.schedule.next_pass() {
            MuxPass::Whole { pos, hold } => (
                self.map.compose(PositionSet::single(pos), self.resolve(pos)),
                hold,
            ),
            MuxPass::Partial { pos, keep, hold } => (
                self.map
                    .compose(PositionSet::single(pos), self.resolve(pos) & keep),
                hold,
            ),
            MuxPass::Sweep { segment, hold } => {
                let probe = SegmentMask::single(segment);
                let mut positions = PositionSet::EMPTY;
                for pos in 0..CELL_COUNT {
                    if self.resolve(pos).contains(probe) {
                        positions.insert(pos);
                    }
                }
                (self.map.compose(positions, probe), hold)
            }
        };
        MuxStep {
            word,
            hold_ticks,
            duty: self.brightness.duty(),
        }
    }

    /// The instantaneous mask at `pos`, mid-animation included.
    #[must_use]
    pub fn resolve(&self, pos: usize) -> SegmentMask {
        self.transition.resolve(&self.frame, pos)
    }
}

impl Default for DisplayEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_display_emits_empty_frames() {
        let mut engine = DisplayEngine::new();
        engine.write_str(0, "888888888");
        engine.request_transition(TransitionKind::Instant);
        engine.set_display_enabled(false);
        let step = engine.mux_step();
        assert_eq!(step.word, DriveWord::EMPTY);
        assert_eq!(step.duty, 0);
        assert!(step.hold_ticks >= 1);
    }

    #[test]
    fn test_sub_digit_pass_pair_unions_to_the_whole_glyph() {
        let mut engine = DisplayEngine::new();
        engine.set_strategy(MuxStrategy::SubDigit);
        engine.write_digit(0, 8);
        engine.dot_select(0, 0);
        engine.request_transition(TransitionKind::Instant);

        let whole = {
            let mut digit_only = DisplayEngine::new();
            digit_only.write_digit(0, 8);
            digit_only.dot_select(0, 0);
            digit_only.request_transition(TransitionKind::Instant);
            digit_only.mux_step().word
        };
        let first = engine.mux_step().word;
        let second = engine.mux_step().word;
        assert_eq!(first.bits() | second.bits(), whole.bits());
    }

    #[test]
    fn test_segment_sweep_lights_the_probe_on_matching_cells() {
        let mut engine = DisplayEngine::new();
        engine.set_strategy(MuxStrategy::SegmentSweep);
        // '1' lights B and C only, '8' lights everything.
        engine.write_digit(1, 1);
        engine.write_digit(2, 8);
        engine.request_transition(TransitionKind::Instant);

        // First sweep pass probes segment A: only the '8' cell shows it.
        let step = engine.mux_step();
        let expected = DriverMap::iv18().compose(PositionSet::single(2), SegmentMask::A);
        assert_eq!(step.word, expected);

        // Second pass probes segment B: both cells show it.
        let step = engine.mux_step();
        let mut both = PositionSet::single(1);
        both.insert(2);
        let expected = DriverMap::iv18().compose(both, SegmentMask::B);
        assert_eq!(step.word, expected);
    }

    #[test]
    fn test_pulse_steps_once_per_interval() {
        let mut engine = DisplayEngine::new();
        engine.set_brightness_mode(BrightnessMode::Manual(10));
        engine.set_pulsing(true);
        let before = engine.mux_step().duty;
        for _ in 0..usize::from(PULSE_INTERVAL) {
            engine.tick_semi();
        }
        let after = engine.mux_step().duty;
        assert_ne!(before, after);
    }

    #[test]
    fn test_animators_freeze_while_a_transition_runs() {
        let mut engine = DisplayEngine::new();
        engine.write_str(0, "12:34:56 ");
        engine.request_transition(TransitionKind::Instant);
        engine.tick_semi();
        assert_eq!(engine.frame().shown_at(2), SegmentMask::COLON);

        engine.set_dot_blink(DotBlinkRate::Fast);
        engine.write_str(0, "65:43:21 ");
        engine.request_transition(TransitionKind::Up);
        // Long enough that the blink would have fired several times.
        for _ in 0..500 {
            engine.tick_semi();
            if engine.transition_active() {
                assert_eq!(engine.frame().shown_at(2), SegmentMask::COLON);
            }
        }
        assert!(!engine.transition_active());
    }

    #[test]
    fn test_config_snapshot_roundtrips_through_apply() {
        let mut engine = DisplayEngine::new();
        let config = DisplayConfig {
            brightness: BrightnessMode::Manual(9),
            on_times: [33; CELL_COUNT],
            strategy: MuxStrategy::SubDigit,
            glyph_set: GlyphSet::Uppercase,
            alt_nine: true,
            animations: false,
            colon_style: 2,
            dot_blink: DotBlinkRate::Slow,
            auto_off: Some(OffHours {
                off_hour: 22,
                on_hour: 7,
            }),
        };
        engine.apply_config(&config);
        assert_eq!(engine.config(), config);
    }

    #[test]
    fn test_auto_off_schedule_tracks_the_hour() {
        let mut engine = DisplayEngine::new();
        engine.set_auto_off(Some(OffHours {
            off_hour: 23,
            on_hour: 6,
        }));
        assert!(!engine.apply_auto_off(2));
        assert!(!engine.display_enabled());
        assert!(engine.apply_auto_off(9));
        assert!(engine.display_enabled());
    }

    #[test]
    fn test_next_colon_style_cycles() {
        let mut engine = DisplayEngine::new();
        assert_eq!(engine.next_colon_style(), 1);
        assert_eq!(engine.next_colon_style(), 2);
        assert_eq!(engine.next_colon_style(), 0);
    }
}
