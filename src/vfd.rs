//! Async driver that owns a [`DisplayEngine`] and keeps a tube lit.
//!
//! Three background tasks drive the engine at its three cadences: a fast
//! multiplex loop feeding the shift register, a roughly 1 kHz animation
//! tick, and a 1 Hz ambient-light sampler. The [`Vfd`] handle is the
//! foreground side; every method takes the same short critical-section
//! lock the tasks take.
//!
//! # Example
//!
//! ```no_run
//! use embassy_executor::Spawner;
//! use vfd_kit::{DisplayConfig, Hardware, TransitionKind, Vfd, VfdStatic};
//!
//! static VFD: VfdStatic = Vfd::new_static();
//!
//! #[embassy_executor::main]
//! async fn main(spawner: Spawner) {
//!     let hardware = Hardware::default();
//!     let vfd = Vfd::new(
//!         &VFD,
//!         hardware.bus,
//!         hardware.adc,
//!         hardware.light_sensor,
//!         &DisplayConfig::default(),
//!         spawner,
//!     )
//!     .expect("display tasks failed to spawn");
//!     vfd.write_str(0, "hello");
//!     vfd.request_transition(TransitionKind::Up);
//! }
//! ```

use core::cell::RefCell;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc};
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::{Duration, Timer};

use crate::Result;
use crate::animator::DotBlinkRate;
use crate::brightness::BrightnessMode;
use crate::config::{DisplayConfig, OffHours};
use crate::engine::DisplayEngine;
use crate::font::GlyphSet;
use crate::frame::Pad;
use crate::hardware::ShiftBus;
use crate::mux::MuxStrategy;
use crate::transition::TransitionKind;
use crate::wire;

/// Length of one multiplex on-time tick.
const MUX_TICK_MICROS: u64 = 16;

/// Period of the animation tick, the unit every animator counts in.
const SEMI_TICK: Duration = Duration::from_millis(1);

/// Period of the ambient-light sampler.
const AMBIENT_PERIOD: Duration = Duration::from_secs(1);

/// The engine state shared between the foreground handle and the tasks.
pub struct VfdStatic {
    engine: Mutex<CriticalSectionRawMutex, RefCell<DisplayEngine>>,
}

/// Foreground handle to a running display.
pub struct Vfd<'a> {
    engine: &'a Mutex<CriticalSectionRawMutex, RefCell<DisplayEngine>>,
}

impl Vfd<'_> {
    /// Creates the static state a [`Vfd`] borrows from.
    #[must_use]
    pub const fn new_static() -> VfdStatic {
        VfdStatic {
            engine: Mutex::new(RefCell::new(DisplayEngine::new())),
        }
    }
}

impl Vfd<'static> {
    /// Applies `config` and spawns the multiplex, animation, and
    /// ambient-light tasks.
    pub fn new(
        vfd_static: &'static VfdStatic,
        bus: ShiftBus<'static>,
        adc: Adc<'static, adc::Blocking>,
        light_sensor: adc::Channel<'static>,
        config: &DisplayConfig,
        spawner: Spawner,
    ) -> Result<Self> {
        vfd_static
            .engine
            .lock(|cell| cell.borrow_mut().apply_config(config));
        spawner.spawn(mux_loop(&vfd_static.engine, bus))?;
        spawner.spawn(semi_loop(&vfd_static.engine))?;
        spawner.spawn(ambient_loop(&vfd_static.engine, adc, light_sensor))?;
        info!("Vfd: display tasks running");
        Ok(Self {
            engine: &vfd_static.engine,
        })
    }
}

impl Vfd<'_> {
    fn with<R>(&self, action: impl FnOnce(&mut DisplayEngine) -> R) -> R {
        self.engine.lock(|cell| action(&mut cell.borrow_mut()))
    }

    // ------------------------------------------------------------------------
    // Staging writes
    // ------------------------------------------------------------------------

    /// Stages one character through the active glyph set.
    pub fn write_char(&self, pos: usize, ch: char) {
        self.with(|engine| engine.write_char(pos, ch));
    }

    /// Stages one decimal digit (`n` modulo 10).
    pub fn write_digit(&self, pos: usize, n: u8) {
        self.with(|engine| engine.write_digit(pos, n));
    }

    /// Stages a two-cell number at `pos` and `pos + 1`.
    pub fn write_two_digit(&self, pos: usize, value: i16, pad: Pad) {
        self.with(|engine| engine.write_two_digit(pos, value, pad));
    }

    /// Stages a string from `start`, truncating at the display edge.
    pub fn write_str(&self, start: usize, text: &str) {
        self.with(|engine| engine.write_str(start, text));
    }

    /// Stages a blank at `pos`.
    pub fn clear(&self, pos: usize) {
        self.with(|engine| engine.clear(pos));
    }

    /// Stages a fully blank display.
    pub fn clear_all(&self) {
        self.with(DisplayEngine::clear_all);
    }

    /// Lights the decimal point across `first..=last`, skipping cells
    /// with nothing but filler on them.
    pub fn dot_select(&self, first: usize, last: usize) {
        self.with(|engine| engine.dot_select(first, last));
    }

    /// Flags or unflags `pos` as a blinking separator dot.
    pub fn set_blink_dot(&self, pos: usize, enabled: bool) {
        self.with(|engine| engine.set_blink_dot(pos, enabled));
    }

    /// Starts moving staged content onto the display.
    pub fn request_transition(&self, kind: TransitionKind) {
        #[cfg(feature = "display-trace")]
        info!("Vfd: transition {}", kind);
        self.with(|engine| engine.request_transition(kind));
    }

    /// `true` while a transition animation is in flight.
    #[must_use]
    pub fn transition_active(&self) -> bool {
        self.with(|engine| engine.transition_active())
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Applies a loaded configuration to every subsystem.
    pub fn apply_config(&self, config: &DisplayConfig) {
        self.with(|engine| engine.apply_config(config));
    }

    /// Snapshots the current settings for persistence.
    #[must_use]
    pub fn config(&self) -> DisplayConfig {
        self.with(|engine| engine.config())
    }

    pub fn set_brightness_mode(&self, mode: BrightnessMode) {
        self.with(|engine| engine.set_brightness_mode(mode));
    }

    pub fn set_strategy(&self, strategy: MuxStrategy) {
        self.with(|engine| engine.set_strategy(strategy));
    }

    pub fn set_on_time(&self, pos: usize, ticks: u16) {
        self.with(|engine| engine.set_on_time(pos, ticks));
    }

    pub fn set_glyph_set(&self, set: GlyphSet) {
        self.with(|engine| engine.set_glyph_set(set));
    }

    pub fn set_alt_nine(&self, enabled: bool) {
        self.with(|engine| engine.set_alt_nine(enabled));
    }

    pub fn set_animations_enabled(&self, enabled: bool) {
        self.with(|engine| engine.set_animations_enabled(enabled));
    }

    pub fn set_colon_style(&self, style: u8) {
        self.with(|engine| engine.set_colon_style(style));
    }

    /// Steps to the next colon style, returning the new index.
    pub fn next_colon_style(&self) -> u8 {
        self.with(DisplayEngine::next_colon_style)
    }

    pub fn set_dot_blink(&self, rate: DotBlinkRate) {
        self.with(|engine| engine.set_dot_blink(rate));
    }

    pub fn set_auto_off(&self, schedule: Option<OffHours>) {
        self.with(|engine| engine.set_auto_off(schedule));
    }

    /// Engages or releases the breathing effect.
    pub fn set_pulsing(&self, pulsing: bool) {
        self.with(|engine| engine.set_pulsing(pulsing));
    }

    #[must_use]
    pub fn is_pulsing(&self) -> bool {
        self.with(|engine| engine.is_pulsing())
    }

    /// The brightness index currently in effect, lag and pulse included.
    #[must_use]
    pub fn brightness_level(&self) -> u8 {
        self.with(|engine| engine.brightness_level())
    }

    /// Forces the display on or off, overriding the auto-off schedule
    /// until the schedule next fires.
    pub fn set_display_enabled(&self, enabled: bool) {
        self.with(|engine| engine.set_display_enabled(enabled));
    }

    #[must_use]
    pub fn display_enabled(&self) -> bool {
        self.with(|engine| engine.display_enabled())
    }

    /// Applies the auto-off schedule for the wall-clock hour, returning
    /// whether the display is now enabled.
    pub fn apply_auto_off(&self, hour: u8) -> bool {
        self.with(|engine| engine.apply_auto_off(hour))
    }
}

// ============================================================================
// Background tasks
// ============================================================================

#[embassy_executor::task]
async fn mux_loop(
    engine: &'static Mutex<CriticalSectionRawMutex, RefCell<DisplayEngine>>,
    mut bus: ShiftBus<'static>,
) -> ! {
    let mut last_duty: Option<u8> = None;
    loop {
        let step = engine.lock(|cell| cell.borrow_mut().mux_step());
        if last_duty != Some(step.duty) {
            bus.set_duty(step.duty);
            last_duty = Some(step.duty);
        }
        wire::transmit(&mut bus, step.word);
        let hold = u64::from(step.hold_ticks).saturating_mul(MUX_TICK_MICROS);
        Timer::after(Duration::from_micros(hold)).await;
    }
}

#[embassy_executor::task]
async fn semi_loop(
    engine: &'static Mutex<CriticalSectionRawMutex, RefCell<DisplayEngine>>,
) -> ! {
    loop {
        engine.lock(|cell| cell.borrow_mut().tick_semi());
        Timer::after(SEMI_TICK).await;
    }
}

#[embassy_executor::task]
async fn ambient_loop(
    engine: &'static Mutex<CriticalSectionRawMutex, RefCell<DisplayEngine>>,
    mut adc: Adc<'static, adc::Blocking>,
    mut light_sensor: adc::Channel<'static>,
) -> ! {
    loop {
        match adc.blocking_read(&mut light_sensor) {
            // The ADC reads 12 bits; the estimator takes the top 10.
            Ok(raw) => engine.lock(|cell| cell.borrow_mut().ambient_sample(raw >> 2)),
            Err(error) => warn!("Vfd: ambient sample failed: {}", error),
        }
        Timer::after(AMBIENT_PERIOD).await;
    }
}
