//! Manual, ambient-driven, and pulsing duty-cycle control.

use serde::{Deserialize, Serialize};

/// Highest brightness index; indices select entries of the gradient table.
pub const MAX_LEVEL: u8 = 15;

/// Largest raw ambient sample the estimator accepts (10-bit sensor range).
const SAMPLE_MAX: u16 = 0x3FF;

/// Duty values per brightness index. The curve is roughly exponential so
/// equal index steps read as equal perceived steps.
const GRADIENT: [u8; 16] = [
    1, 2, 3, 5, 7, 10, 14, 20, 28, 39, 54, 74, 102, 140, 192, 255,
];

/// How the duty cycle is chosen.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrightnessMode {
    /// A fixed brightness index.
    Manual(u8),
    /// Track the ambient light sensor, interpolating between `floor` and
    /// `ceiling` inclusive.
    Automatic { floor: u8, ceiling: u8 },
}

impl Default for BrightnessMode {
    fn default() -> Self {
        Self::Automatic {
            floor: 2,
            ceiling: MAX_LEVEL,
        }
    }
}

/// Smooths ambient samples into a running average and walks a lagged
/// brightness index toward the interpolated target, one step per sample.
///
/// The lag keeps the display from flickering between adjacent levels when
/// the ambient reading sits right on an interpolation boundary.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default)]
pub struct BrightnessControl {
    mode: BrightnessMode,
    ambient_average: u16,
    level: u8,
    pulsing: bool,
    pulse_down: bool,
}

impl BrightnessControl {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: BrightnessMode::Automatic {
                floor: 2,
                ceiling: MAX_LEVEL,
            },
            ambient_average: 0,
            level: 0,
            pulsing: false,
            pulse_down: false,
        }
    }

    /// The active mode, bounds already clamped.
    #[must_use]
    pub const fn mode(&self) -> BrightnessMode {
        self.mode
    }

    /// The lagged brightness index currently in effect.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// `true` while the breathing effect is engaged.
    #[must_use]
    pub const fn is_pulsing(&self) -> bool {
        self.pulsing
    }

    /// Selects a mode. Out-of-range indices and bounds are clamped, and a
    /// manual level takes effect immediately, without lag.
    pub fn set_mode(&mut self, mode: BrightnessMode) {
        self.mode = match mode {
            BrightnessMode::Manual(level) => {
                let level = level.min(MAX_LEVEL);
                self.level = level;
                BrightnessMode::Manual(level)
            }
            BrightnessMode::Automatic { floor, ceiling } => {
                let ceiling = ceiling.min(MAX_LEVEL);
                BrightnessMode::Automatic {
                    floor: floor.min(ceiling),
                    ceiling,
                }
            }
        };
    }

    /// Engages or releases the breathing effect. While engaged the normal
    /// brightness computation is suspended; releasing resumes it from
    /// wherever the pulse left the index.
    pub fn set_pulsing(&mut self, pulsing: bool) {
        self.pulsing = pulsing;
        if pulsing {
            self.pulse_down = true;
        }
    }

    /// Folds one raw sensor reading into the running average and, in
    /// automatic mode, moves the lagged index one step toward the target.
    pub fn ambient_sample(&mut self, sample: u16) {
        let sample = sample.min(SAMPLE_MAX);
        self.ambient_average = self
            .ambient_average
            .saturating_sub(self.ambient_average >> 6)
            .saturating_add(sample);
        if self.pulsing {
            return;
        }
        if let BrightnessMode::Automatic { floor, ceiling } = self.mode {
            let target = target_level(self.ambient_average, floor, ceiling);
            if self.level < target {
                self.level = self.level.saturating_add(1);
            } else if self.level > target {
                self.level = self.level.saturating_sub(1);
            }
        }
    }

    /// Steps the breathing effect one gradient index, reversing direction
    /// at either bound.
    pub fn pulse_tick(&mut self) {
        if !self.pulsing {
            return;
        }
        if self.pulse_down {
            self.level = self.level.saturating_sub(1);
            if self.level == 0 {
                self.pulse_down = false;
            }
        } else {
            self.level = self.level.saturating_add(1).min(MAX_LEVEL);
            if self.level == MAX_LEVEL {
                self.pulse_down = true;
            }
        }
    }

    /// The hardware duty value for the current index.
    #[must_use]
    pub fn duty(&self) -> u8 {
        let index = if self.pulsing {
            self.level
        } else {
            match self.mode {
                BrightnessMode::Manual(level) => level,
                BrightnessMode::Automatic { .. } => self.level,
            }
        };
        GRADIENT.get(usize::from(index)).copied().unwrap_or(u8::MAX)
    }
}

/// Interpolates the running average across `floor..=ceiling`.
fn target_level(average: u16, floor: u8, ceiling: u8) -> u8 {
    let smoothed = u32::from(average >> 6);
    let span = u32::from(ceiling.saturating_sub(floor)).saturating_add(1);
    let stepped = u8::try_from(span.saturating_mul(smoothed) >> 10).unwrap_or(u8::MAX);
    floor.saturating_add(stepped).min(ceiling)
}
