//! The persisted display settings, serialized with `postcard`.

use serde::{Deserialize, Serialize};

use crate::animator::DotBlinkRate;
use crate::brightness::BrightnessMode;
use crate::font::GlyphSet;
use crate::frame::CELL_COUNT;
use crate::mux::{MuxSchedule, MuxStrategy};

/// A daily window during which the display stays dark.
///
/// The clock layer owns the time of day and enables or disables the
/// display when these hours pass; the engine only stores the schedule.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffHours {
    /// Hour (0..=23) at which the display goes dark.
    pub off_hour: u8,
    /// Hour (0..=23) at which it lights again.
    pub on_hour: u8,
}

impl OffHours {
    /// `true` when `hour` falls inside the dark window. The window may
    /// wrap past midnight; an empty window never matches.
    #[must_use]
    pub const fn contains(self, hour: u8) -> bool {
        if self.off_hour <= self.on_hour {
            self.off_hour <= hour && hour < self.on_hour
        } else {
            hour >= self.off_hour || hour < self.on_hour
        }
    }
}

/// Everything about the display a user can tune and keep across power
/// cycles.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub brightness: BrightnessMode,
    pub on_times: [u16; CELL_COUNT],
    pub strategy: MuxStrategy,
    pub glyph_set: GlyphSet,
    /// Draw nines with the bottom bar.
    pub alt_nine: bool,
    /// Animate transitions; when off every transition is instant.
    pub animations: bool,
    pub colon_style: u8,
    pub dot_blink: DotBlinkRate,
    pub auto_off: Option<OffHours>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: BrightnessMode::default(),
            on_times: [MuxSchedule::DEFAULT_ON_TIME; CELL_COUNT],
            strategy: MuxStrategy::Digit,
            glyph_set: GlyphSet::Lowercase,
            alt_nine: false,
            animations: true,
            colon_style: 0,
            dot_blink: DotBlinkRate::Off,
            auto_off: None,
        }
    }
}

#[cfg(all(test, not(target_os = "none")))]
mod tests {
    use super::*;

    #[test]
    fn test_postcard_roundtrip_preserves_every_field() {
        let config = DisplayConfig {
            brightness: BrightnessMode::Manual(7),
            on_times: [25; CELL_COUNT],
            strategy: MuxStrategy::SubDigit,
            glyph_set: GlyphSet::Uppercase,
            alt_nine: true,
            animations: false,
            colon_style: 2,
            dot_blink: DotBlinkRate::Fast,
            auto_off: Some(OffHours {
                off_hour: 23,
                on_hour: 6,
            }),
        };
        let mut buffer = [0_u8; 128];
        let bytes = postcard::to_slice(&config, &mut buffer).unwrap();
        let restored: DisplayConfig = postcard::from_bytes(bytes).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_default_is_an_animated_automatic_display() {
        let config = DisplayConfig::default();
        assert!(config.animations);
        assert!(config.auto_off.is_none());
        assert!(matches!(
            config.brightness,
            BrightnessMode::Automatic { .. }
        ));
    }

    #[test]
    fn test_off_hours_window_wraps_midnight() {
        let overnight = OffHours {
            off_hour: 23,
            on_hour: 6,
        };
        assert!(overnight.contains(23));
        assert!(overnight.contains(0));
        assert!(overnight.contains(5));
        assert!(!overnight.contains(6));
        assert!(!overnight.contains(12));

        let midday = OffHours {
            off_hour: 9,
            on_hour: 17,
        };
        assert!(midday.contains(9));
        assert!(!midday.contains(17));
        assert!(!midday.contains(3));

        let empty = OffHours {
            off_hour: 8,
            on_hour: 8,
        };
        assert!(!empty.contains(8));
    }
}
