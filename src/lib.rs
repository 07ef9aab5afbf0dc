//! Rendering, animation, and wire plumbing for multiplexed seven-segment
//! and VFD tube displays.
#![no_std]

mod animator;
mod brightness;
mod config;
#[cfg(feature = "pico1")]
mod config_store;
mod engine;
mod error;
mod font;
mod frame;
#[cfg(feature = "pico1")]
mod hardware;
mod mux;
mod never;
mod segment;
mod transition;
#[cfg(feature = "pico1")]
mod vfd;
mod wire;

// Re-export commonly used items
pub use animator::DotBlinkRate;
pub use brightness::{BrightnessMode, MAX_LEVEL};
pub use config::{DisplayConfig, OffHours};
#[cfg(feature = "pico1")]
pub use config_store::{ConfigStore, INTERNAL_FLASH_SIZE};
pub use engine::{DisplayEngine, MuxStep};
pub use error::{Error, Result};
pub use font::{Glyph, GlyphSet, digit_mask, encode};
pub use frame::{CELL_COUNT, FrameBuffer, Pad, PositionSet, SEGMENT_COUNT};
#[cfg(feature = "pico1")]
pub use hardware::{Hardware, ShiftBus};
pub use mux::MuxStrategy;
pub use never::Never;
pub use segment::SegmentMask;
pub use transition::TransitionKind;
#[cfg(feature = "pico1")]
pub use vfd::{Vfd, VfdStatic};
pub use wire::{DriveWord, DriverBus, DriverMap, OUTPUT_LINE_COUNT, transmit};
