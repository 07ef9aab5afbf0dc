//! Multiplex scheduling: which slice of the display to light next and for
//! how many fast ticks.

use serde::{Deserialize, Serialize};

use crate::frame::{CELL_COUNT, CELL_COUNT_U8, SEGMENT_COUNT, SEGMENT_COUNT_U8};
use crate::segment::SegmentMask;

/// Ceiling on the full refresh period, in fast ticks. Whenever tuning
/// pushes the period past this, every hold is halved until it fits again.
const FLICKER_LIMIT: u32 = 600;

/// Hard cap on the halving shift; at this point every hold is one tick.
const MAX_FLICKER_SHIFT: u8 = 15;

/// The segments forming the glyph `1.`; the sub-digit strategy lights
/// these separately from the rest of the cell to kill cross-talk ghosting
/// between neighboring cells.
const ONE_DOT: SegmentMask =
    SegmentMask::new(SegmentMask::B.bits() | SegmentMask::C.bits() | SegmentMask::DOT.bits());

// ============================================================================
// MuxStrategy
// ============================================================================

/// How the refresh cycle slices the display.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MuxStrategy {
    /// One pass per cell, whole glyph at once.
    #[default]
    Digit,
    /// Two passes per cell: the `1.` segments first, the rest second.
    /// Halves per-pass brightness but eliminates ghosting.
    SubDigit,
    /// One pass per segment across all cells at once.
    SegmentSweep,
}

// ============================================================================
// MuxPass
// ============================================================================

/// One slice of the refresh cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MuxPass {
    /// Light every segment of the cell at `pos`.
    Whole { pos: usize, hold: u16 },
    /// Light only the segments of `keep` present in the cell at `pos`.
    Partial {
        pos: usize,
        keep: SegmentMask,
        hold: u16,
    },
    /// Light segment number `segment` on every cell showing it.
    Sweep { segment: usize, hold: u16 },
}

// ============================================================================
// MuxSchedule
// ============================================================================

/// Cycles the refresh slots for the active strategy and meters how long
/// each slot holds.
///
/// Per-slot holds come from the per-position on-times, halved `flicker_shift`
/// times. The shift only ever grows; on-time changes can slow a slot down
/// but never stretch the refresh period past [`FLICKER_LIMIT`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone)]
pub struct MuxSchedule {
    strategy: MuxStrategy,
    on_times: [u16; CELL_COUNT],
    flicker_shift: u8,
    slot: u8,
}

impl MuxSchedule {
    /// Default per-position on-time, in fast ticks.
    pub const DEFAULT_ON_TIME: u16 = 40;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            strategy: MuxStrategy::Digit,
            on_times: [Self::DEFAULT_ON_TIME; CELL_COUNT],
            flicker_shift: 0,
            slot: 0,
        }
    }

    /// The active strategy.
    #[must_use]
    pub const fn strategy(&self) -> MuxStrategy {
        self.strategy
    }

    /// The per-position on-times, in fast ticks.
    #[must_use]
    pub const fn on_times(&self) -> [u16; CELL_COUNT] {
        self.on_times
    }

    /// Switches strategy, restarting the refresh cycle from slot zero.
    pub fn set_strategy(&mut self, strategy: MuxStrategy) {
        self.strategy = strategy;
        self.slot = 0;
        self.retune();
    }

    /// Tunes one position's on-time.
    pub fn set_on_time(&mut self, pos: usize, ticks: u16) {
        if let Some(slot) = self.on_times.get_mut(pos) {
            *slot = ticks;
            self.retune();
        }
    }

    /// Replaces all on-times at once.
    pub fn set_on_times(&mut self, ticks: [u16; CELL_COUNT]) {
        self.on_times = ticks;
        self.retune();
    }

    /// The next refresh slot, advancing the cursor.
    pub(crate) fn next_pass(&mut self) -> MuxPass {
        let slot = usize::from(self.slot);
        match self.strategy {
            MuxStrategy::Digit => {
                self.slot = wrap(self.slot, CELL_COUNT);
                MuxPass::Whole {
                    pos: slot,
                    hold: self.hold_for(slot),
                }
            }
            MuxStrategy::SubDigit => {
                self.slot = wrap(self.slot, 2 * CELL_COUNT);
                let pos = slot >> 1;
                let keep = if slot & 1 == 0 { ONE_DOT } else { !ONE_DOT };
                MuxPass::Partial {
                    pos,
                    keep,
                    hold: self.hold_for(pos),
                }
            }
            MuxStrategy::SegmentSweep => {
                self.slot = wrap(self.slot, SEGMENT_COUNT);
                MuxPass::Sweep {
                    segment: slot,
                    hold: self.sweep_hold(),
                }
            }
        }
    }

    fn hold_for(&self, pos: usize) -> u16 {
        let ticks = self.on_times.get(pos).copied().unwrap_or(0);
        (ticks >> self.flicker_shift).max(1)
    }

    /// Sweep slots all hold for the mean on-time; per-position tuning has
    /// no meaning when every cell is lit at once.
    fn sweep_hold(&self) -> u16 {
        let sum: u32 = self.on_times.iter().map(|&ticks| u32::from(ticks)).sum();
        let mean = u16::try_from(sum / u32::from(CELL_COUNT_U8)).unwrap_or(u16::MAX);
        (mean >> self.flicker_shift).max(1)
    }

    /// Grows `flicker_shift` until a full refresh fits under
    /// [`FLICKER_LIMIT`]. The shift never shrinks back.
    fn retune(&mut self) {
        while self.refresh_cost() >= FLICKER_LIMIT && self.flicker_shift < MAX_FLICKER_SHIFT {
            self.flicker_shift = self.flicker_shift.saturating_add(1);
        }
    }

    /// Fast ticks one full refresh takes under the current strategy.
    fn refresh_cost(&self) -> u32 {
        let sum: u32 = self
            .on_times
            .iter()
            .map(|&ticks| u32::from(ticks >> self.flicker_shift))
            .sum();
        match self.strategy {
            MuxStrategy::Digit => sum,
            MuxStrategy::SubDigit => sum.saturating_mul(2),
            MuxStrategy::SegmentSweep => {
                let mean = sum / u32::from(CELL_COUNT_U8);
                mean.saturating_mul(u32::from(SEGMENT_COUNT_U8))
            }
        }
    }
}

impl Default for MuxSchedule {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(slot: u8, slots: usize) -> u8 {
    let next = usize::from(slot).saturating_add(1);
    if next >= slots { 0 } else { slot.saturating_add(1) }
}
