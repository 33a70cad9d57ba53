//! CPU-visible video device register state.
//!
//! The concrete bit layouts live in submodules; this module aggregates the
//! register values and the compare-position assembly rule (low field in the
//! raster register, carry bit in the control register).

mod control;
mod interrupt;

pub(crate) use control::Control;
pub(crate) use interrupt::{InterruptEnable, InterruptStatus, STATUS_ANY};

use crate::scan::ScanPosition;

/// Aggregates the state of all CPU-visible device registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Registers {
    /// Mirror of the control register (`$D011`). Bit 7 holds the compare
    /// carry on write; reads substitute the current position's bit 8.
    pub(crate) control: Control,
    /// Low 8 bits of the raster compare value (`$D012` writes).
    pub(crate) raster_compare: u8,
    /// Pending interrupt sources (`$D019`).
    pub(crate) int_status: InterruptStatus,
    /// Armed interrupt sources (`$D01A`).
    pub(crate) int_enable: InterruptEnable,
    /// Effect register A (`$D020`).
    pub(crate) effect_a: u8,
    /// Effect register B (`$D021`).
    pub(crate) effect_b: u8,
}

impl Registers {
    /// Power-on reset state. Effect registers take the platform's familiar
    /// light-blue-on-blue defaults.
    pub(crate) fn new() -> Self {
        Self {
            control: Control::power_on(),
            raster_compare: 0,
            int_status: InterruptStatus::default(),
            int_enable: InterruptEnable::default(),
            effect_a: 0x0E,
            effect_b: 0x06,
        }
    }

    /// Trigger position currently armed, assembled from both fields.
    pub(crate) fn compare(&self) -> ScanPosition {
        ScanPosition::assemble(
            self.raster_compare,
            self.control.contains(Control::RASTER_CARRY),
        )
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
