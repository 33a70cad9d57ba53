//! Raster video device model: the Device Register File plus the beam
//! counters that drive it.
//!
//! The device shares the data bus with the processor. It exposes the scan
//! position split across two fields, an interrupt arm/acknowledge pair, and
//! two visible-effect registers whose writes take effect at the current
//! scan position. There is no queuing anywhere: writing the compare value
//! always takes effect for the next matching event.

pub(crate) mod registers;

use crate::memory;
use crate::scan::ScanPosition;
use crate::timing::VideoStandard;
use registers::{Control, InterruptEnable, InterruptStatus, Registers, STATUS_ANY};

/// Position of the beam at a simulated instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Beam {
    /// Full passes completed so far.
    pub frame: u64,
    /// Line currently being drawn.
    pub line: u16,
    /// Cycle within the current line.
    pub cycle: u8,
}

/// The raster video device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vic {
    registers: Registers,
    standard: VideoStandard,
    /// Current cycle (0..cycles_per_line) within the active line.
    cycle: u8,
    /// Line currently being drawn.
    line: u16,
    /// Total number of completed passes.
    frame: u64,
}

impl Vic {
    /// Creates a powered-on device with the beam parked at the top of the
    /// first frame and all interrupt sources disarmed.
    pub fn new(standard: VideoStandard) -> Self {
        Self {
            registers: Registers::new(),
            standard,
            cycle: 0,
            line: 0,
            frame: 0,
        }
    }

    /// Advances the beam by one cycle. Returns `true` when this cycle newly
    /// raised the raster pending flag (the compare value matched at the
    /// start of a line).
    pub(crate) fn clock(&mut self) -> bool {
        self.cycle += 1;
        if self.cycle >= self.standard.cycles_per_line() {
            self.cycle = 0;
            self.line += 1;
            if self.line >= self.standard.lines_per_frame() {
                self.line = 0;
                self.frame = self.frame.wrapping_add(1);
            }
        }

        if self.cycle == 0 && ScanPosition::new(self.line) == self.registers.compare() {
            let fresh = !self.registers.int_status.contains(InterruptStatus::RASTER);
            self.registers.int_status.insert(InterruptStatus::RASTER);
            return fresh;
        }
        false
    }

    /// Level of the interrupt line toward the processor.
    pub(crate) fn irq_line(&self) -> bool {
        let pending = self.registers.int_status.bits();
        let enabled = self.registers.int_enable.bits();
        pending & enabled != 0
    }

    /// Handles processor writes to the device register block.
    pub(crate) fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            memory::vic::CONTROL => {
                self.registers.control = Control::from_bits_retain(value);
            }
            memory::vic::RASTER => self.registers.raster_compare = value,
            memory::vic::INT_STATUS => {
                // Writing 1-bits acknowledges those sources.
                self.registers.int_status &= !InterruptStatus::from_bits_truncate(value);
            }
            memory::vic::INT_ENABLE => {
                self.registers.int_enable = InterruptEnable::from_bits_truncate(value);
            }
            memory::vic::EFFECT_A => self.registers.effect_a = value & 0x0F,
            memory::vic::EFFECT_B => self.registers.effect_b = value & 0x0F,
            _ => {}
        }
    }

    /// Handles processor reads from the device register block.
    pub(crate) fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            memory::vic::CONTROL => {
                // Reads substitute the current position's bit 8 for the
                // compare carry the processor last wrote.
                let position = ScanPosition::new(self.line);
                let mut control = self.registers.control;
                control.set(Control::RASTER_CARRY, position.carry());
                control.bits()
            }
            memory::vic::RASTER => ScanPosition::new(self.line).low(),
            memory::vic::INT_STATUS => {
                let mut value = self.registers.int_status.bits();
                if self.irq_line() {
                    value |= STATUS_ANY;
                }
                value
            }
            memory::vic::INT_ENABLE => self.registers.int_enable.bits(),
            memory::vic::EFFECT_A => self.registers.effect_a | 0xF0,
            memory::vic::EFFECT_B => self.registers.effect_b | 0xF0,
            _ => 0,
        }
    }

    /// Side-effect-free read (device reads have none, but the bus exposes a
    /// uniform peek surface).
    pub fn peek(&self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    /// Trigger position currently armed in the register file.
    pub fn compare(&self) -> ScanPosition {
        self.registers.compare()
    }

    /// Beam position for the cycle most recently clocked.
    pub fn beam(&self) -> Beam {
        Beam {
            frame: self.frame,
            line: self.line,
            cycle: self.cycle,
        }
    }

    /// Total number of completed passes.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::vic as reg;

    fn run_to(vic: &mut Vic, line: u16, cycle: u8) -> bool {
        let mut raised = false;
        loop {
            raised |= vic.clock();
            let beam = vic.beam();
            if beam.line == line && beam.cycle == cycle {
                return raised;
            }
        }
    }

    #[test]
    fn compare_assembles_low_field_and_carry_bit() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 44);
        vic.cpu_write(reg::CONTROL, Control::with_carry(true));
        assert_eq!(vic.compare(), ScanPosition::new(300));

        vic.cpu_write(reg::CONTROL, Control::with_carry(false));
        assert_eq!(vic.compare(), ScanPosition::new(44));
    }

    #[test]
    fn pending_raised_at_start_of_matching_line() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 100);
        vic.cpu_write(reg::CONTROL, Control::with_carry(false));
        vic.cpu_write(reg::INT_ENABLE, InterruptEnable::RASTER.bits());

        assert!(!run_to(&mut vic, 99, 62));
        assert!(!vic.irq_line());
        assert!(vic.clock(), "pending must rise on cycle 0 of the trigger line");
        assert_eq!(vic.beam().cycle, 0);
        assert!(vic.irq_line());
    }

    #[test]
    fn acknowledge_clears_only_written_bits() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 5);
        vic.cpu_write(reg::CONTROL, Control::with_carry(false));
        vic.cpu_write(reg::INT_ENABLE, InterruptEnable::RASTER.bits());
        run_to(&mut vic, 5, 0);
        assert!(vic.irq_line());

        vic.cpu_write(reg::INT_STATUS, InterruptStatus::RASTER.bits());
        assert!(!vic.irq_line());
        assert_eq!(vic.cpu_read(reg::INT_STATUS) & 0x0F, 0);
    }

    #[test]
    fn pending_without_enable_does_not_pull_the_line() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 5);
        vic.cpu_write(reg::CONTROL, Control::with_carry(false));
        run_to(&mut vic, 5, 0);
        assert!(!vic.irq_line());
        assert_ne!(vic.cpu_read(reg::INT_STATUS) & InterruptStatus::RASTER.bits(), 0);
    }

    #[test]
    fn raster_reads_return_current_position_not_compare() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 250);
        run_to(&mut vic, 300, 10);
        assert_eq!(vic.cpu_read(reg::RASTER), ScanPosition::new(300).low());
        assert_ne!(vic.cpu_read(reg::CONTROL) & Control::RASTER_CARRY.bits(), 0);
    }

    #[test]
    fn position_recurs_once_per_frame() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.cpu_write(reg::RASTER, 100);
        vic.cpu_write(reg::CONTROL, Control::with_carry(false));
        vic.cpu_write(reg::INT_ENABLE, InterruptEnable::RASTER.bits());

        let mut raises = 0;
        let cycles = VideoStandard::Pal.cycles_per_line() as u64
            * VideoStandard::Pal.lines_per_frame() as u64
            * 3;
        for _ in 0..cycles {
            if vic.clock() {
                raises += 1;
                vic.cpu_write(reg::INT_STATUS, InterruptStatus::RASTER.bits());
            }
        }
        assert_eq!(raises, 3);
    }
}
