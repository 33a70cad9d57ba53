//! System bus: address decoding over the device register file, the
//! auxiliary chips, and the interrupt vector latches.
//!
//! The bus is a borrowing view constructed for each processor step. The
//! register file is the only shared mutable resource in the system; the
//! single-writer discipline comes from the interrupt-disable window, not
//! from any lock here.

use crate::cia::Cia;
use crate::memory;
use crate::vic::Vic;

/// The two bytes the processor consults immediately on interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct VectorLatch {
    pub(crate) lo: u8,
    pub(crate) hi: u8,
}

impl VectorLatch {
    /// Address the processor dispatches to on interrupt.
    pub(crate) fn address(self) -> u16 {
        u16::from_le_bytes([self.lo, self.hi])
    }
}

/// Per-step view over everything the processor can address.
#[derive(Debug)]
pub(crate) struct SystemBus<'a> {
    vic: &'a mut Vic,
    cia1: &'a mut Cia,
    cia2: &'a mut Cia,
    vectors: &'a mut VectorLatch,
}

impl<'a> SystemBus<'a> {
    pub(crate) fn new(
        vic: &'a mut Vic,
        cia1: &'a mut Cia,
        cia2: &'a mut Cia,
        vectors: &'a mut VectorLatch,
    ) -> Self {
        Self {
            vic,
            cia1,
            cia2,
            vectors,
        }
    }

    pub(crate) fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0xD000..=0xD03F => self.vic.cpu_read(addr),
            memory::cia::CIA1_INT_CONTROL => self.cia1.read_control(),
            memory::cia::CIA2_INT_CONTROL => self.cia2.read_control(),
            memory::cpu::VECTOR_LO => self.vectors.lo,
            memory::cpu::VECTOR_HI => self.vectors.hi,
            _ => 0,
        }
    }

    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0xD000..=0xD03F => self.vic.cpu_write(addr, value),
            memory::cia::CIA1_INT_CONTROL => self.cia1.write_control(value),
            memory::cia::CIA2_INT_CONTROL => self.cia2.write_control(value),
            memory::cpu::VECTOR_LO => self.vectors.lo = value,
            memory::cpu::VECTOR_HI => self.vectors.hi = value,
            _ => {}
        }
    }

    /// Address installed in the vector latches.
    pub(crate) fn vector(&self) -> u16 {
        self.vectors.address()
    }

    /// Level of the shared interrupt line: any enabled pending source on
    /// any chip pulls it.
    pub(crate) fn irq_line(&self) -> bool {
        self.vic.irq_line() || self.cia1.irq_line() || self.cia2.irq_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::VideoStandard;

    #[test]
    fn routes_vector_latches() {
        let mut vic = Vic::new(VideoStandard::Pal);
        let mut cia1 = Cia::new();
        let mut cia2 = Cia::new();
        let mut vectors = VectorLatch::default();
        let mut bus = SystemBus::new(&mut vic, &mut cia1, &mut cia2, &mut vectors);

        bus.write(memory::cpu::VECTOR_LO, 0x20);
        bus.write(memory::cpu::VECTOR_HI, 0x0C);
        assert_eq!(bus.vector(), 0x0C20);
        assert_eq!(bus.read(memory::cpu::VECTOR_LO), 0x20);
    }

    #[test]
    fn unmapped_addresses_read_zero() {
        let mut vic = Vic::new(VideoStandard::Pal);
        let mut cia1 = Cia::new();
        let mut cia2 = Cia::new();
        let mut vectors = VectorLatch::default();
        let mut bus = SystemBus::new(&mut vic, &mut cia1, &mut cia2, &mut vectors);
        assert_eq!(bus.read(0x1234), 0);
    }
}
