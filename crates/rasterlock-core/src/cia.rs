//! Auxiliary peripheral interrupt-control latch.
//!
//! The reference platform carries two peripheral chips whose interrupt
//! sources share the processor's interrupt line with the raster source.
//! The scheduler never uses them; the startup contract neutralizes both so
//! only the position-triggered source is live. This model keeps just the
//! enable mask and pending latch needed to honor that contract.

/// One auxiliary chip's interrupt control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Cia {
    /// Enabled source bits (bits 0-6).
    enable_mask: u8,
    /// Latched pending source bits.
    pending: u8,
}

impl Cia {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Interrupt control register write: bit 7 selects set (1) or clear (0)
    /// for the enable bits named in bits 0-6.
    pub(crate) fn write_control(&mut self, value: u8) {
        let sources = value & 0x7F;
        if value & 0x80 != 0 {
            self.enable_mask |= sources;
        } else {
            self.enable_mask &= !sources;
        }
    }

    /// Interrupt control register read: returns pending sources (bit 7 set
    /// while any enabled source is pending) and clears the pending latch.
    pub(crate) fn read_control(&mut self) -> u8 {
        let mut value = self.pending;
        if self.pending & self.enable_mask != 0 {
            value |= 0x80;
        }
        self.pending = 0;
        value
    }

    /// Side-effect-free view of the pending latch.
    pub(crate) fn peek_control(&self) -> u8 {
        let mut value = self.pending;
        if self.pending & self.enable_mask != 0 {
            value |= 0x80;
        }
        value
    }

    /// Level this chip contributes to the shared interrupt line.
    pub(crate) fn irq_line(&self) -> bool {
        self.pending & self.enable_mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::cia::DISABLE_ALL;

    #[test]
    fn disable_all_neutralizes_every_source() {
        let mut cia = Cia::new();
        cia.write_control(0x80 | 0x01); // enable source 0
        cia.pending = 0x01;
        assert!(cia.irq_line());

        cia.write_control(DISABLE_ALL);
        assert!(!cia.irq_line());
    }

    #[test]
    fn control_read_drains_pending() {
        let mut cia = Cia::new();
        cia.pending = 0x02;
        let first = cia.read_control();
        assert_eq!(first & 0x7F, 0x02);
        assert_eq!(cia.read_control(), 0);
    }
}
