use bitflags::bitflags;

bitflags! {
    /// Interrupt status register (`$D019`).
    ///
    /// Writing a byte with 1-bits acknowledges (clears) those sources.
    /// Reads additionally report bit 7 when any enabled source is pending.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct InterruptStatus: u8 {
        /// Scan position reached the compare value (bit 0).
        const RASTER = 0b0000_0001;

        /// Sprite/background collision (bit 1). Never raised by this model;
        /// kept so acknowledge writes mask correctly.
        const COLLISION = 0b0000_0010;

        /// Light pen latch (bit 3).
        const LIGHT_PEN = 0b0000_1000;
    }
}

bitflags! {
    /// Interrupt enable register (`$D01A`). Same source layout as
    /// [`InterruptStatus`]; a source only pulls the interrupt line while its
    /// enable bit is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct InterruptEnable: u8 {
        const RASTER = 0b0000_0001;
        const COLLISION = 0b0000_0010;
        const LIGHT_PEN = 0b0000_1000;
    }
}

impl Default for InterruptStatus {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for InterruptEnable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Bit 7 of a status read: set while any enabled source is pending.
pub(crate) const STATUS_ANY: u8 = 0b1000_0000;
