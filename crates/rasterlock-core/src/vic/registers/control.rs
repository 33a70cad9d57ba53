use bitflags::bitflags;

bitflags! {
    /// Control register (`$D011`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// R . . D S y y y
    /// ```
    /// - `R`: raster carry bit — bit 8 of the raster compare value on write,
    ///   bit 8 of the current scan position on read
    /// - `D`: display enable
    /// - `S`: row select
    /// - `y`: vertical fine scroll
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct Control: u8 {
        /// Vertical fine scroll field (bits 0-2).
        const SCROLL_Y = 0b0000_0111;

        /// Row select (bit 3).
        const ROW_SELECT = 0b0000_1000;

        /// Display enable (bit 4).
        const DISPLAY_ENABLE = 0b0001_0000;

        /// Raster compare / position carry bit (bit 7).
        const RASTER_CARRY = 0b1000_0000;
    }
}

impl Control {
    /// Power-on value: display enabled, 25-row window, scroll 3.
    pub(crate) const fn power_on() -> Self {
        Self::from_bits_retain(0x1B)
    }

    /// Power-on register value with the raster carry bit folded in, as a
    /// phase program would store it when arming a trigger position.
    pub(crate) const fn with_carry(carry: bool) -> u8 {
        if carry {
            Self::power_on().bits() | Self::RASTER_CARRY.bits()
        } else {
            Self::power_on().bits()
        }
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::power_on()
    }
}
