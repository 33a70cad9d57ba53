//! Shared definitions for the reference platform's memory map.
//!
//! Centralizing address-related constants keeps the hardware layout in one
//! location, prevents magic numbers from sneaking into other modules, and
//! makes it easier to reference the original chip documentation while reading
//! the code base.

/// Video device register block (`$D000` page).
pub mod vic {
    /// Control register (`$D011`). Bit 7 doubles as bit 8 of the raster
    /// compare value on write and of the current scan position on read.
    pub const CONTROL: u16 = 0xD011;
    /// Raster position register (`$D012`). Reads return the low 8 bits of
    /// the line currently being drawn; writes set the low 8 bits of the
    /// interrupt trigger position.
    pub const RASTER: u16 = 0xD012;
    /// Interrupt status register (`$D019`). Writing a byte with 1-bits
    /// acknowledges the corresponding pending sources.
    pub const INT_STATUS: u16 = 0xD019;
    /// Interrupt enable register (`$D01A`). Arms/disarms interrupt sources.
    pub const INT_ENABLE: u16 = 0xD01A;
    /// Effect register A (`$D020`, border color selector). Writes take
    /// effect at the current scan position.
    pub const EFFECT_A: u16 = 0xD020;
    /// Effect register B (`$D021`, background color selector).
    pub const EFFECT_B: u16 = 0xD021;
}

/// Auxiliary peripheral interrupt-control registers. Both must be
/// neutralized once at startup so only the raster source is live.
pub mod cia {
    /// Interrupt control register of the first auxiliary chip (`$DC0D`).
    pub const CIA1_INT_CONTROL: u16 = 0xDC0D;
    /// Interrupt control register of the second auxiliary chip (`$DD0D`).
    pub const CIA2_INT_CONTROL: u16 = 0xDD0D;
    /// Written to an interrupt control register, clears every enable bit.
    pub const DISABLE_ALL: u8 = 0x7F;
}

/// Processor-side addresses.
pub mod cpu {
    /// Interrupt vector low byte address (`$FFFE`). Consulted by the
    /// processor immediately on interrupt entry.
    pub const VECTOR_LO: u16 = 0xFFFE;
    /// Interrupt vector high byte address (`$FFFF`).
    pub const VECTOR_HI: u16 = 0xFFFF;

    /// First address of the block phase handlers are installed in.
    ///
    /// Handlers are spaced [`HANDLER_STRIDE`] bytes apart inside a single
    /// page, so every handler address shares the same high byte. Rewriting
    /// the live vector therefore only ever changes the low byte, which makes
    /// the two-byte install sequence effectively atomic: the vector never
    /// transiently points outside the handler block.
    pub const HANDLER_BASE: u16 = 0x0C00;
    /// Distance between consecutive phase handler entry points.
    pub const HANDLER_STRIDE: u16 = 0x20;
    /// Number of handler slots that fit in the block with a shared high byte.
    pub const HANDLER_SLOTS: usize = 8;
}
