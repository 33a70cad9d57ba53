//! Scan position type shared by the device model and the chain compiler.

use core::fmt;

use crate::timing::VideoStandard;

/// Index of the line the video generator is drawing (or is configured to
/// trigger on). The full range does not fit in one hardware field: the low
/// 8 bits live in the raster register while bit 8 is a carry bit stored in
/// the control register. Callers must read/assemble both parts consistently.
///
/// The position increases monotonically within a pass, then resets to zero
/// (clearing the carry bit); a given value recurs once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScanPosition(u16);

impl ScanPosition {
    /// Wraps a raw line index. Values are masked to the 9 bits the hardware
    /// fields can represent.
    pub const fn new(line: u16) -> Self {
        Self(line & 0x01FF)
    }

    /// Reassembles a position from its two hardware fields.
    pub const fn assemble(low: u8, carry: bool) -> Self {
        Self(low as u16 | if carry { 0x0100 } else { 0 })
    }

    /// Full line index.
    pub const fn line(self) -> u16 {
        self.0
    }

    /// Low 8 bits, as held by the raster register.
    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    /// Bit 8, as held by the control register's high bit.
    pub const fn carry(self) -> bool {
        self.0 & 0x0100 != 0
    }

    /// Position one line later, wrapping at the end of the frame.
    pub const fn next(self, standard: VideoStandard) -> Self {
        let line = self.0 + 1;
        if line >= standard.lines_per_frame() {
            Self(0)
        } else {
            Self(line)
        }
    }

    /// Lines from `self` to `other`, measured forward around the frame.
    pub const fn lines_until(self, other: Self, standard: VideoStandard) -> u16 {
        let frame = standard.lines_per_frame();
        if other.0 >= self.0 {
            other.0 - self.0
        } else {
            frame - self.0 + other.0
        }
    }
}

impl fmt::Display for ScanPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}
