//! Video standard timing profiles and fixed processor costs.

use core::fmt;

/// Timing profile of the raster generator, selected once per machine.
///
/// Unlike a user-facing region setting this never has an "auto" value: it
/// always resolves to a concrete cycle/line grid, because every budget in the
/// chain compiler is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoStandard {
    /// European timing: 63 cycles per line, 312 lines per frame.
    #[default]
    Pal,
    /// North American timing: 65 cycles per line, 263 lines per frame.
    Ntsc,
}

impl VideoStandard {
    /// Bus cycles the generator spends on one scan line.
    pub const fn cycles_per_line(self) -> u8 {
        match self {
            VideoStandard::Pal => 63,
            VideoStandard::Ntsc => 65,
        }
    }

    /// Scan lines per full pass of the generator.
    pub const fn lines_per_frame(self) -> u16 {
        match self {
            VideoStandard::Pal => 312,
            VideoStandard::Ntsc => 263,
        }
    }

    /// Last cycle of a line on which the generator still draws visible
    /// pixels. A visible-effect write landing at or before this column shows
    /// up as a jagged mid-line transition.
    pub const fn last_visible_cycle(self) -> u8 {
        55
    }

    /// First cycle of a line that is safely inside the border region.
    pub const fn first_offscreen_cycle(self) -> u8 {
        self.last_visible_cycle() + 1
    }
}

impl fmt::Display for VideoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VideoStandard::Pal => "pal",
            VideoStandard::Ntsc => "ntsc",
        };
        f.write_str(s)
    }
}

/// Cycles the processor spends on the fixed interrupt entry sequence
/// (push return state, fetch the vector) before handler code runs.
pub const INTERRUPT_ENTRY_CYCLES: u8 = 7;

/// Duration of the longest indivisible processor operation. An interrupt
/// asserted just after such an operation begins waits this long for the next
/// instruction boundary.
pub const MAX_WORK_OP_CYCLES: u8 = 7;

/// Duration of the shortest ordinary program operation.
pub const MIN_WORK_OP_CYCLES: u8 = 2;
