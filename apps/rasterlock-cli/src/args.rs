use clap::{Parser, ValueEnum};
use rasterlock_core::timing::VideoStandard;

/// Rasterlock stability report
///
/// Compiles a split-screen interrupt chain, runs it against the
/// cycle-stepped machine with a jittery background workload, and reports
/// where the visible mutation landed on every frame.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video timing standard to simulate
    #[arg(long, value_enum, default_value_t = Standard::Pal)]
    pub standard: Standard,

    /// Line on which the capture phase fires (the split starts one line
    /// later)
    #[arg(long, default_value_t = 100)]
    pub capture_line: u16,

    /// Line on which the apply phase restores the effect registers
    #[arg(long, default_value_t = 200)]
    pub apply_line: u16,

    /// Value the stabilize phase writes into the first effect register
    #[arg(long, default_value_t = 0x00)]
    pub border: u8,

    /// Value the stabilize phase writes into the second effect register
    #[arg(long, default_value_t = 0x0B)]
    pub background: u8,

    /// Number of frames to run
    #[arg(long, default_value_t = 50)]
    pub frames: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    Pal,
    Ntsc,
}

impl From<Standard> for VideoStandard {
    fn from(standard: Standard) -> Self {
        match standard {
            Standard::Pal => VideoStandard::Pal,
            Standard::Ntsc => VideoStandard::Ntsc,
        }
    }
}
