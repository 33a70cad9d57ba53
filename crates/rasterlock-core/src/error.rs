use std::fmt;

use crate::chain::PhaseId;

/// Configuration-time validation failures.
///
/// The running scheduler has no recoverable-error channel: timing defects
/// are prevented by the chain compiler's budget arithmetic, and everything
/// it can rule out up front is reported here instead of being guarded at
/// run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A phase's fixed body does not fit in its line at worst-case entry
    /// latency, so no non-negative padding count exists.
    BudgetUnderflow {
        phase: PhaseId,
        line_cycles: u32,
        required: u32,
    },
    /// A guard spin is shorter than the minimum that keeps the phase's
    /// re-arm off its own trigger line.
    GuardTooShort {
        phase: PhaseId,
        configured: u32,
        minimum: u32,
    },
    /// A trigger position falls outside the frame (or in a slot the chain
    /// cannot use, such as line 0 for the capture phase).
    TriggerOutOfRange { phase: PhaseId, trigger: u16 },
    /// A trigger position leaves the previous phase too little room to
    /// finish before it fires.
    TriggerTooClose {
        phase: PhaseId,
        trigger: u16,
        earliest: u16,
    },
    /// The capture trigger sits on the last line of the low field, so
    /// advancing it one line would have to rewrite the carry bit and the
    /// fixed capture body cost would no longer hold.
    TriggerCarryCross { trigger: u16 },
    /// A calibrated spin lands its mutation inside the visible area.
    MutationInsideVisibleArea {
        landing_cycle: u32,
        first_offscreen: u32,
    },
    /// More phases than the handler vector block has slots for.
    TooManyPhases { count: usize, limit: usize },
    /// A calibrated or guard spin with zero-cost iterations.
    ZeroCycleSpin { phase: PhaseId },
    /// The interrupted-program model has no operations to execute.
    EmptyWorkload,
    /// A workload operation duration outside the platform's 2-7 range.
    WorkOpCycles { cycles: u8 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetUnderflow {
                phase,
                line_cycles,
                required,
            } => write!(
                f,
                "{phase} phase needs {required} cycles at worst-case latency but the line has {line_cycles}"
            ),
            Self::GuardTooShort {
                phase,
                configured,
                minimum,
            } => write!(
                f,
                "{phase} phase guard of {configured} iterations can re-arm on its own line; minimum is {minimum}"
            ),
            Self::TriggerOutOfRange { phase, trigger } => {
                write!(f, "{phase} phase trigger line {trigger} is outside the usable frame")
            }
            Self::TriggerTooClose {
                phase,
                trigger,
                earliest,
            } => write!(
                f,
                "{phase} phase trigger line {trigger} fires before the previous phase can finish (earliest {earliest})"
            ),
            Self::TriggerCarryCross { trigger } => write!(
                f,
                "capture trigger line {trigger} advances across the carry bit; pick a line whose successor shares it"
            ),
            Self::MutationInsideVisibleArea {
                landing_cycle,
                first_offscreen,
            } => write!(
                f,
                "mutation lands at cycle {landing_cycle}, inside the visible area (offscreen starts at {first_offscreen})"
            ),
            Self::TooManyPhases { count, limit } => {
                write!(f, "chain has {count} phases but the handler block holds {limit}")
            }
            Self::ZeroCycleSpin { phase } => {
                write!(f, "{phase} phase spin configured with zero cycles per iteration")
            }
            Self::EmptyWorkload => write!(f, "interrupted-program workload has no operations"),
            Self::WorkOpCycles { cycles } => {
                write!(f, "workload operation duration {cycles} outside the 2-7 cycle range")
            }
        }
    }
}

impl std::error::Error for Error {}
