//! Compiled phase handler programs.
//!
//! A phase runs as a straight-line sequence of micro-operations with fixed
//! processor costs. The costs mirror the reference processor's cycle table:
//! implied/register operations take 2 cycles, an absolute store 4, a
//! read-modify-write 6, the interrupt return 6, and the no-effect padding
//! unit 1. An operation's side effect lands on its final cycle, which is
//! what makes the mutation column arithmetic exact.

/// Implied/register operation (flag change, stack-mark bookkeeping).
pub(crate) const COST_IMPLIED: u8 = 2;
/// Absolute store; the written value hits the bus on the last cycle.
pub(crate) const COST_STORE: u8 = 4;
/// Read-modify-write, as used to acknowledge the interrupt status register.
pub(crate) const COST_RMW: u8 = 6;
/// Return-from-interrupt sequence.
pub(crate) const COST_RTI: u8 = 6;
/// Copying the three transient registers into shadow storage.
pub(crate) const COST_SNAPSHOT_SAVE: u8 = 4;
/// Copying shadow storage back; no push/pop ordering involved.
pub(crate) const COST_SNAPSHOT_RESTORE: u8 = 2;
/// One no-effect padding unit.
pub(crate) const COST_NO_EFFECT: u8 = 1;
/// One calibrated spin iteration (2-cycle decrement + 3-cycle taken branch).
pub(crate) const SPIN_ITERATION_CYCLES: u8 = COST_IMPLIED + 3;
/// One guard spin iteration (plain 2-cycle no-operation).
pub(crate) const GUARD_ITERATION_CYCLES: u8 = COST_IMPLIED;

/// Side effect a micro-operation applies on its final cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MicroEffect {
    /// Pure dwell; consumes cycles and nothing else.
    None,
    /// Copy the transient registers into shadow storage.
    SaveContext,
    /// Copy shadow storage back into the transient registers.
    RestoreContext,
    /// Remember the current return-frame stack depth.
    RecordStackMark,
    /// Drop every frame pushed since the recorded mark.
    RestoreStackMark,
    /// Store a byte into the register file.
    Write { addr: u16, value: u8 },
    /// Acknowledge the pending raster interrupt.
    Acknowledge,
    /// Re-enable interrupt delivery.
    EnableDelivery,
    /// Genuine return-from-interrupt: consume the top return frame.
    ReturnFromInterrupt,
}

/// One costed step of a phase program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MicroOp {
    pub(crate) cost: u8,
    pub(crate) effect: MicroEffect,
}

impl MicroOp {
    pub(crate) const fn store(addr: u16, value: u8) -> Self {
        Self {
            cost: COST_STORE,
            effect: MicroEffect::Write { addr, value },
        }
    }

    pub(crate) const fn no_effect(cost: u8) -> Self {
        Self {
            cost,
            effect: MicroEffect::None,
        }
    }

    pub(crate) const fn save_context() -> Self {
        Self {
            cost: COST_SNAPSHOT_SAVE,
            effect: MicroEffect::SaveContext,
        }
    }

    pub(crate) const fn restore_context() -> Self {
        Self {
            cost: COST_SNAPSHOT_RESTORE,
            effect: MicroEffect::RestoreContext,
        }
    }

    pub(crate) const fn record_stack_mark() -> Self {
        Self {
            cost: COST_IMPLIED,
            effect: MicroEffect::RecordStackMark,
        }
    }

    pub(crate) const fn restore_stack_mark() -> Self {
        Self {
            cost: COST_IMPLIED,
            effect: MicroEffect::RestoreStackMark,
        }
    }

    pub(crate) const fn acknowledge() -> Self {
        Self {
            cost: COST_RMW,
            effect: MicroEffect::Acknowledge,
        }
    }

    pub(crate) const fn enable_delivery() -> Self {
        Self {
            cost: COST_IMPLIED,
            effect: MicroEffect::EnableDelivery,
        }
    }

    pub(crate) const fn return_from_interrupt() -> Self {
        Self {
            cost: COST_RTI,
            effect: MicroEffect::ReturnFromInterrupt,
        }
    }
}

/// Straight-line micro-operation sequence for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Program {
    ops: Vec<MicroOp>,
}

impl Program {
    pub(crate) fn new(ops: Vec<MicroOp>) -> Self {
        Self { ops }
    }

    /// Operation at `index`, or `None` past the end (a chaining phase falls
    /// into the idle no-effect spin there).
    pub(crate) fn op(&self, index: usize) -> Option<MicroOp> {
        self.ops.get(index).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    /// Total cycle cost of the whole sequence.
    pub(crate) fn total_cost(&self) -> u32 {
        self.ops.iter().map(|op| op.cost as u32).sum()
    }

    /// Cycle cost up to (excluding) `index`.
    pub(crate) fn cost_before(&self, index: usize) -> u32 {
        self.ops
            .iter()
            .take(index)
            .map(|op| op.cost as u32)
            .sum()
    }
}
