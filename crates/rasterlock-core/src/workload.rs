//! Model of the program the interrupt chain keeps interrupting.
//!
//! The scheduler's whole point is that the interrupted program is arbitrary:
//! entry latency into the capture phase depends on whatever operation was in
//! flight when the trigger line started. A workload is a looping stream of
//! operations with realistic durations and optional register loads, so tests
//! can vary the latency within its bound and observe context fidelity.

use crate::error::Error;
use crate::timing::{MAX_WORK_OP_CYCLES, MIN_WORK_OP_CYCLES};

/// Which transient register an operation loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterLoad {
    A(u8),
    X(u8),
    Y(u8),
}

/// One operation of the interrupted program: an indivisible duration and an
/// optional register side effect applied on its final cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkOp {
    pub cycles: u8,
    pub load: Option<RegisterLoad>,
}

impl WorkOp {
    /// Operation with no register effect.
    pub const fn nop(cycles: u8) -> Self {
        Self { cycles, load: None }
    }

    pub const fn load_a(cycles: u8, value: u8) -> Self {
        Self {
            cycles,
            load: Some(RegisterLoad::A(value)),
        }
    }

    pub const fn load_x(cycles: u8, value: u8) -> Self {
        Self {
            cycles,
            load: Some(RegisterLoad::X(value)),
        }
    }

    pub const fn load_y(cycles: u8, value: u8) -> Self {
        Self {
            cycles,
            load: Some(RegisterLoad::Y(value)),
        }
    }
}

/// Looping stream of [`WorkOp`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    ops: Vec<WorkOp>,
    next: usize,
}

impl Workload {
    /// Validates durations (each op must be an indivisible 2-7 cycle
    /// operation) and builds the stream.
    pub fn new(ops: Vec<WorkOp>) -> Result<Self, Error> {
        if ops.is_empty() {
            return Err(Error::EmptyWorkload);
        }
        for op in &ops {
            if op.cycles < MIN_WORK_OP_CYCLES || op.cycles > MAX_WORK_OP_CYCLES {
                return Err(Error::WorkOpCycles { cycles: op.cycles });
            }
        }
        Ok(Self { ops, next: 0 })
    }

    /// Stream of `len` identical no-effect operations.
    pub fn uniform(cycles: u8, len: usize) -> Result<Self, Error> {
        Self::new(vec![WorkOp::nop(cycles); len.max(1)])
    }

    /// Next operation, advancing the loop.
    pub(crate) fn fetch(&mut self) -> WorkOp {
        let op = self.ops[self.next];
        self.next = (self.next + 1) % self.ops.len();
        op
    }

    /// Index of the operation the next fetch will return.
    pub fn position(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_out_of_range_ops() {
        assert_eq!(Workload::new(Vec::new()), Err(Error::EmptyWorkload));
        let err = Workload::new(vec![WorkOp::nop(1)]);
        assert_eq!(err, Err(Error::WorkOpCycles { cycles: 1 }));
        let err = Workload::new(vec![WorkOp::nop(8)]);
        assert_eq!(err, Err(Error::WorkOpCycles { cycles: 8 }));
    }

    #[test]
    fn fetch_loops_over_the_stream() {
        let mut load = Workload::new(vec![WorkOp::nop(2), WorkOp::load_a(3, 0x42)])
            .expect("valid workload");
        assert_eq!(load.position(), 0);
        assert_eq!(load.fetch().cycles, 2);
        assert_eq!(load.position(), 1);
        assert_eq!(load.fetch().load, Some(RegisterLoad::A(0x42)));
        assert_eq!(load.fetch().cycles, 2);
        assert_eq!(load.position(), 1);
    }
}
