//! Observable event stream emitted by the simulated machine.
//!
//! Every externally meaningful moment is stamped with the exact beam
//! position at which it happened, which is what the timing assertions in the
//! test suite key on.

use crate::chain::PhaseId;
use crate::vic::Beam;

/// A timestamped observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub at: Beam,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The raster comparator fired and asserted the interrupt line.
    InterruptRaised,
    /// The first body cycle of a phase handler is about to run. The stamp is
    /// the cycle on which entry completed.
    PhaseEntered(PhaseId),
    /// A store into the device register file landed.
    RegisterWrite { addr: u16, value: u8 },
    /// A phase wrote the acknowledge register.
    InterruptAcknowledged(PhaseId),
    /// A genuine interrupt return resumed the interrupted program.
    ReturnedToProgram,
}

#[derive(Debug, Default)]
pub(crate) struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub(crate) fn record(&mut self, at: Beam, kind: EventKind) {
        tracing::trace!(frame = at.frame, line = at.line, cycle = at.cycle, ?kind, "event");
        self.events.push(Event { at, kind });
    }

    pub(crate) fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
