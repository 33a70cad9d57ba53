//! Cycle-stepped processor model.
//!
//! The processor runs the background workload and, when the interrupt line
//! is asserted at an instruction boundary, performs a fixed 7-cycle entry
//! into the handler named by the live vector. Handler bodies are the
//! straight-line micro-op programs the chain compiler produced; every op
//! takes its full cost in cycles and its effect lands on the final one.
//!
//! The stack holds return frames rather than raw bytes. A stack mark lets
//! the capture phase leave a frame behind on purpose so that the stabilize
//! phase can return through it with the interrupted program none the wiser.

use crate::bus::SystemBus;
use crate::chain::program::MicroEffect;
use crate::chain::{ChainController, PhaseId};
use crate::event::{EventKind, EventLog};
use crate::memory;
use crate::timing::INTERRUPT_ENTRY_CYCLES;
use crate::vic::Beam;
use crate::workload::{RegisterLoad, Workload};

/// Programmer-visible register file of the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub y: u8,
}

/// What the processor is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Background workload instructions.
    Workload,
    /// The fixed interrupt entry sequence.
    Entry,
    /// Micro-op `index` of the named phase's program.
    Handler { phase: PhaseId, index: usize },
    /// Past the end of a phase program, burning one cycle at a time until
    /// the next interrupt arrives. Only the capture phase ends up here.
    IdleSpin { phase: PhaseId },
}

/// One pushed interrupt return frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReturnFrame {
    resume: Mode,
    irq_disabled: bool,
}

/// Result latched at the start of the current instruction, applied on its
/// final cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    None,
    Work(Option<RegisterLoad>),
    EntryComplete,
    Effect(MicroEffect),
}

#[derive(Debug)]
pub(crate) struct Cpu {
    a: u8,
    x: u8,
    y: u8,
    /// Saved register file from the most recent `SaveContext`.
    shadow: Option<CpuSnapshot>,
    stack: Vec<ReturnFrame>,
    /// Stack depth recorded by the capture phase.
    stack_mark: usize,
    irq_disabled: bool,
    mode: Mode,
    /// Cycles left in the current instruction; 0 means fetch on next clock.
    remaining: u8,
    pending: Pending,
    /// Mode that was running when the current entry sequence started.
    interrupted: Option<Mode>,
}

impl Cpu {
    /// Powered-on processor with interrupt delivery disabled, as it is until
    /// the startup sequence has armed the chain.
    pub(crate) fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            shadow: None,
            stack: Vec::new(),
            stack_mark: 0,
            irq_disabled: true,
            mode: Mode::Workload,
            remaining: 0,
            pending: Pending::None,
            interrupted: None,
        }
    }

    pub(crate) fn enable_delivery(&mut self) {
        self.irq_disabled = false;
    }

    pub(crate) fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.a,
            x: self.x,
            y: self.y,
        }
    }

    /// Executes one cycle. `at` is the beam position of this cycle, used to
    /// stamp emitted events.
    pub(crate) fn clock(
        &mut self,
        bus: &mut SystemBus<'_>,
        chain: &ChainController,
        workload: &mut Workload,
        log: &mut EventLog,
        at: Beam,
    ) {
        if self.remaining == 0 {
            self.begin(bus, chain, workload);
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.complete(bus, chain, log, at);
        }
    }

    /// Instruction boundary: sample the interrupt line, then fetch.
    fn begin(&mut self, bus: &mut SystemBus<'_>, chain: &ChainController, workload: &mut Workload) {
        if bus.irq_line() && !self.irq_disabled {
            self.interrupted = Some(self.mode);
            self.mode = Mode::Entry;
            self.remaining = INTERRUPT_ENTRY_CYCLES;
            self.pending = Pending::EntryComplete;
            return;
        }

        match self.mode {
            Mode::Workload => {
                let op = workload.fetch();
                self.remaining = op.cycles;
                self.pending = Pending::Work(op.load);
            }
            Mode::Handler { phase, index } => match chain.program(phase).op(index) {
                Some(op) => {
                    self.remaining = op.cost;
                    self.pending = Pending::Effect(op.effect);
                }
                None => {
                    self.mode = Mode::IdleSpin { phase };
                    self.remaining = 1;
                    self.pending = Pending::None;
                }
            },
            Mode::IdleSpin { .. } => {
                self.remaining = 1;
                self.pending = Pending::None;
            }
            // Entry keeps `remaining` nonzero for its whole duration.
            Mode::Entry => unreachable!("entry never reaches an instruction boundary"),
        }
    }

    /// Final cycle of the current instruction: its result lands now.
    fn complete(
        &mut self,
        bus: &mut SystemBus<'_>,
        chain: &ChainController,
        log: &mut EventLog,
        at: Beam,
    ) {
        match std::mem::take(&mut self.pending) {
            Pending::None => {}
            Pending::Work(load) => match load {
                Some(RegisterLoad::A(value)) => self.a = value,
                Some(RegisterLoad::X(value)) => self.x = value,
                Some(RegisterLoad::Y(value)) => self.y = value,
                None => {}
            },
            Pending::EntryComplete => {
                let resume = self.interrupted.take().unwrap_or(Mode::Workload);
                self.stack.push(ReturnFrame {
                    resume,
                    irq_disabled: self.irq_disabled,
                });
                self.irq_disabled = true;
                let vector = bus.vector();
                match chain.phase_for_vector(vector) {
                    Some(phase) => {
                        self.mode = Mode::Handler { phase, index: 0 };
                        log.record(at, EventKind::PhaseEntered(phase));
                    }
                    None => {
                        // An uninstalled vector means the startup sequence
                        // is incomplete; treat it as a spurious entry.
                        debug_assert!(false, "interrupt through uninstalled vector {vector:#06x}");
                        self.pop_frame();
                    }
                }
            }
            Pending::Effect(effect) => {
                let stepped = self.apply_effect(effect, bus, log, at);
                if stepped {
                    if let Mode::Handler { phase, index } = self.mode {
                        self.mode = Mode::Handler {
                            phase,
                            index: index + 1,
                        };
                    }
                }
            }
        }
    }

    /// Applies a micro-op effect. Returns `true` when the handler program
    /// should advance to its next op.
    fn apply_effect(
        &mut self,
        effect: MicroEffect,
        bus: &mut SystemBus<'_>,
        log: &mut EventLog,
        at: Beam,
    ) -> bool {
        match effect {
            MicroEffect::None => {}
            MicroEffect::SaveContext => self.shadow = Some(self.snapshot()),
            MicroEffect::RestoreContext => {
                if let Some(saved) = self.shadow.take() {
                    self.a = saved.a;
                    self.x = saved.x;
                    self.y = saved.y;
                }
            }
            MicroEffect::RecordStackMark => self.stack_mark = self.stack.len(),
            MicroEffect::RestoreStackMark => self.stack.truncate(self.stack_mark),
            MicroEffect::Write { addr, value } => {
                // Stores drive their value through the accumulator, which is
                // why phases bracket their bodies with save/restore.
                self.a = value;
                bus.write(addr, value);
                log.record(at, EventKind::RegisterWrite { addr, value });
            }
            MicroEffect::Acknowledge => {
                bus.write(memory::vic::INT_STATUS, 0xFF);
                if let Mode::Handler { phase, .. } = self.mode {
                    log.record(at, EventKind::InterruptAcknowledged(phase));
                }
            }
            MicroEffect::EnableDelivery => self.irq_disabled = false,
            MicroEffect::ReturnFromInterrupt => {
                self.pop_frame();
                log.record(at, EventKind::ReturnedToProgram);
                return false;
            }
        }
        true
    }

    fn pop_frame(&mut self) {
        match self.stack.pop() {
            Some(frame) => {
                self.mode = frame.resume;
                self.irq_disabled = frame.irq_disabled;
            }
            None => {
                debug_assert!(false, "interrupt return with an empty stack");
                self.mode = Mode::Workload;
                self.irq_disabled = false;
            }
        }
    }
}
