//! The phase controller: chain configuration, compilation, and validation.
//!
//! A chain is an ordered cycle of interrupt handler phases. The capture
//! phase absorbs the unknown entry latency, the stabilize phase performs the
//! visible mutation from a now-exact position, and one or more apply phases
//! perform later mutations before re-arming capture for the next frame.
//! Phases hand control to one another through the live vector/trigger pair
//! in the register file; at most one phase is armed at any instant.
//!
//! Compilation turns the configuration into straight-line micro-op programs
//! with fixed costs and runs every budget check up front. The running chain
//! has no spare cycles for guards, so anything that can go wrong for timing
//! reasons must be rejected here.

pub(crate) mod program;

use crate::budget;
use crate::error::Error;
use crate::memory;
use crate::scan::ScanPosition;
use crate::timing::VideoStandard;
use crate::vic::registers::Control;
use core::fmt;
use program::{
    COST_NO_EFFECT, GUARD_ITERATION_CYCLES, MicroOp, Program, SPIN_ITERATION_CYCLES,
};

/// Identity of a phase in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseId {
    /// First phase; entered with unknown latency, never returns.
    Capture,
    /// Second phase; entered with exact latency, performs the mutation and
    /// the genuine interrupt return.
    Stabilize,
    /// Later phase `k`; its own one-phase episode.
    Apply(usize),
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseId::Capture => f.write_str("capture"),
            PhaseId::Stabilize => f.write_str("stabilize"),
            PhaseId::Apply(k) => write!(f, "apply {k}"),
        }
    }
}

/// One register-file store performed by a phase body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub addr: u16,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(addr: u16, value: u8) -> Self {
        Self { addr, value }
    }
}

/// Calibrated spin executed by the stabilize phase before it mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinConfig {
    pub iterations: u32,
    pub cycles_per_iteration: u8,
}

impl SpinConfig {
    /// Smallest spin that pushes the first mutation write off the visible
    /// area for the given standard, using the platform's 5-cycle iteration.
    pub fn calibrated(standard: VideoStandard) -> Self {
        let iterations = budget::spin_iterations(
            standard.first_offscreen_cycle() as u32,
            budget::best_case_entry_latency(),
            program::COST_IMPLIED as u32,
            program::COST_STORE as u32,
            SPIN_ITERATION_CYCLES as u32,
        );
        Self {
            iterations,
            cycles_per_iteration: SPIN_ITERATION_CYCLES,
        }
    }
}

/// Guard iterations that keep an apply phase's re-arm off its own trigger
/// line with margin on both supported standards.
pub const DEFAULT_GUARD_ITERATIONS: u32 = 19;

/// Configuration of one apply phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyConfig {
    pub trigger: ScanPosition,
    pub mutation: Vec<RegisterWrite>,
    pub guard_iterations: u32,
}

/// Whole-chain configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Trigger position of the capture phase (P0). Stabilize fires exactly
    /// one line later; that is structural, not configurable.
    pub capture_trigger: ScanPosition,
    /// Register stores the stabilize phase performs once off-screen.
    pub stabilize_mutation: Vec<RegisterWrite>,
    pub stabilize_spin: SpinConfig,
    /// Apply phases in firing order. May be empty, in which case stabilize
    /// re-arms capture directly.
    pub applies: Vec<ApplyConfig>,
}

impl ChainConfig {
    /// The classic split-screen color chain: stabilize switches both effect
    /// registers at `capture_trigger + 1`, a single apply phase restores
    /// them at `restore_trigger` and re-arms capture for the next frame.
    pub fn color_split(
        standard: VideoStandard,
        capture_trigger: ScanPosition,
        restore_trigger: ScanPosition,
        effect_a: u8,
        effect_b: u8,
    ) -> Self {
        Self {
            capture_trigger,
            stabilize_mutation: vec![
                RegisterWrite::new(memory::vic::EFFECT_A, effect_a),
                RegisterWrite::new(memory::vic::EFFECT_B, effect_b),
            ],
            stabilize_spin: SpinConfig::calibrated(standard),
            applies: vec![ApplyConfig {
                trigger: restore_trigger,
                mutation: vec![
                    RegisterWrite::new(memory::vic::EFFECT_A, 0x0E),
                    RegisterWrite::new(memory::vic::EFFECT_B, 0x06),
                ],
                guard_iterations: DEFAULT_GUARD_ITERATIONS,
            }],
        }
    }
}

/// Static description of one compiled phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub id: PhaseId,
    /// Scan position whose line start fires this phase.
    pub trigger: ScanPosition,
    /// Handler address this phase lives at (what its predecessor installs).
    pub vector: u16,
    /// Phase that this phase arms before it ends.
    pub successor: PhaseId,
    /// Fixed cycle cost of the body, excluding padding.
    pub body_cost: u32,
    /// No-effect padding units appended after the body (capture only).
    pub padding: u32,
    pub(crate) program: Program,
}

/// The compiled, validated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainController {
    phases: Vec<PhaseDescriptor>,
}

impl ChainController {
    pub(crate) fn compile(config: &ChainConfig, standard: VideoStandard) -> Result<Self, Error> {
        let line_cycles = standard.cycles_per_line() as u32;
        let lines = standard.lines_per_frame();
        let phase_count = 2 + config.applies.len();
        if phase_count > memory::cpu::HANDLER_SLOTS {
            return Err(Error::TooManyPhases {
                count: phase_count,
                limit: memory::cpu::HANDLER_SLOTS,
            });
        }

        let capture = config.capture_trigger;
        // Line 0 starts a frame; the beam parks there at power-on, so the
        // first matching event would be missed. The stabilize trigger must
        // also still be inside the frame.
        if capture.line() == 0 || capture.line() + 1 >= lines {
            return Err(Error::TriggerOutOfRange {
                phase: PhaseId::Capture,
                trigger: capture.line(),
            });
        }
        let stabilize_trigger = capture.next(standard);
        if capture.carry() != stabilize_trigger.carry() {
            return Err(Error::TriggerCarryCross {
                trigger: capture.line(),
            });
        }

        if config.stabilize_spin.cycles_per_iteration == 0 {
            return Err(Error::ZeroCycleSpin {
                phase: PhaseId::Stabilize,
            });
        }
        let landing = budget::mutation_landing_cycle(
            budget::best_case_entry_latency(),
            program::COST_IMPLIED as u32,
            config.stabilize_spin.iterations,
            config.stabilize_spin.cycles_per_iteration as u32,
            program::COST_STORE as u32,
        );
        // Landing past the line end would wrap into the next line's visible
        // area, so the window is (last_visible, line_cycles).
        if landing <= standard.last_visible_cycle() as u32 || landing >= line_cycles {
            return Err(Error::MutationInsideVisibleArea {
                landing_cycle: landing,
                first_offscreen: standard.first_offscreen_cycle() as u32,
            });
        }

        let mut phases = Vec::with_capacity(phase_count);

        let stabilize_successor = match config.applies.first() {
            Some(_) => PhaseId::Apply(0),
            None => PhaseId::Capture,
        };

        // Capture: absorb unknown latency, hand off by direct vectoring.
        let capture_program = build_capture(vector_for(1), stabilize_trigger, standard)?;
        phases.push(PhaseDescriptor {
            id: PhaseId::Capture,
            trigger: capture,
            vector: vector_for(0),
            successor: PhaseId::Stabilize,
            body_cost: capture_program.body_cost,
            padding: capture_program.padding,
            program: capture_program.program,
        });

        // Stabilize: exact-latency mutation plus the genuine return.
        let (succ_vector, succ_trigger) =
            successor_target(config, capture, stabilize_successor, standard);
        let stabilize_program = build_stabilize(config, succ_vector, succ_trigger);
        let stabilize_cost = stabilize_program.total_cost();
        phases.push(PhaseDescriptor {
            id: PhaseId::Stabilize,
            trigger: stabilize_trigger,
            vector: vector_for(1),
            successor: stabilize_successor,
            body_cost: stabilize_cost,
            padding: 0,
            program: stabilize_program,
        });

        // Earliest line the next trigger may use after stabilize.
        let stabilize_end = budget::best_case_entry_latency() + stabilize_cost;
        let mut earliest =
            stabilize_trigger.line() + budget::lines_spanned(stabilize_end, line_cycles);

        for (k, apply) in config.applies.iter().enumerate() {
            let id = PhaseId::Apply(k);
            if apply.trigger.line() >= lines {
                return Err(Error::TriggerOutOfRange {
                    phase: id,
                    trigger: apply.trigger.line(),
                });
            }
            if apply.trigger.line() < earliest {
                return Err(Error::TriggerTooClose {
                    phase: id,
                    trigger: apply.trigger.line(),
                    earliest,
                });
            }

            // The re-arm must not land on this phase's own trigger line.
            let post_guard = 4 * apply.mutation.len() as u32 + 12;
            let minimum = budget::min_guard_iterations(
                line_cycles,
                program::COST_SNAPSHOT_SAVE as u32,
                post_guard,
                GUARD_ITERATION_CYCLES as u32,
            );
            if apply.guard_iterations < minimum {
                return Err(Error::GuardTooShort {
                    phase: id,
                    configured: apply.guard_iterations,
                    minimum,
                });
            }

            let successor = if k + 1 < config.applies.len() {
                PhaseId::Apply(k + 1)
            } else {
                PhaseId::Capture
            };
            let (succ_vector, succ_trigger) =
                successor_target(config, capture, successor, standard);
            let apply_program = build_apply(apply, succ_vector, succ_trigger);
            let cost = apply_program.total_cost();
            let end = budget::worst_case_entry_latency() + cost;
            let span = budget::lines_spanned(end, line_cycles);

            phases.push(PhaseDescriptor {
                id,
                trigger: apply.trigger,
                vector: vector_for(2 + k),
                successor,
                body_cost: cost,
                padding: 0,
                program: apply_program,
            });

            match successor {
                PhaseId::Apply(_) => earliest = apply.trigger.line() + span,
                _ => {
                    // Wrap distance back to capture must cover the tail of
                    // the last apply phase.
                    let gap = apply.trigger.lines_until(capture, standard);
                    if gap < span {
                        return Err(Error::TriggerTooClose {
                            phase: PhaseId::Capture,
                            trigger: capture.line(),
                            earliest: (apply.trigger.line() + span) % lines,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            standard = %standard,
            phases = phases.len(),
            capture = %capture,
            "compiled interrupt chain"
        );
        Ok(Self { phases })
    }

    /// Phase whose handler lives at `addr`, if any.
    pub(crate) fn phase_for_vector(&self, addr: u16) -> Option<PhaseId> {
        if addr < memory::cpu::HANDLER_BASE {
            return None;
        }
        let offset = addr - memory::cpu::HANDLER_BASE;
        if offset % memory::cpu::HANDLER_STRIDE != 0 {
            return None;
        }
        let index = (offset / memory::cpu::HANDLER_STRIDE) as usize;
        if index >= self.phases.len() {
            return None;
        }
        Some(id_for_index(index))
    }

    pub(crate) fn program(&self, id: PhaseId) -> &Program {
        &self.phases[index_for_id(id)].program
    }

    pub(crate) fn descriptor(&self, id: PhaseId) -> &PhaseDescriptor {
        &self.phases[index_for_id(id)]
    }

    pub(crate) fn phases(&self) -> &[PhaseDescriptor] {
        &self.phases
    }
}

fn vector_for(index: usize) -> u16 {
    memory::cpu::HANDLER_BASE + index as u16 * memory::cpu::HANDLER_STRIDE
}

fn index_for_id(id: PhaseId) -> usize {
    match id {
        PhaseId::Capture => 0,
        PhaseId::Stabilize => 1,
        PhaseId::Apply(k) => 2 + k,
    }
}

fn id_for_index(index: usize) -> PhaseId {
    match index {
        0 => PhaseId::Capture,
        1 => PhaseId::Stabilize,
        k => PhaseId::Apply(k - 2),
    }
}

/// Vector and trigger a phase installs to arm `successor`.
fn successor_target(
    config: &ChainConfig,
    capture: ScanPosition,
    successor: PhaseId,
    standard: VideoStandard,
) -> (u16, ScanPosition) {
    match successor {
        PhaseId::Capture => (vector_for(0), capture),
        PhaseId::Stabilize => (vector_for(1), capture.next(standard)),
        PhaseId::Apply(k) => (vector_for(2 + k), config.applies[k].trigger),
    }
}

struct CaptureProgram {
    program: Program,
    body_cost: u32,
    padding: u32,
}

/// Capture absorbs the unknown entry latency: a fixed 26-cycle body, then
/// enough no-effect units that control is still here when the next line
/// fires, then an open-ended idle spin (the program simply ends).
fn build_capture(
    stabilize_vector: u16,
    stabilize_trigger: ScanPosition,
    standard: VideoStandard,
) -> Result<CaptureProgram, Error> {
    let mut ops = vec![
        MicroOp::save_context(),
        MicroOp::store(memory::cpu::VECTOR_LO, stabilize_vector.to_le_bytes()[0]),
        MicroOp::store(memory::cpu::VECTOR_HI, stabilize_vector.to_le_bytes()[1]),
        // Advance the trigger exactly one line. The carry bit is untouched;
        // the compiler rejected positions where it would have to change.
        MicroOp::store(memory::vic::RASTER, stabilize_trigger.low()),
        MicroOp::acknowledge(),
        MicroOp::record_stack_mark(),
        MicroOp::enable_delivery(),
    ];
    let body_cost = ops.iter().map(|op| op.cost as u32).sum();

    let line_cycles = standard.cycles_per_line() as u32;
    let padding = budget::padding_ops(
        line_cycles,
        budget::worst_case_entry_latency(),
        body_cost,
        COST_NO_EFFECT as u32,
    )
    .ok_or(Error::BudgetUnderflow {
        phase: PhaseId::Capture,
        line_cycles,
        required: budget::worst_case_entry_latency() + body_cost,
    })?;
    ops.extend(std::iter::repeat_n(
        MicroOp::no_effect(COST_NO_EFFECT),
        padding as usize,
    ));

    Ok(CaptureProgram {
        program: Program::new(ops),
        body_cost,
        padding,
    })
}

/// Stabilize restores the stack mark first so its eventual return consumes
/// the frame pushed before capture ran, then delays off-screen, mutates,
/// arms its successor, acknowledges, and genuinely returns.
fn build_stabilize(config: &ChainConfig, succ_vector: u16, succ_trigger: ScanPosition) -> Program {
    let mut ops = vec![MicroOp::restore_stack_mark()];
    ops.extend(std::iter::repeat_n(
        MicroOp::no_effect(config.stabilize_spin.cycles_per_iteration),
        config.stabilize_spin.iterations as usize,
    ));
    for write in &config.stabilize_mutation {
        ops.push(MicroOp::store(write.addr, write.value));
    }
    push_arm(&mut ops, succ_vector, succ_trigger);
    ops.push(MicroOp::acknowledge());
    ops.push(MicroOp::restore_context());
    ops.push(MicroOp::return_from_interrupt());
    Program::new(ops)
}

/// Apply is its own episode: it saves and restores the context it clobbers,
/// wastes the guard iterations so the re-arm cannot land on its own line,
/// mutates, arms the successor, acknowledges, and returns.
fn build_apply(apply: &ApplyConfig, succ_vector: u16, succ_trigger: ScanPosition) -> Program {
    let mut ops = vec![MicroOp::save_context()];
    ops.extend(std::iter::repeat_n(
        MicroOp::no_effect(GUARD_ITERATION_CYCLES),
        apply.guard_iterations as usize,
    ));
    for write in &apply.mutation {
        ops.push(MicroOp::store(write.addr, write.value));
    }
    push_arm(&mut ops, succ_vector, succ_trigger);
    ops.push(MicroOp::acknowledge());
    ops.push(MicroOp::restore_context());
    ops.push(MicroOp::return_from_interrupt());
    Program::new(ops)
}

/// Install a successor's vector and trigger position. Handler addresses
/// share a high byte, so the vector flips atomically on the low-byte store.
fn push_arm(ops: &mut Vec<MicroOp>, vector: u16, trigger: ScanPosition) {
    let [lo, hi] = vector.to_le_bytes();
    ops.push(MicroOp::store(memory::cpu::VECTOR_LO, lo));
    ops.push(MicroOp::store(memory::cpu::VECTOR_HI, hi));
    ops.push(MicroOp::store(memory::vic::RASTER, trigger.low()));
    ops.push(MicroOp::store(
        memory::vic::CONTROL,
        Control::with_carry(trigger.carry()),
    ));
}
