mod args;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rasterlock_core::{
    Machine,
    chain::{ChainConfig, PhaseId},
    event::EventKind,
    memory,
    scan::ScanPosition,
    timing::VideoStandard,
    workload::{WorkOp, Workload},
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::args::Args;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rasterlock_core=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// A background instruction stream with mixed durations, so the capture
/// phase is entered with a different latency on different frames.
fn jittery_workload() -> Result<Workload> {
    let ops = vec![
        WorkOp::load_a(2, 0x40),
        WorkOp::nop(3),
        WorkOp::load_x(4, 0x07),
        WorkOp::nop(5),
        WorkOp::load_y(6, 0x19),
        WorkOp::nop(7),
        WorkOp::load_a(3, 0x12),
        WorkOp::nop(2),
        WorkOp::load_x(5, 0xFE),
        WorkOp::nop(4),
        WorkOp::load_y(7, 0x21),
        WorkOp::nop(6),
        WorkOp::load_a(4, 0x80),
    ];
    Ok(Workload::new(ops)?)
}

fn trigger_line(machine: &Machine, id: PhaseId) -> Result<u16> {
    machine
        .phases()
        .iter()
        .find(|phase| phase.id == id)
        .map(|phase| phase.trigger.line())
        .with_context(|| format!("compiled chain has no {id} phase"))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let standard = VideoStandard::from(args.standard);

    let config = ChainConfig::color_split(
        standard,
        ScanPosition::new(args.capture_line),
        ScanPosition::new(args.apply_line),
        args.border,
        args.background,
    );
    let mut machine = Machine::new(standard, &config, jittery_workload()?)?;

    println!(
        "standard {standard}, capture line {}, apply line {}, {} frames",
        args.capture_line, args.apply_line, args.frames
    );
    for phase in machine.phases() {
        println!(
            "  {:<9} trigger line {:>3}  handler {:#06x}  body {:>2} cycles (+{} padding)",
            phase.id.to_string(),
            phase.trigger.line(),
            phase.vector,
            phase.body_cost,
            phase.padding,
        );
    }

    // Line indices mask to the 9 bits the hardware fields hold, so report
    // the lines the compiled chain actually fires on, not the raw flags.
    let capture_line = trigger_line(&machine, PhaseId::Capture)?;
    let mutation_line = trigger_line(&machine, PhaseId::Stabilize)?;

    machine.run_frames(args.frames);
    let mut entry_cycles = Vec::new();
    let mut landing_cycles = Vec::new();
    for event in machine.take_events() {
        match event.kind {
            EventKind::PhaseEntered(PhaseId::Capture) => entry_cycles.push(event.at.cycle),
            EventKind::RegisterWrite { addr, .. } => {
                if addr == memory::vic::EFFECT_A && event.at.line == mutation_line {
                    landing_cycles.push(event.at.cycle);
                }
            }
            _ => {}
        }
    }

    println!();
    for (frame, (entry, landing)) in entry_cycles.iter().zip(&landing_cycles).enumerate() {
        println!("frame {frame:>3}: capture entry cycle {entry:>2}, mutation landing cycle {landing}");
    }
    println!(
        "capture entry cycle on line {}: min {} max {} over {} frames",
        capture_line,
        entry_cycles.iter().min().copied().unwrap_or(0),
        entry_cycles.iter().max().copied().unwrap_or(0),
        entry_cycles.len(),
    );

    match (landing_cycles.first(), landing_cycles.last()) {
        (Some(first), _) if landing_cycles.iter().all(|cycle| cycle == first) => {
            println!(
                "mutation landing cycle on line {mutation_line}: {first} on every frame -- stable"
            );
        }
        (Some(first), Some(last)) => {
            bail!(
                "mutation landing jittered between cycles {first} and {last} on line {mutation_line}"
            );
        }
        _ => bail!("no mutation was observed; the chain never ran"),
    }

    Ok(())
}
