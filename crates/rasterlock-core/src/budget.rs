//! Timing budget arithmetic.
//!
//! Everything here is configuration-time math, computed once when a chain is
//! compiled and never re-derived at run time. The running scheduler has no
//! cycle budget to spare for guards, so correctness comes from these numbers
//! being right up front.
//!
//! One constraint is deliberately left to the caller: trigger lines on which
//! the video generator steals extra bus cycles have a shorter effective
//! budget. The calculator takes the line duration as a parameter, so a
//! caller that knows a line's reduced budget can feed it in, but choosing
//! uncontended trigger lines is a configuration obligation, not something
//! this module detects.

use crate::timing::{INTERRUPT_ENTRY_CYCLES, MAX_WORK_OP_CYCLES};

/// Longest possible delay between an interrupt raise and the first handler
/// cycle: the longest indivisible operation the interrupted program may have
/// just committed to, plus the fixed entry sequence.
pub const fn worst_case_entry_latency() -> u32 {
    MAX_WORK_OP_CYCLES as u32 + INTERRUPT_ENTRY_CYCLES as u32
}

/// Shortest possible delay: the interrupt lands exactly on an instruction
/// boundary and only the fixed entry sequence remains.
pub const fn best_case_entry_latency() -> u32 {
    INTERRUPT_ENTRY_CYCLES as u32
}

/// Number of no-effect operations a phase must execute after its body so
/// that, even under worst-case entry latency, control is still inside the
/// phase when the next line's interrupt fires.
///
/// Returns `None` when the body cannot fit in the line at worst-case
/// latency — a configuration error, not a runtime condition.
pub const fn padding_ops(
    line_cycles: u32,
    worst_entry: u32,
    body_cost: u32,
    op_cost: u32,
) -> Option<u32> {
    if op_cost == 0 {
        return None;
    }
    let spent = worst_entry + body_cost;
    if spent > line_cycles {
        return None;
    }
    Some((line_cycles - spent) / op_cost)
}

/// Smallest calibrated-spin iteration count that pushes a mutation write
/// off the visible area.
///
/// The write's effect lands on its final cycle, so the landing column for
/// `n` iterations is `entry + prefix + n * iter_cycles + write_cost - 1`;
/// this returns the smallest `n` for which that column reaches
/// `first_offscreen_cycle`.
pub const fn spin_iterations(
    first_offscreen_cycle: u32,
    entry: u32,
    prefix_cost: u32,
    write_cost: u32,
    iter_cycles: u32,
) -> u32 {
    if iter_cycles == 0 {
        return 0;
    }
    let landing_without_spin = entry + prefix_cost + write_cost - 1;
    if landing_without_spin >= first_offscreen_cycle {
        return 0;
    }
    let deficit = first_offscreen_cycle - landing_without_spin;
    deficit.div_ceil(iter_cycles)
}

/// Column a mutation write lands on for a given spin configuration.
pub const fn mutation_landing_cycle(
    entry: u32,
    prefix_cost: u32,
    iterations: u32,
    iter_cycles: u32,
    write_cost: u32,
) -> u32 {
    entry + prefix_cost + iterations * iter_cycles + write_cost - 1
}

/// Smallest guard-spin iteration count that keeps a phase's re-arm write
/// from landing on the line the phase itself was triggered on.
///
/// `pre_guard_cost` covers the phase body before the guard, and
/// `post_guard_cost` covers everything from the end of the guard through
/// the completion of the first trigger write. The dangerous case is the
/// earliest possible entry, so the best-case latency is assumed.
pub const fn min_guard_iterations(
    line_cycles: u32,
    pre_guard_cost: u32,
    post_guard_cost: u32,
    iter_cycles: u32,
) -> u32 {
    if iter_cycles == 0 {
        return 0;
    }
    let without_guard = best_case_entry_latency() + pre_guard_cost + post_guard_cost;
    // The re-arm completes at offset `without_guard + n * iter_cycles - 1`
    // from the line start; it must reach at least `line_cycles`.
    if without_guard > line_cycles {
        return 0;
    }
    let deficit = line_cycles + 1 - without_guard;
    deficit.div_ceil(iter_cycles)
}

/// Number of whole lines a phase may still be executing after its trigger,
/// given its worst-case completion offset from the trigger line's start.
pub const fn lines_spanned(end_offset: u32, line_cycles: u32) -> u16 {
    if line_cycles == 0 {
        return 0;
    }
    end_offset.div_ceil(line_cycles) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::VideoStandard;

    #[test]
    fn worst_case_latency_is_op_plus_entry() {
        assert_eq!(worst_case_entry_latency(), 14);
        assert_eq!(best_case_entry_latency(), 7);
    }

    #[test]
    fn reference_padding_scenario() {
        // LineDuration=63, WorstCaseEntryLatency=14, Capture body=26.
        assert_eq!(padding_ops(63, 14, 26, 1), Some(23));
    }

    #[test]
    fn padding_underflow_is_a_configuration_error() {
        assert_eq!(padding_ops(63, 14, 50, 1), None);
        assert_eq!(padding_ops(40, 14, 26, 1), Some(0));
        assert_eq!(padding_ops(39, 14, 26, 1), None);
    }

    #[test]
    fn padding_never_negative_for_all_standards() {
        for standard in [VideoStandard::Pal, VideoStandard::Ntsc] {
            let line = standard.cycles_per_line() as u32;
            let padding = padding_ops(line, worst_case_entry_latency(), 26, 1);
            assert!(padding.is_some(), "{standard}: padding must be non-negative");
        }
    }

    #[test]
    fn reference_spin_scenario() {
        // 9 iterations of (2+3) cycles push the first effect write past the
        // visible width on the PAL grid.
        let standard = VideoStandard::Pal;
        let iters = spin_iterations(
            standard.first_offscreen_cycle() as u32,
            best_case_entry_latency(),
            2, // stack-mark restore before the spin
            4, // the store that performs the mutation
            5,
        );
        assert_eq!(iters, 9);

        let landing = mutation_landing_cycle(best_case_entry_latency(), 2, iters, 5, 4);
        assert!(landing > standard.last_visible_cycle() as u32);
        assert!(landing < standard.cycles_per_line() as u32);
    }

    #[test]
    fn one_fewer_iteration_would_land_on_screen() {
        let standard = VideoStandard::Pal;
        let landing = mutation_landing_cycle(best_case_entry_latency(), 2, 8, 5, 4);
        assert!(landing <= standard.last_visible_cycle() as u32);
    }

    #[test]
    fn guard_minimum_pushes_rearm_past_line_end() {
        let g = min_guard_iterations(63, 4, 20, 2);
        // Completion offset at the minimum must reach the next line even
        // for best-case entry latency.
        let completion = best_case_entry_latency() + 4 + g * 2 + 20 - 1;
        assert!(completion >= 63);
        let short = best_case_entry_latency() + 4 + (g - 1) * 2 + 20 - 1;
        assert!(short < 63);
    }

    #[test]
    fn span_rounds_up_to_whole_lines() {
        assert_eq!(lines_spanned(92, 63), 2);
        assert_eq!(lines_spanned(63, 63), 1);
        assert_eq!(lines_spanned(64, 63), 2);
    }
}
