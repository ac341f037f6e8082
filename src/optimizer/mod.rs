//! Exhaustive cycle-count search
//!
//! Drives the simulator once per candidate cycle count over the feasible
//! range 0..=floor(horizon / 14) and keeps the run with the greatest mean
//! utility. Candidates are independent and read only the shared immutable
//! model, so they are evaluated in parallel with rayon; the winner is then
//! selected by a single sequential scan, which keeps the result deterministic
//! and preserves the first-seen-wins tie rule.

use rayon::prelude::*;
use thiserror::Error;

use crate::simulator::{FolfoxModel, SimulationError, CYCLE_LENGTH_DAYS};
use crate::structs::trace::SimulationTrace;

/// Errors raised by the cycle-count search
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Every candidate simulation failed
    #[error("no candidate cycle count produced a feasible schedule")]
    NoFeasibleSchedule,
}

/// The best-scoring run found by [optimize_cycles]
#[derive(Debug, Clone)]
pub struct CycleOptimum {
    /// Winning number of 14-day cycles
    pub cycles: usize,
    /// Mean utility of the winning run over steps 1..=T
    pub mean_utility: f64,
    /// Full trace of the winning run
    pub trace: SimulationTrace,
}

/// Find the cycle count maximizing mean utility
///
/// Brute-force linear search: O(max_cycles) simulator invocations, each O(T).
/// max_cycles is small and later cycles shift the day indices of all
/// subsequent doses, so there is nothing to reuse between candidates.
///
/// A failing candidate is logged and skipped; the search fails only when no
/// candidate produces a valid trace.
pub fn optimize_cycles(model: &FolfoxModel) -> Result<CycleOptimum, OptimizeError> {
    let horizon_days = model.settings().optimization.horizon_days;
    let max_cycles = (horizon_days / CYCLE_LENGTH_DAYS).floor() as usize;
    tracing::info!(
        "Evaluating candidate cycle counts 0..={} over a {} day horizon",
        max_cycles,
        horizon_days
    );

    let candidates: Vec<(usize, Result<SimulationTrace, SimulationError>)> = (0..=max_cycles)
        .into_par_iter()
        .map(|cycles| (cycles, model.simulate(cycles)))
        .collect();

    let mut best: Option<CycleOptimum> = None;
    for (cycles, outcome) in candidates {
        match outcome {
            Ok(trace) => {
                let mean_utility = trace.mean_utility();
                tracing::debug!("{} cycles: mean utility {:.4}", cycles, mean_utility);
                // Strict comparison: the first-seen candidate wins ties
                let improved = match &best {
                    Some(incumbent) => mean_utility > incumbent.mean_utility,
                    None => true,
                };
                if improved {
                    best = Some(CycleOptimum {
                        cycles,
                        mean_utility,
                        trace,
                    });
                }
            }
            Err(err) => {
                tracing::warn!("Simulation with {} cycles failed: {}", cycles, err);
            }
        }
    }

    best.ok_or(OptimizeError::NoFeasibleSchedule)
}
