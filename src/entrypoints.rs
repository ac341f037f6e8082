//! Top-level drivers
//!
//! These are the library entrypoints a caller (CLI, script or service) uses:
//! [optimize] runs the full cycle-count search and writes output files,
//! [simulate] performs a single run with a fixed cycle count.

use std::time::Instant;

use anyhow::Result;

use crate::logger;
use crate::optimizer::optimize_cycles;
use crate::routines::output::OptResult;
use crate::routines::settings::Settings;
use crate::simulator::FolfoxModel;
use crate::structs::trace::SimulationTrace;

/// Run the cycle-count optimization end to end
///
/// Sets up logging, derives the patient model, searches the feasible cycle
/// counts and, when `config.output` is set, writes the trace CSV and summary
/// JSON to the configured output folder.
pub fn optimize(settings: Settings) -> Result<OptResult> {
    let now = Instant::now();
    logger::setup_log(&settings)?;
    tracing::info!("Starting FOLFOX cycle-count optimization");

    let model = FolfoxModel::new(&settings)?;
    tracing::info!(
        "Patient: {} kg, {} cm, BSA {:.2} m²",
        settings.dosing.patient_weight_kg,
        settings.dosing.patient_height_cm,
        model.bsa()
    );
    tracing::info!(
        "Horizon: {} days, step size: {} days",
        settings.optimization.horizon_days,
        settings.optimization.step_size_days
    );

    let optimum = optimize_cycles(&model)?;
    tracing::info!(
        "Optimal number of cycles: {} (mean utility {:.4})",
        optimum.cycles,
        optimum.mean_utility
    );

    let result = OptResult::new(optimum, settings);
    if result.settings.config.output {
        result.write_outputs()?;
    }

    tracing::info!("Program complete after {:.2?}", now.elapsed());
    Ok(result)
}

/// Run a single simulation with a fixed number of cycles
pub fn simulate(settings: Settings, cycles: usize) -> Result<SimulationTrace> {
    logger::setup_log(&settings)?;
    let model = FolfoxModel::new(&settings)?;
    tracing::info!(
        "Simulating {} cycles over {} days (BSA {:.2} m²)",
        cycles,
        settings.optimization.horizon_days,
        model.bsa()
    );
    let trace = model.simulate(cycles)?;
    Ok(trace)
}
