//! Result objects and file output
//!
//! An [OptResult] bundles the winning run of the cycle-count search with the
//! settings that produced it, and knows how to write the trace table
//! (`simulation_results.csv`) and the run summary (`summary.json`) to the
//! configured output folder.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde_derive::Serialize;

use crate::optimizer::CycleOptimum;
use crate::routines::settings::Settings;
use crate::structs::trace::SimulationTrace;

/// The result of a cycle-count optimization run
#[derive(Debug, Clone)]
pub struct OptResult {
    pub cycles: usize,
    pub mean_utility: f64,
    pub trace: SimulationTrace,
    pub settings: Settings,
}

/// Summary statistics of the winning run, serialized to `summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub optimal_cycles: usize,
    pub cumulative_ox: f64,
    pub final_anc: f64,
    pub min_anc: f64,
    pub days_severe_neutropenia: usize,
    pub chronic_neuropathy_onset_day: Option<f64>,
    pub chronic_neuropathy_threshold_mg: f64,
    pub final_utility: f64,
    pub mean_utility: f64,
    pub final_tumor_size: f64,
    pub total_cost: f64,
    pub mean_daily_cost: f64,
}

impl OptResult {
    pub fn new(optimum: CycleOptimum, settings: Settings) -> Self {
        OptResult {
            cycles: optimum.cycles,
            mean_utility: optimum.mean_utility,
            trace: optimum.trace,
            settings,
        }
    }

    /// Summary statistics derived from the trace
    pub fn summary(&self) -> Summary {
        let trace = &self.trace;
        Summary {
            optimal_cycles: self.cycles,
            cumulative_ox: trace.cumulative_ox(),
            final_anc: trace.final_anc(),
            min_anc: trace.min_anc(),
            days_severe_neutropenia: trace
                .days_severe_neutropenia(self.settings.hematology.severe_neutropenia_threshold),
            chronic_neuropathy_onset_day: trace.chronic_onset_day(),
            chronic_neuropathy_threshold_mg: trace.chronic_threshold_mg,
            final_utility: trace.final_utility(),
            mean_utility: self.mean_utility,
            final_tumor_size: trace.final_tumor_size(),
            total_cost: trace.total_cost(),
            mean_daily_cost: trace.mean_daily_cost(),
        }
    }

    /// Write all output files to the configured output folder
    pub fn write_outputs(&self) -> Result<()> {
        let folder = PathBuf::from(&self.settings.paths.output_folder);
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create output folder {:?}", folder))?;
        self.write_trace(&folder)?;
        self.write_summary(&folder)?;
        Ok(())
    }

    /// Write the full trace as `simulation_results.csv`
    pub fn write_trace(&self, folder: &Path) -> Result<()> {
        let path = folder.join("simulation_results.csv");
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

        writer.write_record([
            "Day",
            "5FU_Dose_mg",
            "Oxaliplatin_Dose_mg",
            "5FU_Conc_mg_L",
            "Oxaliplatin_Conc_mg_L",
            "ANC_10^9_L",
            "Acute_Neuropathy(0/1)",
            "Chronic_Neuropathy(0/1)",
            "Cumulative_Oxaliplatin_mg",
            "Tumor_Size",
            "Daily_Cost",
            "Total_Cost",
            "Utility",
        ])?;

        let trace = &self.trace;
        for t in 0..trace.len() {
            writer.write_record([
                trace.time[t].to_string(),
                trace.dose_fu[t].to_string(),
                trace.dose_ox[t].to_string(),
                trace.conc_fu[t].to_string(),
                trace.conc_ox[t].to_string(),
                trace.anc[t].to_string(),
                trace.acute_neuropathy[t].to_string(),
                trace.chronic_neuropathy[t].to_string(),
                trace.cum_ox[t].to_string(),
                trace.tumor_size[t].to_string(),
                trace.daily_cost[t].to_string(),
                trace.total_cost[t].to_string(),
                trace.utility[t].to_string(),
            ])?;
        }
        writer.flush()?;
        tracing::info!("Trace written to {:?}", path);
        Ok(())
    }

    /// Write summary statistics as `summary.json`
    pub fn write_summary(&self, folder: &Path) -> Result<()> {
        let path = folder.join("summary.json");
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        serde_json::to_writer_pretty(file, &self.summary())?;
        tracing::info!("Summary written to {:?}", path);
        Ok(())
    }
}
