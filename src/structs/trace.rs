//! [SimulationTrace] - the complete time-indexed output of one simulation run

use ndarray::Array1;

/// Time series produced by one simulator invocation
///
/// All series have length T+1 and are indexed by integration step 0..=T. The
/// dose and daily-cost series are padded with a trailing zero so every field
/// aligns with the state arrays. A trace is created once by
/// [crate::simulator::FolfoxModel::simulate] and never mutated afterwards; the
/// field set is the export contract consumed by
/// [crate::routines::output::OptResult].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationTrace {
    /// Time at each step (days)
    pub time: Array1<f64>,
    /// 5-FU dose administered at each step (mg)
    pub dose_fu: Array1<f64>,
    /// Oxaliplatin dose administered at each step (mg)
    pub dose_ox: Array1<f64>,
    /// 5-FU plasma concentration (mg/L)
    pub conc_fu: Array1<f64>,
    /// Oxaliplatin plasma concentration (mg/L)
    pub conc_ox: Array1<f64>,
    /// Absolute neutrophil count (10⁹/L)
    pub anc: Array1<f64>,
    /// Cumulative oxaliplatin exposure (mg)
    pub cum_ox: Array1<f64>,
    /// Acute neuropathy flag, 1 on steps following an oxaliplatin dose
    pub acute_neuropathy: Array1<u8>,
    /// Chronic neuropathy flag, sticky once the cumulative threshold is crossed
    pub chronic_neuropathy: Array1<u8>,
    /// Disease-burden size
    pub tumor_size: Array1<f64>,
    /// Cost incurred at each step
    pub daily_cost: Array1<f64>,
    /// Cumulative cost
    pub total_cost: Array1<f64>,
    /// Instantaneous utility snapshot
    pub utility: Array1<f64>,
    /// Absolute chronic-neuropathy threshold used for this run (mg)
    pub chronic_threshold_mg: f64,
}

impl SimulationTrace {
    /// Number of entries per series (T+1)
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Mean utility over steps 1..=T
    ///
    /// The t=0 baseline snapshot is excluded: it is identical across all
    /// candidate cycle counts and would dilute the comparison.
    pub fn mean_utility(&self) -> f64 {
        if self.utility.len() < 2 {
            return self.utility.first().copied().unwrap_or(0.0);
        }
        let tail = self.utility.slice(ndarray::s![1..]);
        tail.sum() / tail.len() as f64
    }

    pub fn min_anc(&self) -> f64 {
        self.anc.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Number of steps with ANC below the severe-neutropenia threshold
    pub fn days_severe_neutropenia(&self, threshold: f64) -> usize {
        self.anc.iter().filter(|&&anc| anc < threshold).count()
    }

    /// First day the chronic neuropathy flag is set, if it ever is
    pub fn chronic_onset_day(&self) -> Option<f64> {
        self.chronic_neuropathy
            .iter()
            .position(|&flag| flag == 1)
            .map(|idx| self.time[idx])
    }

    pub fn final_anc(&self) -> f64 {
        self.anc[self.anc.len() - 1]
    }

    pub fn final_utility(&self) -> f64 {
        self.utility[self.utility.len() - 1]
    }

    pub fn final_tumor_size(&self) -> f64 {
        self.tumor_size[self.tumor_size.len() - 1]
    }

    pub fn cumulative_ox(&self) -> f64 {
        self.cum_ox[self.cum_ox.len() - 1]
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost[self.total_cost.len() - 1]
    }

    /// Mean of the daily cost over steps 0..T (the padded tail is excluded)
    pub fn mean_daily_cost(&self) -> f64 {
        if self.daily_cost.len() < 2 {
            return 0.0;
        }
        let head = self.daily_cost.slice(ndarray::s![..self.daily_cost.len() - 1]);
        head.sum() / head.len() as f64
    }
}
