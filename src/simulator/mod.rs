//! Fixed-step FOLFOX state simulator
//!
//! [FolfoxModel] couples one-compartment plasma kinetics for both agents with
//! neutrophil turnover, oxaliplatin neuropathy, Emax/Hill tumor response and a
//! daily cost/utility model, integrated with explicit (forward Euler) steps of
//! size `dt` over a fixed horizon. A run is a pure function of the parameter
//! bundle and the requested cycle count: no state survives between runs, and
//! repeated runs are bit-for-bit identical.

use ndarray::Array1;
use thiserror::Error;

use crate::routines::settings::{Settings, SettingsError};
use crate::structs::schedule::DoseSchedule;
use crate::structs::trace::SimulationTrace;

/// Length of one FOLFOX cycle: oxaliplatin bolus plus two consecutive 5-FU
/// infusion days, repeated every two weeks
pub const CYCLE_LENGTH_DAYS: f64 = 14.0;

/// Failure of a single simulation run
///
/// The guards in the update equations make the arithmetic total for any bundle
/// that passed validation, so this only fires on genuinely degenerate
/// parameter combinations (e.g. Euler blow-up into overflow).
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("state became non-finite at step {step} ({quantity})")]
    NonFinite { step: usize, quantity: &'static str },
}

/// Simulation model with parameters derived for one patient
///
/// Construction performs the parameter derivation: BSA from anthropometrics,
/// and all per-m² dose limits and thresholds converted to absolute mg.
#[derive(Debug, Clone)]
pub struct FolfoxModel {
    settings: Settings,
    dt: f64,
    n_steps: usize,
    bsa_m2: f64,
    max_daily_fu_mg: f64,
    max_single_ox_mg: f64,
    chronic_threshold_mg: f64,
}

impl FolfoxModel {
    /// Derive patient-specific quantities from a parameter bundle
    ///
    /// Fails with [SettingsError::InvalidPatient] when weight or height is
    /// non-positive, and with the sibling errors for a malformed grid or
    /// parameter. Deterministic and side-effect free.
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let weight_kg = settings.dosing.patient_weight_kg;
        let height_cm = settings.dosing.patient_height_cm;
        // Mosteller formula
        let bsa_m2 = (height_cm * weight_kg / 3600.0).sqrt();

        let dt = settings.optimization.step_size_days;
        let n_steps = settings.optimization.n_steps();

        Ok(FolfoxModel {
            dt,
            n_steps,
            bsa_m2,
            max_daily_fu_mg: settings.dosing.max_daily_fu_mg_m2 * bsa_m2,
            max_single_ox_mg: settings.dosing.max_single_ox_mg_m2 * bsa_m2,
            chronic_threshold_mg: settings.neuropathy.chronic_threshold_mg_m2 * bsa_m2,
            settings: settings.clone(),
        })
    }

    /// The parameter bundle this model was derived from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Body-surface area (m²)
    pub fn bsa(&self) -> f64 {
        self.bsa_m2
    }

    /// Number of integration steps T
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Maximum absolute daily 5-FU dose (mg)
    pub fn max_daily_fu_mg(&self) -> f64 {
        self.max_daily_fu_mg
    }

    /// Maximum absolute single oxaliplatin dose (mg)
    pub fn max_single_ox_mg(&self) -> f64 {
        self.max_single_ox_mg
    }

    /// Absolute chronic-neuropathy threshold (mg)
    pub fn chronic_threshold_mg(&self) -> f64 {
        self.chronic_threshold_mg
    }

    /// Build the dose sequences for `cycles` 14-day cycles
    ///
    /// Each cycle schedules the maximum 5-FU dose on its first two days and an
    /// oxaliplatin bolus on day one, the latter only when the minimum spacing
    /// since the last administered bolus is respected. Cycles whose start
    /// falls at or beyond the horizon are silently dropped: fewer effective
    /// cycles are administered than requested, which is not an error.
    pub fn schedule(&self, cycles: usize) -> DoseSchedule {
        let mut schedule = DoseSchedule::empty(self.n_steps);

        let min_ox_gap = (self.settings.dosing.min_days_between_ox as f64 / self.dt).ceil() as usize;
        let mut last_ox_index: Option<usize> = None;

        for cycle in 0..cycles {
            let day1 = (cycle as f64 * CYCLE_LENGTH_DAYS / self.dt).floor() as usize;
            if day1 >= self.n_steps {
                break;
            }

            schedule.fu[day1] = self.max_daily_fu_mg;
            if day1 + 1 < self.n_steps {
                schedule.fu[day1 + 1] = self.max_daily_fu_mg;
            }

            let spacing_ok = match last_ox_index {
                Some(last) => day1 - last >= min_ox_gap,
                None => true,
            };
            if spacing_ok {
                schedule.ox[day1] = self.max_single_ox_mg;
                last_ox_index = Some(day1);
            }
        }

        schedule
    }

    /// Integrate the coupled dynamics over the horizon for `cycles` cycles
    ///
    /// State at step t+1 is computed strictly from state at t and the doses at
    /// t; within a step each quantity is available to the ones after it. The
    /// per-step order is: plasma kinetics, neutrophils, cumulative exposure and
    /// neuropathy flags, tumor response, cost, utility.
    pub fn simulate(&self, cycles: usize) -> Result<SimulationTrace, SimulationError> {
        let schedule = self.schedule(cycles);
        self.simulate_schedule(&schedule)
    }

    /// Integrate the coupled dynamics for an explicit dose schedule
    ///
    /// The schedule must cover exactly [FolfoxModel::n_steps] steps.
    pub fn simulate_schedule(
        &self,
        schedule: &DoseSchedule,
    ) -> Result<SimulationTrace, SimulationError> {
        assert_eq!(schedule.n_steps(), self.n_steps, "schedule length mismatch");
        let t_steps = self.n_steps;
        let dt = self.dt;
        let s = &self.settings;

        let mut time = Array1::<f64>::zeros(t_steps + 1);
        let mut conc_fu = Array1::<f64>::zeros(t_steps + 1);
        let mut conc_ox = Array1::<f64>::zeros(t_steps + 1);
        let mut anc = Array1::<f64>::zeros(t_steps + 1);
        let mut cum_ox = Array1::<f64>::zeros(t_steps + 1);
        let mut acute = Array1::<u8>::zeros(t_steps + 1);
        let mut chronic = Array1::<u8>::zeros(t_steps + 1);
        let mut tumor_size = Array1::<f64>::zeros(t_steps + 1);
        let mut daily_cost = Array1::<f64>::zeros(t_steps + 1);
        let mut total_cost = Array1::<f64>::zeros(t_steps + 1);
        let mut utility = Array1::<f64>::zeros(t_steps + 1);

        anc[0] = s.hematology.anc_baseline;
        tumor_size[0] = s.tumor.initial_size;
        utility[0] = s.utility.baseline;

        let ke_fu = s.kinetics.clearance_fu / s.kinetics.volume_fu;
        let ke_ox = s.kinetics.clearance_ox / s.kinetics.volume_ox;

        for t in 0..t_steps {
            time[t + 1] = (t + 1) as f64 * dt;
            let dose_fu = schedule.fu[t];
            let dose_ox = schedule.ox[t];

            // 1. Plasma kinetics, one compartment per agent
            conc_fu[t + 1] =
                conc_fu[t] + dt * (dose_fu / s.kinetics.volume_fu - ke_fu * conc_fu[t]);
            conc_ox[t + 1] =
                conc_ox[t] + dt * (dose_ox / s.kinetics.volume_ox - ke_ox * conc_ox[t]);

            // 2. Neutrophil dynamics, floored at zero
            let production = s.hematology.k_out * s.hematology.anc_baseline;
            let loss = s.hematology.k_out * anc[t];
            let toxicity = (s.hematology.k_tox_fu * conc_fu[t]
                + s.hematology.k_tox_ox * conc_ox[t])
                * anc[t];
            anc[t + 1] = f64::max(0.0, anc[t] + dt * (production - loss - toxicity));

            // 3. Cumulative oxaliplatin and neuropathy flags
            cum_ox[t + 1] = cum_ox[t] + dose_ox;
            acute[t + 1] = u8::from(dose_ox > 0.0);
            // Chronic flag is sticky: once set it never resets within a run
            chronic[t + 1] = if cum_ox[t + 1] >= self.chronic_threshold_mg {
                1
            } else {
                chronic[t]
            };

            // 4. Tumor response: Emax/Hill kill on the combined exposure signal
            let exposure = s.tumor.alpha_fu * conc_fu[t + 1] + s.tumor.alpha_ox * conc_ox[t + 1];
            let kill_rate = if exposure > 0.0 {
                let e_h = exposure.powf(s.tumor.hill);
                s.tumor.emax * e_h / (e_h + s.tumor.ec50.powf(s.tumor.hill))
            } else {
                // Guard against 0^h with non-integral hill coefficients
                0.0
            };
            let growth = s.tumor.growth_rate * tumor_size[t];
            let kill = kill_rate * tumor_size[t];
            tumor_size[t + 1] = f64::max(0.0, tumor_size[t] + dt * (growth - kill));

            // 5. Daily and cumulative cost
            let mut cost_today = dose_fu * s.economics.cost_fu_mg + dose_ox * s.economics.cost_ox_mg;
            if dose_fu > 0.0 || dose_ox > 0.0 {
                cost_today += s.economics.cost_infusion_day;
            }
            if dose_fu > 0.0 {
                cost_today += s.economics.cost_pump_day;
            }
            daily_cost[t] = cost_today;
            total_cost[t + 1] = total_cost[t] + cost_today;

            // 6. Utility: instantaneous snapshot, not a running sum
            let mut u = s.utility.baseline;
            if anc[t + 1] < s.hematology.severe_neutropenia_threshold {
                u -= s.utility.neutropenia_penalty;
            }
            if acute[t + 1] == 1 || chronic[t + 1] == 1 {
                u -= s.utility.neuropathy_penalty;
            }
            u -= cost_today * s.economics.cost_utility_factor;
            u -= s.tumor.weight_in_utility * (tumor_size[t + 1] / s.tumor.initial_size);
            utility[t + 1] = u;

            for (quantity, value) in [
                ("conc_fu", conc_fu[t + 1]),
                ("conc_ox", conc_ox[t + 1]),
                ("anc", anc[t + 1]),
                ("tumor_size", tumor_size[t + 1]),
                ("utility", utility[t + 1]),
            ] {
                if !value.is_finite() {
                    return Err(SimulationError::NonFinite {
                        step: t + 1,
                        quantity,
                    });
                }
            }
        }

        // Pad the length-T inputs with a trailing zero for alignment
        let mut dose_fu = Array1::<f64>::zeros(t_steps + 1);
        let mut dose_ox = Array1::<f64>::zeros(t_steps + 1);
        dose_fu.slice_mut(ndarray::s![..t_steps]).assign(&schedule.fu);
        dose_ox.slice_mut(ndarray::s![..t_steps]).assign(&schedule.ox);

        Ok(SimulationTrace {
            time,
            dose_fu,
            dose_ox,
            conc_fu,
            conc_ox,
            anc,
            cum_ox,
            acute_neuropathy: acute,
            chronic_neuropathy: chronic,
            tumor_size,
            daily_cost,
            total_cost,
            utility,
            chronic_threshold_mg: self.chronic_threshold_mg,
        })
    }
}
