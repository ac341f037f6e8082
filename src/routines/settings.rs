//! Settings for simulation and cycle-count optimization
//!
//! The user can specify the desired settings in a TOML configuration file,
//! optionally overridden by `FOLFOX_`-prefixed environment variables. All
//! fields carry defaults, so an empty file (or [Settings::default]) is a
//! complete, runnable parameter bundle.
//!
//! A [Settings] is immutable for the duration of a run. Programmatic
//! overrides go through [SettingsPatch] and [Settings::with_overrides], which
//! produce a new, re-validated bundle.

use config::Config as eConfig;
use serde::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

/// Errors raised while loading or validating a parameter bundle
///
/// All of these are surfaced before any simulation runs; they are never
/// retried automatically.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Non-physical patient anthropometrics (weight or height ≤ 0)
    #[error("invalid patient: {0}")]
    InvalidPatient(String),
    /// Unusable time discretization (non-positive or non-integral grid)
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),
    /// Any other malformed numeric parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub dosing: Dosing,
    #[serde(default)]
    pub hematology: Hematology,
    #[serde(default)]
    pub neuropathy: Neuropathy,
    #[serde(default)]
    pub kinetics: Kinetics,
    #[serde(default)]
    pub tumor: Tumor,
    #[serde(default)]
    pub economics: Economics,
    #[serde(default)]
    pub utility: Utility,
    #[serde(default)]
    pub optimization: Optimization,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Paths {
    /// Folder where the trace CSV and summary JSON are written
    #[serde(default = "default_output_folder")]
    pub output_folder: String,
    /// Log file path. If absent, logs go to stdout only
    #[serde(default)]
    pub log: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether [crate::entrypoints::optimize] writes output files
    #[serde(default = "default_true")]
    pub output: bool,
}

/// Dosing template limits and patient anthropometrics
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Dosing {
    /// Maximum daily 5-FU infusion dose (mg/m²/day)
    #[serde(default = "default_max_daily_fu")]
    pub max_daily_fu_mg_m2: f64,
    /// Maximum single oxaliplatin bolus (mg/m²)
    #[serde(default = "default_max_single_ox")]
    pub max_single_ox_mg_m2: f64,
    /// Minimum days between two oxaliplatin doses
    #[serde(default = "default_min_days_between_ox")]
    pub min_days_between_ox: usize,
    #[serde(default = "default_weight")]
    pub patient_weight_kg: f64,
    #[serde(default = "default_height")]
    pub patient_height_cm: f64,
}

/// Neutrophil turnover and per-agent myelotoxicity
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Hematology {
    /// Baseline absolute neutrophil count (10⁹/L)
    #[serde(default = "default_anc_baseline")]
    pub anc_baseline: f64,
    /// Neutrophil turnover rate constant (1/day)
    #[serde(default = "default_k_out")]
    pub k_out: f64,
    /// Toxicity coefficient per unit 5-FU plasma concentration
    #[serde(default = "default_k_tox_fu")]
    pub k_tox_fu: f64,
    /// Toxicity coefficient per unit oxaliplatin plasma concentration
    #[serde(default = "default_k_tox_ox")]
    pub k_tox_ox: f64,
    /// ANC below this counts as severe neutropenia (10⁹/L)
    #[serde(default = "default_severe_neutropenia")]
    pub severe_neutropenia_threshold: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Neuropathy {
    /// Cumulative oxaliplatin exposure (mg/m²) that triggers chronic neuropathy
    #[serde(default = "default_chronic_threshold")]
    pub chronic_threshold_mg_m2: f64,
}

/// One-compartment kinetics per agent, time unit = days
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Kinetics {
    #[serde(default = "default_clearance_fu")]
    pub clearance_fu: f64,
    #[serde(default = "default_volume_fu")]
    pub volume_fu: f64,
    #[serde(default = "default_clearance_ox")]
    pub clearance_ox: f64,
    #[serde(default = "default_volume_ox")]
    pub volume_ox: f64,
}

/// Disease-burden response (Emax/Hill) and natural growth
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Tumor {
    /// Maximum kill fraction per day
    #[serde(default = "default_emax")]
    pub emax: f64,
    /// Effective exposure at half-maximal kill
    #[serde(default = "default_ec50")]
    pub ec50: f64,
    #[serde(default = "default_hill")]
    pub hill: f64,
    /// Potency weight of 5-FU concentration in the exposure signal
    #[serde(default = "default_alpha_fu")]
    pub alpha_fu: f64,
    /// Potency weight of oxaliplatin concentration in the exposure signal
    #[serde(default = "default_alpha_ox")]
    pub alpha_ox: f64,
    /// Natural exponential growth rate (1/day)
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,
    #[serde(default = "default_initial_size")]
    pub initial_size: f64,
    /// Weight of normalized tumor size in the utility
    #[serde(default = "default_tumor_weight")]
    pub weight_in_utility: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Economics {
    #[serde(default = "default_cost_fu_mg")]
    pub cost_fu_mg: f64,
    #[serde(default = "default_cost_ox_mg")]
    pub cost_ox_mg: f64,
    /// Flat fee for any infusion day
    #[serde(default = "default_cost_infusion_day")]
    pub cost_infusion_day: f64,
    /// Flat fee for each day a 5-FU pump is connected
    #[serde(default = "default_cost_pump_day")]
    pub cost_pump_day: f64,
    /// Converts a daily cost into a utility decrement
    #[serde(default = "default_cost_utility_factor")]
    pub cost_utility_factor: f64,
}

/// Additive utility model
///
/// Penalties are stored as non-negative magnitudes and subtracted at point of
/// use. Validation rejects negative values.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Utility {
    #[serde(default = "default_baseline_utility")]
    pub baseline: f64,
    #[serde(default = "default_neutropenia_penalty")]
    pub neutropenia_penalty: f64,
    #[serde(default = "default_neuropathy_penalty")]
    pub neuropathy_penalty: f64,
}

#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Optimization {
    #[serde(default = "default_horizon")]
    pub horizon_days: f64,
    #[serde(default = "default_step_size")]
    pub step_size_days: f64,
}

impl Optimization {
    /// Number of integration steps T over the horizon
    pub fn n_steps(&self) -> usize {
        (self.horizon_days / self.step_size_days).round() as usize
    }
}

impl Settings {
    /// Check the bundle for non-physical or malformed values
    ///
    /// Called by the loader and by [Settings::with_overrides]; also re-run by
    /// [crate::simulator::FolfoxModel::new] so a hand-built bundle cannot
    /// bypass it.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.dosing.patient_weight_kg <= 0.0 {
            return Err(SettingsError::InvalidPatient(format!(
                "weight must be positive, got {} kg",
                self.dosing.patient_weight_kg
            )));
        }
        if self.dosing.patient_height_cm <= 0.0 {
            return Err(SettingsError::InvalidPatient(format!(
                "height must be positive, got {} cm",
                self.dosing.patient_height_cm
            )));
        }

        let opt = &self.optimization;
        if !(opt.horizon_days > 0.0) {
            return Err(SettingsError::InvalidTimeGrid(format!(
                "horizon must be positive, got {} days",
                opt.horizon_days
            )));
        }
        if !(opt.step_size_days > 0.0) {
            return Err(SettingsError::InvalidTimeGrid(format!(
                "step size must be positive, got {} days",
                opt.step_size_days
            )));
        }
        let steps = opt.horizon_days / opt.step_size_days;
        if (steps - steps.round()).abs() > 1e-9 || steps.round() < 1.0 {
            return Err(SettingsError::InvalidTimeGrid(format!(
                "horizon ({} days) must be a positive integer multiple of the step size ({} days)",
                opt.horizon_days, opt.step_size_days
            )));
        }

        let positive = [
            ("kinetics.clearance_fu", self.kinetics.clearance_fu),
            ("kinetics.volume_fu", self.kinetics.volume_fu),
            ("kinetics.clearance_ox", self.kinetics.clearance_ox),
            ("kinetics.volume_ox", self.kinetics.volume_ox),
            ("tumor.initial_size", self.tumor.initial_size),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(SettingsError::InvalidParameter(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("dosing.max_daily_fu_mg_m2", self.dosing.max_daily_fu_mg_m2),
            ("dosing.max_single_ox_mg_m2", self.dosing.max_single_ox_mg_m2),
            ("hematology.anc_baseline", self.hematology.anc_baseline),
            ("hematology.k_out", self.hematology.k_out),
            ("hematology.k_tox_fu", self.hematology.k_tox_fu),
            ("hematology.k_tox_ox", self.hematology.k_tox_ox),
            (
                "hematology.severe_neutropenia_threshold",
                self.hematology.severe_neutropenia_threshold,
            ),
            (
                "neuropathy.chronic_threshold_mg_m2",
                self.neuropathy.chronic_threshold_mg_m2,
            ),
            ("tumor.emax", self.tumor.emax),
            ("tumor.ec50", self.tumor.ec50),
            ("tumor.hill", self.tumor.hill),
            ("tumor.alpha_fu", self.tumor.alpha_fu),
            ("tumor.alpha_ox", self.tumor.alpha_ox),
            ("tumor.growth_rate", self.tumor.growth_rate),
            ("tumor.weight_in_utility", self.tumor.weight_in_utility),
            ("economics.cost_fu_mg", self.economics.cost_fu_mg),
            ("economics.cost_ox_mg", self.economics.cost_ox_mg),
            ("economics.cost_infusion_day", self.economics.cost_infusion_day),
            ("economics.cost_pump_day", self.economics.cost_pump_day),
            (
                "economics.cost_utility_factor",
                self.economics.cost_utility_factor,
            ),
            ("utility.neutropenia_penalty", self.utility.neutropenia_penalty),
            ("utility.neuropathy_penalty", self.utility.neuropathy_penalty),
        ];
        for (name, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(SettingsError::InvalidParameter(format!(
                    "{} must be non-negative and finite, got {}",
                    name, value
                )));
            }
        }

        if !self.utility.baseline.is_finite() {
            return Err(SettingsError::InvalidParameter(
                "utility.baseline must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Produce a new validated bundle with the patch applied
    ///
    /// The patch mirrors the bundle's shape with `Option` fields; `None`
    /// leaves the current value untouched.
    pub fn with_overrides(&self, patch: &SettingsPatch) -> Result<Settings, SettingsError> {
        let mut settings = self.clone();

        if let Some(patient) = &patch.patient {
            if let Some(weight) = patient.weight_kg {
                settings.dosing.patient_weight_kg = weight;
            }
            if let Some(height) = patient.height_cm {
                settings.dosing.patient_height_cm = height;
            }
        }
        if let Some(optimization) = &patch.optimization {
            if let Some(horizon) = optimization.horizon_days {
                settings.optimization.horizon_days = horizon;
            }
            if let Some(step) = optimization.step_size_days {
                settings.optimization.step_size_days = step;
            }
        }
        if let Some(paths) = &patch.paths {
            if let Some(folder) = &paths.output_folder {
                settings.paths.output_folder = folder.clone();
            }
            if let Some(log) = &paths.log {
                settings.paths.log = Some(log.clone());
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            paths: Paths::default(),
            config: Config::default(),
            dosing: Dosing::default(),
            hematology: Hematology::default(),
            neuropathy: Neuropathy::default(),
            kinetics: Kinetics::default(),
            tumor: Tumor::default(),
            economics: Economics::default(),
            utility: Utility::default(),
            optimization: Optimization::default(),
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            output_folder: default_output_folder(),
            log: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            output: default_true(),
        }
    }
}

impl Default for Dosing {
    fn default() -> Self {
        Dosing {
            max_daily_fu_mg_m2: default_max_daily_fu(),
            max_single_ox_mg_m2: default_max_single_ox(),
            min_days_between_ox: default_min_days_between_ox(),
            patient_weight_kg: default_weight(),
            patient_height_cm: default_height(),
        }
    }
}

impl Default for Hematology {
    fn default() -> Self {
        Hematology {
            anc_baseline: default_anc_baseline(),
            k_out: default_k_out(),
            k_tox_fu: default_k_tox_fu(),
            k_tox_ox: default_k_tox_ox(),
            severe_neutropenia_threshold: default_severe_neutropenia(),
        }
    }
}

impl Default for Neuropathy {
    fn default() -> Self {
        Neuropathy {
            chronic_threshold_mg_m2: default_chronic_threshold(),
        }
    }
}

impl Default for Kinetics {
    fn default() -> Self {
        Kinetics {
            clearance_fu: default_clearance_fu(),
            volume_fu: default_volume_fu(),
            clearance_ox: default_clearance_ox(),
            volume_ox: default_volume_ox(),
        }
    }
}

impl Default for Tumor {
    fn default() -> Self {
        Tumor {
            emax: default_emax(),
            ec50: default_ec50(),
            hill: default_hill(),
            alpha_fu: default_alpha_fu(),
            alpha_ox: default_alpha_ox(),
            growth_rate: default_growth_rate(),
            initial_size: default_initial_size(),
            weight_in_utility: default_tumor_weight(),
        }
    }
}

impl Default for Economics {
    fn default() -> Self {
        Economics {
            cost_fu_mg: default_cost_fu_mg(),
            cost_ox_mg: default_cost_ox_mg(),
            cost_infusion_day: default_cost_infusion_day(),
            cost_pump_day: default_cost_pump_day(),
            cost_utility_factor: default_cost_utility_factor(),
        }
    }
}

impl Default for Utility {
    fn default() -> Self {
        Utility {
            baseline: default_baseline_utility(),
            neutropenia_penalty: default_neutropenia_penalty(),
            neuropathy_penalty: default_neuropathy_penalty(),
        }
    }
}

impl Default for Optimization {
    fn default() -> Self {
        Optimization {
            horizon_days: default_horizon(),
            step_size_days: default_step_size(),
        }
    }
}

/// Partial override of a [Settings] bundle
///
/// Covers the fields a caller typically adjusts per run: patient
/// anthropometrics, the time grid and the output destination.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SettingsPatch {
    pub patient: Option<PatientPatch>,
    pub optimization: Option<OptimizationPatch>,
    pub paths: Option<PathsPatch>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PatientPatch {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OptimizationPatch {
    pub horizon_days: Option<f64>,
    pub step_size_days: Option<f64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PathsPatch {
    pub output_folder: Option<String>,
    pub log: Option<String>,
}

/// Read and validate settings from a TOML configuration file
///
/// Environment variables prefixed with `FOLFOX_` override file values,
/// e.g. `FOLFOX_CONFIG_LOG-LEVEL=debug`.
pub fn read_settings(path: &str) -> Result<Settings, SettingsError> {
    let parsed = eConfig::builder()
        .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
        .add_source(config::Environment::with_prefix("FOLFOX").separator("_"))
        .build()?;

    let settings: Settings = parsed.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Parse and validate settings from an in-memory TOML document
pub fn settings_from_toml(toml: &str) -> Result<Settings, SettingsError> {
    let parsed = eConfig::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let settings: Settings = parsed.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

// *********************************
// Default values for deserializing
// *********************************
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_folder() -> String {
    "results".to_string()
}

fn default_max_daily_fu() -> f64 {
    1200.0
}

fn default_max_single_ox() -> f64 {
    85.0
}

fn default_min_days_between_ox() -> usize {
    14
}

fn default_weight() -> f64 {
    70.0
}

fn default_height() -> f64 {
    170.0
}

fn default_anc_baseline() -> f64 {
    5.0
}

fn default_k_out() -> f64 {
    0.15
}

fn default_k_tox_fu() -> f64 {
    1e-3
}

fn default_k_tox_ox() -> f64 {
    5e-3
}

fn default_severe_neutropenia() -> f64 {
    1.0
}

fn default_chronic_threshold() -> f64 {
    850.0
}

fn default_clearance_fu() -> f64 {
    15.0
}

fn default_volume_fu() -> f64 {
    25.0
}

fn default_clearance_ox() -> f64 {
    8.0
}

fn default_volume_ox() -> f64 {
    400.0
}

fn default_emax() -> f64 {
    0.8
}

fn default_ec50() -> f64 {
    30.0
}

fn default_hill() -> f64 {
    2.0
}

fn default_alpha_fu() -> f64 {
    1.0
}

fn default_alpha_ox() -> f64 {
    5.0
}

fn default_growth_rate() -> f64 {
    0.015
}

fn default_initial_size() -> f64 {
    100.0
}

fn default_tumor_weight() -> f64 {
    0.3
}

fn default_cost_fu_mg() -> f64 {
    0.05
}

fn default_cost_ox_mg() -> f64 {
    2.5
}

fn default_cost_infusion_day() -> f64 {
    300.0
}

fn default_cost_pump_day() -> f64 {
    150.0
}

fn default_cost_utility_factor() -> f64 {
    1e-5
}

fn default_baseline_utility() -> f64 {
    0.76
}

fn default_neutropenia_penalty() -> f64 {
    0.2
}

fn default_neuropathy_penalty() -> f64 {
    0.24
}

fn default_horizon() -> f64 {
    180.0
}

fn default_step_size() -> f64 {
    1.0
}
