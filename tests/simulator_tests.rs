use anyhow::Result;
use folfoxcore::prelude::*;

/// BSA and absolute limits are derived from the anthropometrics
#[test]
fn test_parameter_derivation() -> Result<()> {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings)?;

    // sqrt(170 * 70 / 3600)
    let bsa = model.bsa();
    assert!((bsa - 1.81812).abs() < 1e-4);
    assert!((model.max_daily_fu_mg() - settings.dosing.max_daily_fu_mg_m2 * bsa).abs() < 1e-9);
    assert!((model.max_single_ox_mg() - settings.dosing.max_single_ox_mg_m2 * bsa).abs() < 1e-9);
    assert!(
        (model.chronic_threshold_mg() - settings.neuropathy.chronic_threshold_mg_m2 * bsa).abs()
            < 1e-9
    );
    Ok(())
}

/// A non-physical bundle never reaches the simulator
#[test]
fn test_invalid_patient_rejected() {
    let mut settings = Settings::default();
    settings.dosing.patient_weight_kg = -70.0;
    assert!(matches!(
        FolfoxModel::new(&settings),
        Err(SettingsError::InvalidPatient(_))
    ));
}

/// With no doses, ANC holds at baseline, flags stay clear, and the tumor
/// grows at the pure discrete exponential rate
#[test]
fn test_untreated_baseline() -> Result<()> {
    let mut settings = Settings::default();
    settings.tumor.weight_in_utility = 0.0;
    let model = FolfoxModel::new(&settings)?;
    let trace = model.simulate(0)?;

    assert_eq!(trace.len(), settings.optimization.n_steps() + 1);
    assert!(trace.dose_fu.iter().all(|&d| d == 0.0));
    assert!(trace.dose_ox.iter().all(|&d| d == 0.0));
    assert!(trace.anc.iter().all(|&a| a == settings.hematology.anc_baseline));
    assert!(trace.acute_neuropathy.iter().all(|&f| f == 0));
    assert!(trace.chronic_neuropathy.iter().all(|&f| f == 0));
    assert!(trace.total_cost.iter().all(|&c| c == 0.0));

    // size[t+1] = size[t] + dt * growth_rate * size[t], no kill term
    let dt = settings.optimization.step_size_days;
    let mut expected = settings.tumor.initial_size;
    for &size in trace.tumor_size.iter() {
        assert!((size - expected).abs() <= 1e-9 * expected);
        expected += dt * (settings.tumor.growth_rate * expected);
    }

    // Utility never moves off baseline: no penalties, no cost, no tumor weight
    assert!(trace.utility.iter().all(|&u| u == settings.utility.baseline));
    Ok(())
}

/// Floors and monotonic quantities hold over a fully dosed run
#[test]
fn test_trace_invariants() -> Result<()> {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings)?;
    let trace = model.simulate(6)?;

    let t_steps = settings.optimization.n_steps();
    assert_eq!(trace.len(), t_steps + 1);
    // Dose and daily-cost series are padded with a trailing zero
    assert_eq!(trace.dose_fu[t_steps], 0.0);
    assert_eq!(trace.dose_ox[t_steps], 0.0);
    assert_eq!(trace.daily_cost[t_steps], 0.0);

    assert!(trace.anc.iter().all(|&a| a >= 0.0));
    assert!(trace.tumor_size.iter().all(|&s| s >= 0.0));

    for pair in trace.cum_ox.as_slice().unwrap().windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    for pair in trace.total_cost.as_slice().unwrap().windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    for pair in trace.chronic_neuropathy.as_slice().unwrap().windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    Ok(())
}

/// The acute flag mirrors same-step oxaliplatin dosing with one-step memory
#[test]
fn test_acute_neuropathy_flag() -> Result<()> {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings)?;
    let trace = model.simulate(2)?;

    // Bolus on day 0 sets the flag at step 1; day 1 has only 5-FU
    assert_eq!(trace.acute_neuropathy[0], 0);
    assert_eq!(trace.acute_neuropathy[1], 1);
    assert_eq!(trace.acute_neuropathy[2], 0);
    // Second bolus on day 14
    assert_eq!(trace.acute_neuropathy[15], 1);
    assert_eq!(trace.acute_neuropathy[16], 0);
    Ok(())
}

/// The chronic flag trips when cumulative exposure crosses the absolute
/// threshold and stays set for the rest of the run
#[test]
fn test_chronic_neuropathy_sticky() -> Result<()> {
    let mut settings = Settings::default();
    // One bolus (85 mg/m²) is enough to cross
    settings.neuropathy.chronic_threshold_mg_m2 = 50.0;
    let model = FolfoxModel::new(&settings)?;
    let trace = model.simulate(1)?;

    assert_eq!(trace.chronic_onset_day(), Some(1.0));
    assert!(trace.chronic_neuropathy.iter().skip(1).all(|&f| f == 1));
    Ok(())
}

/// Utility at the first dosed step reflects the neuropathy penalty and the
/// day's cost, subtracted from baseline
#[test]
fn test_utility_snapshot() -> Result<()> {
    let mut settings = Settings::default();
    settings.tumor.weight_in_utility = 0.0;
    settings.hematology.k_tox_fu = 0.0;
    settings.hematology.k_tox_ox = 0.0;
    let model = FolfoxModel::new(&settings)?;
    let trace = model.simulate(1)?;

    let cost_day0 = model.max_daily_fu_mg() * settings.economics.cost_fu_mg
        + model.max_single_ox_mg() * settings.economics.cost_ox_mg
        + settings.economics.cost_infusion_day
        + settings.economics.cost_pump_day;
    assert!((trace.daily_cost[0] - cost_day0).abs() < 1e-9);

    let expected = settings.utility.baseline
        - settings.utility.neuropathy_penalty
        - cost_day0 * settings.economics.cost_utility_factor;
    assert!((trace.utility[1] - expected).abs() < 1e-12);
    Ok(())
}

/// Re-running with the same bundle and cycle count is bit-for-bit identical
#[test]
fn test_determinism() -> Result<()> {
    let settings = Settings::default();
    let model = FolfoxModel::new(&settings)?;

    let first = model.simulate(4)?;
    let second = model.simulate(4)?;
    assert_eq!(first, second);
    Ok(())
}

/// Degenerate dynamics are reported as a simulation failure, not a panic
#[test]
fn test_nonfinite_state_detected() {
    let mut settings = Settings::default();
    settings.tumor.growth_rate = 1e300;
    let model = FolfoxModel::new(&settings).unwrap();
    assert!(matches!(
        model.simulate(0),
        Err(SimulationError::NonFinite { .. })
    ));
}
