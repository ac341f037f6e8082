use anyhow::Result;
use folfoxcore::prelude::*;

fn model_with(horizon_days: f64, min_days_between_ox: usize) -> Result<FolfoxModel> {
    let mut settings = Settings::default();
    settings.optimization.horizon_days = horizon_days;
    settings.optimization.step_size_days = 1.0;
    settings.dosing.min_days_between_ox = min_days_between_ox;
    Ok(FolfoxModel::new(&settings)?)
}

/// Each cycle doses 5-FU on its first two days; six cycles give twelve days
#[test]
fn test_fu_dose_days() -> Result<()> {
    let model = model_with(180.0, 14)?;
    let schedule = model.schedule(6);

    let fu_days = schedule.fu_days();
    assert_eq!(fu_days.len(), 12);
    let expected: Vec<usize> = (0..6).flat_map(|c| [c * 14, c * 14 + 1]).collect();
    assert_eq!(fu_days, expected);

    for &day in &fu_days {
        assert_eq!(schedule.fu[day], model.max_daily_fu_mg());
    }
    Ok(())
}

/// With 14-day spacing every cycle receives an oxaliplatin bolus
#[test]
fn test_ox_dose_days() -> Result<()> {
    let model = model_with(180.0, 14)?;
    let schedule = model.schedule(6);

    let ox_days = schedule.ox_days();
    assert_eq!(ox_days, vec![0, 14, 28, 42, 56, 70]);
    for &day in &ox_days {
        assert_eq!(schedule.ox[day], model.max_single_ox_mg());
    }
    Ok(())
}

/// A spacing constraint wider than the cycle length skips boluses
#[test]
fn test_ox_minimum_spacing() -> Result<()> {
    let model = model_with(180.0, 21)?;
    let schedule = model.schedule(6);

    // Cycles start every 14 days but a bolus needs a 21-day gap since the
    // last administered one, so every other cycle is skipped
    let ox_days = schedule.ox_days();
    assert_eq!(ox_days, vec![0, 28, 56]);
    for pair in ox_days.windows(2) {
        assert!(pair[1] - pair[0] >= 21);
    }
    Ok(())
}

/// Cycles starting at or beyond the horizon are silently dropped
#[test]
fn test_horizon_truncation() -> Result<()> {
    let model = model_with(28.0, 14)?;
    let schedule = model.schedule(10);

    assert_eq!(schedule.fu_days(), vec![0, 1, 14, 15]);
    assert_eq!(schedule.ox_days(), vec![0, 14]);
    Ok(())
}

/// A second infusion day past the horizon is dropped, the first is kept
#[test]
fn test_second_infusion_day_truncated() -> Result<()> {
    let model = model_with(15.0, 14)?;
    let schedule = model.schedule(2);

    // Cycle 1 starts on day 14; its second infusion day (15) is off-grid
    assert_eq!(schedule.fu_days(), vec![0, 1, 14]);
    Ok(())
}

/// Zero cycles means an all-zero schedule
#[test]
fn test_zero_cycles() -> Result<()> {
    let model = model_with(180.0, 14)?;
    let schedule = model.schedule(0);

    assert_eq!(schedule.n_steps(), 180);
    assert!(schedule.fu_days().is_empty());
    assert!(schedule.ox_days().is_empty());
    Ok(())
}

/// Schedules are deterministic given the bundle and cycle count
#[test]
fn test_schedule_deterministic() -> Result<()> {
    let model = model_with(180.0, 14)?;
    assert_eq!(model.schedule(5), model.schedule(5));
    Ok(())
}
