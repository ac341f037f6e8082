//! [DoseSchedule] - the time-indexed dose sequences for one candidate run

use ndarray::Array1;

/// Dose sequences for both agents over the treatment horizon
///
/// Both arrays have length T (one entry per integration step); entries are
/// absolute doses in mg, zero on days without administration. A schedule is a
/// pure function of the parameter bundle and the requested cycle count, see
/// [crate::simulator::FolfoxModel::schedule].
#[derive(Debug, Clone, PartialEq)]
pub struct DoseSchedule {
    /// Daily 5-fluorouracil infusion doses (mg)
    pub fu: Array1<f64>,
    /// Oxaliplatin bolus doses (mg)
    pub ox: Array1<f64>,
}

impl DoseSchedule {
    /// Schedule of all zeros over `n_steps` steps
    pub fn empty(n_steps: usize) -> Self {
        DoseSchedule {
            fu: Array1::zeros(n_steps),
            ox: Array1::zeros(n_steps),
        }
    }

    /// Number of integration steps covered
    pub fn n_steps(&self) -> usize {
        self.fu.len()
    }

    /// Step indices with a nonzero 5-FU dose
    pub fn fu_days(&self) -> Vec<usize> {
        self.fu
            .iter()
            .enumerate()
            .filter(|(_, &dose)| dose > 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Step indices with a nonzero oxaliplatin dose
    pub fn ox_days(&self) -> Vec<usize> {
        self.ox
            .iter()
            .enumerate()
            .filter(|(_, &dose)| dose > 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}
