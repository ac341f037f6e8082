//! # folfoxcore
//!
//! Building blocks for simulating a patient's response to the FOLFOX
//! chemotherapy regimen (5-fluorouracil + oxaliplatin) and for selecting the
//! number of 14-day treatment cycles that maximizes mean utility.
//!
//! The two central pieces are [`simulator::FolfoxModel`], a fixed-step
//! (forward Euler) PK/PD/toxicity/economic state simulator, and
//! [`optimizer::optimize_cycles`], an exhaustive search over feasible cycle
//! counts. Everything the simulator produces is collected in a
//! [`structs::trace::SimulationTrace`], which downstream consumers (CSV
//! export, summary serialization) read by field name.

pub mod entrypoints;
pub mod logger;
pub mod optimizer;
pub mod simulator;

pub mod routines {
    pub mod output;
    pub mod settings;
}

pub mod structs {
    pub mod schedule;
    pub mod trace;
}

pub mod prelude {
    pub use crate::entrypoints::{optimize, simulate};
    pub use crate::optimizer::*;
    pub use crate::routines::output::*;
    pub use crate::routines::settings::*;
    pub use crate::simulator::*;
    pub use crate::structs::schedule::*;
    pub use crate::structs::trace::*;
}
