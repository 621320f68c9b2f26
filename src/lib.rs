//! channelsol: Eyring rate-theory models of multi-ion channel permeation
//!
//! Models ion transport through a multi-site binding channel as a
//! continuous-time Markov chain over occupancy states. For a chosen topology
//! (binding sites, permeant solutes, charges, optional ion-ion interaction
//! coefficients) the crate
//!
//! 1. enumerates every reachable occupancy state and builds the transition
//!    structure symbolically ([`model::compile::CompiledModel`]),
//! 2. solves the steady-state occupancy distribution at each applied voltage
//!    by three independent methods — dominant eigenvector, SVD null space
//!    and QR null space — with explicit conditioning and residual
//!    diagnostics ([`solver`]),
//! 3. converts steady states into per-barrier transport rates and electrical
//!    current, collected per voltage per method ([`sweep`]).
//!
//! # Architecture
//!
//! The model is specialized **once** per topology and evaluated **many
//! times**: [`ModelSpec::compile`] does all enumeration and symbolic work up
//! front, and each voltage point only evaluates rate constants and runs the
//! numeric solvers. Two numeric backends share that evaluation code through
//! the [`backend::Real`] scalar trait: native `f64` (nalgebra kernels) and
//! arbitrary-precision floats for transition matrices whose rates span more
//! orders of magnitude than a double can resolve.
//!
//! # Quick start
//!
//! ```rust
//! use channelsol::prelude::*;
//!
//! let model = ModelSpec::new(1, vec!["Na"], vec![1]).compile()?;
//! let conditions = Conditions::new(
//!     Concentrations::new().with_solute("Na", 0.145, 0.145),
//!     EnergyProfile::new(vec![0.25, 0.5, 0.75]).with_solute("Na", vec![8.0, -10.0, 8.0]),
//! );
//! let voltages: Vec<f64> = (-3..=3).map(|i| i as f64 * 50.0).collect();
//! let results = VoltageSweep::new(&model, &conditions, voltages)?.run();
//!
//! for record in &results.eigen {
//!     println!("{} mV -> {:.3e} pA", record.voltage, record.current[0]);
//! }
//! # Ok::<(), channelsol::ChannelsolError>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod solver;
pub mod sweep;
pub(crate) mod transport;

pub use config::SimulationSetup;
pub use error::ChannelsolError;
pub use model::compile::CompiledModel;
pub use model::{
    ChannelState, Concentrations, Conditions, EnergyProfile, InteractionMode, ModelSpec,
    NumericBackend,
};
pub use solver::{
    MatrixDiagnostics, MethodStatus, Results, SolveMethod, SolverDiagnostics,
};
pub use sweep::{SweepResults, VoltageSweep};

pub mod prelude {
    pub use crate::config::SimulationSetup;
    pub use crate::error::ChannelsolError;
    pub use crate::model::compile::CompiledModel;
    pub use crate::model::{
        ChannelState, Concentrations, Conditions, EnergyProfile, InteractionMode, ModelSpec,
        NumericBackend,
    };
    pub use crate::solver::{MethodStatus, Results, SolveMethod};
    pub use crate::sweep::{SweepResults, VoltageSweep};
}
