//! Model configuration and topology
//!
//! A channel model is described by its topology ([`ModelSpec`]: binding
//! sites, solutes, charges, interaction mode, numeric backend) and by the
//! per-sweep physical inputs ([`Conditions`]: concentrations, energy-barrier
//! profile, interaction-coefficient values). The topology is specialized once
//! into a [`compile::CompiledModel`]; conditions and voltage are applied
//! fresh for every point of a sweep.

pub mod compile;
mod interaction;
pub mod rates;
mod state;
pub(crate) mod state_space;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChannelsolError;

pub use interaction::InteractionMode;
pub use state::ChannelState;

/// Numeric backend used for matrix evaluation and steady-state solving.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NumericBackend {
    /// Native double precision, solved with nalgebra kernels.
    #[serde(rename = "double-precision")]
    Double,
    /// Arbitrary-precision floats for ill-conditioned transition matrices.
    #[serde(rename = "arbitrary-precision")]
    MultiPrecision,
}

impl fmt::Display for NumericBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericBackend::Double => write!(f, "double-precision"),
            NumericBackend::MultiPrecision => write!(f, "arbitrary-precision"),
        }
    }
}

impl FromStr for NumericBackend {
    type Err = ChannelsolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "double" | "double-precision" => Ok(NumericBackend::Double),
            "multi" | "multiprecision" | "arbitrary-precision" => {
                Ok(NumericBackend::MultiPrecision)
            }
            other => Err(ChannelsolError::UnknownBackend(other.to_string())),
        }
    }
}

/// Topology and numeric configuration of a channel model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Number of binding sites in the pore, at least 1.
    pub num_binding_sites: usize,
    /// Unique solute identifiers, in a fixed order.
    pub solutes: Vec<String>,
    /// One signed charge per solute, aligned with `solutes`.
    pub charges: Vec<i32>,
    /// Ion-ion interaction coefficient mode.
    pub interaction: InteractionMode,
    /// Numeric backend for the sweep.
    pub backend: NumericBackend,
    /// Working precision in decimal digits (arbitrary-precision backend only).
    pub precision_digits: u32,
}

impl ModelSpec {
    pub fn new(
        num_binding_sites: usize,
        solutes: Vec<impl Into<String>>,
        charges: Vec<i32>,
    ) -> Self {
        ModelSpec {
            num_binding_sites,
            solutes: solutes.into_iter().map(Into::into).collect(),
            charges,
            interaction: InteractionMode::None,
            backend: NumericBackend::Double,
            precision_digits: 50,
        }
    }

    pub fn with_interaction(mut self, mode: InteractionMode) -> Self {
        self.interaction = mode;
        self
    }

    pub fn with_backend(mut self, backend: NumericBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_precision_digits(mut self, digits: u32) -> Self {
        self.precision_digits = digits;
        self
    }

    /// Number of barriers, `num_binding_sites + 1`.
    pub fn num_barriers(&self) -> usize {
        self.num_binding_sites + 1
    }

    /// Number of points in every energy/distance profile, `2n + 1`.
    pub fn profile_len(&self) -> usize {
        2 * self.num_binding_sites + 1
    }

    /// Fail-fast configuration check, run before any generation work.
    pub fn validate(&self) -> Result<(), ChannelsolError> {
        if self.num_binding_sites == 0 {
            return Err(ChannelsolError::NoBindingSites);
        }
        if self.solutes.is_empty() {
            return Err(ChannelsolError::NoSolutes);
        }
        for (i, name) in self.solutes.iter().enumerate() {
            if self.solutes[..i].contains(name) {
                return Err(ChannelsolError::DuplicateSolute(name.clone()));
            }
        }
        if self.charges.len() != self.solutes.len() {
            return Err(ChannelsolError::ChargeCountMismatch {
                solutes: self.solutes.len(),
                charges: self.charges.len(),
            });
        }
        if self.backend == NumericBackend::MultiPrecision && self.precision_digits == 0 {
            return Err(ChannelsolError::InvalidPrecision(self.precision_digits));
        }
        Ok(())
    }

    /// Specialize this configuration into an executable model.
    pub fn compile(&self) -> Result<compile::CompiledModel, ChannelsolError> {
        compile::CompiledModel::build(self.clone())
    }
}

/// Intracellular/extracellular concentration pair, in molar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationPair {
    pub intra: f64,
    pub extra: f64,
}

/// Per-solute bath concentrations.
///
/// Strongly-typed replacement for the legacy suffix-keyed map
/// (`"Nai"`/`"Nae"`); [`Concentrations::from_suffixed`] accepts that format
/// for callers migrating old settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Concentrations {
    pairs: HashMap<String, ConcentrationPair>,
}

impl Concentrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solute(mut self, solute: impl Into<String>, intra: f64, extra: f64) -> Self {
        self.pairs
            .insert(solute.into(), ConcentrationPair { intra, extra });
        self
    }

    /// Build from a legacy map keyed `"{solute}i"` / `"{solute}e"`.
    /// Keys without one of the two suffixes are ignored; a missing partner
    /// defaults to 0 M and is caught by validation if the solute is used.
    pub fn from_suffixed(map: &HashMap<String, f64>) -> Self {
        let mut pairs: HashMap<String, ConcentrationPair> = HashMap::new();
        for (key, &value) in map {
            let Some(last) = key.chars().last() else {
                continue;
            };
            if key.len() < 2 || (last != 'i' && last != 'e') {
                continue;
            }
            let solute = key[..key.len() - 1].to_string();
            let entry = pairs
                .entry(solute)
                .or_insert(ConcentrationPair {
                    intra: 0.0,
                    extra: 0.0,
                });
            if last == 'i' {
                entry.intra = value;
            } else {
                entry.extra = value;
            }
        }
        Concentrations { pairs }
    }

    pub fn get(&self, solute: &str) -> Option<ConcentrationPair> {
        self.pairs.get(solute).copied()
    }
}

/// Energy-barrier profile: electrical distances shared by all solutes plus a
/// per-solute free-energy profile, each with `2n + 1` points (odd points are
/// barrier peaks, even points are binding-site wells; energies in kT,
/// distances as fractions of the transmembrane voltage drop).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnergyProfile {
    distances: Vec<f64>,
    energies: HashMap<String, Vec<f64>>,
}

impl EnergyProfile {
    pub fn new(distances: Vec<f64>) -> Self {
        EnergyProfile {
            distances,
            energies: HashMap::new(),
        }
    }

    pub fn with_solute(mut self, solute: impl Into<String>, energies: Vec<f64>) -> Self {
        self.energies.insert(solute.into(), energies);
        self
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn energies_for(&self, solute: &str) -> Option<&[f64]> {
        self.energies.get(solute).map(Vec::as_slice)
    }
}

/// Physical inputs held fixed across a voltage sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conditions {
    pub concentrations: Concentrations,
    pub profile: EnergyProfile,
    /// One value per declared Q slot (empty when the mode has none).
    pub q_values: Vec<f64>,
    /// One value per declared R slot.
    pub r_values: Vec<f64>,
}

impl Conditions {
    pub fn new(concentrations: Concentrations, profile: EnergyProfile) -> Self {
        Conditions {
            concentrations,
            profile,
            q_values: Vec::new(),
            r_values: Vec::new(),
        }
    }

    pub fn with_q_values(mut self, q_values: Vec<f64>) -> Self {
        self.q_values = q_values;
        self
    }

    pub fn with_r_values(mut self, r_values: Vec<f64>) -> Self {
        self.r_values = r_values;
        self
    }
}
