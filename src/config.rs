//! Simulation setup serialization
//!
//! A [`SimulationSetup`] bundles everything a sweep needs — model topology,
//! physical conditions, and the voltage list — into one JSON-serializable
//! document, so a configuration can be saved, versioned and replayed without
//! going through a UI layer.

use serde::{Deserialize, Serialize};

use crate::error::ChannelsolError;
use crate::model::{Conditions, ModelSpec};

/// A complete, replayable sweep configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationSetup {
    pub model: ModelSpec,
    pub conditions: Conditions,
    /// Applied voltages, mV, in sweep order.
    pub voltages: Vec<f64>,
}

impl SimulationSetup {
    pub fn new(model: ModelSpec, conditions: Conditions, voltages: Vec<f64>) -> Self {
        SimulationSetup {
            model,
            conditions,
            voltages,
        }
    }

    pub fn to_json(&self) -> Result<String, ChannelsolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ChannelsolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Concentrations, EnergyProfile, InteractionMode, NumericBackend};

    #[test]
    fn setup_round_trips_through_json() {
        let model = ModelSpec::new(2, vec!["Na", "Ca"], vec![1, 2])
            .with_interaction(InteractionMode::SingleQ)
            .with_backend(NumericBackend::MultiPrecision)
            .with_precision_digits(40);
        let conditions = Conditions::new(
            Concentrations::new()
                .with_solute("Na", 0.12, 0.12)
                .with_solute("Ca", 0.002, 0.002),
            EnergyProfile::new(vec![0.167, 0.333, 0.5, 0.667, 0.8333])
                .with_solute("Na", vec![8.0, -4.0, 20.0, -4.0, 8.0])
                .with_solute("Ca", vec![9.0, -12.0, 20.0, -12.0, 9.0]),
        )
        .with_q_values(vec![2.0]);
        let voltages: Vec<f64> = (-3..=3).map(|i| i as f64 * 50.0).collect();

        let setup = SimulationSetup::new(model, conditions, voltages.clone());
        let text = setup.to_json().unwrap();
        let parsed = SimulationSetup::from_json(&text).unwrap();

        assert_eq!(parsed.model.num_binding_sites, 2);
        assert_eq!(parsed.model.interaction, InteractionMode::SingleQ);
        assert_eq!(parsed.model.backend, NumericBackend::MultiPrecision);
        assert_eq!(parsed.voltages, voltages);
        assert_eq!(parsed.conditions.q_values, vec![2.0]);
        assert_eq!(
            parsed.conditions.concentrations.get("Ca").unwrap().intra,
            0.002
        );
        // a compiled model accepts the round-tripped conditions
        let compiled = parsed.model.compile().unwrap();
        assert!(compiled.check_conditions(&parsed.conditions).is_ok());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            SimulationSetup::from_json("{\"model\": 3}"),
            Err(ChannelsolError::Json(_))
        ));
    }
}
