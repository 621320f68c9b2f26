//! Elementary Eyring rate constants
//!
//! Every rate follows the canonical form
//! `rate = [C] * k0 * exp(G_src - G_bar) * exp(z * (1/kT) * (d_src - d_bar) * V)`
//! where the concentration factor `C` appears only when the source is a
//! reservoir. Energy profiles are indexed 1-based `1..=2n+1` (odd points are
//! barrier peaks, even points are binding-site wells); the extracellular
//! reservoir sits at energy 0 and electrical distance 0, the intracellular
//! reservoir at energy 0 and electrical distance 1.
//!
//! Rates are rebuilt for every (profile, voltage) combination and never
//! cached across voltages.

use serde::{Deserialize, Serialize};

use crate::backend::Real;

use super::Conditions;

/// Attempt frequency kT/h, in 1/s.
pub const ATTEMPT_FREQUENCY: f64 = 6.1e12;

/// 1/kT expressed per millivolt of potential seen by one elementary charge.
pub const INVERSE_THERMAL_VOLTAGE: f64 = 1.0 / 25.0;

/// Elementary charge, in coulombs.
pub const ELEMENTARY_CHARGE: f64 = 1.602e-19;

/// Conversion from amperes to picoamperes.
pub const AMPS_TO_PICOAMPS: f64 = 1.0e12;

/// Direction of an elementary move across a barrier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Toward the intracellular side (site index increasing).
    Inward,
    /// Toward the extracellular side.
    Outward,
}

/// Identity of one elementary rate constant: which barrier is crossed, which
/// solute moves, and in which direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RateId {
    /// 0-based barrier index, `0..=num_binding_sites`.
    pub barrier: usize,
    /// Solute index into the model's solute list.
    pub ion: usize,
    pub direction: Direction,
}

impl RateId {
    pub(crate) fn flat(&self, n_ions: usize) -> usize {
        (self.barrier * n_ions + self.ion) * 2
            + match self.direction {
                Direction::Inward => 0,
                Direction::Outward => 1,
            }
    }
}

/// Symbolic definition of one elementary rate constant.
///
/// Carries everything needed both to evaluate the rate numerically at a
/// voltage and to render the classic assignment string, e.g.
/// `k_0_1_Na = Nae*k0*exp(-GNa1)*exp(1*q*-d1*V)`.
#[derive(Clone, Copy, Debug)]
pub struct RateExpr {
    pub id: RateId,
    /// Source position in site coordinates: 0 = extracellular reservoir,
    /// `1..=n` = binding sites, `n + 1` = intracellular reservoir.
    pub src_site: usize,
    pub dst_site: usize,
    num_sites: usize,
}

impl RateExpr {
    fn new(id: RateId, num_sites: usize) -> Self {
        let (src_site, dst_site) = match id.direction {
            Direction::Inward => (id.barrier, id.barrier + 1),
            Direction::Outward => (id.barrier + 1, id.barrier),
        };
        RateExpr {
            id,
            src_site,
            dst_site,
            num_sites,
        }
    }

    /// Canonical rate name, `k_<src>_<dst>_<solute>`.
    pub fn name(&self, solutes: &[String]) -> String {
        format!(
            "k_{}_{}_{}",
            self.src_site, self.dst_site, solutes[self.id.ion]
        )
    }

    /// Numeric value at one voltage.
    ///
    /// Exponent arguments are assembled in f64 (model inputs are doubles);
    /// the exponentials and the final product run at backend precision,
    /// which is where the extended range of the arbitrary-precision backend
    /// pays off.
    pub(crate) fn eval<T: Real>(
        &self,
        solute: &str,
        charge: i32,
        conditions: &Conditions,
        voltage_mv: f64,
    ) -> T {
        let distances = conditions.profile.distances();
        let energies = conditions
            .profile
            .energies_for(solute)
            .expect("profile completeness is validated before evaluation");

        let bar = 2 * self.id.barrier;
        let g_bar = energies[bar];
        let d_bar = distances[bar];

        let (g_src, d_src, conc) = if self.src_site == 0 {
            let pair = conditions
                .concentrations
                .get(solute)
                .expect("concentration completeness is validated before evaluation");
            (0.0, 0.0, Some(pair.extra))
        } else if self.src_site == self.num_sites + 1 {
            let pair = conditions
                .concentrations
                .get(solute)
                .expect("concentration completeness is validated before evaluation");
            (0.0, 1.0, Some(pair.intra))
        } else {
            let well = 2 * self.src_site - 1;
            (energies[well], distances[well], None)
        };

        let energy_arg = g_src - g_bar;
        let voltage_arg =
            charge as f64 * INVERSE_THERMAL_VOLTAGE * (d_src - d_bar) * voltage_mv;

        let mut rate = T::from_f64(ATTEMPT_FREQUENCY)
            * T::from_f64(energy_arg).exp()
            * T::from_f64(voltage_arg).exp();
        if let Some(c) = conc {
            rate = T::from_f64(c) * rate;
        }
        rate
    }

    /// Render the defining expression in the classic assignment form.
    pub fn render(&self, solutes: &[String], charges: &[i32]) -> String {
        let sol = &solutes[self.id.ion];
        let z = charges[self.id.ion];
        let last = 2 * self.num_sites + 1;
        let body = if self.src_site == 0 {
            format!(
                "{sol}e*k0*exp(-G{sol}1)*exp({z}*q*-d1*V)",
                sol = sol,
                z = z
            )
        } else if self.src_site == self.num_sites + 1 {
            format!(
                "{sol}i*k0*exp(-G{sol}{m})*exp({z}*q*(1-d{m})*V)",
                sol = sol,
                z = z,
                m = last
            )
        } else {
            let well = 2 * self.src_site;
            let bar = 2 * self.id.barrier + 1;
            format!(
                "k0*exp(G{sol}{a}-G{sol}{b})*exp({z}*q*(d{a}-d{b})*V)",
                sol = sol,
                z = z,
                a = well,
                b = bar
            )
        };
        format!("{} = {}", self.name(solutes), body)
    }
}

/// All elementary rate expressions for a topology, ordered by
/// [`RateId::flat`] index.
pub(crate) fn rate_exprs(num_sites: usize, n_ions: usize) -> Vec<RateExpr> {
    let mut exprs = Vec::with_capacity((num_sites + 1) * n_ions * 2);
    for barrier in 0..=num_sites {
        for ion in 0..n_ions {
            for direction in [Direction::Inward, Direction::Outward] {
                exprs.push(RateExpr::new(
                    RateId {
                        barrier,
                        ion,
                        direction,
                    },
                    num_sites,
                ));
            }
        }
    }
    exprs
}

/// Numeric values of every elementary rate at one voltage.
#[derive(Clone, Debug)]
pub(crate) struct RateTable<T> {
    values: Vec<T>,
    n_ions: usize,
}

impl<T: Real> RateTable<T> {
    pub fn new(values: Vec<T>, n_ions: usize) -> Self {
        RateTable { values, n_ions }
    }

    pub fn get(&self, id: RateId) -> &T {
        &self.values[id.flat(self.n_ions)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Concentrations, EnergyProfile};

    fn conditions() -> Conditions {
        Conditions::new(
            Concentrations::new().with_solute("Na", 0.145, 0.1),
            EnergyProfile::new(vec![0.25, 0.5, 0.75]).with_solute("Na", vec![8.0, -10.0, 8.0]),
        )
    }

    #[test]
    fn flat_indices_match_generation_order() {
        let exprs = rate_exprs(3, 2);
        assert_eq!(exprs.len(), (3 + 1) * 2 * 2);
        for (i, e) in exprs.iter().enumerate() {
            assert_eq!(e.id.flat(2), i);
        }
    }

    #[test]
    fn entry_rate_scales_with_extracellular_concentration() {
        let cond = conditions();
        let exprs = rate_exprs(1, 1);
        let entry = exprs
            .iter()
            .find(|e| e.src_site == 0)
            .expect("entry expression");
        let rate: f64 = entry.eval("Na", 1, &cond, 0.0);
        let expected = 0.1 * ATTEMPT_FREQUENCY * (-8.0_f64).exp();
        assert!((rate - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn internal_rates_are_concentration_independent() {
        let cond = conditions();
        let exprs = rate_exprs(1, 1);
        // outward over barrier 0: from the single site back out
        let back = exprs
            .iter()
            .find(|e| e.src_site == 1 && e.dst_site == 0)
            .unwrap();
        let v = -50.0;
        let rate: f64 = back.eval("Na", 2, &cond, v);
        let energy = (-10.0 - 8.0_f64).exp();
        let volt = (2.0 * INVERSE_THERMAL_VOLTAGE * (0.5 - 0.25) * v).exp();
        let expected = ATTEMPT_FREQUENCY * energy * volt;
        assert!((rate - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn intracellular_entry_uses_remaining_voltage_drop() {
        let cond = conditions();
        let exprs = rate_exprs(1, 1);
        let entry = exprs.iter().find(|e| e.src_site == 2).unwrap();
        let v = 100.0;
        let rate: f64 = entry.eval("Na", 1, &cond, v);
        let expected = 0.145
            * ATTEMPT_FREQUENCY
            * (-8.0_f64).exp()
            * (INVERSE_THERMAL_VOLTAGE * (1.0 - 0.75) * v).exp();
        assert!((rate - expected).abs() < expected * 1e-12);
    }

    #[test]
    fn rendering_matches_generated_script_form() {
        let solutes = vec!["Na".to_string(), "Ca".to_string()];
        let charges = vec![1, 2];
        let exprs = rate_exprs(2, 2);
        let find = |src: usize, dst: usize, ion: usize| {
            exprs
                .iter()
                .find(|e| e.src_site == src && e.dst_site == dst && e.id.ion == ion)
                .unwrap()
        };
        assert_eq!(
            find(0, 1, 0).render(&solutes, &charges),
            "k_0_1_Na = Nae*k0*exp(-GNa1)*exp(1*q*-d1*V)"
        );
        assert_eq!(
            find(1, 0, 0).render(&solutes, &charges),
            "k_1_0_Na = k0*exp(GNa2-GNa1)*exp(1*q*(d2-d1)*V)"
        );
        assert_eq!(
            find(1, 2, 1).render(&solutes, &charges),
            "k_1_2_Ca = k0*exp(GCa2-GCa3)*exp(2*q*(d2-d3)*V)"
        );
        assert_eq!(
            find(3, 2, 1).render(&solutes, &charges),
            "k_3_2_Ca = Cai*k0*exp(-GCa5)*exp(2*q*(1-d5)*V)"
        );
    }
}
