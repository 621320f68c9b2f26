//! Model specialization
//!
//! [`CompiledModel`] is the executable form of a [`ModelSpec`]: states,
//! directed transition terms, rate expressions and transport tables are
//! assembled once per topology, then evaluated numerically for every voltage
//! of a sweep. This replaces per-configuration source generation with a plain
//! data representation while keeping the "specialize once, evaluate many
//! times" cost profile.

use nalgebra::DMatrix;

use crate::backend::Real;
use crate::error::ChannelsolError;
use crate::solver::dense::Mat;

use super::interaction::{CoeffFactor, CoeffKind, CoefficientLayout};
use super::rates::{rate_exprs, RateExpr, RateTable};
use super::state::ChannelState;
use super::state_space::{enumerate, StateSpace};
use super::{Conditions, ModelSpec};

/// Interaction coefficient values converted to the evaluation scalar.
#[derive(Clone, Debug)]
pub(crate) struct CoeffValues<T> {
    q: Vec<T>,
    r: Vec<T>,
}

impl<T: Real> CoeffValues<T> {
    /// Product of the interaction factors attached to one move.
    pub fn factor(&self, coeffs: &[CoeffFactor]) -> T {
        let mut acc = T::one();
        for c in coeffs {
            let value = match c.kind {
                CoeffKind::Q => &self.q[c.slot],
                CoeffKind::R => &self.r[c.slot],
            };
            acc = acc * value.powi(c.exponent);
        }
        acc
    }
}

/// A model specialized to one topology, ready for numeric evaluation.
#[derive(Clone, Debug)]
pub struct CompiledModel {
    spec: ModelSpec,
    space: StateSpace,
    exprs: Vec<RateExpr>,
    layout: CoefficientLayout,
}

impl CompiledModel {
    pub(crate) fn build(spec: ModelSpec) -> Result<Self, ChannelsolError> {
        spec.validate()?;
        let layout = CoefficientLayout::new(spec.interaction, spec.num_binding_sites);
        let space = enumerate(
            spec.num_binding_sites,
            spec.solutes.len(),
            &spec.charges,
            &layout,
        );
        let exprs = rate_exprs(spec.num_binding_sites, spec.solutes.len());
        Ok(CompiledModel {
            spec,
            space,
            exprs,
            layout,
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn num_states(&self) -> usize {
        self.space.num_states()
    }

    pub fn states(&self) -> &[ChannelState] {
        &self.space.states
    }

    /// Number of declared Q coefficient slots for this topology.
    pub fn q_slot_count(&self) -> usize {
        self.layout.q_count()
    }

    /// Number of declared R coefficient slots for this topology.
    pub fn r_slot_count(&self) -> usize {
        self.layout.r_count()
    }

    pub(crate) fn space(&self) -> &StateSpace {
        &self.space
    }

    /// Validate a set of sweep conditions against this topology. Called by
    /// the sweep driver before the first voltage is processed.
    pub fn check_conditions(&self, conditions: &Conditions) -> Result<(), ChannelsolError> {
        let expected = self.spec.profile_len();
        let distances = conditions.profile.distances();
        if distances.len() != expected {
            return Err(ChannelsolError::DistanceCount {
                expected,
                found: distances.len(),
            });
        }
        for (index, &value) in distances.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ChannelsolError::DistanceOutOfRange { index, value });
            }
        }
        for solute in &self.spec.solutes {
            match conditions.profile.energies_for(solute) {
                None => return Err(ChannelsolError::MissingEnergyProfile(solute.clone())),
                Some(energies) if energies.len() != expected => {
                    return Err(ChannelsolError::EnergyCount {
                        solute: solute.clone(),
                        expected,
                        found: energies.len(),
                    });
                }
                Some(_) => {}
            }
            match conditions.concentrations.get(solute) {
                None => return Err(ChannelsolError::MissingConcentration(solute.clone())),
                Some(pair) => {
                    for value in [pair.intra, pair.extra] {
                        if value < 0.0 {
                            return Err(ChannelsolError::NegativeConcentration {
                                solute: solute.clone(),
                                value,
                            });
                        }
                    }
                }
            }
        }
        if conditions.q_values.len() != self.layout.q_count() {
            return Err(ChannelsolError::CoefficientCount {
                kind: "Q",
                expected: self.layout.q_count(),
                found: conditions.q_values.len(),
            });
        }
        if conditions.r_values.len() != self.layout.r_count() {
            return Err(ChannelsolError::CoefficientCount {
                kind: "R",
                expected: self.layout.r_count(),
                found: conditions.r_values.len(),
            });
        }
        Ok(())
    }

    /// Evaluate every elementary rate constant at one voltage.
    pub(crate) fn rate_table<T: Real>(&self, conditions: &Conditions, voltage_mv: f64) -> RateTable<T> {
        let values = self
            .exprs
            .iter()
            .map(|e| {
                let solute = &self.spec.solutes[e.id.ion];
                let charge = self.spec.charges[e.id.ion];
                e.eval(solute, charge, conditions, voltage_mv)
            })
            .collect();
        RateTable::new(values, self.spec.solutes.len())
    }

    pub(crate) fn coeff_values<T: Real>(&self, conditions: &Conditions) -> CoeffValues<T> {
        CoeffValues {
            q: conditions.q_values.iter().map(|&v| T::from_f64(v)).collect(),
            r: conditions.r_values.iter().map(|&v| T::from_f64(v)).collect(),
        }
    }

    /// Assemble the numeric transition matrix for one voltage: column
    /// convention (`M[to][from]` accumulates the rate from `from` into `to`),
    /// diagonal set to the negative column sums so every column sums to
    /// zero.
    pub(crate) fn numeric_matrix<T: Real>(
        &self,
        rates: &RateTable<T>,
        coeffs: &CoeffValues<T>,
    ) -> Mat<T> {
        let n = self.num_states();
        let mut m: Mat<T> = Mat::zeros(n, n);
        let mut column_sums = vec![T::zero(); n];
        for term in &self.space.transitions {
            let value = rates.get(term.rate).clone() * coeffs.factor(&term.coeffs);
            let updated = m.get(term.to, term.from).clone() + value.clone();
            m.set(term.to, term.from, updated);
            column_sums[term.from] = column_sums[term.from].clone() + value;
        }
        for j in 0..n {
            m.set(j, j, -column_sums[j].clone());
        }
        m
    }

    /// Numeric transition matrix at one voltage as a nalgebra matrix,
    /// validating the conditions first. Primarily a convenience for tests
    /// and callers inspecting a single voltage point.
    pub fn transition_matrix(
        &self,
        conditions: &Conditions,
        voltage_mv: f64,
    ) -> Result<DMatrix<f64>, ChannelsolError> {
        self.check_conditions(conditions)?;
        let rates = self.rate_table::<f64>(conditions, voltage_mv);
        let coeffs = self.coeff_values::<f64>(conditions);
        Ok(to_dmatrix(&self.numeric_matrix(&rates, &coeffs)))
    }

    /// The state list in discovery order, rendered with solute names.
    pub fn state_listing(&self) -> String {
        let rows: Vec<String> = self
            .space
            .states
            .iter()
            .map(|s| format!("    {}", s.label(&self.spec.solutes)))
            .collect();
        format!("states = [\n{}\n]", rows.join(",\n"))
    }

    /// Every elementary rate assignment, one per line.
    pub fn rate_listing(&self) -> String {
        self.exprs
            .iter()
            .map(|e| e.render(&self.spec.solutes, &self.spec.charges))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The symbolic transition matrix as a row-per-line grid, diagonal
    /// entries written as the negated column sums.
    pub fn matrix_listing(&self) -> String {
        let n = self.num_states();
        let mut cells: Vec<Vec<Vec<String>>> = vec![vec![Vec::new(); n]; n];
        for term in &self.space.transitions {
            cells[term.to][term.from].push(self.term_text(term.rate, &term.coeffs));
        }
        for j in 0..n {
            let mut outflows = Vec::new();
            for row in cells.iter() {
                outflows.extend(row[j].iter().cloned());
            }
            cells[j][j] = vec![format!("-({})", outflows.join(" + "))];
        }
        let rows: Vec<String> = (0..n)
            .map(|i| {
                let entries: Vec<String> = (0..n)
                    .map(|j| {
                        if cells[i][j].is_empty() {
                            "0".to_string()
                        } else {
                            cells[i][j].join(" + ")
                        }
                    })
                    .collect();
                format!("    [{}]", entries.join(", "))
            })
            .collect();
        format!("matrix([\n{}\n])", rows.join(",\n"))
    }

    fn term_text(&self, rate: super::rates::RateId, coeffs: &[CoeffFactor]) -> String {
        let expr = &self.exprs[rate.flat(self.spec.solutes.len())];
        let name = expr.name(&self.spec.solutes);
        let mut parts: Vec<String> = coeffs
            .iter()
            .map(|c| {
                let base = match c.kind {
                    CoeffKind::Q => self.layout.q_name(c.slot),
                    CoeffKind::R => self.layout.r_name(c.slot),
                };
                if c.exponent == 1 {
                    base
                } else {
                    format!("{}**{}", base, c.exponent)
                }
            })
            .collect();
        parts.push(name);
        parts.join(" * ")
    }
}

pub(crate) fn to_dmatrix(m: &Mat<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| *m.get(i, j))
}
