//! Transport and current aggregation
//!
//! Folds a steady-state vector back through the rate tables: the net flux of
//! a solute over a barrier is the probability-weighted sum of inward moves
//! minus the outward ones (inward positive). At a true steady state the net
//! flux is identical across every barrier of the pore; the per-solute
//! max-minus-min spread is reported as a convergence diagnostic.

use std::collections::HashMap;

use crate::backend::Real;
use crate::model::compile::{CoeffValues, CompiledModel};
use crate::model::rates::{RateTable, AMPS_TO_PICOAMPS, ELEMENTARY_CHARGE};

/// Per-solute per-barrier transport plus the derived current diagnostics.
#[derive(Clone, Debug)]
pub(crate) struct TransportSummary {
    /// Net inward flux per solute per barrier, ions/s.
    pub transport: HashMap<String, Vec<f64>>,
    /// Max minus min flux across barriers, per solute.
    pub transport_errors: HashMap<String, f64>,
    /// Current per barrier, pA.
    pub current: Vec<f64>,
}

pub(crate) fn aggregate<T: Real>(
    model: &CompiledModel,
    rates: &RateTable<T>,
    coeffs: &CoeffValues<T>,
    steady: &[T],
) -> TransportSummary {
    let spec = model.spec();
    let space = model.space();
    let num_barriers = spec.num_barriers();

    let mut transport: HashMap<String, Vec<f64>> = HashMap::new();
    let mut transport_errors: HashMap<String, f64> = HashMap::new();

    for (ion, name) in spec.solutes.iter().enumerate() {
        let mut per_barrier = Vec::with_capacity(num_barriers);
        for barrier in 0..num_barriers {
            let mut net = T::zero();
            for term in space.inward.terms(barrier, ion) {
                let rate = rates.get(term.rate).clone() * coeffs.factor(&term.coeffs);
                net = net + rate * steady[term.state].clone();
            }
            for term in space.outward.terms(barrier, ion) {
                let rate = rates.get(term.rate).clone() * coeffs.factor(&term.coeffs);
                net = net - rate * steady[term.state].clone();
            }
            per_barrier.push(net.to_f64());
        }
        let max = per_barrier.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = per_barrier.iter().cloned().fold(f64::INFINITY, f64::min);
        transport_errors.insert(name.clone(), max - min);
        transport.insert(name.clone(), per_barrier);
    }

    let mut current = vec![0.0; num_barriers];
    for (ion, name) in spec.solutes.iter().enumerate() {
        let charge = spec.charges[ion] as f64;
        for (barrier, value) in current.iter_mut().enumerate() {
            *value += charge * ELEMENTARY_CHARGE * AMPS_TO_PICOAMPS * transport[name][barrier];
        }
    }

    TransportSummary {
        transport,
        transport_errors,
        current,
    }
}
