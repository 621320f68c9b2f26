//! Voltage-sweep driver
//!
//! Iterates an immutable compiled model over an ordered list of voltages:
//! per point, a fresh numeric transition matrix is built, all three
//! steady-state methods run, and transport/current are aggregated into one
//! [`Results`] record per method. No state carries over between voltages, so
//! [`VoltageSweep::run_par`] can fan the points out across threads without
//! changing semantics.

use rayon::prelude::*;
use tracing::{info, trace, warn};

use crate::backend::multi::{self, Mpf};
use crate::backend::Real;
use crate::error::ChannelsolError;
use crate::model::compile::{to_dmatrix, CoeffValues, CompiledModel};
use crate::model::rates::RateTable;
use crate::model::{Conditions, NumericBackend};
use crate::solver::{
    self, MatrixDiagnostics, MethodOutcome, MethodSolution, MethodStatus, Results, SolveMethod,
    VoltageSolve,
};
use crate::transport;

/// Results of a sweep: three parallel lists, one per solution method,
/// indexed by voltage order.
#[derive(Clone, Debug)]
pub struct SweepResults {
    pub eigen: Vec<Results>,
    pub svd: Vec<Results>,
    pub qr: Vec<Results>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.eigen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigen.is_empty()
    }
}

struct PointResults {
    eigen: Results,
    svd: Results,
    qr: Results,
}

/// A configured sweep over one compiled model.
pub struct VoltageSweep<'a> {
    model: &'a CompiledModel,
    conditions: &'a Conditions,
    voltages: Vec<f64>,
}

impl<'a> VoltageSweep<'a> {
    /// Validate the conditions against the model topology and set up the
    /// sweep. All configuration errors surface here, before any voltage is
    /// processed.
    pub fn new(
        model: &'a CompiledModel,
        conditions: &'a Conditions,
        voltages: Vec<f64>,
    ) -> Result<Self, ChannelsolError> {
        model.check_conditions(conditions)?;
        Ok(VoltageSweep {
            model,
            conditions,
            voltages,
        })
    }

    pub fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    /// Run the sweep sequentially, in voltage order.
    pub fn run(&self) -> SweepResults {
        self.prepare_backend();
        info!(
            points = self.voltages.len(),
            states = self.model.num_states(),
            backend = %self.model.spec().backend,
            "starting voltage sweep"
        );
        let points = self
            .voltages
            .iter()
            .map(|&v| self.solve_point(v))
            .collect();
        into_lists(points)
    }

    /// Run the sweep with voltage points distributed across threads.
    ///
    /// Each point's computation is a pure function of the immutable model
    /// and its voltage, so the result lists are identical to [`run`](Self::run).
    pub fn run_par(&self) -> SweepResults {
        self.prepare_backend();
        info!(
            points = self.voltages.len(),
            states = self.model.num_states(),
            backend = %self.model.spec().backend,
            "starting parallel voltage sweep"
        );
        let points = self
            .voltages
            .par_iter()
            .map(|&v| self.solve_point(v))
            .collect();
        into_lists(points)
    }

    fn prepare_backend(&self) {
        if self.model.spec().backend == NumericBackend::MultiPrecision {
            multi::set_decimal_digits(self.model.spec().precision_digits);
        }
    }

    fn solve_point(&self, voltage: f64) -> PointResults {
        trace!(voltage, "building transition matrix");
        match self.model.spec().backend {
            NumericBackend::Double => {
                let rates = self.model.rate_table::<f64>(self.conditions, voltage);
                let coeffs = self.model.coeff_values::<f64>(self.conditions);
                let matrix = self.model.numeric_matrix(&rates, &coeffs);
                let solve = solver::double::solve(&to_dmatrix(&matrix));
                self.assemble(voltage, solve, &rates, &coeffs)
            }
            NumericBackend::MultiPrecision => {
                let rates = self.model.rate_table::<Mpf>(self.conditions, voltage);
                let coeffs = self.model.coeff_values::<Mpf>(self.conditions);
                let matrix = self.model.numeric_matrix(&rates, &coeffs);
                let digits = self.model.spec().precision_digits as i32;
                let tol = Mpf::from_f64(0.1).powi((digits - 5).max(10));
                let solve = solver::solve_generic(&matrix, &tol);
                self.assemble(voltage, solve, &rates, &coeffs)
            }
        }
    }

    fn assemble<T: Real>(
        &self,
        voltage: f64,
        solve: VoltageSolve<T>,
        rates: &RateTable<T>,
        coeffs: &CoeffValues<T>,
    ) -> PointResults {
        let eigen = self.results_for(
            voltage,
            SolveMethod::Eigen,
            MethodStatus::Converged,
            &solve.matrix,
            &solve.eigen,
            rates,
            coeffs,
        );
        let svd = match &solve.svd {
            MethodOutcome::Solved(solution) => self.results_for(
                voltage,
                SolveMethod::Svd,
                MethodStatus::Converged,
                &solve.matrix,
                solution,
                rates,
                coeffs,
            ),
            MethodOutcome::FailedToConverge => {
                warn!(voltage, "svd did not converge; reporting the eigen result in its slot");
                self.results_for(
                    voltage,
                    SolveMethod::Svd,
                    MethodStatus::Substituted {
                        failed: SolveMethod::Svd,
                    },
                    &solve.matrix,
                    &solve.eigen,
                    rates,
                    coeffs,
                )
            }
        };
        let qr = self.results_for(
            voltage,
            SolveMethod::Qr,
            MethodStatus::Converged,
            &solve.matrix,
            &solve.qr,
            rates,
            coeffs,
        );
        PointResults { eigen, svd, qr }
    }

    #[allow(clippy::too_many_arguments)]
    fn results_for<T: Real>(
        &self,
        voltage: f64,
        method: SolveMethod,
        status: MethodStatus,
        matrix: &MatrixDiagnostics,
        solution: &MethodSolution<T>,
        rates: &RateTable<T>,
        coeffs: &CoeffValues<T>,
    ) -> Results {
        let summary = transport::aggregate(self.model, rates, coeffs, &solution.steady_state);
        Results {
            voltage,
            method,
            status,
            matrix: *matrix,
            steady_state: solution.steady_state.iter().map(Real::to_f64).collect(),
            transport: summary.transport,
            transport_errors: summary.transport_errors,
            current: summary.current,
            solver: solution.diagnostics,
        }
    }
}

fn into_lists(points: Vec<PointResults>) -> SweepResults {
    let mut results = SweepResults {
        eigen: Vec::with_capacity(points.len()),
        svd: Vec::with_capacity(points.len()),
        qr: Vec::with_capacity(points.len()),
    };
    for p in points {
        results.eigen.push(p.eigen);
        results.svd.push(p.svd);
        results.qr.push(p.qr);
    }
    results
}
