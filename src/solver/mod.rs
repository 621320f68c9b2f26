//! Steady-state solution of the transition matrix
//!
//! Three independently implemented methods run for every voltage — dominant
//! eigenvector, SVD null space, and QR null space — as cross-validation, not
//! as a first-success chain. Each method reports the eigenvalue/singular-
//! value pair it used as a convergence proxy plus the residuals of
//! `matrix * steady_state`; none of the diagnostics is used to discard a
//! result. The SVD is the one method with a genuine failure mode (iteration
//! budget exhausted on an ill-conditioned matrix); that failure is an
//! explicit per-voltage outcome, never a panic.

pub(crate) mod dense;
pub(crate) mod double;

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Real;

use dense::{
    dominant_pair, householder_qr, jacobi_svd, normalize_by_sum, residual_sums, Mat,
};

/// Jacobi sweep budget for the generic SVD; reaching it without a clean
/// sweep is the non-convergence signal.
const SVD_MAX_SWEEPS: usize = 30;

/// Iteration budget for the shifted power/deflation eigen iterations.
const POWER_MAX_ITERATIONS: usize = 2000;

/// Which of the three steady-state methods produced a record.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveMethod {
    Eigen,
    Svd,
    Qr,
}

impl std::fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMethod::Eigen => write!(f, "eigen"),
            SolveMethod::Svd => write!(f, "svd"),
            SolveMethod::Qr => write!(f, "qr"),
        }
    }
}

/// Whether a result slot holds the method's own answer or a substitute.
///
/// A method that fails to converge at one voltage produces no usable vector;
/// the sweep driver fills its slot with the eigen method's answer and marks
/// the substitution here, so a failed method is never silently overwritten.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MethodStatus {
    Converged,
    Substituted { failed: SolveMethod },
}

/// Scale and conditioning of one numeric transition matrix.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MatrixDiagnostics {
    /// Largest nonzero magnitude entry.
    pub largest_element: f64,
    /// Smallest nonzero magnitude entry.
    pub smallest_element: f64,
    /// 2-norm condition number on the double backend (infinite when the SVD
    /// fails); the 1-norm scale proxy on the arbitrary-precision backend,
    /// where the exactly singular generator makes a singular-value ratio
    /// meaningless.
    pub condition_number: f64,
}

/// Per-method convergence proxies and residuals.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SolverDiagnostics {
    /// The value tied to the null direction: largest real eigenvalue (eigen),
    /// smallest singular value (SVD), or trailing R diagonal (QR). Near zero
    /// for a trustworthy solve.
    pub primary: f64,
    /// The runner-up of the same quantity; its separation from `primary`
    /// indicates how well-isolated the null space is.
    pub secondary: f64,
    /// Sum of `|r_i|` for `r = matrix * steady_state`.
    pub residual_abs_sum: f64,
    /// Sum of `r_i^2`.
    pub residual_sq_sum: f64,
}

/// One steady-state record: one voltage, one method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Results {
    /// Applied voltage, mV.
    pub voltage: f64,
    pub method: SolveMethod,
    pub status: MethodStatus,
    pub matrix: MatrixDiagnostics,
    /// Occupancy probability per channel state, in state-discovery order;
    /// sums to 1.
    pub steady_state: Vec<f64>,
    /// Net inward transport per solute per barrier, ions/s.
    pub transport: HashMap<String, Vec<f64>>,
    /// Max minus min transport across barriers per solute; at a converged
    /// steady state flux is conserved along the pore, so a large spread
    /// flags a poor solution.
    pub transport_errors: HashMap<String, f64>,
    /// Current per barrier, pA.
    pub current: Vec<f64>,
    pub solver: SolverDiagnostics,
}

/// One method's raw answer for one voltage.
#[derive(Clone, Debug)]
pub(crate) struct MethodSolution<T> {
    pub steady_state: Vec<T>,
    pub diagnostics: SolverDiagnostics,
}

#[derive(Clone, Debug)]
pub(crate) enum MethodOutcome<T> {
    Solved(MethodSolution<T>),
    FailedToConverge,
}

/// All three methods plus the matrix diagnostics for one voltage.
#[derive(Clone, Debug)]
pub(crate) struct VoltageSolve<T> {
    pub eigen: MethodSolution<T>,
    pub svd: MethodOutcome<T>,
    pub qr: MethodSolution<T>,
    pub matrix: MatrixDiagnostics,
}

/// Backend-generic solve used by the arbitrary-precision path (and by tests
/// to cross-check the nalgebra kernels at `f64`).
pub(crate) fn solve_generic<T: Real>(matrix: &Mat<T>, tol: &T) -> VoltageSolve<T> {
    let n = matrix.nrows();

    let started = Instant::now();
    let (mut perron, dominant, subdominant) = dominant_pair(matrix, tol, POWER_MAX_ITERATIONS);
    normalize_by_sum(&mut perron);
    let (abs_sum, sq_sum) = residual_sums(matrix, &perron);
    let eigen = MethodSolution {
        steady_state: perron,
        diagnostics: SolverDiagnostics {
            primary: dominant,
            secondary: subdominant,
            residual_abs_sum: abs_sum,
            residual_sq_sum: sq_sum,
        },
    };
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "eigen steady state");

    let started = Instant::now();
    let svd = match jacobi_svd(matrix, tol, SVD_MAX_SWEEPS) {
        Some((sigmas, v)) => {
            let mut min_idx = 0;
            for (i, s) in sigmas.iter().enumerate() {
                if *s < sigmas[min_idx] {
                    min_idx = i;
                }
            }
            let mut second: Option<&T> = None;
            for (i, s) in sigmas.iter().enumerate() {
                if i != min_idx && second.map_or(true, |b| s < b) {
                    second = Some(s);
                }
            }
            let mut steady = v.column(min_idx);
            normalize_by_sum(&mut steady);
            let (abs_sum, sq_sum) = residual_sums(matrix, &steady);
            MethodOutcome::Solved(MethodSolution {
                steady_state: steady,
                diagnostics: SolverDiagnostics {
                    primary: sigmas[min_idx].to_f64(),
                    secondary: second.map_or(sigmas[min_idx].to_f64(), Real::to_f64),
                    residual_abs_sum: abs_sum,
                    residual_sq_sum: sq_sum,
                },
            })
        }
        None => MethodOutcome::FailedToConverge,
    };
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "svd steady state");

    let started = Instant::now();
    let (q, r) = householder_qr(&matrix.transpose());
    let mut steady = q.column(n - 1);
    normalize_by_sum(&mut steady);
    let (abs_sum, sq_sum) = residual_sums(matrix, &steady);
    let primary = r.get(n - 1, n - 1).abs().to_f64();
    let secondary = if n >= 2 {
        r.get(n - 2, n - 2).abs().to_f64()
    } else {
        primary
    };
    let qr_solution = MethodSolution {
        steady_state: steady,
        diagnostics: SolverDiagnostics {
            primary,
            secondary,
            residual_abs_sum: abs_sum,
            residual_sq_sum: sq_sum,
        },
    };
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "qr steady state");

    let mut largest = 0.0_f64;
    let mut smallest = f64::INFINITY;
    for i in 0..n {
        for j in 0..n {
            let a = matrix.get(i, j).abs().to_f64();
            if a > 0.0 {
                largest = largest.max(a);
                smallest = smallest.min(a);
            }
        }
    }
    if !smallest.is_finite() {
        smallest = 0.0;
    }
    let matrix_diagnostics = MatrixDiagnostics {
        largest_element: largest,
        smallest_element: smallest,
        condition_number: matrix.one_norm().to_f64(),
    };

    VoltageSolve {
        eigen,
        svd,
        qr: qr_solution,
        matrix: matrix_diagnostics,
    }
}
