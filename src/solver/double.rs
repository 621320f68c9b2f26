//! Double-precision steady-state methods
//!
//! nalgebra kernels specialized to `f64`: eigenvalues through the Schur
//! form with the selected eigenvector recovered by shifted inverse
//! iteration, SVD with a finite iteration budget (so non-convergence is an
//! observable outcome, not a panic), and QR of the transpose.

use std::time::Instant;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::{MatrixDiagnostics, MethodOutcome, MethodSolution, SolverDiagnostics, VoltageSolve};

/// Per-dimension iteration budget handed to the SVD; exceeding the total is
/// the per-voltage soft failure the sweep driver substitutes around.
const SVD_ITERATIONS_PER_DIMENSION: usize = 30;

const INVERSE_ITERATIONS: usize = 5;

pub(crate) fn solve(matrix: &DMatrix<f64>) -> VoltageSolve<f64> {
    let started = Instant::now();
    let eigen = eigen_method(matrix);
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "eigen steady state");

    let started = Instant::now();
    let budget = SVD_ITERATIONS_PER_DIMENSION * matrix.nrows().max(10);
    let svd_attempt = matrix.clone().try_svd(true, true, f64::EPSILON, budget);
    let (condition_number, svd) = match svd_attempt {
        Some(decomposition) => {
            let values = &decomposition.singular_values;
            let (min_idx, second_min) = two_smallest(values.as_slice());
            let largest = values.iter().cloned().fold(0.0_f64, f64::max);
            let condition = if values[min_idx] > 0.0 {
                largest / values[min_idx]
            } else {
                f64::INFINITY
            };
            let outcome = match &decomposition.v_t {
                Some(v_t) => {
                    let mut steady: Vec<f64> = v_t.row(min_idx).iter().copied().collect();
                    normalize_by_sum(&mut steady);
                    let (abs_sum, sq_sum) = residuals(matrix, &steady);
                    MethodOutcome::Solved(MethodSolution {
                        steady_state: steady,
                        diagnostics: SolverDiagnostics {
                            primary: values[min_idx],
                            secondary: second_min,
                            residual_abs_sum: abs_sum,
                            residual_sq_sum: sq_sum,
                        },
                    })
                }
                None => MethodOutcome::FailedToConverge,
            };
            (condition, outcome)
        }
        None => (f64::INFINITY, MethodOutcome::FailedToConverge),
    };
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "svd steady state");

    let started = Instant::now();
    let qr = qr_method(matrix);
    debug!(elapsed_us = started.elapsed().as_micros() as u64, "qr steady state");

    let matrix_diagnostics = element_diagnostics(matrix, condition_number);

    VoltageSolve {
        eigen,
        svd,
        qr,
        matrix: matrix_diagnostics,
    }
}

fn element_diagnostics(matrix: &DMatrix<f64>, condition_number: f64) -> MatrixDiagnostics {
    let mut largest = 0.0_f64;
    let mut smallest = f64::INFINITY;
    for &e in matrix.iter() {
        let a = e.abs();
        if a > 0.0 {
            largest = largest.max(a);
            smallest = smallest.min(a);
        }
    }
    if !smallest.is_finite() {
        smallest = 0.0;
    }
    MatrixDiagnostics {
        largest_element: largest,
        smallest_element: smallest,
        condition_number,
    }
}

/// Eigenvector of the eigenvalue with the largest real part.
///
/// For a valid generator that eigenvalue is numerically ~0 and the only
/// non-negative one; the gap to the runner-up is the separation diagnostic.
/// The eigenvector is recovered by inverse iteration against a minutely
/// offset shift, restarting with a larger offset if the shifted matrix
/// factors as exactly singular.
fn eigen_method(matrix: &DMatrix<f64>) -> MethodSolution<f64> {
    let n = matrix.nrows();
    let eigenvalues = matrix.clone().complex_eigenvalues();
    let mut reals: Vec<f64> = eigenvalues.iter().map(|c| c.re).collect();
    reals.sort_by(|a, b| b.total_cmp(a));
    let dominant = reals[0];
    let subdominant = if n > 1 { reals[1] } else { reals[0] };

    let mut steady = DVector::from_element(n, 1.0 / n as f64);
    let mut offset = (dominant.abs() + 1.0) * 1.0e-14;
    for _ in 0..4 {
        let mut shifted = matrix.clone();
        for i in 0..n {
            shifted[(i, i)] -= dominant + offset;
        }
        let lu = shifted.lu();
        let mut x = steady.clone();
        let mut advanced = false;
        for _ in 0..INVERSE_ITERATIONS {
            match lu.solve(&x) {
                Some(y) => {
                    let norm = y.norm();
                    if norm == 0.0 {
                        break;
                    }
                    x = y / norm;
                    advanced = true;
                }
                None => break,
            }
        }
        if advanced {
            steady = x;
            break;
        }
        offset *= 1.0e3;
    }

    let mut steady: Vec<f64> = steady.iter().copied().collect();
    normalize_by_sum(&mut steady);
    let (abs_sum, sq_sum) = residuals(matrix, &steady);
    MethodSolution {
        steady_state: steady,
        diagnostics: SolverDiagnostics {
            primary: dominant,
            secondary: subdominant,
            residual_abs_sum: abs_sum,
            residual_sq_sum: sq_sum,
        },
    }
}

/// QR of the transpose; the last column of Q spans the direction orthogonal
/// to the row space, i.e. the null-space candidate under the column-sum-zero
/// convention. The two smallest-magnitude trailing R diagonals are the
/// rank-deficiency diagnostics.
fn qr_method(matrix: &DMatrix<f64>) -> MethodSolution<f64> {
    let n = matrix.nrows();
    let qr = matrix.transpose().qr();
    let q = qr.q();
    let r = qr.r();

    let mut steady: Vec<f64> = q.column(n - 1).iter().copied().collect();
    normalize_by_sum(&mut steady);
    let primary = r[(n - 1, n - 1)].abs();
    let secondary = if n >= 2 { r[(n - 2, n - 2)].abs() } else { primary };
    let (abs_sum, sq_sum) = residuals(matrix, &steady);
    MethodSolution {
        steady_state: steady,
        diagnostics: SolverDiagnostics {
            primary,
            secondary,
            residual_abs_sum: abs_sum,
            residual_sq_sum: sq_sum,
        },
    }
}

fn normalize_by_sum(v: &mut [f64]) {
    let sum: f64 = v.iter().sum();
    if sum != 0.0 {
        for e in v.iter_mut() {
            *e /= sum;
        }
    }
}

fn residuals(matrix: &DMatrix<f64>, steady: &[f64]) -> (f64, f64) {
    let x = DVector::from_column_slice(steady);
    let r = matrix * x;
    let abs_sum = r.iter().map(|e| e.abs()).sum();
    let sq_sum = r.iter().map(|e| e * e).sum();
    (abs_sum, sq_sum)
}

/// (index of the smallest value, the second-smallest value).
fn two_smallest(values: &[f64]) -> (usize, f64) {
    let mut min_idx = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[min_idx] {
            min_idx = i;
        }
    }
    let mut second = f64::INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if i != min_idx && v < second {
            second = v;
        }
    }
    if !second.is_finite() {
        second = values[min_idx];
    }
    (min_idx, second)
}
