//! Backend-generic dense kernels
//!
//! The arbitrary-precision solve path cannot lean on nalgebra, so the three
//! steady-state methods are built from scratch over the [`Real`] scalar:
//! Householder QR, one-sided Jacobi SVD (whose sweep cap doubles as the
//! non-convergence signal), and shifted power iteration with deflation for
//! the dominant eigenpair. The same kernels instantiate at `f64` in tests to
//! cross-check the nalgebra path.

use crate::backend::Real;

/// Minimal row-major dense matrix.
#[derive(Clone, Debug)]
pub(crate) struct Mat<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Real> Mat<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Mat {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Mat::zeros(n, n);
        for i in 0..n {
            m.set(i, i, T::one());
        }
        m
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn transpose(&self) -> Mat<T> {
        let mut t = Mat::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j).clone());
            }
        }
        t
    }

    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows).map(|i| self.get(i, col).clone()).collect()
    }

    pub fn mul_vec(&self, x: &[T]) -> Vec<T> {
        let mut y = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut acc = T::zero();
            for j in 0..self.cols {
                acc = acc + self.get(i, j).clone() * x[j].clone();
            }
            y.push(acc);
        }
        y
    }

    /// Induced 1-norm: the largest absolute column sum.
    pub fn one_norm(&self) -> T {
        let mut best = T::zero();
        for j in 0..self.cols {
            let mut sum = T::zero();
            for i in 0..self.rows {
                sum = sum + self.get(i, j).abs();
            }
            if sum > best {
                best = sum;
            }
        }
        best
    }
}

pub(crate) fn dot<T: Real>(a: &[T], b: &[T]) -> T {
    let mut acc = T::zero();
    for (x, y) in a.iter().zip(b) {
        acc = acc + x.clone() * y.clone();
    }
    acc
}

pub(crate) fn norm2<T: Real>(v: &[T]) -> T {
    dot(v, v).sqrt()
}

/// Divide by the entry sum so occupancy probabilities sum to one.
pub(crate) fn normalize_by_sum<T: Real>(v: &mut [T]) {
    let mut sum = T::zero();
    for x in v.iter() {
        sum = sum + x.clone();
    }
    if !sum.is_zero() {
        for x in v.iter_mut() {
            *x = x.clone() / sum.clone();
        }
    }
}

/// Residuals of `m * x`: (sum of absolute values, sum of squares).
pub(crate) fn residual_sums<T: Real>(m: &Mat<T>, x: &[T]) -> (f64, f64) {
    let r = m.mul_vec(x);
    let mut abs_sum = T::zero();
    let mut sq_sum = T::zero();
    for e in &r {
        abs_sum = abs_sum + e.abs();
        sq_sum = sq_sum + e.clone() * e.clone();
    }
    (abs_sum.to_f64(), sq_sum.to_f64())
}

/// Householder QR factorization of a square matrix: `a = Q * R` with Q
/// orthogonal and R upper triangular.
pub(crate) fn householder_qr<T: Real>(a: &Mat<T>) -> (Mat<T>, Mat<T>) {
    let n = a.nrows();
    let mut r = a.clone();
    let mut q: Mat<T> = Mat::identity(n);

    for k in 0..n {
        let mut col_norm_sq = T::zero();
        for i in k..n {
            let e = r.get(i, k).clone();
            col_norm_sq = col_norm_sq + e.clone() * e;
        }
        let col_norm = col_norm_sq.sqrt();
        if col_norm.is_zero() {
            continue;
        }
        let alpha = if *r.get(k, k) >= T::zero() {
            -col_norm
        } else {
            col_norm
        };

        let mut v = vec![T::zero(); n];
        v[k] = r.get(k, k).clone() - alpha.clone();
        for i in (k + 1)..n {
            v[i] = r.get(i, k).clone();
        }
        let v_norm_sq = dot(&v[k..], &v[k..]);
        if v_norm_sq.is_zero() {
            continue;
        }
        let two = T::from_f64(2.0);

        // R <- H R on the trailing columns
        for j in k..n {
            let mut s = T::zero();
            for i in k..n {
                s = s + v[i].clone() * r.get(i, j).clone();
            }
            let f = two.clone() * s / v_norm_sq.clone();
            for i in k..n {
                let updated = r.get(i, j).clone() - f.clone() * v[i].clone();
                r.set(i, j, updated);
            }
        }
        // the reflection zeroes column k below the diagonal by construction
        r.set(k, k, alpha);
        for i in (k + 1)..n {
            r.set(i, k, T::zero());
        }

        // Q <- Q H
        for i in 0..n {
            let mut s = T::zero();
            for l in k..n {
                s = s + q.get(i, l).clone() * v[l].clone();
            }
            let f = two.clone() * s / v_norm_sq.clone();
            for l in k..n {
                let updated = q.get(i, l).clone() - f.clone() * v[l].clone();
                q.set(i, l, updated);
            }
        }
    }

    (q, r)
}

/// One-sided Jacobi SVD: orthogonalize the columns of `a` by plane
/// rotations, accumulating the right singular vectors in V. Returns the
/// singular values (unordered) and V, or `None` when the sweep cap is
/// reached before a rotation-free sweep — the explicit non-convergence
/// signal the solver reports.
pub(crate) fn jacobi_svd<T: Real>(
    a: &Mat<T>,
    tol: &T,
    max_sweeps: usize,
) -> Option<(Vec<T>, Mat<T>)> {
    let n = a.nrows();
    let mut work = a.clone();
    let mut v: Mat<T> = Mat::identity(n);
    let mut converged = false;

    for _ in 0..max_sweeps {
        let mut rotated = false;
        for p in 0..n {
            for q_col in (p + 1)..n {
                let mut app = T::zero();
                let mut aqq = T::zero();
                let mut apq = T::zero();
                for i in 0..n {
                    let ep = work.get(i, p).clone();
                    let eq = work.get(i, q_col).clone();
                    app = app + ep.clone() * ep.clone();
                    aqq = aqq + eq.clone() * eq.clone();
                    apq = apq + ep * eq;
                }
                if app.is_zero() || aqq.is_zero() {
                    continue;
                }
                let gate = tol.clone() * (app.clone() * aqq.clone()).sqrt();
                if apq.abs() <= gate {
                    continue;
                }
                rotated = true;

                let tau = (aqq - app) / (T::from_f64(2.0) * apq.clone());
                let t_mag = T::one() / (tau.abs() + (T::one() + tau.clone() * tau.clone()).sqrt());
                let t = if tau >= T::zero() { t_mag } else { -t_mag };
                let c = T::one() / (T::one() + t.clone() * t.clone()).sqrt();
                let s = c.clone() * t;

                for i in 0..n {
                    let wp = work.get(i, p).clone();
                    let wq = work.get(i, q_col).clone();
                    work.set(i, p, c.clone() * wp.clone() - s.clone() * wq.clone());
                    work.set(i, q_col, s.clone() * wp + c.clone() * wq);

                    let vp = v.get(i, p).clone();
                    let vq = v.get(i, q_col).clone();
                    v.set(i, p, c.clone() * vp.clone() - s.clone() * vq.clone());
                    v.set(i, q_col, s.clone() * vp + c.clone() * vq);
                }
            }
        }
        if !rotated {
            converged = true;
            break;
        }
    }

    if !converged {
        return None;
    }
    let sigmas: Vec<T> = (0..n).map(|j| norm2(&work.column(j))).collect();
    Some((sigmas, v))
}

/// Dominant eigenpair of a column-generator matrix by shifted power
/// iteration, plus the subdominant eigenvalue by deflation.
///
/// With `shift = 2 * max |diag|`, `B = m + shift * I` is elementwise
/// nonnegative and — by the Gershgorin bound on a generator's spectrum —
/// every eigenvalue of B has nonnegative real part, so for a real spectrum
/// modulus order equals algebraic order and the iterations select the two
/// largest-real-part eigenvalues.
/// The Perron vector of B is the null vector of `m`, and the all-ones vector
/// is its exact left eigenvector (columns of a generator sum to zero), which
/// makes the deflation step exact. The subdominant estimate is a Rayleigh
/// quotient and stays a diagnostic: if the subdominant pair is complex the
/// iteration is truncated at the cap.
pub(crate) fn dominant_pair<T: Real>(
    m: &Mat<T>,
    tol: &T,
    max_iters: usize,
) -> (Vec<T>, f64, f64) {
    let n = m.nrows();
    let mut largest_diag = T::zero();
    for i in 0..n {
        let d = m.get(i, i).abs();
        if d > largest_diag {
            largest_diag = d;
        }
    }
    let shift = T::from_f64(2.0) * largest_diag;

    let shifted_mul = |x: &[T]| -> Vec<T> {
        let mut y = m.mul_vec(x);
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi = yi.clone() + shift.clone() * xi.clone();
        }
        y
    };

    // Perron iteration from the uniform positive vector
    let mut x = vec![T::from_f64(1.0 / n as f64); n];
    for _ in 0..max_iters {
        let mut y = shifted_mul(&x);
        let norm = norm2(&y);
        if norm.is_zero() {
            break;
        }
        for yi in y.iter_mut() {
            *yi = yi.clone() / norm.clone();
        }
        let mut delta = T::zero();
        for (yi, xi) in y.iter().zip(&x) {
            let d = (yi.clone() - xi.clone()).abs();
            if d > delta {
                delta = d;
            }
        }
        x = y;
        if delta < *tol {
            break;
        }
    }
    let ax = m.mul_vec(&x);
    let dominant = (dot(&x, &ax) / dot(&x, &x)).to_f64();

    // deflate against the exact left null vector (all ones)
    let mut v_sum = T::zero();
    for xi in &x {
        v_sum = v_sum + xi.clone();
    }
    let shift_total = shift.clone() + T::from_f64(dominant);
    let mut z: Vec<T> = (0..n)
        .map(|i| {
            if i % 2 == 0 {
                T::from_f64(1.0)
            } else {
                T::from_f64(-1.0)
            }
        })
        .collect();
    // Convergence is judged on the Rayleigh estimate, not the vector: a
    // complex or sign-flipping subdominant pair never settles elementwise.
    let mut subdominant_total = T::zero();
    for _ in 0..max_iters {
        let mut w = shifted_mul(&z);
        let mut z_sum = T::zero();
        for zi in &z {
            z_sum = z_sum + zi.clone();
        }
        let scale = shift_total.clone() * z_sum / v_sum.clone();
        for (wi, xi) in w.iter_mut().zip(&x) {
            *wi = wi.clone() - scale.clone() * xi.clone();
        }
        let norm = norm2(&w);
        if norm.is_zero() {
            break;
        }
        for wi in w.iter_mut() {
            *wi = wi.clone() / norm.clone();
        }
        let bw = shifted_mul(&w);
        let estimate = dot(&w, &bw) / dot(&w, &w);
        let delta = (estimate.clone() - subdominant_total.clone()).abs();
        let settled = delta < tol.clone() * (estimate.abs() + T::one());
        subdominant_total = estimate;
        z = w;
        if settled {
            break;
        }
    }
    let subdominant = (subdominant_total - shift).to_f64();

    (x, dominant, subdominant)
}
