//! Damped least squares (Levenberg-Marquardt) over a residual closure.
//!
//! The solver minimizes `|r(p)|^2` for a caller-supplied residual function,
//! with box bounds enforced by projecting each proposed step back into the
//! feasible region.
//!
//! Implementation notes:
//!
//! - The Jacobian is a forward-difference approximation with per-parameter
//!   steps of `sqrt(eps) * max(|p|, 1)`; a step that would leave the upper
//!   bound flips to a backward difference.
//! - Damping uses Marquardt scaling (`J^T J + lambda * diag(J^T J)`), so the
//!   step stays sensible when parameters differ by orders of magnitude.
//! - The damped normal equations are solved by LU; a singular system raises
//!   the damping instead of failing the whole fit.
//! - Convergence is declared on a small gradient or a relative cost
//!   reduction below `ftol`; a step that leaves the cost exactly unchanged
//!   (plateau, or a step clipped entirely by a bound) counts as a zero
//!   reduction and converges. Exhausting the damping range or the iteration
//!   cap returns the best point found with `converged = false`: callers
//!   keep the partial result.

use nalgebra::{DMatrix, DVector};

/// Solver knobs. The defaults suit interactive fits of a few parameters
/// over 10^2..10^5 points.
#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative cost-reduction threshold for convergence.
    pub ftol: f64,
    /// Gradient infinity-norm threshold for convergence.
    pub gtol: f64,
    pub lambda_init: f64,
    /// Damping ceiling; crossing it means no acceptable step exists.
    pub lambda_max: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            gtol: 1e-12,
            lambda_init: 1e-3,
            lambda_max: 1e12,
        }
    }
}

/// Result of one solver run. Always populated, converged or not.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    pub sse: f64,
    /// Parameter covariance `sse/(n-k) * (J^T J)^{-1}` at the solution;
    /// `None` when `n <= k` or the normal matrix is singular.
    pub covariance: Option<DMatrix<f64>>,
    pub converged: bool,
    pub iterations: usize,
}

/// Minimize `|residuals(p)|^2` starting from `init`, keeping each parameter
/// inside `[lower[i], upper[i]]` (infinities for open ends).
///
/// # Panics
/// Panics if `init`, `lower`, and `upper` differ in length. The caller (the
/// fit engine) assembles them from one parameter list.
pub fn levenberg_marquardt<F>(
    residuals: F,
    init: &[f64],
    lower: &[f64],
    upper: &[f64],
    opts: &LmOptions,
) -> LmOutcome
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    assert_eq!(init.len(), lower.len());
    assert_eq!(init.len(), upper.len());
    let k = init.len();

    let clamp = |p: &mut [f64]| {
        for j in 0..k {
            p[j] = p[j].clamp(lower[j], upper[j]);
        }
    };

    let mut p: Vec<f64> = init.to_vec();
    clamp(&mut p);

    let mut r = DVector::from_vec(residuals(&p));
    let n = r.len();
    let mut sse = r.norm_squared();

    if !sse.is_finite() {
        return LmOutcome {
            params: p,
            sse,
            covariance: None,
            converged: false,
            iterations: 0,
        };
    }

    let mut lambda = opts.lambda_init;
    let mut converged = false;
    let mut iterations = 0;

    'outer: for iter in 0..opts.max_iterations {
        iterations = iter + 1;

        let jac = match numeric_jacobian(&residuals, &p, &r, lower, upper) {
            Some(j) => j,
            None => break,
        };

        let a = jac.transpose() * &jac;
        let g = jac.transpose() * &r;

        if g.amax() <= opts.gtol {
            converged = true;
            break;
        }

        // Raise the damping until a step actually reduces the cost.
        loop {
            let mut damped = a.clone();
            for j in 0..k {
                let d = a[(j, j)].max(1e-12);
                damped[(j, j)] = a[(j, j)] + lambda * d;
            }

            let delta = match damped.lu().solve(&(-&g)) {
                Some(d) => d,
                None => {
                    lambda *= 10.0;
                    if lambda > opts.lambda_max {
                        break 'outer;
                    }
                    continue;
                }
            };

            let mut p_trial = p.clone();
            for j in 0..k {
                p_trial[j] += delta[j];
            }
            clamp(&mut p_trial);

            let r_trial = DVector::from_vec(residuals(&p_trial));
            let sse_trial = r_trial.norm_squared();

            if sse_trial.is_finite() && sse_trial <= sse {
                let reduction = sse - sse_trial;
                p = p_trial;
                r = r_trial;
                sse = sse_trial;
                lambda = (lambda * 0.1).max(1e-12);
                if reduction <= opts.ftol * sse.max(f64::MIN_POSITIVE) {
                    converged = true;
                    break 'outer;
                }
                break;
            }

            lambda *= 10.0;
            if lambda > opts.lambda_max {
                break 'outer;
            }
        }
    }

    let covariance = covariance_at(&residuals, &p, &r, lower, upper, sse, n, k);

    LmOutcome {
        params: p,
        sse,
        covariance,
        converged,
        iterations,
    }
}

/// Forward-difference Jacobian of the residual vector; `None` when any entry
/// comes out non-finite.
fn numeric_jacobian<F>(
    residuals: &F,
    p: &[f64],
    r0: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = r0.len();
    let k = p.len();
    let mut jac = DMatrix::zeros(n, k);

    for j in 0..k {
        let mut h = f64::EPSILON.sqrt() * p[j].abs().max(1.0);
        // Step inside the box: fall back to a backward difference at the
        // upper bound.
        if p[j] + h > upper[j] {
            h = -h;
            if p[j] + h < lower[j] {
                return None;
            }
        }

        let mut p_h = p.to_vec();
        p_h[j] += h;
        let r_h = residuals(&p_h);
        if r_h.len() != n {
            return None;
        }

        for i in 0..n {
            let d = (r_h[i] - r0[i]) / h;
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
    }

    Some(jac)
}

#[allow(clippy::too_many_arguments)]
fn covariance_at<F>(
    residuals: &F,
    p: &[f64],
    r: &DVector<f64>,
    lower: &[f64],
    upper: &[f64],
    sse: f64,
    n: usize,
    k: usize,
) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    if n <= k || !sse.is_finite() {
        return None;
    }
    let jac = numeric_jacobian(residuals, p, r, lower, upper)?;
    let a = jac.transpose() * &jac;
    let inv = a.try_inverse()?;
    let sigma2 = sse / (n - k) as f64;
    Some(inv * sigma2)
}
