//! The fit engine: nonlinear least squares over a slice region.

use tracing::debug;

use crate::domain::{FitResult, FitSpec, FittedParam, Slice};
use crate::error::FitError;
use crate::math::{LmOptions, levenberg_marquardt};
use crate::models::{ModelEntry, ModelRegistry};

/// Fit `spec` to `slice` with default solver options.
pub fn fit(slice: &Slice, spec: &FitSpec, registry: &ModelRegistry) -> Result<FitResult, FitError> {
    fit_with(slice, spec, registry, &LmOptions::default())
}

/// Fit with explicit solver options.
///
/// Points outside `[spec.x_min, spec.x_max]` and points with a NaN x or y
/// are excluded before anything else, so they can never influence the
/// result. Non-convergence is not an error: the returned result carries
/// `converged = false` and the best parameters found.
pub fn fit_with(
    slice: &Slice,
    spec: &FitSpec,
    registry: &ModelRegistry,
    options: &LmOptions,
) -> Result<FitResult, FitError> {
    let entry = registry
        .get(&spec.model)
        .ok_or_else(|| FitError::UnknownModel {
            name: spec.model.clone(),
        })?;

    validate_spec(spec, entry)?;

    let (xs, ys) = restrict_region(&slice.x, &slice.y, spec.x_min, spec.x_max);
    if xs.is_empty() {
        return Err(FitError::EmptyRegion {
            x_min: spec.x_min,
            x_max: spec.x_max,
        });
    }

    // Initial values pulled inside their bounds; the solver keeps them there.
    let init_full: Vec<f64> = spec
        .params
        .iter()
        .map(|p| {
            let (lo, hi) = p.interval();
            p.init.clamp(lo, hi)
        })
        .collect();

    let free: Vec<usize> = spec
        .params
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.fixed)
        .map(|(i, _)| i)
        .collect();

    let (values, covariance, converged, iterations) = if free.is_empty() {
        // Nothing to optimize; evaluate as-is.
        (init_full.clone(), None, true, 0)
    } else {
        let assemble = |free_vals: &[f64]| -> Vec<f64> {
            let mut full = init_full.clone();
            for (slot, &idx) in free.iter().enumerate() {
                full[idx] = free_vals[slot];
            }
            full
        };

        let func = &*entry.func;
        let residuals = |free_vals: &[f64]| -> Vec<f64> {
            let full = assemble(free_vals);
            xs.iter()
                .zip(ys.iter())
                .map(|(&x, &y)| func(x, &full) - y)
                .collect()
        };

        let init_free: Vec<f64> = free.iter().map(|&i| init_full[i]).collect();
        let lower: Vec<f64> = free.iter().map(|&i| spec.params[i].interval().0).collect();
        let upper: Vec<f64> = free.iter().map(|&i| spec.params[i].interval().1).collect();

        let outcome = levenberg_marquardt(residuals, &init_free, &lower, &upper, options);
        debug!(
            model = %spec.model,
            converged = outcome.converged,
            iterations = outcome.iterations,
            sse = outcome.sse,
            "fit finished"
        );

        (
            assemble(&outcome.params),
            outcome.covariance,
            outcome.converged,
            outcome.iterations,
        )
    };

    let fitted = entry.eval(&xs, &values);
    let residuals: Vec<f64> = ys
        .iter()
        .zip(fitted.iter())
        .map(|(y, f)| y - f)
        .collect();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let rmse = (sse / xs.len() as f64).sqrt();

    // Standard errors: sqrt of the covariance diagonal for free parameters,
    // NaN for fixed ones and whenever the covariance is unavailable.
    let params: Vec<FittedParam> = spec
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let stderr = if p.fixed {
                f64::NAN
            } else {
                let slot = free.iter().position(|&f| f == i).expect("free by filter");
                match &covariance {
                    Some(cov) => {
                        let v = cov[(slot, slot)];
                        if v >= 0.0 { v.sqrt() } else { f64::NAN }
                    }
                    None => f64::NAN,
                }
            };
            FittedParam {
                name: p.name.clone(),
                value: values[i],
                stderr,
                fixed: p.fixed,
            }
        })
        .collect();

    Ok(FitResult {
        model: spec.model.clone(),
        params,
        x: xs,
        fitted,
        residuals,
        sse,
        rmse,
        converged,
        iterations,
    })
}

fn validate_spec(spec: &FitSpec, entry: &ModelEntry) -> Result<(), FitError> {
    if spec.params.len() != entry.defaults.len() {
        return Err(FitError::InvalidSpec {
            reason: format!(
                "model '{}' takes {} parameters, spec has {}",
                spec.model,
                entry.defaults.len(),
                spec.params.len()
            ),
        });
    }
    for p in &spec.params {
        if !p.init.is_finite() {
            return Err(FitError::InvalidSpec {
                reason: format!("parameter '{}' has a non-finite initial value", p.name),
            });
        }
        let (lo, hi) = p.interval();
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(FitError::InvalidSpec {
                reason: format!("parameter '{}' has an invalid bound interval", p.name),
            });
        }
    }
    Ok(())
}

/// Keep finite points with `x_min <= x <= x_max`, preserving order.
pub(crate) fn restrict_region(
    x: &[f64],
    y: &[f64],
    x_min: f64,
    x_max: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if xi.is_nan() || yi.is_nan() {
            continue;
        }
        if xi >= x_min && xi <= x_max {
            xs.push(xi);
            ys.push(yi);
        }
    }
    (xs, ys)
}
