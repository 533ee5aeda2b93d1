//! The name -> (function, default parameters) registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::{FitSpec, ParamSpec};
use crate::models::builtin;

/// A model function: evaluate y at one x for a full parameter vector.
///
/// `Arc<dyn Fn>` rather than a plain `fn` pointer so callers can register
/// closures (e.g. a polynomial of runtime-chosen degree).
pub type ModelFn = Arc<dyn Fn(f64, &[f64]) -> f64 + Send + Sync>;

/// A registered model: its function and the default parameter set that also
/// fixes the parameter arity and order.
#[derive(Clone)]
pub struct ModelEntry {
    pub func: ModelFn,
    pub defaults: Vec<ParamSpec>,
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ModelEntry {
    /// Evaluate the model over a set of x values.
    pub fn eval(&self, xs: &[f64], params: &[f64]) -> Vec<f64> {
        let f = &*self.func;
        xs.iter().map(|&x| f(x, params)).collect()
    }
}

/// Lookup table from model name to [`ModelEntry`].
///
/// The surrounding application populates this at startup (usually starting
/// from [`ModelRegistry::builtin`]) and passes it into every fit call; the
/// engine holds no global model state.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin model set.
    ///
    /// Default parameters follow the conventions of the interactive fit
    /// panel this engine backs: amplitudes start at 1, rates/widths start
    /// at 1 with positivity bounds, offsets start at 0.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();

        reg.register("mean", Arc::new(builtin::mean), vec![ParamSpec::free("c", 0.0)]);
        reg.register(
            "line",
            Arc::new(builtin::line),
            vec![ParamSpec::free("m", 1.0), ParamSpec::free("b", 0.0)],
        );
        reg.register(
            "quadratic",
            Arc::new(builtin::quadratic),
            vec![
                ParamSpec::free("a", 1.0),
                ParamSpec::free("b", 0.0),
                ParamSpec::free("c", 0.0),
            ],
        );
        reg.register(
            "cubic",
            Arc::new(builtin::cubic),
            vec![
                ParamSpec::free("a", 1.0),
                ParamSpec::free("b", 0.0),
                ParamSpec::free("c", 0.0),
                ParamSpec::free("d", 0.0),
            ],
        );
        reg.register(
            "exponential",
            Arc::new(builtin::exponential),
            vec![
                ParamSpec::free("a", 1.0),
                ParamSpec::free("b", 1.0).with_min(1e-12),
                ParamSpec::free("c", 0.0),
            ],
        );
        reg.register(
            "gaussian",
            Arc::new(builtin::gaussian),
            vec![
                ParamSpec::free("a", 1.0).with_min(0.0),
                ParamSpec::free("b", 0.0),
                ParamSpec::free("c", 1.0).with_min(1e-12),
            ],
        );
        reg.register(
            "hill",
            Arc::new(builtin::hill),
            vec![
                ParamSpec::held("y0", 0.0),
                ParamSpec::free("y1", 1.0),
                ParamSpec::free("ec50", 1.0).with_min(1e-15),
                ParamSpec::free("n", 1.0).with_bounds(1e-2, 10.0),
            ],
        );

        reg
    }

    /// Register (or replace) a model under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: ModelFn,
        defaults: Vec<ParamSpec>,
    ) {
        self.models.insert(name.into(), ModelEntry { func, defaults });
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.models.get(name)
    }

    /// A [`FitSpec`] seeded from a model's default parameters, over the full
    /// x-range. Callers adjust values/bounds and then restrict the region.
    pub fn default_spec(&self, name: &str) -> Option<FitSpec> {
        self.get(name)
            .map(|entry| FitSpec::new(name, entry.defaults.clone()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_is_complete() {
        let reg = ModelRegistry::builtin();
        let names: Vec<&str> = reg.names().collect();
        assert_eq!(
            names,
            vec![
                "cubic",
                "exponential",
                "gaussian",
                "hill",
                "line",
                "mean",
                "quadratic",
            ]
        );
    }

    #[test]
    fn defaults_fix_arity_and_bounds() {
        let reg = ModelRegistry::builtin();
        let exp = reg.get("exponential").unwrap();
        assert_eq!(exp.defaults.len(), 3);
        assert_eq!(exp.defaults[1].min, Some(1e-12));

        let hill = reg.get("hill").unwrap();
        assert!(hill.defaults[0].fixed);
        assert_eq!(hill.defaults[3].interval(), (1e-2, 10.0));
    }

    #[test]
    fn caller_registered_closures_dispatch() {
        let mut reg = ModelRegistry::empty();
        let degree = 4usize;
        reg.register(
            "quartic-term",
            Arc::new(move |x: f64, p: &[f64]| p[0] * x.powi(degree as i32)),
            vec![ParamSpec::free("a", 1.0)],
        );
        let entry = reg.get("quartic-term").unwrap();
        let y = entry.eval(&[2.0], &[3.0]);
        assert_eq!(y, vec![48.0]);
    }

    #[test]
    fn eval_maps_over_xs() {
        let reg = ModelRegistry::builtin();
        let line = reg.get("line").unwrap();
        assert_eq!(line.eval(&[0.0, 1.0, 2.0], &[2.0, 1.0]), vec![1.0, 3.0, 5.0]);
    }
}
