//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can
//! be:
//!
//! - passed between the engine and a presentation layer
//! - exported to JSON for session snapshots
//! - reloaded later for comparisons
//!
//! Slices and fit results are immutable snapshots: any change to a selection
//! or spec produces a fresh value, never a mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which rows a tree index exposes per node.
///
/// A small configuration record passed into every build, not mutable global
/// state: two builds with the same forest and visibility are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub show_data_vars: bool,
    pub show_own_coords: bool,
    pub show_inherited_coords: bool,
}

impl Default for Visibility {
    /// Data variables and own coordinates shown, inherited coordinates
    /// hidden: the configuration a browsing UI starts from.
    fn default() -> Self {
        Self {
            show_data_vars: true,
            show_own_coords: true,
            show_inherited_coords: false,
        }
    }
}

/// A request for a 1-D slice of an n-dimensional variable.
///
/// Every dimension of the variable except `x_dim` must appear in `fixed`
/// with an in-range index. The extractor validates; nothing is clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSelection {
    /// Path of the node owning the variable ("/"-joined names from the root).
    pub path: String,
    /// Variable name at that node.
    pub variable: String,
    /// The dimension plotted along x.
    pub x_dim: String,
    /// Fixed index per non-x dimension.
    pub fixed: BTreeMap<String, usize>,
}

impl SliceSelection {
    pub fn new(
        path: impl Into<String>,
        variable: impl Into<String>,
        x_dim: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            variable: variable.into(),
            x_dim: x_dim.into(),
            fixed: BTreeMap::new(),
        }
    }

    /// Add a fixed index for one dimension.
    pub fn fix(mut self, dim: impl Into<String>, index: usize) -> Self {
        self.fixed.insert(dim.into(), index);
        self
    }
}

/// A concrete (x, y) extraction from one variable.
///
/// `x` and `y` always have equal length (the variable's extent along the x
/// dimension). Units are carried through from the source arrays unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x_units: String,
    pub y_units: String,
    /// The originating request, kept for traceability.
    pub selection: SliceSelection,
}

impl Slice {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate over (x, y) pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// A time-stamped annotation attached to a node.
///
/// Timestamps are seconds from the start of the recording. Equal timestamps
/// are allowed; insertion order is preserved among them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: f64,
    pub text: String,
}

impl Event {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// One named parameter of a fit: initial value, fixed flag, optional bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub init: f64,
    pub fixed: bool,
    /// Lower bound; `None` is unbounded.
    pub min: Option<f64>,
    /// Upper bound; `None` is unbounded.
    pub max: Option<f64>,
}

impl ParamSpec {
    /// A free, unbounded parameter.
    pub fn free(name: impl Into<String>, init: f64) -> Self {
        Self {
            name: name.into(),
            init,
            fixed: false,
            min: None,
            max: None,
        }
    }

    /// A parameter held constant during optimization.
    pub fn held(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            init: value,
            fixed: true,
            min: None,
            max: None,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Bounds as a closed interval, infinities standing in for `None`.
    pub fn interval(&self) -> (f64, f64) {
        (
            self.min.unwrap_or(f64::NEG_INFINITY),
            self.max.unwrap_or(f64::INFINITY),
        )
    }
}

/// A fit request: model name, parameter set, and the x-range restricting
/// which slice points participate (the region of interest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSpec {
    /// Name of a registered model function.
    pub model: String,
    /// Ordered parameters; arity must match the model's default set.
    pub params: Vec<ParamSpec>,
    pub x_min: f64,
    pub x_max: f64,
}

impl FitSpec {
    /// A spec over the full x-range.
    pub fn new(model: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        Self {
            model: model.into(),
            params,
            x_min: f64::NEG_INFINITY,
            x_max: f64::INFINITY,
        }
    }

    /// Restrict the fit to `[x_min, x_max]`.
    pub fn over(mut self, x_min: f64, x_max: f64) -> Self {
        self.x_min = x_min;
        self.x_max = x_max;
        self
    }
}

/// One fitted parameter with its standard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParam {
    pub name: String,
    pub value: f64,
    /// NaN when the parameter was fixed or the covariance was singular.
    pub stderr: f64,
    pub fixed: bool,
}

/// Output of one fit. Derived from exactly one slice and one spec; discarded,
/// not updated, when either input changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: String,
    pub params: Vec<FittedParam>,
    /// The restricted x-points actually used for fitting.
    pub x: Vec<f64>,
    /// Model evaluated at `x` with the best-fit parameters.
    pub fitted: Vec<f64>,
    /// Observed minus fitted, aligned with `x`.
    pub residuals: Vec<f64>,
    pub sse: f64,
    pub rmse: f64,
    /// False when the iteration cap was hit or the numerics failed; the
    /// remaining fields still hold the best attempt.
    pub converged: bool,
    pub iterations: usize,
}

impl FitResult {
    pub fn param(&self, name: &str) -> Option<&FittedParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Best-fit values in parameter order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }
}

/// Which reduction to apply over a slice region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    Mean,
    Median,
    Min,
    Max,
    /// Largest |y|.
    AbsMax,
    /// Extremum of the given polarity, averaged over `half_width` points on
    /// each side (0 = the raw extremum).
    Peak { positive: bool, half_width: usize },
}

/// A single measured point: where and what.
///
/// For `Mean`/`Median` the x is the mean x of the region; for the others it
/// is the location of the measured sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub kind: MeasureKind,
    pub x: f64,
    pub y: f64,
    /// Number of points the reduction saw after region/NaN filtering.
    pub n: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_builder_collects_fixed_indices() {
        let sel = SliceSelection::new("/rec", "I", "time")
            .fix("sweep", 1)
            .fix("channel", 0);
        assert_eq!(sel.fixed.len(), 2);
        assert_eq!(sel.fixed["sweep"], 1);
    }

    #[test]
    fn param_spec_builders() {
        let p = ParamSpec::free("a", 1.0).with_bounds(0.0, 10.0);
        assert!(!p.fixed);
        assert_eq!(p.min, Some(0.0));
        assert_eq!(p.interval(), (0.0, 10.0));

        let q = ParamSpec::held("y0", 0.5);
        assert!(q.fixed);
        assert_eq!(q.init, 0.5);
        assert_eq!(q.min, None);
        assert!(q.interval().0.is_infinite());
    }

    #[test]
    fn slice_points_pair_up() {
        let slice = Slice {
            x: vec![0.0, 1.0],
            y: vec![10.0, 20.0],
            x_units: "s".into(),
            y_units: "pA".into(),
            selection: SliceSelection::new("/r", "I", "time"),
        };
        let pts: Vec<_> = slice.points().collect();
        assert_eq!(pts, vec![(0.0, 10.0), (1.0, 20.0)]);
    }

    #[test]
    fn fit_spec_serde_round_trip() {
        let spec = FitSpec::new(
            "exponential",
            vec![
                ParamSpec::free("a", 1.0),
                ParamSpec::free("b", 1.0).with_min(1e-9),
                ParamSpec::held("c", 0.0),
            ],
        )
        .over(0.0, 0.4);

        let json = serde_json::to_string(&spec).unwrap();
        let back: FitSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model, "exponential");
        assert_eq!(back.params.len(), 3);
        assert!(back.params[2].fixed);
        assert_eq!(back.x_max, 0.4);
    }
}
