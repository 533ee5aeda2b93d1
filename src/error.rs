//! Error taxonomy for the engine.
//!
//! One enum per failure domain so callers can match on exactly the failures
//! a given entry point can produce:
//!
//! - [`StructuralError`]: malformed forest, fatal for an index build
//! - [`SelectionError`]: an invalid [`SliceSelection`](crate::domain::SliceSelection)
//! - [`ExtractError`]: selection errors plus coordinate/variable length mismatches
//! - [`FitError`]: empty fit region, unknown model, malformed fit spec
//!
//! Fit non-convergence is deliberately *not* an error: a best-effort
//! [`FitResult`](crate::domain::FitResult) with `converged = false` is still
//! returned so callers can inspect or display the partial fit.
//!
//! All errors surface synchronously at the call site. The engine never logs
//! them, never retries, and never produces partial results alongside an error.

use thiserror::Error;

/// Fatal forest-shape errors detected while building a tree index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// A node is reachable from itself via child links.
    #[error("cycle detected in forest at '{path}'")]
    Cycle { path: String },

    /// A child id does not refer to a node in the forest arena.
    #[error("node '{path}' references a child that is not in the forest")]
    DanglingChild { path: String },

    /// The same node is owned by more than one parent (or listed twice).
    #[error("node '{path}' is claimed by more than one parent")]
    SharedChild { path: String },
}

/// An invalid slice selection. No partial slice is ever produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("no node at path '{path}'")]
    UnknownNode { path: String },

    #[error("node '{path}' has no variable '{variable}'")]
    UnknownVariable { path: String, variable: String },

    /// A fixed index names a dimension the variable does not have.
    #[error("variable '{variable}' has no dimension '{dim}'")]
    UnknownDimension { variable: String, dim: String },

    /// The designated x dimension also appears among the fixed indices.
    #[error("x dimension '{dim}' must not be given a fixed index")]
    FixedXDimension { dim: String },

    /// A non-x dimension was left without a fixed index.
    #[error("missing fixed index for dimension '{dim}'")]
    MissingIndex { dim: String },

    #[error("index {index} out of range for dimension '{dim}' (length {len})")]
    IndexOutOfRange { dim: String, index: usize, len: usize },

    /// Two unit strings that must agree do not (no implicit conversion).
    #[error("incompatible units: '{left}' vs '{right}'")]
    UnitMismatch { left: String, right: String },
}

/// Failures of slice extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The resolved x coordinate does not span the variable's x extent.
    #[error(
        "coordinate '{coord}' has length {coord_len} but variable '{variable}' \
         spans {extent} along '{dim}'"
    )]
    DimensionMismatch {
        coord: String,
        coord_len: usize,
        variable: String,
        dim: String,
        extent: usize,
    },
}

/// Failures of fitting and measurement requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The x-range restriction left no usable points.
    #[error("region [{x_min}, {x_max}] selects no points")]
    EmptyRegion { x_min: f64, x_max: f64 },

    #[error("no model registered under '{name}'")]
    UnknownModel { name: String },

    /// Malformed parameter set: wrong arity, inverted bounds, non-finite init.
    #[error("invalid fit spec: {reason}")]
    InvalidSpec { reason: String },
}
