//! Curve fitting over extracted slices.
//!
//! Responsibilities:
//!
//! - restrict the slice to the region of interest
//! - translate the parameter specs (fixed flags, bounds) into a reduced
//!   optimization problem for the least-squares core
//! - map the solver outcome back into a full [`FitResult`](crate::domain::FitResult)
//!   with per-parameter standard errors

pub mod engine;

pub use engine::*;
