//! Domain types shared across the engine.
//!
//! This module defines:
//!
//! - display configuration ([`Visibility`])
//! - slice requests and results ([`SliceSelection`], [`Slice`])
//! - per-node annotations ([`Event`])
//! - fit inputs and outputs ([`FitSpec`], [`ParamSpec`], [`FitResult`])
//! - measurement inputs and outputs ([`MeasureKind`], [`Measurement`])

pub mod types;

pub use types::*;
