//! `xygraph` analysis engine.
//!
//! The non-visual core behind a hierarchical dataset browser: navigate a
//! forest of labeled multi-dimensional arrays, pull one-dimensional (x, y)
//! slices out of them, annotate recordings with timestamped events, and fit
//! model curves to slice regions.
//!
//! The engine is a plain library so that:
//!
//! - core logic is testable without a GUI
//! - a presentation layer (tree view, plot canvas) stays a thin consumer
//! - everything here is synchronous and allocation-cheap; long fits can be
//!   moved to a worker thread by the caller since inputs and outputs are
//!   immutable snapshots
//!
//! Typical flow: build a [`forest::Forest`] (via an external loader or
//! [`data::generate_recording`]), project it with [`index::build_index`],
//! extract with [`slice::extract`], then analyze with [`fit::fit`] or
//! [`measure::measure`].

pub mod data;
pub mod domain;
pub mod error;
pub mod events;
pub mod fit;
pub mod forest;
pub mod index;
pub mod math;
pub mod measure;
pub mod models;
pub mod report;
pub mod slice;
pub mod units;
