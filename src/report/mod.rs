//! Plain-text formatting of fit results and measurements.
//!
//! Formatting stays in one place so the numeric code never concerns itself
//! with presentation, and output tweaks are localized.

pub mod format;

pub use format::*;
