//! Mathematical utilities: the Levenberg-Marquardt least-squares core.

pub mod lm;

pub use lm::*;
