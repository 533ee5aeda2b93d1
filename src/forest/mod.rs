//! The forest of labeled array nodes.
//!
//! Nodes live in an arena ([`Forest`]) and refer to each other by [`NodeId`]
//! handles. The parent link is a plain back-reference used only for path
//! computation and inherited-coordinate resolution; ownership flows strictly
//! root-to-leaf through the children lists, so no reference cycles are
//! possible at the ownership level.
//!
//! Structural validation (cycles introduced through reparenting, shared
//! children) happens when an index is built, not on every edit.

pub mod arena;
pub mod node;

pub use arena::*;
pub use node::*;
