//! Slice extraction: an n-dimensional variable down to one (x, y) trace.
//!
//! Given a node, a variable, a designated x dimension, and a fixed index for
//! every other dimension, produce the 1-D trace along x:
//!
//! - the x coordinate resolves by walking from the node upward (inherited
//!   coordinates, nearest definition shadowing farther ones); when no
//!   coordinate of that name exists anywhere on the chain, a 0..n-1 integer
//!   axis with unit "index" is synthesized
//! - y is the variable with every non-x axis pinned at its fixed index
//!
//! Validation is strict: out-of-range indices, unknown dimensions, a fixed
//! x dimension, or a missing fixed index all fail with a
//! [`SelectionError`]: nothing is clamped or defaulted. Units are carried
//! through from the source arrays; no conversion happens here.

use ndarray::SliceInfoElem;
use tracing::trace;

use crate::domain::{Slice, SliceSelection};
use crate::error::{ExtractError, SelectionError};
use crate::forest::Forest;
use crate::units::UnitRegistry;

/// Extract the 1-D slice described by `selection`.
pub fn extract(forest: &Forest, selection: &SliceSelection) -> Result<Slice, ExtractError> {
    let node_id = forest
        .resolve_path(&selection.path)
        .ok_or_else(|| SelectionError::UnknownNode {
            path: selection.path.clone(),
        })?;
    let node = forest
        .node(node_id)
        .ok_or_else(|| SelectionError::UnknownNode {
            path: selection.path.clone(),
        })?;
    let var = node
        .variable(&selection.variable)
        .ok_or_else(|| SelectionError::UnknownVariable {
            path: selection.path.clone(),
            variable: selection.variable.clone(),
        })?;

    if !var.dims.iter().any(|d| *d == selection.x_dim) {
        return Err(SelectionError::UnknownDimension {
            variable: selection.variable.clone(),
            dim: selection.x_dim.clone(),
        }
        .into());
    }
    if selection.fixed.contains_key(&selection.x_dim) {
        return Err(SelectionError::FixedXDimension {
            dim: selection.x_dim.clone(),
        }
        .into());
    }
    // Fixed indices must name real dimensions of this variable...
    for dim in selection.fixed.keys() {
        if !var.dims.iter().any(|d| d == dim) {
            return Err(SelectionError::UnknownDimension {
                variable: selection.variable.clone(),
                dim: dim.clone(),
            }
            .into());
        }
    }
    // ...and every non-x dimension must have an in-range one.
    let shape = var.data.shape();
    for (axis, dim) in var.dims.iter().enumerate() {
        if *dim == selection.x_dim {
            continue;
        }
        let index = *selection
            .fixed
            .get(dim)
            .ok_or_else(|| SelectionError::MissingIndex { dim: dim.clone() })?;
        if index >= shape[axis] {
            return Err(SelectionError::IndexOutOfRange {
                dim: dim.clone(),
                index,
                len: shape[axis],
            }
            .into());
        }
    }

    let extent = var
        .extent(&selection.x_dim)
        .expect("x dimension validated above");

    // Pin every non-x axis; keep the full x axis.
    let info: Vec<SliceInfoElem> = var
        .dims
        .iter()
        .map(|dim| {
            if *dim == selection.x_dim {
                SliceInfoElem::Slice {
                    start: 0,
                    end: None,
                    step: 1,
                }
            } else {
                SliceInfoElem::Index(selection.fixed[dim] as isize)
            }
        })
        .collect();
    let y: Vec<f64> = var.data.slice(info.as_slice()).iter().copied().collect();

    // Inherited-coordinate resolution, with the integer fallback axis.
    let (x, x_units) = match forest.resolve_coord(node_id, &selection.x_dim) {
        Some((_, coord)) => {
            if coord.len() != extent {
                return Err(ExtractError::DimensionMismatch {
                    coord: selection.x_dim.clone(),
                    coord_len: coord.len(),
                    variable: selection.variable.clone(),
                    dim: selection.x_dim.clone(),
                    extent,
                });
            }
            (coord.values.clone(), coord.units.clone())
        }
        None => ((0..extent).map(|i| i as f64).collect(), "index".to_string()),
    };

    trace!(
        path = %selection.path,
        variable = %selection.variable,
        n = x.len(),
        "extracted slice"
    );

    Ok(Slice {
        x,
        y,
        x_units,
        y_units: var.units.clone(),
        selection: selection.clone(),
    })
}

/// Produce a new slice with the x axis expressed in `target` units.
///
/// Conversion is always explicit: extraction and fitting never convert on
/// their own. Incompatible units (different bases, or opaque labels that do
/// not match exactly) fail with [`SelectionError::UnitMismatch`].
pub fn convert_x_units(
    slice: &Slice,
    target: &str,
    registry: &UnitRegistry,
) -> Result<Slice, SelectionError> {
    let factor = registry
        .conversion_factor(&slice.x_units, target)
        .ok_or_else(|| SelectionError::UnitMismatch {
            left: slice.x_units.clone(),
            right: target.to_string(),
        })?;

    Ok(Slice {
        x: slice.x.iter().map(|v| v * factor).collect(),
        y: slice.y.clone(),
        x_units: target.to_string(),
        y_units: slice.y_units.clone(),
        selection: slice.selection.clone(),
    })
}
