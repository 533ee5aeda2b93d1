//! A single dataset node: named variables, coordinates, and attributes.

use ndarray::ArrayD;

use crate::forest::NodeId;

/// A named n-dimensional array with an ordered tuple of dimension names and
/// a unit label.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub data: ArrayD<f64>,
    /// One name per axis of `data`, in axis order.
    pub dims: Vec<String>,
    pub units: String,
}

impl Variable {
    /// # Panics
    /// Panics if `dims` does not name every axis of `data` exactly once by
    /// count. Dimension names are the engine's only handle on axes, so a
    /// mismatched construction is a programming error, not a data error.
    pub fn new(data: ArrayD<f64>, dims: Vec<String>, units: impl Into<String>) -> Self {
        assert_eq!(
            data.ndim(),
            dims.len(),
            "variable has {} axes but {} dimension names",
            data.ndim(),
            dims.len()
        );
        Self {
            data,
            dims,
            units: units.into(),
        }
    }

    /// Extent along a named dimension, if the variable has it.
    pub fn extent(&self, dim: &str) -> Option<usize> {
        let axis = self.dims.iter().position(|d| d == dim)?;
        Some(self.data.shape()[axis])
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }
}

/// A 1-D coordinate array indexing one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Coord {
    pub values: Vec<f64>,
    pub units: String,
}

impl Coord {
    pub fn new(values: Vec<f64>, units: impl Into<String>) -> Self {
        Self {
            values,
            units: units.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One entry in the forest: a dataset with variables, coordinates, free-form
/// attributes, and ordered children.
///
/// Variables, coordinates, and attributes keep their insertion order: the
/// order data was loaded in is the order a browsing UI shows it in.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    variables: Vec<(String, Variable)>,
    coords: Vec<(String, Coord)>,
    attrs: Vec<(String, String)>,
}

impl Node {
    pub(crate) fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn coord(&self, name: &str) -> Option<&Coord> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(n, _)| n.as_str())
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.iter().map(|(n, _)| n.as_str())
    }

    /// Insert or replace a variable, preserving insertion order on replace.
    pub fn set_variable(&mut self, name: impl Into<String>, var: Variable) {
        let name = name.into();
        match self.variables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = var,
            None => self.variables.push((name, var)),
        }
    }

    /// Insert or replace a coordinate, preserving insertion order on replace.
    pub fn set_coord(&mut self, name: impl Into<String>, coord: Coord) {
        let name = name.into();
        match self.coords.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = coord,
            None => self.coords.push((name, coord)),
        }
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn variable_extent_by_dim_name() {
        let data = ArrayD::zeros(IxDyn(&[100, 3]));
        let var = Variable::new(data, vec!["time".into(), "sweep".into()], "pA");
        assert_eq!(var.extent("time"), Some(100));
        assert_eq!(var.extent("sweep"), Some(3));
        assert_eq!(var.extent("channel"), None);
    }

    #[test]
    #[should_panic(expected = "dimension names")]
    fn variable_rejects_dim_count_mismatch() {
        let data = ArrayD::zeros(IxDyn(&[4, 4]));
        let _ = Variable::new(data, vec!["time".into()], "mV");
    }

    #[test]
    fn node_maps_preserve_insertion_order() {
        let mut node = Node::named("rec");
        node.set_coord("time", Coord::new(vec![0.0, 0.1], "s"));
        node.set_coord("sweep", Coord::new(vec![0.0, 1.0], ""));
        node.set_coord("time", Coord::new(vec![0.0, 0.2], "s"));

        let names: Vec<_> = node.coord_names().collect();
        assert_eq!(names, vec!["time", "sweep"]);
        assert_eq!(node.coord("time").unwrap().values[1], 0.2);
    }
}
