//! Tree index: a navigable, filterable projection over the forest.
//!
//! Responsibilities:
//!
//! - walk each root depth-first (children in stored order) and emit one
//!   [`TreeIndexEntry`] per node, in display order
//! - split coordinate names into own vs. inherited, with nearer definitions
//!   shadowing ancestors' for the whole subtree below them
//! - apply the [`Visibility`] flags to the exposed name sets
//! - reject malformed forests (cycles, shared children, dangling handles)
//!
//! Shadowing is structural: it is computed from the full coordinate maps and
//! is unaffected by which sets the visibility flags hide. Building is pure -
//! two builds over unchanged inputs produce identical entry sequences.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::domain::Visibility;
use crate::error::StructuralError;
use crate::forest::{Forest, NodeId};

/// Display-oriented projection of one node. Derived data; rebuilt, never
/// mutated, when the forest or the visibility configuration changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeIndexEntry {
    pub id: NodeId,
    pub path: String,
    /// Root entries have depth 0.
    pub depth: usize,
    /// Child nodes in stored order (node rows are never filtered; the
    /// visibility flags only govern the name sets below).
    pub children: Vec<NodeId>,
    /// Own data variables, in insertion order.
    pub data_vars: Vec<String>,
    /// Coordinates defined directly on the node, in insertion order.
    pub own_coords: Vec<String>,
    /// Ancestor coordinates visible here (not shadowed), nearest ancestor
    /// first.
    pub inherited_coords: Vec<String>,
}

/// Build the index for a forest under a visibility configuration.
///
/// Entries come back in depth-first order, roots in stored order: directly
/// usable as the row order of a hierarchical display.
pub fn build_index(
    forest: &Forest,
    visibility: &Visibility,
) -> Result<Vec<TreeIndexEntry>, StructuralError> {
    // Roots are independent subtrees; walk them in parallel and stitch the
    // per-root entry runs back together in root order.
    let per_root: Vec<(Vec<TreeIndexEntry>, HashSet<NodeId>)> = forest
        .roots()
        .par_iter()
        .map(|&root| -> Result<(Vec<TreeIndexEntry>, HashSet<NodeId>), StructuralError> {
            let mut entries = Vec::new();
            let mut visited = HashSet::new();
            let mut ancestors = Vec::new();
            walk(
                forest,
                root,
                0,
                &[],
                &mut ancestors,
                &mut visited,
                visibility,
                &mut entries,
            )?;
            Ok((entries, visited))
        })
        .collect::<Result<_, StructuralError>>()?;

    // A node reachable from two roots is owned twice: same defect as a
    // shared child within one subtree.
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut out = Vec::new();
    for (entries, visited) in per_root {
        if let Some(&dup) = visited.iter().find(|id| seen.contains(id)) {
            return Err(StructuralError::SharedChild {
                path: forest.path(dup),
            });
        }
        seen.extend(visited);
        out.extend(entries);
    }

    debug!(entries = out.len(), "built tree index");
    Ok(out)
}

/// Find an entry by its path. Accepts a leading "/" or not.
pub fn lookup<'a>(entries: &'a [TreeIndexEntry], path: &str) -> Option<&'a TreeIndexEntry> {
    let wanted = path.trim_start_matches('/');
    entries
        .iter()
        .find(|e| e.path.trim_start_matches('/') == wanted)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    forest: &Forest,
    id: NodeId,
    depth: usize,
    inherited: &[String],
    ancestors: &mut Vec<NodeId>,
    visited: &mut HashSet<NodeId>,
    visibility: &Visibility,
    entries: &mut Vec<TreeIndexEntry>,
) -> Result<(), StructuralError> {
    if ancestors.contains(&id) {
        return Err(StructuralError::Cycle {
            path: forest.path(id),
        });
    }
    if !visited.insert(id) {
        return Err(StructuralError::SharedChild {
            path: forest.path(id),
        });
    }

    let path = forest.path(id);
    let node = forest.node(id).ok_or_else(|| StructuralError::DanglingChild {
        path: path.clone(),
    })?;

    let own_coords: Vec<String> = node.coord_names().map(str::to_string).collect();

    // Ancestor names survive unless this node redefines them. Scope is
    // computed before visibility filtering so that shadowing stays correct
    // even when the shadowing coordinates are hidden.
    let visible_inherited: Vec<String> = inherited
        .iter()
        .filter(|name| !own_coords.contains(name))
        .cloned()
        .collect();

    // Scope handed to children: own coordinates are the nearest definitions.
    let mut child_scope = own_coords.clone();
    child_scope.extend(visible_inherited.iter().cloned());

    entries.push(TreeIndexEntry {
        id,
        path,
        depth,
        children: node.children().to_vec(),
        data_vars: if visibility.show_data_vars {
            node.variable_names().map(str::to_string).collect()
        } else {
            Vec::new()
        },
        own_coords: if visibility.show_own_coords {
            own_coords
        } else {
            Vec::new()
        },
        inherited_coords: if visibility.show_inherited_coords {
            visible_inherited
        } else {
            Vec::new()
        },
    });

    ancestors.push(id);
    for &child in forest.node(id).expect("checked above").children() {
        if forest.node(child).is_none() {
            return Err(StructuralError::DanglingChild {
                path: forest.path(id),
            });
        }
        walk(
            forest,
            child,
            depth + 1,
            &child_scope,
            ancestors,
            visited,
            visibility,
            entries,
        )?;
    }
    ancestors.pop();

    Ok(())
}
