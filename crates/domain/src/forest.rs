//! Rebuilds category forests from graph query results.
//!
//! Stores hand back trees in one of two shapes: already nested
//! (`{id, name, child: [...]}` per node) or as a flat list of
//! `(id, name, parent_id)` rows. Both end up in [`assemble_nested`], which
//! stamps each node with the id of the node it was found under.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::categories::Category;

/// A node of a nested store result.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NestedCategory {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "child")]
    pub children: Vec<NestedCategory>,
}

/// A node together with the id of its containing category (`None` for roots).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CategoryEdge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl CategoryEdge {
    pub fn root(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}

pub fn assemble_nested(nodes: &[NestedCategory], parent_id: Option<&str>) -> Vec<Category> {
    nodes
        .iter()
        .map(|node| Category {
            id: node.id.clone(),
            name: node.name.clone(),
            parent_id: parent_id.map(str::to_string),
            children: assemble_nested(&node.children, Some(&node.id)),
        })
        .collect()
}

/// Groups a flat edge list by parent and assembles the forest.
///
/// Rows whose parent is not part of the list are dropped, as is any node
/// reached a second time (corrupt cyclic data). Siblings are ordered by
/// name, then id.
pub fn assemble_edges(edges: Vec<CategoryEdge>) -> Vec<Category> {
    let mut roots = Vec::new();
    let mut by_parent: HashMap<String, Vec<CategoryEdge>> = HashMap::new();
    for edge in edges {
        match edge.parent_id.clone() {
            None => roots.push(edge),
            Some(parent_id) => by_parent.entry(parent_id).or_default().push(edge),
        }
    }

    sort_siblings(&mut roots);
    let mut visited = HashSet::new();
    let nested: Vec<NestedCategory> = roots
        .into_iter()
        .filter(|root| visited.insert(root.id.clone()))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|root| nest(root, &mut by_parent, &mut visited))
        .collect();

    if !by_parent.is_empty() {
        tracing::debug!(
            orphan_parents = by_parent.len(),
            "dropping category rows not reachable from a root"
        );
    }

    assemble_nested(&nested, None)
}

fn nest(
    edge: CategoryEdge,
    by_parent: &mut HashMap<String, Vec<CategoryEdge>>,
    visited: &mut HashSet<String>,
) -> NestedCategory {
    let mut children = by_parent.remove(&edge.id).unwrap_or_default();
    sort_siblings(&mut children);
    let children = children
        .into_iter()
        .filter(|child| visited.insert(child.id.clone()))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|child| nest(child, by_parent, visited))
        .collect();
    NestedCategory {
        id: edge.id,
        name: edge.name,
        children,
    }
}

fn sort_siblings(edges: &mut [CategoryEdge]) {
    edges.sort_by(|left, right| {
        left.name
            .cmp(&right.name)
            .then_with(|| left.id.cmp(&right.id))
    });
}
