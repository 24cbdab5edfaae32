//! Graph differ - turns two successive snapshots into discrete change events.
//!
//! The change order is fixed: removed edges, added nodes, removed nodes,
//! updated nodes, added edges. Removing edges first means output routing
//! never follows an edge into an actor that has already been torn down.

use crate::pipeline::event::GraphChange;
use crate::pipeline::graph::{Edge, GraphSnapshot, Node};
use std::collections::{HashMap, HashSet};

/// Changes between two snapshots, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDiff {
    pub removed_edges: Vec<Edge>,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub updated_nodes: Vec<Node>,
    pub added_edges: Vec<Edge>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.removed_edges.len()
            + self.added_nodes.len()
            + self.removed_nodes.len()
            + self.updated_nodes.len()
            + self.added_edges.len()
    }

    /// Flatten into change events in dispatch order.
    pub fn into_changes(self) -> Vec<GraphChange> {
        let mut changes = Vec::with_capacity(self.len());
        changes.extend(self.removed_edges.into_iter().map(GraphChange::EdgeRemoved));
        changes.extend(self.added_nodes.into_iter().map(GraphChange::NodeAdded));
        changes.extend(
            self.removed_nodes
                .into_iter()
                .map(|node| GraphChange::NodeRemoved(node.id)),
        );
        changes.extend(self.updated_nodes.into_iter().map(GraphChange::NodeUpdated));
        changes.extend(self.added_edges.into_iter().map(GraphChange::EdgeAdded));
        changes
    }
}

/// Compute the changes that turn `previous` into `next`.
pub fn diff(previous: &GraphSnapshot, next: &GraphSnapshot) -> GraphDiff {
    let prev_nodes: HashMap<_, _> = previous.nodes.iter().map(|n| (&n.id, n)).collect();
    let next_ids: HashSet<_> = next.nodes.iter().map(|n| &n.id).collect();

    let added_nodes = next
        .nodes
        .iter()
        .filter(|n| !prev_nodes.contains_key(&n.id))
        .cloned()
        .collect();

    let removed_nodes = previous
        .nodes
        .iter()
        .filter(|n| !next_ids.contains(&n.id))
        .cloned()
        .collect();

    let updated_nodes = next
        .nodes
        .iter()
        .filter(|n| {
            prev_nodes
                .get(&n.id)
                .is_some_and(|prev| prev.data != n.data)
        })
        .cloned()
        .collect();

    let prev_edges: HashSet<&Edge> = previous.edges.iter().collect();
    let next_edges: HashSet<&Edge> = next.edges.iter().collect();

    let added_edges = next
        .edges
        .iter()
        .filter(|e| !prev_edges.contains(e))
        .cloned()
        .collect();

    let removed_edges = previous
        .edges
        .iter()
        .filter(|e| !next_edges.contains(e))
        .cloned()
        .collect();

    GraphDiff {
        removed_edges,
        added_nodes,
        removed_nodes,
        updated_nodes,
        added_edges,
    }
}

/// Stateful differ over a stream of snapshots.
///
/// Starts from an empty baseline, so the first snapshot adds everything.
/// Snapshots deep-equal to the previous one produce nothing.
#[derive(Debug, Default)]
pub struct GraphDiffer {
    previous: GraphSnapshot,
}

impl GraphDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last snapshot accepted.
    pub fn current(&self) -> &GraphSnapshot {
        &self.previous
    }

    /// Accept the next snapshot and return the changes, or `None` when it is
    /// identical to the previous one.
    pub fn observe(&mut self, next: GraphSnapshot) -> Option<Vec<GraphChange>> {
        if next == self.previous {
            return None;
        }
        let changes = diff(&self.previous, &next).into_changes();
        self.previous = next;
        Some(changes)
    }
}
