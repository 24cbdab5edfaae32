//! Edge table - the active connections used for output fan-out.
//!
//! Edges are kept in insertion order and are not deduplicated: the same
//! (source, target, handles) tuple added twice routes every output twice.

use crate::pipeline::graph::Edge;
use crate::pipeline::id::NodeId;
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct EdgeTable {
    edges: Vec<Edge>,
}

impl EdgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Remove the first entry equal to `edge`. Returns whether one was found.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        match self.edges.iter().position(|e| e == edge) {
            Some(index) => {
                self.edges.remove(index);
                true
            }
            None => false,
        }
    }

    /// Edges leaving `source`, in insertion order.
    pub fn fan_out(&self, source: &NodeId) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| &e.source == source)
            .cloned()
            .collect()
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Check if adding `edge` would close a cycle.
    pub fn would_create_cycle(&self, edge: &Edge) -> bool {
        // If the target can already reach the source, source -> target closes a loop.
        let mut visited = HashSet::new();
        let mut stack = vec![&edge.target];

        while let Some(current) = stack.pop() {
            if current == &edge.source {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for next in self.edges.iter().filter(|e| &e.source == current) {
                stack.push(&next.target);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_takes_first_match_only() {
        let mut table = EdgeTable::new();
        let edge = Edge::new("x", "y").to_handle("a");
        table.add(edge.clone());
        table.add(edge.clone());

        assert!(table.remove(&edge));
        assert_eq!(table.len(), 1);
        assert!(table.contains(&edge));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut table = EdgeTable::new();
        table.add(Edge::new("x", "y"));
        assert!(!table.remove(&Edge::new("x", "y").to_handle("other")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fan_out_keeps_duplicates() {
        let mut table = EdgeTable::new();
        table.add(Edge::new("x", "y").to_handle("a"));
        table.add(Edge::new("x", "z"));
        table.add(Edge::new("x", "y").to_handle("a"));
        table.add(Edge::new("w", "y"));

        let out = table.fan_out(&NodeId::from("x"));
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Edge::new("x", "z"));
    }

    #[test]
    fn test_cycle_detection() {
        let mut table = EdgeTable::new();
        table.add(Edge::new("a", "b"));
        table.add(Edge::new("b", "c"));

        assert!(table.would_create_cycle(&Edge::new("c", "a")));
        assert!(table.would_create_cycle(&Edge::new("a", "a")));
        assert!(!table.would_create_cycle(&Edge::new("a", "c")));
    }
}
