//! Test data builders for creating graphs

use pipeflow_rs::pipeline::{Edge, GraphSnapshot, Node};
use serde_json::{json, Value};

/// Builder for creating test GraphSnapshots
#[derive(Default, Clone)]
pub struct SnapshotBuilder {
    snapshot: GraphSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: &str, node_type: &str, data: Value) -> Self {
        self.snapshot.nodes.push(Node::new(id, node_type, data));
        self
    }

    /// A `codeNode` holding `code`
    pub fn code(self, id: &str, code: &str) -> Self {
        self.node(id, "codeNode", json!({ "code": code }))
    }

    pub fn edge(mut self, source: &str, target: &str) -> Self {
        self.snapshot.edges.push(Edge::new(source, target));
        self
    }

    pub fn edge_to(mut self, source: &str, target: &str, target_handle: &str) -> Self {
        self.snapshot
            .edges
            .push(Edge::new(source, target).to_handle(target_handle));
        self
    }

    pub fn build(self) -> GraphSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = SnapshotBuilder::new()
            .code("t", "1")
            .node("j", "jsonParse", json!({}))
            .edge_to("t", "j", "in")
            .build();

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[0].data, json!({ "code": "1" }));
        assert_eq!(snapshot.edges[0].target_handle.as_ref().map(|h| h.as_str()), Some("in"));
    }
}
