//! Declarative graph description consumed by the engine.
//!
//! The field names follow the node-editor store (`type`, `sourceHandle`,
//! `targetHandle`) so a saved editor state deserializes directly. Fields the
//! engine has no use for (positions, edge ids, styling) are ignored.

use crate::pipeline::id::{HandleId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A node in the pipeline graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Node type; selects the processor factory.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Arbitrary node configuration. Only read by the engine, never written.
    #[serde(default)]
    pub data: Value,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            node_type: Some(node_type.into()),
            data,
        }
    }
}

/// A directed connection between two node handles.
///
/// Identity is the full 4-tuple; there is no edge id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Route into a named input port on the target.
    pub fn to_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Route out of a named output port on the source.
    pub fn from_handle(mut self, handle: impl Into<HandleId>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(handle) = &self.source_handle {
            write!(f, ".{}", handle)?;
        }
        write!(f, " -> {}", self.target)?;
        if let Some(handle) = &self.target_handle {
            write!(f, ".{}", handle)?;
        }
        Ok(())
    }
}

/// Full, non-incremental description of the desired graph at one instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Builder-style: append a node.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Builder-style: append an edge.
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }
}
