//! Event vocabulary shared by the differ, the dispatcher and processors.
//!
//! Three families:
//! - [`InboundEvent`] - delivered *to* a processor.
//! - [`OutboundEvent`] - emitted *by* a processor.
//! - [`GraphChange`] - produced by the differ from two snapshots.
//!
//! [`BusEvent`] is what actually sits in the dispatcher queue: either a graph
//! change or an outbound event stamped with the emitting node.

use crate::pipeline::graph::{Edge, Node};
use crate::pipeline::id::{HandleId, NodeId, SubscriptionId};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Data carried between processors.
pub type Payload = Value;

/// Events a processor receives.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The node's own `data` changed in the graph.
    Update { data: Payload },
    /// An upstream processor produced a value on `handle`.
    Input {
        handle: Option<HandleId>,
        data: Payload,
    },
    /// The upstream on `handle` failed; there is no value for now.
    Pending { handle: Option<HandleId> },
    /// The edge feeding `handle` was removed.
    Disconnect { handle: Option<HandleId> },
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Update { .. } => "update",
            InboundEvent::Input { .. } => "input",
            InboundEvent::Pending { .. } => "pending",
            InboundEvent::Disconnect { .. } => "disconnect",
        }
    }

    /// Handle the event arrived on, if it is port-scoped.
    pub fn handle(&self) -> Option<&HandleId> {
        match self {
            InboundEvent::Update { .. } => None,
            InboundEvent::Input { handle, .. }
            | InboundEvent::Pending { handle }
            | InboundEvent::Disconnect { handle } => handle.as_ref(),
        }
    }
}

/// Events a processor emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    Started,
    Output(Payload),
    Pending,
    Error(String),
}

impl OutboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::Started => "started",
            OutboundEvent::Output(_) => "output",
            OutboundEvent::Pending => "pending",
            OutboundEvent::Error(_) => "error",
        }
    }
}

impl fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundEvent::Output(data) => write!(f, "output {}", data),
            OutboundEvent::Error(message) => write!(f, "error: {}", message),
            other => f.write_str(other.kind()),
        }
    }
}

/// The value a processor retains for replay-on-connect.
///
/// Only `output` and `pending` emissions replace it; errors leave it alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LastOutput {
    #[default]
    Pending,
    Output(Payload),
}

impl LastOutput {
    pub fn value(&self) -> Option<&Payload> {
        match self {
            LastOutput::Pending => None,
            LastOutput::Output(data) => Some(data),
        }
    }
}

impl From<LastOutput> for OutboundEvent {
    fn from(last: LastOutput) -> Self {
        match last {
            LastOutput::Pending => OutboundEvent::Pending,
            LastOutput::Output(data) => OutboundEvent::Output(data),
        }
    }
}

/// A discrete graph edit, as computed by the differ.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    NodeAdded(Node),
    NodeUpdated(Node),
    NodeRemoved(NodeId),
    EdgeAdded(Edge),
    EdgeRemoved(Edge),
}

impl GraphChange {
    pub fn kind(&self) -> &'static str {
        match self {
            GraphChange::NodeAdded(_) => "nodeAdded",
            GraphChange::NodeUpdated(_) => "nodeUpdated",
            GraphChange::NodeRemoved(_) => "nodeRemoved",
            GraphChange::EdgeAdded(_) => "edgeAdded",
            GraphChange::EdgeRemoved(_) => "edgeRemoved",
        }
    }
}

impl fmt::Display for GraphChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphChange::NodeAdded(node) | GraphChange::NodeUpdated(node) => write!(
                f,
                "{} {} ({})",
                self.kind(),
                node.id,
                node.node_type.as_deref().unwrap_or("<untyped>")
            ),
            GraphChange::NodeRemoved(id) => write!(f, "{} {}", self.kind(), id),
            GraphChange::EdgeAdded(edge) | GraphChange::EdgeRemoved(edge) => {
                write!(f, "{} {}", self.kind(), edge)
            }
        }
    }
}

/// Entry in the dispatcher's single FIFO queue.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    Graph(GraphChange),
    Processor {
        node_id: NodeId,
        subscription: SubscriptionId,
        event: OutboundEvent,
    },
}

impl From<GraphChange> for BusEvent {
    fn from(change: GraphChange) -> Self {
        BusEvent::Graph(change)
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusEvent::Graph(change) => fmt::Display::fmt(change, f),
            BusEvent::Processor { node_id, event, .. } => write!(f, "{} from {}", event, node_id),
        }
    }
}
