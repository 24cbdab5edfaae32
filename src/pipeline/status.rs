//! Per-node status board - the read path for UI panels.
//!
//! Every emission is published here by the emitting processor itself, beside
//! (not through) the dispatcher queue. Consumers can poll the latest status
//! of a node or subscribe to a stream of updates for it.

use crate::pipeline::event::OutboundEvent;
use crate::pipeline::id::NodeId;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// One status change of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub node_id: NodeId,
    pub event: OutboundEvent,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct StatusSlot {
    latest: Option<StatusUpdate>,
    subscribers: Vec<Sender<StatusUpdate>>,
}

/// Shared, cloneable handle to the status of every node.
#[derive(Clone, Default)]
pub struct StatusBoard {
    slots: Arc<RwLock<HashMap<NodeId, StatusSlot>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status of `node_id`, if it has emitted anything.
    pub fn latest(&self, node_id: &NodeId) -> Option<StatusUpdate> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(node_id).and_then(|slot| slot.latest.clone())
    }

    /// Subscribe to status updates of `node_id`.
    ///
    /// The current status (if any) is delivered first. The node does not
    /// need to exist yet. The stream ends when the node is removed.
    pub fn subscribe(&self, node_id: &NodeId) -> Receiver<StatusUpdate> {
        let (tx, rx) = unbounded();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(node_id.clone()).or_default();
        if let Some(latest) = &slot.latest {
            let _ = tx.send(latest.clone());
        }
        slot.subscribers.push(tx);
        rx
    }

    /// Ids of all nodes with a known status, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = slots
            .iter()
            .filter(|(_, slot)| slot.latest.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn publish(&self, node_id: &NodeId, event: &OutboundEvent) {
        let update = StatusUpdate {
            node_id: node_id.clone(),
            event: event.clone(),
            at: Utc::now(),
        };
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(node_id.clone()).or_default();
        slot.subscribers
            .retain(|tx| tx.send(update.clone()).is_ok());
        slot.latest = Some(update);
    }

    /// Drop everything known about a removed node; ends its subscriptions.
    pub(crate) fn forget(&self, node_id: &NodeId) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(node_id);
    }
}

impl std::fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("StatusBoard")
            .field("nodes", &slots.len())
            .finish()
    }
}
