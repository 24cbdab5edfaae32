//! Actor registry - owns the live processors, keyed by node id.
//!
//! Each entry pairs a processor with the emitter it was built with. The
//! emitter doubles as the subscription: unsubscribing it on removal stops the
//! processor's output from reaching the bus.

use crate::error::{EngineError, Result};
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{BusEvent, InboundEvent, LastOutput, Payload};
use crate::pipeline::factory::FactoryRegistry;
use crate::pipeline::id::{NodeId, SubscriptionId};
use crate::pipeline::node::AnyProcessor;
use crate::pipeline::status::StatusBoard;
use crossbeam_channel::Sender;
use std::collections::HashMap;

/// A live processor and its output subscription.
pub struct ActorEntry {
    processor: AnyProcessor,
    emitter: Emitter,
    node_type: String,
}

impl ActorEntry {
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.emitter.subscription()
    }

    pub fn previous_output(&self) -> LastOutput {
        self.emitter.previous_output()
    }
}

pub struct ActorRegistry {
    actors: HashMap<NodeId, ActorEntry>,
    factories: FactoryRegistry,
    next_subscription: SubscriptionId,
    bus_tx: Sender<BusEvent>,
    status: StatusBoard,
}

impl ActorRegistry {
    pub fn new(factories: FactoryRegistry, bus_tx: Sender<BusEvent>, status: StatusBoard) -> Self {
        Self {
            actors: HashMap::new(),
            factories,
            next_subscription: SubscriptionId(0),
            bus_tx,
            status,
        }
    }

    /// Build the processor for a new node and subscribe to its output.
    ///
    /// The differ never adds an id twice without removing it in between, so
    /// an existing entry is not checked for here.
    pub fn create(&mut self, node_id: &NodeId, node_type: &str, data: &Payload) -> Result<SubscriptionId> {
        let subscription = self.next_subscription;
        self.next_subscription = subscription.next();

        let emitter = Emitter::new(
            node_id.clone(),
            subscription,
            self.bus_tx.clone(),
            self.status.clone(),
        );
        let processor = self
            .factories
            .create(node_type, node_id, data, emitter.clone())?;

        tracing::debug!(
            "Created processor {} for node {} ({:?})",
            processor.name(),
            node_id,
            subscription
        );
        self.actors.insert(
            node_id.clone(),
            ActorEntry {
                processor,
                emitter,
                node_type: node_type.to_string(),
            },
        );
        Ok(subscription)
    }

    /// Forward new node data to the existing processor.
    pub fn update(&mut self, node_id: &NodeId, data: Payload) -> Result<()> {
        self.deliver(node_id, InboundEvent::Update { data }, "node update")
    }

    /// Unsubscribe and drop the processor for `node_id`.
    pub fn remove(&mut self, node_id: &NodeId) -> Result<()> {
        let entry = self
            .actors
            .remove(node_id)
            .ok_or_else(|| EngineError::missing_actor(node_id, "node removal"))?;
        entry.emitter.unsubscribe();
        // Background threads are joined here, so nothing publishes after `forget`.
        drop(entry);
        self.status.forget(node_id);
        tracing::debug!("Removed processor for node {}", node_id);
        Ok(())
    }

    /// Hand one inbound event to the processor of `node_id`.
    ///
    /// `during` names the engine operation for the error if the actor is missing.
    pub fn deliver(&mut self, node_id: &NodeId, event: InboundEvent, during: &'static str) -> Result<()> {
        let entry = self
            .actors
            .get_mut(node_id)
            .ok_or_else(|| EngineError::missing_actor(node_id, during))?;
        tracing::trace!(node = %node_id, kind = event.kind(), handle = ?event.handle(), "deliver");
        entry.processor.on_event(event)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&ActorEntry> {
        self.actors.get(node_id)
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.actors.contains_key(node_id)
    }

    /// Whether `subscription` is the live subscription of `node_id`.
    pub fn is_live(&self, node_id: &NodeId, subscription: SubscriptionId) -> bool {
        self.actors
            .get(node_id)
            .is_some_and(|entry| entry.subscription() == subscription)
    }

    pub fn previous_output(&self, node_id: &NodeId) -> Option<LastOutput> {
        self.actors.get(node_id).map(ActorEntry::previous_output)
    }

    /// Ids of all live nodes, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.actors.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl Drop for ActorRegistry {
    fn drop(&mut self) {
        for entry in self.actors.values() {
            entry.emitter.unsubscribe();
        }
    }
}
