//! Dispatcher - the single-writer event loop of the engine.
//!
//! Every graph change and every processor emission funnels through one FIFO
//! queue. Applying an event may make processors emit more events; those land
//! on the bus channel and are moved to the back of the queue before the next
//! pop, so a chain of reactions is processed iteratively and in order, never
//! through nested calls.
//!
//! ```text
//!  snapshots ──► GraphDiffer ──► GraphChange ─┐
//!                                             ▼
//!                 ┌──────────── VecDeque<BusEvent> ◄── bus channel ◄── Emitters
//!                 ▼                                                      ▲
//!            apply(event) ──► ActorRegistry / EdgeTable ──► on_event ────┘
//! ```
//!
//! Structural errors (unknown node type, a missing actor) put the dispatcher
//! into the `Faulted` state: the queue is discarded and every later call
//! returns [`EngineError::Faulted`].

use crate::config::{EngineConfig, StaleEventPolicy};
use crate::error::{EngineError, Result};
use crate::pipeline::bridge::EngineCommand;
use crate::pipeline::differ::GraphDiffer;
use crate::pipeline::edges::EdgeTable;
use crate::pipeline::event::{BusEvent, GraphChange, InboundEvent, LastOutput, OutboundEvent};
use crate::pipeline::factory::FactoryRegistry;
use crate::pipeline::graph::{Edge, GraphSnapshot};
use crate::pipeline::id::{NodeId, SubscriptionId};
use crate::pipeline::registry::{ActorEntry, ActorRegistry};
use crate::pipeline::status::StatusBoard;
use crossbeam_channel::{select, unbounded, Receiver};
use std::collections::VecDeque;

/// Lifecycle of the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Processing,
    /// A structural error occurred; no further events are accepted.
    Faulted,
}

pub struct Dispatcher {
    state: DispatcherState,
    queue: VecDeque<BusEvent>,
    registry: ActorRegistry,
    edges: EdgeTable,
    differ: GraphDiffer,
    bus_rx: Receiver<BusEvent>,
    status: StatusBoard,
    config: EngineConfig,
}

impl Dispatcher {
    /// Create an idle dispatcher with no actors and no edges.
    pub fn new(factories: FactoryRegistry, config: &EngineConfig) -> Self {
        let (bus_tx, bus_rx) = unbounded();
        let status = StatusBoard::new();
        Self {
            state: DispatcherState::Idle,
            queue: VecDeque::new(),
            registry: ActorRegistry::new(factories, bus_tx, status.clone()),
            edges: EdgeTable::new(),
            differ: GraphDiffer::new(),
            bus_rx,
            status,
            config: config.clone(),
        }
    }

    /// Dispatcher wired with the built-in node types.
    pub fn with_builtins(config: &EngineConfig) -> Self {
        Self::new(FactoryRegistry::with_builtins(config), config)
    }

    // ── Entry points ──

    /// Feed the next graph snapshot.
    ///
    /// Changes are dispatched one at a time, so the reactions to one change
    /// settle before the next change is applied. A snapshot equal to the
    /// previous one dispatches nothing. Returns the number of events applied.
    pub fn apply_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<usize> {
        self.ensure_running()?;
        let Some(changes) = self.differ.observe(snapshot) else {
            tracing::trace!("Snapshot unchanged, nothing to dispatch");
            return Ok(0);
        };

        tracing::debug!("Snapshot produced {} change(s)", changes.len());
        let mut applied = 0;
        for change in changes {
            applied += self.dispatch_change(change)?;
        }
        Ok(applied)
    }

    /// Dispatch a single graph change.
    pub fn dispatch_change(&mut self, change: GraphChange) -> Result<usize> {
        self.dispatch(BusEvent::Graph(change))
    }

    /// Enqueue `event` and drain the queue until it is empty.
    ///
    /// Events already waiting on the bus are queued ahead of `event`.
    /// Returns the number of events applied.
    pub fn dispatch(&mut self, event: BusEvent) -> Result<usize> {
        self.ensure_running()?;
        self.absorb_bus();
        self.queue.push_back(event);
        self.drain()
    }

    /// Apply whatever processors emitted on their own (e.g. from a background
    /// thread) since the last drain.
    pub fn poll(&mut self) -> Result<usize> {
        self.ensure_running()?;
        self.absorb_bus();
        if self.queue.is_empty() {
            return Ok(0);
        }
        self.drain()
    }

    /// Serve snapshot commands and background emissions until shutdown.
    ///
    /// Returns early with the error that faulted the dispatcher.
    pub fn run(&mut self, commands: &Receiver<EngineCommand>) -> Result<()> {
        tracing::info!("Dispatcher thread started");
        let bus = self.bus_rx.clone();

        loop {
            select! {
                recv(commands) -> cmd => match cmd {
                    Ok(EngineCommand::Snapshot(snapshot)) => {
                        self.apply_snapshot(snapshot)?;
                    }
                    Ok(EngineCommand::Shutdown) | Err(_) => break,
                },
                recv(bus) -> event => {
                    if let Ok(event) = event {
                        self.queue.push_back(event);
                        self.poll()?;
                    }
                }
            }
        }

        tracing::info!("Dispatcher thread exiting");
        Ok(())
    }

    // ── Inspection ──

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Read path for per-node status, shared with every emitter.
    pub fn status_board(&self) -> &StatusBoard {
        &self.status
    }

    /// Replay value of a live node.
    pub fn last_output(&self, node_id: &NodeId) -> Option<LastOutput> {
        self.registry.previous_output(node_id)
    }

    pub fn actor(&self, node_id: &NodeId) -> Option<&ActorEntry> {
        self.registry.get(node_id)
    }

    pub fn has_actor(&self, node_id: &NodeId) -> bool {
        self.registry.contains(node_id)
    }

    pub fn actor_count(&self) -> usize {
        self.registry.len()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.registry.node_ids()
    }

    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    /// The last snapshot seen by the differ.
    pub fn snapshot(&self) -> &GraphSnapshot {
        self.differ.current()
    }

    // ── Drain loop ──

    fn ensure_running(&self) -> Result<()> {
        match self.state {
            DispatcherState::Faulted => Err(EngineError::Faulted),
            _ => Ok(()),
        }
    }

    /// Move everything emitted so far onto the back of the queue.
    fn absorb_bus(&mut self) {
        self.queue.extend(self.bus_rx.try_iter());
    }

    fn next_event(&mut self) -> Option<BusEvent> {
        self.absorb_bus();
        self.queue.pop_front()
    }

    fn drain(&mut self) -> Result<usize> {
        self.state = DispatcherState::Processing;
        let limit = self.config.max_events_per_drain;
        let mut applied = 0;

        while let Some(event) = self.next_event() {
            if applied >= limit {
                return Err(self.fault(EngineError::PropagationLimit { limit }));
            }
            applied += 1;

            tracing::trace!("Applying {}", event);
            if let Err(e) = self.apply(event) {
                return Err(self.fault(e));
            }
        }

        self.state = DispatcherState::Idle;
        Ok(applied)
    }

    fn fault(&mut self, error: EngineError) -> EngineError {
        tracing::error!("Dispatcher faulted: {}", error);
        self.state = DispatcherState::Faulted;
        self.queue.clear();
        // Anything still on the bus belongs to the inconsistent state.
        let dropped = self.bus_rx.try_iter().count();
        if dropped > 0 {
            tracing::debug!("Discarded {} pending bus event(s)", dropped);
        }
        error
    }

    fn apply(&mut self, event: BusEvent) -> Result<()> {
        match event {
            BusEvent::Graph(change) => self.apply_change(change),
            BusEvent::Processor {
                node_id,
                subscription,
                event,
            } => self.route(node_id, subscription, event),
        }
    }

    fn apply_change(&mut self, change: GraphChange) -> Result<()> {
        match change {
            GraphChange::NodeAdded(node) => {
                let node_type = node
                    .node_type
                    .as_deref()
                    .ok_or_else(|| EngineError::MissingNodeType(node.id.clone()))?;
                self.registry.create(&node.id, node_type, &node.data)?;
                Ok(())
            }
            GraphChange::NodeUpdated(node) => self.registry.update(&node.id, node.data),
            GraphChange::NodeRemoved(node_id) => self.registry.remove(&node_id),
            GraphChange::EdgeAdded(edge) => self.connect(edge),
            GraphChange::EdgeRemoved(edge) => self.disconnect(edge),
        }
    }

    /// Store the edge and replay the source's last output through it.
    fn connect(&mut self, edge: Edge) -> Result<()> {
        if !self.registry.contains(&edge.target) {
            return Err(EngineError::missing_actor(&edge.target, "edge add"));
        }
        let source = self
            .registry
            .get(&edge.source)
            .ok_or_else(|| EngineError::missing_actor(&edge.source, "edge add"))?;

        let replay = BusEvent::Processor {
            node_id: edge.source.clone(),
            subscription: source.subscription(),
            event: source.previous_output().into(),
        };

        if self.config.warn_on_cycles && self.edges.would_create_cycle(&edge) {
            tracing::warn!("Edge {} closes a cycle", edge);
        }
        tracing::debug!("Connected {}", edge);
        self.edges.add(edge);
        self.queue.push_back(replay);
        Ok(())
    }

    fn disconnect(&mut self, edge: Edge) -> Result<()> {
        if !self.edges.remove(&edge) {
            tracing::debug!("Edge {} was not connected", edge);
            return Ok(());
        }
        tracing::debug!("Disconnected {}", edge);

        if self.registry.contains(&edge.target) {
            self.registry.deliver(
                &edge.target,
                InboundEvent::Disconnect {
                    handle: edge.target_handle,
                },
                "edge removal",
            )?;
        }
        Ok(())
    }

    /// Fan a processor emission out along the edges leaving its node.
    fn route(
        &mut self,
        node_id: NodeId,
        subscription: SubscriptionId,
        event: OutboundEvent,
    ) -> Result<()> {
        if !self.registry.is_live(&node_id, subscription) {
            return match self.config.stale_events {
                StaleEventPolicy::Drop => {
                    tracing::warn!(
                        "Dropping stale {} from node {} ({:?} is no longer live)",
                        event.kind(),
                        node_id,
                        subscription
                    );
                    Ok(())
                }
                StaleEventPolicy::Fatal => Err(EngineError::missing_actor(&node_id, "output routing")),
            };
        }

        match event {
            OutboundEvent::Output(data) => {
                for edge in self.edges.fan_out(&node_id) {
                    self.registry.deliver(
                        &edge.target,
                        InboundEvent::Input {
                            handle: edge.target_handle,
                            data: data.clone(),
                        },
                        "output routing",
                    )?;
                }
            }
            OutboundEvent::Error(message) => {
                tracing::debug!("Node {} reported error: {}", node_id, message);
                for edge in self.edges.fan_out(&node_id) {
                    self.registry.deliver(
                        &edge.target,
                        InboundEvent::Pending {
                            handle: edge.target_handle,
                        },
                        "error routing",
                    )?;
                }
            }
            OutboundEvent::Started | OutboundEvent::Pending => {
                tracing::trace!("Node {} is {}", node_id, event.kind());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .field("actors", &self.registry.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}
