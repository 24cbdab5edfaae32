//! Output side of a processor.
//!
//! An `Emitter` is handed to a processor when it is created. It pushes
//! outbound events onto the dispatcher bus, keeps the processor's
//! [`LastOutput`] for replay, and mirrors every emission to the status board.
//! Clones share state, so a background thread owned by the processor can emit
//! through its own clone.

use crate::pipeline::event::{BusEvent, LastOutput, OutboundEvent, Payload};
use crate::pipeline::id::{NodeId, SubscriptionId};
use crate::pipeline::status::StatusBoard;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub struct Emitter {
    node_id: NodeId,
    subscription: SubscriptionId,
    tx: Sender<BusEvent>,
    subscribed: Arc<AtomicBool>,
    last_output: Arc<Mutex<LastOutput>>,
    status: StatusBoard,
}

impl Emitter {
    pub(crate) fn new(
        node_id: NodeId,
        subscription: SubscriptionId,
        tx: Sender<BusEvent>,
        status: StatusBoard,
    ) -> Self {
        Self {
            node_id,
            subscription,
            tx,
            subscribed: Arc::new(AtomicBool::new(true)),
            last_output: Arc::new(Mutex::new(LastOutput::Pending)),
            status,
        }
    }

    /// An emitter wired to a private channel instead of a dispatcher.
    ///
    /// Useful for driving a processor on its own, e.g. in tests.
    pub fn detached(node_id: impl Into<NodeId>) -> (Self, Receiver<BusEvent>) {
        let (tx, rx) = unbounded();
        let emitter = Self::new(
            node_id.into(),
            SubscriptionId(0),
            tx,
            StatusBoard::new(),
        );
        (emitter, rx)
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn notify_start(&self) {
        self.emit(OutboundEvent::Started);
    }

    /// Record `data` as the last output and emit it.
    pub fn notify_output(&self, data: Payload) {
        *self.lock_last() = LastOutput::Output(data.clone());
        self.emit(OutboundEvent::Output(data));
    }

    /// Record "no value" as the last output and emit `pending`.
    pub fn notify_pending(&self) {
        *self.lock_last() = LastOutput::Pending;
        self.emit(OutboundEvent::Pending);
    }

    /// Emit an error. The last output is kept for replay.
    pub fn notify_error(&self, error: impl fmt::Display) {
        self.emit(OutboundEvent::Error(error.to_string()));
    }

    pub fn previous_output(&self) -> LastOutput {
        self.lock_last().clone()
    }

    /// Seed the replay value without emitting anything.
    pub fn set_previous_output(&self, last: LastOutput) {
        *self.lock_last() = last;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    /// Stop forwarding emissions. Shared by every clone.
    pub(crate) fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::Release);
    }

    fn emit(&self, event: OutboundEvent) {
        if !self.is_subscribed() {
            tracing::trace!(node = %self.node_id, kind = event.kind(), "emission after unsubscribe dropped");
            return;
        }
        self.status.publish(&self.node_id, &event);
        let bus_event = BusEvent::Processor {
            node_id: self.node_id.clone(),
            subscription: self.subscription,
            event,
        };
        if self.tx.send(bus_event).is_err() {
            tracing::trace!(node = %self.node_id, "dispatcher bus closed");
        }
    }

    fn lock_last(&self) -> MutexGuard<'_, LastOutput> {
        self.last_output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("node_id", &self.node_id)
            .field("subscription", &self.subscription)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
