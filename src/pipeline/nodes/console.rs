//! ConsoleProcessor - sink that logs whatever reaches it.

use crate::error::Result;
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, Payload};

pub struct ConsoleProcessor {
    emitter: Emitter,
    last_input: Option<Payload>,
}

impl ConsoleProcessor {
    pub fn new(emitter: Emitter) -> Self {
        Self {
            emitter,
            last_input: None,
        }
    }

    pub fn name(&self) -> &str {
        "Console"
    }

    /// Most recent input, cleared when the upstream goes pending or away.
    pub fn last_input(&self) -> Option<&Payload> {
        self.last_input.as_ref()
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Input { handle, data } => {
                tracing::info!(node = %self.emitter.node_id(), handle = ?handle, "{}", data);
                self.last_input = Some(data);
            }
            InboundEvent::Pending { .. } | InboundEvent::Disconnect { .. } => {
                self.last_input = None;
            }
            InboundEvent::Update { .. } => {}
        }
        Ok(())
    }
}
