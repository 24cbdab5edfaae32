//! CodeProcessor - literal source node.
//!
//! Holds the text typed into the node (`data.code`). The value is available
//! for replay from the moment the node exists; it is only emitted when the
//! node's data changes.

use crate::error::Result;
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, LastOutput, Payload};

pub struct CodeProcessor {
    emitter: Emitter,
}

impl CodeProcessor {
    pub fn new(data: &Payload, emitter: Emitter) -> Self {
        emitter.set_previous_output(LastOutput::Output(code_of(data)));
        Self { emitter }
    }

    pub fn name(&self) -> &str {
        "Code"
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        if let InboundEvent::Update { data } = event {
            self.emitter.notify_output(code_of(&data));
        }
        Ok(())
    }
}

fn code_of(data: &Payload) -> Payload {
    data.get("code").cloned().unwrap_or(Payload::Null)
}
