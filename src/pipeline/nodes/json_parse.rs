//! JsonParseProcessor - turns JSON text into structured data.
//!
//! String inputs are parsed; a parse failure is reported as an error so
//! downstream nodes see "no value" while the last good parse stays
//! available for replay. Non-string inputs are already structured and pass
//! through unchanged.

use crate::error::Result;
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, Payload};

pub struct JsonParseProcessor {
    emitter: Emitter,
}

impl JsonParseProcessor {
    pub fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }

    pub fn name(&self) -> &str {
        "JSON Parse"
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Input {
                data: Payload::String(text),
                ..
            } => match serde_json::from_str::<Payload>(&text) {
                Ok(value) => self.emitter.notify_output(value),
                Err(e) => self.emitter.notify_error(format!("Invalid JSON: {}", e)),
            },
            InboundEvent::Input { data, .. } => self.emitter.notify_output(data),
            InboundEvent::Pending { .. } | InboundEvent::Disconnect { .. } => {
                self.emitter.notify_pending()
            }
            InboundEvent::Update { .. } => {}
        }
        Ok(())
    }
}
