//! JsonEProcessor - renders a JSON-e template against a context.
//!
//! Two named inputs:
//! - `template` - the template value, taken as-is.
//! - `context` - an object, or JSON text parsed into one.
//!
//! Once both are present every change re-renders and emits the result.
//! Losing either input (pending upstream or removed edge) clears it and
//! makes the node pending.

use crate::error::Result;
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, Payload};
use crate::pipeline::id::HandleId;
use crate::scripting::TemplateRenderer;

pub const TEMPLATE_HANDLE: &str = "template";
pub const CONTEXT_HANDLE: &str = "context";

pub struct JsonEProcessor {
    emitter: Emitter,
    renderer: TemplateRenderer,
    template: Option<Payload>,
    context: Option<Payload>,
}

impl JsonEProcessor {
    pub fn new(emitter: Emitter) -> Self {
        Self {
            emitter,
            renderer: TemplateRenderer::new(),
            template: None,
            context: None,
        }
    }

    pub fn name(&self) -> &str {
        "JSON-e Renderer"
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Input { handle, data } => {
                match handle.as_ref().map(HandleId::as_str) {
                    Some(TEMPLATE_HANDLE) => self.template = Some(data),
                    Some(CONTEXT_HANDLE) => match data {
                        Payload::String(text) => match serde_json::from_str(&text) {
                            Ok(context) => self.context = Some(context),
                            Err(e) => {
                                self.emitter
                                    .notify_error(format!("Invalid context JSON: {}", e));
                                return Ok(());
                            }
                        },
                        other => self.context = Some(other),
                    },
                    other => {
                        tracing::debug!(
                            node = %self.emitter.node_id(),
                            "Input on unknown handle {:?} ignored",
                            other
                        );
                        return Ok(());
                    }
                }
                self.render();
            }
            InboundEvent::Pending { handle } | InboundEvent::Disconnect { handle } => {
                match handle.as_ref().map(HandleId::as_str) {
                    Some(TEMPLATE_HANDLE) => self.template = None,
                    Some(CONTEXT_HANDLE) => self.context = None,
                    _ => {}
                }
                self.emitter.notify_pending();
            }
            InboundEvent::Update { .. } => {}
        }
        Ok(())
    }

    fn render(&self) {
        let (Some(template), Some(context)) = (&self.template, &self.context) else {
            return;
        };
        match self.renderer.render(template, context) {
            Ok(rendered) => self.emitter.notify_output(rendered),
            Err(e) => self.emitter.notify_error(e),
        }
    }
}
