//! Recording test processors
//!
//! Registered on top of the built-ins under three type names:
//! - `sink` records what it receives and never emits
//! - `relay` records and re-emits every input as output
//! - `burst` emits each element of `data.outputs` on update, and an error
//!   for `data.fail`

use pipeflow_rs::pipeline::{
    AnyProcessor, Emitter, FactoryRegistry, InboundEvent, Processor,
};
use pipeflow_rs::{EngineConfig, Result};
use std::sync::{Arc, Mutex};

/// One inbound event as seen by one node
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub node: String,
    pub event: InboundEvent,
}

pub type Journal = Arc<Mutex<Vec<Entry>>>;

#[derive(Debug, Clone, Copy)]
enum Mode {
    Sink,
    Relay,
    Burst,
}

pub struct RecordingProcessor {
    emitter: Emitter,
    journal: Journal,
    mode: Mode,
}

impl Processor for RecordingProcessor {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        self.journal.lock().unwrap().push(Entry {
            node: self.emitter.node_id().to_string(),
            event: event.clone(),
        });

        match (self.mode, event) {
            (Mode::Relay, InboundEvent::Input { data, .. }) => self.emitter.notify_output(data),
            (Mode::Burst, InboundEvent::Update { data }) => {
                if let Some(message) = data.get("fail").and_then(|m| m.as_str()) {
                    self.emitter.notify_error(message);
                }
                for output in data
                    .get("outputs")
                    .and_then(|o| o.as_array())
                    .cloned()
                    .unwrap_or_default()
                {
                    self.emitter.notify_output(output);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Built-in factories plus `sink`, `relay` and `burst`, sharing one journal
pub fn recording_factories(config: &EngineConfig) -> (FactoryRegistry, Journal) {
    let journal: Journal = Arc::default();
    let mut factories = FactoryRegistry::with_builtins(config);
    for (type_name, mode) in [("sink", Mode::Sink), ("relay", Mode::Relay), ("burst", Mode::Burst)] {
        let journal = journal.clone();
        factories.register_fn(type_name, move |_, _, emitter| {
            Ok(AnyProcessor::plugin(RecordingProcessor {
                emitter,
                journal: journal.clone(),
                mode,
            }))
        });
    }
    (factories, journal)
}

/// Everything `node` received, in order
pub fn received(journal: &Journal, node: &str) -> Vec<InboundEvent> {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.node == node)
        .map(|e| e.event.clone())
        .collect()
}

/// Compact journal lines like `b:input(in)="x"`, across all nodes
pub fn journal_lines(journal: &Journal) -> Vec<String> {
    journal
        .lock()
        .unwrap()
        .iter()
        .map(|entry| match &entry.event {
            InboundEvent::Input { handle, data } => format!(
                "{}:input({})={}",
                entry.node,
                handle.as_ref().map_or("", |h| h.as_str()),
                data
            ),
            other => format!(
                "{}:{}({})",
                entry.node,
                other.kind(),
                other.handle().map_or("", |h| h.as_str())
            ),
        })
        .collect()
}

pub fn clear(journal: &Journal) {
    journal.lock().unwrap().clear();
}
