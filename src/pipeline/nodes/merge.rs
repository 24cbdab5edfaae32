//! MergeProcessor - combines several inputs into one object.
//!
//! Node data maps input handles to output keys:
//!
//! ```json
//! { "keys": { "in-0": "customer", "in-1": "order" } }
//! ```
//!
//! Each connected input contributes `{key: value}`; a handle without a
//! mapping uses its own name as the key. The merged object is emitted every
//! time one of the inputs changes.

use crate::error::Result;
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::{InboundEvent, Payload};
use crate::pipeline::id::HandleId;
use serde_json::Map;
use std::collections::{BTreeMap, HashMap};

/// Key used for edges that carry no target handle
const DEFAULT_HANDLE: &str = "value";

pub struct MergeProcessor {
    emitter: Emitter,
    keys: HashMap<String, String>,
    inputs: BTreeMap<String, Payload>,
}

impl MergeProcessor {
    pub fn new(data: &Payload, emitter: Emitter) -> Self {
        Self {
            emitter,
            keys: keys_of(data),
            inputs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        "Merge"
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Update { data } => {
                self.keys = keys_of(&data);
                if !self.inputs.is_empty() {
                    self.emit_merged();
                }
            }
            InboundEvent::Input { handle, data } => {
                self.inputs.insert(handle_name(handle.as_ref()), data);
                self.emit_merged();
            }
            InboundEvent::Pending { handle } => {
                self.inputs.remove(&handle_name(handle.as_ref()));
                self.emitter.notify_pending();
            }
            InboundEvent::Disconnect { handle } => {
                self.inputs.remove(&handle_name(handle.as_ref()));
                self.emit_merged();
            }
        }
        Ok(())
    }

    fn emit_merged(&self) {
        let mut merged = Map::new();
        for (handle, value) in &self.inputs {
            let key = self.keys.get(handle).unwrap_or(handle);
            merged.insert(key.clone(), value.clone());
        }
        self.emitter.notify_output(Payload::Object(merged));
    }
}

fn handle_name(handle: Option<&HandleId>) -> String {
    handle
        .map(HandleId::as_str)
        .unwrap_or(DEFAULT_HANDLE)
        .to_string()
}

fn keys_of(data: &Payload) -> HashMap<String, String> {
    data.get("keys")
        .and_then(Payload::as_object)
        .map(|keys| {
            keys.iter()
                .filter_map(|(handle, key)| Some((handle.clone(), key.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::event::{BusEvent, OutboundEvent};
    use crossbeam_channel::Receiver;
    use serde_json::json;

    fn last(rx: &Receiver<BusEvent>) -> Option<OutboundEvent> {
        rx.try_iter()
            .filter_map(|e| match e {
                BusEvent::Processor { event, .. } => Some(event),
                BusEvent::Graph(_) => None,
            })
            .last()
    }

    fn on(handle: &str, data: Payload) -> InboundEvent {
        InboundEvent::Input {
            handle: Some(handle.into()),
            data,
        }
    }

    #[test]
    fn test_merges_by_configured_keys() {
        let (emitter, rx) = Emitter::detached("m");
        let mut merge = MergeProcessor::new(
            &json!({ "keys": { "in-0": "customer", "in-1": "order" } }),
            emitter,
        );
        merge.on_event(on("in-0", json!({ "id": 7 }))).unwrap();
        merge.on_event(on("in-1", json!([1, 2]))).unwrap();

        assert_eq!(
            last(&rx),
            Some(OutboundEvent::Output(json!({ "customer": { "id": 7 }, "order": [1, 2] })))
        );
    }

    #[test]
    fn test_unmapped_handle_uses_its_name() {
        let (emitter, rx) = Emitter::detached("m");
        let mut merge = MergeProcessor::new(&json!({}), emitter);
        merge.on_event(on("extra", json!(true))).unwrap();
        merge
            .on_event(InboundEvent::Input {
                handle: None,
                data: json!(1),
            })
            .unwrap();
        assert_eq!(
            last(&rx),
            Some(OutboundEvent::Output(json!({ "extra": true, "value": 1 })))
        );
    }

    #[test]
    fn test_disconnect_drops_key_and_re_emits() {
        let (emitter, rx) = Emitter::detached("m");
        let mut merge = MergeProcessor::new(&json!({}), emitter);
        merge.on_event(on("a", json!(1))).unwrap();
        merge.on_event(on("b", json!(2))).unwrap();
        merge
            .on_event(InboundEvent::Disconnect {
                handle: Some("a".into()),
            })
            .unwrap();
        assert_eq!(last(&rx), Some(OutboundEvent::Output(json!({ "b": 2 }))));
    }

    #[test]
    fn test_pending_input_makes_merge_pending() {
        let (emitter, rx) = Emitter::detached("m");
        let mut merge = MergeProcessor::new(&json!({}), emitter);
        merge.on_event(on("a", json!(1))).unwrap();
        merge
            .on_event(InboundEvent::Pending {
                handle: Some("a".into()),
            })
            .unwrap();
        assert_eq!(last(&rx), Some(OutboundEvent::Pending));
    }

    #[test]
    fn test_key_update_re_emits() {
        let (emitter, rx) = Emitter::detached("m");
        let mut merge = MergeProcessor::new(&json!({}), emitter);
        merge.on_event(on("a", json!(1))).unwrap();
        merge
            .on_event(InboundEvent::Update {
                data: json!({ "keys": { "a": "renamed" } }),
            })
            .unwrap();
        assert_eq!(last(&rx), Some(OutboundEvent::Output(json!({ "renamed": 1 }))));
    }
}
