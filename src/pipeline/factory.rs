//! Factory registry for creating processors by node type.
//!
//! The registry maps a node-type string to a [`ProcessorFactory`]. It is the
//! only extension point for new node behaviours: register a factory under a
//! new type string and graphs may start using it.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::pipeline::emitter::Emitter;
use crate::pipeline::event::Payload;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{AnyProcessor, BuiltinProcessor};
use crate::pipeline::node_type::NodeType;
use crate::pipeline::nodes::{
    CodeProcessor, ConsoleProcessor, JsonEProcessor, JsonParseProcessor, MergeProcessor,
    PlatformFileProcessor,
};
use std::collections::HashMap;
use std::time::Duration;

/// Constructs the processor for one node.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessorFactory: Send + Sync {
    fn create(&self, node_id: &NodeId, data: &Payload, emitter: Emitter) -> Result<AnyProcessor>;
}

/// Adapter turning a closure into a factory.
pub struct FnFactory<F>(pub F);

impl<F> ProcessorFactory for FnFactory<F>
where
    F: Fn(&NodeId, &Payload, Emitter) -> Result<AnyProcessor> + Send + Sync,
{
    fn create(&self, node_id: &NodeId, data: &Payload, emitter: Emitter) -> Result<AnyProcessor> {
        (self.0)(node_id, data, emitter)
    }
}

/// Factory for the built-in node types.
///
/// The file source needs its poll interval, so the factory carries it
/// from the engine configuration.
pub struct BuiltinFactory {
    node_type: NodeType,
    file_poll_interval: Duration,
}

impl BuiltinFactory {
    pub fn new(node_type: NodeType, file_poll_interval: Duration) -> Self {
        Self {
            node_type,
            file_poll_interval,
        }
    }
}

impl ProcessorFactory for BuiltinFactory {
    fn create(&self, _node_id: &NodeId, data: &Payload, emitter: Emitter) -> Result<AnyProcessor> {
        let processor = match self.node_type {
            NodeType::Code => BuiltinProcessor::Code(CodeProcessor::new(data, emitter)),
            NodeType::Console => BuiltinProcessor::Console(ConsoleProcessor::new(emitter)),
            NodeType::JsonParse => BuiltinProcessor::JsonParse(JsonParseProcessor::new(emitter)),
            NodeType::JsonE => BuiltinProcessor::JsonE(JsonEProcessor::new(emitter)),
            NodeType::Merge => BuiltinProcessor::Merge(MergeProcessor::new(data, emitter)),
            NodeType::PlatformFile => BuiltinProcessor::PlatformFile(PlatformFileProcessor::new(
                data,
                emitter,
                self.file_poll_interval,
            )?),
        };
        Ok(processor.into())
    }
}

/// Node-type string → factory.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Box<dyn ProcessorFactory>>,
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in node type.
    pub fn with_builtins(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        let interval = config.file_poll_interval();
        for node_type in NodeType::all() {
            registry.register(node_type.type_name(), BuiltinFactory::new(*node_type, interval));
        }
        registry
    }

    /// Register (or replace) the factory for `type_name`.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: impl ProcessorFactory + 'static,
    ) -> &mut Self {
        let type_name = type_name.into();
        if self
            .factories
            .insert(type_name.clone(), Box::new(factory))
            .is_some()
        {
            tracing::debug!("Replaced processor factory for '{}'", type_name);
        }
        self
    }

    /// Register a closure as the factory for `type_name`.
    pub fn register_fn<F>(&mut self, type_name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&NodeId, &Payload, Emitter) -> Result<AnyProcessor> + Send + Sync + 'static,
    {
        self.register(type_name, FnFactory(f))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type strings, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build the processor for a node of `type_name`.
    pub fn create(
        &self,
        type_name: &str,
        node_id: &NodeId,
        data: &Payload,
        emitter: Emitter,
    ) -> Result<AnyProcessor> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| EngineError::UnknownNodeType(type_name.to_string()))?;
        factory.create(node_id, data, emitter)
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_cover_every_node_type() {
        let registry = FactoryRegistry::with_builtins(&EngineConfig::default());
        for ty in NodeType::all() {
            assert!(registry.contains(ty.type_name()), "missing {}", ty.type_name());
        }
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = FactoryRegistry::new();
        let (emitter, _rx) = Emitter::detached("x");
        let err = registry
            .create("nope", &NodeId::from("x"), &json!(null), emitter)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNodeType(t) if t == "nope"));
    }

    #[test]
    fn test_builtin_factory_builds_named_processor() {
        let registry = FactoryRegistry::with_builtins(&EngineConfig::default());
        let (emitter, _rx) = Emitter::detached("p");
        let processor = registry
            .create("jsonParse", &NodeId::from("p"), &json!(null), emitter)
            .unwrap();
        assert_eq!(processor.name(), "JSON Parse");
    }

    #[test]
    fn test_registered_factory_is_used() {
        let mut mock = MockProcessorFactory::new();
        mock.expect_create()
            .times(1)
            .returning(|_, _, emitter| {
                Ok(BuiltinProcessor::Console(ConsoleProcessor::new(emitter)).into())
            });

        let mut registry = FactoryRegistry::new();
        registry.register("custom", mock);
        let (emitter, _rx) = Emitter::detached("c");
        let processor = registry
            .create("custom", &NodeId::from("c"), &json!({}), emitter)
            .unwrap();
        assert_eq!(processor.name(), "Console");
        assert_eq!(registry.type_names(), vec!["custom"]);
    }
}
