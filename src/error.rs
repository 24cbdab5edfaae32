//! Error handling for the pipeflow engine
//!
//! Only structural failures live here: a broken invariant between the graph
//! source and the engine (unknown node type, a missing actor, runaway
//! propagation). Failures a processor reports about its own work travel as
//! `OutboundEvent::Error` and never become an `EngineError`.

use crate::pipeline::id::NodeId;
use thiserror::Error;

/// Main error type for pipeflow operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A node was added whose type has no registered factory
    #[error("No processor factory found for type '{0}'")]
    UnknownNodeType(String),

    /// A node was added without a type at all
    #[error("Node {0} must have a type")]
    MissingNodeType(NodeId),

    /// An operation needed a live actor that is not in the registry
    #[error("No processor found for node {node_id} during {during}")]
    MissingActor {
        node_id: NodeId,
        during: &'static str,
    },

    /// A processor refused an inbound event it can never accept
    #[error("Processor {node_id} rejected event: {message}")]
    ProcessorRejected { node_id: NodeId, message: String },

    /// One drain pass applied more events than the configured budget
    #[error("Propagation limit of {limit} events per drain exceeded (cycle in the graph?)")]
    PropagationLimit { limit: usize },

    /// The dispatcher hit a structural error earlier and no longer accepts events
    #[error("Dispatcher is faulted and rejects further events")]
    Faulted,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn missing_actor(node_id: &NodeId, during: &'static str) -> Self {
        EngineError::MissingActor {
            node_id: node_id.clone(),
            during,
        }
    }

    pub fn rejected(node_id: &NodeId, message: impl Into<String>) -> Self {
        EngineError::ProcessorRejected {
            node_id: node_id.clone(),
            message: message.into(),
        }
    }
}

/// Result type alias for pipeflow operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
