//! Processor abstraction - the actor bound to one graph node.
//!
//! Two-layer design:
//! - **`Processor` trait** - open extension point for node types registered
//!   from outside the crate.
//! - **`BuiltinProcessor` enum** - the built-in node types, dispatched by match.
//!
//! `AnyProcessor` wraps either variant so the registry handles both uniformly.
//!
//! A processor reacts to one inbound event at a time and must not block.
//! Anything slow runs on the processor's own thread and reports back through
//! its [`Emitter`](crate::pipeline::emitter::Emitter).

use crate::error::Result;
use crate::pipeline::event::InboundEvent;
use crate::pipeline::nodes::{
    CodeProcessor, ConsoleProcessor, JsonEProcessor, JsonParseProcessor, MergeProcessor,
    PlatformFileProcessor,
};

/// Trait for pluggable/user-defined processors.
pub trait Processor: Send {
    /// Human-readable name of this processor.
    fn name(&self) -> &str;

    /// Handle one inbound event.
    ///
    /// Return `Err` only for events the processor can never accept; failures
    /// of its own work are reported with `Emitter::notify_error`.
    fn on_event(&mut self, event: InboundEvent) -> Result<()>;
}

/// Enum dispatch for built-in processors.
pub enum BuiltinProcessor {
    Code(CodeProcessor),
    Console(ConsoleProcessor),
    JsonParse(JsonParseProcessor),
    JsonE(JsonEProcessor),
    PlatformFile(PlatformFileProcessor),
    Merge(MergeProcessor),
}

impl BuiltinProcessor {
    pub fn name(&self) -> &str {
        match self {
            BuiltinProcessor::Code(p) => p.name(),
            BuiltinProcessor::Console(p) => p.name(),
            BuiltinProcessor::JsonParse(p) => p.name(),
            BuiltinProcessor::JsonE(p) => p.name(),
            BuiltinProcessor::PlatformFile(p) => p.name(),
            BuiltinProcessor::Merge(p) => p.name(),
        }
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match self {
            BuiltinProcessor::Code(p) => p.on_event(event),
            BuiltinProcessor::Console(p) => p.on_event(event),
            BuiltinProcessor::JsonParse(p) => p.on_event(event),
            BuiltinProcessor::JsonE(p) => p.on_event(event),
            BuiltinProcessor::PlatformFile(p) => p.on_event(event),
            BuiltinProcessor::Merge(p) => p.on_event(event),
        }
    }
}

/// Wrapper that holds either a built-in processor or a plugin (trait object).
pub enum AnyProcessor {
    Builtin(BuiltinProcessor),
    Plugin(Box<dyn Processor>),
}

impl AnyProcessor {
    pub fn plugin(processor: impl Processor + 'static) -> Self {
        AnyProcessor::Plugin(Box::new(processor))
    }

    pub fn name(&self) -> &str {
        match self {
            AnyProcessor::Builtin(p) => p.name(),
            AnyProcessor::Plugin(p) => p.name(),
        }
    }

    pub fn on_event(&mut self, event: InboundEvent) -> Result<()> {
        match self {
            AnyProcessor::Builtin(p) => p.on_event(event),
            AnyProcessor::Plugin(p) => p.on_event(event),
        }
    }
}

impl From<BuiltinProcessor> for AnyProcessor {
    fn from(processor: BuiltinProcessor) -> Self {
        AnyProcessor::Builtin(processor)
    }
}

impl std::fmt::Debug for AnyProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyProcessor::Builtin(p) => write!(f, "Builtin({})", p.name()),
            AnyProcessor::Plugin(p) => write!(f, "Plugin({})", p.name()),
        }
    }
}
