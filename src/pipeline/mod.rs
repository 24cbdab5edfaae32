//! Reactive dataflow engine.
//!
//! A declarative graph of nodes and edges is turned into a live network of
//! processors (one actor per node). Each new graph snapshot is diffed against
//! the previous one and the resulting changes are applied by a single-writer
//! dispatcher, which also routes processor output along the edges.
//!
//! # Architecture
//!
//! ```text
//! [GraphSnapshot] ──► [GraphDiffer] ──► [Dispatcher] ──► [ActorRegistry] ──► processors
//!                                            ▲   │                               │
//!                                            │   └──► [EdgeTable] (fan-out)       │
//!                                            └──────── bus ◄──── Emitter ◄───────┘
//! ```
//!
//! # Design
//!
//! - **Enum dispatch for built-ins**: `BuiltinProcessor` covers the shipped
//!   node types, `Processor` trait objects cover everything registered later.
//! - **One queue**: graph changes and processor output share a FIFO, drained
//!   iteratively, so reactions never recurse.
//! - **Replay-on-connect**: every emitter keeps its last output, which a new
//!   edge delivers immediately.
//! - **Dedicated thread**: `spawn_engine` runs the dispatcher behind an
//!   `EngineBridge`; status is read through the `StatusBoard`.

pub mod bridge;
pub mod differ;
pub mod dispatcher;
pub mod edges;
pub mod emitter;
pub mod event;
pub mod factory;
pub mod graph;
pub mod id;
pub mod node;
pub mod node_type;
pub mod nodes;
pub mod registry;
pub mod status;

pub use bridge::{spawn_engine, EngineBridge, EngineCommand};
pub use differ::{diff, GraphDiff, GraphDiffer};
pub use dispatcher::{Dispatcher, DispatcherState};
pub use edges::EdgeTable;
pub use emitter::Emitter;
pub use event::{BusEvent, GraphChange, InboundEvent, LastOutput, OutboundEvent, Payload};
pub use factory::{BuiltinFactory, FactoryRegistry, FnFactory, ProcessorFactory};
pub use graph::{Edge, GraphSnapshot, Node};
pub use id::{HandleId, NodeId, SubscriptionId};
pub use node::{AnyProcessor, BuiltinProcessor, Processor};
pub use node_type::NodeType;
pub use registry::{ActorEntry, ActorRegistry};
pub use status::{StatusBoard, StatusUpdate};
