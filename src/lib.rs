//! # Pipeflow-RS: Reactive Pipeline Engine
//!
//! Keeps a live network of stateful processors in sync with an editable
//! pipeline graph (file loads, JSON parsing, templating) and propagates data
//! along its edges in a deterministic order.
//!
//! ## Architecture
//!
//! - **Pipeline**: graph differ, actor registry, edge table and the
//!   single-writer dispatcher, plus the built-in processors
//! - **Scripting**: Rhai-backed expressions for the JSON-e renderer node
//! - **Communication**: Crossbeam channels between the dispatcher thread,
//!   background processors and the graph source
//!
//! ## Configuration
//!
//! Engine settings are read from `config.toml` in the platform-appropriate
//! data directory under `dev.pipeflow.pipeflow-rs`, or from an explicit path.
//!
//! ## Example
//!
//! ```ignore
//! use pipeflow_rs::{
//!     config::{EngineConfig, ProjectFile},
//!     pipeline::{Dispatcher, NodeId},
//! };
//!
//! let config = EngineConfig::load_or_default(None);
//! let project = ProjectFile::load("pricing.pipeflow.json")?;
//!
//! let mut dispatcher = Dispatcher::with_builtins(&config);
//! dispatcher.apply_snapshot(project.graph)?;
//! println!("{:?}", dispatcher.last_output(&NodeId::from("node-6")));
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod scripting;

// Re-export commonly used types
pub use config::{EngineConfig, ProjectFile, StaleEventPolicy};
pub use error::{EngineError, Result};
pub use pipeline::{
    spawn_engine, Dispatcher, EngineBridge, FactoryRegistry, GraphSnapshot, NodeId, Processor,
};
pub use scripting::{ExpressionEngine, TemplateRenderer};
