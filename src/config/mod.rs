//! Configuration module for pipeflow
//!
//! This module handles:
//! - Engine settings ([`EngineConfig`]) loaded from TOML or JSON
//! - Project files holding a saved pipeline graph
//!
//! # App Data Location
//!
//! The default config file lives in the platform-appropriate data directory:
//! - **Linux**: `~/.local/share/dev.pipeflow.pipeflow-rs/`
//! - **macOS**: `~/Library/Application Support/dev.pipeflow.pipeflow-rs/`
//! - **Windows**: `%APPDATA%\dev.pipeflow.pipeflow-rs\`
//!
//! # Example
//!
//! ```ignore
//! use pipeflow_rs::config::{EngineConfig, ProjectFile};
//!
//! let config = EngineConfig::load_or_default(None);
//! let project = ProjectFile::load("pricing.pipeflow.json")?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{EngineError, Result};
use crate::pipeline::graph::GraphSnapshot;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.pipeflow.pipeflow-rs";

/// Default config filename inside the app data directory
pub const CONFIG_FILE: &str = "config.toml";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Engine Config Loading ====================

impl EngineConfig {
    /// Load a config file; `.json` is parsed as JSON, anything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        if is_json(path) {
            serde_json::from_str(&content).map_err(|e| {
                EngineError::Config(format!("Failed to parse config {:?}: {}", path, e))
            })
        } else {
            toml::from_str(&content).map_err(|e| {
                EngineError::Config(format!("Failed to parse config {:?}: {}", path, e))
            })
        }
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// Falls back to defaults on any error.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Self::default(),
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| EngineError::Config(format!("Failed to write config {:?}: {}", path, e)))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

// ==================== Project File ====================

/// A saved pipeline graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Project file format version for future compatibility
    #[serde(default = "default_project_version")]
    pub version: u32,

    /// Project name
    #[serde(default)]
    pub name: String,

    /// The graph, in node-editor store shape
    #[serde(default, flatten)]
    pub graph: GraphSnapshot,
}

fn default_project_version() -> u32 {
    1
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            version: 1,
            name: "Untitled Project".to_string(),
            graph: GraphSnapshot::default(),
        }
    }
}

impl ProjectFile {
    /// Create a project around an existing graph
    pub fn new(name: impl Into<String>, graph: GraphSnapshot) -> Self {
        Self {
            version: 1,
            name: name.into(),
            graph,
        }
    }

    /// Load a project file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read project file {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            EngineError::Config(format!("Failed to parse project file {:?}: {}", path, e))
        })
    }

    /// Save project file to disk as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            EngineError::Serialization(format!("Failed to serialize project: {}", e))
        })?;
        std::fs::write(path, content).map_err(|e| {
            EngineError::Config(format!("Failed to write project file {:?}: {}", path, e))
        })
    }
}
