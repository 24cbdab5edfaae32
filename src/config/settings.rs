//! Engine settings
//!
//! Knobs that shape how the dispatcher treats unusual traffic, plus the
//! ambient settings of the runner binary.
//!
//! # Main Types
//!
//! - [`EngineConfig`] - Everything the engine and its built-in processors read
//! - [`StaleEventPolicy`] - What to do with output from an actor that is gone
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! max_events_per_drain = 5000
//! stale_events = "fatal"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on events applied in one drain pass
pub const DEFAULT_MAX_EVENTS_PER_DRAIN: usize = 100_000;

/// Default polling cadence of file sources in milliseconds
pub const DEFAULT_FILE_POLL_INTERVAL_MS: u64 = 250;

/// Policy for outbound events whose actor was removed (or replaced) after
/// they were queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleEventPolicy {
    /// Log a warning and skip the event
    #[default]
    Drop,
    /// Treat it like any other missing-actor error
    Fatal,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum events one drain pass may apply before the dispatcher gives up.
    /// Guards against runaway propagation around a cycle.
    pub max_events_per_drain: usize,

    /// Log a warning when an added edge closes a cycle
    pub warn_on_cycles: bool,

    /// What to do with output from a removed actor
    pub stale_events: StaleEventPolicy,

    /// Polling cadence of the file source in milliseconds
    pub file_poll_interval_ms: u64,

    /// Directory for rolling log files (stderr only when unset)
    pub log_dir: Option<PathBuf>,

    /// Default tracing filter when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events_per_drain: DEFAULT_MAX_EVENTS_PER_DRAIN,
            warn_on_cycles: true,
            stale_events: StaleEventPolicy::Drop,
            file_poll_interval_ms: DEFAULT_FILE_POLL_INTERVAL_MS,
            log_dir: None,
            log_filter: "info,pipeflow_rs=debug".to_string(),
        }
    }
}

impl EngineConfig {
    /// File poll interval as a duration (never zero)
    pub fn file_poll_interval(&self) -> Duration {
        Duration::from_millis(self.file_poll_interval_ms.max(1))
    }

    /// Builder-style override of the drain budget
    pub fn with_max_events_per_drain(mut self, limit: usize) -> Self {
        self.max_events_per_drain = limit;
        self
    }

    /// Builder-style override of the stale event policy
    pub fn with_stale_events(mut self, policy: StaleEventPolicy) -> Self {
        self.stale_events = policy;
        self
    }

    /// Builder-style override of the file poll interval
    pub fn with_file_poll_interval(mut self, interval: Duration) -> Self {
        self.file_poll_interval_ms = interval.as_millis() as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("stale_events = \"fatal\"").unwrap();
        assert_eq!(config.stale_events, StaleEventPolicy::Fatal);
        assert_eq!(config.max_events_per_drain, DEFAULT_MAX_EVENTS_PER_DRAIN);
        assert!(config.warn_on_cycles);
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let config = EngineConfig {
            file_poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.file_poll_interval(), Duration::from_millis(1));
    }
}
