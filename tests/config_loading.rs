//! Loading engine configuration and saved projects from disk

use pipeflow_rs::pipeline::{Dispatcher, LastOutput};
use pipeflow_rs::{EngineConfig, NodeId, ProjectFile, StaleEventPolicy};
use serde_json::json;
use std::time::Duration;

/// A project as the node editor saves it, with fields the engine ignores
const EDITOR_PROJECT: &str = r#"{
    "version": 1,
    "name": "greeting",
    "viewport": { "x": 0, "y": 0, "zoom": 1.5 },
    "nodes": [
        { "id": "text", "type": "codeNode", "position": { "x": 10, "y": 20 },
          "data": { "code": "{\"greeting\": \"hello\"}" } },
        { "id": "parse", "type": "jsonParse", "position": { "x": 200, "y": 20 }, "data": {} }
    ],
    "edges": [
        { "id": "e1", "source": "text", "target": "parse",
          "sourceHandle": null, "targetHandle": null, "animated": true }
    ]
}"#;

#[test]
fn test_editor_project_loads_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greeting.json");
    std::fs::write(&path, EDITOR_PROJECT).unwrap();

    let project = ProjectFile::load(&path).unwrap();
    assert_eq!(project.name, "greeting");
    assert_eq!(project.graph.nodes.len(), 2);
    assert_eq!(project.graph.edges[0].target_handle, None);

    let mut dispatcher = Dispatcher::with_builtins(&EngineConfig::default());
    dispatcher.apply_snapshot(project.graph).unwrap();
    assert_eq!(
        dispatcher.last_output(&NodeId::from("parse")),
        Some(LastOutput::Output(json!({ "greeting": "hello" })))
    );
}

#[test]
fn test_broken_project_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"nodes\": [").unwrap();

    let err = ProjectFile::load(&path).unwrap_err();
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_engine_config_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
max_events_per_drain = 500
stale_events = "fatal"
file_poll_interval_ms = 40
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.max_events_per_drain, 500);
    assert_eq!(config.stale_events, StaleEventPolicy::Fatal);
    assert_eq!(config.file_poll_interval(), Duration::from_millis(40));
    // unspecified fields keep their defaults
    assert_eq!(config.warn_on_cycles, EngineConfig::default().warn_on_cycles);
}

#[test]
fn test_engine_config_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{ "stale_events": "drop", "log_filter": "warn" }"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.stale_events, StaleEventPolicy::Drop);
    assert_eq!(config.log_filter, "warn");
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load_or_default(Some(dir.path().join("nope.toml").as_path()));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = EngineConfig::default().with_max_events_per_drain(42);
    config.save(&path).unwrap();

    assert_eq!(EngineConfig::load(&path).unwrap(), config);
}
