//! End-to-end pipelines built from the shipped node types

mod common;

use common::builders::SnapshotBuilder;
use common::recorder::{received, recording_factories, Journal};
use common::{assert_last_output, poll_until};
use pipeflow_rs::pipeline::{Dispatcher, DispatcherState, InboundEvent, LastOutput};
use pipeflow_rs::{EngineConfig, EngineError, NodeId};
use serde_json::json;
use std::time::Duration;

fn dispatcher_with(config: EngineConfig) -> (Dispatcher, Journal) {
    let (factories, journal) = recording_factories(&config);
    (Dispatcher::new(factories, &config), journal)
}

fn dispatcher() -> (Dispatcher, Journal) {
    dispatcher_with(EngineConfig::default())
}

fn parse_pipeline(code: &str) -> SnapshotBuilder {
    SnapshotBuilder::new()
        .code("text", code)
        .node("parse", "jsonParse", json!({}))
        .node("out", "sink", json!({}))
        .edge("text", "parse")
        .edge("parse", "out")
}

#[test]
fn test_code_into_json_parse_follows_edits() {
    let (mut d, journal) = dispatcher();
    d.apply_snapshot(parse_pipeline(r#"{"greeting":"hello"}"#).build())
        .unwrap();
    assert_last_output(&d, "parse", LastOutput::Output(json!({ "greeting": "hello" })));

    d.apply_snapshot(parse_pipeline(r#"{"greeting":"world"}"#).build())
        .unwrap();
    assert_last_output(&d, "parse", LastOutput::Output(json!({ "greeting": "world" })));

    let inputs: Vec<_> = received(&journal, "out")
        .into_iter()
        .filter_map(|e| match e {
            InboundEvent::Input { data, .. } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(inputs.last(), Some(&json!({ "greeting": "world" })));
    assert!(inputs.contains(&json!({ "greeting": "hello" })));
}

#[test]
fn test_invalid_json_turns_downstream_pending() {
    let (mut d, journal) = dispatcher();
    d.apply_snapshot(parse_pipeline("[1, 2]").build()).unwrap();
    d.apply_snapshot(parse_pipeline("[1, 2").build()).unwrap();

    assert_eq!(
        received(&journal, "out").last(),
        Some(&InboundEvent::Pending { handle: None })
    );
    // the error is visible on the status board, the replay value is kept
    let status = d.status_board().latest(&NodeId::from("parse")).unwrap();
    assert_eq!(status.event.kind(), "error");
    assert_last_output(&d, "parse", LastOutput::Output(json!([1, 2])));
}

#[test]
fn test_json_e_renders_template_against_context() {
    let (mut d, _) = dispatcher();
    let graph = |name: &str| {
        SnapshotBuilder::new()
            .code("tpl", r#"{"message": "hello ${name}", "admin": {"$eval": "level > 2"}}"#)
            .node("tpl_json", "jsonParse", json!({}))
            .code("ctx", &format!(r#"{{"name": "{}", "level": 3}}"#, name))
            .node("render", "jsonERendererNode", json!({}))
            .edge("tpl", "tpl_json")
            .edge_to("tpl_json", "render", "template")
            .edge_to("ctx", "render", "context")
            .build()
    };

    d.apply_snapshot(graph("ada")).unwrap();
    assert_last_output(
        &d,
        "render",
        LastOutput::Output(json!({ "message": "hello ada", "admin": true })),
    );

    d.apply_snapshot(graph("grace")).unwrap();
    assert_last_output(
        &d,
        "render",
        LastOutput::Output(json!({ "message": "hello grace", "admin": true })),
    );
}

#[test]
fn test_json_e_goes_pending_when_context_is_disconnected() {
    let (mut d, journal) = dispatcher();
    let base = SnapshotBuilder::new()
        .code("tpl", "${name}")
        .code("ctx", r#"{"name": "ada"}"#)
        .node("render", "jsonERendererNode", json!({}))
        .node("out", "sink", json!({}))
        .edge_to("tpl", "render", "template")
        .edge("render", "out");

    d.apply_snapshot(base.clone().edge_to("ctx", "render", "context").build())
        .unwrap();
    assert_last_output(&d, "render", LastOutput::Output(json!("ada")));

    let delivered = received(&journal, "out").len();
    d.apply_snapshot(base.build()).unwrap();
    assert_last_output(&d, "render", LastOutput::Pending);
    // going pending is not itself routed
    assert_eq!(received(&journal, "out").len(), delivered);
}

#[test]
fn test_merge_combines_named_inputs() {
    let (mut d, _) = dispatcher();
    let base = SnapshotBuilder::new()
        .code("a", "1")
        .code("b", "2")
        .node("merge", "mergeNode", json!({ "keys": { "left": "first", "right": "second" } }))
        .edge_to("a", "merge", "left");

    d.apply_snapshot(base.clone().edge_to("b", "merge", "right").build())
        .unwrap();
    assert_last_output(
        &d,
        "merge",
        LastOutput::Output(json!({ "first": "1", "second": "2" })),
    );

    d.apply_snapshot(base.build()).unwrap();
    assert_last_output(&d, "merge", LastOutput::Output(json!({ "first": "1" })));
}

#[test]
fn test_console_accepts_anything() {
    let (mut d, _) = dispatcher();
    d.apply_snapshot(
        SnapshotBuilder::new()
            .code("a", "shown")
            .node("log", "consoleNode", json!({}))
            .edge("a", "log")
            .build(),
    )
    .unwrap();
    d.apply_snapshot(SnapshotBuilder::new().node("log", "consoleNode", json!({})).build())
        .unwrap();

    assert_eq!(d.state(), DispatcherState::Idle);
    assert_eq!(d.last_output(&NodeId::from("log")), Some(LastOutput::Pending));
}

#[test]
fn test_platform_file_streams_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.json");
    std::fs::write(&path, r#"{"n": 1}"#).unwrap();

    let config = EngineConfig::default().with_file_poll_interval(Duration::from_millis(10));
    let (mut d, _) = dispatcher_with(config);
    d.apply_snapshot(
        SnapshotBuilder::new()
            .node("file", "platformFile", json!({ "filePath": path.to_string_lossy() }))
            .node("parse", "jsonParse", json!({}))
            .edge("file", "parse")
            .build(),
    )
    .unwrap();

    let parsed = |expected: serde_json::Value| {
        move |d: &Dispatcher| {
            d.last_output(&NodeId::from("parse")) == Some(LastOutput::Output(expected.clone()))
        }
    };
    assert!(poll_until(&mut d, parsed(json!({ "n": 1 }))));

    std::fs::write(&path, r#"{"n": 22}"#).unwrap();
    assert!(poll_until(&mut d, parsed(json!({ "n": 22 }))));
}

#[test]
fn test_platform_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");

    let config = EngineConfig::default().with_file_poll_interval(Duration::from_millis(10));
    let (mut d, _) = dispatcher_with(config);
    d.apply_snapshot(
        SnapshotBuilder::new()
            .node("file", "platformFile", json!({ "filePath": path.to_string_lossy() }))
            .build(),
    )
    .unwrap();

    let file = NodeId::from("file");
    assert!(poll_until(&mut d, |d| {
        d.status_board()
            .latest(&file)
            .is_some_and(|update| update.event.kind() == "error")
    }));
    assert_last_output(&d, "file", LastOutput::Pending);
}

#[test]
fn test_input_into_file_source_faults() {
    let (mut d, _) = dispatcher();
    let err = d
        .apply_snapshot(
            SnapshotBuilder::new()
                .code("a", "x")
                .node("file", "platformFile", json!({}))
                .edge("a", "file")
                .build(),
        )
        .unwrap_err();

    assert!(matches!(err, EngineError::ProcessorRejected { .. }));
    assert_eq!(d.state(), DispatcherState::Faulted);
}
