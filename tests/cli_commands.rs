//! CLI command tests
//!
//! Tests:
//! - scan prints one JSON row per visible cell
//! - chunks prints the chunk positions the cursor yields
//! - Predicate and configuration files are read from disk
//! - Failures map to AERO_CLI_* codes
//! - Logs stay off stdout

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as Json;
use tempfile::TempDir;

use aerogrid::cli::{init_logging, load_config, run_command, Command, WindowArgs};
use aerogrid::config::GridConfig;
use aerogrid::observability::{LogStream, Logger, Severity};

// =============================================================================
// Test Utilities
// =============================================================================

const ARRAY: &str = r#"{
    "schema": {
        "name": "readings",
        "dimensions": [
            {"name": "x", "start_min": 0, "end_max": 19, "chunk_interval": 10},
            {"name": "y", "start_min": 0, "end_max": 19, "chunk_interval": 10}
        ],
        "attributes": [{"id": 0, "name": "t", "type": "double"}]
    },
    "cells": [
        {"pos": [1, 1], "values": [1.5]},
        {"pos": [5, 5], "values": [2.5]},
        {"pos": [12, 3], "values": [3.25]},
        {"pos": [15, 15], "values": [4.75]}
    ]
}"#;

/// Chunks of 10 sharing 2 cells with each neighbour
const OVERLAPPING: &str = r#"{
    "schema": {
        "name": "halo",
        "dimensions": [
            {"name": "x", "start_min": 0, "end_max": 29, "chunk_interval": 10, "chunk_overlap": 2}
        ],
        "attributes": [{"id": 0, "name": "t", "type": "int64"}]
    },
    "cells": [
        {"pos": [8], "values": [8]},
        {"pos": [9], "values": [9]},
        {"pos": [10], "values": [10]},
        {"pos": [11], "values": [11]},
        {"pos": [21], "values": [21]}
    ]
}"#;

/// t > 3.0
const PREDICATE: &str = r#"{
    "bindings": [{"kind": "attribute", "attr": 0}, {"kind": "value", "value": 3.0}],
    "expr": {
        "op": "compare",
        "cmp": "gt",
        "left": {"op": "param", "index": 0},
        "right": {"op": "param", "index": 1}
    }
}"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn window(array: &Path, low: Option<&str>, high: Option<&str>) -> WindowArgs {
    WindowArgs {
        array: array.to_path_buf(),
        low: low.map(str::to_string),
        high: high.map(str::to_string),
        boundary: None,
        predicate: None,
    }
}

fn run(cmd: Command) -> Vec<Json> {
    let mut out = Vec::new();
    run_command(cmd, &GridConfig::default(), &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// scan
// =============================================================================

#[test]
fn test_scan_prints_visible_cells() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let rows = run(Command::Scan(window(&array, Some("4,0"), Some("15,10"))));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["pos"], serde_json::json!([5, 5]));
    assert_eq!(rows[0]["values"], serde_json::json!([2.5]));
    assert_eq!(rows[1]["pos"], serde_json::json!([12, 3]));
}

#[test]
fn test_scan_without_window_prints_everything() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let rows = run(Command::Scan(window(&array, None, None)));
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_scan_with_open_bound() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let rows = run(Command::Scan(window(&array, Some("10,"), None)));
    let positions: Vec<Json> = rows.iter().map(|r| r["pos"].clone()).collect();
    assert_eq!(
        positions,
        vec![serde_json::json!([12, 3]), serde_json::json!([15, 15])]
    );
}

#[test]
fn test_scan_with_predicate_file() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);
    let predicate = write(&dir, "predicate.json", PREDICATE);

    let mut args = window(&array, Some("1,1"), Some("15,15"));
    args.predicate = Some(predicate);

    // (1,1) and (15,15) sit on the window edge and face the predicate;
    // (5,5) is strictly inside and kept regardless
    let rows = run(Command::Scan(args));
    let positions: Vec<Json> = rows.iter().map(|r| r["pos"].clone()).collect();
    assert_eq!(
        positions,
        vec![
            serde_json::json!([5, 5]),
            serde_json::json!([12, 3]),
            serde_json::json!([15, 15])
        ]
    );
}

#[test]
fn test_scan_prints_overlap_cells_once() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", OVERLAPPING);

    let rows = run(Command::Scan(window(&array, None, None)));
    let positions: Vec<Json> = rows.iter().map(|r| r["pos"].clone()).collect();
    assert_eq!(
        positions,
        vec![
            serde_json::json!([8]),
            serde_json::json!([9]),
            serde_json::json!([10]),
            serde_json::json!([11]),
            serde_json::json!([21])
        ]
    );
}

// =============================================================================
// chunks
// =============================================================================

#[test]
fn test_chunks_prints_positions() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let lines = run(Command::Chunks {
        window: window(&array, Some("4,0"), Some("15,9")),
        attribute: None,
    });
    let chunks: Vec<Json> = lines.iter().map(|l| l["chunk"].clone()).collect();
    assert_eq!(
        chunks,
        vec![serde_json::json!([0, 0]), serde_json::json!([10, 0])]
    );
}

#[test]
fn test_chunks_for_value_attribute() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let lines = run(Command::Chunks {
        window: window(&array, None, None),
        attribute: Some(0),
    });
    assert_eq!(lines.len(), 3);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_bad_attribute_is_query_failure() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);

    let mut out = Vec::new();
    let err = run_command(
        Command::Chunks {
            window: window(&array, None, None),
            attribute: Some(9),
        },
        &GridConfig::default(),
        &mut out,
    )
    .unwrap_err();
    assert_eq!(err.code_str(), "AERO_CLI_QUERY_FAILED");
}

#[test]
fn test_malformed_predicate_file() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", ARRAY);
    let predicate = write(&dir, "predicate.json", "{\"bindings\": []");

    let mut args = window(&array, None, None);
    args.predicate = Some(predicate);
    let mut out = Vec::new();
    let err = run_command(Command::Scan(args), &GridConfig::default(), &mut out).unwrap_err();
    assert_eq!(err.code_str(), "AERO_CLI_PREDICATE_ERROR");
    assert!(out.is_empty());
}

#[test]
fn test_malformed_array_file() {
    let dir = TempDir::new().unwrap();
    let array = write(&dir, "array.json", "not json");

    let mut out = Vec::new();
    let err = run_command(
        Command::Scan(window(&array, None, None)),
        &GridConfig::default(),
        &mut out,
    )
    .unwrap_err();
    assert_eq!(err.code_str(), "AERO_CLI_LOAD_FAILED");
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.json",
        r#"{"result_prefetch_queue_size": 0, "log_level": "warn"}"#,
    );

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.result_prefetch_queue_size, 0);
    assert_eq!(config.log_level, "warn");
}

#[test]
fn test_load_config_defaults() {
    assert_eq!(load_config(None).unwrap(), GridConfig::default());
}

#[test]
fn test_invalid_log_level_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.json", r#"{"log_level": "loud"}"#);

    let err = load_config(Some(&path)).unwrap_err();
    assert_eq!(err.code_str(), "AERO_CLI_CONFIG_ERROR");
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn test_cli_logs_to_stderr() {
    init_logging();
    assert_eq!(Logger::stream_for(Severity::Info), LogStream::Stderr);
    assert_eq!(Logger::stream_for(Severity::Warn), LogStream::Stderr);
}
