// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end tests of the offline commands against files on disk.

use std::io::Write;
use std::path::Path;

use clap::Parser;
use tempfile::NamedTempFile;
use trap_bin::cli::{Cli, OutputFormat};
use trap_bin::commands::{self, collect_warnings, load_plan, render_plan, render_validation};
use trap_bin::BinError;

const PLANT: &str = r#"
endpoint = "opc.tcp://plc-7:4840"
name = "plant"
connect_fail_behavior = "ignore"

[[nodes]]
name = "temp"
namespace = "3"
identifier_type = "s"
identifier = "Temperature"
default_tags = { unit = "C" }

[[event_groups]]
event_type = "i=2041"
node_ids = ["i=2253"]
fields = ["Severity", "Message"]
sampling_interval = "1s"
"#;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_validate_reports_summary_and_warnings() {
    let file = write_config(".toml", PLANT);
    let (config, plan) = load_plan(file.path()).unwrap();
    let warnings = collect_warnings(&config, &plan);

    assert_eq!(warnings.len(), 1);
    let text = render_validation(file.path(), &config, &plan, &warnings, OutputFormat::Text).unwrap();
    assert!(text.contains("Endpoint: opc.tcp://plc-7:4840"));
    assert!(text.contains("Data points: 1"));
    assert!(text.contains("Event items: 1"));
    assert!(text.contains("Warnings:"));
}

#[test]
fn test_plan_lists_mapping_and_event_item() {
    let file = write_config(".toml", PLANT);
    let (config, plan) = load_plan(file.path()).unwrap();

    let text = render_plan(&config, &plan, OutputFormat::Text).unwrap();
    assert!(text.contains("#0 ns=3;s=Temperature"));
    assert!(text.contains("plant.temp  [unit=C]"));
    assert!(text.contains("#1 i=2253"));
}

#[test]
fn test_strict_validate_fails_on_warnings() {
    let file = write_config(".toml", PLANT);
    let path = file.path().to_string_lossy().to_string();
    let cli = Cli::parse_from(["trap-listener", "validate", "--strict", "-c", path.as_str()]);

    let err = commands::execute(&cli).unwrap_err();
    assert!(matches!(err, BinError::Configuration(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_missing_file() {
    let err = load_plan(Path::new("/nonexistent/listener.toml")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_rejected_configuration() {
    let file = write_config(".toml", "endpoint = \"opc.tcp://plc-7:4840\"\n");
    let err = load_plan(file.path()).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
