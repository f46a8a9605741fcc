// crates/audio-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, validation, and bounded reads.
// Purpose: Pin CLI behavior without spawning the binary.
// Dependencies: audio-gate-cli main helpers
// ============================================================================

//! ## Overview
//! Covers subcommand parsing, the `--mock` environment override, payload
//! validation per entity kind, and size-limited input reads.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;

use audio_gate_contract::examples::input_example;
use audio_gate_contract::examples::result_example;
use audio_gate_contract::examples::tool_result_example;
use audio_gate_contract::examples::tool_use_example;
use clap::Parser;
use serde_json::json;

use super::Cli;
use super::Commands;
use super::EntityKind;
use super::ReadLimitError;
use super::ValidationOutcome;
use super::env_lookup;
use super::read_bytes_with_limit;
use super::read_to_limit;
use super::validate_payload;

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn parses_serve_with_mock_flag() {
    let cli = Cli::try_parse_from(["audio-gate", "serve", "--mock", "--config", "gate.toml"]).unwrap();
    match cli.command {
        Commands::Serve(command) => {
            assert!(command.mock);
            assert_eq!(command.config.unwrap().to_str(), Some("gate.toml"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_validate_kinds() {
    let cli = Cli::try_parse_from(["audio-gate", "validate", "--kind", "tool-result"]).unwrap();
    match cli.command {
        Commands::Validate(command) => {
            assert_eq!(command.kind, EntityKind::ToolResult);
            assert!(command.file.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn validate_requires_kind() {
    assert!(Cli::try_parse_from(["audio-gate", "validate"]).is_err());
    assert!(Cli::try_parse_from(["audio-gate", "validate", "--kind", "transcript"]).is_err());
}

#[test]
fn parses_tool_definition() {
    let cli = Cli::try_parse_from(["audio-gate", "tool-definition"]).unwrap();
    assert!(matches!(cli.command, Commands::ToolDefinition));
}

// ============================================================================
// SECTION: Environment Override
// ============================================================================

#[test]
fn mock_flag_forces_mock_mode_variable() {
    let lookup = |_: &str| Some("false".to_string());
    assert_eq!(env_lookup("MOCK_MODE", true, lookup), Some("true".to_string()));
    assert_eq!(env_lookup("MOCK_MODE", false, lookup), Some("false".to_string()));
    assert_eq!(env_lookup("PORT", true, |_| None), None);
}

// ============================================================================
// SECTION: Payload Validation
// ============================================================================

#[test]
fn valid_payloads_round_trip_for_every_kind() {
    let cases = [
        (EntityKind::Input, serde_json::to_value(input_example()).unwrap()),
        (EntityKind::Result, serde_json::to_value(result_example()).unwrap()),
        (EntityKind::ToolUse, serde_json::to_value(tool_use_example()).unwrap()),
        (EntityKind::ToolResult, serde_json::to_value(tool_result_example()).unwrap()),
    ];
    for (kind, value) in cases {
        match validate_payload(kind, &value).unwrap() {
            ValidationOutcome::Valid(entity) => assert_eq!(entity, value),
            ValidationOutcome::Invalid(violations) => {
                panic!("{kind:?} rejected: {violations:?}")
            }
        }
    }
}

#[test]
fn invalid_payload_reports_violations() {
    let mut value = serde_json::to_value(input_example()).unwrap();
    value["channels"] = json!(3);
    match validate_payload(EntityKind::Input, &value).unwrap() {
        ValidationOutcome::Invalid(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].path, "/channels");
        }
        ValidationOutcome::Valid(_) => panic!("out-of-range channels accepted"),
    }
}

#[test]
fn input_is_not_a_tool_use() {
    let value = serde_json::to_value(input_example()).unwrap();
    assert!(matches!(
        validate_payload(EntityKind::ToolUse, &value).unwrap(),
        ValidationOutcome::Invalid(_)
    ));
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_file_within_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.json");
    std::fs::write(&path, b"{}").unwrap();
    assert_eq!(read_bytes_with_limit(&path, 16).unwrap(), b"{}");
}

#[test]
fn read_file_over_limit_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.json");
    std::fs::write(&path, vec![b' '; 64]).unwrap();
    match read_bytes_with_limit(&path, 16) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 64);
            assert_eq!(limit, 16);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn read_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_bytes_with_limit(&dir.path().join("missing.json"), 16);
    assert!(matches!(result, Err(ReadLimitError::Io(_))));
}

#[test]
fn stream_reads_stop_past_limit() {
    assert_eq!(read_to_limit(Cursor::new(vec![1_u8; 8]), 8).unwrap().len(), 8);
    assert!(matches!(
        read_to_limit(Cursor::new(vec![1_u8; 9]), 8),
        Err(ReadLimitError::TooLarge { .. })
    ));
}
