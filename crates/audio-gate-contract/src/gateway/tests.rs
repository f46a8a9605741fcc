// crates/audio-gate-contract/src/gateway/tests.rs
// ============================================================================
// Module: Validation Gateway Unit Tests
// Description: Field-level diagnostics and literal checks of the gateway.
// Purpose: Pin the exact failure shape reported at protocol boundaries.
// Dependencies: audio-gate-contract
// ============================================================================

//! ## Overview
//! Exercises each validator with conforming and non-conforming payloads and
//! checks the reported paths, keywords, and fragments.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only validation helpers use panic-based assertions for clarity."
)]

use audio_gate_core::AnalysisMode;
use audio_gate_core::run_audio_analysis;
use serde_json::Value;
use serde_json::json;

use super::ContractEntity;
use super::GatewayError;
use super::check_mode_coupling;
use super::validate_input;
use super::validate_result;
use super::validate_tool_result_envelope;
use super::validate_tool_use;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn anomaly_input() -> Value {
    json!({
        "session_id": "s1",
        "chunk_id": 0,
        "chunk_base64": "AAAAAAAAAAAAAAAAAAAAAAAA",
        "format": "pcm16le",
        "sample_rate_hz": 16000,
        "channels": 1,
        "start_ms": 0,
        "duration_ms": 100,
        "analysis_mode": "anomaly_detection",
        "final_chunk": false
    })
}

fn violations_of(err: &GatewayError) -> Vec<(String, String)> {
    err.violations().iter().map(|v| (v.path.clone(), v.expected.clone())).collect()
}

// ============================================================================
// SECTION: Input
// ============================================================================

#[test]
fn well_formed_input_round_trips() {
    let raw = anomaly_input();
    let input = validate_input(&raw).unwrap();
    assert_eq!(serde_json::to_value(&input).unwrap(), raw);
}

#[test]
fn final_chunk_is_optional_and_defaults_false() {
    let mut raw = anomaly_input();
    raw.as_object_mut().unwrap().remove("final_chunk");
    let input = validate_input(&raw).unwrap();
    assert!(!input.final_chunk);
}

#[test]
fn channel_count_above_two_reports_maximum() {
    let mut raw = anomaly_input();
    raw["channels"] = json!(3);
    let err = validate_input(&raw).unwrap_err();
    let violation = &err.violations()[0];
    assert_eq!(err.violations().len(), 1);
    assert_eq!(violation.path, "/channels");
    assert_eq!(violation.expected, "maximum: 2");
    assert_eq!(violation.actual, Some(json!(3)));
    assert!(matches!(
        err,
        GatewayError::SchemaViolation {
            entity: ContractEntity::AnalysisInput,
            ..
        }
    ));
}

#[test]
fn integral_floats_are_accepted_as_integers() {
    let mut raw = anomaly_input();
    raw["chunk_id"] = json!(1.0);
    raw["channels"] = json!(2.0);
    raw["sample_rate_hz"] = json!(48000.0);
    let input = validate_input(&raw).unwrap();
    assert_eq!(input.chunk_id, 1);
    assert_eq!(input.channels, 2);
    assert_eq!(input.sample_rate_hz, 48_000);
}

#[test]
fn fractional_channel_count_is_a_type_violation() {
    let mut raw = anomaly_input();
    raw["channels"] = json!(1.5);
    let err = validate_input(&raw).unwrap_err();
    assert_eq!(violations_of(&err), vec![(String::from("/channels"), String::from("type: \"integer\""))]);
}

#[test]
fn start_offset_beyond_u64_reports_maximum() {
    let mut raw = anomaly_input();
    raw["start_ms"] = json!(2e19);
    let err = validate_input(&raw).unwrap_err();
    assert_eq!(
        violations_of(&err),
        vec![(String::from("/start_ms"), format!("maximum: {}", u64::MAX))]
    );
}

#[test]
fn every_failing_field_is_reported() {
    let mut raw = anomaly_input();
    let object = raw.as_object_mut().unwrap();
    object.remove("session_id");
    object.insert(String::from("speaker"), json!("alice"));
    object.insert(String::from("format"), json!("mp3"));
    object.insert(String::from("duration_ms"), json!(5));
    let err = validate_input(&raw).unwrap_err();
    let found = violations_of(&err);
    assert!(found.contains(&(String::from("/session_id"), String::from("required: session_id"))));
    assert!(
        found.contains(&(String::from("/speaker"), String::from("additionalProperties: false")))
    );
    assert!(found.iter().any(|(path, expected)| path == "/format" && expected.starts_with("enum")));
    assert!(found.contains(&(String::from("/duration_ms"), String::from("minimum: 10"))));
    assert_eq!(found.len(), 4);
}

#[test]
fn unknown_property_carries_its_value() {
    let mut raw = anomaly_input();
    raw["speaker"] = json!({"name": "alice"});
    let err = validate_input(&raw).unwrap_err();
    assert_eq!(err.violations()[0].actual, Some(json!({"name": "alice"})));
}

#[test]
fn empty_session_id_is_rejected() {
    let mut raw = anomaly_input();
    raw["session_id"] = json!("");
    let err = validate_input(&raw).unwrap_err();
    assert_eq!(violations_of(&err), vec![(String::from("/session_id"), String::from("minLength: 1"))]);
}

#[test]
fn non_object_input_is_rejected_at_root() {
    let err = validate_input(&json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.violations()[0].path, "");
    assert_eq!(err.violations()[0].expected, "type: \"object\"");
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

#[test]
fn tool_use_requires_exact_literals() {
    let valid = json!({
        "type": "tool_use",
        "id": "toolu_1",
        "name": "analyze_raw_audio_signal",
        "input": anomaly_input()
    });
    assert!(validate_tool_use(&valid).is_ok());

    let mut wrong_type = valid.clone();
    wrong_type["type"] = json!("tool_result");
    let err = validate_tool_use(&wrong_type).unwrap_err();
    assert_eq!(err.violations()[0].path, "/type");
    assert_eq!(err.violations()[0].expected, "const: \"tool_use\"");

    let mut wrong_name = valid;
    wrong_name["name"] = json!("analyze_audio");
    let err = validate_tool_use(&wrong_name).unwrap_err();
    assert_eq!(err.violations()[0].path, "/name");
}

#[test]
fn tool_use_reports_nested_input_paths() {
    let mut input = anomaly_input();
    input["sample_rate_hz"] = json!(4000);
    let envelope = json!({
        "type": "tool_use",
        "id": "toolu_1",
        "name": "analyze_raw_audio_signal",
        "input": input
    });
    let err = validate_tool_use(&envelope).unwrap_err();
    assert_eq!(
        violations_of(&err),
        vec![(String::from("/input/sample_rate_hz"), String::from("minimum: 8000"))]
    );
}

#[test]
fn tool_result_envelope_rejects_empty_content() {
    let err = validate_tool_result_envelope(&json!({
        "type": "tool_result",
        "tool_use_id": "toolu_1",
        "content": []
    }))
    .unwrap_err();
    assert_eq!(violations_of(&err), vec![(String::from("/content"), String::from("minItems: 1"))]);
}

#[test]
fn tool_result_envelope_accepts_stub_output() {
    let input = validate_input(&anomaly_input()).unwrap();
    let result = run_audio_analysis(&input, 1_700_000_000_000);
    let envelope = json!({
        "type": "tool_result",
        "tool_use_id": "toolu_1",
        "content": [{"type": "json", "json": result}]
    });
    let parsed = validate_tool_result_envelope(&envelope).unwrap();
    assert_eq!(parsed.content[0].analysis(), &result);
}

#[test]
fn result_probabilities_are_bounded() {
    let mut value = serde_json::to_value(run_audio_analysis(
        &validate_input(&anomaly_input()).unwrap(),
        0,
    ))
    .unwrap();
    value["anomaly_detection"]["anomaly_score"] = json!(1.5);
    value["quality"]["clipping_ratio"] = json!(-0.1);
    let err = validate_result(&value).unwrap_err();
    let paths: Vec<String> = err.violations().iter().map(|v| v.path.clone()).collect();
    assert_eq!(paths, vec!["/anomaly_detection/anomaly_score", "/quality/clipping_ratio"]);
}

// ============================================================================
// SECTION: Mode Coupling
// ============================================================================

#[test]
fn stub_output_satisfies_mode_coupling_for_every_mode() {
    for mode in AnalysisMode::all() {
        for final_chunk in [false, true] {
            let mut raw = anomaly_input();
            raw["analysis_mode"] = json!(mode.as_str());
            raw["final_chunk"] = json!(final_chunk);
            let input = validate_input(&raw).unwrap();
            let result = run_audio_analysis(&input, 0);
            check_mode_coupling(&input, &result).unwrap();
        }
    }
}

#[test]
fn mode_coupling_flags_foreign_and_missing_payloads() {
    let input = validate_input(&anomaly_input()).unwrap();
    let mut result = run_audio_analysis(&input, 0);
    let mut other = input.clone();
    other.analysis_mode = AnalysisMode::EmotionTone;
    other.final_chunk = true;
    result.emotion_tone = run_audio_analysis(&other, 0).emotion_tone;
    result.anomaly_detection = None;
    result.final_summary = run_audio_analysis(&other, 0).final_summary;

    let err = check_mode_coupling(&input, &result).unwrap_err();
    let paths: Vec<&str> = err.violations().iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["/emotion_tone", "/anomaly_detection", "/final_summary"]);
    assert!(err.violations()[0].actual.is_some());
    assert!(err.violations()[1].actual.is_none());
}
