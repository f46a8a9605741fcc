// crates/audio-gate-contract/src/schemas.rs
// ============================================================================
// Module: Contract Schemas
// Description: JSON Schema builders for the analysis tool call.
// Purpose: Declare the closed shape of every entity exchanged with the agent.
// Dependencies: audio-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Draft 2020-12 schemas mirroring the `audio-gate-core` types. Every object
//! schema is closed (`additionalProperties: false`), enumerations list their
//! literal values, and numeric bounds are inclusive. Schemas are `$ref`-free
//! so validation diagnostics point directly into the document.
//!
//! The four mode payloads of the result are all optional here. Coupling them
//! to the requested mode is checked by
//! [`check_mode_coupling`](crate::gateway::check_mode_coupling).

// ============================================================================
// SECTION: Imports
// ============================================================================

use audio_gate_core::AnalysisMode;
use audio_gate_core::AudioFormat;
use audio_gate_core::ToolName;
use audio_gate_core::core::input::MAX_CHANNELS;
use audio_gate_core::core::input::MAX_DURATION_MS;
use audio_gate_core::core::input::MAX_SAMPLE_RATE_HZ;
use audio_gate_core::core::input::MIN_CHANNELS;
use audio_gate_core::core::input::MIN_DURATION_MS;
use audio_gate_core::core::input::MIN_SAMPLE_RATE_HZ;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

/// JSON Schema dialect for every contract schema.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Literal value levels shared by severity and risk.
const LEVELS: [&str; 4] = ["low", "medium", "high", "critical"];

// ============================================================================
// SECTION: Public Schema Entrypoints
// ============================================================================

/// Returns the JSON schema for `AnalysisInput`.
#[must_use]
pub fn analysis_input_schema() -> Value {
    with_header(
        "analysis_input",
        "Audio Gate AnalysisInput",
        "Descriptor of one audio chunk submitted to analyze_raw_audio_signal.",
        analysis_input_object(),
    )
}

/// Returns the JSON schema for `AnalysisResult`.
#[must_use]
pub fn analysis_result_schema() -> Value {
    with_header(
        "analysis_result",
        "Audio Gate AnalysisResult",
        "Structured analysis of one audio chunk.",
        analysis_result_object(),
    )
}

/// Returns the JSON schema for the `tool_use` envelope.
#[must_use]
pub fn tool_use_schema() -> Value {
    with_header(
        "tool_use",
        "Audio Gate ToolUse envelope",
        "Invocation of analyze_raw_audio_signal emitted by a tool-calling agent.",
        json!({
            "type": "object",
            "required": ["type", "id", "name", "input"],
            "properties": {
                "type": { "const": "tool_use" },
                "id": schema_for_non_empty_string("Tool invocation identifier."),
                "name": { "const": ToolName::AnalyzeRawAudioSignal.as_str() },
                "input": analysis_input_object()
            },
            "additionalProperties": false
        }),
    )
}

/// Returns the JSON schema for the `tool_result` envelope.
#[must_use]
pub fn tool_result_envelope_schema() -> Value {
    with_header(
        "tool_result_envelope",
        "Audio Gate ToolResult envelope",
        "Result of analyze_raw_audio_signal returned to the agent.",
        json!({
            "type": "object",
            "required": ["type", "tool_use_id", "content"],
            "properties": {
                "type": { "const": "tool_result" },
                "tool_use_id": schema_for_non_empty_string("Identifier of the answered tool_use."),
                "content": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["type", "json"],
                        "properties": {
                            "type": { "const": "json" },
                            "json": analysis_result_object()
                        },
                        "additionalProperties": false
                    }
                }
            },
            "additionalProperties": false
        }),
    )
}

/// Returns every contract schema keyed by its short name, in artifact order.
#[must_use]
pub fn all_schemas() -> Vec<(&'static str, Value)> {
    vec![
        ("analysis_input", analysis_input_schema()),
        ("analysis_result", analysis_result_schema()),
        ("tool_result_envelope", tool_result_envelope_schema()),
        ("tool_use", tool_use_schema()),
    ]
}

// ============================================================================
// SECTION: Entity Bodies
// ============================================================================

/// Body of the `AnalysisInput` schema without document header.
fn analysis_input_object() -> Value {
    let formats: Vec<&str> = AudioFormat::all().iter().map(|format| format.as_str()).collect();
    let modes: Vec<&str> = AnalysisMode::all().iter().map(|mode| mode.as_str()).collect();
    json!({
        "type": "object",
        "required": [
            "session_id",
            "chunk_id",
            "chunk_base64",
            "format",
            "sample_rate_hz",
            "channels",
            "start_ms",
            "duration_ms",
            "analysis_mode"
        ],
        "properties": {
            "session_id": schema_for_non_empty_string("Streaming session identifier."),
            "chunk_id": schema_for_int("Zero-based chunk index within the session."),
            "chunk_base64": schema_for_non_empty_string("Base64 audio payload (opaque)."),
            "format": schema_for_enum(&formats, "Payload sample encoding."),
            "sample_rate_hz": schema_for_bounded_int(
                u64::from(MIN_SAMPLE_RATE_HZ),
                u64::from(MAX_SAMPLE_RATE_HZ),
                "Sample rate in hertz."
            ),
            "channels": schema_for_bounded_int(
                u64::from(MIN_CHANNELS),
                u64::from(MAX_CHANNELS),
                "Channel count."
            ),
            "start_ms": schema_for_int("Chunk start offset in milliseconds."),
            "duration_ms": schema_for_bounded_int(
                u64::from(MIN_DURATION_MS),
                u64::from(MAX_DURATION_MS),
                "Chunk duration in milliseconds."
            ),
            "analysis_mode": schema_for_enum(&modes, "Requested analysis."),
            "context": schema_for_string("Optional free-text context."),
            "final_chunk": {
                "type": "boolean",
                "default": false,
                "description": "Marks the last chunk of the session."
            }
        },
        "additionalProperties": false
    })
}

/// Body of the `AnalysisResult` schema without document header.
fn analysis_result_object() -> Value {
    json!({
        "type": "object",
        "required": ["session_id", "chunk_id", "received_at_ms", "latency_ms", "quality"],
        "properties": {
            "session_id": schema_for_string("Echo of the input session identifier."),
            "chunk_id": schema_for_int("Echo of the input chunk index."),
            "received_at_ms": schema_for_int("Receipt timestamp in unix milliseconds."),
            "latency_ms": schema_for_int("Analysis latency in milliseconds."),
            "quality": closed_object(
                &["snr_db", "clipping_ratio", "is_silence"],
                &[
                    ("snr_db", schema_for_number("Signal-to-noise ratio in dB.")),
                    ("clipping_ratio", schema_for_unit_interval("Fraction of clipped samples.")),
                    ("is_silence", schema_for_bool("Whether the chunk is silent.")),
                ],
            ),
            "emotion_tone": closed_object(
                &["valence", "arousal", "stress_prob", "anger_prob", "frustration_prob"],
                &[
                    ("valence", schema_for_range(-1.0, 1.0, "Valence.")),
                    ("arousal", schema_for_unit_interval("Arousal.")),
                    ("stress_prob", schema_for_unit_interval("Probability of stress.")),
                    ("anger_prob", schema_for_unit_interval("Probability of anger.")),
                    ("frustration_prob", schema_for_unit_interval("Probability of frustration.")),
                ],
            ),
            "hardware_acoustics": closed_object(
                &[
                    "dominant_freq_hz",
                    "spectral_centroid_hz",
                    "fan_fault_prob",
                    "bearing_wear_prob",
                    "recommended_action"
                ],
                &[
                    ("dominant_freq_hz", schema_for_number("Dominant frequency in hertz.")),
                    ("spectral_centroid_hz", schema_for_number("Spectral centroid in hertz.")),
                    ("fan_fault_prob", schema_for_unit_interval("Probability of a fan fault.")),
                    ("bearing_wear_prob", schema_for_unit_interval("Probability of bearing wear.")),
                    ("recommended_action", schema_for_string("Operator guidance.")),
                ],
            ),
            "anomaly_detection": closed_object(
                &["anomaly_score", "event_label", "severity"],
                &[
                    ("anomaly_score", schema_for_unit_interval("Anomaly score.")),
                    ("event_label", schema_for_string("Detected event label.")),
                    ("severity", schema_for_enum(&LEVELS, "Severity bucket.")),
                ],
            ),
            "code_intent": closed_object(
                &["action", "target_file", "intent_summary", "proposed_changes", "impact_analysis"],
                &[
                    (
                        "action",
                        schema_for_enum(
                            &["refactor", "create_feature", "debug", "document"],
                            "Requested change kind."
                        ),
                    ),
                    ("target_file", schema_for_string("Target file.")),
                    ("intent_summary", schema_for_string("Intent summary.")),
                    ("proposed_changes", schema_for_string_array("Proposed edits in order.")),
                    ("impact_analysis", schema_for_string("Expected impact.")),
                ],
            ),
            "alerts": {
                "type": "array",
                "description": "Alerts raised for the chunk.",
                "items": closed_object(
                    &["code", "message"],
                    &[
                        ("code", schema_for_string("Alert code.")),
                        ("message", schema_for_string("Alert message.")),
                        ("threshold", schema_for_number("Crossed threshold.")),
                        ("observed", schema_for_number("Observed value.")),
                    ],
                )
            },
            "final_summary": closed_object(
                &["window_ms", "overall_risk", "key_findings"],
                &[
                    ("window_ms", schema_for_int("End of the analyzed window in milliseconds.")),
                    ("overall_risk", schema_for_enum(&LEVELS, "Overall risk for the window.")),
                    ("key_findings", schema_for_string_array("Key findings.")),
                ],
            )
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Private Schema Helpers
// ============================================================================

/// Adds the document header (`$schema`, `$id`, title, description) to a body.
fn with_header(name: &str, title: &str, description: &str, body: Value) -> Value {
    let mut document = Map::new();
    document.insert(String::from("$schema"), Value::from(SCHEMA_DIALECT));
    document.insert(String::from("$id"), Value::from(schema_id(name)));
    document.insert(String::from("title"), Value::from(title));
    document.insert(String::from("description"), Value::from(description));
    if let Value::Object(fields) = body {
        document.extend(fields);
    }
    Value::Object(document)
}

/// Returns the canonical `$id` for a named schema.
#[must_use]
pub fn schema_id(name: &str) -> String {
    format!("audio-gate://contract/schemas/{name}.schema.json")
}

/// Returns a closed object schema with the given required keys and properties.
fn closed_object(required: &[&str], properties: &[(&str, Value)]) -> Value {
    let mut props = Map::new();
    for (name, schema) in properties {
        props.insert((*name).to_string(), schema.clone());
    }
    json!({
        "type": "object",
        "required": required,
        "properties": props,
        "additionalProperties": false
    })
}

/// Returns a JSON schema for a plain string.
fn schema_for_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

/// Returns a JSON schema for a string with at least one character.
fn schema_for_non_empty_string(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "description": description
    })
}

/// Returns a JSON schema for non-negative integers that fit in a `u64`.
fn schema_for_int(description: &str) -> Value {
    schema_for_bounded_int(0, u64::MAX, description)
}

/// Returns a JSON schema for integers within an inclusive range.
fn schema_for_bounded_int(min: u64, max: u64, description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": min,
        "maximum": max,
        "description": description
    })
}

/// Returns a JSON schema for an unbounded number.
fn schema_for_number(description: &str) -> Value {
    json!({
        "type": "number",
        "description": description
    })
}

/// Returns a JSON schema for a number within an inclusive range.
fn schema_for_range(min: f64, max: f64, description: &str) -> Value {
    json!({
        "type": "number",
        "minimum": min,
        "maximum": max,
        "description": description
    })
}

/// Returns a JSON schema for a probability or ratio.
fn schema_for_unit_interval(description: &str) -> Value {
    schema_for_range(0.0, 1.0, description)
}

/// Returns a JSON schema for a boolean.
fn schema_for_bool(description: &str) -> Value {
    json!({
        "type": "boolean",
        "description": description
    })
}

/// Returns a JSON schema for string arrays.
fn schema_for_string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// Returns a JSON schema accepting only the listed string literals.
fn schema_for_enum(values: &[&str], description: &str) -> Value {
    json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}
