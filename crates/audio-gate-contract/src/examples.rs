// crates/audio-gate-contract/src/examples.rs
// ============================================================================
// Module: Contract Examples
// Description: Canonical example payloads for the analysis tool call.
// Purpose: Provide deterministic, real examples for docs and tests.
// Dependencies: audio-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Examples are built from the real core types and the stub analysis, with
//! a fixed receipt clock, so they cannot drift from runtime behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use audio_gate_core::AnalysisInput;
use audio_gate_core::AnalysisMode;
use audio_gate_core::AnalysisResult;
use audio_gate_core::AudioFormat;
use audio_gate_core::SessionId;
use audio_gate_core::ToolResultEnvelope;
use audio_gate_core::ToolUseEnvelope;
use audio_gate_core::ToolUseId;
use audio_gate_core::run_audio_analysis;
use serde_json::Value;

use crate::types::ToolExample;

/// Receipt clock used by every example result.
pub const EXAMPLE_RECEIVED_AT_MS: u64 = 1_767_225_600_000;

/// Tool-use identifier used by the envelope examples.
pub const EXAMPLE_TOOL_USE_ID: &str = "toolu_01ExampleAnalyzeRawAudio";

// ============================================================================
// SECTION: Example Builders
// ============================================================================

/// Returns an example input for the given mode.
#[must_use]
pub fn analysis_input_example(mode: AnalysisMode) -> AnalysisInput {
    AnalysisInput {
        session_id: SessionId::from("call-2026-01-01-0001"),
        chunk_id: 0,
        chunk_base64: String::from("AAAAAAAAAAAAAAAAAAAAAAAA"),
        format: AudioFormat::Pcm16le,
        sample_rate_hz: 16_000,
        channels: 1,
        start_ms: 0,
        duration_ms: 100,
        analysis_mode: mode,
        context: None,
        final_chunk: false,
    }
}

/// Returns the anomaly-detection example input.
#[must_use]
pub fn input_example() -> AnalysisInput {
    analysis_input_example(AnalysisMode::AnomalyDetection)
}

/// Returns the stub result for the anomaly-detection example.
#[must_use]
pub fn result_example() -> AnalysisResult {
    run_audio_analysis(&input_example(), EXAMPLE_RECEIVED_AT_MS)
}

/// Returns the `tool_use` envelope example.
#[must_use]
pub fn tool_use_example() -> ToolUseEnvelope {
    ToolUseEnvelope::new(ToolUseId::from(EXAMPLE_TOOL_USE_ID), input_example())
}

/// Returns the `tool_result` envelope example.
#[must_use]
pub fn tool_result_example() -> ToolResultEnvelope {
    ToolResultEnvelope::single(ToolUseId::from(EXAMPLE_TOOL_USE_ID), result_example())
}

/// Returns one tool example per analysis mode, the last one a final chunk.
#[must_use]
pub fn tool_examples() -> Vec<ToolExample> {
    let modes = AnalysisMode::all();
    modes
        .iter()
        .enumerate()
        .map(|(index, mode)| {
            let mut input = analysis_input_example(*mode);
            if index + 1 == modes.len() {
                input.chunk_id = 12;
                input.start_ms = 1_200;
                input.final_chunk = true;
                input.context = Some(String::from("Developer dictating a bug report."));
            }
            let output = run_audio_analysis(&input, EXAMPLE_RECEIVED_AT_MS);
            ToolExample {
                description: format!("Analyze a 100 ms PCM chunk in {} mode.", mode.as_str()),
                input: to_value(&input),
                output: to_value(&output),
            }
        })
        .collect()
}

/// Serializes an example; the core types serialize infallibly.
fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
