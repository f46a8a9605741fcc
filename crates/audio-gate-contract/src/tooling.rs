// crates/audio-gate-contract/src/tooling.rs
// ============================================================================
// Module: Tool Definition Exporter
// Description: Derives the agent-facing tool definition from the schemas.
// Purpose: Keep the registered tool description in lockstep with validation.
// Dependencies: audio-gate-core, serde_json
// ============================================================================

//! ## Overview
//! [`tool_definition`] is what the server registers in the `tools` array of
//! a Messages API request. Its `input_schema` is exactly
//! [`schemas::analysis_input_schema`], the same document the gateway
//! validates against. [`tool_contract`] extends it with the output schema,
//! examples, and usage notes for the generated docs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use audio_gate_core::ToolName;
use serde_json::Value;

use crate::examples;
use crate::schemas;
use crate::types::ToolContract;
use crate::types::ToolDefinition;

/// Description registered with the agent.
pub const TOOL_DESCRIPTION: &str = "Low-latency raw audio analysis for emotional tone, hardware \
                                    acoustics, anomaly detection, and code intent without \
                                    requiring transcription.";

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Returns the tool definition registered with the external agent.
#[must_use]
pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::AnalyzeRawAudioSignal,
        description: TOOL_DESCRIPTION.to_string(),
        input_schema: schemas::analysis_input_schema(),
    }
}

/// Returns the full tool contract.
#[must_use]
pub fn tool_contract() -> ToolContract {
    let definition = tool_definition();
    ToolContract {
        name: definition.name,
        description: definition.description,
        input_schema: definition.input_schema,
        output_schema: schemas::analysis_result_schema(),
        examples: examples::tool_examples(),
        notes: tool_notes(),
    }
}

/// Returns every tool contract in canonical order.
#[must_use]
pub fn tool_contracts() -> Vec<ToolContract> {
    ToolName::all()
        .iter()
        .map(|name| match name {
            ToolName::AnalyzeRawAudioSignal => tool_contract(),
        })
        .collect()
}

/// Usage notes for `analyze_raw_audio_signal`.
fn tool_notes() -> Vec<String> {
    vec![
        String::from("chunk_base64 is opaque and never decoded by the gateway."),
        String::from(
            "Exactly the payload named by analysis_mode is populated; the other three are absent.",
        ),
        String::from("final_summary is present if and only if final_chunk is true."),
        String::from("Unknown fields are rejected at every level of input and output."),
    ]
}

// ============================================================================
// SECTION: Markdown
// ============================================================================

/// Renders tool contracts as markdown.
#[must_use]
pub fn tooling_markdown(contracts: &[ToolContract]) -> String {
    let mut out = String::from("# Audio Gate Tools\n");
    for contract in contracts {
        let _ = write!(out, "\n## {}\n\n{}\n", contract.name, contract.description);
        out.push_str("\n### Notes\n\n");
        for note in &contract.notes {
            let _ = writeln!(out, "- {note}");
        }
        out.push_str("\n### Input fields\n\n| Field | Type | Required | Description |\n");
        out.push_str("|-------|------|----------|-------------|\n");
        let required: Vec<&str> = contract
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if let Some(properties) =
            contract.input_schema.get("properties").and_then(Value::as_object)
        {
            for (name, schema) in properties {
                let kind = schema.get("type").and_then(Value::as_str).unwrap_or("any");
                let description = schema
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let needed = if required.contains(&name.as_str()) { "yes" } else { "no" };
                let _ = writeln!(out, "| `{name}` | {kind} | {needed} | {description} |");
            }
        }
        let _ = write!(
            out,
            "\n### Examples\n\n{} examples in `tooling.json`.\n",
            contract.examples.len()
        );
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
