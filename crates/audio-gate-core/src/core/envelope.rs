// crates/audio-gate-core/src/core/envelope.rs
// ============================================================================
// Module: Tool Call Envelopes
// Description: `tool_use` and `tool_result` envelopes for the analysis tool.
// Purpose: Model the agent-facing invocation and response blocks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ToolUseEnvelope`] is the invocation block an agent emits (or the
//! server synthesizes in mock mode). A [`ToolResultEnvelope`] carries the
//! analysis back, referencing the originating `tool_use` id. Both
//! discriminators are single-variant enums, so any other literal fails to
//! deserialize.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ToolUseId;
use crate::core::input::AnalysisInput;
use crate::core::result::AnalysisResult;
use crate::tooling::ToolName;

// ============================================================================
// SECTION: Discriminators
// ============================================================================

/// Literal `"tool_use"` discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolUseType {
    /// The only accepted value.
    #[default]
    #[serde(rename = "tool_use")]
    ToolUse,
}

/// Literal `"tool_result"` discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolResultType {
    /// The only accepted value.
    #[default]
    #[serde(rename = "tool_result")]
    ToolResult,
}

// ============================================================================
// SECTION: Tool Use
// ============================================================================

/// Invocation of `analyze_raw_audio_signal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolUseEnvelope {
    /// Block discriminator.
    #[serde(rename = "type")]
    pub kind: ToolUseType,
    /// Invocation identifier.
    pub id: ToolUseId,
    /// Invoked tool.
    pub name: ToolName,
    /// Tool arguments.
    pub input: AnalysisInput,
}

impl ToolUseEnvelope {
    /// Wraps an input in an analysis tool invocation.
    #[must_use]
    pub const fn new(id: ToolUseId, input: AnalysisInput) -> Self {
        Self {
            kind: ToolUseType::ToolUse,
            id,
            name: ToolName::AnalyzeRawAudioSignal,
            input,
        }
    }
}

// ============================================================================
// SECTION: Tool Result
// ============================================================================

/// Content item of a `tool_result` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ToolResultContent {
    /// Structured JSON result.
    Json {
        /// Analysis payload.
        json: AnalysisResult,
    },
}

impl ToolResultContent {
    /// Returns the analysis carried by this item.
    #[must_use]
    pub const fn analysis(&self) -> &AnalysisResult {
        match self {
            Self::Json {
                json,
            } => json,
        }
    }
}

/// Response to an analysis tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolResultEnvelope {
    /// Block discriminator.
    #[serde(rename = "type")]
    pub kind: ToolResultType,
    /// Identifier of the answered `tool_use`.
    pub tool_use_id: ToolUseId,
    /// Ordered, non-empty content items.
    pub content: Vec<ToolResultContent>,
}

impl ToolResultEnvelope {
    /// Wraps a single analysis result for the given invocation.
    #[must_use]
    pub fn single(tool_use_id: ToolUseId, result: AnalysisResult) -> Self {
        Self {
            kind: ToolResultType::ToolResult,
            tool_use_id,
            content: vec![ToolResultContent::Json {
                json: result,
            }],
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    reason = "Test-only assertions."
)]
mod tests {
    use serde_json::json;

    use super::ToolResultContent;
    use super::ToolUseEnvelope;

    #[test]
    fn tool_use_rejects_foreign_tool_name() {
        let result = serde_json::from_value::<ToolUseEnvelope>(json!({
            "type": "tool_use",
            "id": "toolu_1",
            "name": "get_weather",
            "input": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn tool_result_content_is_tagged_json() {
        let item: ToolResultContent = serde_json::from_value(json!({
            "type": "json",
            "json": {
                "session_id": "s1",
                "chunk_id": 4,
                "received_at_ms": 1,
                "latency_ms": 25,
                "quality": {"snr_db": 22, "clipping_ratio": 0.01, "is_silence": false}
            }
        }))
        .unwrap();
        assert_eq!(item.analysis().chunk_id, 4);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "json");
    }
}
