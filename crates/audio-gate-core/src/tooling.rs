// crates/audio-gate-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical tool identifiers for Audio Gate.
// Purpose: Shared tool naming across contracts, server, and CLI.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Canonical tool identifiers registered with the external agent.
//! These names are part of the external contract surface.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Canonical tool names exposed to tool-calling agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Analyze one chunk of raw audio metadata.
    AnalyzeRawAudioSignal,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnalyzeRawAudioSignal => "analyze_raw_audio_signal",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::AnalyzeRawAudioSignal]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    reason = "Test-only assertions."
)]
mod tests {
    use super::ToolName;

    #[test]
    fn tool_names_round_trip_through_parse() {
        for tool in ToolName::all() {
            assert_eq!(ToolName::parse(tool.as_str()), Some(*tool));
        }
        assert_eq!(ToolName::parse("transcribe_audio"), None);
    }

    #[test]
    fn tool_name_serializes_as_snake_case() {
        let value = serde_json::to_value(ToolName::AnalyzeRawAudioSignal).unwrap();
        assert_eq!(value, serde_json::json!("analyze_raw_audio_signal"));
    }
}
