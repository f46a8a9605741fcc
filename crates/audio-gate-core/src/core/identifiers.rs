// crates/audio-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Audio Gate Identifiers
// Description: Opaque identifiers carried through a tool call.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! String identifiers used across the analysis round trip. Identifiers are
//! opaque and serialize as plain strings. Non-emptiness is enforced by the
//! contract schemas at the gateway, not by these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Prefix applied to locally synthesized tool-use identifiers.
pub const MOCK_TOOL_USE_PREFIX: &str = "mock_toolu_";

/// Audio streaming session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier linking a `tool_result` back to its `tool_use`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolUseId(String);

impl ToolUseId {
    /// Creates a new tool-use identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the identifier for a locally synthesized tool call.
    #[must_use]
    pub fn mock(epoch_ms: u64) -> Self {
        Self(format!("{MOCK_TOOL_USE_PREFIX}{epoch_ms}"))
    }

    /// Returns true when the identifier was synthesized locally.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.0.starts_with(MOCK_TOOL_USE_PREFIX)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolUseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ToolUseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolUseId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions."
)]
mod tests {
    use super::ToolUseId;

    #[test]
    fn mock_tool_use_id_embeds_epoch_millis() {
        let id = ToolUseId::mock(1_700_000_000_123);
        assert_eq!(id.as_str(), "mock_toolu_1700000000123");
        assert!(id.is_mock());
        assert!(!ToolUseId::new("toolu_01A").is_mock());
    }
}
