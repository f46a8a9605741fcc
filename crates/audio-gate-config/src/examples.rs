// crates/audio-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `audio-gate.toml`. Every key is spelled out with its
//! default value except where noted.

/// Returns a canonical example `audio-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
host = "0.0.0.0"
port = 3000
max_body_bytes = 10485760

[server.audit]
enabled = true
# path = "audio-gate-audit.jsonl"

[agent]
# Defaults to "live", which requires an API key.
mode = "mock"
# api_key is normally supplied through ANTHROPIC_API_KEY.
base_url = "https://api.anthropic.com"
model = "claude-sonnet-4-5"
max_tokens = 500
anthropic_version = "2023-06-01"
# Unset by default (no client-side timeout).
timeout_ms = 30000
"#,
    )
}
