// crates/audio-gate-config/src/lib.rs
// ============================================================================
// Module: Audio Gate Config Library
// Description: Canonical config model, environment overrides, and validation.
// Purpose: Single source of truth for audio-gate.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `audio-gate-config` defines the server and agent configuration for the
//! Audio Gate endpoint. A TOML file is optional; built-in defaults apply
//! when none is found. `MOCK_MODE`, `ANTHROPIC_API_KEY`, and `PORT` override
//! the file, and validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
