// crates/audio-gate-core/src/lib.rs
// ============================================================================
// Module: Audio Gate Core Library
// Description: Public API surface for the Audio Gate data model.
// Purpose: Expose analysis types, protocol envelopes, the stub analysis, and hashing.
// Dependencies: crate::{analysis, core, tooling}
// ============================================================================

//! ## Overview
//! Audio Gate core defines the typed entities exchanged across the
//! `analyze_raw_audio_signal` tool call: the chunk descriptor an agent submits,
//! the structured analysis returned for it, and the `tool_use` / `tool_result`
//! envelopes that carry both. The types are closed (unknown fields are
//! rejected) and mirror the JSON Schemas published by `audio-gate-contract`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analysis;
pub mod core;
pub mod tooling;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analysis::run_audio_analysis;
pub use core::*;

pub use tooling::ToolName;
