// crates/audio-gate-contract/src/lib.rs
// ============================================================================
// Module: Audio Gate Contract Library
// Description: Canonical schemas, validation, and tool definitions.
// Purpose: Single source of truth for the `analyze_raw_audio_signal` contract.
// Dependencies: audio-gate-core, jsonschema, serde, thiserror
// ============================================================================

//! ## Overview
//! The contract library declares the closed JSON Schemas for every entity of
//! the analysis tool call, validates untyped JSON against them through the
//! [`gateway`], and derives the tool definition registered with the external
//! agent from the same schemas. [`ContractBuilder`] renders the whole
//! contract as a deterministic, hashed artifact bundle.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod examples;
pub mod gateway;
pub mod schemas;
pub mod tooling;
pub mod types;

// ============================================================================
// SECTION: Errors
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when generating contract artifacts.
///
/// # Invariants
/// - Variants carry human-readable context for diagnostics.
/// - [`ContractError::OutputPath`] always includes the offending path.
#[derive(Debug, Error)]
pub enum ContractError {
    /// IO failure while writing artifacts.
    #[error("io error: {0}")]
    Io(String),
    /// Serialization failure while rendering artifacts.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Contract generation or verification failed.
    #[error("contract generation error: {0}")]
    Generation(String),
    /// Output path invalid or inaccessible.
    #[error("invalid output path: {0}")]
    OutputPath(PathBuf),
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::ContractBuilder;
pub use gateway::ContractEntity;
pub use gateway::GatewayError;
pub use gateway::SchemaViolation;
pub use gateway::check_mode_coupling;
pub use gateway::validate_input;
pub use gateway::validate_result;
pub use gateway::validate_tool_result_envelope;
pub use gateway::validate_tool_use;
pub use tooling::tool_contract;
pub use tooling::tool_definition;
pub use types::ArtifactFormat;
pub use types::ContractArtifact;
pub use types::ContractBundle;
pub use types::ContractManifest;
pub use types::ManifestArtifact;
pub use types::ToolContract;
pub use types::ToolDefinition;
pub use types::ToolName;
