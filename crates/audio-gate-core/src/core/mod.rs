// crates/audio-gate-core/src/core/mod.rs
// ============================================================================
// Module: Audio Gate Core Types
// Description: Canonical analysis entities and protocol envelopes.
// Purpose: Provide stable, serializable types for the audio analysis tool call.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Audio Gate core types define the chunk descriptor, the analysis result, and
//! the tool-call envelopes. These types are the typed counterpart of the
//! contract schemas; every struct rejects unknown fields.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod envelope;
pub mod hashing;
pub mod identifiers;
pub mod input;
pub mod result;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::ToolResultContent;
pub use envelope::ToolResultEnvelope;
pub use envelope::ToolResultType;
pub use envelope::ToolUseEnvelope;
pub use envelope::ToolUseType;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::hash_bytes;
pub use identifiers::SessionId;
pub use identifiers::ToolUseId;
pub use input::AnalysisInput;
pub use input::AnalysisMode;
pub use input::AudioFormat;
pub use result::Alert;
pub use result::AnalysisResult;
pub use result::AnomalyDetection;
pub use result::CodeAction;
pub use result::CodeIntent;
pub use result::EmotionTone;
pub use result::FinalSummary;
pub use result::HardwareAcoustics;
pub use result::QualitySummary;
pub use result::RiskLevel;
pub use result::Severity;
