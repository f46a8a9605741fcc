// crates/audio-gate-core/src/core/input.rs
// ============================================================================
// Module: Analysis Input
// Description: Chunk descriptor submitted to `analyze_raw_audio_signal`.
// Purpose: Typed mirror of the closed analysis input schema.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AnalysisInput`] describes one chunk of a streamed audio session. The
//! payload travels as opaque base64 and is never decoded here; only its
//! length feeds the silence heuristic of the stub analysis.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Bounds
// ============================================================================

/// Lowest accepted sample rate in hertz.
pub const MIN_SAMPLE_RATE_HZ: u32 = 8_000;
/// Highest accepted sample rate in hertz.
pub const MAX_SAMPLE_RATE_HZ: u32 = 96_000;
/// Lowest accepted channel count.
pub const MIN_CHANNELS: u8 = 1;
/// Highest accepted channel count.
pub const MAX_CHANNELS: u8 = 2;
/// Shortest accepted chunk duration in milliseconds.
pub const MIN_DURATION_MS: u32 = 10;
/// Longest accepted chunk duration in milliseconds.
pub const MAX_DURATION_MS: u32 = 5_000;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Sample encoding of the chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// Signed 16-bit little-endian PCM.
    Pcm16le,
    /// 32-bit little-endian IEEE float.
    Float32le,
    /// RIFF/WAVE container.
    Wav,
}

impl AudioFormat {
    /// Returns every accepted format in schema order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pcm16le, Self::Float32le, Self::Wav]
    }

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pcm16le => "pcm16le",
            Self::Float32le => "float32le",
            Self::Wav => "wav",
        }
    }
}

/// Analysis requested for a chunk. Selects the mode payload of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Speaker emotion and tone estimation.
    EmotionTone,
    /// Machine noise diagnostics.
    HardwareAcoustics,
    /// Generic acoustic anomaly scoring.
    AnomalyDetection,
    /// Spoken coding intent extraction.
    CodeIntent,
}

impl AnalysisMode {
    /// Returns every analysis mode in schema order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::EmotionTone, Self::HardwareAcoustics, Self::AnomalyDetection, Self::CodeIntent]
    }

    /// Returns the wire label, which is also the result field it populates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmotionTone => "emotion_tone",
            Self::HardwareAcoustics => "hardware_acoustics",
            Self::AnomalyDetection => "anomaly_detection",
            Self::CodeIntent => "code_intent",
        }
    }
}

// ============================================================================
// SECTION: Analysis Input
// ============================================================================

/// One audio chunk descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisInput {
    /// Streaming session the chunk belongs to.
    pub session_id: SessionId,
    /// Zero-based chunk index within the session.
    pub chunk_id: u64,
    /// Base64 payload. Opaque.
    pub chunk_base64: String,
    /// Payload encoding.
    pub format: AudioFormat,
    /// Sample rate in hertz.
    pub sample_rate_hz: u32,
    /// Channel count.
    pub channels: u8,
    /// Chunk start offset within the session in milliseconds.
    pub start_ms: u64,
    /// Chunk duration in milliseconds.
    pub duration_ms: u32,
    /// Requested analysis.
    pub analysis_mode: AnalysisMode,
    /// Optional free-text context from the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Marks the last chunk of the session.
    #[serde(default)]
    pub final_chunk: bool,
}

impl AnalysisInput {
    /// Returns the end of this chunk's window in milliseconds.
    #[must_use]
    pub fn window_end_ms(&self) -> u64 {
        self.start_ms.saturating_add(u64::from(self.duration_ms))
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

    use super::AnalysisInput;
    use super::AnalysisMode;

    #[test]
    fn final_chunk_defaults_to_false() {
        let input: AnalysisInput = serde_json::from_value(json!({
            "session_id": "s1",
            "chunk_id": 0,
            "chunk_base64": "AAAA",
            "format": "wav",
            "sample_rate_hz": 16000,
            "channels": 1,
            "start_ms": 0,
            "duration_ms": 100,
            "analysis_mode": "code_intent"
        }))
        .unwrap();
        assert!(!input.final_chunk);
        assert_eq!(input.context, None);
        assert_eq!(input.analysis_mode, AnalysisMode::CodeIntent);
        assert_eq!(input.window_end_ms(), 100);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<AnalysisInput>(json!({
            "session_id": "s1",
            "chunk_id": 0,
            "chunk_base64": "AAAA",
            "format": "wav",
            "sample_rate_hz": 16000,
            "channels": 1,
            "start_ms": 0,
            "duration_ms": 100,
            "analysis_mode": "code_intent",
            "speaker": "alice"
        }));
        assert!(result.is_err());
    }
}
