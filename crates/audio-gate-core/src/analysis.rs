// crates/audio-gate-core/src/analysis.rs
// ============================================================================
// Module: Stub Audio Analysis
// Description: Deterministic placeholder for audio inference.
// Purpose: Produce schema-conformant results from a validated chunk descriptor.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`run_audio_analysis`] stands in for real DSP/ML inference. It is a pure
//! function of the chunk descriptor and the receipt clock: the payload is
//! never decoded, only its encoded length drives the silence heuristic, and
//! every mode payload is a fixed constant. The output contract is the real
//! one: exactly the payload for the requested mode is populated and the
//! final summary appears only for the final chunk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AnalysisInput;
use crate::core::AnalysisMode;
use crate::core::AnalysisResult;
use crate::core::AnomalyDetection;
use crate::core::CodeAction;
use crate::core::CodeIntent;
use crate::core::EmotionTone;
use crate::core::FinalSummary;
use crate::core::HardwareAcoustics;
use crate::core::QualitySummary;
use crate::core::RiskLevel;
use crate::core::Severity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Encoded payloads shorter than this are treated as silence.
pub const SILENCE_BASE64_THRESHOLD: usize = 24;
/// Reported SNR for silent chunks.
pub const SILENT_SNR_DB: f64 = 5.0;
/// Reported SNR for non-silent chunks.
pub const ACTIVE_SNR_DB: f64 = 22.0;
/// Reported clipping ratio.
pub const CLIPPING_RATIO: f64 = 0.01;
/// Reported analysis latency in milliseconds.
pub const STUB_LATENCY_MS: u64 = 25;

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Analyzes one chunk received at `received_at_ms` (unix milliseconds).
#[must_use]
pub fn run_audio_analysis(input: &AnalysisInput, received_at_ms: u64) -> AnalysisResult {
    let is_silence = input.chunk_base64.len() < SILENCE_BASE64_THRESHOLD;
    let mut result = AnalysisResult {
        session_id: input.session_id.clone(),
        chunk_id: input.chunk_id,
        received_at_ms,
        latency_ms: STUB_LATENCY_MS,
        quality: QualitySummary {
            snr_db: if is_silence { SILENT_SNR_DB } else { ACTIVE_SNR_DB },
            clipping_ratio: CLIPPING_RATIO,
            is_silence,
        },
        emotion_tone: None,
        hardware_acoustics: None,
        anomaly_detection: None,
        code_intent: None,
        alerts: None,
        final_summary: None,
    };

    match input.analysis_mode {
        AnalysisMode::EmotionTone => result.emotion_tone = Some(emotion_tone()),
        AnalysisMode::HardwareAcoustics => result.hardware_acoustics = Some(hardware_acoustics()),
        AnalysisMode::AnomalyDetection => result.anomaly_detection = Some(anomaly_detection()),
        AnalysisMode::CodeIntent => result.code_intent = Some(code_intent()),
    }

    if input.final_chunk {
        result.final_summary = Some(FinalSummary {
            window_ms: input.window_end_ms(),
            overall_risk: RiskLevel::Low,
            key_findings: vec![String::from("No critical anomalies detected.")],
        });
    }

    result
}

// ============================================================================
// SECTION: Mode Payloads
// ============================================================================

/// Fixed emotion estimate.
const fn emotion_tone() -> EmotionTone {
    EmotionTone {
        valence: 0.1,
        arousal: 0.6,
        stress_prob: 0.7,
        anger_prob: 0.2,
        frustration_prob: 0.4,
    }
}

/// Fixed machine diagnostics.
fn hardware_acoustics() -> HardwareAcoustics {
    HardwareAcoustics {
        dominant_freq_hz: 280.5,
        spectral_centroid_hz: 1100.2,
        fan_fault_prob: 0.25,
        bearing_wear_prob: 0.18,
        recommended_action: String::from("No immediate action required."),
    }
}

/// Fixed anomaly score.
fn anomaly_detection() -> AnomalyDetection {
    AnomalyDetection {
        anomaly_score: 0.22,
        event_label: String::from("normal_operation"),
        severity: Severity::Low,
    }
}

/// Fixed coding intent.
fn code_intent() -> CodeIntent {
    CodeIntent {
        action: CodeAction::Debug,
        target_file: String::from("crates/audio-gate-server/src/analyze.rs"),
        intent_summary: String::from(
            "Add cleanup for session-scoped audio buffers to prevent leaks.",
        ),
        proposed_changes: vec![
            String::from("Track buffers in a map keyed by session_id."),
            String::from("Clear and delete session buffer when final_chunk is true."),
            String::from("Add timeout-based cleanup for abandoned sessions."),
        ],
        impact_analysis: String::from(
            "Reduces memory growth over long-lived sessions with low behavioral risk.",
        ),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    reason = "Test-only fixtures and assertions."
)]
mod tests {
    use super::run_audio_analysis;
    use crate::core::AnalysisInput;
    use crate::core::AnalysisMode;
    use crate::core::AudioFormat;
    use crate::core::Severity;
    use crate::core::SessionId;

    fn input(mode: AnalysisMode, payload: &str, final_chunk: bool) -> AnalysisInput {
        AnalysisInput {
            session_id: SessionId::from("s1"),
            chunk_id: 7,
            chunk_base64: payload.to_string(),
            format: AudioFormat::Pcm16le,
            sample_rate_hz: 16_000,
            channels: 1,
            start_ms: 1_000,
            duration_ms: 250,
            analysis_mode: mode,
            context: None,
            final_chunk,
        }
    }

    #[test]
    fn exactly_the_requested_mode_is_populated() {
        for mode in AnalysisMode::all() {
            let result = run_audio_analysis(&input(*mode, "AAAA", false), 0);
            assert_eq!(result.populated_modes(), vec![*mode]);
        }
    }

    #[test]
    fn silence_threshold_is_24_encoded_chars() {
        let loud = run_audio_analysis(
            &input(AnalysisMode::AnomalyDetection, "AAAAAAAAAAAAAAAAAAAAAAAA", false),
            0,
        );
        assert!(!loud.quality.is_silence);
        assert!((loud.quality.snr_db - 22.0).abs() < f64::EPSILON);
        assert_eq!(loud.anomaly_detection.map(|payload| payload.severity), Some(Severity::Low));

        let quiet = run_audio_analysis(
            &input(AnalysisMode::AnomalyDetection, "AAAAAAAAAAAAAAAAAAAAAAA", false),
            0,
        );
        assert!(quiet.quality.is_silence);
        assert!((quiet.quality.snr_db - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn final_summary_tracks_final_chunk() {
        let last = run_audio_analysis(&input(AnalysisMode::EmotionTone, "AAAA", true), 42);
        assert_eq!(last.final_summary.map(|summary| summary.window_ms), Some(1_250));
        assert_eq!(last.received_at_ms, 42);

        let mid = run_audio_analysis(&input(AnalysisMode::EmotionTone, "AAAA", false), 42);
        assert!(mid.final_summary.is_none());
    }
}
