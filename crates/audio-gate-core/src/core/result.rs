// crates/audio-gate-core/src/core/result.rs
// ============================================================================
// Module: Analysis Result
// Description: Structured output of `analyze_raw_audio_signal`.
// Purpose: Typed mirror of the closed analysis result schema.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AnalysisResult`] echoes the chunk identifiers, records receipt time
//! and latency, and always carries a [`QualitySummary`]. At most one mode
//! payload is populated, matching the requested
//! [`AnalysisMode`]; the schema leaves all four optional
//! and the gateway checks the coupling. [`FinalSummary`] appears only for the
//! final chunk of a session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SessionId;
use crate::core::input::AnalysisMode;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Severity of a detected anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No action needed.
    Low,
    /// Worth a look.
    Medium,
    /// Needs attention.
    High,
    /// Needs attention now.
    Critical,
}

/// Overall risk across a session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
    /// Critical risk.
    Critical,
}

/// Kind of code change a speaker asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeAction {
    /// Restructure existing code.
    Refactor,
    /// Add new functionality.
    CreateFeature,
    /// Track down a defect.
    Debug,
    /// Write documentation.
    Document,
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Signal quality estimates. Always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualitySummary {
    /// Signal-to-noise ratio in decibels.
    pub snr_db: f64,
    /// Fraction of clipped samples in `[0, 1]`.
    pub clipping_ratio: f64,
    /// Whether the chunk is treated as silence.
    pub is_silence: bool,
}

/// Emotion and tone estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmotionTone {
    /// Valence in `[-1, 1]`.
    pub valence: f64,
    /// Arousal in `[0, 1]`.
    pub arousal: f64,
    /// Probability of stress.
    pub stress_prob: f64,
    /// Probability of anger.
    pub anger_prob: f64,
    /// Probability of frustration.
    pub frustration_prob: f64,
}

/// Machine acoustics diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareAcoustics {
    /// Dominant frequency in hertz.
    pub dominant_freq_hz: f64,
    /// Spectral centroid in hertz.
    pub spectral_centroid_hz: f64,
    /// Probability of a fan fault.
    pub fan_fault_prob: f64,
    /// Probability of bearing wear.
    pub bearing_wear_prob: f64,
    /// Operator guidance.
    pub recommended_action: String,
}

/// Acoustic anomaly score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnomalyDetection {
    /// Anomaly score in `[0, 1]`.
    pub anomaly_score: f64,
    /// Label of the detected event.
    pub event_label: String,
    /// Severity bucket.
    pub severity: Severity,
}

/// Spoken coding intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeIntent {
    /// Requested change kind.
    pub action: CodeAction,
    /// File the change targets.
    pub target_file: String,
    /// One-line summary of the intent.
    pub intent_summary: String,
    /// Ordered list of proposed edits.
    pub proposed_changes: Vec<String>,
    /// Expected impact of the change.
    pub impact_analysis: String,
}

/// Threshold alert raised during analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alert {
    /// Machine-readable alert code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Threshold that was crossed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Observed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed: Option<f64>,
}

/// Session roll-up emitted with the final chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalSummary {
    /// End of the analyzed window in milliseconds.
    pub window_ms: u64,
    /// Overall risk for the window.
    pub overall_risk: RiskLevel,
    /// Key findings in report order.
    pub key_findings: Vec<String>,
}

// ============================================================================
// SECTION: Analysis Result
// ============================================================================

/// Structured analysis of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    /// Echo of the input session.
    pub session_id: SessionId,
    /// Echo of the input chunk index.
    pub chunk_id: u64,
    /// Receipt timestamp in unix milliseconds.
    pub received_at_ms: u64,
    /// Analysis latency in milliseconds.
    pub latency_ms: u64,
    /// Signal quality summary.
    pub quality: QualitySummary,
    /// Emotion payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_tone: Option<EmotionTone>,
    /// Hardware payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_acoustics: Option<HardwareAcoustics>,
    /// Anomaly payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_detection: Option<AnomalyDetection>,
    /// Code intent payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_intent: Option<CodeIntent>,
    /// Alerts raised for the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    /// Session summary, final chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<FinalSummary>,
}

impl AnalysisResult {
    /// Returns the analysis modes whose payloads are populated.
    #[must_use]
    pub fn populated_modes(&self) -> Vec<AnalysisMode> {
        let mut modes = Vec::new();
        if self.emotion_tone.is_some() {
            modes.push(AnalysisMode::EmotionTone);
        }
        if self.hardware_acoustics.is_some() {
            modes.push(AnalysisMode::HardwareAcoustics);
        }
        if self.anomaly_detection.is_some() {
            modes.push(AnalysisMode::AnomalyDetection);
        }
        if self.code_intent.is_some() {
            modes.push(AnalysisMode::CodeIntent);
        }
        modes
    }
}
