// crates/audio-gate-server/src/telemetry.rs
// ============================================================================
// Module: Analyze Telemetry
// Description: Observability hooks for the `/analyze` endpoint.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A thin metrics interface for request counters and latency histograms.
//! Deployments plug in an exporter by implementing [`GatewayMetrics`]; the
//! server defaults to [`NoopMetrics`]. Labels never carry audio payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for `/analyze` histograms.
///
/// The upper buckets cover two sequential agent round trips in live mode.
pub const ANALYZE_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 60_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzeOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl AnalyzeOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Request metric event payload.
#[derive(Debug, Clone)]
pub struct AnalyzeMetricEvent {
    /// Agent mode label (`mock` or `live`).
    pub mode: &'static str,
    /// Request outcome.
    pub outcome: AnalyzeOutcome,
    /// HTTP status returned to the caller.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for `/analyze` requests and latencies.
pub trait GatewayMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: AnalyzeMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: AnalyzeMetricEvent, latency: Duration);
}

/// No-op metrics sink.
pub struct NoopMetrics;

impl GatewayMetrics for NoopMetrics {
    fn record_request(&self, _event: AnalyzeMetricEvent) {}

    fn record_latency(&self, _event: AnalyzeMetricEvent, _latency: Duration) {}
}
