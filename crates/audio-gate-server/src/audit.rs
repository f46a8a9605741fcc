// crates/audio-gate-server/src/audit.rs
// ============================================================================
// Module: Analyze Audit Logging
// Description: Structured audit events for `/analyze` requests.
// Purpose: Emit JSON-line audit records without logging audio payloads.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every `/analyze` request produces one [`AnalyzeAuditEvent`] carrying
//! request metadata only: identifiers, sizes, status, and latency. Chunk
//! payloads, context strings, and agent content are never recorded.
//! Sinks are selected from the `[server.audit]` configuration section.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use audio_gate_config::ServerAuditConfig;
use serde::Serialize;

use crate::telemetry::AnalyzeOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Redaction label attached to every audit event.
pub const AUDIT_REDACTION: &str = "metadata_only";

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// Audit payload for a single `/analyze` request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeAuditEvent {
    /// Event kind label.
    pub event: &'static str,
    /// Unix timestamp in milliseconds when the event was emitted.
    pub timestamp_ms: u128,
    /// Agent mode label (`mock` or `live`).
    pub mode: &'static str,
    /// Request outcome.
    pub outcome: AnalyzeOutcome,
    /// HTTP status returned to the caller.
    pub status: u16,
    /// Normalized error kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Session identifier when the input validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Chunk identifier when the input validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<u64>,
    /// Tool invocation identifier when one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Handling latency in milliseconds.
    pub latency_ms: u64,
    /// Redaction classification for payload logging.
    pub redaction: &'static str,
}

/// Inputs required to construct an audit event.
pub struct AnalyzeAuditEventParams {
    /// Agent mode label.
    pub mode: &'static str,
    /// Request outcome.
    pub outcome: AnalyzeOutcome,
    /// HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Session identifier when known.
    pub session_id: Option<String>,
    /// Chunk identifier when known.
    pub chunk_id: Option<u64>,
    /// Tool invocation identifier when known.
    pub tool_use_id: Option<String>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Handling latency in milliseconds.
    pub latency_ms: u64,
}

impl AnalyzeAuditEvent {
    /// Creates a new audit event stamped with the current time.
    #[must_use]
    pub fn new(params: AnalyzeAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "analyze_request",
            timestamp_ms,
            mode: params.mode,
            outcome: params.outcome,
            status: params.status,
            error_kind: params.error_kind,
            session_id: params.session_id,
            chunk_id: params.chunk_id,
            tool_use_id: params.tool_use_id,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            latency_ms: params.latency_ms,
            redaction: AUDIT_REDACTION,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for `/analyze` request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &AnalyzeAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AnalyzeAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AnalyzeAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AnalyzeAuditEvent) {}
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the audit sink described by the `[server.audit]` section.
///
/// # Errors
///
/// Returns an error when the configured audit file cannot be opened.
pub fn audit_sink_from_config(config: &ServerAuditConfig) -> io::Result<Arc<dyn AuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => Ok(Arc::new(FileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
