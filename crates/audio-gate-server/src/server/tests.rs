// crates/audio-gate-server/src/server/tests.rs
// ============================================================================
// Module: HTTP Server Unit Tests
// Description: Handler status mapping, body limits, and audit emission.
// Purpose: Drive the axum handler directly without binding a socket.
// Dependencies: audio-gate-server, axum, tokio
// ============================================================================

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use audio_gate_config::GatewayConfig;
use audio_gate_contract::examples::input_example;
use axum::body::Bytes;
use axum::body::to_bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use super::AnalyzeServer;
use super::ServerError;
use super::ServerState;
use super::handle_analyze;
use crate::analyze::AgentBackend;
use crate::analyze::AnalyzeService;
use crate::audit::AnalyzeAuditEvent;
use crate::audit::AuditSink;
use crate::telemetry::AnalyzeMetricEvent;
use crate::telemetry::GatewayMetrics;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Audit sink that keeps events in memory.
#[derive(Default)]
struct CapturingAudit {
    events: Mutex<Vec<AnalyzeAuditEvent>>,
}

impl AuditSink for CapturingAudit {
    fn record(&self, event: &AnalyzeAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Metrics sink that counts observations.
#[derive(Default)]
struct CountingMetrics {
    requests: Mutex<Vec<u16>>,
    latencies: Mutex<Vec<Duration>>,
}

impl GatewayMetrics for CountingMetrics {
    fn record_request(&self, event: AnalyzeMetricEvent) {
        self.requests.lock().unwrap().push(event.status);
    }

    fn record_latency(&self, _event: AnalyzeMetricEvent, latency: Duration) {
        self.latencies.lock().unwrap().push(latency);
    }
}

fn mock_state(
    audit: Arc<CapturingAudit>,
    metrics: Arc<CountingMetrics>,
    max_body_bytes: usize,
) -> Arc<ServerState> {
    Arc::new(ServerState {
        service: AnalyzeService::new(AgentBackend::Mock, "claude-sonnet-4-5", 500)
            .with_clock(Arc::new(|| 42)),
        audit,
        metrics,
        max_body_bytes,
    })
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn example_body() -> Bytes {
    Bytes::from(serde_json::to_vec(&input_example()).unwrap())
}

// ============================================================================
// SECTION: Handler
// ============================================================================

#[tokio::test]
async fn valid_request_returns_ok_and_audits_metadata() {
    let audit = Arc::new(CapturingAudit::default());
    let metrics = Arc::new(CountingMetrics::default());
    let state = mock_state(Arc::clone(&audit), Arc::clone(&metrics), 1024 * 1024);

    let response = handle_analyze(State(state), Ok(example_body())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mock"], true);
    assert_eq!(body["tool_use"]["id"], "mock_toolu_42");

    let events = audit.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.status, 200);
    assert_eq!(event.mode, "mock");
    assert_eq!(event.session_id.as_deref(), Some(input_example().session_id.as_str()));
    assert_eq!(event.tool_use_id.as_deref(), Some("mock_toolu_42"));
    assert!(event.error_kind.is_none());
    assert_eq!(event.request_bytes, example_body().len());
    assert!(event.response_bytes > 0);

    let serialized = serde_json::to_string(event).unwrap();
    assert!(!serialized.contains(&input_example().chunk_base64));
    assert_eq!(metrics.requests.lock().unwrap().as_slice(), &[200]);
    assert_eq!(metrics.latencies.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let audit = Arc::new(CapturingAudit::default());
    let state = mock_state(Arc::clone(&audit), Arc::new(CountingMetrics::default()), 16);

    let response = handle_analyze(State(state), Ok(example_body())).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("16 bytes"));

    let events = audit.events.lock().unwrap();
    assert_eq!(events[0].error_kind, Some("payload_too_large"));
    assert!(events[0].session_id.is_none());
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let audit = Arc::new(CapturingAudit::default());
    let state = mock_state(Arc::clone(&audit), Arc::new(CountingMetrics::default()), 1024);

    let response = handle_analyze(State(state), Ok(Bytes::from_static(b"not json"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("invalid json body"));
    assert!(body.get("violations").is_none());
    assert_eq!(audit.events.lock().unwrap()[0].error_kind, Some("invalid_json"));
}

#[tokio::test]
async fn schema_violation_lists_fields() {
    let state = mock_state(
        Arc::new(CapturingAudit::default()),
        Arc::new(CountingMetrics::default()),
        1024 * 1024,
    );
    let mut value = serde_json::to_value(input_example()).unwrap();
    value["sample_rate_hz"] = Value::from(4_000);
    value["extra"] = Value::from(true);

    let response =
        handle_analyze(State(state), Ok(Bytes::from(serde_json::to_vec(&value).unwrap()))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let paths: Vec<&str> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|violation| violation["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"/sample_rate_hz"));
    assert!(paths.contains(&"/extra"));
}

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn from_config_rejects_live_mode_without_key() {
    let config = GatewayConfig::default();
    match AnalyzeServer::from_config(&config) {
        Err(ServerError::Config(message)) => assert!(message.contains("api key")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("server built without api key"),
    }
}

#[test]
fn from_config_builds_mock_server() {
    let mut config = GatewayConfig::default();
    config.agent.mode = audio_gate_config::AgentMode::Mock;
    config.server.audit.enabled = false;
    let server = AnalyzeServer::from_config(&config).unwrap();
    assert_eq!(server.mode_label(), "mock");
    assert_eq!(server.bind_addr().port(), 3000);
}
