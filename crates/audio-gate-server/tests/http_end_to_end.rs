// crates/audio-gate-server/tests/http_end_to_end.rs
// ============================================================================
// Module: HTTP End-to-End Tests
// Description: `/analyze` over real sockets in mock and live mode.
// Purpose: Exercise the axum transport and Anthropic client against a local
//          fake Messages endpoint.
// Dependencies: audio-gate-server, axum, reqwest, tokio
// ============================================================================

//! End-to-end tests that bind ephemeral ports and speak HTTP.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use audio_gate_config::AgentMode;
use audio_gate_config::GatewayConfig;
use audio_gate_contract::examples::analysis_input_example;
use audio_gate_contract::examples::input_example;
use audio_gate_core::AnalysisMode;
use audio_gate_server::AgentBackend;
use audio_gate_server::AnalyzeServer;
use audio_gate_server::AnalyzeService;
use audio_gate_server::NoopAuditSink;
use audio_gate_server::NoopMetrics;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Running gateway plus its shutdown trigger.
struct RunningServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl RunningServer {
    async fn start(server: AnalyzeServer) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = server
                .serve_on(listener, async move {
                    let _ = rx.await;
                })
                .await;
        });
        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    fn url(&self) -> String {
        format!("http://{}/analyze", self.addr)
    }

    async fn post(&self, body: Vec<u8>) -> (StatusCode, Value) {
        let response = reqwest::Client::new()
            .post(self.url())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        let value = response.json::<Value>().await.unwrap();
        (status, value)
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn mock_server(max_body_bytes: usize) -> AnalyzeServer {
    AnalyzeServer::new(
        "127.0.0.1:0".parse().unwrap(),
        AnalyzeService::new(AgentBackend::Mock, "claude-sonnet-4-5", 500),
        Arc::new(NoopAuditSink),
        Arc::new(NoopMetrics),
        max_body_bytes,
    )
}

// ============================================================================
// SECTION: Fake Messages API
// ============================================================================

/// Captured requests of the fake Messages endpoint.
#[derive(Default)]
struct FakeAgent {
    bodies: Mutex<Vec<Value>>,
    api_keys: Mutex<Vec<String>>,
}

async fn fake_messages(
    State(agent): State<Arc<FakeAgent>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let key = headers.get("x-api-key").and_then(|value| value.to_str().ok()).unwrap_or("");
    agent.api_keys.lock().unwrap().push(key.to_string());
    let call = {
        let mut bodies = agent.bodies.lock().unwrap();
        bodies.push(body.clone());
        bodies.len()
    };
    if call == 1 {
        let text = body["messages"][0]["content"][0]["text"].as_str().unwrap_or("");
        let raw = text.split_once('\n').map_or("", |(_, json)| json);
        let input: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
        Json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "tool_use", "id": "toolu_e2e", "name": "analyze_raw_audio_signal", "input": input}
            ],
            "stop_reason": "tool_use"
        }))
    } else {
        Json(json!({
            "id": "msg_2",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Stress is elevated."}],
            "stop_reason": "end_turn"
        }))
    }
}

async fn start_fake_agent() -> (SocketAddr, Arc<FakeAgent>) {
    let agent = Arc::new(FakeAgent::default());
    let app = Router::new()
        .route("/v1/messages", post(fake_messages))
        .with_state(Arc::clone(&agent));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, agent)
}

// ============================================================================
// SECTION: Mock Mode
// ============================================================================

#[tokio::test]
async fn mock_mode_round_trip_over_http() {
    let server = RunningServer::start(mock_server(10 * 1024 * 1024)).await;
    let input = input_example();

    let (status, body) = server.post(serde_json::to_vec(&input).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mock"], true);
    assert_eq!(body["tool_use"]["input"]["session_id"], input.session_id.as_str());
    assert_eq!(body["tool_result_json"]["chunk_id"], input.chunk_id);
    assert_eq!(body["tool_result_json"]["anomaly_detection"]["severity"], "low");
    assert_eq!(body["tool_result_json"]["quality"]["is_silence"], false);
    assert_eq!(
        body["claude_final"][0]["text"],
        "[mock] Analysis complete. All validation passed."
    );
}

#[tokio::test]
async fn channels_out_of_range_is_rejected_over_http() {
    let server = RunningServer::start(mock_server(10 * 1024 * 1024)).await;
    let mut value = serde_json::to_value(input_example()).unwrap();
    value["channels"] = json!(3);

    let (status, body) = server.post(serde_json::to_vec(&value).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violation = &body["violations"][0];
    assert_eq!(violation["path"], "/channels");
    assert_eq!(violation["expected"], "maximum: 2");
}

#[tokio::test]
async fn body_over_limit_is_payload_too_large_over_http() {
    let server = RunningServer::start(mock_server(64)).await;
    let mut input = input_example();
    input.chunk_base64 = "A".repeat(4_096);

    let (status, body) = server.post(serde_json::to_vec(&input).unwrap()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("64 bytes"));
}

// ============================================================================
// SECTION: Live Mode
// ============================================================================

#[tokio::test]
async fn live_mode_calls_messages_api_twice() {
    let (agent_addr, agent) = start_fake_agent().await;
    let mut config = GatewayConfig::default();
    config.agent.mode = AgentMode::Live;
    config.agent.api_key = Some("sk-e2e".to_string());
    config.agent.base_url = format!("http://{agent_addr}");
    config.agent.timeout_ms = Some(5_000);
    config.server.audit.enabled = false;
    let server = RunningServer::start(AnalyzeServer::from_config(&config).unwrap()).await;

    let mut input = analysis_input_example(AnalysisMode::EmotionTone);
    input.final_chunk = true;
    let (status, body) = server.post(serde_json::to_vec(&input).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("mock").is_none());
    assert_eq!(body["tool_use"]["id"], "toolu_e2e");
    assert!(body["tool_result_json"]["emotion_tone"].is_object());
    assert!(body["tool_result_json"]["final_summary"].is_object());
    assert_eq!(body["claude_final"], json!([{"type": "text", "text": "Stress is elevated."}]));

    let bodies = agent.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["tool_choice"]["name"], "analyze_raw_audio_signal");
    assert_eq!(bodies[0]["model"], "claude-sonnet-4-5");
    assert!(bodies[1].get("tool_choice").is_none());
    assert_eq!(bodies[1]["messages"][2]["content"][0]["tool_use_id"], "toolu_e2e");
    assert!(agent.api_keys.lock().unwrap().iter().all(|key| key == "sk-e2e"));
}

#[tokio::test]
async fn live_mode_rejects_malformed_input_without_calling_agent() {
    let (agent_addr, agent) = start_fake_agent().await;
    let mut config = GatewayConfig::default();
    config.agent.api_key = Some("sk-e2e".to_string());
    config.agent.base_url = format!("http://{agent_addr}");
    config.server.audit.enabled = false;
    let server = RunningServer::start(AnalyzeServer::from_config(&config).unwrap()).await;

    let (status, body) = server.post(br#"{"session_id": ""}"#.to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["violations"].as_array().is_some_and(|list| !list.is_empty()));
    assert!(agent.bodies.lock().unwrap().is_empty());
}
