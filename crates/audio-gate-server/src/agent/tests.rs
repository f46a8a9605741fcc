// crates/audio-gate-server/src/agent/tests.rs
// ============================================================================
// Module: Agent Client Unit Tests
// Description: Wire shape of Messages requests and response helpers.
// Purpose: Pin the request body and error extraction without the network.
// Dependencies: audio-gate-server, serde_json
// ============================================================================

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]

use audio_gate_config::AgentConfig;
use audio_gate_contract::tool_definition;
use audio_gate_core::ToolName;
use serde_json::json;

use super::AgentError;
use super::AgentMessage;
use super::AgentRequest;
use super::AgentResponse;
use super::AgentRole;
use super::AnthropicClient;
use super::ToolChoice;
use super::api_error_message;
use super::messages_endpoint;

fn sample_request(tool_choice: Option<ToolChoice>) -> AgentRequest {
    AgentRequest {
        model: "claude-sonnet-4-5".to_string(),
        max_tokens: 500,
        tools: vec![tool_definition()],
        tool_choice,
        messages: vec![AgentMessage::user_text("hello")],
    }
}

#[test]
fn forced_request_serializes_tool_choice() {
    let body = serde_json::to_value(sample_request(Some(ToolChoice::tool(
        ToolName::AnalyzeRawAudioSignal,
    ))))
    .unwrap();
    assert_eq!(body["tool_choice"], json!({"type": "tool", "name": "analyze_raw_audio_signal"}));
    assert_eq!(body["tools"][0]["name"], "analyze_raw_audio_signal");
    assert!(body["tools"][0]["input_schema"].is_object());
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"][0], json!({"type": "text", "text": "hello"}));
}

#[test]
fn free_request_omits_tool_choice() {
    let body = serde_json::to_value(sample_request(None)).unwrap();
    assert!(body.get("tool_choice").is_none());
}

#[test]
fn assistant_role_serializes_lowercase() {
    let message = AgentMessage {
        role: AgentRole::Assistant,
        content: vec![json!({"type": "text", "text": "ok"})],
    };
    assert_eq!(serde_json::to_value(message).unwrap()["role"], "assistant");
}

#[test]
fn first_tool_use_skips_text_blocks() {
    let response = AgentResponse::from_content(vec![
        json!({"type": "text", "text": "calling"}),
        json!({"type": "tool_use", "id": "toolu_1", "name": "analyze_raw_audio_signal", "input": {}}),
        json!({"type": "tool_use", "id": "toolu_2", "name": "analyze_raw_audio_signal", "input": {}}),
    ]);
    assert_eq!(response.first_tool_use().unwrap()["id"], "toolu_1");
}

#[test]
fn first_tool_use_is_none_for_text_only() {
    let response = AgentResponse::from_content(vec![json!({"type": "text", "text": "no"})]);
    assert!(response.first_tool_use().is_none());
}

#[test]
fn response_ignores_unknown_envelope_fields() {
    let response: AgentResponse = serde_json::from_value(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [{"type": "text", "text": "done"}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 1, "output_tokens": 1}
    }))
    .unwrap();
    assert_eq!(response.content.len(), 1);
    assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
}

#[test]
fn endpoint_trims_trailing_slash() {
    assert_eq!(messages_endpoint("https://api.anthropic.com/"), "https://api.anthropic.com/v1/messages");
    assert_eq!(messages_endpoint("http://127.0.0.1:9000"), "http://127.0.0.1:9000/v1/messages");
}

#[test]
fn api_error_message_prefers_structured_text() {
    let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad tool"}}"#;
    assert_eq!(api_error_message(body), "bad tool");
    assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
}

#[test]
fn client_requires_api_key() {
    let config = AgentConfig::default();
    match AnthropicClient::from_config(&config) {
        Err(AgentError::Config(message)) => assert!(message.contains("api_key")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("client built without api key"),
    }
}

#[test]
fn client_rejects_blank_api_key() {
    let config = AgentConfig {
        api_key: Some("   ".to_string()),
        ..AgentConfig::default()
    };
    assert!(AnthropicClient::from_config(&config).is_err());
}

#[test]
fn client_targets_configured_base_url() {
    let config = AgentConfig {
        api_key: Some("sk-test".to_string()),
        base_url: "http://127.0.0.1:9/".to_string(),
        timeout_ms: Some(1_000),
        ..AgentConfig::default()
    };
    let client = AnthropicClient::from_config(&config).unwrap();
    assert_eq!(client.endpoint(), "http://127.0.0.1:9/v1/messages");
}
