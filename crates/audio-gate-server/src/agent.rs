// crates/audio-gate-server/src/agent.rs
// ============================================================================
// Module: Agent Client
// Description: Tool-calling agent capability and Anthropic Messages client.
// Purpose: Send one conversation turn and receive the agent's content blocks.
// Dependencies: async-trait, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`AgentClient`] is the narrow capability the request handler needs from an
//! external tool-calling agent: send a conversation, get content blocks back.
//! [`AnthropicClient`] implements it against `POST {base_url}/v1/messages`.
//! Content blocks are kept as untyped JSON so the assistant turn can be
//! replayed verbatim and the final answer returned unmodified.
//! Security posture: the API key is sent only as the `x-api-key` header and
//! never appears in errors or logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use audio_gate_config::AgentConfig;
use audio_gate_contract::ToolDefinition;
use audio_gate_core::ToolName;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path of the Messages endpoint relative to the base URL.
pub const MESSAGES_PATH: &str = "/v1/messages";
/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";
/// Header carrying the API version.
const VERSION_HEADER: &str = "anthropic-version";
/// Upper bound on API error text carried into [`AgentError::Api`].
const MAX_ERROR_TEXT: usize = 512;

// ============================================================================
// SECTION: Conversation Types
// ============================================================================

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Caller turn.
    User,
    /// Agent turn.
    Assistant,
}

/// One conversation turn with raw content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Turn author.
    pub role: AgentRole,
    /// Content blocks in order.
    pub content: Vec<Value>,
}

impl AgentMessage {
    /// Builds a user turn carrying a single text block.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: AgentRole::User,
            content: vec![serde_json::json!({ "type": "text", "text": text.into() })],
        }
    }
}

/// Forced tool selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    /// Selection kind; always `tool`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Tool the agent must call.
    pub name: ToolName,
}

impl ToolChoice {
    /// Forces the agent to call `tool`.
    #[must_use]
    pub fn tool(tool: ToolName) -> Self {
        Self {
            kind: "tool".to_string(),
            name: tool,
        }
    }
}

/// Request body of one Messages call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRequest {
    /// Model identifier.
    pub model: String,
    /// Output token cap.
    pub max_tokens: u32,
    /// Tools registered for this call.
    pub tools: Vec<ToolDefinition>,
    /// Forced tool choice; omitted to let the agent answer freely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Conversation so far.
    pub messages: Vec<AgentMessage>,
}

/// Response of one Messages call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentResponse {
    /// Content blocks emitted by the agent.
    pub content: Vec<Value>,
    /// Reason the agent stopped, when reported.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl AgentResponse {
    /// Wraps content blocks in a response.
    #[must_use]
    pub const fn from_content(content: Vec<Value>) -> Self {
        Self {
            content,
            stop_reason: None,
        }
    }

    /// Returns the first `tool_use` block, if the agent emitted one.
    #[must_use]
    pub fn first_tool_use(&self) -> Option<&Value> {
        self.content
            .iter()
            .find(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
    }
}

// ============================================================================
// SECTION: Capability
// ============================================================================

/// Tool-calling agent capability.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Sends one conversation turn and returns the agent's content.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on transport, API, or decoding failure.
    async fn send_turn(&self, request: &AgentRequest) -> Result<AgentResponse, AgentError>;
}

// ============================================================================
// SECTION: Anthropic Client
// ============================================================================

/// Anthropic Messages API client.
pub struct AnthropicClient {
    /// Messages endpoint URL.
    endpoint: String,
    /// Static request headers (key and version).
    headers: HeaderMap,
    /// HTTP client configured with the optional timeout.
    client: Client,
}

impl AnthropicClient {
    /// Builds a client from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when the API key is missing or not a
    /// valid header value, or the HTTP client cannot be built.
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AgentError::Config("agent.api_key is required".to_string()))?;
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| AgentError::Config("invalid api key".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(
            VERSION_HEADER,
            HeaderValue::from_str(&config.anthropic_version)
                .map_err(|_| AgentError::Config("invalid anthropic_version".to_string()))?,
        );

        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build().map_err(|err| AgentError::Config(err.to_string()))?;

        Ok(Self {
            endpoint: messages_endpoint(&config.base_url),
            headers,
            client,
        })
    }

    /// Returns the Messages endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AgentClient for AnthropicClient {
    async fn send_turn(&self, request: &AgentRequest) -> Result<AgentResponse, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| AgentError::Transport(err.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        response.json::<AgentResponse>().await.map_err(|err| AgentError::Decode(err.to_string()))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Agent client failures.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Client configuration is unusable.
    #[error("agent config error: {0}")]
    Config(String),
    /// Request could not be delivered.
    #[error("agent transport error: {0}")]
    Transport(String),
    /// Agent API answered with a non-success status.
    #[error("agent api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text reported by the API.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("agent response decode error: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins the base URL and the Messages path.
fn messages_endpoint(base_url: &str) -> String {
    format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/'))
}

/// Extracts `error.message` from an API error body, else truncated raw text.
fn api_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if let Some(message) =
        parsed.as_ref().and_then(|value| value.pointer("/error/message")).and_then(Value::as_str)
    {
        return message.to_string();
    }
    body.chars().take(MAX_ERROR_TEXT).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
