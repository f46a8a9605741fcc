// crates/audio-gate-server/src/analyze.rs
// ============================================================================
// Module: Analyze Handler
// Description: Request state machine behind `POST /analyze`.
// Purpose: Validate, dispatch, analyze, and validate again before responding.
// Dependencies: audio-gate-contract, audio-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`AnalyzeService`] turns one raw request body into either an
//! [`AnalyzeResponse`] or an [`AnalyzeError`]. The flow is:
//!
//! 1. parse the body as JSON and validate it as an `AnalysisInput`;
//! 2. obtain a `tool_use` invocation, synthesized locally in mock mode or
//!    requested from the agent with a forced tool choice in live mode, and
//!    validate it;
//! 3. run the stub analysis, wrap it in a `tool_result` envelope, and check
//!    the envelope schema and mode coupling;
//! 4. in live mode, replay the conversation with the envelope appended and
//!    return the agent's final content unmodified.
//!
//! Malformed input never reaches the agent. Nothing is retried or cached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use audio_gate_config::GatewayConfig;
use audio_gate_contract::GatewayError;
use audio_gate_contract::SchemaViolation;
use audio_gate_contract::ToolDefinition;
use audio_gate_contract::check_mode_coupling;
use audio_gate_contract::tool_definition;
use audio_gate_contract::validate_input;
use audio_gate_contract::validate_tool_result_envelope;
use audio_gate_contract::validate_tool_use;
use audio_gate_core::AnalysisResult;
use audio_gate_core::SessionId;
use audio_gate_core::ToolName;
use audio_gate_core::ToolResultEnvelope;
use audio_gate_core::ToolUseEnvelope;
use audio_gate_core::ToolUseId;
use audio_gate_core::run_audio_analysis;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::agent::AgentClient;
use crate::agent::AgentError;
use crate::agent::AgentMessage;
use crate::agent::AgentRequest;
use crate::agent::AgentRole;
use crate::agent::AnthropicClient;
use crate::agent::ToolChoice;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of the single user turn sent to the agent.
pub const TOOL_CALL_PROMPT: &str = "Call analyze_raw_audio_signal with this exact JSON input:\n";
/// Final text returned in mock mode.
pub const MOCK_FINAL_TEXT: &str = "[mock] Analysis complete. All validation passed.";

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Receipt clock returning unix milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Returns the wall-clock receipt clock.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(|| {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    })
}

// ============================================================================
// SECTION: Response Types
// ============================================================================

/// Success body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeResponse {
    /// `true` in mock mode; omitted in live mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock: Option<bool>,
    /// Validated tool invocation.
    pub tool_use: ToolUseEnvelope,
    /// Analysis produced for the invocation.
    pub tool_result_json: AnalysisResult,
    /// Final agent content blocks.
    pub claude_final: Vec<Value>,
}

/// Identifiers observed while handling a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeTrace {
    /// Session of the validated input.
    pub session_id: Option<SessionId>,
    /// Chunk of the validated input.
    pub chunk_id: Option<u64>,
    /// Identifier of the validated invocation.
    pub tool_use_id: Option<ToolUseId>,
}

/// Outcome of one request together with its trace.
#[derive(Debug)]
pub struct AnalyzeExchange {
    /// Identifiers observed before completion or failure.
    pub trace: AnalyzeTrace,
    /// Response or error.
    pub result: Result<AnalyzeResponse, AnalyzeError>,
}

/// Error body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Raw agent content on protocol non-compliance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Value>>,
    /// Field-level diagnostics on schema violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<SchemaViolation>>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Source of tool invocations.
#[derive(Clone)]
pub enum AgentBackend {
    /// Invocations are synthesized locally.
    Mock,
    /// Invocations come from an external agent.
    Live(Arc<dyn AgentClient>),
}

impl AgentBackend {
    /// Returns the stable mode label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live(_) => "live",
        }
    }
}

/// Immutable handler state shared across requests.
#[derive(Clone)]
pub struct AnalyzeService {
    /// Invocation source.
    backend: AgentBackend,
    /// Model identifier sent to the agent.
    model: String,
    /// Output token cap sent to the agent.
    max_tokens: u32,
    /// Tools registered with every agent call.
    tools: Vec<ToolDefinition>,
    /// Receipt clock.
    clock: Clock,
}

impl AnalyzeService {
    /// Builds a service for the given backend and agent parameters.
    #[must_use]
    pub fn new(backend: AgentBackend, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens,
            tools: vec![tool_definition()],
            clock: system_clock(),
        }
    }

    /// Builds the service described by configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the live agent client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, AgentError> {
        let backend = if config.is_mock() {
            AgentBackend::Mock
        } else {
            AgentBackend::Live(Arc::new(AnthropicClient::from_config(&config.agent)?))
        };
        Ok(Self::new(backend, config.agent.model.clone(), config.agent.max_tokens))
    }

    /// Replaces the receipt clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the stable mode label.
    #[must_use]
    pub const fn mode_label(&self) -> &'static str {
        self.backend.label()
    }

    /// Handles one raw request body.
    pub async fn handle(&self, body: &[u8]) -> AnalyzeExchange {
        let mut trace = AnalyzeTrace::default();
        let result = self.run(body, &mut trace).await;
        AnalyzeExchange {
            trace,
            result,
        }
    }

    /// Drives the request through every state, recording identifiers.
    async fn run(
        &self,
        body: &[u8],
        trace: &mut AnalyzeTrace,
    ) -> Result<AnalyzeResponse, AnalyzeError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|err| AnalyzeError::InvalidJson(err.to_string()))?;
        let input = validate_input(&raw).map_err(AnalyzeError::boundary)?;
        trace.session_id = Some(input.session_id.clone());
        trace.chunk_id = Some(input.chunk_id);
        let received_at_ms = (self.clock)();

        match &self.backend {
            AgentBackend::Mock => {
                let block = json!({
                    "type": "tool_use",
                    "id": ToolUseId::mock(received_at_ms),
                    "name": ToolName::AnalyzeRawAudioSignal,
                    "input": raw,
                });
                let tool_use = validate_tool_use(&block).map_err(AnalyzeError::boundary)?;
                trace.tool_use_id = Some(tool_use.id.clone());
                let (result, _) = analyze_invocation(&tool_use, received_at_ms)?;
                Ok(AnalyzeResponse {
                    mock: Some(true),
                    tool_use,
                    tool_result_json: result,
                    claude_final: vec![json!({ "type": "text", "text": MOCK_FINAL_TEXT })],
                })
            }
            AgentBackend::Live(client) => {
                let prompt = user_prompt(&raw)?;
                let first = client
                    .send_turn(&self.request(
                        Some(ToolChoice::tool(ToolName::AnalyzeRawAudioSignal)),
                        vec![prompt.clone()],
                    ))
                    .await
                    .map_err(AnalyzeError::Agent)?;
                let block =
                    first.first_tool_use().ok_or_else(|| AnalyzeError::ProtocolNonCompliance {
                        content: first.content.clone(),
                    })?;
                let tool_use = validate_tool_use(block).map_err(AnalyzeError::boundary)?;
                trace.tool_use_id = Some(tool_use.id.clone());
                let (result, envelope) = analyze_invocation(&tool_use, received_at_ms)?;

                let conversation = vec![
                    prompt,
                    AgentMessage {
                        role: AgentRole::Assistant,
                        content: first.content,
                    },
                    AgentMessage {
                        role: AgentRole::User,
                        content: vec![envelope],
                    },
                ];
                let second = client
                    .send_turn(&self.request(None, conversation))
                    .await
                    .map_err(AnalyzeError::Agent)?;
                Ok(AnalyzeResponse {
                    mock: None,
                    tool_use,
                    tool_result_json: result,
                    claude_final: second.content,
                })
            }
        }
    }

    /// Builds one agent request over the given conversation.
    fn request(&self, tool_choice: Option<ToolChoice>, messages: Vec<AgentMessage>) -> AgentRequest {
        AgentRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            tools: self.tools.clone(),
            tool_choice,
            messages,
        }
    }
}

// ============================================================================
// SECTION: Analysis Step
// ============================================================================

/// Runs the analysis for a validated invocation and validates the output.
///
/// Returns the result and its serialized `tool_result` envelope.
fn analyze_invocation(
    tool_use: &ToolUseEnvelope,
    received_at_ms: u64,
) -> Result<(AnalysisResult, Value), AnalyzeError> {
    let result = run_audio_analysis(&tool_use.input, received_at_ms);
    let envelope = ToolResultEnvelope::single(tool_use.id.clone(), result.clone());
    let envelope = serde_json::to_value(&envelope)
        .map_err(|err| AnalyzeError::Internal(format!("tool_result serialization failed: {err}")))?;
    validate_tool_result_envelope(&envelope).map_err(AnalyzeError::Output)?;
    check_mode_coupling(&tool_use.input, &result).map_err(AnalyzeError::Output)?;
    Ok((result, envelope))
}

/// Builds the user turn asking the agent to call the tool with `raw`.
fn user_prompt(raw: &Value) -> Result<AgentMessage, AnalyzeError> {
    let compact = serde_json::to_string(raw)
        .map_err(|err| AnalyzeError::Internal(format!("input serialization failed: {err}")))?;
    Ok(AgentMessage::user_text(format!("{TOOL_CALL_PROMPT}{compact}")))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures of `POST /analyze`, each mapped once to an HTTP response.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Body is not JSON.
    #[error("invalid json body: {0}")]
    InvalidJson(String),
    /// Body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
    /// Input or invocation violates the contract.
    #[error("{0}")]
    Schema(GatewayError),
    /// Agent answered without a `tool_use` block.
    #[error("agent did not emit tool_use")]
    ProtocolNonCompliance {
        /// Raw agent content blocks.
        content: Vec<Value>,
    },
    /// Produced result violates the contract.
    #[error("analysis output rejected: {0}")]
    Output(GatewayError),
    /// Agent call failed.
    #[error("{0}")]
    Agent(AgentError),
    /// Any other runtime failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyzeError {
    /// Classifies a gateway failure on the request boundary.
    ///
    /// Violations are the caller's fault; a schema that fails to compile is
    /// a server defect.
    #[must_use]
    pub fn boundary(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidSchema(message) => {
                Self::Internal(format!("contract schema unavailable: {message}"))
            }
            violation @ GatewayError::SchemaViolation { .. } => Self::Schema(violation),
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::Schema(_) | Self::ProtocolNonCompliance { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Output(_) | Self::Agent(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a normalized label for audit and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Schema(_) => "schema_violation",
            Self::ProtocolNonCompliance { .. } => "protocol_non_compliance",
            Self::Output(_) => "output_violation",
            Self::Agent(_) => "agent_error",
            Self::Internal(_) => "internal",
        }
    }

    /// Converts the error into its response body.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let violations = match self {
            Self::Schema(err) | Self::Output(err) if !err.violations().is_empty() => {
                Some(err.violations().to_vec())
            }
            _ => None,
        };
        let content = match self {
            Self::ProtocolNonCompliance {
                content,
            } => Some(content.clone()),
            _ => None,
        };
        ErrorBody {
            error: self.to_string(),
            content,
            violations,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
