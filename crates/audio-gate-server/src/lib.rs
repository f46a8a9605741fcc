// crates/audio-gate-server/src/lib.rs
// ============================================================================
// Module: Audio Gate Server Library
// Description: HTTP gateway for the `analyze_raw_audio_signal` tool call.
// Purpose: Expose the request handler, agent client, and axum transport.
// Dependencies: audio-gate-{core,contract,config}, axum, reqwest, tokio
// ============================================================================

//! ## Overview
//! The server crate wires the contract gateway into `POST /analyze`. The
//! [`analyze`] module holds the request state machine, [`agent`] the external
//! tool-calling capability, and [`server`] the axum transport. Audit and
//! telemetry hooks record request metadata without payloads.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod agent;
pub mod analyze;
pub mod audit;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use agent::AgentClient;
pub use agent::AgentError;
pub use agent::AgentMessage;
pub use agent::AgentRequest;
pub use agent::AgentResponse;
pub use agent::AgentRole;
pub use agent::AnthropicClient;
pub use agent::ToolChoice;
pub use analyze::AgentBackend;
pub use analyze::AnalyzeError;
pub use analyze::AnalyzeExchange;
pub use analyze::AnalyzeResponse;
pub use analyze::AnalyzeService;
pub use analyze::Clock;
pub use audit::AnalyzeAuditEvent;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use server::ANALYZE_ROUTE;
pub use server::AnalyzeServer;
pub use server::ServerError;
pub use telemetry::GatewayMetrics;
pub use telemetry::NoopMetrics;
