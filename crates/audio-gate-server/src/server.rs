// crates/audio-gate-server/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: axum transport for `POST /analyze`.
// Purpose: Bind, enforce the body limit, and map handler outcomes to HTTP.
// Dependencies: axum, tokio, serde_json
// ============================================================================

//! ## Overview
//! [`AnalyzeServer`] owns the immutable handler state and exposes a single
//! route, `POST /analyze`. Every outcome is converted once into a JSON
//! response here, and every request emits one audit event and one metric
//! observation. Security posture: request bodies are untrusted and bounded by
//! `server.max_body_bytes`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use audio_gate_config::GatewayConfig;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::analyze::AnalyzeError;
use crate::analyze::AnalyzeExchange;
use crate::analyze::AnalyzeService;
use crate::analyze::AnalyzeTrace;
use crate::audit::AnalyzeAuditEvent;
use crate::audit::AnalyzeAuditEventParams;
use crate::audit::AuditSink;
use crate::audit::audit_sink_from_config;
use crate::telemetry::AnalyzeMetricEvent;
use crate::telemetry::AnalyzeOutcome;
use crate::telemetry::GatewayMetrics;
use crate::telemetry::NoopMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Route served by the gateway.
pub const ANALYZE_ROUTE: &str = "/analyze";
/// Body returned when an error body itself cannot be serialized.
const FALLBACK_ERROR_BODY: &[u8] = br#"{"error":"internal error"}"#;

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server for the analysis gateway.
pub struct AnalyzeServer {
    /// Address to bind when serving from configuration.
    bind_addr: SocketAddr,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl AnalyzeServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the agent
    /// client or audit sink cannot be initialized.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind_addr =
            config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let service =
            AnalyzeService::from_config(config).map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = audit_sink_from_config(&config.server.audit)
            .map_err(|err| ServerError::Init(format!("audit sink: {err}")))?;
        Ok(Self::new(bind_addr, service, audit, Arc::new(NoopMetrics), config.server.max_body_bytes))
    }

    /// Builds a server from explicit parts.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        service: AnalyzeService,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn GatewayMetrics>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            bind_addr,
            state: Arc::new(ServerState {
                service,
                audit,
                metrics,
                max_body_bytes,
            }),
        }
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Returns the stable agent mode label.
    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        self.state.service.mode_label()
    }

    /// Returns the axum router serving [`ANALYZE_ROUTE`].
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route(ANALYZE_ROUTE, post(handle_analyze))
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Resolves on ctrl-c.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Shared server state for the HTTP handler.
struct ServerState {
    /// Request state machine.
    service: AnalyzeService,
    /// Audit sink for request events.
    audit: Arc<dyn AuditSink>,
    /// Metrics sink for request events.
    metrics: Arc<dyn GatewayMetrics>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Handles `POST /analyze`.
async fn handle_analyze(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    let (exchange, request_bytes) = match body {
        Ok(bytes) if bytes.len() > state.max_body_bytes => (
            rejected(AnalyzeError::PayloadTooLarge {
                limit: state.max_body_bytes,
            }),
            bytes.len(),
        ),
        Ok(bytes) => (state.service.handle(&bytes).await, bytes.len()),
        Err(rejection) => (rejected(rejection_error(&rejection, state.max_body_bytes)), 0),
    };

    let (status, payload) = render(&exchange);
    record(&state, &exchange, status, request_bytes, payload.len(), started);
    (status, [(CONTENT_TYPE, "application/json")], payload).into_response()
}

/// Wraps an error raised before the state machine ran.
fn rejected(error: AnalyzeError) -> AnalyzeExchange {
    AnalyzeExchange {
        trace: AnalyzeTrace::default(),
        result: Err(error),
    }
}

/// Maps a body extraction failure to a handler error.
fn rejection_error(rejection: &BytesRejection, limit: usize) -> AnalyzeError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AnalyzeError::PayloadTooLarge {
            limit,
        }
    } else {
        AnalyzeError::InvalidJson(rejection.body_text())
    }
}

/// Serializes the outcome into a status and JSON body.
fn render(exchange: &AnalyzeExchange) -> (StatusCode, Vec<u8>) {
    let rendered = match &exchange.result {
        Ok(response) => serde_json::to_vec(response).map(|body| (StatusCode::OK, body)),
        Err(err) => serde_json::to_vec(&err.to_body()).map(|body| (err.status(), body)),
    };
    rendered
        .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_ERROR_BODY.to_vec()))
}

/// Emits the audit event and metric observations for one request.
fn record(
    state: &ServerState,
    exchange: &AnalyzeExchange,
    status: StatusCode,
    request_bytes: usize,
    response_bytes: usize,
    started: Instant,
) {
    let elapsed = started.elapsed();
    let (outcome, error_kind) = match &exchange.result {
        Ok(_) if status.is_success() => (AnalyzeOutcome::Ok, None),
        Ok(_) => (AnalyzeOutcome::Error, Some("internal")),
        Err(err) => (AnalyzeOutcome::Error, Some(err.kind())),
    };
    let mode = state.service.mode_label();
    let trace = &exchange.trace;
    state.audit.record(&AnalyzeAuditEvent::new(AnalyzeAuditEventParams {
        mode,
        outcome,
        status: status.as_u16(),
        error_kind,
        session_id: trace.session_id.as_ref().map(ToString::to_string),
        chunk_id: trace.chunk_id,
        tool_use_id: trace.tool_use_id.as_ref().map(ToString::to_string),
        request_bytes,
        response_bytes,
        latency_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }));
    let metric = AnalyzeMetricEvent {
        mode,
        outcome,
        status: status.as_u16(),
        error_kind,
        request_bytes,
        response_bytes,
    };
    state.metrics.record_request(metric.clone());
    state.metrics.record_latency(metric, elapsed);
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
