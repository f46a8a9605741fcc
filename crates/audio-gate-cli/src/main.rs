// crates/audio-gate-cli/src/main.rs
// ============================================================================
// Module: Audio Gate CLI Entry Point
// Description: Command dispatcher for the Audio Gate gateway.
// Purpose: Serve `/analyze`, validate payloads offline, export the tool definition.
// Dependencies: clap, dotenvy, audio-gate-{config,contract,server}, tokio
// ============================================================================

//! ## Overview
//! `audio-gate serve` runs the HTTP gateway, `audio-gate validate` checks a
//! JSON payload against one contract entity, and `audio-gate tool-definition`
//! prints the tool definition registered with the agent. A `.env` file in the
//! working directory is loaded before the environment is read. Operator
//! messages go to stderr; command results go to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use audio_gate_config::DEFAULT_MAX_BODY_BYTES;
use audio_gate_config::GatewayConfig;
use audio_gate_config::MOCK_MODE_ENV_VAR;
use audio_gate_contract::GatewayError;
use audio_gate_contract::SchemaViolation;
use audio_gate_contract::tool_definition;
use audio_gate_contract::validate_input;
use audio_gate_contract::validate_result;
use audio_gate_contract::validate_tool_result_envelope;
use audio_gate_contract::validate_tool_use;
use audio_gate_server::AnalyzeServer;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Arguments
// ============================================================================

/// Audio Gate command-line interface.
#[derive(Parser, Debug)]
#[command(name = "audio-gate", version, about = "Audio analysis tool-call gateway")]
struct Cli {
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the `/analyze` HTTP gateway.
    Serve(ServeCommand),
    /// Validate a JSON payload against a contract entity.
    Validate(ValidateCommand),
    /// Print the tool definition registered with the agent.
    ToolDefinition,
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to audio-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Synthesize tool invocations locally instead of calling the agent.
    #[arg(long)]
    mock: bool,
}

/// Configuration for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Entity to validate against.
    #[arg(long, value_enum)]
    kind: EntityKind,
    /// JSON file to validate (reads stdin when omitted).
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

/// Contract entities accepted by `validate`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EntityKind {
    /// `AnalysisInput`.
    Input,
    /// `AnalysisResult`.
    Result,
    /// `tool_use` envelope.
    ToolUse,
    /// `tool_result` envelope.
    ToolResult,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Validate(command) => command_validate(&command),
        Commands::ToolDefinition => command_tool_definition(),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = GatewayConfig::load_with_env(command.config.as_deref(), |key| {
        env_lookup(key, command.mock, |name| std::env::var(name).ok())
    })
    .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = AnalyzeServer::from_config(&config)
        .map_err(|err| CliError::new(format!("failed to initialize server: {err}")))?;

    write_stderr_line(&listening_banner(&server))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    if let Some(path) = &config.source_path {
        write_stderr_line(&format!("audio-gate: config loaded from {}", path.display()))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves an environment variable, forcing mock mode when requested.
fn env_lookup<F>(key: &str, force_mock: bool, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if force_mock && key == MOCK_MODE_ENV_VAR {
        return Some("true".to_string());
    }
    lookup(key)
}

/// Formats the startup message for the bound address and mode.
fn listening_banner(server: &AnalyzeServer) -> String {
    let suffix = if server.mode_label() == "mock" { " (MOCK MODE)" } else { "" };
    format!("audio-gate: server running at http://{}/analyze{suffix}", server.bind_addr())
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Result of validating one payload.
#[derive(Debug, PartialEq)]
enum ValidationOutcome {
    /// Payload conforms; carries the typed entity re-serialized.
    Valid(Value),
    /// Payload violates the schema.
    Invalid(Vec<SchemaViolation>),
}

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let bytes = match &command.file {
        Some(path) => read_bytes_with_limit(path, DEFAULT_MAX_BODY_BYTES),
        None => read_stdin_with_limit(DEFAULT_MAX_BODY_BYTES),
    }
    .map_err(|err| CliError::new(err.to_string()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("input is not valid json: {err}")))?;

    match validate_payload(command.kind, &value)? {
        ValidationOutcome::Valid(entity) => {
            let rendered = serde_json::to_string_pretty(&entity)
                .map_err(|err| CliError::new(format!("failed to render entity: {err}")))?;
            write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ValidationOutcome::Invalid(violations) => {
            for violation in &violations {
                write_stderr_line(&format!("{violation} (expected {})", violation.expected))
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Validates `value` as the entity named by `kind`.
fn validate_payload(kind: EntityKind, value: &Value) -> CliResult<ValidationOutcome> {
    let typed = match kind {
        EntityKind::Input => validate_input(value).and_then(|entity| to_value(&entity)),
        EntityKind::Result => validate_result(value).and_then(|entity| to_value(&entity)),
        EntityKind::ToolUse => validate_tool_use(value).and_then(|entity| to_value(&entity)),
        EntityKind::ToolResult => {
            validate_tool_result_envelope(value).and_then(|entity| to_value(&entity))
        }
    };
    match typed {
        Ok(entity) => Ok(ValidationOutcome::Valid(entity)),
        Err(GatewayError::SchemaViolation {
            violations, ..
        }) => Ok(ValidationOutcome::Invalid(violations)),
        Err(err @ GatewayError::InvalidSchema(_)) => Err(CliError::new(err.to_string())),
    }
}

/// Re-serializes a typed entity.
fn to_value<T: serde::Serialize>(entity: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(entity).map_err(|err| GatewayError::InvalidSchema(err.to_string()))
}

// ============================================================================
// SECTION: Tool Definition Command
// ============================================================================

/// Executes the `tool-definition` command.
fn command_tool_definition() -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(&tool_definition())
        .map_err(|err| CliError::new(format!("failed to render tool definition: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

/// Errors returned by bounded reads.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// I/O failure.
    #[error("failed to read input: {0}")]
    Io(std::io::Error),
    /// Input exceeds the configured limit.
    #[error("input size {size} exceeds limit {limit}")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    read_to_limit(file, max_bytes)
}

/// Reads stdin while enforcing a hard size limit.
fn read_stdin_with_limit(max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    read_to_limit(std::io::stdin().lock(), max_bytes)
}

/// Reads at most `max_bytes + 1` bytes and fails when the limit is exceeded.
fn read_to_limit<R: Read>(reader: R, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let read_limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    reader.take(read_limit).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
