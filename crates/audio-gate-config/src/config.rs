// crates/audio-gate-config/src/config.rs
// ============================================================================
// Module: Audio Gate Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Resolution order: an explicit path, then `AUDIO_GATE_CONFIG`, then
//! `audio-gate.toml` in the working directory if it exists, then built-in
//! defaults. An explicitly named file must exist. Environment overrides are
//! applied after the file and before validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::Read;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename probed in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "audio-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "AUDIO_GATE_CONFIG";
/// Environment variable selecting mock mode when set to `"true"`.
pub const MOCK_MODE_ENV_VAR: &str = "MOCK_MODE";
/// Environment variable carrying the agent API key.
pub const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";
/// Environment variable overriding the listen port.
pub const PORT_ENV_VAR: &str = "PORT";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
/// Default Messages API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
/// Default response token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 500;
/// Default `anthropic-version` header value.
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Audio Gate configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// External agent configuration.
    #[serde(default)]
    pub agent: AgentConfig,
    /// File the configuration was read from, if any (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration using the provided environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::read_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed or has
    /// unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a config file with size and encoding limits.
    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = read_bounded(path, MAX_CONFIG_FILE_SIZE)?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Applies `MOCK_MODE`, `ANTHROPIC_API_KEY`, and `PORT` overrides.
    ///
    /// `MOCK_MODE` selects mock mode only for the exact value `"true"`; any
    /// other value selects live mode. An empty API key is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `PORT` is not a valid port.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(MOCK_MODE_ENV_VAR) {
            self.agent.mode = if value == "true" { AgentMode::Mock } else { AgentMode::Live };
        }
        if let Some(key) = lookup(API_KEY_ENV_VAR).filter(|key| !key.trim().is_empty()) {
            self.agent.api_key = Some(key);
        }
        if let Some(port) = lookup(PORT_ENV_VAR) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{PORT_ENV_VAR} must be a port number")))?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.agent.validate()
    }

    /// Returns true when the agent is simulated locally.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.agent.mode == AgentMode::Mock
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates listen and limit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port must be greater than zero".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        self.audit.validate()
    }

    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.host must be an ip address".to_string()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines). Stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// How tool invocations are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Call the external Messages API.
    #[default]
    Live,
    /// Synthesize tool invocations locally.
    Mock,
}

impl AgentMode {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

/// External agent configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Live or mock mode.
    #[serde(default)]
    pub mode: AgentMode,
    /// API key; usually supplied through the environment.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Messages API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Response token budget per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// `anthropic-version` header value.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
    /// Optional per-call timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: DEFAULT_MAX_TOKENS,
            anthropic_version: default_anthropic_version(),
            timeout_ms: None,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("mode", &self.mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("anthropic_version", &self.anthropic_version)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl AgentConfig {
    /// Validates agent settings. Live mode requires an API key.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("agent.max_tokens must be greater than zero".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("agent.timeout_ms must be greater than zero".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.model must be non-empty".to_string()));
        }
        if self.anthropic_version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "agent.anthropic_version must be non-empty".to_string(),
            ));
        }
        let base = self.base_url.trim();
        let has_scheme = base.starts_with("https://") || base.starts_with("http://");
        if !has_scheme || base.len() <= "https://".len() {
            return Err(ConfigError::Invalid(
                "agent.base_url must be an http(s) url".to_string(),
            ));
        }
        if self.mode == AgentMode::Live
            && self.api_key.as_deref().is_none_or(|key| key.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "live mode requires an api key ({API_KEY_ENV_VAR} or agent.api_key); set \
                 {MOCK_MODE_ENV_VAR}=true to run without one"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves which config file to read, if any.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.trim().is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Reads at most `limit` bytes, failing once the file grows past it.
fn read_bounded(path: &Path, limit: usize) -> Result<Vec<u8>, ConfigError> {
    let io_error = |err: io::Error| ConfigError::Io(format!("{}: {err}", path.display()));
    let file = File::open(path).map_err(io_error)?;
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    file.take(cap).read_to_end(&mut bytes).map_err(io_error)?;
    if bytes.len() > limit {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    Ok(bytes)
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against emptiness and length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_path(Path::new(trimmed))
        .map_err(|_| ConfigError::Invalid(format!("{field} exceeds path length limits")))
}

/// Default listen host.
fn default_host() -> String {
    String::from("0.0.0.0")
}

/// Default listen port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit logging is on by default.
const fn default_audit_enabled() -> bool {
    true
}

/// Default Messages API base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default model identifier.
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Default response token budget.
const fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Default `anthropic-version` header value.
fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}
