// crates/audio-gate-contract/src/gateway.rs
// ============================================================================
// Module: Validation Gateway
// Description: Schema validation of untyped JSON into typed contract entities.
// Purpose: Fail fast with field-level diagnostics at every protocol boundary.
// Dependencies: audio-gate-core, jsonschema, serde, serde_json
// ============================================================================

//! ## Overview
//! Each `validate_*` function checks an arbitrary JSON value against the
//! matching closed schema from [`crate::schemas`] and, on success, returns
//! the typed entity. On failure it reports **every** failing field as a
//! [`SchemaViolation`] (JSON Pointer path, violated keyword and constraint,
//! offending fragment). The functions are pure; compiled validators are
//! built once per process and shared.
//!
//! [`check_mode_coupling`] covers what the schemas deliberately leave open:
//! the result carries exactly the payload for the requested mode, and a
//! final summary exactly when the chunk was final.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::OnceLock;

use audio_gate_core::AnalysisInput;
use audio_gate_core::AnalysisMode;
use audio_gate_core::AnalysisResult;
use audio_gate_core::ToolResultEnvelope;
use audio_gate_core::ToolUseEnvelope;
use jsonschema::Draft;
use jsonschema::ValidationError;
use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::schemas;

// ============================================================================
// SECTION: Entities
// ============================================================================

/// Contract entities guarded by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractEntity {
    /// Tool input descriptor.
    AnalysisInput,
    /// Tool output payload.
    AnalysisResult,
    /// `tool_use` envelope.
    ToolUse,
    /// `tool_result` envelope.
    ToolResultEnvelope,
}

impl ContractEntity {
    /// Returns the stable entity label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnalysisInput => "analysis_input",
            Self::AnalysisResult => "analysis_result",
            Self::ToolUse => "tool_use",
            Self::ToolResultEnvelope => "tool_result_envelope",
        }
    }

    /// Returns the JSON schema guarding this entity.
    #[must_use]
    pub fn schema(self) -> Value {
        match self {
            Self::AnalysisInput => schemas::analysis_input_schema(),
            Self::AnalysisResult => schemas::analysis_result_schema(),
            Self::ToolUse => schemas::tool_use_schema(),
            Self::ToolResultEnvelope => schemas::tool_result_envelope_schema(),
        }
    }
}

impl fmt::Display for ContractEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON Pointer into the validated instance (`""` is the root).
    pub path: String,
    /// Violated keyword and its constraint, e.g. `maximum: 2`.
    pub expected: String,
    /// Offending JSON fragment; absent when the field is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        write!(f, "{path}: {}", self.message)
    }
}

/// Errors raised by the validation gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The value does not conform to the entity schema.
    #[error("{entity} failed schema validation: {}", summarize(.violations))]
    SchemaViolation {
        /// Entity that was being validated.
        entity: ContractEntity,
        /// Every failing field, ordered by path.
        violations: Vec<SchemaViolation>,
    },
    /// A contract schema failed to compile.
    #[error("contract schema failed to compile: {0}")]
    InvalidSchema(String),
}

impl GatewayError {
    /// Returns the field-level violations, if any.
    #[must_use]
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            Self::SchemaViolation {
                violations, ..
            } => violations,
            Self::InvalidSchema(_) => &[],
        }
    }
}

/// Joins violations into a one-line summary.
fn summarize(violations: &[SchemaViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Validation Entrypoints
// ============================================================================

/// Validates an untyped value as an [`AnalysisInput`].
///
/// # Errors
///
/// Returns [`GatewayError::SchemaViolation`] listing every failing field.
pub fn validate_input(value: &Value) -> Result<AnalysisInput, GatewayError> {
    validate_entity(ContractEntity::AnalysisInput, value)
}

/// Validates an untyped value as an [`AnalysisResult`].
///
/// # Errors
///
/// Returns [`GatewayError::SchemaViolation`] listing every failing field.
pub fn validate_result(value: &Value) -> Result<AnalysisResult, GatewayError> {
    validate_entity(ContractEntity::AnalysisResult, value)
}

/// Validates an untyped value as a `tool_use` envelope.
///
/// The `type` and `name` discriminators must be the exact literals
/// `"tool_use"` and `"analyze_raw_audio_signal"`.
///
/// # Errors
///
/// Returns [`GatewayError::SchemaViolation`] listing every failing field.
pub fn validate_tool_use(value: &Value) -> Result<ToolUseEnvelope, GatewayError> {
    validate_entity(ContractEntity::ToolUse, value)
}

/// Validates an untyped value as a `tool_result` envelope.
///
/// `content` must be a non-empty array of `{type: "json", json}` items.
///
/// # Errors
///
/// Returns [`GatewayError::SchemaViolation`] listing every failing field.
pub fn validate_tool_result_envelope(value: &Value) -> Result<ToolResultEnvelope, GatewayError> {
    validate_entity(ContractEntity::ToolResultEnvelope, value)
}

/// Checks that a result matches the mode and finality of its input.
///
/// Exactly the payload named by `input.analysis_mode` is present, the other
/// three are absent, `final_summary` is present iff `input.final_chunk`, and
/// the session and chunk identifiers are echoed.
///
/// # Errors
///
/// Returns [`GatewayError::SchemaViolation`] against
/// [`ContractEntity::AnalysisResult`] listing every mismatch.
pub fn check_mode_coupling(
    input: &AnalysisInput,
    result: &AnalysisResult,
) -> Result<(), GatewayError> {
    let mut violations = Vec::new();

    if result.session_id != input.session_id {
        violations.push(SchemaViolation {
            path: String::from("/session_id"),
            expected: format!("const: {:?}", input.session_id.as_str()),
            actual: Some(Value::from(result.session_id.as_str())),
            message: String::from("result does not echo the input session_id"),
        });
    }
    if result.chunk_id != input.chunk_id {
        violations.push(SchemaViolation {
            path: String::from("/chunk_id"),
            expected: format!("const: {}", input.chunk_id),
            actual: Some(Value::from(result.chunk_id)),
            message: String::from("result does not echo the input chunk_id"),
        });
    }

    let populated = result.populated_modes();
    for mode in AnalysisMode::all() {
        let present = populated.contains(mode);
        let wanted = *mode == input.analysis_mode;
        if present == wanted {
            continue;
        }
        let path = format!("/{}", mode.as_str());
        if wanted {
            violations.push(SchemaViolation {
                path,
                expected: format!("required: analysis_mode is {}", input.analysis_mode.as_str()),
                actual: None,
                message: format!("{} payload is missing", mode.as_str()),
            });
        } else {
            violations.push(SchemaViolation {
                path,
                expected: format!("absent: analysis_mode is {}", input.analysis_mode.as_str()),
                actual: mode_payload(result, *mode),
                message: format!(
                    "{} payload is not allowed for analysis_mode {}",
                    mode.as_str(),
                    input.analysis_mode.as_str()
                ),
            });
        }
    }

    match (&result.final_summary, input.final_chunk) {
        (None, true) => violations.push(SchemaViolation {
            path: String::from("/final_summary"),
            expected: String::from("required: final_chunk is true"),
            actual: None,
            message: String::from("final_summary is missing for the final chunk"),
        }),
        (Some(summary), false) => violations.push(SchemaViolation {
            path: String::from("/final_summary"),
            expected: String::from("absent: final_chunk is false"),
            actual: serde_json::to_value(summary).ok(),
            message: String::from("final_summary is only allowed on the final chunk"),
        }),
        _ => {}
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::SchemaViolation {
            entity: ContractEntity::AnalysisResult,
            violations,
        })
    }
}

/// Returns the serialized payload for a mode, if populated.
fn mode_payload(result: &AnalysisResult, mode: AnalysisMode) -> Option<Value> {
    let payload = match mode {
        AnalysisMode::EmotionTone => serde_json::to_value(result.emotion_tone.as_ref()?),
        AnalysisMode::HardwareAcoustics => {
            serde_json::to_value(result.hardware_acoustics.as_ref()?)
        }
        AnalysisMode::AnomalyDetection => serde_json::to_value(result.anomaly_detection.as_ref()?),
        AnalysisMode::CodeIntent => serde_json::to_value(result.code_intent.as_ref()?),
    };
    payload.ok()
}

// ============================================================================
// SECTION: Compiled Validators
// ============================================================================

/// Schema document paired with its compiled validator.
struct CompiledSchema {
    /// Source schema, used to resolve constraint values for diagnostics.
    schema: Value,
    /// Compiled validator.
    validator: Validator,
}

/// Process-wide compiled input schema.
static INPUT_SCHEMA: OnceLock<Result<CompiledSchema, String>> = OnceLock::new();
/// Process-wide compiled result schema.
static RESULT_SCHEMA: OnceLock<Result<CompiledSchema, String>> = OnceLock::new();
/// Process-wide compiled `tool_use` schema.
static TOOL_USE_SCHEMA: OnceLock<Result<CompiledSchema, String>> = OnceLock::new();
/// Process-wide compiled `tool_result` schema.
static TOOL_RESULT_SCHEMA: OnceLock<Result<CompiledSchema, String>> = OnceLock::new();

/// Returns the compiled schema for an entity, compiling it on first use.
fn compiled(entity: ContractEntity) -> Result<&'static CompiledSchema, GatewayError> {
    let cell = match entity {
        ContractEntity::AnalysisInput => &INPUT_SCHEMA,
        ContractEntity::AnalysisResult => &RESULT_SCHEMA,
        ContractEntity::ToolUse => &TOOL_USE_SCHEMA,
        ContractEntity::ToolResultEnvelope => &TOOL_RESULT_SCHEMA,
    };
    cell.get_or_init(|| compile(entity.schema()))
        .as_ref()
        .map_err(|err| GatewayError::InvalidSchema(format!("{entity}: {err}")))
}

/// Compiles a draft 2020-12 schema.
fn compile(schema: Value) -> Result<CompiledSchema, String> {
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| err.to_string())?;
    Ok(CompiledSchema {
        schema,
        validator,
    })
}

// ============================================================================
// SECTION: Validation Core
// ============================================================================

/// Validates a value against an entity schema and deserializes it.
fn validate_entity<T: DeserializeOwned>(
    entity: ContractEntity,
    value: &Value,
) -> Result<T, GatewayError> {
    let compiled = compiled(entity)?;
    let mut violations: Vec<SchemaViolation> = compiled
        .validator
        .iter_errors(value)
        .flat_map(|error| describe(&compiled.schema, &error))
        .collect();
    if !violations.is_empty() {
        violations.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
        return Err(GatewayError::SchemaViolation {
            entity,
            violations,
        });
    }
    let mut normalized = value.clone();
    normalize_integral_floats(&mut normalized);
    T::deserialize(normalized).map_err(|err| GatewayError::SchemaViolation {
        entity,
        violations: vec![SchemaViolation {
            path: String::new(),
            expected: format!("deserialize: {entity}"),
            actual: None,
            message: err.to_string(),
        }],
    })
}

/// Exclusive upper bound of integral floats that convert to `u64`.
const U64_FLOAT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Rewrites non-negative integral floats (`1.0`) as integers.
///
/// JSON Schema `integer` accepts `1.0`; typed `u64` fields do not.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Only finite, non-negative, integral floats below 2^64 are cast."
)]
fn normalize_integral_floats(value: &mut Value) {
    match value {
        Value::Number(number) if number.is_f64() => {
            if let Some(float) = number.as_f64()
                && (0.0..U64_FLOAT_LIMIT).contains(&float)
                && float.fract() == 0.0
            {
                *number = Number::from(float as u64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_integral_floats),
        Value::Object(fields) => fields.values_mut().for_each(normalize_integral_floats),
        _ => {}
    }
}

/// Converts a validator error into one or more field violations.
///
/// Missing and unexpected properties are reported at the property path
/// rather than at the enclosing object.
fn describe(schema: &Value, error: &ValidationError<'_>) -> Vec<SchemaViolation> {
    let instance_path = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().unwrap_or_default().to_string();
    match &error.kind {
        ValidationErrorKind::Required {
            property,
        } => {
            let name = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            vec![SchemaViolation {
                path: child_path(&instance_path, &name),
                expected: format!("required: {name}"),
                actual: None,
                message: format!("missing required property {name:?}"),
            }]
        }
        ValidationErrorKind::AdditionalProperties {
            unexpected,
        } => unexpected
            .iter()
            .map(|name| SchemaViolation {
                path: child_path(&instance_path, name),
                expected: String::from("additionalProperties: false"),
                actual: error.instance.get(name).cloned(),
                message: format!("unknown property {name:?}"),
            })
            .collect(),
        _ => {
            let constraint = schema.pointer(&schema_path).map_or_else(String::new, Value::to_string);
            let expected =
                if constraint.is_empty() { keyword } else { format!("{keyword}: {constraint}") };
            vec![SchemaViolation {
                path: instance_path,
                expected,
                actual: Some(error.instance.clone().into_owned()),
                message: error.to_string(),
            }]
        }
    }
}

/// Appends an escaped property name to a JSON Pointer.
fn child_path(parent: &str, name: &str) -> String {
    let escaped = name.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
