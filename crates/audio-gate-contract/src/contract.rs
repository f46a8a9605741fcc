// crates/audio-gate-contract/src/contract.rs
// ============================================================================
// Module: Contract Builder
// Description: Generator for Audio Gate contract artifacts.
// Purpose: Assemble deterministic contract outputs and write or verify them.
// Dependencies: audio-gate-core, serde, serde_json, std
// ============================================================================

//! ## Overview
//! The contract builder renders the tool definition, the four entity
//! schemas, and example payloads into a bundle with a hashed `index.json`
//! manifest. Output is deterministic: artifacts are sorted by path and JSON
//! is pretty-printed with canonical key ordering, so `check` can compare a
//! checked-in bundle byte for byte.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use audio_gate_core::hashing::DEFAULT_HASH_ALGORITHM;
use audio_gate_core::hashing::HashAlgorithm;
use audio_gate_core::hashing::canonical_json_bytes;
use audio_gate_core::hashing::hash_bytes;
use serde::Serialize;

use crate::ContractError;
use crate::examples;
use crate::schemas;
use crate::tooling;
use crate::types::ArtifactFormat;
use crate::types::ContractArtifact;
use crate::types::ContractBundle;
use crate::types::ContractManifest;
use crate::types::ManifestArtifact;

/// File name of the bundle manifest.
pub const MANIFEST_FILE: &str = "index.json";

// ============================================================================
// SECTION: Contract Builder
// ============================================================================

/// Builder for Audio Gate contract artifacts.
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    /// Output directory for generated artifacts.
    output_dir: PathBuf,
    /// Contract version identifier.
    contract_version: String,
    /// Hash algorithm used for artifact digests.
    hash_algorithm: HashAlgorithm,
}

impl ContractBuilder {
    /// Creates a new contract builder targeting the provided output directory.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            contract_version: env!("CARGO_PKG_VERSION").to_string(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }

    /// Returns the default output directory for generated artifacts.
    #[must_use]
    pub fn default_output_dir() -> PathBuf {
        PathBuf::from("Docs/generated/audio-gate")
    }

    /// Returns the configured output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Builds the contract bundle without writing to disk.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when serialization fails or paths collide.
    pub fn build(&self) -> Result<ContractBundle, ContractError> {
        let tool_contracts = tooling::tool_contracts();
        let mut artifacts = vec![
            json_artifact("tool_definition.json", &tooling::tool_definition())?,
            json_artifact("tooling.json", &tool_contracts)?,
            markdown_artifact("tooling.md", tooling::tooling_markdown(&tool_contracts)),
            json_artifact("examples/analysis_input.json", &examples::input_example())?,
            json_artifact("examples/analysis_result.json", &examples::result_example())?,
            json_artifact("examples/tool_use.json", &examples::tool_use_example())?,
            json_artifact("examples/tool_result.json", &examples::tool_result_example())?,
        ];
        for (name, schema) in schemas::all_schemas() {
            artifacts.push(json_artifact(&format!("schemas/{name}.schema.json"), &schema)?);
        }

        artifacts.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
        ensure_unique_paths(&artifacts)?;

        let manifest = build_manifest(&self.contract_version, self.hash_algorithm, &artifacts);

        Ok(ContractBundle {
            manifest,
            artifacts,
        })
    }

    /// Writes the contract bundle to the configured output directory.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when writing fails.
    pub fn write(&self) -> Result<ContractManifest, ContractError> {
        self.write_to(&self.output_dir)
    }

    /// Writes the contract bundle to the specified output directory.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when writing fails.
    pub fn write_to(&self, output_dir: &Path) -> Result<ContractManifest, ContractError> {
        let bundle = self.build()?;
        ensure_output_dir(output_dir)?;
        for artifact in &bundle.artifacts {
            write_artifact(output_dir, artifact)?;
        }
        let manifest_bytes = serialize_json_pretty(&bundle.manifest)?;
        fs::write(output_dir.join(MANIFEST_FILE), &manifest_bytes)
            .map_err(|err| ContractError::Io(err.to_string()))?;
        Ok(bundle.manifest)
    }

    /// Verifies the on-disk contract bundle matches the generated bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::OutputPath`] when `output_dir` is not a
    /// directory, or [`ContractError::Generation`] listing every artifact
    /// that differs, is missing, or is unexpected.
    pub fn verify_output(&self, output_dir: &Path) -> Result<(), ContractError> {
        if !output_dir.is_dir() {
            return Err(ContractError::OutputPath(output_dir.to_path_buf()));
        }
        let bundle = self.build()?;
        let mut expected: BTreeMap<String, Vec<u8>> = bundle
            .artifacts
            .into_iter()
            .map(|artifact| (artifact.path, artifact.bytes))
            .collect();
        expected.insert(String::from(MANIFEST_FILE), serialize_json_pretty(&bundle.manifest)?);

        let on_disk = list_files(output_dir)?;
        let mut drift = Vec::new();
        for (path, bytes) in &expected {
            if !on_disk.contains(path) {
                drift.push(format!("missing {path}"));
                continue;
            }
            let actual = fs::read(output_dir.join(path))
                .map_err(|err| ContractError::Io(format!("{path}: {err}")))?;
            if &actual != bytes {
                drift.push(format!("mismatch {path}"));
            }
        }
        drift.extend(
            on_disk
                .iter()
                .filter(|path| !expected.contains_key(*path))
                .map(|path| format!("unexpected {path}")),
        );

        if drift.is_empty() {
            Ok(())
        } else {
            Err(ContractError::Generation(format!("contract output drift: {}", drift.join("; "))))
        }
    }
}

impl Default for ContractBuilder {
    fn default() -> Self {
        Self::new(Self::default_output_dir())
    }
}

// ============================================================================
// SECTION: Artifact Helpers
// ============================================================================

/// Builds a JSON artifact with deterministic, pretty-printed serialization.
fn json_artifact<T: Serialize>(path: &str, value: &T) -> Result<ContractArtifact, ContractError> {
    Ok(ContractArtifact {
        path: path.to_string(),
        format: ArtifactFormat::Json,
        bytes: serialize_json_pretty(value)?,
    })
}

/// Builds a markdown artifact from content.
fn markdown_artifact(path: &str, content: String) -> ContractArtifact {
    ContractArtifact {
        path: path.to_string(),
        format: ArtifactFormat::Markdown,
        bytes: content.into_bytes(),
    }
}

/// Serializes a value into pretty JSON bytes with canonical key ordering.
fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>, ContractError> {
    let canonical =
        canonical_json_bytes(value).map_err(|err| ContractError::Serialization(err.to_string()))?;
    let canonical_value: serde_json::Value = serde_json::from_slice(&canonical)
        .map_err(|err| ContractError::Serialization(err.to_string()))?;
    let mut bytes = serde_json::to_vec_pretty(&canonical_value)
        .map_err(|err| ContractError::Serialization(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Builds the manifest from generated artifacts.
fn build_manifest(
    contract_version: &str,
    algorithm: HashAlgorithm,
    artifacts: &[ContractArtifact],
) -> ContractManifest {
    let entries = artifacts
        .iter()
        .map(|artifact| ManifestArtifact {
            path: artifact.path.clone(),
            content_type: artifact.format,
            digest: hash_bytes(algorithm, &artifact.bytes),
        })
        .collect();
    ContractManifest {
        contract_version: contract_version.to_string(),
        hash_algorithm: algorithm,
        artifacts: entries,
    }
}

/// Ensures artifact paths are unique.
fn ensure_unique_paths(artifacts: &[ContractArtifact]) -> Result<(), ContractError> {
    let mut seen = BTreeSet::new();
    for artifact in artifacts {
        if !seen.insert(&artifact.path) {
            return Err(ContractError::Generation(format!(
                "duplicate artifact path: {}",
                artifact.path
            )));
        }
    }
    Ok(())
}

/// Ensures the output directory exists, creating it if necessary.
fn ensure_output_dir(output_dir: &Path) -> Result<(), ContractError> {
    if output_dir.as_os_str().is_empty() || (output_dir.exists() && !output_dir.is_dir()) {
        return Err(ContractError::OutputPath(output_dir.to_path_buf()));
    }
    fs::create_dir_all(output_dir).map_err(|err| ContractError::Io(err.to_string()))
}

/// Writes a single artifact to the output directory.
fn write_artifact(output_dir: &Path, artifact: &ContractArtifact) -> Result<(), ContractError> {
    let target = output_dir.join(validate_relative_path(&artifact.path)?);
    let parent = target.parent().ok_or_else(|| ContractError::OutputPath(target.clone()))?;
    fs::create_dir_all(parent).map_err(|err| ContractError::Io(err.to_string()))?;
    fs::write(&target, &artifact.bytes).map_err(|err| ContractError::Io(err.to_string()))
}

/// Validates that the artifact path is relative and stays under the root.
fn validate_relative_path(path: &str) -> Result<PathBuf, ContractError> {
    if path.trim().is_empty() {
        return Err(ContractError::Generation(String::from("artifact path is empty")));
    }
    let candidate = PathBuf::from(path);
    let escapes = candidate.components().any(|component| {
        matches!(component, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if escapes {
        return Err(ContractError::Generation(format!("artifact path must be relative: {path}")));
    }
    Ok(candidate)
}

/// Lists every file under `root` as a `/`-separated relative path.
fn list_files(root: &Path) -> Result<BTreeSet<String>, ContractError> {
    let mut files = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|err| ContractError::Io(err.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|err| ContractError::Io(err.to_string()))?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let relative =
                path.strip_prefix(root).map_err(|_| ContractError::OutputPath(path.clone()))?;
            let parts: Option<Vec<&str>> =
                relative.components().map(|component| component.as_os_str().to_str()).collect();
            let parts = parts.ok_or_else(|| ContractError::OutputPath(path.clone()))?;
            files.insert(parts.join("/"));
        }
    }
    Ok(files)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
