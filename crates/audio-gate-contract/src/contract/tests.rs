// crates/audio-gate-contract/src/contract/tests.rs
// ============================================================================
// Module: Contract Builder Unit Tests
// Description: Unit coverage for bundle determinism and verification.
// Purpose: Ensure verification fails closed on drifted output directories.
// Dependencies: audio-gate-contract, tempfile, std
// ============================================================================

//! ## Overview
//! Tests that the bundle is stable across builds, that its manifest hashes
//! every artifact, and that `verify_output` rejects tampered, missing, and
//! unexpected files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use audio_gate_core::canonical_json_bytes;
use audio_gate_core::hash_bytes;

use crate::ContractBuilder;
use crate::ContractError;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn build_is_deterministic_and_sorted() -> Result<(), Box<dyn std::error::Error>> {
    let builder = ContractBuilder::new("unused".into());
    let first = builder.build()?;
    let second = builder.build()?;
    if first != second {
        return Err("bundle differs between builds".into());
    }
    let paths: Vec<&str> = first.artifacts.iter().map(|artifact| artifact.path.as_str()).collect();
    let mut sorted = paths.clone();
    sorted.sort_unstable();
    if paths != sorted {
        return Err("artifacts are not sorted by path".into());
    }
    for expected in [
        "schemas/analysis_input.schema.json",
        "schemas/tool_result_envelope.schema.json",
        "tool_definition.json",
        "examples/tool_use.json",
    ] {
        if !paths.contains(&expected) {
            return Err(format!("missing artifact {expected}").into());
        }
    }
    Ok(())
}

#[test]
fn manifest_digests_match_artifact_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let bundle = ContractBuilder::new("unused".into()).build()?;
    if bundle.manifest.artifacts.len() != bundle.artifacts.len() {
        return Err("manifest entry count mismatch".into());
    }
    for (entry, artifact) in bundle.manifest.artifacts.iter().zip(&bundle.artifacts) {
        if entry.path != artifact.path
            || entry.digest != hash_bytes(bundle.manifest.hash_algorithm, &artifact.bytes)
        {
            return Err(format!("digest mismatch for {}", artifact.path).into());
        }
    }
    Ok(())
}

#[test]
fn written_json_uses_canonical_key_order() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let output_dir = temp.path().join("out");
    ContractBuilder::new(output_dir.clone()).write()?;

    let manifest = fs::read_to_string(output_dir.join("index.json"))?;
    let Some(first_key) = manifest.lines().nth(1) else {
        return Err("manifest is empty".into());
    };
    if !first_key.trim_start().starts_with("\"artifacts\"") {
        return Err(format!("manifest keys are not sorted: {first_key}").into());
    }
    let canonical = canonical_json_bytes(&serde_json::from_str::<serde_json::Value>(&manifest)?)?;
    let compact: serde_json::Value = serde_json::from_slice(&canonical)?;
    if serde_json::to_string_pretty(&compact)? + "\n" != manifest {
        return Err("manifest is not pretty-printed canonical json".into());
    }
    Ok(())
}

#[test]
fn written_bundle_verifies() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let output_dir = temp.path().join("out");
    let builder = ContractBuilder::new(output_dir.clone());
    builder.write()?;
    builder.verify_output(&output_dir)?;
    Ok(())
}

#[test]
fn verify_output_rejects_tampered_artifact() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let output_dir = temp.path().join("out");
    let builder = ContractBuilder::new(output_dir.clone());
    builder.write()?;

    let bundle = builder.build()?;
    let artifact = bundle.artifacts.first().ok_or("expected at least one artifact")?;
    let artifact_path = output_dir.join(&artifact.path);
    let mut bytes = fs::read(&artifact_path)?;
    bytes.extend_from_slice(b"extra");
    fs::write(&artifact_path, &bytes)?;

    let Err(err) = builder.verify_output(&output_dir) else {
        return Err("expected tampered artifact to be rejected".into());
    };
    if !matches!(err, ContractError::Generation(_)) {
        return Err("expected generation error for tampered artifact".into());
    }
    Ok(())
}

#[test]
fn verify_output_rejects_unexpected_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let output_dir = temp.path().join("out");
    let builder = ContractBuilder::new(output_dir.clone());
    builder.write()?;
    fs::write(output_dir.join("schemas/stale.schema.json"), b"{}")?;

    let Err(err) = builder.verify_output(&output_dir) else {
        return Err("expected unexpected artifact to be rejected".into());
    };
    if !err.to_string().contains("schemas/stale.schema.json") {
        return Err(format!("unexpected error: {err}").into());
    }
    Ok(())
}

#[test]
fn verify_output_rejects_missing_directory() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let missing = temp.path().join("missing");
    let Err(err) = ContractBuilder::new(missing.clone()).verify_output(&missing) else {
        return Err("expected missing directory to be rejected".into());
    };
    if !matches!(err, ContractError::OutputPath(_)) {
        return Err("expected OutputPath error".into());
    }
    Ok(())
}

#[test]
fn verify_output_reports_every_drifted_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let output_dir = temp.path().join("out");
    let builder = ContractBuilder::new(output_dir.clone());
    builder.write()?;
    fs::remove_file(output_dir.join("tooling.md"))?;
    fs::write(output_dir.join("notes.txt"), b"scratch")?;

    let Err(err) = builder.verify_output(&output_dir) else {
        return Err("expected drifted bundle to be rejected".into());
    };
    let message = err.to_string();
    if !message.contains("missing tooling.md") || !message.contains("unexpected notes.txt") {
        return Err(format!("drift report incomplete: {message}").into());
    }
    Ok(())
}
