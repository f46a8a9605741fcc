// crates/audio-gate-contract/src/main.rs
// ============================================================================
// Module: Contract CLI
// Description: CLI entrypoint for generating Audio Gate contract artifacts.
// Purpose: Provide deterministic artifact generation and drift checks.
// Dependencies: clap, audio-gate-contract
// ============================================================================

//! ## Overview
//! The contract CLI emits deterministic, human-readable contract artifacts and
//! can verify that on-disk artifacts match the generated bundle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use audio_gate_contract::ContractBuilder;
use audio_gate_contract::ContractError;
use clap::Parser;
use clap::Subcommand;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Contract generator CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "audio-gate-contract", about = "Generate Audio Gate contract artifacts.")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the contract artifacts.
    Generate {
        /// Output directory for generated artifacts.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Verify generated artifacts match the canonical contract.
    Check {
        /// Output directory containing generated artifacts.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: CLI Execution
// ============================================================================

/// CLI entrypoint.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

/// Executes the CLI command.
fn run() -> Result<(), ContractError> {
    let cli = Cli::parse();
    let output_dir = cli.output_dir().unwrap_or_else(ContractBuilder::default_output_dir);
    let builder = ContractBuilder::new(output_dir.clone());
    match cli.command {
        Command::Generate {
            ..
        } => {
            let manifest = builder.write_to(&output_dir)?;
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "wrote {} artifacts to {}",
                manifest.artifacts.len(),
                output_dir.display()
            );
            Ok(())
        }
        Command::Check {
            ..
        } => builder.verify_output(&output_dir),
    }
}

/// Reports CLI errors to stderr and returns a failure exit code.
fn report_error(err: &ContractError) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{err}");
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: CLI Helpers
// ============================================================================

impl Cli {
    /// Returns the output directory from flags, if any.
    fn output_dir(&self) -> Option<PathBuf> {
        match &self.command {
            Command::Generate {
                out,
            }
            | Command::Check {
                out,
            } => out.clone(),
        }
    }
}
