//! CLI command definitions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::debug;

use stratus_core::CloudProvider;
use stratus_pipeline::PipelineConfig;

pub mod generate;
pub mod types;
pub mod validate;

/// Stratus - compile cloud architecture diagrams into infrastructure code
#[derive(Parser)]
#[command(name = "stratus")]
#[command(version, about = "Stratus - compile cloud architecture diagrams into infrastructure code")]
#[command(long_about = r#"
Stratus turns an architecture diagram (JSON nodes and edges) into
infrastructure-as-code. Diagrams are validated against constraints, mapped
onto provider resources with implicit dependencies added, ordered, and
rendered for an IaC engine.

COMMANDS:
  validate  → Check a diagram against its constraints
  generate  → Generate IaC files from a diagram
  types     → List the known resource types

CONFIGURATION:
  Settings are read from stratus.toml in the working directory (or --config)
  and can be overridden by flags or STRATUS_* environment variables.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Diagram error
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./stratus.toml when present)
    #[arg(short, long, global = true, env = "STRATUS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a diagram against its constraints
    Validate(validate::ValidateArgs),

    /// Generate infrastructure code from a diagram
    Generate(generate::GenerateArgs),

    /// List registered resource types
    Types(types::TypesArgs),
}

/// Options shared by commands that read a diagram.
#[derive(Args, Debug, Clone)]
pub struct DiagramArgs {
    /// Path to the diagram JSON file
    pub diagram: PathBuf,

    /// Cloud provider (aws, azure, gcp)
    #[arg(short, long, env = "STRATUS_PROVIDER")]
    pub provider: Option<String>,

    /// Deployment region
    #[arg(short, long, env = "STRATUS_REGION")]
    pub region: Option<String>,

    /// Constraint file or directory
    #[arg(long, env = "STRATUS_CONSTRAINTS")]
    pub constraints: Option<PathBuf>,
}

impl DiagramArgs {
    pub fn read_diagram(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.diagram).with_context(|| format!("Failed to read diagram {}", self.diagram.display()))
    }

    /// Apply flag and environment overrides on top of the file configuration.
    pub fn apply(&self, mut config: PipelineConfig) -> Result<PipelineConfig, CliError> {
        if let Some(provider) = &self.provider {
            config.provider =
                CloudProvider::parse(provider).ok_or_else(|| CliError::InvalidArgument(format!("unknown provider '{}'", provider)))?;
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(constraints) = &self.constraints {
            config.constraints = Some(constraints.clone());
        }
        Ok(config)
    }
}

/// Failures the CLI reports itself, beyond pipeline errors.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed with {0} constraint violations")]
    ValidationFailed(usize),

    #[error("{engine} generation failed with {errors} errors")]
    GenerationFailed { engine: String, errors: usize },
}

/// Configuration from `--config`, or `stratus.toml` in the working directory.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::discover(&std::env::current_dir()?)?,
    };
    debug!("Using configuration {:?}", config);
    Ok(config)
}
