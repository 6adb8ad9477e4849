//! Stratus CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Diagram error
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stratus_core::CoreError;
use stratus_pipeline::PipelineError;

mod commands;

use commands::{Cli, CliError, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const DIAGRAM_ERROR: u8 = 4;
    pub const IAC_ERROR: u8 = 5;
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "stratus=debug,info"
    } else if quiet {
        "warn"
    } else {
        "stratus=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed; keep it.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args, config).await,
        Commands::Generate(args) => commands::generate::execute(args, config).await,
        Commands::Types(args) => commands::types::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(err) = e.downcast_ref::<CliError>() {
        return match err {
            CliError::InvalidArgument(_) => ExitCodes::INVALID_ARGS,
            CliError::ValidationFailed(_) => ExitCodes::VALIDATION_FAILURE,
            CliError::GenerationFailed { .. } => ExitCodes::IAC_ERROR,
        };
    }

    if let Some(err) = e.downcast_ref::<PipelineError>() {
        return match err {
            PipelineError::Diagram(_) => ExitCodes::DIAGRAM_ERROR,
            PipelineError::Core(CoreError::UnknownResourceType(_)) | PipelineError::Policy(_) => {
                ExitCodes::VALIDATION_FAILURE
            }
            PipelineError::Core(_) | PipelineError::Iac(_) => ExitCodes::IAC_ERROR,
            PipelineError::Config(_) | PipelineError::Toml(_) => ExitCodes::INVALID_ARGS,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }

    if e.downcast_ref::<stratus_iac::IacError>().is_some() {
        return ExitCodes::IAC_ERROR;
    }

    ExitCodes::GENERAL_ERROR
}
