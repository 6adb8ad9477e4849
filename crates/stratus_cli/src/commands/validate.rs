//! Validate command - Check a diagram against its constraints.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use stratus_pipeline::{Pipeline, ProcessOutcome};
use stratus_policy::ValidationError;

use super::{load_config, CliError, DiagramArgs};

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub diagram: DiagramArgs,

    /// Print violations as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ValidateArgs, config_path: Option<&Path>) -> Result<()> {
    let config = args.diagram.apply(load_config(config_path)?)?;
    info!("Validating diagram: {}", args.diagram.diagram.display());

    let raw = args.diagram.read_diagram()?;
    let pipeline = Pipeline::from_config(&config)?;

    match pipeline.process_diagram(&raw, config.provider, config.region()).await? {
        ProcessOutcome::Mapped(architecture) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&architecture)?);
                return Ok(());
            }
            let synthesized = architecture.resources.iter().filter(|r| r.synthesized).count();
            println!(
                "✅ Diagram is valid: {} resources ({} added as implicit dependencies)",
                architecture.len(),
                synthesized
            );
            for resource in architecture.resources.iter().filter(|r| r.synthesized) {
                println!("   + {} ({})", resource.id, resource.type_name);
            }
            Ok(())
        }
        ProcessOutcome::Invalid(errors) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&errors)?);
            } else {
                print_violations(&errors);
            }
            Err(CliError::ValidationFailed(errors.len()).into())
        }
    }
}

pub fn print_violations(errors: &[ValidationError]) {
    println!("❌ Constraint violations:");
    for error in errors {
        print!("   - {} ({}): {}", error.resource_id, error.constraint_type, error.message);
        match (&error.expected, &error.actual) {
            (Some(expected), Some(actual)) => println!(" [expected {}, got {}]", expected, actual),
            _ => println!(),
        }
    }
}
