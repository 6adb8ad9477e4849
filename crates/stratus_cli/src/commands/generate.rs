//! Generate command - Generate IaC files from a diagram.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stratus_iac::write_all;
use stratus_pipeline::{Pipeline, ProcessOutcome};

use super::validate::print_violations;
use super::{load_config, CliError, DiagramArgs};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub diagram: DiagramArgs,

    /// IaC engine to generate for
    #[arg(short, long, env = "STRATUS_ENGINE")]
    pub engine: Option<String>,

    /// Output directory
    #[arg(short, long, env = "STRATUS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Print the files instead of writing them
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = args.diagram.apply(load_config(config_path)?)?;
    if let Some(engine) = &args.engine {
        config.engine = engine.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    config.validate()?;

    info!(
        "Generating {} code from {}",
        config.engine,
        args.diagram.diagram.display()
    );

    let raw = args.diagram.read_diagram()?;
    let pipeline = Pipeline::from_config(&config)?;

    let architecture = match pipeline.process_diagram(&raw, config.provider, config.region()).await? {
        ProcessOutcome::Mapped(architecture) => architecture,
        ProcessOutcome::Invalid(errors) => {
            print_violations(&errors);
            return Err(CliError::ValidationFailed(errors.len()).into());
        }
    };

    let result = pipeline.generate_code(architecture, &config.engine);
    if !result.is_success() {
        println!("❌ Code generation failed:");
        for error in &result.errors {
            match &error.resource_id {
                Some(id) => println!("   - [{}] {}: {}", error.code, id, error.message),
                None => println!("   - [{}] {}", error.code, error.message),
            }
        }
        return Err(CliError::GenerationFailed {
            engine: result.engine,
            errors: result.errors.len(),
        }
        .into());
    }

    if args.dry_run {
        for file in &result.files {
            println!("# ---- {} ----", file.path);
            println!("{}", file.content);
        }
        return Ok(());
    }

    let written = write_all(&config.output_dir, &result.files)
        .with_context(|| format!("Failed to write infrastructure files to {}", config.output_dir.display()))?;
    println!("✅ Generated {} {} files:", written.len(), result.engine);
    for path in written {
        println!("   {}", path.display());
    }

    Ok(())
}
