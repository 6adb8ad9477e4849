//! Types command - List registered resource types.

use anyhow::Result;
use clap::Args;

use stratus_core::CloudProvider;
use stratus_pipeline::Pipeline;

use super::CliError;

#[derive(Args)]
pub struct TypesArgs {
    /// Only list types for this provider
    #[arg(short, long, env = "STRATUS_PROVIDER")]
    pub provider: Option<String>,
}

pub async fn execute(args: TypesArgs) -> Result<()> {
    let provider = match &args.provider {
        Some(name) => Some(
            CloudProvider::parse(name).ok_or_else(|| CliError::InvalidArgument(format!("unknown provider '{}'", name)))?,
        ),
        None => None,
    };

    let pipeline = Pipeline::builder().build();
    let registry = pipeline.resource_types();
    let engines = pipeline.codegen().engines();

    println!("{:<16} {:<8} {:<12} {:<18} ENGINES", "TYPE", "CLOUD", "CATEGORY", "KIND");
    for resource_type in registry
        .types()
        .filter(|t| provider.map_or(true, |p| t.cloud_provider == p))
    {
        let supported: Vec<&str> = engines
            .iter()
            .copied()
            .filter(|engine| pipeline.codegen().mapper(engine, &resource_type.name).is_some())
            .collect();
        println!(
            "{:<16} {:<8} {:<12} {:<18} {}",
            resource_type.name,
            resource_type.cloud_provider.as_str(),
            resource_type.category.as_str(),
            resource_type.kind,
            supported.join(",")
        );

        for rule in registry.hidden_dependencies(&resource_type.name) {
            println!("    └─ implies {}", rule.child_resource_type);
        }
    }

    Ok(())
}
