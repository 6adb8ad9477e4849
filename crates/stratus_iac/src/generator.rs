//! Code generation engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use stratus_core::Architecture;

use crate::block::CodeBlock;
use crate::error::{IacError, IacResult};
use crate::registry::{CodegenRegistry, MapContext};
use crate::result::{GeneratedFile, PipelineResult, ResultError};
use crate::writer::EngineWriter;

/// Generates engine files for ordered architectures.
pub struct CodeGenerator<'a> {
    registry: &'a CodegenRegistry,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(registry: &'a CodegenRegistry) -> Self {
        Self { registry }
    }

    /// Generate every file for the architecture.
    ///
    /// All mapping problems are reported together; if there is any, the
    /// result carries no files.
    pub fn generate(&self, engine: &str, architecture: &Architecture) -> PipelineResult {
        match self.build(engine, architecture) {
            Ok(files) => {
                info!("Generated {} {} files", files.len(), engine);
                PipelineResult::success(engine, files)
            }
            Err(errors) => {
                warn!("{} generation failed with {} errors", engine, errors.len());
                PipelineResult::failed(engine, errors)
            }
        }
    }

    fn build(&self, engine: &str, architecture: &Architecture) -> Result<Vec<GeneratedFile>, Vec<ResultError>> {
        let writer = self.writer(engine).map_err(|e| vec![ResultError::from(&e)])?;
        if !architecture.ordered {
            warn!("Generating {} code for an architecture that was never sorted", engine);
        }

        let names = local_names(writer.as_ref(), architecture);
        let ctx = MapContext::new(architecture, engine, &names);

        let mut blocks = writer.preamble(architecture);
        let mut errors = Vec::new();
        for resource in &architecture.resources {
            let result = match self.registry.mapper(engine, &resource.type_name) {
                Some(mapper) => mapper.map(resource, &ctx),
                None => Err(IacError::UnsupportedResourceType {
                    engine: engine.to_string(),
                    resource_type: resource.type_name.clone(),
                }),
            };
            match result {
                Ok(mapped) => {
                    debug!("Mapped '{}' to {} blocks", resource.id, mapped.len());
                    blocks.extend(mapped);
                }
                Err(err) => errors.push(ResultError::from(&err).with_resource(resource.id.clone())),
            }
        }

        if errors.is_empty() {
            Ok(Self::render(writer.as_ref(), blocks))
        } else {
            Err(errors)
        }
    }

    fn writer(&self, engine: &str) -> IacResult<Arc<dyn EngineWriter>> {
        self.registry
            .writer(engine)
            .ok_or_else(|| IacError::UnsupportedEngine(engine.to_string()))
    }

    fn render(writer: &dyn EngineWriter, blocks: Vec<CodeBlock>) -> Vec<GeneratedFile> {
        writer
            .route(blocks)
            .into_iter()
            .map(|(path, blocks)| GeneratedFile::new(path, writer.render(&blocks)))
            .collect()
    }
}

/// Unique engine identifiers for every resource, assigned in resource order.
fn local_names(writer: &dyn EngineWriter, architecture: &Architecture) -> HashMap<String, String> {
    let mut taken = HashSet::new();
    let mut names = HashMap::new();

    for resource in &architecture.resources {
        let base = writer.identifier(&resource.name);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        names.insert(resource.id.clone(), candidate);
    }

    names
}
