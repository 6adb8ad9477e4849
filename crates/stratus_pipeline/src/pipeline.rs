//! Pipeline orchestration: diagram in, code out.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use stratus_core::{Architecture, ArchitectureMapper, CloudProvider, DependencySorter, ResourceTypeRegistry};
use stratus_diagram::GraphBuilder;
use stratus_iac::{CodeGenerator, CodegenRegistry, PipelineResult, ResultError};
use stratus_policy::{ConstraintSet, ConstraintStore, RuleEngine, ValidationError};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, RunResult};
use crate::stores::{ArchitectureStore, InMemoryArchitectureStore};

/// Result of processing a diagram.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The diagram passed validation and was mapped.
    Mapped(Architecture),
    /// Every constraint violation found; nothing was mapped.
    Invalid(Vec<ValidationError>),
}

impl ProcessOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ProcessOutcome::Mapped(_))
    }

    pub fn architecture(&self) -> Option<&Architecture> {
        match self {
            ProcessOutcome::Mapped(architecture) => Some(architecture),
            ProcessOutcome::Invalid(_) => None,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ProcessOutcome::Mapped(_) => &[],
            ProcessOutcome::Invalid(errors) => errors,
        }
    }
}

/// Runs diagrams through validation, mapping, ordering and generation.
///
/// Registries are shared read-only; each call works on its own graph,
/// constraint set and architecture.
#[derive(Clone)]
pub struct Pipeline {
    resource_types: Arc<ResourceTypeRegistry>,
    codegen: Arc<CodegenRegistry>,
    constraints: Arc<dyn ConstraintStore>,
    architectures: Arc<dyn ArchitectureStore>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Pipeline with the built-in registries and the constraints the
    /// configuration selects.
    pub fn from_config(config: &PipelineConfig) -> RunResult<Self> {
        let constraints = config.load_constraints()?;
        info!(
            "Loaded {} constraints for provider {}",
            constraints.len(),
            config.provider
        );
        Ok(Self::builder().with_constraint_store(Arc::new(constraints)).build())
    }

    pub fn resource_types(&self) -> &ResourceTypeRegistry {
        &self.resource_types
    }

    pub fn codegen(&self) -> &CodegenRegistry {
        &self.codegen
    }

    /// Parse, validate and map a raw diagram.
    ///
    /// Structural problems and unknown resource types are errors; constraint
    /// violations come back as [`ProcessOutcome::Invalid`] with all of them
    /// listed.
    pub async fn process_diagram(
        &self,
        raw: &[u8],
        provider: CloudProvider,
        region: &str,
    ) -> RunResult<ProcessOutcome> {
        let graph = GraphBuilder::parse(raw)?;
        info!("Processing diagram with {} nodes for {} in '{}'", graph.len(), provider, region);

        let constraints =
            ConstraintSet::fetch(self.constraints.as_ref(), graph.nodes().map(|n| n.type_name.as_str())).await?;

        let errors = RuleEngine::new(&self.resource_types).validate(&graph, &constraints, region);
        if !errors.is_empty() {
            warn!("Diagram failed validation with {} errors", errors.len());
            return Ok(ProcessOutcome::Invalid(errors));
        }

        let architecture = ArchitectureMapper::new(&self.resource_types).map(Arc::new(graph), provider, region)?;
        info!("Mapped architecture with {} resources", architecture.len());
        Ok(ProcessOutcome::Mapped(architecture))
    }

    /// Order the architecture and generate code for `engine`.
    pub fn generate_code(&self, architecture: Architecture, engine: &str) -> PipelineResult {
        match DependencySorter::sort(architecture) {
            Ok(sorted) => CodeGenerator::new(&self.codegen).generate(engine, &sorted),
            Err(err) => {
                warn!("Cannot order architecture: {}", err);
                PipelineResult::failed(engine, vec![PipelineError::from(err).to_result_error()])
            }
        }
    }

    pub async fn save_architecture(&self, architecture: &Architecture) -> RunResult<Uuid> {
        let id = self.architectures.save_architecture(architecture).await?;
        info!("Saved architecture as project {}", id);
        Ok(id)
    }

    /// Generate code for a previously saved architecture.
    pub async fn generate_project(&self, project_id: Uuid, engine: &str) -> RunResult<PipelineResult> {
        let architecture = self.architectures.load_architecture(project_id).await?;
        info!("Generating {} code for project {}", engine, project_id);
        Ok(self.generate_code(architecture, engine))
    }

    /// Diagram to generated files in one call. Every failure, including
    /// constraint violations, is reported in the result's errors.
    pub async fn compile(&self, raw: &[u8], provider: CloudProvider, region: &str, engine: &str) -> PipelineResult {
        match self.process_diagram(raw, provider, region).await {
            Ok(ProcessOutcome::Mapped(architecture)) => self.generate_code(architecture, engine),
            Ok(ProcessOutcome::Invalid(errors)) => {
                PipelineResult::failed(engine, errors.iter().map(validation_result_error).collect())
            }
            Err(err) => PipelineResult::failed(engine, vec![err.to_result_error()]),
        }
    }
}

fn validation_result_error(error: &ValidationError) -> ResultError {
    ResultError::new("ValidationFailed", error.message.clone())
        .with_resource(error.resource_id.clone())
        .with_constraint(error.constraint_type.clone())
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("resource_types", &self.resource_types.len())
            .field("engines", &self.codegen.engines())
            .finish()
    }
}

/// Wires registries and stores into a [`Pipeline`].
///
/// Anything not supplied falls back to the built-in registries, an empty
/// constraint set and an in-memory architecture store.
#[derive(Default)]
pub struct PipelineBuilder {
    resource_types: Option<Arc<ResourceTypeRegistry>>,
    codegen: Option<Arc<CodegenRegistry>>,
    constraints: Option<Arc<dyn ConstraintStore>>,
    architectures: Option<Arc<dyn ArchitectureStore>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_types(mut self, registry: impl Into<Arc<ResourceTypeRegistry>>) -> Self {
        self.resource_types = Some(registry.into());
        self
    }

    pub fn with_codegen(mut self, registry: impl Into<Arc<CodegenRegistry>>) -> Self {
        self.codegen = Some(registry.into());
        self
    }

    pub fn with_constraint_store(mut self, store: Arc<dyn ConstraintStore>) -> Self {
        self.constraints = Some(store);
        self
    }

    pub fn with_architecture_store(mut self, store: Arc<dyn ArchitectureStore>) -> Self {
        self.architectures = Some(store);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            resource_types: self
                .resource_types
                .unwrap_or_else(|| Arc::new(ResourceTypeRegistry::with_defaults())),
            codegen: self.codegen.unwrap_or_else(|| Arc::new(CodegenRegistry::with_defaults())),
            constraints: self.constraints.unwrap_or_else(|| Arc::new(ConstraintSet::new())),
            architectures: self
                .architectures
                .unwrap_or_else(|| Arc::new(InMemoryArchitectureStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_policy::{Constraint, ConstraintType, InMemoryConstraintStore};

    const NETWORK: &str = r#"{
      "nodes": [
        { "id": "v1", "type": "VPC", "label": "main" },
        { "id": "s1", "type": "Subnet", "parentId": "v1", "metadata": { "cidr": "10.0.1.0/24" } }
      ]
    }"#;

    #[tokio::test]
    async fn test_outcome_accessors() {
        let pipeline = Pipeline::builder().build();
        let outcome = pipeline
            .process_diagram(NETWORK.as_bytes(), CloudProvider::Aws, "us-east-1")
            .await
            .unwrap();

        assert!(outcome.is_valid());
        assert!(outcome.errors().is_empty());
        assert_eq!(outcome.architecture().unwrap().resource_ids(), vec!["v1", "s1"]);
    }

    #[tokio::test]
    async fn test_constraints_are_fetched_per_type() {
        let store = InMemoryConstraintStore::new();
        store.add(Constraint::new("Subnet", ConstraintType::RequiresParent, "VPC"));
        let pipeline = Pipeline::builder()
            .with_constraint_store(Arc::new(store.clone()))
            .build();

        pipeline
            .process_diagram(NETWORK.as_bytes(), CloudProvider::Aws, "us-east-1")
            .await
            .unwrap();
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_compile_reports_validation_errors() {
        let raw = r#"{ "nodes": [ { "id": "s1", "type": "Subnet" } ] }"#;
        let pipeline = Pipeline::builder()
            .with_constraint_store(Arc::new(ConstraintSet::aws_defaults()))
            .build();

        let result = pipeline.compile(raw.as_bytes(), CloudProvider::Aws, "us-east-1", "terraform").await;
        assert!(!result.is_success());
        assert_eq!(result.errors[0].code, "ValidationFailed");
        assert_eq!(result.errors[0].resource_id.as_deref(), Some("s1"));
        assert_eq!(result.errors[0].constraint_type.as_deref(), Some("requires_parent"));
    }

    #[tokio::test]
    async fn test_compile_reports_malformed_diagram() {
        let pipeline = Pipeline::builder().build();
        let result = pipeline.compile(b"{not json", CloudProvider::Aws, "us-east-1", "terraform").await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "MalformedDiagram");
    }

    #[test]
    fn test_from_config() {
        let pipeline = Pipeline::from_config(&PipelineConfig::default()).unwrap();
        assert!(pipeline.resource_types().contains("NATGateway"));
        assert_eq!(pipeline.codegen().engines(), vec!["terraform"]);
    }
}
