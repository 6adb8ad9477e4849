//! Error types for the pipeline.

use thiserror::Error;
use uuid::Uuid;

use stratus_core::CoreError;
use stratus_diagram::DiagramError;
use stratus_iac::{IacError, ResultError};
use stratus_policy::PolicyError;

/// Result type alias for pipeline operations.
pub type RunResult<T> = Result<T, PipelineError>;

/// Errors that can stop a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Iac(#[from] IacError),

    #[error("Architecture not found: {0}")]
    ArchitectureNotFound(Uuid),

    #[error("Architecture store failure: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PipelineError {
    /// Stable taxonomy name reported in result errors.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Diagram(e) => e.code(),
            PipelineError::Core(e) => e.code(),
            PipelineError::Policy(e) => e.code(),
            PipelineError::Iac(e) => e.code(),
            PipelineError::ArchitectureNotFound(_) => "ArchitectureNotFound",
            PipelineError::Store(_) => "ArchitectureStoreError",
            PipelineError::Config(_) | PipelineError::Toml(_) => "InvalidConfig",
            PipelineError::Io(_) => "IoError",
        }
    }

    /// Structured form for a failed [`PipelineResult`](stratus_iac::PipelineResult).
    pub fn to_result_error(&self) -> ResultError {
        let error = ResultError::new(self.code(), self.to_string());
        match self {
            PipelineError::Core(CoreError::CyclicDependency { resource, .. }) => error.with_resource(resource.clone()),
            PipelineError::Iac(e) => match e.resource_id() {
                Some(id) => error.with_resource(id),
                None => error,
            },
            _ => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_wrapped_errors() {
        let err = PipelineError::from(CoreError::UnknownResourceType("FooBar".into()));
        assert_eq!(err.code(), "UnknownResourceType");
        assert_eq!(err.to_string(), "Unknown resource type: FooBar");

        let err = PipelineError::from(DiagramError::MalformedDiagram("bad".into()));
        assert_eq!(err.code(), "MalformedDiagram");

        assert_eq!(PipelineError::ArchitectureNotFound(Uuid::nil()).code(), "ArchitectureNotFound");
    }

    #[test]
    fn test_cycle_names_resource() {
        let err = PipelineError::from(CoreError::CyclicDependency {
            resource: "A".into(),
            cycle: vec!["A".into(), "B".into(), "A".into()],
        });
        let result = err.to_result_error();
        assert_eq!(result.code, "CyclicDependency");
        assert_eq!(result.resource_id.as_deref(), Some("A"));
    }
}
