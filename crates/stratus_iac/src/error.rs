//! Error types for IaC module.

use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur during code generation.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Unsupported IaC engine: {0}")]
    UnsupportedEngine(String),

    #[error("No {engine} mapper registered for resource type '{resource_type}'")]
    UnsupportedResourceType { engine: String, resource_type: String },

    #[error("Cannot map resource '{resource}': {message}")]
    Mapping { resource: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IacError {
    pub(crate) fn mapping(resource: impl Into<String>, message: impl Into<String>) -> Self {
        IacError::Mapping {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            IacError::UnsupportedEngine(_) => "UnsupportedEngine",
            IacError::UnsupportedResourceType { .. } => "UnsupportedResourceType",
            IacError::Mapping { .. } => "MappingFailed",
            IacError::Io(_) => "IoError",
        }
    }

    /// Id of the resource the error is about, if any.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            IacError::Mapping { resource, .. } => Some(resource),
            _ => None,
        }
    }
}
