//! Error types for policy module.

use thiserror::Error;

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while sourcing constraints.
///
/// Constraint violations are not errors; they are reported as
/// [`ValidationError`](crate::ValidationError) values.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Constraint store failure: {0}")]
    Store(String),

    #[error("Invalid constraint in {source_name}: {message}")]
    InvalidConstraint { source_name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolicyError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            PolicyError::Store(_) => "ConstraintStoreError",
            PolicyError::InvalidConstraint { .. } => "InvalidConstraint",
            PolicyError::Io(_) => "IoError",
            PolicyError::Yaml(_) | PolicyError::Json(_) => "InvalidConstraint",
        }
    }
}
