//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while mapping and ordering an architecture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Cyclic dependency involving resource '{resource}' ({})", .cycle.join(" -> "))]
    CyclicDependency { resource: String, cycle: Vec<String> },

    #[error("Invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("Invalid expression '{expression}': {message}")]
    Expression { expression: String, message: String },
}

impl CoreError {
    pub(crate) fn expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Expression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Stable taxonomy name of the error.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::UnknownResourceType(_) => "UnknownResourceType",
            CoreError::CyclicDependency { .. } => "CyclicDependency",
            CoreError::InvalidArchitecture(_) => "InvalidArchitecture",
            CoreError::Expression { .. } => "InvalidExpression",
        }
    }
}
