//! Error types for the diagram module.

use thiserror::Error;

/// Result type alias for diagram operations.
pub type DiagramResult<T> = Result<T, DiagramError>;

/// Errors that can occur while turning diagram JSON into a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramError {
    /// Bad JSON, duplicate node ids, or a reference to a node that does not exist.
    #[error("Malformed diagram: {0}")]
    MalformedDiagram(String),

    /// The containment edges do not form a forest.
    #[error("Invalid containment graph at node '{node}': {reason}")]
    InvalidContainmentGraph { node: String, reason: String },
}

impl DiagramError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDiagram(message.into())
    }

    pub(crate) fn containment(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidContainmentGraph {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Stable taxonomy name of the error.
    pub fn code(&self) -> &'static str {
        match self {
            DiagramError::MalformedDiagram(_) => "MalformedDiagram",
            DiagramError::InvalidContainmentGraph { .. } => "InvalidContainmentGraph",
        }
    }
}
