//! Raw diagram document types as submitted by the editor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open key/value metadata attached to a node (instance size, CIDR, ...).
pub type Metadata = serde_json::Map<String, Value>;

/// Canvas position of a node. Only meaningful to the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A resource drawn on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    /// Provider-agnostic resource type, e.g. `VPC`.
    #[serde(alias = "type")]
    pub type_name: String,
    #[serde(default)]
    pub label: String,
    /// Containment shorthand. An explicit containment edge takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DiagramNode {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            type_name: type_name.into(),
            parent_id: None,
            position: Position::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Display name: the label, or the id when no label was drawn.
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Kind of relationship an edge declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Containment,
    #[default]
    Dependency,
}

/// Flavour of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Uses,
    #[default]
    DependsOn,
    ConnectsTo,
    References,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Uses => "uses",
            DependencyType::DependsOn => "depends_on",
            DependencyType::ConnectsTo => "connects_to",
            DependencyType::References => "references",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "uses" => Some(DependencyType::Uses),
            "depends_on" => Some(DependencyType::DependsOn),
            "connects_to" => Some(DependencyType::ConnectsTo),
            "references" => Some(DependencyType::References),
            _ => None,
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An edge drawn between two nodes.
///
/// Containment edges point from the container to the contained node.
/// Dependency edges point from the dependent node to what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_type: Option<DependencyType>,
}

impl DiagramEdge {
    pub fn containment(id: impl Into<String>, parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: parent.into(),
            target: child.into(),
            kind: EdgeKind::Containment,
            dependency_type: None,
        }
    }

    pub fn dependency(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        dependency_type: DependencyType,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Dependency,
            dependency_type: Some(dependency_type),
        }
    }

    /// Dependency flavour, defaulting to `depends_on` when none was declared.
    pub fn effective_dependency_type(&self) -> DependencyType {
        self.dependency_type.unwrap_or_default()
    }
}

/// A complete diagram document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: DiagramNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn edge(mut self, edge: DiagramEdge) -> Self {
        self.edges.push(edge);
        self
    }
}
