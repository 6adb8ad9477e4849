//! Domain resources and architectures.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stratus_diagram::{DependencyType, Graph, Metadata};

use crate::provider::CloudProvider;

/// Where a dependency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyOrigin {
    /// Drawn by the user.
    Explicit,
    /// Added by hidden dependency expansion.
    Hidden,
}

/// A dependency from one resource onto another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDependency {
    /// Id of the resource that must exist first.
    pub target: String,
    pub dependency_type: DependencyType,
    pub origin: DependencyOrigin,
}

/// A cloud resource in an architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub config: Metadata,
    /// Containment parents (at most one for diagram-built resources).
    #[serde(default)]
    pub parents: Vec<String>,
    /// Containment children.
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<ResourceDependency>,
    /// True when the resource was added by hidden dependency expansion.
    #[serde(default)]
    pub synthesized: bool,
}

impl Resource {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            type_name: type_name.into(),
            config: Metadata::new(),
            parents: Vec::new(),
            children: Vec::new(),
            depends_on: Vec::new(),
            synthesized: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn depending_on(mut self, target: impl Into<String>, dependency_type: DependencyType) -> Self {
        self.depends_on.push(ResourceDependency {
            target: target.into(),
            dependency_type,
            origin: DependencyOrigin::Explicit,
        });
        self
    }

    /// The containment parent, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Ids of every resource this one depends on.
    pub fn dependency_targets(&self) -> impl Iterator<Item = &str> {
        self.depends_on.iter().map(|dep| dep.target.as_str())
    }

    /// String config value.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

/// A mapped architecture ready for ordering and code generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Architecture {
    pub provider: CloudProvider,
    pub region: String,
    pub resources: Vec<Resource>,
    /// Set once the dependency sorter has produced a provisioning order.
    #[serde(default)]
    pub ordered: bool,
    /// The diagram the architecture was built from.
    #[serde(skip)]
    pub graph: Option<Arc<Graph>>,
}

impl Architecture {
    pub fn new(provider: CloudProvider, region: impl Into<String>) -> Self {
        Self {
            provider,
            region: region.into(),
            resources: Vec::new(),
            ordered: false,
            graph: None,
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Look up a resource by id.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub(crate) fn resource_mut(&mut self, id: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    /// Resource ids in their current order.
    pub fn resource_ids(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.id.as_str()).collect()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the architecture has no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl PartialEq for Architecture {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.region == other.region
            && self.resources == other.resources
            && self.ordered == other.ordered
    }
}
