//! Resource type descriptors.

use serde::{Deserialize, Serialize};

use crate::provider::CloudProvider;

/// Broad family a resource type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Networking,
    Compute,
    Storage,
    Database,
    Security,
    Messaging,
    Integration,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Networking => "networking",
            ResourceCategory::Compute => "compute",
            ResourceCategory::Storage => "storage",
            ResourceCategory::Database => "database",
            ResourceCategory::Security => "security",
            ResourceCategory::Messaging => "messaging",
            ResourceCategory::Integration => "integration",
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provider resource type as known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    /// Provider-agnostic name used in diagrams, e.g. `NATGateway`.
    pub name: String,
    pub category: ResourceCategory,
    /// Short provider resource kind, e.g. `nat_gateway`.
    pub kind: String,
    pub cloud_provider: CloudProvider,
    pub is_regional: bool,
    pub is_global: bool,
}

impl ResourceType {
    /// A regional resource type.
    pub fn regional(
        name: impl Into<String>,
        category: ResourceCategory,
        kind: impl Into<String>,
        cloud_provider: CloudProvider,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind: kind.into(),
            cloud_provider,
            is_regional: true,
            is_global: false,
        }
    }

    /// A global (region-independent) resource type.
    pub fn global(
        name: impl Into<String>,
        category: ResourceCategory,
        kind: impl Into<String>,
        cloud_provider: CloudProvider,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind: kind.into(),
            cloud_provider,
            is_regional: false,
            is_global: true,
        }
    }
}
