//! Resource type registry.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::hidden::HiddenDependencyRule;
use crate::provider::CloudProvider;
use crate::providers;
use crate::resource_type::ResourceType;

/// A registry of resource types and their hidden dependency rules.
///
/// Provider catalogs populate the registry once during startup; afterwards
/// it is shared read-only (typically behind an `Arc`) by every pipeline run.
#[derive(Default, Clone)]
pub struct ResourceTypeRegistry {
    types: HashMap<String, ResourceType>,
    hidden: HashMap<String, Vec<HiddenDependencyRule>>,
    order: Vec<String>,
}

impl ResourceTypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in provider catalog.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        providers::aws::register(&mut registry);
        registry
    }

    /// Register a resource type together with its hidden dependency rules.
    ///
    /// Registering a name twice replaces the descriptor and appends the rules.
    pub fn register(&mut self, resource_type: ResourceType, rules: Vec<HiddenDependencyRule>) {
        let name = resource_type.name.clone();
        debug!("Registering resource type: {} ({} hidden rules)", name, rules.len());

        if self.types.insert(name.clone(), resource_type).is_none() {
            self.order.push(name.clone());
        }
        if !rules.is_empty() {
            self.hidden.entry(name).or_default().extend(rules);
        }
    }

    /// Add a hidden dependency rule to an already registered parent type.
    pub fn add_hidden_rule(&mut self, rule: HiddenDependencyRule) -> CoreResult<()> {
        if !self.types.contains_key(&rule.parent_resource_type) {
            return Err(CoreError::UnknownResourceType(rule.parent_resource_type));
        }
        debug!(
            "Registering hidden dependency: {} -> {}",
            rule.parent_resource_type, rule.child_resource_type
        );
        self.hidden
            .entry(rule.parent_resource_type.clone())
            .or_default()
            .push(rule);
        Ok(())
    }

    /// Resolve a type by exact name.
    pub fn resolve(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }

    /// Resolve a type by name, returning an error if not found.
    pub fn resolve_required(&self, name: &str) -> CoreResult<&ResourceType> {
        self.resolve(name)
            .ok_or_else(|| CoreError::UnknownResourceType(name.to_string()))
    }

    /// Resolve a type by name and provider.
    ///
    /// A type registered for another cloud is reported as unknown.
    pub fn resolve_for(&self, name: &str, provider: CloudProvider) -> CoreResult<&ResourceType> {
        let resource_type = self.resolve_required(name)?;
        if resource_type.cloud_provider != provider {
            return Err(CoreError::UnknownResourceType(format!(
                "{} (registered for {}, not {})",
                name, resource_type.cloud_provider, provider
            )));
        }
        Ok(resource_type)
    }

    /// Hidden dependency rules whose parent is the given type.
    pub fn hidden_dependencies(&self, name: &str) -> &[HiddenDependencyRule] {
        self.hidden.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All registered type names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// All registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Get the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for ResourceTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTypeRegistry")
            .field("types", &self.order)
            .field("hidden_rules", &self.hidden.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CloudProvider;
    use crate::resource_type::ResourceCategory;

    fn vpc() -> ResourceType {
        ResourceType::regional("VPC", ResourceCategory::Networking, "vpc", CloudProvider::Aws)
    }

    #[test]
    fn test_registry_register() {
        let mut registry = ResourceTypeRegistry::new();
        assert!(registry.is_empty());

        registry.register(vpc(), Vec::new());

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("VPC"));
        assert_eq!(registry.resolve("VPC").unwrap().kind, "vpc");
    }

    #[test]
    fn test_resolve_is_exact() {
        let mut registry = ResourceTypeRegistry::new();
        registry.register(vpc(), Vec::new());

        assert!(registry.resolve("vpc").is_none());
        assert_eq!(
            registry.resolve_required("FooBar").unwrap_err(),
            CoreError::UnknownResourceType("FooBar".to_string())
        );
    }

    #[test]
    fn test_resolve_for_checks_provider() {
        let mut registry = ResourceTypeRegistry::new();
        registry.register(vpc(), Vec::new());

        assert_eq!(registry.resolve_for("VPC", CloudProvider::Aws).unwrap().kind, "vpc");
        match registry.resolve_for("VPC", CloudProvider::Gcp).unwrap_err() {
            CoreError::UnknownResourceType(message) => assert!(message.starts_with("VPC"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_names_keep_registration_order() {
        let mut registry = ResourceTypeRegistry::new();
        registry.register(
            ResourceType::regional("Subnet", ResourceCategory::Networking, "subnet", CloudProvider::Aws),
            Vec::new(),
        );
        registry.register(vpc(), Vec::new());
        registry.register(vpc(), Vec::new());

        assert_eq!(registry.names(), vec!["Subnet", "VPC"]);
    }

    #[test]
    fn test_hidden_rules() {
        let mut registry = ResourceTypeRegistry::new();
        registry.register(
            ResourceType::regional("NATGateway", ResourceCategory::Networking, "nat_gateway", CloudProvider::Aws),
            vec![HiddenDependencyRule::new("aws", "NATGateway", "ElasticIP").attached()],
        );

        assert_eq!(registry.hidden_dependencies("NATGateway").len(), 1);
        assert!(registry.hidden_dependencies("VPC").is_empty());
        assert!(registry
            .add_hidden_rule(HiddenDependencyRule::new("aws", "Missing", "ElasticIP"))
            .is_err());
    }

    #[test]
    fn test_defaults_include_aws_catalog() {
        let registry = ResourceTypeRegistry::with_defaults();
        for name in ["VPC", "Subnet", "NATGateway", "ElasticIP", "Lambda", "S3"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(!registry.hidden_dependencies("NATGateway").is_empty());
    }
}
