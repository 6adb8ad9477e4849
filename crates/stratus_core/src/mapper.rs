//! Graph to architecture mapping.

use std::sync::Arc;

use tracing::{debug, info};

use stratus_diagram::{DependencyType, Graph};

use crate::error::{CoreError, CoreResult};
use crate::hidden::HiddenDependencyRule;
use crate::provider::CloudProvider;
use crate::registry::ResourceTypeRegistry;
use crate::resource::{Architecture, DependencyOrigin, Resource, ResourceDependency};

/// Maps validated graphs onto domain architectures.
pub struct ArchitectureMapper<'a> {
    registry: &'a ResourceTypeRegistry,
}

impl<'a> ArchitectureMapper<'a> {
    pub fn new(registry: &'a ResourceTypeRegistry) -> Self {
        Self { registry }
    }

    /// Build an architecture from a graph and expand hidden dependencies.
    ///
    /// Resources follow the graph's document order; synthesized resources
    /// are placed directly after the resource that required them.
    pub fn map(
        &self,
        graph: Arc<Graph>,
        provider: CloudProvider,
        region: impl Into<String>,
    ) -> CoreResult<Architecture> {
        let mut architecture = Architecture::new(provider, region);
        info!(
            "Mapping {} diagram nodes to {} resources in '{}'",
            graph.len(),
            provider,
            architecture.region
        );

        for node in graph.nodes() {
            self.registry.resolve_for(&node.type_name, provider)?;

            let mut resource = Resource::new(&node.id, &node.type_name).with_name(node.display_name());
            resource.config = node.metadata.clone();
            if let Some(parent) = graph.parent_id(&node.id) {
                resource.parents.push(parent.to_string());
            }
            resource.children = graph
                .children_of(&node.id)
                .into_iter()
                .map(|child| child.id.clone())
                .collect();
            resource.depends_on = graph
                .dependencies_of(&node.id)
                .map(|edge| ResourceDependency {
                    target: edge.target.clone(),
                    dependency_type: edge.effective_dependency_type(),
                    origin: DependencyOrigin::Explicit,
                })
                .collect();

            architecture.resources.push(resource);
        }

        architecture.graph = Some(graph);
        let added = self.expand_hidden(&mut architecture)?;
        debug!("Hidden dependency expansion added {} resources", added);

        Ok(architecture)
    }

    /// Synthesize the implicit resources required by hidden dependency rules.
    ///
    /// Children that already exist, whether drawn by the user or added by an
    /// earlier expansion, count toward a rule's quantity, so running this
    /// twice adds nothing the second time. Returns the number of resources
    /// added.
    pub fn expand_hidden(&self, architecture: &mut Architecture) -> CoreResult<usize> {
        let parents: Vec<(String, String)> = architecture
            .resources
            .iter()
            .filter(|r| !r.synthesized)
            .map(|r| (r.id.clone(), r.type_name.clone()))
            .collect();

        let mut added = 0;
        for (parent_id, type_name) in parents {
            for rule in self.registry.hidden_dependencies(&type_name) {
                if !architecture.provider.matches(&rule.provider) {
                    continue;
                }
                added += self.apply_rule(architecture, &parent_id, rule)?;
            }
        }

        Ok(added)
    }

    fn apply_rule(
        &self,
        architecture: &mut Architecture,
        parent_id: &str,
        rule: &HiddenDependencyRule,
    ) -> CoreResult<usize> {
        let config = match architecture.resource(parent_id) {
            Some(parent) => parent.config.clone(),
            None => return Err(CoreError::InvalidArchitecture(format!("resource '{}' vanished", parent_id))),
        };

        if !rule.applies_to(&config)? {
            debug!(
                "Hidden dependency {} -> {} does not apply to '{}'",
                rule.parent_resource_type, rule.child_resource_type, parent_id
            );
            return Ok(0);
        }

        let wanted = rule.quantity(&config)? as usize;
        self.registry.resolve_required(&rule.child_resource_type)?;

        let mut have = Self::existing_children(architecture, parent_id, rule);
        if have >= wanted {
            return Ok(0);
        }

        let slug = rule.child_resource_type.to_lowercase();
        let mut insert_at = Self::insertion_point(architecture, parent_id);
        let mut index = 1;
        let mut added = 0;

        while have < wanted {
            let child_id = format!("{}-{}-{}", parent_id, slug, index);
            index += 1;
            if architecture.resource(&child_id).is_some() {
                continue;
            }

            debug!("Synthesizing {} '{}' for '{}'", rule.child_resource_type, child_id, parent_id);
            let mut child = Resource::new(&child_id, &rule.child_resource_type);
            child.synthesized = true;

            if let Some(parent) = architecture.resource_mut(parent_id) {
                if rule.is_attached {
                    parent.children.push(child_id.clone());
                } else {
                    parent.depends_on.push(ResourceDependency {
                        target: child_id.clone(),
                        dependency_type: DependencyType::DependsOn,
                        origin: DependencyOrigin::Hidden,
                    });
                }
            }
            if rule.is_attached {
                child.parents.push(parent_id.to_string());
            }

            architecture.resources.insert(insert_at, child);
            insert_at += 1;
            have += 1;
            added += 1;
        }

        Ok(added)
    }

    /// Children of the rule's type already linked to the parent.
    fn existing_children(architecture: &Architecture, parent_id: &str, rule: &HiddenDependencyRule) -> usize {
        let Some(parent) = architecture.resource(parent_id) else {
            return 0;
        };
        let is_child_type = |id: &str| {
            architecture
                .resource(id)
                .map_or(false, |r| r.type_name == rule.child_resource_type)
        };

        if rule.is_attached {
            parent.children.iter().filter(|id| is_child_type(id)).count()
        } else {
            parent.dependency_targets().filter(|id| is_child_type(id)).count()
        }
    }

    /// Index just past the parent and any resources already synthesized for it.
    fn insertion_point(architecture: &Architecture, parent_id: &str) -> usize {
        let resources = &architecture.resources;
        let Some(mut index) = resources.iter().position(|r| r.id == parent_id) else {
            return resources.len();
        };
        index += 1;
        while index < resources.len() && resources[index].synthesized {
            index += 1;
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::resource_type::{ResourceCategory, ResourceType};
    use stratus_diagram::{Diagram, DiagramEdge, DiagramNode, GraphBuilder};

    fn map(diagram: Diagram) -> CoreResult<Architecture> {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = Arc::new(GraphBuilder::build(diagram).unwrap());
        ArchitectureMapper::new(&registry).map(graph, CloudProvider::Aws, "us-east-1")
    }

    #[test]
    fn test_map_vpc_subnet() {
        let arch = map(Diagram::new()
            .node(DiagramNode::new("v1", "VPC").with_label("main"))
            .node(DiagramNode::new("s1", "Subnet").with_metadata("cidr", "10.0.1.0/24"))
            .edge(DiagramEdge::containment("e1", "v1", "s1")))
        .unwrap();

        assert_eq!(arch.len(), 2);
        let vpc = arch.resource("v1").unwrap();
        assert_eq!(vpc.name, "main");
        assert_eq!(vpc.children, vec!["s1"]);
        let subnet = arch.resource("s1").unwrap();
        assert_eq!(subnet.parent(), Some("v1"));
        assert_eq!(subnet.config_str("cidr"), Some("10.0.1.0/24"));
        assert!(arch.graph.is_some());
    }

    #[test]
    fn test_unknown_resource_type() {
        let err = map(Diagram::new().node(DiagramNode::new("x", "FooBar"))).unwrap_err();
        assert_eq!(err, CoreError::UnknownResourceType("FooBar".to_string()));
    }

    #[test]
    fn test_type_from_another_provider_is_unknown() {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = Arc::new(
            GraphBuilder::build(Diagram::new().node(DiagramNode::new("nat", "NATGateway"))).unwrap(),
        );

        let err = ArchitectureMapper::new(&registry)
            .map(graph, CloudProvider::Gcp, "us-central1")
            .unwrap_err();
        assert_eq!(err.code(), "UnknownResourceType");
        assert!(err.to_string().contains("NATGateway"));
    }

    #[test]
    fn test_nat_gateway_gets_one_elastic_ip() {
        let arch = map(Diagram::new()
            .node(DiagramNode::new("v1", "VPC"))
            .node(DiagramNode::new("nat", "NATGateway").with_parent("v1"))
            .node(DiagramNode::new("s1", "Subnet").with_parent("v1")))
        .unwrap();

        let eips: Vec<_> = arch.resources.iter().filter(|r| r.type_name == "ElasticIP").collect();
        assert_eq!(eips.len(), 1);
        assert_eq!(eips[0].id, "nat-elasticip-1");
        assert!(eips[0].synthesized);
        assert_eq!(eips[0].parent(), Some("nat"));
        assert!(arch.resource("nat").unwrap().children.contains(&"nat-elasticip-1".to_string()));
        assert_eq!(arch.resource_ids(), vec!["v1", "nat", "nat-elasticip-1", "s1"]);
    }

    #[test]
    fn test_drawn_elastic_ip_satisfies_rule() {
        let arch = map(Diagram::new()
            .node(DiagramNode::new("nat", "NATGateway"))
            .node(DiagramNode::new("ip", "ElasticIP").with_parent("nat")))
        .unwrap();

        assert_eq!(arch.len(), 2);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = Arc::new(
            GraphBuilder::build(Diagram::new().node(DiagramNode::new("nat", "NATGateway"))).unwrap(),
        );
        let mapper = ArchitectureMapper::new(&registry);
        let mut arch = mapper.map(graph, CloudProvider::Aws, "us-east-1").unwrap();
        let before = arch.clone();

        assert_eq!(mapper.expand_hidden(&mut arch).unwrap(), 0);
        assert_eq!(arch, before);
    }

    #[test]
    fn test_unattached_rule_links_by_dependency() {
        let arch = map(Diagram::new().node(DiagramNode::new("fn", "Lambda"))).unwrap();

        let lambda = arch.resource("fn").unwrap();
        assert_eq!(lambda.depends_on.len(), 1);
        assert_eq!(lambda.depends_on[0].target, "fn-iamrole-1");
        assert_eq!(lambda.depends_on[0].origin, DependencyOrigin::Hidden);
        assert!(arch.resource("fn-iamrole-1").unwrap().parents.is_empty());
    }

    #[test]
    fn test_conditional_quantity() {
        let arch = map(Diagram::new().node(
            DiagramNode::new("web", "EC2")
                .with_metadata("extra_volume_gb", 100)
                .with_metadata("extra_volume_count", 2),
        ))
        .unwrap();

        assert_eq!(
            arch.resource_ids(),
            vec!["web", "web-ebsvolume-1", "web-ebsvolume-2"]
        );
    }

    #[test]
    fn test_rules_for_other_providers_are_skipped() {
        let mut registry = ResourceTypeRegistry::new();
        registry.register(
            ResourceType::regional("NATGateway", ResourceCategory::Networking, "nat", CloudProvider::Gcp),
            vec![HiddenDependencyRule::new("aws", "NATGateway", "ElasticIP").attached()],
        );
        let graph = Arc::new(
            GraphBuilder::build(Diagram::new().node(DiagramNode::new("nat", "NATGateway"))).unwrap(),
        );
        let arch = ArchitectureMapper::new(&registry)
            .map(graph, CloudProvider::Gcp, "us-central1")
            .unwrap();

        assert_eq!(arch.len(), 1);
    }

    #[test]
    fn test_synthesized_id_collision_is_skipped() {
        let arch = map(Diagram::new()
            .node(DiagramNode::new("nat", "NATGateway"))
            .node(DiagramNode::new("nat-elasticip-1", "S3")))
        .unwrap();

        assert!(arch.resource("nat-elasticip-2").is_some());
        assert_eq!(arch.resource("nat-elasticip-1").unwrap().type_name, "S3");
    }
}
