//! Rule evaluation engine.
//!
//! The engine walks a diagram graph in document order and checks every node
//! whose type is registered against the constraints for that type. All
//! violations are collected; evaluation never stops at the first one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stratus_core::ResourceTypeRegistry;
use stratus_diagram::{DiagramNode, Graph};

use crate::constraint::{Constraint, ConstraintSet, ConstraintType};

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub resource_id: String,
    pub resource_type: String,
    pub constraint_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationError {
    fn new(node: &DiagramNode, constraint_type: ConstraintType, message: impl Into<String>) -> Self {
        Self {
            resource_id: node.id.clone(),
            resource_type: node.type_name.clone(),
            constraint_type: constraint_type.as_str().to_string(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.constraint_type, self.resource_id, self.message)
    }
}

/// Validates graphs against structural constraints.
pub struct RuleEngine<'a> {
    registry: &'a ResourceTypeRegistry,
}

impl<'a> RuleEngine<'a> {
    pub fn new(registry: &'a ResourceTypeRegistry) -> Self {
        Self { registry }
    }

    /// Validate a graph, returning every violation found.
    pub fn validate(&self, graph: &Graph, constraints: &ConstraintSet, region: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for node in graph.nodes() {
            if !self.registry.contains(&node.type_name) {
                debug!("Skipping '{}': type {} is not registered", node.id, node.type_name);
                continue;
            }

            for constraint in constraints.for_type(&node.type_name) {
                let Some(kind) = constraint.kind() else {
                    warn!(
                        "Skipping constraint {}: unknown type '{}'",
                        constraint.label(),
                        constraint.constraint_type
                    );
                    continue;
                };
                self.check(graph, node, constraint, kind, region, &mut errors);
            }
        }

        info!(
            "Validated {} nodes against {} constraints: {} violations",
            graph.len(),
            constraints.len(),
            errors.len()
        );
        errors
    }

    fn check(
        &self,
        graph: &Graph,
        node: &DiagramNode,
        constraint: &Constraint,
        kind: ConstraintType,
        region: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let value = constraint.constraint_value.trim();

        match kind {
            ConstraintType::RequiresParent => Self::check_requires_parent(graph, node, constraint, value, errors),
            ConstraintType::AllowedParent => Self::check_allowed_parent(graph, node, constraint, value, errors),
            ConstraintType::RequiresRegion => match value.to_ascii_lowercase().as_str() {
                "true" if region.trim().is_empty() => errors.push(
                    ValidationError::new(node, kind, format!("{} '{}' requires a region", node.type_name, node.id))
                        .expected("non-empty region")
                        .actual("none"),
                ),
                "true" | "false" => {}
                _ => skip(constraint, "expected true or false"),
            },
            ConstraintType::MaxChildren | ConstraintType::MinChildren => {
                Self::check_child_count(graph, node, constraint, kind, value, errors)
            }
            ConstraintType::AllowedDependencies | ConstraintType::ForbiddenDependencies => {
                Self::check_dependencies(graph, node, constraint, kind, value, errors)
            }
        }
    }

    fn check_requires_parent(
        graph: &Graph,
        node: &DiagramNode,
        constraint: &Constraint,
        value: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let kind = ConstraintType::RequiresParent;
        let allowed = match value.to_ascii_lowercase().as_str() {
            "false" => return,
            "" | "true" => None,
            _ => match parse_type_list(value) {
                Some(list) => Some(list),
                None => return skip(constraint, "expected a type name or JSON array"),
            },
        };

        match graph.parent_of(&node.id) {
            None => {
                let expected = allowed.as_ref().map_or_else(|| "any parent".to_string(), |l| l.join(", "));
                errors.push(
                    ValidationError::new(
                        node,
                        kind,
                        format!("{} '{}' must be placed inside {}", node.type_name, node.id, expected),
                    )
                    .expected(expected)
                    .actual("none"),
                );
            }
            Some(parent) => {
                if let Some(list) = allowed {
                    if !list.iter().any(|t| *t == parent.type_name) {
                        errors.push(
                            ValidationError::new(
                                node,
                                kind,
                                format!(
                                    "{} '{}' must be placed inside {}, found {} '{}'",
                                    node.type_name,
                                    node.id,
                                    list.join(" or "),
                                    parent.type_name,
                                    parent.id
                                ),
                            )
                            .expected(list.join(", "))
                            .actual(parent.type_name.clone()),
                        );
                    }
                }
            }
        }
    }

    fn check_allowed_parent(
        graph: &Graph,
        node: &DiagramNode,
        constraint: &Constraint,
        value: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(parent) = graph.parent_of(&node.id) else {
            return;
        };
        let Some(allowed) = parse_type_list(value) else {
            return skip(constraint, "expected a type name or JSON array");
        };

        if !allowed.iter().any(|t| *t == parent.type_name) {
            errors.push(
                ValidationError::new(
                    node,
                    ConstraintType::AllowedParent,
                    format!(
                        "{} '{}' cannot be placed inside {} '{}'",
                        node.type_name, node.id, parent.type_name, parent.id
                    ),
                )
                .expected(allowed.join(", "))
                .actual(parent.type_name.clone()),
            );
        }
    }

    fn check_child_count(
        graph: &Graph,
        node: &DiagramNode,
        constraint: &Constraint,
        kind: ConstraintType,
        value: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some((child_type, bound)) = parse_bound(value) else {
            return skip(constraint, "expected an integer or '<Type>:<n>'");
        };

        let actual = graph
            .children_of(&node.id)
            .into_iter()
            .filter(|c| child_type.map_or(true, |t| c.type_name == t))
            .count();
        let what = child_type.unwrap_or("child");

        let violated = match kind {
            ConstraintType::MaxChildren => actual > bound,
            _ => actual < bound,
        };
        if violated {
            let relation = if kind == ConstraintType::MaxChildren { "at most" } else { "at least" };
            errors.push(
                ValidationError::new(
                    node,
                    kind,
                    format!(
                        "{} '{}' must contain {} {} {} resources, found {}",
                        node.type_name, node.id, relation, bound, what, actual
                    ),
                )
                .expected(bound.to_string())
                .actual(actual.to_string()),
            );
        }
    }

    fn check_dependencies(
        graph: &Graph,
        node: &DiagramNode,
        constraint: &Constraint,
        kind: ConstraintType,
        value: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(entries) = parse_type_list(value) else {
            return skip(constraint, "expected a type name or JSON array");
        };

        for edge in graph.dependencies_of(&node.id) {
            let Some(target) = graph.node(&edge.target) else {
                continue;
            };
            let dependency_type = edge.effective_dependency_type();
            let listed = entries
                .iter()
                .any(|e| *e == target.type_name || e == dependency_type.as_str());

            let message = match (kind, listed) {
                (ConstraintType::AllowedDependencies, false) => format!(
                    "{} '{}' may not depend on {} '{}' ({})",
                    node.type_name, node.id, target.type_name, target.id, dependency_type
                ),
                (ConstraintType::ForbiddenDependencies, true) => format!(
                    "{} '{}' must not depend on {} '{}' ({})",
                    node.type_name, node.id, target.type_name, target.id, dependency_type
                ),
                _ => continue,
            };

            let expected = if kind == ConstraintType::AllowedDependencies {
                format!("one of {}", entries.join(", "))
            } else {
                format!("none of {}", entries.join(", "))
            };
            errors.push(
                ValidationError::new(node, kind, message)
                    .expected(expected)
                    .actual(target.type_name.clone()),
            );
        }
    }
}

fn skip(constraint: &Constraint, reason: &str) {
    warn!(
        "Skipping constraint {}: cannot use value '{}' ({})",
        constraint.label(),
        constraint.constraint_value,
        reason
    );
}

/// A JSON array of names, or a single bare name.
fn parse_type_list(value: &str) -> Option<Vec<String>> {
    let value = value.trim();
    if value.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(value).ok();
    }
    if value.is_empty() || value.contains(char::is_whitespace) {
        return None;
    }
    Some(vec![value.to_string()])
}

/// `"<n>"` or `"<Type>:<n>"`.
fn parse_bound(value: &str) -> Option<(Option<&str>, usize)> {
    match value.split_once(':') {
        Some((child_type, n)) => {
            let child_type = child_type.trim();
            if child_type.is_empty() {
                return None;
            }
            Some((Some(child_type), n.trim().parse().ok()?))
        }
        None => Some((None, value.parse().ok()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_diagram::{DependencyType, Diagram, DiagramEdge, DiagramNode, GraphBuilder};

    fn validate(diagram: Diagram, constraints: ConstraintSet, region: &str) -> Vec<ValidationError> {
        let registry = ResourceTypeRegistry::with_defaults();
        let graph = GraphBuilder::build(diagram).unwrap();
        RuleEngine::new(&registry).validate(&graph, &constraints, region)
    }

    fn vpc_with_subnet() -> Diagram {
        Diagram::new()
            .node(DiagramNode::new("v1", "VPC"))
            .node(DiagramNode::new("s1", "Subnet").with_metadata("cidr", "10.0.1.0/24"))
            .edge(DiagramEdge::containment("e1", "v1", "s1"))
    }

    #[test]
    fn test_requires_parent_satisfied() {
        let constraints = ConstraintSet::new().with(Constraint::requires_parent("Subnet", &["VPC"]));
        assert!(validate(vpc_with_subnet(), constraints, "us-east-1").is_empty());
    }

    #[test]
    fn test_requires_parent_missing() {
        let diagram = Diagram::new()
            .node(DiagramNode::new("v1", "VPC"))
            .node(DiagramNode::new("s1", "Subnet"));
        let constraints = ConstraintSet::new().with(Constraint::requires_parent("Subnet", &["VPC"]));

        let errors = validate(diagram, constraints, "us-east-1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].resource_id, "s1");
        assert_eq!(errors[0].constraint_type, "requires_parent");
        assert_eq!(errors[0].actual.as_deref(), Some("none"));
    }

    #[test]
    fn test_requires_parent_wrong_type() {
        let diagram = Diagram::new()
            .node(DiagramNode::new("web", "EC2"))
            .node(DiagramNode::new("s1", "Subnet").with_parent("web"));
        let constraints = ConstraintSet::new().with(Constraint::requires_parent("Subnet", &["VPC"]));

        let errors = validate(diagram, constraints, "us-east-1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].actual.as_deref(), Some("EC2"));
    }

    #[test]
    fn test_requires_parent_any_and_disabled() {
        let diagram = Diagram::new().node(DiagramNode::new("s1", "Subnet"));
        let any = ConstraintSet::new().with(Constraint::new("Subnet", ConstraintType::RequiresParent, "true"));
        let off = ConstraintSet::new().with(Constraint::new("Subnet", ConstraintType::RequiresParent, "false"));

        assert_eq!(validate(diagram.clone(), any, "").len(), 1);
        assert!(validate(diagram, off, "").is_empty());
    }

    #[test]
    fn test_allowed_parent() {
        let diagram = Diagram::new()
            .node(DiagramNode::new("q", "SQS"))
            .node(DiagramNode::new("web", "EC2").with_parent("q"))
            .node(DiagramNode::new("free", "EC2"));
        let constraints = ConstraintSet::new().with(Constraint::allowed_parent("EC2", &["VPC", "Subnet"]));

        let errors = validate(diagram, constraints, "us-east-1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].resource_id, "web");
        assert_eq!(errors[0].expected.as_deref(), Some("VPC, Subnet"));
    }

    #[test]
    fn test_requires_region() {
        let constraints = ConstraintSet::new().with(Constraint::new("VPC", ConstraintType::RequiresRegion, "true"));
        assert_eq!(validate(vpc_with_subnet(), constraints.clone(), "  ").len(), 1);
        assert!(validate(vpc_with_subnet(), constraints, "eu-west-1").is_empty());
    }

    #[test]
    fn test_child_bounds() {
        let diagram = vpc_with_subnet()
            .node(DiagramNode::new("s2", "Subnet").with_parent("v1"))
            .node(DiagramNode::new("sg", "SecurityGroup").with_parent("v1"));

        let max = ConstraintSet::new().with(Constraint::new("VPC", ConstraintType::MaxChildren, "2"));
        let errors = validate(diagram.clone(), max, "us-east-1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].expected.as_deref(), Some("2"));
        assert_eq!(errors[0].actual.as_deref(), Some("3"));

        let typed = ConstraintSet::new().with(Constraint::new("VPC", ConstraintType::MaxChildren, "Subnet:2"));
        assert!(validate(diagram.clone(), typed, "us-east-1").is_empty());

        let min = ConstraintSet::new().with(Constraint::new("VPC", ConstraintType::MinChildren, "SecurityGroup:2"));
        assert_eq!(validate(diagram, min, "us-east-1").len(), 1);
    }

    #[test]
    fn test_dependency_lists() {
        let diagram = Diagram::new()
            .node(DiagramNode::new("fn", "Lambda"))
            .node(DiagramNode::new("bucket", "S3"))
            .node(DiagramNode::new("db", "RDS"))
            .edge(DiagramEdge::dependency("d1", "fn", "bucket", DependencyType::Uses))
            .edge(DiagramEdge::dependency("d2", "fn", "db", DependencyType::ConnectsTo));

        let allowed = ConstraintSet::new().with(Constraint::new(
            "Lambda",
            ConstraintType::AllowedDependencies,
            r#"["S3", "DynamoDB"]"#,
        ));
        let errors = validate(diagram.clone(), allowed, "us-east-1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].actual.as_deref(), Some("RDS"));

        let by_edge_type = ConstraintSet::new().with(Constraint::new(
            "Lambda",
            ConstraintType::ForbiddenDependencies,
            "connects_to",
        ));
        assert_eq!(validate(diagram, by_edge_type, "us-east-1").len(), 1);
    }

    #[test]
    fn test_unknown_and_malformed_constraints_are_skipped() {
        let constraints = ConstraintSet::new()
            .with(Constraint {
                id: None,
                resource_type: "Subnet".to_string(),
                constraint_type: "must_be_blue".to_string(),
                constraint_value: "true".to_string(),
            })
            .with(Constraint::new("VPC", ConstraintType::MaxChildren, "lots"))
            .with(Constraint::new("Subnet", ConstraintType::AllowedParent, "[not json"));

        assert!(validate(vpc_with_subnet(), constraints, "us-east-1").is_empty());
    }

    #[test]
    fn test_unregistered_types_are_skipped() {
        let diagram = Diagram::new().node(DiagramNode::new("x", "FooBar"));
        let constraints = ConstraintSet::new().with(Constraint::requires_parent("FooBar", &[]));
        assert!(validate(diagram, constraints, "us-east-1").is_empty());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_type_list("VPC"), Some(vec!["VPC".to_string()]));
        assert_eq!(parse_type_list(r#"["A","B"]"#), Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(parse_type_list("two words"), None);
        assert_eq!(parse_bound("3"), Some((None, 3)));
        assert_eq!(parse_bound("Subnet: 4"), Some((Some("Subnet"), 4)));
        assert_eq!(parse_bound(":4"), None);
        assert_eq!(parse_bound("-1"), None);
    }
}
