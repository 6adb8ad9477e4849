//! Hidden dependency rules.

use serde::{Deserialize, Serialize};
use stratus_diagram::Metadata;

use crate::error::CoreResult;
use crate::expr::Expression;

fn default_quantity() -> String {
    "1".to_string()
}

/// An implicit resource that a parent type needs but users never draw,
/// e.g. the Elastic IP behind a NAT Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenDependencyRule {
    /// Provider the rule applies to; empty or `*` for all.
    #[serde(default)]
    pub provider: String,
    pub parent_resource_type: String,
    pub child_resource_type: String,
    /// Number of children to synthesize, evaluated against parent metadata.
    #[serde(default = "default_quantity")]
    pub quantity_expression: String,
    /// Optional predicate over parent metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Attached children hang off the parent by containment; others become
    /// dependencies of the parent.
    #[serde(default)]
    pub is_attached: bool,
}

impl HiddenDependencyRule {
    pub fn new(
        provider: impl Into<String>,
        parent_resource_type: impl Into<String>,
        child_resource_type: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            parent_resource_type: parent_resource_type.into(),
            child_resource_type: child_resource_type.into(),
            quantity_expression: default_quantity(),
            condition_expression: None,
            is_attached: false,
        }
    }

    pub fn attached(mut self) -> Self {
        self.is_attached = true;
        self
    }

    pub fn with_quantity(mut self, expression: impl Into<String>) -> Self {
        self.quantity_expression = expression.into();
        self
    }

    pub fn with_condition(mut self, expression: impl Into<String>) -> Self {
        self.condition_expression = Some(expression.into());
        self
    }

    /// Whether the rule fires for a parent with the given metadata.
    pub fn applies_to(&self, metadata: &Metadata) -> CoreResult<bool> {
        match self.condition_expression.as_deref().map(str::trim) {
            None | Some("") => Ok(true),
            Some(condition) => Expression::parse(condition)?.evaluate_bool(metadata),
        }
    }

    /// Number of children the parent should end up with.
    pub fn quantity(&self, metadata: &Metadata) -> CoreResult<u32> {
        let source = self.quantity_expression.trim();
        if source.is_empty() {
            return Ok(1);
        }
        Expression::parse(source)?.evaluate_quantity(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_defaults_from_json() {
        let rule: HiddenDependencyRule = serde_json::from_value(json!({
            "provider": "aws",
            "parentResourceType": "NATGateway",
            "childResourceType": "ElasticIP",
            "isAttached": true
        }))
        .unwrap();

        assert_eq!(rule.quantity_expression, "1");
        assert!(rule.applies_to(&Metadata::new()).unwrap());
        assert_eq!(rule.quantity(&Metadata::new()).unwrap(), 1);
    }

    #[test]
    fn test_condition_and_quantity() {
        let rule = HiddenDependencyRule::new("aws", "EC2", "EBSVolume")
            .attached()
            .with_condition("metadata.extra_volume_gb > 0")
            .with_quantity("metadata.extra_volume_count ?? 1");

        let mut md = Metadata::new();
        assert!(!rule.applies_to(&md).unwrap());

        md.insert("extra_volume_gb".into(), json!(50));
        md.insert("extra_volume_count".into(), json!(2));
        assert!(rule.applies_to(&md).unwrap());
        assert_eq!(rule.quantity(&md).unwrap(), 2);
    }
}
