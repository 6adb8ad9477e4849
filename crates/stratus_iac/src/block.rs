//! Engine-neutral configuration blocks.
//!
//! Mappers describe what to generate as a tree of [`CodeBlock`]s; an
//! [`EngineWriter`](crate::EngineWriter) decides how the tree is spelled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<AttrValue>),
    Map(IndexMap<String, AttrValue>),
    /// A raw expression emitted verbatim, e.g. `aws_vpc.main.id`.
    Reference(String),
}

impl AttrValue {
    pub fn reference(expression: impl Into<String>) -> Self {
        AttrValue::Reference(expression.into())
    }

    /// Convert resource metadata into an attribute value. `null` has no
    /// attribute representation.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        Some(match value {
            Value::Null => return None,
            Value::Bool(b) => AttrValue::Bool(*b),
            Value::Number(n) => AttrValue::Number(n.clone()),
            Value::String(s) => AttrValue::String(s.clone()),
            Value::Array(items) => AttrValue::List(items.iter().filter_map(Self::from_json).collect()),
            Value::Object(map) => AttrValue::Map(
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            ),
        })
    }

    /// True for values a writer spreads over several lines.
    pub fn is_multiline(&self) -> bool {
        matches!(self, AttrValue::Map(map) if !map.is_empty())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Number(n.into())
    }
}

impl From<u64> for AttrValue {
    fn from(n: u64) -> Self {
        AttrValue::Number(n.into())
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, AttrValue>> for AttrValue {
    fn from(map: IndexMap<String, AttrValue>) -> Self {
        AttrValue::Map(map)
    }
}

/// A typed, labelled configuration block such as
/// `resource "aws_vpc" "main" { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub block_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, AttrValue>,
    #[serde(default)]
    pub blocks: Vec<CodeBlock>,
}

impl CodeBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            labels: Vec::new(),
            attributes: IndexMap::new(),
            blocks: Vec::new(),
        }
    }

    pub fn resource(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new("resource").label(kind).label(name)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new("variable").label(name)
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self::new("output").label(name)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Add an attribute, keeping insertion order.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Add an attribute only when a value is present.
    pub fn attr_opt(mut self, key: impl Into<String>, value: Option<impl Into<AttrValue>>) -> Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a nested block.
    pub fn block(mut self, block: CodeBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// `<kind>.<name>` for two-label resource blocks.
    pub fn address(&self) -> Option<String> {
        match (self.block_type.as_str(), self.labels.as_slice()) {
            ("resource", [kind, name]) | ("data", [kind, name]) => Some(format!("{}.{}", kind, name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_builder_keeps_attribute_order() {
        let block = CodeBlock::resource("aws_vpc", "main")
            .attr("cidr_block", "10.0.0.0/16")
            .attr("enable_dns_support", true)
            .attr_opt("instance_tenancy", None::<String>);

        let keys: Vec<_> = block.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["cidr_block", "enable_dns_support"]);
        assert_eq!(block.address().as_deref(), Some("aws_vpc.main"));
    }

    #[test]
    fn test_from_json_drops_nulls() {
        let value = AttrValue::from_json(&json!({"Team": "core", "Owner": null, "Ports": [80, 443]})).unwrap();

        match value {
            AttrValue::Map(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map["Ports"], AttrValue::List(vec![80i64.into(), 443i64.into()]));
            }
            other => panic!("expected map, got {:?}", other),
        }
        assert!(AttrValue::from_json(&json!(null)).is_none());
    }
}
