//! Structural constraints and constraint sets.
//!
//! Constraints are persisted rule content: each one names a resource type, a
//! constraint type and a string-encoded value. They are loaded from YAML or
//! JSON files, or fetched per request from a [`ConstraintStore`].

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{PolicyError, PolicyResult};
use crate::store::ConstraintStore;

/// Known constraint types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    RequiresParent,
    AllowedParent,
    RequiresRegion,
    MaxChildren,
    MinChildren,
    AllowedDependencies,
    ForbiddenDependencies,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintType::RequiresParent => "requires_parent",
            ConstraintType::AllowedParent => "allowed_parent",
            ConstraintType::RequiresRegion => "requires_region",
            ConstraintType::MaxChildren => "max_children",
            ConstraintType::MinChildren => "min_children",
            ConstraintType::AllowedDependencies => "allowed_dependencies",
            ConstraintType::ForbiddenDependencies => "forbidden_dependencies",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "requires_parent" => Some(ConstraintType::RequiresParent),
            "allowed_parent" => Some(ConstraintType::AllowedParent),
            "requires_region" => Some(ConstraintType::RequiresRegion),
            "max_children" => Some(ConstraintType::MaxChildren),
            "min_children" => Some(ConstraintType::MinChildren),
            "allowed_dependencies" => Some(ConstraintType::AllowedDependencies),
            "forbidden_dependencies" => Some(ConstraintType::ForbiddenDependencies),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural constraint on a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub resource_type: String,
    /// Kept as a string so unknown types survive loading.
    pub constraint_type: String,
    /// String-encoded value; non-string YAML/JSON values are stored as JSON text.
    #[serde(default, deserialize_with = "value_as_string")]
    pub constraint_value: String,
}

fn value_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Constraint {
    pub fn new(
        resource_type: impl Into<String>,
        constraint_type: ConstraintType,
        constraint_value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            resource_type: resource_type.into(),
            constraint_type: constraint_type.as_str().to_string(),
            constraint_value: constraint_value.into(),
        }
    }

    /// Require a containment parent, optionally of the given types.
    pub fn requires_parent(resource_type: impl Into<String>, parents: &[&str]) -> Self {
        let value = match parents {
            [] => String::new(),
            [single] => single.to_string(),
            many => type_list(many),
        };
        Self::new(resource_type, ConstraintType::RequiresParent, value)
    }

    pub fn allowed_parent(resource_type: impl Into<String>, parents: &[&str]) -> Self {
        Self::new(resource_type, ConstraintType::AllowedParent, type_list(parents))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parsed constraint type, `None` when unknown.
    pub fn kind(&self) -> Option<ConstraintType> {
        ConstraintType::parse(&self.constraint_type)
    }

    /// Identifier used in log messages.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}/{}", self.resource_type, self.constraint_type),
        }
    }
}

fn type_list(names: &[&str]) -> String {
    serde_json::Value::from(names.iter().map(|n| n.to_string()).collect::<Vec<_>>()).to_string()
}

/// On-disk layouts accepted by the loaders.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConstraintDocument {
    List(Vec<Constraint>),
    Set { constraints: Vec<Constraint> },
}

impl ConstraintDocument {
    fn into_constraints(self) -> Vec<Constraint> {
        match self {
            ConstraintDocument::List(list) => list,
            ConstraintDocument::Set { constraints } => constraints,
        }
    }
}

/// An ordered, request-scoped collection of constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint to the set.
    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.add(constraint);
        self
    }

    /// Append every constraint of another set.
    pub fn extend(&mut self, other: ConstraintSet) {
        self.constraints.extend(other.constraints);
    }

    /// Constraints for a resource type, in set order.
    pub fn for_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.resource_type == resource_type)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Fetch the constraints for the given resource types from a store.
    ///
    /// Each type is queried once, in first-seen order. A store failure aborts
    /// the fetch.
    pub async fn fetch<'a, I>(store: &dyn ConstraintStore, type_names: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut set = Self::new();

        for name in type_names {
            if !seen.insert(name) {
                continue;
            }
            let found = store.find_constraints_by_resource_type(name).await?;
            debug!("Fetched {} constraints for {}", found.len(), name);
            set.constraints.extend(found);
        }

        Ok(set)
    }

    /// Parse a YAML document (a list, or a map with a `constraints` list).
    pub fn from_yaml_str(yaml: &str) -> PolicyResult<Self> {
        let document: ConstraintDocument = serde_yaml::from_str(yaml)?;
        Ok(Self {
            constraints: document.into_constraints(),
        })
    }

    /// Parse a JSON document (a list, or an object with a `constraints` list).
    pub fn from_json_str(json: &str) -> PolicyResult<Self> {
        let document: ConstraintDocument = serde_json::from_str(json)?;
        Ok(Self {
            constraints: document.into_constraints(),
        })
    }

    /// Load a constraint file, choosing the format by extension.
    pub fn from_file(path: &Path) -> PolicyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(PolicyError::InvalidConstraint {
                source_name: path.display().to_string(),
                message: "expected a .yaml, .yml or .json file".to_string(),
            }),
        }
    }

    /// Load every constraint file below a directory, in file name order.
    pub fn from_directory(path: &Path) -> PolicyResult<Self> {
        let mut set = Self::new();

        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
        {
            let file = entry.path();
            if file
                .extension()
                .map_or(false, |e| e == "yaml" || e == "yml" || e == "json")
            {
                let loaded = Self::from_file(file)?;
                debug!("Loaded {} constraints from {}", loaded.len(), file.display());
                set.extend(loaded);
            }
        }

        info!("Loaded {} constraints from {}", set.len(), path.display());
        Ok(set)
    }

    /// Baseline constraints for the built-in AWS catalog.
    pub fn aws_defaults() -> Self {
        let mut set = Self::new();

        set.add(Constraint::new("VPC", ConstraintType::RequiresRegion, "true").with_id("vpc-region"));
        set.add(Constraint::requires_parent("Subnet", &["VPC"]).with_id("subnet-in-vpc"));
        set.add(Constraint::requires_parent("InternetGateway", &["VPC"]).with_id("igw-in-vpc"));
        set.add(Constraint::new("VPC", ConstraintType::MaxChildren, "InternetGateway:1").with_id("vpc-single-igw"));
        set.add(Constraint::requires_parent("RouteTable", &["VPC"]).with_id("route-table-in-vpc"));
        set.add(Constraint::requires_parent("SecurityGroup", &["VPC"]).with_id("sg-in-vpc"));
        set.add(Constraint::allowed_parent("NATGateway", &["VPC", "Subnet"]).with_id("nat-placement"));
        set.add(Constraint::allowed_parent("EC2", &["VPC", "Subnet"]).with_id("ec2-placement"));
        set.add(Constraint::allowed_parent("RDS", &["VPC", "Subnet"]).with_id("rds-placement"));
        set.add(Constraint::allowed_parent("LoadBalancer", &["VPC", "Subnet"]).with_id("lb-placement"));
        set.add(Constraint::allowed_parent("EBSVolume", &["EC2"]).with_id("ebs-on-ec2"));
        set.add(Constraint::allowed_parent("ElasticIP", &["NATGateway", "EC2"]).with_id("eip-attachment"));
        set.add(
            Constraint::new("S3", ConstraintType::ForbiddenDependencies, r#"["EC2"]"#)
                .with_id("s3-no-compute-deps"),
        );

        set
    }
}
