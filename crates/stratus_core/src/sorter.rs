//! Provisioning order for architectures.
//!
//! Resources are ordered with Kahn's algorithm over the merged provisioning
//! graph: containment parents come before their children and prerequisites
//! come before the resources that depend on them. Among resources that are
//! ready at the same time the one with the lowest original index wins, which
//! keeps the output stable for identical input.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::resource::Architecture;

/// A directed provisioning edge: `before` must exist before `after`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProvisioningEdge {
    pub before: String,
    pub after: String,
}

/// Every provisioning edge of an architecture, deduplicated, in discovery order.
pub fn provisioning_edges(architecture: &Architecture) -> CoreResult<Vec<ProvisioningEdge>> {
    let known: HashSet<&str> = architecture.resources.iter().map(|r| r.id.as_str()).collect();
    let check = |from: &str, reference: &str, relation: &str| -> CoreResult<()> {
        if known.contains(reference) {
            Ok(())
        } else {
            Err(CoreError::InvalidArchitecture(format!(
                "resource '{}' references unknown {} '{}'",
                from, relation, reference
            )))
        }
    };

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    let mut push = |before: &str, after: &str| {
        let edge = ProvisioningEdge {
            before: before.to_string(),
            after: after.to_string(),
        };
        if seen.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    for resource in &architecture.resources {
        for parent in &resource.parents {
            check(&resource.id, parent, "parent")?;
            push(parent, &resource.id);
        }
        for child in &resource.children {
            check(&resource.id, child, "child")?;
            push(&resource.id, child);
        }
        for dependency in &resource.depends_on {
            check(&resource.id, &dependency.target, "dependency")?;
            push(&dependency.target, &resource.id);
        }
    }

    Ok(edges)
}

/// Orders architecture resources for safe provisioning.
pub struct DependencySorter;

impl DependencySorter {
    /// Reorder the resources topologically and mark the architecture ordered.
    pub fn sort(mut architecture: Architecture) -> CoreResult<Architecture> {
        let order = Self::order(&architecture)?;

        let mut slots: Vec<_> = architecture.resources.drain(..).map(Some).collect();
        architecture.resources = order.into_iter().filter_map(|i| slots[i].take()).collect();
        architecture.ordered = true;

        Ok(architecture)
    }

    /// Provisioning order as indexes into the current resource list.
    pub fn order(architecture: &Architecture) -> CoreResult<Vec<usize>> {
        let resources = &architecture.resources;
        let index: HashMap<&str, usize> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        let edges = provisioning_edges(architecture)?;
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
        let mut in_degree = vec![0usize; resources.len()];

        for edge in &edges {
            let (before, after) = (index[edge.before.as_str()], index[edge.after.as_str()]);
            successors[before].push(after);
            predecessors[after].push(before);
            in_degree[after] += 1;
        }

        info!(
            "Sorting {} resources over {} provisioning edges",
            resources.len(),
            edges.len()
        );

        let mut ready: BTreeSet<usize> = (0..resources.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(resources.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &succ in &successors[next] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() < resources.len() {
            let cycle = Self::find_cycle(&in_degree, &predecessors);
            let names: Vec<String> = cycle.iter().map(|&i| resources[i].id.clone()).collect();
            debug!("Dependency cycle detected: {}", names.join(" -> "));
            return Err(CoreError::CyclicDependency {
                resource: names.first().cloned().unwrap_or_default(),
                cycle: names,
            });
        }

        Ok(order)
    }

    /// Walk "depends on" links among the unsorted resources until one repeats.
    ///
    /// Every unsorted resource still has an unsorted predecessor, so the walk
    /// always closes. The returned path starts and ends on the same resource.
    fn find_cycle(in_degree: &[usize], predecessors: &[Vec<usize>]) -> Vec<usize> {
        let remaining = |i: usize| in_degree[i] > 0;
        let Some(start) = (0..in_degree.len()).find(|&i| remaining(i)) else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut position = HashMap::from([(start, 0usize)]);
        let mut current = start;

        loop {
            let Some(next) = predecessors[current].iter().copied().filter(|&p| remaining(p)).min() else {
                return path;
            };
            if let Some(&at) = position.get(&next) {
                let mut cycle = path.split_off(at);
                cycle.push(next);
                return cycle;
            }
            position.insert(next, path.len());
            path.push(next);
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CloudProvider;
    use crate::resource::Resource;
    use stratus_diagram::DependencyType;

    fn arch(resources: Vec<Resource>) -> Architecture {
        resources
            .into_iter()
            .fold(Architecture::new(CloudProvider::Aws, "us-east-1"), Architecture::with_resource)
    }

    #[test]
    fn test_prerequisites_come_first() {
        let sorted = DependencySorter::sort(arch(vec![
            Resource::new("fn", "Lambda").depending_on("bucket", DependencyType::Uses),
            Resource::new("bucket", "S3"),
        ]))
        .unwrap();

        assert_eq!(sorted.resource_ids(), vec!["bucket", "fn"]);
        assert!(sorted.ordered);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let sorted = DependencySorter::sort(arch(vec![
            Resource::new("c", "S3"),
            Resource::new("a", "S3"),
            Resource::new("b", "S3"),
        ]))
        .unwrap();

        assert_eq!(sorted.resource_ids(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_containment_parent_first() {
        let mut subnet = Resource::new("s1", "Subnet");
        subnet.parents.push("v1".to_string());
        let mut vpc = Resource::new("v1", "VPC");
        vpc.children.push("s1".to_string());

        let sorted = DependencySorter::sort(arch(vec![subnet, vpc])).unwrap();
        assert_eq!(sorted.resource_ids(), vec!["v1", "s1"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let err = DependencySorter::sort(arch(vec![
            Resource::new("A", "S3").depending_on("B", DependencyType::DependsOn),
            Resource::new("B", "S3").depending_on("A", DependencyType::DependsOn),
        ]))
        .unwrap_err();

        match err {
            CoreError::CyclicDependency { resource, cycle } => {
                assert!(resource == "A" || resource == "B");
                assert_eq!(cycle, vec!["A", "B", "A"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_path_excludes_tail() {
        let err = DependencySorter::sort(arch(vec![
            Resource::new("x", "S3").depending_on("y", DependencyType::DependsOn),
            Resource::new("y", "S3").depending_on("z", DependencyType::DependsOn),
            Resource::new("z", "S3").depending_on("y", DependencyType::DependsOn),
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            CoreError::CyclicDependency {
                resource: "y".to_string(),
                cycle: vec!["y".to_string(), "z".to_string(), "y".to_string()],
            }
        );
    }

    #[test]
    fn test_dangling_reference() {
        let err = DependencySorter::sort(arch(vec![
            Resource::new("fn", "Lambda").depending_on("ghost", DependencyType::Uses),
        ]))
        .unwrap_err();

        assert!(matches!(err, CoreError::InvalidArchitecture(_)));
    }

    #[test]
    fn test_duplicate_edges_are_merged() {
        let mut subnet = Resource::new("s1", "Subnet").depending_on("v1", DependencyType::DependsOn);
        subnet.parents.push("v1".to_string());
        let mut vpc = Resource::new("v1", "VPC");
        vpc.children.push("s1".to_string());

        let edges = provisioning_edges(&arch(vec![vpc, subnet])).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].before, "v1");
    }
}
