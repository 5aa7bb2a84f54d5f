//! Dependency graph management using `petgraph`.
//!
//! Builds a directed acyclic graph from the references between resources
//! and resolves the order in which the backend can create them.

use std::collections::HashMap;

use checkerstack_common::error::{Result, StackError};
use checkerstack_common::types::LogicalId;
use petgraph::graph::NodeIndex;

use crate::resource::Resource;

/// A dependency graph of resources.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<LogicalId, ()>,
    /// Node lookup by logical id.
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Builds the graph of a resource list.
    ///
    /// Every resource becomes a node; every property reference and
    /// explicit `depends_on` becomes an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource depends on an id not in the list, or
    /// on itself.
    pub fn from_resources(resources: &[Resource]) -> Result<Self> {
        let mut graph = Self::new();
        for resource in resources {
            let _ = graph.add_resource(&resource.logical_id);
        }
        for resource in resources {
            let dependent = graph.add_resource(&resource.logical_id);
            for dep in resource.dependencies()? {
                if dep == resource.logical_id.as_str() {
                    return Err(StackError::CyclicDependency { involving: dep });
                }
                let dependency = graph.node(&dep).ok_or_else(|| StackError::NotFound {
                    kind: "resource",
                    id: format!("{dep} (referenced by {})", resource.logical_id),
                })?;
                graph.add_dependency(dependent, dependency);
            }
        }
        tracing::debug!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "dependency graph built"
        );
        Ok(graph)
    }

    /// Adds a resource node, returning the existing node if already present.
    pub fn add_resource(&mut self, id: &LogicalId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(id.as_str()) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        let _ = self.nodes.insert(id.as_str().to_string(), idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Returns a topological ordering of resources for provisioning.
    ///
    /// Dependencies appear before the resources that depend on them.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<LogicalId>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(StackError::CyclicDependency {
                involving: self
                    .graph
                    .node_weight(cycle.node_id())
                    .map_or_else(String::new, ToString::to_string),
            }),
        }
    }

    /// Returns true if `before` must be provisioned before `after`, i.e.
    /// `after` depends on `before` directly or transitively.
    #[must_use]
    pub fn precedes(&self, before: &str, after: &str) -> bool {
        match (self.node(before), self.node(after)) {
            (Some(b), Some(a)) if a != b => {
                petgraph::algo::has_path_connecting(&self.graph, b, a, None)
            }
            _ => false,
        }
    }

    /// Direct dependencies of a resource, sorted by logical id.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<LogicalId> {
        let Some(idx) = self.node(id) else {
            return Vec::new();
        };
        let mut deps: Vec<LogicalId> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        deps.sort();
        deps
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn node(&self, id: &str) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
