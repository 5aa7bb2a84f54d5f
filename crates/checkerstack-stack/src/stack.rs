//! The assembled resource graph handed to the provisioning backend.

use checkerstack_common::error::Result;
use checkerstack_common::types::LogicalId;

use crate::graph::DependencyGraph;
use crate::intrinsic::Value;
use crate::resource::Resource;

/// A named value exposed after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Output name.
    pub logical_id: LogicalId,
    /// Value resolved by the backend.
    pub value: Value,
    /// Optional description shown by the backend.
    pub description: Option<String>,
}

/// A complete stack: resources in declaration order plus outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Stack name.
    pub name: String,
    /// Template description.
    pub description: String,
    /// Resources in declaration order.
    pub resources: Vec<Resource>,
    /// Outputs in declaration order.
    pub outputs: Vec<Output>,
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Looks up a resource by logical id.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.logical_id.as_str() == logical_id)
    }

    /// Resources of a backend type, in declaration order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type() == resource_type)
    }

    /// Looks up an output by name.
    #[must_use]
    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|o| o.logical_id.as_str() == logical_id)
    }

    /// Builds the dependency graph of the stack's resources.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource references an undeclared id.
    pub fn dependency_graph(&self) -> Result<DependencyGraph> {
        DependencyGraph::from_resources(&self.resources)
    }

    /// Logical ids in an order where every resource follows the
    /// resources it depends on.
    ///
    /// # Errors
    ///
    /// Returns an error on undeclared references or a cycle.
    pub fn deployment_order(&self) -> Result<Vec<LogicalId>> {
        self.dependency_graph()?.resolve_order()
    }
}
