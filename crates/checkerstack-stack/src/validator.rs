//! Static analysis of an assembled stack.
//!
//! Checks for duplicate names, undefined references, cycles, required
//! provisioning order, and public exposure before the stack is handed to
//! the backend.

use std::collections::HashSet;

use checkerstack_common::constants::APIGATEWAY_PRINCIPAL;
use checkerstack_common::error::{Result, StackError};

use crate::graph::DependencyGraph;
use crate::stack::Stack;

/// Validates a stack for internal consistency.
///
/// # Checks performed
///
/// 1. No duplicate resource or output names.
/// 2. Every reference (resources and outputs) names a declared resource.
/// 3. The resource graph is acyclic.
/// 4. Every function behind a gateway integration has an API Gateway
///    invoke permission ordered before the gateway itself.
/// 5. Nothing is opened to the public: buckets block public access and
///    no grant names a wildcard principal.
///
/// # Errors
///
/// Returns an error describing the first failed check.
pub fn validate(stack: &Stack) -> Result<()> {
    tracing::info!(stack = %stack.name, resources = stack.resources.len(), "validating stack");
    check_duplicate_names(stack)?;
    let graph = stack.dependency_graph()?;
    check_output_references(stack)?;
    let _ = graph.resolve_order()?;
    check_invoke_before_gateway(stack, &graph)?;
    check_no_public_access(stack)?;
    Ok(())
}

fn check_duplicate_names(stack: &Stack) -> Result<()> {
    let mut seen = HashSet::new();
    for resource in &stack.resources {
        if !seen.insert(resource.logical_id.as_str()) {
            return Err(StackError::Config {
                message: format!("duplicate resource name: \"{}\"", resource.logical_id),
            });
        }
    }
    let mut seen = HashSet::new();
    for output in &stack.outputs {
        if !seen.insert(output.logical_id.as_str()) {
            return Err(StackError::Config {
                message: format!("duplicate output name: \"{}\"", output.logical_id),
            });
        }
    }
    Ok(())
}

fn check_output_references(stack: &Stack) -> Result<()> {
    for output in &stack.outputs {
        for target in output.value.references() {
            if stack.resource(&target).is_none() {
                return Err(StackError::NotFound {
                    kind: "resource",
                    id: format!("{target} (referenced by output {})", output.logical_id),
                });
            }
        }
    }
    Ok(())
}

fn check_invoke_before_gateway(stack: &Stack, graph: &DependencyGraph) -> Result<()> {
    for integration in &stack.resources {
        let Some(props) = integration.properties.as_integration() else {
            continue;
        };
        let Some(function) = props.target_function() else {
            continue;
        };
        let api_refs = props.api_id.references();
        for api in &api_refs {
            let authorized = stack.resources.iter().any(|r| {
                r.properties.as_permission().is_some_and(|p| {
                    p.principal == APIGATEWAY_PRINCIPAL
                        && p.function_name.references().contains(function.as_str())
                        && graph.precedes(r.logical_id.as_str(), api)
                })
            });
            if !authorized {
                return Err(StackError::Ordering {
                    before: format!("API Gateway invoke permission on {function}"),
                    after: api.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_no_public_access(stack: &Stack) -> Result<()> {
    for resource in &stack.resources {
        if let Some(bucket) = resource.properties.as_bucket() {
            if !bucket.public_access_block_configuration.is_fully_blocked() {
                return Err(StackError::PermissionDenied {
                    message: format!("bucket {} allows public access", resource.logical_id),
                });
            }
        }
        if let Some(permission) = resource.properties.as_permission() {
            if permission.principal == "*" {
                return Err(StackError::PermissionDenied {
                    message: format!("{} grants invoke to any principal", resource.logical_id),
                });
            }
        }
        if let Some(policy) = resource.properties.as_policy() {
            if policy.policy_document.statement.iter().any(|s| s.principal.is_some()) {
                return Err(StackError::PermissionDenied {
                    message: format!(
                        "identity policy {} must not name a principal",
                        resource.logical_id
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkerstack_common::types::LogicalId;

    use crate::intrinsic::Value;
    use crate::resource::gateway::{Cors, HttpApiProps, IntegrationProps};
    use crate::resource::iam::invoke_permission;
    use crate::resource::queue::QueueProps;
    use crate::resource::storage::{BucketProps, PublicAccessBlock};
    use crate::resource::{Properties, Resource};
    use crate::stack::Output;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    fn queue(name: &str) -> Resource {
        Resource::new(id(name), Properties::Queue(QueueProps::named(Value::literal(name))))
    }

    /// Gateway, integration, and a stand-in function, without permission.
    fn gateway_stack() -> Stack {
        let mut stack = Stack::new("Test", "test");
        stack.resources.push(queue("Handler"));
        stack.resources.push(Resource::new(
            id("Api"),
            Properties::HttpApi(HttpApiProps::new("api", "d", Cors::permissive())),
        ));
        stack.resources.push(Resource::new(
            id("Integration"),
            Properties::Integration(IntegrationProps::lambda_proxy(&id("Api"), &id("Handler"))),
        ));
        stack
    }

    fn invoke(name: &str, principal: &str) -> Resource {
        Resource::new(
            id(name),
            Properties::Permission(invoke_permission(
                &id("Handler"),
                principal,
                Value::literal("arn"),
            )),
        )
    }

    #[test]
    fn validate_empty_stack_succeeds() {
        assert!(validate(&Stack::new("Empty", "")).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_resources() {
        let mut stack = Stack::new("Dup", "");
        stack.resources.push(queue("TaskQueue"));
        stack.resources.push(queue("TaskQueue"));
        let err = validate(&stack).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate resource name"), "got: {err}");
    }

    #[test]
    fn validate_rejects_duplicate_outputs() {
        let mut stack = Stack::new("Dup", "");
        stack.resources.push(queue("TaskQueue"));
        for _ in 0..2 {
            stack.outputs.push(Output {
                logical_id: id("QueueUrl"),
                value: Value::reference(&id("TaskQueue")),
                description: None,
            });
        }
        let err = validate(&stack).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate output name"), "got: {err}");
    }

    #[test]
    fn validate_rejects_dangling_output() {
        let mut stack = Stack::new("Dangling", "");
        stack.outputs.push(Output {
            logical_id: id("QueueUrl"),
            value: Value::reference(&id("TaskQueue")),
            description: None,
        });
        assert!(matches!(
            validate(&stack),
            Err(StackError::NotFound { kind: "resource", .. })
        ));
    }

    #[test]
    fn validate_rejects_cycles() {
        let mut stack = Stack::new("Cycle", "");
        stack.resources.push(queue("A").depends_on(&id("B")));
        stack.resources.push(queue("B").depends_on(&id("A")));
        assert!(matches!(
            validate(&stack),
            Err(StackError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn validate_rejects_self_reference() {
        let queue_id = id("A");
        let mut stack = Stack::new("SelfRef", "");
        stack.resources.push(
            Resource::new(
                queue_id.clone(),
                Properties::Queue(QueueProps::named(Value::reference(&queue_id))),
            )
            .depends_on(&queue_id),
        );
        assert!(matches!(
            validate(&stack),
            Err(StackError::CyclicDependency { involving }) if involving == "A"
        ));
    }

    #[test]
    fn validate_rejects_self_reference_through_property() {
        let queue_id = id("A");
        let mut stack = Stack::new("SelfRef", "");
        stack.resources.push(Resource::new(
            queue_id.clone(),
            Properties::Queue(QueueProps::named(Value::get_att(&queue_id, "QueueName"))),
        ));
        assert!(matches!(
            validate(&stack),
            Err(StackError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn validate_requires_invoke_permission() {
        let err = validate(&gateway_stack()).expect_err("missing permission");
        assert!(matches!(err, StackError::Ordering { .. }), "got: {err}");
    }

    #[test]
    fn validate_requires_permission_before_gateway() {
        let mut stack = gateway_stack();
        stack.resources.push(invoke("Invoke", APIGATEWAY_PRINCIPAL));
        let err = validate(&stack).expect_err("unordered permission");
        assert!(err.to_string().contains("must be provisioned before Api"), "got: {err}");
    }

    #[test]
    fn validate_accepts_ordered_permission() {
        let mut stack = gateway_stack();
        stack.resources.push(invoke("Invoke", APIGATEWAY_PRINCIPAL));
        stack.resources[1] = stack.resources[1].clone().depends_on(&id("Invoke"));
        validate(&stack).expect("should validate");
    }

    #[test]
    fn validate_rejects_wildcard_invoke() {
        let mut stack = gateway_stack();
        stack.resources.push(invoke("Invoke", APIGATEWAY_PRINCIPAL));
        stack.resources.push(invoke("Open", "*"));
        stack.resources[1] = stack.resources[1].clone().depends_on(&id("Invoke"));
        assert!(matches!(
            validate(&stack),
            Err(StackError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn validate_rejects_public_bucket() {
        let mut props = BucketProps::private(Value::literal("b"));
        props.public_access_block_configuration = PublicAccessBlock {
            block_public_policy: false,
            ..PublicAccessBlock::block_all()
        };
        let mut stack = Stack::new("Public", "");
        stack
            .resources
            .push(Resource::new(id("Bucket"), Properties::Bucket(props)));
        assert!(matches!(
            validate(&stack),
            Err(StackError::PermissionDenied { .. })
        ));
    }
}
