//! Permission grants: IAM roles, policies, and resource-based permissions.

use checkerstack_common::constants::{LAMBDA_BASIC_EXECUTION_POLICY, LAMBDA_PRINCIPAL};
use checkerstack_common::types::LogicalId;
use serde::Serialize;

use crate::intrinsic::Value;

/// Policy language version understood by IAM.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Log actions the handler needs for its own log group and streams.
pub const LOG_WRITE_ACTIONS: &[&str] = &[
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:PutLogEvents",
];

/// Action a resource-based permission grants on a function.
pub const INVOKE_FUNCTION_ACTION: &str = "lambda:InvokeFunction";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grant the actions.
    Allow,
}

/// Service principal of a trust statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServicePrincipal {
    /// Service host, e.g. `lambda.amazonaws.com`.
    pub service: String,
}

/// One IAM statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Allow or deny.
    pub effect: Effect,
    /// Principal; only trust policies carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<ServicePrincipal>,
    /// Actions covered.
    pub action: Vec<String>,
    /// Resources covered; trust policies have none.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Value>,
}

/// An IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Statements in declaration order.
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Document holding the given statements.
    #[must_use]
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

/// `AWS::IAM::Role` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleProps {
    /// Who may assume the role.
    pub assume_role_policy_document: PolicyDocument,
    /// Managed policies attached to the role.
    pub managed_policy_arns: Vec<Value>,
}

impl RoleProps {
    /// Execution role for a function, with the basic execution policy
    /// that lets it create and write its log streams.
    #[must_use]
    pub fn lambda_execution() -> Self {
        Self {
            assume_role_policy_document: PolicyDocument::new(vec![Statement {
                effect: Effect::Allow,
                principal: Some(ServicePrincipal {
                    service: LAMBDA_PRINCIPAL.to_string(),
                }),
                action: vec!["sts:AssumeRole".to_string()],
                resource: Vec::new(),
            }]),
            managed_policy_arns: vec![Value::literal(LAMBDA_BASIC_EXECUTION_POLICY)],
        }
    }
}

/// `AWS::IAM::Policy` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyProps {
    /// Inline policy name, unique per role.
    pub policy_name: String,
    /// Permission statements.
    pub policy_document: PolicyDocument,
    /// Roles the policy attaches to.
    pub roles: Vec<Value>,
}

/// `AWS::Lambda::Permission` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LambdaPermissionProps {
    /// Granted action.
    pub action: String,
    /// Function the permission is attached to.
    pub function_name: Value,
    /// Service principal allowed to invoke.
    pub principal: String,
    /// ARN pattern of the callers.
    pub source_arn: Value,
}

/// A permission grant from a subject to a target.
///
/// Identity grants (subject is the handler role) become statements of the
/// role's inline policy. Service grants become resource-based permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Actions granted.
    pub actions: Vec<String>,
    /// Resources the actions apply to.
    pub resources: Vec<Value>,
}

impl Grant {
    /// Grant of `actions` on `resources`.
    #[must_use]
    pub fn new(actions: &[&str], resources: Vec<Value>) -> Self {
        Self {
            actions: actions.iter().map(|a| (*a).to_string()).collect(),
            resources,
        }
    }

    /// Read/write on a bucket and every object in it.
    #[must_use]
    pub fn bucket_read_write(bucket: &LogicalId) -> Self {
        Self::new(
            super::storage::BUCKET_READ_WRITE_ACTIONS,
            vec![
                super::storage::bucket_arn(bucket),
                super::storage::objects_arn(bucket),
            ],
        )
    }

    /// The given queue actions on a queue.
    #[must_use]
    pub fn queue(queue: &LogicalId, actions: &[&str]) -> Self {
        Self::new(actions, vec![super::queue::queue_arn(queue)])
    }

    /// Log group and stream writes on any log resource.
    #[must_use]
    pub fn log_writes() -> Self {
        Self::new(LOG_WRITE_ACTIONS, vec![Value::literal("*")])
    }

    /// Allow statement for an identity policy.
    #[must_use]
    pub fn statement(&self) -> Statement {
        Statement {
            effect: Effect::Allow,
            principal: None,
            action: self.actions.clone(),
            resource: self.resources.clone(),
        }
    }
}

/// Permission letting a service principal invoke a function from
/// callers matching `source_arn`.
#[must_use]
pub fn invoke_permission(
    function: &LogicalId,
    principal: &str,
    source_arn: Value,
) -> LambdaPermissionProps {
    LambdaPermissionProps {
        action: INVOKE_FUNCTION_ACTION.to_string(),
        function_name: Value::get_att(function, "Arn"),
        principal: principal.to_string(),
        source_arn,
    }
}
