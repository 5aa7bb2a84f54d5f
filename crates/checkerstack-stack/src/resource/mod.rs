//! Typed resource declarations.
//!
//! Each submodule covers one service and defines the property shape the
//! provisioning backend expects for it. Field names serialize in the
//! backend's PascalCase.

pub mod compute;
pub mod gateway;
pub mod iam;
pub mod queue;
pub mod storage;

use std::collections::BTreeSet;

use checkerstack_common::error::Result;
use checkerstack_common::types::{LogicalId, RemovalPolicy};
use serde::Serialize;

use self::compute::{FunctionProps, LogGroupProps};
use self::gateway::{HttpApiProps, IntegrationProps, RouteProps, StageProps};
use self::iam::{LambdaPermissionProps, PolicyProps, RoleProps};
use self::queue::QueueProps;
use self::storage::BucketProps;

/// Properties of a resource, one variant per supported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Properties {
    /// `AWS::S3::Bucket`.
    Bucket(BucketProps),
    /// `AWS::SQS::Queue`.
    Queue(QueueProps),
    /// `AWS::IAM::Role`.
    Role(RoleProps),
    /// `AWS::IAM::Policy`.
    Policy(PolicyProps),
    /// `AWS::Lambda::Function`.
    Function(FunctionProps),
    /// `AWS::Logs::LogGroup`.
    LogGroup(LogGroupProps),
    /// `AWS::Lambda::Permission`.
    Permission(LambdaPermissionProps),
    /// `AWS::ApiGatewayV2::Api`.
    HttpApi(HttpApiProps),
    /// `AWS::ApiGatewayV2::Stage`.
    Stage(StageProps),
    /// `AWS::ApiGatewayV2::Integration`.
    Integration(IntegrationProps),
    /// `AWS::ApiGatewayV2::Route`.
    Route(RouteProps),
}

impl Properties {
    /// Backend type name of the resource.
    #[must_use]
    pub const fn resource_type(&self) -> &'static str {
        match self {
            Self::Bucket(_) => "AWS::S3::Bucket",
            Self::Queue(_) => "AWS::SQS::Queue",
            Self::Role(_) => "AWS::IAM::Role",
            Self::Policy(_) => "AWS::IAM::Policy",
            Self::Function(_) => "AWS::Lambda::Function",
            Self::LogGroup(_) => "AWS::Logs::LogGroup",
            Self::Permission(_) => "AWS::Lambda::Permission",
            Self::HttpApi(_) => "AWS::ApiGatewayV2::Api",
            Self::Stage(_) => "AWS::ApiGatewayV2::Stage",
            Self::Integration(_) => "AWS::ApiGatewayV2::Integration",
            Self::Route(_) => "AWS::ApiGatewayV2::Route",
        }
    }
}

macro_rules! downcast {
    ($($name:ident => $variant:ident($ty:ty)),* $(,)?) => {
        impl Properties {
            $(
                #[doc = concat!("Returns the properties if this is a `", stringify!($variant), "`.")]
                #[must_use]
                pub const fn $name(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(p) => Some(p),
                        _ => None,
                    }
                }
            )*
        }
    };
}

downcast! {
    as_bucket => Bucket(BucketProps),
    as_queue => Queue(QueueProps),
    as_role => Role(RoleProps),
    as_policy => Policy(PolicyProps),
    as_function => Function(FunctionProps),
    as_log_group => LogGroup(LogGroupProps),
    as_permission => Permission(LambdaPermissionProps),
    as_http_api => HttpApi(HttpApiProps),
    as_stage => Stage(StageProps),
    as_integration => Integration(IntegrationProps),
    as_route => Route(RouteProps),
}

/// A resource declaration in the stack graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Template-local name.
    pub logical_id: LogicalId,
    /// Type-specific properties.
    pub properties: Properties,
    /// Ordering edges not implied by property references.
    pub depends_on: Vec<LogicalId>,
    /// Deletion and replacement behavior; backend default when `None`.
    pub removal_policy: Option<RemovalPolicy>,
}

impl Resource {
    /// Declares a resource with no explicit ordering or removal policy.
    #[must_use]
    pub const fn new(logical_id: LogicalId, properties: Properties) -> Self {
        Self {
            logical_id,
            properties,
            depends_on: Vec::new(),
            removal_policy: None,
        }
    }

    /// Adds an explicit ordering edge.
    #[must_use]
    pub fn depends_on(mut self, dependency: &LogicalId) -> Self {
        if !self.depends_on.contains(dependency) {
            self.depends_on.push(dependency.clone());
        }
        self
    }

    /// Sets the removal policy.
    #[must_use]
    pub const fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    /// Backend type name.
    #[must_use]
    pub const fn resource_type(&self) -> &'static str {
        self.properties.resource_type()
    }

    /// Every logical id this resource needs, from property intrinsics and
    /// explicit `depends_on` edges. A resource naming itself is kept so
    /// the graph can report the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the properties cannot be serialized.
    pub fn dependencies(&self) -> Result<BTreeSet<String>> {
        let json = serde_json::to_value(&self.properties)?;
        let mut deps = crate::intrinsic::collect_references(&json);
        deps.extend(self.depends_on.iter().map(|d| d.as_str().to_string()));
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsic::Value;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    #[test]
    fn dependencies_merge_references_and_explicit_edges() {
        let role = id("ApiHandlerServiceRole");
        let bucket = id("StaticBucket");
        let props = Properties::Function(FunctionProps::new(
            Value::literal("image"),
            Value::get_att(&role, "Arn"),
            [("BUCKET".to_string(), Value::reference(&bucket))].into_iter().collect(),
        ));
        let resource = Resource::new(id("ApiHandler"), props).depends_on(&id("HandlerPolicy"));
        let deps: Vec<String> = resource.dependencies().expect("deps").into_iter().collect();
        assert_eq!(deps, vec!["ApiHandlerServiceRole", "HandlerPolicy", "StaticBucket"]);
    }

    #[test]
    fn dependencies_keep_self_reference() {
        let queue = id("TaskQueue");
        let resource = Resource::new(
            queue.clone(),
            Properties::Queue(QueueProps::named(Value::reference(&queue))),
        );
        let deps = resource.dependencies().expect("deps");
        assert!(deps.contains("TaskQueue"));
    }

    #[test]
    fn depends_on_is_deduplicated() {
        let queue = id("TaskQueue");
        let resource = Resource::new(
            id("Other"),
            Properties::Queue(QueueProps::named(Value::literal("q"))),
        )
        .depends_on(&queue)
        .depends_on(&queue);
        assert_eq!(resource.depends_on, vec![queue]);
    }

    #[test]
    fn resource_type_names() {
        let bucket = Properties::Bucket(BucketProps::private(Value::literal("b")));
        assert_eq!(bucket.resource_type(), "AWS::S3::Bucket");
        let queue = Properties::Queue(QueueProps::named(Value::literal("q")));
        assert_eq!(queue.resource_type(), "AWS::SQS::Queue");
    }
}
