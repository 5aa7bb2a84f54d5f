//! Deployment descriptor builder.
//!
//! Assembles the Essay Checker resource graph in one pass: stores and
//! queue, then the handler that reads their identifiers, then the gateway
//! that forwards to the handler. The result is validated before it is
//! returned.

use std::collections::BTreeMap;

use checkerstack_asset::reference::ImageReference;
use checkerstack_common::config::ProvisioningContext;
use checkerstack_common::constants::{
    API_DESCRIPTION, APIGATEWAY_PRINCIPAL, HANDLER_PORT, LAMBDA_EXEC_WRAPPER, LOG_RETENTION_DAYS,
    PROXY_ROUTE_PATH, STATIC_BUCKET_PREFIX, STORAGE_BUCKET_PREFIX, TASK_QUEUE_NAME, USE_LOCALSTACK,
};
use checkerstack_common::error::Result;
use checkerstack_common::types::{LogicalId, RemovalPolicy};

use crate::intrinsic::Value;
use crate::resource::compute::{self, FunctionProps, LogGroupProps};
use crate::resource::gateway::{self, Cors, HttpApiProps, IntegrationProps, RouteProps, StageProps};
use crate::resource::iam::{self, Grant, PolicyDocument, PolicyProps, RoleProps};
use crate::resource::queue::{self, QUEUE_CONSUMER_ACTIONS, QueueProps};
use crate::resource::storage::BucketProps;
use crate::resource::{Properties, Resource};
use crate::route::{HttpMethod, RouteKey};
use crate::stack::{Output, Stack};

/// Logical ids of the stack's resources and outputs.
pub mod ids {
    /// Static-asset bucket.
    pub const STATIC_BUCKET: &str = "StaticBucket";
    /// Generated-content bucket.
    pub const STORAGE_BUCKET: &str = "StorageBucket";
    /// Task queue.
    pub const TASK_QUEUE: &str = "TaskQueue";
    /// Handler execution role.
    pub const HANDLER_ROLE: &str = "ApiHandlerServiceRole";
    /// Inline policy of the execution role.
    pub const HANDLER_POLICY: &str = "ApiHandlerServiceRoleDefaultPolicy";
    /// API handler function.
    pub const HANDLER: &str = "ApiHandler";
    /// Handler log group.
    pub const HANDLER_LOG_GROUP: &str = "ApiHandlerLogGroup";
    /// Permission letting API Gateway invoke the handler.
    pub const GATEWAY_INVOKE: &str = "ApiHandlerApiGatewayInvoke";
    /// HTTP API.
    pub const GATEWAY: &str = "ApiGateway";
    /// `$default` stage.
    pub const GATEWAY_STAGE: &str = "ApiGatewayDefaultStage";
    /// Proxy integration to the handler.
    pub const INTEGRATION: &str = "ApiGatewayLambdaIntegration";
    /// Catch-all route.
    pub const PROXY_ROUTE: &str = "ApiGatewayProxyRoute";

    /// Output: API endpoint URL.
    pub const OUTPUT_API_URL: &str = "ApiUrl";
    /// Output: static bucket name.
    pub const OUTPUT_STATIC_BUCKET: &str = "StaticBucketName";
    /// Output: storage bucket name.
    pub const OUTPUT_STORAGE_BUCKET: &str = "StorageBucketName";
    /// Output: queue URL.
    pub const OUTPUT_QUEUE_URL: &str = "QueueUrl";
}

/// Ids of the storage and queue declarations the handler binds to.
struct DataPlane {
    static_bucket: LogicalId,
    storage_bucket: LogicalId,
    queue: LogicalId,
}

/// Builds the Essay Checker stack for a provisioning context.
#[derive(Debug)]
pub struct DescriptorBuilder<'a> {
    ctx: &'a ProvisioningContext,
    image: &'a ImageReference,
    stack: Stack,
}

impl<'a> DescriptorBuilder<'a> {
    /// Creates a builder for the given context and handler image.
    #[must_use]
    pub fn new(ctx: &'a ProvisioningContext, image: &'a ImageReference) -> Self {
        Self {
            ctx,
            image,
            stack: Stack::new(ctx.stack_name.clone(), API_DESCRIPTION),
        }
    }

    /// Declares every resource and output, then validates the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the assembled graph fails validation.
    pub fn build(mut self) -> Result<Stack> {
        tracing::info!(
            stack = %self.ctx.stack_name,
            account = self.ctx.account.as_deref().unwrap_or("<deploy-time>"),
            region = self.ctx.region.as_deref().unwrap_or("<deploy-time>"),
            "building deployment descriptor"
        );

        let data = self.declare_data_plane()?;
        let handler = self.declare_handler(&data)?;
        let api = self.declare_gateway(&handler)?;
        self.declare_outputs(&data, &api)?;

        crate::validator::validate(&self.stack)?;
        tracing::info!(
            resources = self.stack.resources.len(),
            outputs = self.stack.outputs.len(),
            "deployment descriptor built"
        );
        Ok(self.stack)
    }

    fn push(&mut self, resource: Resource) {
        tracing::debug!(
            id = %resource.logical_id,
            kind = resource.resource_type(),
            "declared resource"
        );
        self.stack.resources.push(resource);
    }

    fn declare_data_plane(&mut self) -> Result<DataPlane> {
        let static_bucket = LogicalId::new(ids::STATIC_BUCKET)?;
        let storage_bucket = LogicalId::new(ids::STORAGE_BUCKET)?;
        let queue = LogicalId::new(ids::TASK_QUEUE)?;

        for (id, prefix) in [
            (&static_bucket, STATIC_BUCKET_PREFIX),
            (&storage_bucket, STORAGE_BUCKET_PREFIX),
        ] {
            let name = Value::scoped(&format!("{prefix}-${{AWS::AccountId}}"), self.ctx);
            self.push(
                Resource::new(id.clone(), Properties::Bucket(BucketProps::private(name)))
                    .removal_policy(RemovalPolicy::Retain),
            );
        }

        self.push(
            Resource::new(
                queue.clone(),
                Properties::Queue(QueueProps::named(Value::literal(TASK_QUEUE_NAME))),
            )
            .removal_policy(RemovalPolicy::Delete),
        );

        Ok(DataPlane {
            static_bucket,
            storage_bucket,
            queue,
        })
    }

    fn declare_handler(&mut self, data: &DataPlane) -> Result<LogicalId> {
        let role = LogicalId::new(ids::HANDLER_ROLE)?;
        let policy = LogicalId::new(ids::HANDLER_POLICY)?;
        let handler = LogicalId::new(ids::HANDLER)?;
        let log_group = LogicalId::new(ids::HANDLER_LOG_GROUP)?;

        self.push(Resource::new(
            role.clone(),
            Properties::Role(RoleProps::lambda_execution()),
        ));

        let grants = [
            Grant::log_writes(),
            Grant::bucket_read_write(&data.static_bucket),
            Grant::bucket_read_write(&data.storage_bucket),
            Grant::queue(&data.queue, QUEUE_CONSUMER_ACTIONS),
        ];
        self.push(Resource::new(
            policy.clone(),
            Properties::Policy(PolicyProps {
                policy_name: ids::HANDLER_POLICY.to_string(),
                policy_document: PolicyDocument::new(
                    grants.iter().map(Grant::statement).collect(),
                ),
                roles: vec![Value::reference(&role)],
            }),
        ));

        self.push(Resource::new(
            log_group.clone(),
            Properties::LogGroup(LogGroupProps::with_retention(LOG_RETENTION_DAYS)),
        ));

        let image_uri = Value::scoped(
            &self
                .image
                .uri(self.ctx.account.as_deref(), self.ctx.region.as_deref()),
            self.ctx,
        );
        self.push(
            Resource::new(
                handler.clone(),
                Properties::Function(
                    FunctionProps::new(
                        image_uri,
                        Value::get_att(&role, "Arn"),
                        self.environment(data),
                    )
                    .with_log_group(&log_group),
                ),
            )
            .depends_on(&policy),
        );

        Ok(handler)
    }

    fn environment(&self, data: &DataPlane) -> BTreeMap<String, Value> {
        [
            (compute::ENV_REGION, Value::region(self.ctx)),
            (
                compute::ENV_STATIC_BUCKET,
                Value::reference(&data.static_bucket),
            ),
            (
                compute::ENV_STORAGE_BUCKET,
                Value::reference(&data.storage_bucket),
            ),
            (compute::ENV_QUEUE_URL, queue::queue_url(&data.queue)),
            (compute::ENV_USE_LOCALSTACK, Value::literal(USE_LOCALSTACK)),
            (compute::ENV_EXEC_WRAPPER, Value::literal(LAMBDA_EXEC_WRAPPER)),
            (compute::ENV_PORT, Value::literal(HANDLER_PORT)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn declare_gateway(&mut self, handler: &LogicalId) -> Result<LogicalId> {
        let invoke = LogicalId::new(ids::GATEWAY_INVOKE)?;
        let api = LogicalId::new(ids::GATEWAY)?;
        let stage = LogicalId::new(ids::GATEWAY_STAGE)?;
        let integration = LogicalId::new(ids::INTEGRATION)?;
        let route = LogicalId::new(ids::PROXY_ROUTE)?;

        self.push(Resource::new(
            invoke.clone(),
            Properties::Permission(iam::invoke_permission(
                handler,
                APIGATEWAY_PRINCIPAL,
                gateway::execute_api_source_arn(self.ctx),
            )),
        ));

        self.push(
            Resource::new(
                api.clone(),
                Properties::HttpApi(HttpApiProps::new(
                    ids::GATEWAY,
                    API_DESCRIPTION,
                    Cors::permissive(),
                )),
            )
            .depends_on(&invoke),
        );

        self.push(Resource::new(
            stage,
            Properties::Stage(StageProps::default_for(&api)),
        ));

        self.push(Resource::new(
            integration.clone(),
            Properties::Integration(IntegrationProps::lambda_proxy(&api, handler)),
        ));

        let key = RouteKey {
            method: HttpMethod::Any,
            path: crate::route::parse_path(PROXY_ROUTE_PATH)?,
        };
        self.push(Resource::new(
            route,
            Properties::Route(RouteProps::new(&api, &key, &integration)),
        ));

        Ok(api)
    }

    fn declare_outputs(&mut self, data: &DataPlane, api: &LogicalId) -> Result<()> {
        let outputs = [
            (ids::OUTPUT_API_URL, gateway::api_endpoint(api, self.ctx)),
            (
                ids::OUTPUT_STATIC_BUCKET,
                Value::reference(&data.static_bucket),
            ),
            (
                ids::OUTPUT_STORAGE_BUCKET,
                Value::reference(&data.storage_bucket),
            ),
            (ids::OUTPUT_QUEUE_URL, queue::queue_url(&data.queue)),
        ];
        for (name, value) in outputs {
            self.stack.outputs.push(Output {
                logical_id: LogicalId::new(name)?,
                value,
                description: None,
            });
        }
        Ok(())
    }
}

/// Builds and validates the stack in one call.
///
/// # Errors
///
/// Returns an error if the assembled graph fails validation.
pub fn build_stack(ctx: &ProvisioningContext, image: &ImageReference) -> Result<Stack> {
    DescriptorBuilder::new(ctx, image).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageReference {
        ImageReference::new("0123abcd").expect("tag")
    }

    fn pinned() -> ProvisioningContext {
        ProvisioningContext::new(Some("111111111111".into()), Some("us-east-1".into()))
    }

    #[test]
    fn builds_every_resource() {
        let stack = build_stack(&pinned(), &image()).expect("should build");
        assert_eq!(stack.resources.len(), 12);
        assert_eq!(stack.outputs.len(), 4);
        assert_eq!(stack.name, "EssayCheckerApiStack");
    }

    #[test]
    fn buckets_are_retained() {
        let stack = build_stack(&pinned(), &image()).expect("should build");
        for id in [ids::STATIC_BUCKET, ids::STORAGE_BUCKET] {
            let bucket = stack.resource(id).expect("bucket");
            assert_eq!(bucket.removal_policy, Some(RemovalPolicy::Retain));
        }
        let queue = stack.resource(ids::TASK_QUEUE).expect("queue");
        assert_eq!(queue.removal_policy, Some(RemovalPolicy::Delete));
    }

    #[test]
    fn handler_has_fixed_ceilings() {
        let stack = build_stack(&pinned(), &image()).expect("should build");
        let handler = stack
            .resource(ids::HANDLER)
            .and_then(|r| r.properties.as_function())
            .expect("handler");
        assert_eq!(handler.memory_size, 1024);
        assert_eq!(handler.timeout, 30);
        assert_eq!(handler.env(compute::ENV_USE_LOCALSTACK), Some(&Value::literal("False")));
        assert_eq!(handler.env(compute::ENV_PORT), Some(&Value::literal("8080")));
        assert_eq!(
            handler.env(compute::ENV_EXEC_WRAPPER),
            Some(&Value::literal("/opt/extensions/lambda-adapter"))
        );
        assert_eq!(handler.environment.variables.len(), 7);
    }

    #[test]
    fn handler_image_tracks_tag() {
        let stack = build_stack(&pinned(), &image()).expect("should build");
        let handler = stack
            .resource(ids::HANDLER)
            .and_then(|r| r.properties.as_function())
            .expect("handler");
        let Value::Sub(uri) = &handler.code.image_uri else {
            panic!("image uri should substitute the url suffix");
        };
        assert!(uri.ends_with("-111111111111-us-east-1:0123abcd"), "got: {uri}");
    }

    #[test]
    fn log_group_keeps_one_week() {
        let stack = build_stack(&pinned(), &image()).expect("should build");
        let log_group = stack
            .resource(ids::HANDLER_LOG_GROUP)
            .and_then(|r| r.properties.as_log_group())
            .expect("log group");
        assert_eq!(log_group.retention_in_days, 7);

        let order = stack.deployment_order().expect("order");
        let pos = |name: &str| order.iter().position(|n| n.as_str() == name).expect(name);
        assert!(pos(ids::HANDLER_LOG_GROUP) < pos(ids::HANDLER));
        let handler = stack
            .resource(ids::HANDLER)
            .and_then(|r| r.properties.as_function())
            .and_then(|f| f.logging_config.as_ref())
            .expect("logging config");
        assert_eq!(handler.log_group, Value::Ref(ids::HANDLER_LOG_GROUP.into()));
    }

    #[test]
    fn unpinned_context_defers_to_backend() {
        let stack = build_stack(&ProvisioningContext::default(), &image()).expect("should build");
        let bucket = stack
            .resource(ids::STATIC_BUCKET)
            .and_then(|r| r.properties.as_bucket())
            .expect("bucket");
        assert_eq!(
            bucket.bucket_name,
            Value::Sub("essay-checker-static-${AWS::AccountId}".into())
        );
        let handler = stack
            .resource(ids::HANDLER)
            .and_then(|r| r.properties.as_function())
            .expect("handler");
        assert_eq!(
            handler.env(compute::ENV_REGION),
            Some(&Value::Ref("AWS::Region".into()))
        );
    }
}
