//! HTTP API gateway declarations.

use checkerstack_common::config::ProvisioningContext;
use checkerstack_common::error::Result;
use checkerstack_common::types::LogicalId;
use serde::Serialize;

use crate::intrinsic::{PSEUDO_URL_SUFFIX, Value};
use crate::route::RouteKey;

/// Stage name that serves requests at the API root.
pub const DEFAULT_STAGE: &str = "$default";

/// Wildcard used in CORS lists.
pub const CORS_ANY: &str = "*";

/// CORS preflight policy of an HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cors {
    /// Origins allowed to call the API.
    pub allow_origins: Vec<String>,
    /// Methods allowed.
    pub allow_methods: Vec<String>,
    /// Request headers allowed.
    pub allow_headers: Vec<String>,
}

impl Cors {
    /// Any origin, any method, any header.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_origins: vec![CORS_ANY.to_string()],
            allow_methods: vec![CORS_ANY.to_string()],
            allow_headers: vec![CORS_ANY.to_string()],
        }
    }
}

/// `AWS::ApiGatewayV2::Api` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpApiProps {
    /// API name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Always `HTTP`.
    pub protocol_type: &'static str,
    /// CORS preflight policy.
    pub cors_configuration: Cors,
}

impl HttpApiProps {
    /// HTTP API with the given name, description, and CORS policy.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, cors: Cors) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            protocol_type: "HTTP",
            cors_configuration: cors,
        }
    }
}

/// `AWS::ApiGatewayV2::Stage` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StageProps {
    /// API the stage belongs to.
    pub api_id: Value,
    /// Stage name.
    pub stage_name: String,
    /// Deploy every change automatically.
    pub auto_deploy: bool,
}

impl StageProps {
    /// Auto-deploying `$default` stage of an API.
    #[must_use]
    pub fn default_for(api: &LogicalId) -> Self {
        Self {
            api_id: Value::reference(api),
            stage_name: DEFAULT_STAGE.to_string(),
            auto_deploy: true,
        }
    }
}

/// `AWS::ApiGatewayV2::Integration` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntegrationProps {
    /// API the integration belongs to.
    pub api_id: Value,
    /// Always `AWS_PROXY`.
    pub integration_type: &'static str,
    /// Function ARN receiving the requests.
    pub integration_uri: Value,
    /// Event payload format sent to the function.
    pub payload_format_version: &'static str,
}

impl IntegrationProps {
    /// Proxy integration forwarding requests verbatim to a function.
    #[must_use]
    pub fn lambda_proxy(api: &LogicalId, function: &LogicalId) -> Self {
        Self {
            api_id: Value::reference(api),
            integration_type: "AWS_PROXY",
            integration_uri: Value::get_att(function, "Arn"),
            payload_format_version: "2.0",
        }
    }

    /// Logical id of the function the integration targets, if any.
    #[must_use]
    pub fn target_function(&self) -> Option<&LogicalId> {
        match &self.integration_uri {
            Value::GetAtt(id, attr) if attr == "Arn" => Some(id),
            _ => None,
        }
    }
}

/// `AWS::ApiGatewayV2::Route` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteProps {
    /// API the route belongs to.
    pub api_id: Value,
    /// `<METHOD> <path>`.
    pub route_key: String,
    /// Always `NONE`; the handler authenticates requests itself.
    pub authorization_type: &'static str,
    /// `integrations/<integration id>`.
    pub target: Value,
}

impl RouteProps {
    /// Route sending `key` to `integration`.
    #[must_use]
    pub fn new(api: &LogicalId, key: &RouteKey, integration: &LogicalId) -> Self {
        Self {
            api_id: Value::reference(api),
            route_key: key.to_string(),
            authorization_type: "NONE",
            target: Value::concat(vec![
                Value::literal("integrations/"),
                Value::reference(integration),
            ]),
        }
    }

    /// Parses the route key back.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored key is malformed.
    pub fn key(&self) -> Result<RouteKey> {
        crate::route::parse_route_key(&self.route_key)
    }

    /// Logical id of the integration the route targets, if any.
    #[must_use]
    pub fn target_integration(&self) -> Option<&str> {
        match &self.target {
            Value::Join(_, parts) => parts.iter().find_map(|p| match p {
                Value::Ref(id) => Some(id.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Public endpoint of an HTTP API.
#[must_use]
pub fn api_endpoint(api: &LogicalId, ctx: &ProvisioningContext) -> Value {
    Value::concat(vec![
        Value::literal("https://"),
        Value::reference(api),
        Value::literal(".execute-api."),
        Value::region(ctx),
        Value::literal("."),
        Value::Ref(PSEUDO_URL_SUFFIX.to_string()),
    ])
}

/// ARN pattern matching every stage, method, and path of every API in
/// the context's account and region.
#[must_use]
pub fn execute_api_source_arn(ctx: &ProvisioningContext) -> Value {
    Value::scoped("arn:aws:execute-api:${AWS::Region}:${AWS::AccountId}:*/*/*/*", ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    #[test]
    fn permissive_cors_allows_everything() {
        let props = HttpApiProps::new("api", "Essay Checker API", Cors::permissive());
        let json = serde_json::to_value(&props).expect("serialize");
        assert_eq!(json["ProtocolType"], "HTTP");
        for key in ["AllowOrigins", "AllowMethods", "AllowHeaders"] {
            assert_eq!(json["CorsConfiguration"][key], serde_json::json!(["*"]));
        }
    }

    #[test]
    fn route_targets_integration() {
        let key = crate::route::parse_route_key("ANY /{proxy+}").expect("key");
        let route = RouteProps::new(&id("ApiGateway"), &key, &id("LambdaIntegration"));
        assert_eq!(route.route_key, "ANY /{proxy+}");
        assert_eq!(route.target_integration(), Some("LambdaIntegration"));
        assert_eq!(route.key().expect("parse back"), key);
    }

    #[test]
    fn integration_targets_function() {
        let integration = IntegrationProps::lambda_proxy(&id("ApiGateway"), &id("ApiHandler"));
        assert_eq!(integration.target_function().map(LogicalId::as_str), Some("ApiHandler"));
        let json = serde_json::to_value(&integration).expect("serialize");
        assert_eq!(json["IntegrationType"], "AWS_PROXY");
        assert_eq!(json["PayloadFormatVersion"], "2.0");
    }

    #[test]
    fn source_arn_resolves_with_pinned_context() {
        let ctx = ProvisioningContext::new(Some("111111111111".into()), Some("us-east-1".into()));
        assert_eq!(
            execute_api_source_arn(&ctx).as_literal(),
            Some("arn:aws:execute-api:us-east-1:111111111111:*/*/*/*")
        );
    }

    #[test]
    fn source_arn_substitutes_when_unpinned() {
        let ctx = ProvisioningContext::default();
        assert!(matches!(execute_api_source_arn(&ctx), Value::Sub(_)));
    }

    #[test]
    fn default_stage_auto_deploys() {
        let json = serde_json::to_value(StageProps::default_for(&id("ApiGateway"))).expect("serialize");
        assert_eq!(json["StageName"], "$default");
        assert_eq!(json["AutoDeploy"], true);
    }
}
