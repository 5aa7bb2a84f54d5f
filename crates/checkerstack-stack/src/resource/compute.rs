//! Container-image-backed function declarations.

use std::collections::BTreeMap;

use checkerstack_common::constants::{HANDLER_MEMORY_MB, HANDLER_TIMEOUT_SECS};
use checkerstack_common::types::LogicalId;
use serde::Serialize;

use crate::intrinsic::Value;

/// Region the handler's AWS clients talk to.
pub const ENV_REGION: &str = "LAMBDA_AWS_REGION";
/// Name of the static-asset bucket.
pub const ENV_STATIC_BUCKET: &str = "S3_AWS_STATIC_BUCKET_NAME";
/// Name of the generated-content bucket.
pub const ENV_STORAGE_BUCKET: &str = "S3_AWS_STORAGE_BUCKET_NAME";
/// URL of the task queue.
pub const ENV_QUEUE_URL: &str = "SQS_AWS_QUEUE_URL";
/// Local-emulation toggle.
pub const ENV_USE_LOCALSTACK: &str = "USE_LOCALSTACK";
/// Execution wrapper started before the handler process.
pub const ENV_EXEC_WRAPPER: &str = "AWS_LAMBDA_EXEC_WRAPPER";
/// Port the web adapter forwards to.
pub const ENV_PORT: &str = "PORT";

/// Image location of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageCode {
    /// Registry URI including tag or digest.
    pub image_uri: Value,
}

/// Environment variables of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    /// Variables by name.
    pub variables: BTreeMap<String, Value>,
}

/// Where a function sends its logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoggingConfig {
    /// Name of a declared log group.
    pub log_group: Value,
}

/// `AWS::Lambda::Function` properties for an image-packaged function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionProps {
    /// Always `Image`.
    pub package_type: &'static str,
    /// Image to run.
    pub code: ImageCode,
    /// Memory ceiling in megabytes.
    pub memory_size: u32,
    /// Timeout in seconds.
    pub timeout: u32,
    /// Execution role ARN.
    pub role: Value,
    /// Environment bindings.
    pub environment: Environment,
    /// Log destination; the service's implicit group when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_config: Option<LoggingConfig>,
}

impl FunctionProps {
    /// Image function with the handler's memory and timeout ceilings.
    #[must_use]
    pub const fn new(image_uri: Value, role: Value, variables: BTreeMap<String, Value>) -> Self {
        Self {
            package_type: "Image",
            code: ImageCode { image_uri },
            memory_size: HANDLER_MEMORY_MB,
            timeout: HANDLER_TIMEOUT_SECS,
            role,
            environment: Environment { variables },
            logging_config: None,
        }
    }

    /// Sends logs to a declared log group, so the group exists before the
    /// function can be invoked.
    #[must_use]
    pub fn with_log_group(mut self, log_group: &LogicalId) -> Self {
        self.logging_config = Some(LoggingConfig {
            log_group: Value::reference(log_group),
        });
        self
    }

    /// Looks up an environment binding.
    #[must_use]
    pub fn env(&self, name: &str) -> Option<&Value> {
        self.environment.variables.get(name)
    }
}

/// `AWS::Logs::LogGroup` properties. The backend generates the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogGroupProps {
    /// Days events are kept.
    pub retention_in_days: u32,
}

impl LogGroupProps {
    /// Log group keeping events for the given number of days.
    #[must_use]
    pub const fn with_retention(retention_in_days: u32) -> Self {
        Self { retention_in_days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_serializes_image_package() {
        let props = FunctionProps::new(
            Value::literal("repo:tag"),
            Value::literal("arn:aws:iam::1:role/r"),
            [(ENV_PORT.to_string(), Value::literal("8080"))]
                .into_iter()
                .collect(),
        );
        let json = serde_json::to_value(&props).expect("serialize");
        assert_eq!(json["PackageType"], "Image");
        assert_eq!(json["Code"]["ImageUri"], "repo:tag");
        assert_eq!(json["MemorySize"], 1024);
        assert_eq!(json["Timeout"], 30);
        assert_eq!(json["Environment"]["Variables"]["PORT"], "8080");
        assert!(json.get("LoggingConfig").is_none());
        assert_eq!(props.env(ENV_PORT), Some(&Value::literal("8080")));
        assert_eq!(props.env(ENV_REGION), None);
    }

    #[test]
    fn function_logs_to_declared_group() {
        let log_group = LogicalId::new("ApiHandlerLogGroup").expect("valid id");
        let props = FunctionProps::new(
            Value::literal("repo:tag"),
            Value::literal("arn:aws:iam::1:role/r"),
            BTreeMap::new(),
        )
        .with_log_group(&log_group);
        let json = serde_json::to_value(&props).expect("serialize");
        assert_eq!(json["LoggingConfig"]["LogGroup"]["Ref"], "ApiHandlerLogGroup");
    }

    #[test]
    fn log_group_name_is_left_to_backend() {
        let json = serde_json::to_value(LogGroupProps::with_retention(7)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "RetentionInDays": 7 }));
    }
}
