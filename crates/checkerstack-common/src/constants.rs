//! Fixed names and values of the Essay Checker stack.

/// Default CloudFormation stack name.
pub const DEFAULT_STACK_NAME: &str = "EssayCheckerApiStack";

/// Description attached to the template and the HTTP API.
pub const API_DESCRIPTION: &str = "Essay Checker API";

/// Prefix of the static-asset bucket name; the account id is appended.
pub const STATIC_BUCKET_PREFIX: &str = "essay-checker-static";

/// Prefix of the generated-content bucket name; the account id is appended.
pub const STORAGE_BUCKET_PREFIX: &str = "essay-checker-storage";

/// Queue name. Not account scoped.
pub const TASK_QUEUE_NAME: &str = "essay-checker-task-queue";

/// Function memory ceiling in megabytes.
pub const HANDLER_MEMORY_MB: u32 = 1024;

/// Function timeout in seconds.
pub const HANDLER_TIMEOUT_SECS: u32 = 30;

/// Retention of the function's log group, in days.
pub const LOG_RETENTION_DAYS: u32 = 7;

/// Port the web adapter forwards requests to inside the container.
pub const HANDLER_PORT: &str = "8080";

/// Execution wrapper shipped by the Lambda web adapter extension.
pub const LAMBDA_EXEC_WRAPPER: &str = "/opt/extensions/lambda-adapter";

/// Local-emulation toggle. The deployed stack always runs against real AWS.
pub const USE_LOCALSTACK: &str = "False";

/// Catch-all route path forwarded to the function.
pub const PROXY_ROUTE_PATH: &str = "/{proxy+}";

/// Service principal of API Gateway.
pub const APIGATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// Service principal assumed by the function's execution role.
pub const LAMBDA_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Managed policy granting log stream creation and writes.
pub const LAMBDA_BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Qualifier of the bootstrap container-asset repository.
pub const BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

/// Environment variable carrying the default account id.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";

/// Environment variable carrying the default region.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Paths left out of the container build context.
pub const IMAGE_EXCLUDES: &[&str] = &[
    "infrastructure/cdk.out",
    "infrastructure/node_modules",
    "**/__pycache__",
    "**/venv",
    ".git",
];

/// Dockerfile name inside the build context.
pub const DOCKERFILE: &str = "Dockerfile";

/// CloudFormation template format version.
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "ckst";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;
