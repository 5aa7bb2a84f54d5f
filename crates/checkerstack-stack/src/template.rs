//! CloudFormation template synthesis.
//!
//! Renders a validated [`Stack`] into the document the provisioning
//! backend consumes. Maps are ordered so the same stack always renders to
//! the same bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use checkerstack_common::constants::TEMPLATE_FORMAT_VERSION;
use checkerstack_common::error::{Result, StackError};
use checkerstack_common::types::RemovalPolicy;
use serde::Serialize;

use crate::intrinsic::Value;
use crate::resource::{Properties, Resource};
use crate::stack::Stack;

/// Serialization format of a synthesized template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(StackError::Config {
                message: format!("unsupported template format: {other:?}"),
            }),
        }
    }
}

/// One entry of the template's `Resources` section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource<'a> {
    /// Backend type name.
    #[serde(rename = "Type")]
    pub resource_type: &'static str,
    /// Type-specific properties.
    pub properties: &'a Properties,
    /// Explicit ordering edges.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<&'a str>,
    /// Behavior when the resource is removed from the stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    /// Behavior when an update replaces the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl<'a> From<&'a Resource> for TemplateResource<'a> {
    fn from(resource: &'a Resource) -> Self {
        let mut depends_on: Vec<&str> = resource.depends_on.iter().map(|d| d.as_str()).collect();
        depends_on.sort_unstable();
        Self {
            resource_type: resource.resource_type(),
            properties: &resource.properties,
            depends_on,
            deletion_policy: resource.removal_policy,
            update_replace_policy: resource.removal_policy,
        }
    }
}

/// One entry of the template's `Outputs` section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput<'a> {
    /// Output value.
    pub value: &'a Value,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

/// A synthesized template borrowing from its stack.
#[derive(Debug, Clone, Serialize)]
pub struct Template<'a> {
    /// Template format version.
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    /// Template description.
    #[serde(rename = "Description")]
    pub description: &'a str,
    /// Resources keyed by logical id.
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<&'a str, TemplateResource<'a>>,
    /// Outputs keyed by name.
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<&'a str, TemplateOutput<'a>>,
}

impl<'a> Template<'a> {
    /// Builds the template view of a stack.
    #[must_use]
    pub fn from_stack(stack: &'a Stack) -> Self {
        let resources = stack
            .resources
            .iter()
            .map(|r| (r.logical_id.as_str(), TemplateResource::from(r)))
            .collect();
        let outputs = stack
            .outputs
            .iter()
            .map(|o| {
                (
                    o.logical_id.as_str(),
                    TemplateOutput {
                        value: &o.value,
                        description: o.description.as_deref(),
                    },
                )
            })
            .collect();
        Self {
            format_version: TEMPLATE_FORMAT_VERSION,
            description: &stack.description,
            resources,
            outputs,
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// YAML rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Renders in the requested format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Yaml => self.to_yaml(),
        }
    }
}

/// Renders a stack as a template document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn synthesize(stack: &Stack, format: OutputFormat) -> Result<String> {
    let rendered = Template::from_stack(stack).render(format)?;
    tracing::debug!(
        stack = %stack.name,
        %format,
        bytes = rendered.len(),
        "template synthesized"
    );
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkerstack_common::types::LogicalId;

    use crate::resource::queue::QueueProps;
    use crate::resource::storage::BucketProps;
    use crate::stack::Output;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    fn sample() -> Stack {
        let mut stack = Stack::new("Sample", "sample stack");
        stack.resources.push(
            Resource::new(
                id("Bucket"),
                Properties::Bucket(BucketProps::private(Value::literal("b"))),
            )
            .removal_policy(RemovalPolicy::Retain),
        );
        stack.resources.push(
            Resource::new(
                id("Queue"),
                Properties::Queue(QueueProps::named(Value::literal("q"))),
            )
            .depends_on(&id("Bucket")),
        );
        stack.outputs.push(Output {
            logical_id: id("QueueUrl"),
            value: Value::reference(&id("Queue")),
            description: Some("queue url".into()),
        });
        stack
    }

    #[test]
    fn json_has_template_sections() {
        let json = synthesize(&sample(), OutputFormat::Json).expect("json");
        let doc: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(doc["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(doc["Description"], "sample stack");
        assert_eq!(doc["Resources"]["Bucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(doc["Resources"]["Bucket"]["DeletionPolicy"], "Retain");
        assert_eq!(doc["Resources"]["Bucket"]["UpdateReplacePolicy"], "Retain");
        assert_eq!(doc["Resources"]["Queue"]["DependsOn"][0], "Bucket");
        assert_eq!(doc["Outputs"]["QueueUrl"]["Value"]["Ref"], "Queue");
        assert_eq!(doc["Outputs"]["QueueUrl"]["Description"], "queue url");
    }

    #[test]
    fn optional_keys_are_omitted() {
        let json = synthesize(&sample(), OutputFormat::Json).expect("json");
        let doc: serde_json::Value = serde_json::from_str(&json).expect("parse");
        let queue = doc["Resources"]["Queue"].as_object().expect("object");
        assert!(!queue.contains_key("DeletionPolicy"));
        let bucket = doc["Resources"]["Bucket"].as_object().expect("object");
        assert!(!bucket.contains_key("DependsOn"));
    }

    #[test]
    fn yaml_renders_same_document() {
        let stack = sample();
        let yaml = synthesize(&stack, OutputFormat::Yaml).expect("yaml");
        let from_yaml: serde_json::Value = serde_yaml::from_str(&yaml).expect("parse yaml");
        let json = synthesize(&stack, OutputFormat::Json).expect("json");
        let from_json: serde_json::Value = serde_json::from_str(&json).expect("parse json");
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>().expect("json"), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().expect("yaml"), OutputFormat::Yaml);
        assert!("toml".parse::<OutputFormat>().is_err());
    }
}
