//! Backend-resolved property values.
//!
//! A [`Value`] is either a literal string or an intrinsic function the
//! provisioning backend evaluates at deploy time. Intrinsics that name
//! another resource are how the graph learns its implicit dependencies.

use std::collections::BTreeSet;

use checkerstack_common::config::ProvisioningContext;
use checkerstack_common::types::LogicalId;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Pseudo parameter resolving to the deploying account id.
pub const PSEUDO_ACCOUNT_ID: &str = "AWS::AccountId";
/// Pseudo parameter resolving to the deploying region.
pub const PSEUDO_REGION: &str = "AWS::Region";
/// Pseudo parameter resolving to the partition's domain suffix.
pub const PSEUDO_URL_SUFFIX: &str = "AWS::URLSuffix";

const PSEUDO_PREFIX: &str = "AWS::";

/// A property value in the resource graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain string.
    Literal(String),
    /// `Ref` to a resource or pseudo parameter.
    Ref(String),
    /// `Fn::GetAtt` of a resource attribute.
    GetAtt(LogicalId, String),
    /// `Fn::Sub` over a `${...}` template string.
    Sub(String),
    /// `Fn::Join` of parts with a separator.
    Join(String, Vec<Value>),
}

impl Value {
    /// Literal string value.
    #[must_use]
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// `Ref` to a declared resource.
    #[must_use]
    pub fn reference(id: &LogicalId) -> Self {
        Self::Ref(id.as_str().to_string())
    }

    /// `Fn::GetAtt` of a declared resource.
    #[must_use]
    pub fn get_att(id: &LogicalId, attribute: impl Into<String>) -> Self {
        Self::GetAtt(id.clone(), attribute.into())
    }

    /// `Fn::Join` with an empty separator.
    #[must_use]
    pub fn concat(parts: Vec<Self>) -> Self {
        Self::Join(String::new(), parts)
    }

    /// Region: literal when pinned, pseudo parameter otherwise.
    #[must_use]
    pub fn region(ctx: &ProvisioningContext) -> Self {
        ctx.region
            .as_ref()
            .map_or_else(|| Self::Ref(PSEUDO_REGION.into()), |r| Self::Literal(r.clone()))
    }

    /// Fills `${AWS::AccountId}` and `${AWS::Region}` from the context.
    ///
    /// Returns a literal when nothing is left to substitute, and an
    /// `Fn::Sub` over the remaining placeholders otherwise.
    #[must_use]
    pub fn scoped(template: &str, ctx: &ProvisioningContext) -> Self {
        let mut out = template.to_string();
        if let Some(account) = &ctx.account {
            out = out.replace(&placeholder(PSEUDO_ACCOUNT_ID), account);
        }
        if let Some(region) = &ctx.region {
            out = out.replace(&placeholder(PSEUDO_REGION), region);
        }
        if out.contains("${") {
            Self::Sub(out)
        } else {
            Self::Literal(out)
        }
    }

    /// Returns the literal string, if this value is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Logical ids of declared resources this value refers to.
    ///
    /// Pseudo parameters are not resources and are left out.
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Literal(_) => {}
            Self::Ref(target) => {
                if !target.starts_with(PSEUDO_PREFIX) {
                    let _ = out.insert(target.clone());
                }
            }
            Self::GetAtt(id, _) => {
                let _ = out.insert(id.as_str().to_string());
            }
            Self::Sub(template) => out.extend(sub_references(template)),
            Self::Join(_, parts) => {
                for part in parts {
                    part.collect(out);
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(s) => serializer.serialize_str(s),
            Self::Ref(target) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", target)?;
                map.end()
            }
            Self::GetAtt(id, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id.as_str(), attribute.as_str()])?;
                map.end()
            }
            Self::Sub(template) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Sub", template)?;
                map.end()
            }
            Self::Join(separator, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &(separator, parts))?;
                map.end()
            }
        }
    }
}

fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}

/// Resource names referenced by `${Name}` or `${Name.Attr}` in a
/// `Fn::Sub` template. `${!Literal}` escapes are skipped.
fn sub_references(template: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        let inner = &after[..end];
        if !inner.starts_with('!') && !inner.starts_with(PSEUDO_PREFIX) {
            let name = inner.split('.').next().unwrap_or(inner);
            if !name.is_empty() {
                let _ = out.insert(name.to_string());
            }
        }
        rest = &after[end + 1..];
    }
    out
}

/// Collects resource references from an already serialized value tree.
///
/// Recognizes `Ref`, `Fn::GetAtt`, and `Fn::Sub` anywhere in the tree.
#[must_use]
pub fn collect_references(json: &serde_json::Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk(json, &mut out);
    out
}

fn walk(json: &serde_json::Value, out: &mut BTreeSet<String>) {
    match json {
        serde_json::Value::Object(map) => {
            if map.len() == 1 {
                if let Some(serde_json::Value::String(target)) = map.get("Ref") {
                    if !target.starts_with(PSEUDO_PREFIX) {
                        let _ = out.insert(target.clone());
                    }
                    return;
                }
                if let Some(serde_json::Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(serde_json::Value::String(id)) = parts.first() {
                        let _ = out.insert(id.clone());
                    }
                    return;
                }
                if let Some(serde_json::Value::String(template)) = map.get("Fn::Sub") {
                    out.extend(sub_references(template));
                    return;
                }
            }
            for child in map.values() {
                walk(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).expect("valid id")
    }

    fn pinned() -> ProvisioningContext {
        ProvisioningContext::new(Some("111111111111".into()), Some("us-east-1".into()))
    }

    #[test]
    fn literal_serializes_as_string() {
        let json = serde_json::to_value(Value::literal("8080")).expect("serialize");
        assert_eq!(json, serde_json::json!("8080"));
    }

    #[test]
    fn intrinsics_serialize_in_template_shape() {
        let bucket = id("StaticBucket");
        assert_eq!(
            serde_json::to_value(Value::reference(&bucket)).expect("ref"),
            serde_json::json!({ "Ref": "StaticBucket" })
        );
        assert_eq!(
            serde_json::to_value(Value::get_att(&bucket, "Arn")).expect("getatt"),
            serde_json::json!({ "Fn::GetAtt": ["StaticBucket", "Arn"] })
        );
        assert_eq!(
            serde_json::to_value(Value::concat(vec![
                Value::get_att(&bucket, "Arn"),
                Value::literal("/*"),
            ]))
            .expect("join"),
            serde_json::json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["StaticBucket", "Arn"] }, "/*"]] })
        );
    }

    #[test]
    fn region_falls_back_to_pseudo_parameter() {
        let ctx = ProvisioningContext::default();
        assert_eq!(Value::region(&ctx), Value::Ref("AWS::Region".into()));
        assert_eq!(Value::region(&pinned()), Value::literal("us-east-1"));
    }

    #[test]
    fn scoped_substitutes_pinned_values() {
        let value = Value::scoped("essay-checker-static-${AWS::AccountId}", &pinned());
        assert_eq!(value.as_literal(), Some("essay-checker-static-111111111111"));
    }

    #[test]
    fn scoped_keeps_unpinned_placeholders() {
        let ctx = ProvisioningContext::new(None, Some("eu-west-1".into()));
        let value = Value::scoped("arn:aws:execute-api:${AWS::Region}:${AWS::AccountId}:*", &ctx);
        assert_eq!(
            value,
            Value::Sub("arn:aws:execute-api:eu-west-1:${AWS::AccountId}:*".into())
        );
    }

    #[test]
    fn references_skip_pseudo_parameters() {
        let value = Value::concat(vec![
            Value::Ref("AWS::Region".into()),
            Value::reference(&id("ApiGateway")),
            Value::get_att(&id("ApiHandler"), "Arn"),
            Value::Sub("${TaskQueue.Arn}/${AWS::URLSuffix}/${!Escaped}".into()),
        ]);
        let refs: Vec<String> = value.references().into_iter().collect();
        assert_eq!(refs, vec!["ApiGateway", "ApiHandler", "TaskQueue"]);
    }

    #[test]
    fn collect_references_walks_nested_json() {
        let json = serde_json::json!({
            "Role": { "Fn::GetAtt": ["ApiHandlerServiceRole", "Arn"] },
            "Environment": { "Variables": {
                "QUEUE": { "Ref": "TaskQueue" },
                "REGION": { "Ref": "AWS::Region" },
            }},
            "Code": { "ImageUri": { "Fn::Sub": "${AWS::AccountId}.dkr.ecr" } },
            "Tags": [{ "Value": { "Ref": "StaticBucket" } }],
        });
        let refs: Vec<String> = collect_references(&json).into_iter().collect();
        assert_eq!(refs, vec!["ApiHandlerServiceRole", "StaticBucket", "TaskQueue"]);
    }
}
