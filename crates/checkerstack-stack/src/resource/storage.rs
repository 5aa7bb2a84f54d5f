//! Object store declarations.

use checkerstack_common::types::LogicalId;
use serde::Serialize;

use crate::intrinsic::Value;

/// Object-level and bucket-level actions granted by a read/write grant.
pub const BUCKET_READ_WRITE_ACTIONS: &[&str] = &[
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

/// `AWS::S3::Bucket` properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketProps {
    /// Physical bucket name.
    pub bucket_name: Value,
    /// Public access settings.
    pub public_access_block_configuration: PublicAccessBlock,
}

impl BucketProps {
    /// Bucket with the given name and all public access blocked.
    #[must_use]
    pub const fn private(bucket_name: Value) -> Self {
        Self {
            bucket_name,
            public_access_block_configuration: PublicAccessBlock::block_all(),
        }
    }
}

/// Public access block of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlock {
    /// Reject requests carrying public ACLs.
    pub block_public_acls: bool,
    /// Reject bucket policies granting public access.
    pub block_public_policy: bool,
    /// Ignore public ACLs already present.
    pub ignore_public_acls: bool,
    /// Restrict access under a public policy to the owner and services.
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    /// Every public access path blocked.
    #[must_use]
    pub const fn block_all() -> Self {
        Self {
            block_public_acls: true,
            block_public_policy: true,
            ignore_public_acls: true,
            restrict_public_buckets: true,
        }
    }

    /// Returns true if no public access path is open.
    #[must_use]
    pub const fn is_fully_blocked(&self) -> bool {
        self.block_public_acls
            && self.block_public_policy
            && self.ignore_public_acls
            && self.restrict_public_buckets
    }
}

/// ARN of the bucket itself.
#[must_use]
pub fn bucket_arn(bucket: &LogicalId) -> Value {
    Value::get_att(bucket, "Arn")
}

/// ARN pattern matching every object in the bucket.
#[must_use]
pub fn objects_arn(bucket: &LogicalId) -> Value {
    Value::concat(vec![bucket_arn(bucket), Value::literal("/*")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_bucket_serializes_with_access_block() {
        let props = BucketProps::private(Value::literal("essay-checker-static-1"));
        let json = serde_json::to_value(&props).expect("serialize");
        assert_eq!(json["BucketName"], "essay-checker-static-1");
        let block = &json["PublicAccessBlockConfiguration"];
        assert_eq!(block["BlockPublicAcls"], true);
        assert_eq!(block["RestrictPublicBuckets"], true);
        assert!(props.public_access_block_configuration.is_fully_blocked());
    }

    #[test]
    fn objects_arn_appends_wildcard() {
        let bucket = LogicalId::new("StorageBucket").expect("valid id");
        let json = serde_json::to_value(objects_arn(&bucket)).expect("serialize");
        assert_eq!(json["Fn::Join"][1][1], "/*");
    }
}
