//! Registry references for the API handler image.

use std::path::Path;

use checkerstack_common::constants::{BOOTSTRAP_QUALIFIER, DOCKERFILE, IMAGE_EXCLUDES};
use checkerstack_common::error::{Result, StackError};
use checkerstack_common::types::Sha256Hash;
use serde::{Deserialize, Serialize};

use crate::exclude::ExcludeSet;

/// Placeholder substituted by the backend with the deploying account.
pub const ACCOUNT_PLACEHOLDER: &str = "${AWS::AccountId}";
/// Placeholder substituted by the backend with the deploying region.
pub const REGION_PLACEHOLDER: &str = "${AWS::Region}";
/// Placeholder substituted by the backend with the partition's domain suffix.
pub const URL_SUFFIX_PLACEHOLDER: &str = "${AWS::URLSuffix}";

const MAX_TAG_LEN: usize = 128;

/// Image in a container registry, addressed by tag or digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Repository name. `None` selects the bootstrap asset repository.
    pub repository: Option<String>,
    /// Tag, or `sha256:<hex>` digest.
    pub tag_or_digest: String,
}

impl ImageReference {
    /// Creates a reference to a tag or digest in the bootstrap repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a valid tag nor a digest.
    pub fn new(tag_or_digest: impl Into<String>) -> Result<Self> {
        let tag_or_digest = tag_or_digest.into();
        validate_tag_or_digest(&tag_or_digest)?;
        Ok(Self {
            repository: None,
            tag_or_digest,
        })
    }

    /// Creates a reference whose tag is the given content hash.
    #[must_use]
    pub fn from_hash(hash: &Sha256Hash) -> Self {
        Self {
            repository: None,
            tag_or_digest: hash.as_hex().to_string(),
        }
    }

    /// Fingerprints a build context with the stack's dockerfile, the
    /// context's `.dockerignore`, and the stack's excludes, and references
    /// the resulting tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be fingerprinted.
    pub fn from_build_context(context_dir: &Path) -> Result<Self> {
        let excludes = ExcludeSet::for_context(context_dir, IMAGE_EXCLUDES)?;
        let hash = crate::hash::fingerprint_context(context_dir, DOCKERFILE, &excludes)?;
        Ok(Self::from_hash(&hash))
    }

    /// Points the reference at an explicit repository.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Returns true if the reference pins an immutable digest.
    #[must_use]
    pub fn is_digest(&self) -> bool {
        self.tag_or_digest.starts_with("sha256:")
    }

    /// Renders the image URI.
    ///
    /// Unpinned account or region are emitted as backend placeholders, so
    /// the result may need substitution before it is a literal URI.
    #[must_use]
    pub fn uri(&self, account: Option<&str>, region: Option<&str>) -> String {
        let account = account.unwrap_or(ACCOUNT_PLACEHOLDER);
        let region = region.unwrap_or(REGION_PLACEHOLDER);
        let repository = self.repository.clone().unwrap_or_else(|| {
            format!("cdk-{BOOTSTRAP_QUALIFIER}-container-assets-{account}-{region}")
        });
        let separator = if self.is_digest() { '@' } else { ':' };
        format!(
            "{account}.dkr.ecr.{region}.{URL_SUFFIX_PLACEHOLDER}/{repository}{separator}{}",
            self.tag_or_digest
        )
    }
}

fn validate_tag_or_digest(value: &str) -> Result<()> {
    if let Some(hex) = value.strip_prefix("sha256:") {
        let _ = Sha256Hash::from_hex(hex)?;
        return Ok(());
    }
    let mut chars = value.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok || value.len() > MAX_TAG_LEN {
        return Err(StackError::Config {
            message: format!("invalid image tag: {value:?}"),
        });
    }
    Ok(())
}
