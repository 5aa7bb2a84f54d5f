//! Provisioning context handed to the descriptor builder.

/// Account and region the stack is synthesized for.
///
/// Both are optional. An absent value leaves the field to the provisioning
/// backend, which substitutes the deploying account or region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningContext {
    /// Stack name used by the backend.
    pub stack_name: String,
    /// Twelve-digit account id, if pinned.
    pub account: Option<String>,
    /// Region code such as `us-east-1`, if pinned.
    pub region: Option<String>,
}

impl ProvisioningContext {
    /// Creates a context pinned to the given account and region.
    #[must_use]
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: account.filter(|a| !a.is_empty()),
            region: region.filter(|r| !r.is_empty()),
            ..Self::default()
        }
    }

    /// Overrides the stack name.
    #[must_use]
    pub fn with_stack_name(mut self, name: impl Into<String>) -> Self {
        self.stack_name = name.into();
        self
    }

    /// Returns true if neither account nor region is pinned.
    #[must_use]
    pub const fn is_environment_agnostic(&self) -> bool {
        self.account.is_none() && self.region.is_none()
    }
}

impl Default for ProvisioningContext {
    fn default() -> Self {
        Self {
            stack_name: crate::constants::DEFAULT_STACK_NAME.to_string(),
            account: None,
            region: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_agnostic() {
        let ctx = ProvisioningContext::default();
        assert!(ctx.is_environment_agnostic());
        assert_eq!(ctx.stack_name, "EssayCheckerApiStack");
    }

    #[test]
    fn empty_values_count_as_absent() {
        let ctx = ProvisioningContext::new(Some(String::new()), Some("us-east-1".into()));
        assert_eq!(ctx.account, None);
        assert_eq!(ctx.region.as_deref(), Some("us-east-1"));
        assert!(!ctx.is_environment_agnostic());
    }

    #[test]
    fn stack_name_override() {
        let ctx = ProvisioningContext::default().with_stack_name("Staging");
        assert_eq!(ctx.stack_name, "Staging");
    }
}
