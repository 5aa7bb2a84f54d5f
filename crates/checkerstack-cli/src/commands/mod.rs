//! CLI command definitions and dispatch.

pub mod outputs;
pub mod plan;
pub mod synth;

use std::path::PathBuf;

use anyhow::Context;
use checkerstack_asset::reference::ImageReference;
use checkerstack_common::config::ProvisioningContext;
use checkerstack_common::constants::{ACCOUNT_ENV, BIN_NAME, DEFAULT_STACK_NAME, REGION_ENV};
use checkerstack_stack::Stack;
use clap::{Args, Parser, Subcommand};

/// Essay Checker stack — synthesize and inspect the deployment template.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Deployment target shared by every subcommand.
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Where the stack is deployed and which handler image it runs.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Account id. Left to the backend when unset.
    #[arg(long, global = true, env = ACCOUNT_ENV)]
    pub account: Option<String>,

    /// Region. Left to the backend when unset.
    #[arg(long, global = true, env = REGION_ENV)]
    pub region: Option<String>,

    /// Stack name.
    #[arg(long, global = true, default_value = DEFAULT_STACK_NAME)]
    pub stack_name: String,

    /// Handler image tag or `sha256:` digest, instead of fingerprinting a build context.
    #[arg(long, global = true, conflicts_with = "context_dir")]
    pub image_tag: Option<String>,

    /// Build context of the handler image; its fingerprint becomes the tag.
    #[arg(long, global = true, default_value = ".")]
    pub context_dir: PathBuf,
}

impl TargetArgs {
    /// Provisioning context from the account, region, and stack name.
    #[must_use]
    pub fn context(&self) -> ProvisioningContext {
        ProvisioningContext::new(self.account.clone(), self.region.clone())
            .with_stack_name(self.stack_name.clone())
    }

    /// Handler image from an explicit tag or the build context fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is invalid or the build context cannot be read.
    pub fn image(&self) -> anyhow::Result<ImageReference> {
        match &self.image_tag {
            Some(tag) => Ok(ImageReference::new(tag.clone())?),
            None => ImageReference::from_build_context(&self.context_dir).with_context(|| {
                format!(
                    "failed to fingerprint build context {}",
                    self.context_dir.display()
                )
            }),
        }
    }

    /// Builds and validates the stack for this target.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be resolved or the stack fails validation.
    pub fn build(&self) -> anyhow::Result<Stack> {
        let ctx = self.context();
        let image = self.image()?;
        tracing::debug!(image = %image.tag_or_digest, "resolved handler image");
        Ok(checkerstack_stack::build_stack(&ctx, &image)?)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the deployment template.
    Synth(synth::SynthArgs),
    /// Display resources in provisioning order.
    Plan(plan::PlanArgs),
    /// List the values exposed after deployment.
    Outputs(outputs::OutputsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Synth(args) => synth::execute(&cli.target, args),
        Command::Plan(args) => plan::execute(&cli.target, args),
        Command::Outputs(args) => outputs::execute(&cli.target, args),
    }
}

/// Target pinned to a fixed account, region, and image tag.
#[cfg(test)]
pub(crate) fn pinned_target() -> TargetArgs {
    TargetArgs {
        account: Some("111111111111".into()),
        region: Some("us-east-1".into()),
        stack_name: DEFAULT_STACK_NAME.into(),
        image_tag: Some("latest".into()),
        context_dir: PathBuf::from("."),
    }
}
