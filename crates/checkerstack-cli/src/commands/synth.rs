//! `ckst synth` — Write the deployment template.

use std::path::PathBuf;

use anyhow::Context;
use checkerstack_stack::OutputFormat;
use clap::{Args, ValueEnum};

use super::TargetArgs;

/// Template serialization accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum FormatArg {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Template format.
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Write the template to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Builds and validates the stack and renders its template.
///
/// # Errors
///
/// Returns an error if the stack fails validation or serialization fails.
pub fn render(target: &TargetArgs, format: FormatArg) -> anyhow::Result<String> {
    let stack = target.build()?;
    Ok(checkerstack_stack::synthesize(&stack, format.into())?)
}

/// Executes the `synth` command.
///
/// Renders the template in the requested format to stdout or a file.
///
/// # Errors
///
/// Returns an error if the stack fails validation or the file cannot be written.
pub fn execute(target: &TargetArgs, args: SynthArgs) -> anyhow::Result<()> {
    let rendered = render(target, args.format)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("failed to write template to {}", path.display()))?;
            tracing::info!(path = %path.display(), stack = %target.stack_name, "template written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
