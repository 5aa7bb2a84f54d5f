//! `ckst outputs` — List the values exposed after deployment.

use std::fmt::Write as _;

use clap::Args;

use super::TargetArgs;
use crate::output::format_value;

/// Arguments for the `outputs` command.
#[derive(Args, Debug)]
pub struct OutputsArgs {
    /// Print the outputs as a JSON object of backend values.
    #[arg(long)]
    pub json: bool,
}

/// Builds the stack and lists its outputs as a table or JSON.
///
/// # Errors
///
/// Returns an error if the stack fails validation or serialization fails.
pub fn render(target: &TargetArgs, args: &OutputsArgs) -> anyhow::Result<String> {
    let stack = target.build()?;

    if args.json {
        let map: serde_json::Map<String, serde_json::Value> = stack
            .outputs
            .iter()
            .map(|o| serde_json::to_value(&o.value).map(|v| (o.logical_id.to_string(), v)))
            .collect::<Result<_, _>>()?;
        let mut out = serde_json::to_string_pretty(&map)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::from("OUTPUT\tVALUE\n");
    for output in &stack.outputs {
        writeln!(out, "{}\t{}", output.logical_id, format_value(&output.value))?;
    }
    Ok(out)
}

/// Executes the `outputs` command.
///
/// # Errors
///
/// Returns an error if the stack fails validation or serialization fails.
pub fn execute(target: &TargetArgs, args: OutputsArgs) -> anyhow::Result<()> {
    print!("{}", render(target, &args)?);
    Ok(())
}
