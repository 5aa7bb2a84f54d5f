//! `ckst plan` — Display resources in provisioning order.

use std::fmt::Write as _;

use clap::Args;

use super::TargetArgs;
use crate::output::{format_value, rule};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Also list each resource's direct dependencies.
    #[arg(long)]
    pub dependencies: bool,
}

/// Builds the stack and lays out its resources in topological order.
///
/// # Errors
///
/// Returns an error if the stack fails validation or graph resolution fails.
pub fn render(target: &TargetArgs, args: &PlanArgs) -> anyhow::Result<String> {
    let stack = target.build()?;
    let graph = stack.dependency_graph()?;
    let order = graph.resolve_order()?;

    let mut out = String::new();
    let heading = format!("Deployment Plan for: {}", stack.name);
    writeln!(out, "{heading}")?;
    writeln!(out, "{}", rule(heading.chars().count()))?;
    writeln!(out)?;

    for id in &order {
        let Some(resource) = stack.resource(id.as_str()) else {
            continue;
        };
        writeln!(out, "  + {id} ({})", resource.resource_type())?;
        if let Some(policy) = resource.removal_policy {
            writeln!(out, "      removal: {policy}")?;
        }
        if let Some(function) = resource.properties.as_function() {
            writeln!(out, "      image: {}", format_value(&function.code.image_uri))?;
            writeln!(out, "      memory: {} MB", function.memory_size)?;
            writeln!(out, "      timeout: {}s", function.timeout)?;
        }
        if let Some(route) = resource.properties.as_route() {
            writeln!(out, "      route: {}", route.route_key)?;
        }
        if args.dependencies {
            let deps = graph.dependencies_of(id.as_str());
            if !deps.is_empty() {
                let names: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
                writeln!(out, "      after: {}", names.join(", "))?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "  {} resource(s) will be provisioned.", order.len())?;
    Ok(out)
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if the stack fails validation or graph resolution fails.
pub fn execute(target: &TargetArgs, args: PlanArgs) -> anyhow::Result<()> {
    print!("{}", render(target, &args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::pinned_target;

    fn line_of(plan: &str, needle: &str) -> usize {
        plan.lines()
            .position(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("{needle} missing from plan:\n{plan}"))
    }

    #[test]
    fn plan_lists_resources_in_provisioning_order() {
        let plan = render(&pinned_target(), &PlanArgs { dependencies: false }).expect("plan");
        assert!(plan.starts_with("Deployment Plan for: EssayCheckerApiStack"));
        assert!(plan.contains("12 resource(s) will be provisioned."));
        assert!(line_of(&plan, "+ ApiHandlerApiGatewayInvoke") < line_of(&plan, "+ ApiGateway ("));
        assert!(line_of(&plan, "+ TaskQueue") < line_of(&plan, "+ ApiHandler ("));
        assert!(plan.contains("route: ANY /{proxy+}"));
        assert!(plan.contains("memory: 1024 MB"));
        assert!(!plan.contains("after:"));
    }

    #[test]
    fn plan_shows_dependencies_on_request() {
        let plan = render(&pinned_target(), &PlanArgs { dependencies: true }).expect("plan");
        let gateway = line_of(&plan, "+ ApiGateway (");
        let after = plan
            .lines()
            .skip(gateway)
            .find(|l| l.contains("after:"))
            .expect("gateway dependencies");
        assert!(after.contains("ApiHandlerApiGatewayInvoke"), "got: {after}");
    }

    #[test]
    fn execute_prints_plan() {
        execute(&pinned_target(), PlanArgs { dependencies: true }).expect("plan");
    }
}
