//! join and split commands - Convert between device names and components

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::load_facility;
use crate::cli::args::RuleArgs;
use crate::cli::Context;
use crate::core::naming::{NamingConvention, NamingRule};
use crate::ui::output;

#[derive(Serialize)]
struct Joined<'a> {
    name: &'a str,
    rule: NamingRule,
}

/// Join components into a device name.
pub fn join(
    ctx: &Context,
    rule: &RuleArgs,
    system: &str,
    subsystem: &str,
    device: &str,
    sector: &str,
    instance: Option<&str>,
) -> Result<()> {
    let naming = convention(ctx, rule)?;
    let name = naming
        .join_name(system, subsystem, device, sector, instance)
        .context("failed to join device name")?;

    if ctx.json {
        return output::json(&Joined {
            name: &name,
            rule: naming.rule(),
        });
    }
    output::print(name, ctx.verbosity());
    Ok(())
}

/// Split a device name into its components.
pub fn split(ctx: &Context, rule: &RuleArgs, name: &str) -> Result<()> {
    let naming = convention(ctx, rule)?;
    let parts = naming
        .split_name(name)
        .context("failed to split device name")?;

    if ctx.json {
        return output::json(&parts);
    }

    let mut lines = vec![
        format!("system:    {}", parts.system()),
        format!("sector:    {}", parts.sector()),
        format!("subsystem: {}", parts.subsystem()),
        format!("device:    {}", parts.device()),
    ];
    if let Some(instance) = parts.instance() {
        lines.push(format!("instance:  {}", instance));
    }
    output::print(lines.join("\n"), ctx.verbosity());
    Ok(())
}

fn convention(ctx: &Context, rule: &RuleArgs) -> Result<NamingConvention> {
    match (&rule.rule, &rule.facility) {
        (Some(rule), _) => Ok(NamingConvention::new(*rule)),
        (None, Some(name)) => Ok(load_facility(ctx, name)?.naming().clone()),
        (None, None) => anyhow::bail!("either --rule or --facility is required"),
    }
}
