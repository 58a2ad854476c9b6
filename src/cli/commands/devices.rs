//! devices, elements, families and magnets commands - List device names

use anyhow::{Context as _, Result};

use super::{load_facility, source_family_data};
use crate::cli::args::SourceArgs;
use crate::cli::Context;
use crate::core::config::Facility;
use crate::core::devices::{DeviceNamer, DeviceTable};
use crate::ui::output;

/// Every device of one or all subsystems.
pub fn devices(ctx: &Context, source: &SourceArgs, subsystem: Option<&str>) -> Result<()> {
    with_namer(ctx, source, |namer| {
        namer
            .device_names(subsystem)
            .context("failed to expand device names")
    })
}

/// Per-installation names of element layouts.
pub fn elements(
    ctx: &Context,
    source: &SourceArgs,
    subsystem: &str,
    element: Option<&str>,
) -> Result<()> {
    with_namer(ctx, source, |namer| {
        namer
            .element_names(subsystem, element)
            .context("failed to expand element names")
    })
}

/// Family-wide names.
pub fn families(
    ctx: &Context,
    source: &SourceArgs,
    subsystem: &str,
    family: Option<&str>,
) -> Result<()> {
    with_namer(ctx, source, |namer| {
        namer
            .family_names(subsystem, family)
            .context("failed to expand family names")
    })
}

/// Names of the facility's magnet subsystems.
pub fn magnets(ctx: &Context, source: &SourceArgs) -> Result<()> {
    with_namer(ctx, source, |namer| {
        namer.magnet_names().context("failed to expand magnet names")
    })
}

fn with_namer<F>(ctx: &Context, source: &SourceArgs, expand: F) -> Result<()>
where
    F: FnOnce(&DeviceNamer<'_>) -> Result<DeviceTable>,
{
    let facility: Facility = load_facility(ctx, &source.facility)?;
    let data = source_family_data(&facility, source)?;
    let namer = DeviceNamer::from_family_data(&facility, &data)
        .context("failed to rotate family data")?;
    output::debug(
        format!("numbering starts at position {}", namer.start()),
        ctx.verbosity(),
    );

    let table = expand(&namer)?;
    if ctx.json {
        return output::json(&table);
    }
    output::print(render(&table), ctx.verbosity());
    Ok(())
}

fn render(table: &DeviceTable) -> String {
    table
        .iter()
        .map(|(name, families)| {
            let mapped: Vec<String> = families
                .iter()
                .map(|(family, groups)| {
                    let groups = output::format_groups(groups.iter().map(|g| g.positions()));
                    format!("{} {}", family, groups)
                })
                .collect();
            if mapped.is_empty() {
                name.clone()
            } else {
                format!("{}  {}", name, mapped.join("  "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
