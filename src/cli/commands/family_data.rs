//! sections and family-data commands - Show derived lattice structure

use anyhow::{bail, Context as _, Result};

use super::{load_facility, load_lattice};
use crate::cli::args::LatticeArgs;
use crate::cli::Context;
use crate::core::family::FamilyData;
use crate::core::rotate::rotate_to_start;
use crate::core::sections::compute_sections;
use crate::ui::output;

/// Show the section label of every lattice position.
///
/// Text output lists one span per line; JSON output is one label per
/// position.
pub fn sections(ctx: &Context, source: &LatticeArgs) -> Result<()> {
    let facility = load_facility(ctx, &source.facility)?;
    let lattice = load_lattice(&source.lattice)?;
    let labeling = compute_sections(&lattice, facility.section_layout())
        .context("failed to compute sections")?;

    if ctx.json {
        return output::json(&labeling);
    }

    let lines: Vec<String> = labeling
        .spans()
        .iter()
        .map(|(label, range)| format!("{}  {}..={}", label, range.start, range.end - 1))
        .collect();
    output::print(output::format_list(&lines, ""), ctx.verbosity());
    Ok(())
}

/// Show per-family index groups with their section and instance labels.
pub fn family_data(
    ctx: &Context,
    source: &LatticeArgs,
    rotated: bool,
    family: Option<&str>,
) -> Result<()> {
    let facility = load_facility(ctx, &source.facility)?;
    let lattice = load_lattice(&source.lattice)?;
    let mut data = facility
        .family_data(&lattice)
        .context("failed to compute family data")?;

    if rotated {
        let start = facility
            .start()
            .resolve(&data)
            .context("failed to resolve start element")?;
        output::debug(format!("rotating to position {}", start), ctx.verbosity());
        data = rotate_to_start(&data, start);
    }

    if let Some(name) = family {
        data = data
            .iter()
            .filter(|(tag, _)| tag.as_str() == name)
            .map(|(tag, record)| (tag.clone(), record.clone()))
            .collect();
        if data.is_empty() {
            bail!("unknown family '{}'", name);
        }
    }

    if ctx.json {
        return output::json(&data);
    }

    output::print(render(&data), ctx.verbosity());
    Ok(())
}

fn render(data: &FamilyData) -> String {
    let mut lines = Vec::new();
    for (tag, record) in data.iter() {
        lines.push(format!("{} ({} installations)", tag, record.len()));
        for (group, section, instance) in record.iter() {
            let groups = output::format_groups([group.positions()]);
            if instance.as_component().is_some() {
                lines.push(format!("  {}  {}  {}", groups, section, instance));
            } else {
                lines.push(format!("  {}  {}", groups, section));
            }
        }
    }
    lines.join("\n")
}
