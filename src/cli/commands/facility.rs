//! facility command - Show a facility's configuration summary

use anyhow::Result;
use serde::Serialize;

use super::load_facility;
use crate::cli::Context;
use crate::core::naming::NamingRule;
use crate::ui::output;

#[derive(Serialize)]
struct Summary<'a> {
    system: &'a str,
    source: Option<String>,
    naming_rule: NamingRule,
    dipole: &'a str,
    sections: usize,
    dipole_groups: usize,
    segmented_families: usize,
    composites: Vec<&'a str>,
    subsystems: Vec<&'a str>,
    elements: Vec<&'a str>,
    magnet_subsystems: &'a [String],
}

/// Show a facility's configuration summary.
pub fn facility(ctx: &Context, name: &str) -> Result<()> {
    let facility = load_facility(ctx, name)?;
    let config = facility.config();
    let layout = facility.section_layout();

    let summary = Summary {
        system: facility.system(),
        source: facility.source().map(|p| p.display().to_string()),
        naming_rule: facility.naming().rule(),
        dipole: layout.dipole().as_str(),
        sections: layout.count(),
        dipole_groups: layout.dipole_groups(),
        segmented_families: facility.segments().iter().count(),
        composites: facility
            .composites()
            .iter()
            .map(|c| c.name.as_str())
            .collect(),
        subsystems: config.subsystems.keys().map(String::as_str).collect(),
        elements: config.elements.keys().map(String::as_str).collect(),
        magnet_subsystems: &config.magnet_subsystems,
    };

    if ctx.json {
        return output::json(&summary);
    }

    let lines = [
        format!("system:      {}", summary.system),
        format!("naming rule: {}", summary.naming_rule),
        format!(
            "sections:    {} (dipole '{}', {} groups)",
            summary.sections, summary.dipole, summary.dipole_groups
        ),
        format!("families:    {} segmented", summary.segmented_families),
        format!("composites:  {}", summary.composites.join(", ")),
        format!("subsystems:  {}", summary.subsystems.join(", ")),
        format!("elements:    {}", summary.elements.join(", ")),
        format!("magnets:     {}", summary.magnet_subsystems.join(", ")),
    ];
    output::print(lines.join("\n"), ctx.verbosity());
    Ok(())
}
