//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the facility and its inputs
//! 2. Calls into the core to compute the result
//! 3. Formats and displays output (text or JSON)
//!
//! Handlers hold no state between calls.

mod completion;
mod devices;
mod facility;
mod family_data;
mod names;
mod verify;

pub use completion::completion;
pub use devices::{devices, elements, families, magnets};
pub use facility::facility;
pub use family_data::{family_data, sections};
pub use names::{join, split};
pub use verify::verify;

use std::path::Path;

use anyhow::{Context as _, Result};

use super::args::{Command, SourceArgs};
use super::Context;
use crate::core::config::Facility;
use crate::core::family::FamilyData;
use crate::core::lattice::Lattice;
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Sections { source } => family_data::sections(ctx, &source),
        Command::FamilyData {
            source,
            rotated,
            family,
        } => family_data::family_data(ctx, &source, rotated, family.as_deref()),
        Command::Devices { source, subsystem } => {
            devices::devices(ctx, &source, subsystem.as_deref())
        }
        Command::Elements {
            source,
            subsystem,
            element,
        } => devices::elements(ctx, &source, &subsystem, element.as_deref()),
        Command::Families {
            source,
            subsystem,
            family,
        } => devices::families(ctx, &source, &subsystem, family.as_deref()),
        Command::Magnets { source } => devices::magnets(ctx, &source),
        Command::Join {
            system,
            subsystem,
            device,
            sector,
            instance,
            rule,
        } => names::join(
            ctx,
            &rule,
            &system,
            &subsystem,
            &device,
            &sector,
            instance.as_deref(),
        ),
        Command::Split { name, rule } => names::split(ctx, &rule, &name),
        Command::Verify {
            source,
            family_data,
        } => verify::verify(ctx, &source, family_data.as_deref()),
        Command::Facility { name } => facility::facility(ctx, &name),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load a facility by name or path, reporting load warnings.
pub(crate) fn load_facility(ctx: &Context, name: &str) -> Result<Facility> {
    let result =
        Facility::resolve(name).with_context(|| format!("failed to load facility '{}'", name))?;
    for warning in &result.warnings {
        output::warn(
            format!("{}: {}", warning.path.display(), warning.message),
            ctx.verbosity(),
        );
    }
    Ok(result.facility)
}

pub(crate) fn load_lattice(path: &Path) -> Result<Lattice> {
    Lattice::load(path).with_context(|| format!("failed to load lattice '{}'", path.display()))
}

pub(crate) fn load_family_data(path: &Path) -> Result<FamilyData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read family data '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse family data '{}'", path.display()))
}

/// Unrotated family data from whichever source the user gave.
pub(crate) fn source_family_data(facility: &Facility, source: &SourceArgs) -> Result<FamilyData> {
    match (&source.lattice, &source.family_data) {
        (Some(lattice), _) => {
            let lattice = load_lattice(lattice)?;
            facility
                .family_data(&lattice)
                .context("failed to compute family data")
        }
        (None, Some(path)) => load_family_data(path),
        (None, None) => anyhow::bail!("either --lattice or --family-data is required"),
    }
}
