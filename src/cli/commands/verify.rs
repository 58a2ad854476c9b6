//! verify command - Check derived family data against its lattice

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;

use super::{load_facility, load_family_data, load_lattice};
use crate::cli::args::LatticeArgs;
use crate::cli::Context;
use crate::core::verify::verify_family_data;
use crate::ui::output;

#[derive(Serialize)]
struct Report {
    ok: bool,
    errors: Vec<String>,
}

/// Verify computed or supplied family data.
///
/// Fails (non-zero exit) when any problem is found.
pub fn verify(ctx: &Context, source: &LatticeArgs, family_data: Option<&Path>) -> Result<()> {
    let facility = load_facility(ctx, &source.facility)?;
    let lattice = load_lattice(&source.lattice)?;
    let data = match family_data {
        Some(path) => load_family_data(path)?,
        None => facility
            .family_data(&lattice)
            .context("failed to compute family data")?,
    };

    let result = verify_family_data(&facility, &lattice, &data);
    let report = Report {
        ok: result.ok,
        errors: result.errors.iter().map(|e| e.to_string()).collect(),
    };

    if ctx.json {
        output::json(&report)?;
    } else if report.ok {
        output::print(
            format!("ok: {} families verified", data.len()),
            ctx.verbosity(),
        );
    } else {
        output::print(output::format_list(&report.errors, "  - "), ctx.verbosity());
    }

    if !report.ok {
        bail!("verification found {} problem(s)", report.errors.len());
    }
    Ok(())
}
