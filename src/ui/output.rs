//! ui::output
//!
//! Terminal output for lnm.
//!
//! Results (device tables, family data, split names) go to stdout;
//! diagnostics go to stderr. `--quiet` silences both except errors.
//! `--json` results are printed even in quiet mode, since scripts consume
//! them.

use std::fmt::Display;

use anyhow::{Context as _, Result};
use serde::Serialize;

/// How much a command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet`: errors and JSON only
    Quiet,
    Normal,
    /// `--debug`: pipeline details on stderr
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a result line to stdout.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a `[debug]` line to stderr.
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error to stderr, regardless of verbosity.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a non-fatal warning (e.g. a facility load warning) to stderr.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print pretty JSON to stdout.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format index groups compactly: `[3] [7,8]`.
pub fn format_groups<'a>(groups: impl IntoIterator<Item = &'a [usize]>) -> String {
    groups
        .into_iter()
        .map(|g| {
            let inner = g.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",");
            format!("[{}]", inner)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn list_formatting() {
        assert_eq!(format_list(&["a", "b"], "  "), "  a\n  b");
        assert_eq!(format_list::<&str>(&[], "- "), "");
    }

    #[test]
    fn group_formatting() {
        let groups: Vec<Vec<usize>> = vec![vec![3], vec![7, 8]];
        assert_eq!(
            format_groups(groups.iter().map(Vec::as_slice)),
            "[3] [7,8]"
        );
    }
}
