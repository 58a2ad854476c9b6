//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::naming::NamingRule;

/// lnm - Family indexing and device naming for accelerator lattices
#[derive(Parser, Debug)]
#[command(name = "lnm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// A facility and a lattice file.
#[derive(Args, Debug, Clone)]
pub struct LatticeArgs {
    /// Facility name or path to a facility TOML file
    #[arg(short = 'F', long)]
    pub facility: String,

    /// Lattice JSON file (`[{"fam_name": ...}, ...]`)
    #[arg(short, long)]
    pub lattice: PathBuf,
}

/// A facility and either a lattice or precomputed family data.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Facility name or path to a facility TOML file
    #[arg(short = 'F', long)]
    pub facility: String,

    /// Lattice JSON file
    #[arg(
        short,
        long,
        conflicts_with = "family_data",
        required_unless_present = "family_data"
    )]
    pub lattice: Option<PathBuf>,

    /// Family data JSON file, as printed by `lnm family-data --json`
    #[arg(long)]
    pub family_data: Option<PathBuf>,
}

/// Where the naming rule comes from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct RuleArgs {
    /// Naming rule: 1, 2, subsystem-first or sector-first
    #[arg(long)]
    pub rule: Option<NamingRule>,

    /// Use the naming rule of this facility
    #[arg(short = 'F', long)]
    pub facility: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the section label of every lattice position
    #[command(
        name = "sections",
        after_help = "\
EXAMPLES:
    # Section spans of the transport line lattice
    lnm sections -F ts -l ts-lattice.json

    # One label per position, as JSON
    lnm sections -F ts -l ts-lattice.json --json"
    )]
    Sections {
        #[command(flatten)]
        source: LatticeArgs,
    },

    /// Compute per-family index groups, sections and instances
    #[command(
        name = "family-data",
        after_help = "\
EXAMPLES:
    # Summary of every family
    lnm family-data -F ts -l ts-lattice.json

    # Rotated to the facility's start element, as JSON
    lnm family-data -F ts -l ts-lattice.json --rotated --json"
    )]
    FamilyData {
        #[command(flatten)]
        source: LatticeArgs,

        /// Rotate to the facility's start element
        #[arg(long)]
        rotated: bool,

        /// Only show this family
        #[arg(long)]
        family: Option<String>,
    },

    /// List device names of one or all subsystems
    #[command(
        name = "devices",
        after_help = "\
EXAMPLES:
    # Every device of the facility
    lnm devices -F ts -l ts-lattice.json

    # Power supplies only, with index groups
    lnm devices -F ts -l ts-lattice.json -s ps --json

    # From family data computed earlier
    lnm devices -F ts --family-data ts-families.json"
    )]
    Devices {
        #[command(flatten)]
        source: SourceArgs,

        /// Subsystem (all subsystems when omitted)
        #[arg(short, long)]
        subsystem: Option<String>,
    },

    /// List per-installation device names of element layouts
    #[command(name = "elements")]
    Elements {
        #[command(flatten)]
        source: SourceArgs,

        /// Subsystem the names are built for
        #[arg(short, long)]
        subsystem: String,

        /// Element layout or alias (corr, hcorr, vcorr); all when omitted
        #[arg(short, long)]
        element: Option<String>,
    },

    /// List family-wide device names
    #[command(name = "families")]
    Families {
        #[command(flatten)]
        source: SourceArgs,

        /// Subsystem the names are built for
        #[arg(short, long)]
        subsystem: String,

        /// Family (all the subsystem selects when omitted)
        #[arg(long)]
        family: Option<String>,
    },

    /// List device names of the facility's magnet subsystems
    #[command(name = "magnets")]
    Magnets {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Join components into a device name
    #[command(
        name = "join",
        after_help = "\
EXAMPLES:
    lnm join ts bpm 01 02 --rule 2          # TS-02:BPM-01
    lnm join ts ps QF 01 1 --rule 1         # TS-PS:QF-01-1
    lnm join ts ma BEND 01 -F ts"
    )]
    Join {
        /// System (e.g. ts)
        system: String,

        /// Subsystem (e.g. ps)
        subsystem: String,

        /// Device (e.g. QF)
        device: String,

        /// Sector (e.g. 01, Fam)
        sector: String,

        /// Instance
        instance: Option<String>,

        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Split a device name into its components
    #[command(
        name = "split",
        after_help = "\
EXAMPLES:
    lnm split TS-02:BPM-01 --rule 2
    lnm split TS-01:PS-QF-1 -F ts --json"
    )]
    Split {
        /// Device name
        name: String,

        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Verify computed (or supplied) family data against a lattice
    #[command(name = "verify")]
    Verify {
        #[command(flatten)]
        source: LatticeArgs,

        /// Family data JSON file to verify instead of computing it
        #[arg(long)]
        family_data: Option<PathBuf>,
    },

    /// Show a facility's configuration summary
    #[command(name = "facility")]
    Facility {
        /// Facility name or path to a facility TOML file
        name: String,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn devices_requires_a_source() {
        let result = Cli::try_parse_from(["lnm", "devices", "-F", "ts"]);
        assert!(result.is_err());
    }

    #[test]
    fn devices_rejects_both_sources() {
        let result = Cli::try_parse_from([
            "lnm",
            "devices",
            "-F",
            "ts",
            "-l",
            "a.json",
            "--family-data",
            "b.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn join_needs_exactly_one_rule_source() {
        assert!(Cli::try_parse_from(["lnm", "join", "ts", "bpm", "01", "02"]).is_err());
        assert!(Cli::try_parse_from([
            "lnm", "join", "ts", "bpm", "01", "02", "--rule", "2", "-F", "ts"
        ])
        .is_err());

        let cli =
            Cli::try_parse_from(["lnm", "join", "ts", "bpm", "01", "02", "--rule", "2"]).unwrap();
        match cli.command {
            Command::Join { rule, instance, .. } => {
                assert_eq!(rule.rule, Some(NamingRule::SectorFirst));
                assert!(instance.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lnm", "split", "TS-02:BPM-01", "--rule", "2", "--json"])
            .unwrap();
        assert!(cli.json);
    }
}
