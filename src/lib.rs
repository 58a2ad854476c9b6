//! latticenames - Family indexing and device naming for accelerator lattices
//!
//! Given an ordered lattice of family-tagged elements, latticenames groups
//! raw positions into logical installations, labels each with a section and
//! an instance number, rotates numbering to a configured start element, and
//! expands the result into symbolic control-system device names.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to core)
//! - [`core`] - Domain types, algorithms, verification, and configuration
//! - [`ui`] - Output formatting
//!
//! # Pipeline
//!
//! ```text
//! Lattice ─▶ sections ─┐
//!    │                 ├─▶ FamilyData ─▶ rotate ─▶ DeviceNamer ─▶ DeviceTable
//!    └─▶ segments ─────┘
//! ```
//!
//! # Example
//!
//! ```
//! use latticenames::core::config::Facility;
//! use latticenames::core::devices::DeviceNamer;
//! use latticenames::core::lattice::Lattice;
//!
//! let facility = Facility::from_toml(r#"
//!     system = "ts"
//!     [sections]
//!     dipole = "b"
//!     count = 2
//!     [segments]
//!     b = 1
//!     bpm = 1
//!     [subsystems.di]
//!     elements = ["bpm"]
//!     [elements.bpm]
//!     category = "monitor"
//!     from_families = ["bpm"]
//! "#).unwrap();
//!
//! let lattice = Lattice::from_tags(["bpm", "b", "bpm", "bpm", "b"]).unwrap();
//! let namer = DeviceNamer::from_lattice(&facility, &lattice).unwrap();
//! let table = namer.device_names(Some("di")).unwrap();
//! let names: Vec<_> = table.names().collect();
//! assert_eq!(names, vec!["TS-01:DI-BPM", "TS-02:DI-BPM-1", "TS-02:DI-BPM-2"]);
//! ```

pub mod cli;
pub mod core;
pub mod ui;
