//! core
//!
//! Core domain types, algorithms, and configuration for lattice naming.
//!
//! # Modules
//!
//! - [`types`] - Strong types: FamilyTag, SectionLabel, IndexGroup, etc.
//! - [`lattice`] - Read-only lattice input model
//! - [`sections`] - Section mapping from dipole positions
//! - [`segment`] - Grouping of raw positions into logical elements
//! - [`instance`] - Instance numbering within a section
//! - [`family`] - Per-family records (index, subsection, instance)
//! - [`rotate`] - Index rotation to the start element
//! - [`naming`] - Device name rules: join and split
//! - [`devices`] - Device table expansion
//! - [`cache`] - Caller-owned family data cache
//! - [`verify`] - Structural verification of derived data
//! - [`config`] - Facility configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Every operation is a pure function of its inputs
//! - Output is deterministic: all maps are ordered

pub mod cache;
pub mod config;
pub mod devices;
pub mod family;
pub mod instance;
pub mod lattice;
pub mod naming;
pub mod rotate;
pub mod sections;
pub mod segment;
pub mod types;
pub mod verify;
