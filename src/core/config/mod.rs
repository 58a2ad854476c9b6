//! core::config
//!
//! Facility configuration loading and initialization.
//!
//! # Overview
//!
//! A facility (transport line, booster, storage ring) is described by one
//! TOML file. Loading parses and validates it; [`Facility::initialize`] then
//! turns it into the immutable runtime object every operation takes.
//!
//! # Facility Locations
//!
//! A facility given by name is searched in order:
//! 1. `$LATTICENAMES_FACILITY_DIR/<name>.toml` if set
//! 2. `$XDG_CONFIG_HOME/latticenames/facilities/<name>.toml`
//! 3. `~/.latticenames/facilities/<name>.toml`
//!
//! A name containing a path separator or ending in `.toml` is read directly.
//!
//! # Example
//!
//! ```no_run
//! use latticenames::core::config::Facility;
//! use std::path::Path;
//!
//! let result = Facility::load(Path::new("facilities/ts.toml")).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//! let facility = result.facility;
//! println!("system: {}", facility.system());
//! ```

pub mod schema;

pub use schema::{
    ElementCategory, ElementLayout, FacilityConfig, FamilyNamesConfig, FixedDevice, LayoutEntry,
    SectionsConfig, SubsystemConfig,
};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::family::{FamilyData, FamilyError};
use super::lattice::Lattice;
use super::naming::NamingConvention;
use super::rotate::StartElement;
use super::sections::SectionLayout;
use super::segment::{CompositeFamily, SegmentTable};

/// Environment variable naming an extra facility directory.
pub const FACILITY_DIR_ENV: &str = "LATTICENAMES_FACILITY_DIR";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read facility file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse facility file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid facility value: {0}")]
    InvalidValue(String),

    #[error("facility '{name}' not found (searched: {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("home directory not found")]
    NoHomeDir,
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no search locations".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Warnings generated during facility loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The file that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading a facility.
#[derive(Debug)]
pub struct FacilityLoadResult {
    /// The initialized facility.
    pub facility: Facility,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Immutable per-facility configuration.
///
/// Built once by [`Facility::initialize`] and passed by reference to every
/// operation; nothing in it changes afterwards, so it can be shared freely
/// across threads.
#[derive(Debug, Clone)]
pub struct Facility {
    config: FacilityConfig,
    naming: NamingConvention,
    layout: SectionLayout,
    source: Option<PathBuf>,
}

impl Facility {
    /// Validate `config` and build the runtime facility.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the config is inconsistent.
    pub fn initialize(config: FacilityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let naming = config.naming_convention()?;
        let layout = config.section_layout()?;
        Ok(Self {
            config,
            naming,
            layout,
            source: None,
        })
    }

    /// Parse and initialize a facility from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` or `ConfigError::InvalidValue`.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: FacilityConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        Self::initialize(config)
    }

    /// Load a facility file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<FacilityLoadResult, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: FacilityConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let warnings = Self::collect_warnings(&config, path);
        let mut facility = Self::initialize(config)?;
        facility.source = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), system = facility.system(), "loaded facility");

        Ok(FacilityLoadResult { facility, warnings })
    }

    /// Load a facility by name or path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no search location has the file.
    pub fn resolve(name_or_path: &str) -> Result<FacilityLoadResult, ConfigError> {
        let path = Self::find(name_or_path)?;
        Self::load(&path)
    }

    /// Locate a facility file by name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` listing the searched paths.
    pub fn find(name_or_path: &str) -> Result<PathBuf, ConfigError> {
        if name_or_path.ends_with(".toml") || name_or_path.contains(std::path::MAIN_SEPARATOR) {
            let path = PathBuf::from(name_or_path);
            if path.exists() {
                return Ok(path);
            }
            return Err(ConfigError::NotFound {
                name: name_or_path.to_string(),
                searched: vec![path],
            });
        }

        Self::first_existing(name_or_path, Self::search_paths(name_or_path))
    }

    /// Candidate paths for a facility name, in search order.
    pub fn search_paths(name: &str) -> Vec<PathBuf> {
        Self::search_paths_from(
            name,
            std::env::var_os(FACILITY_DIR_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        )
    }

    fn search_paths_from(
        name: &str,
        facility_dir: Option<PathBuf>,
        xdg_home: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let file = format!("{}.toml", name);
        let mut paths = Vec::new();

        // 1. $LATTICENAMES_FACILITY_DIR
        if let Some(dir) = facility_dir {
            paths.push(dir.join(&file));
        }

        // 2. $XDG_CONFIG_HOME/latticenames/facilities
        if let Some(xdg_home) = xdg_home {
            paths.push(xdg_home.join("latticenames/facilities").join(&file));
        }

        // 3. ~/.latticenames/facilities
        if let Ok(dir) = Self::user_facility_dir() {
            paths.push(dir.join(&file));
        }

        paths
    }

    fn first_existing(name: &str, searched: Vec<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(found) = searched.iter().find(|p| p.exists()) {
            return Ok(found.clone());
        }
        Err(ConfigError::NotFound {
            name: name.to_string(),
            searched,
        })
    }

    /// Canonical per-user facility directory: `~/.latticenames/facilities`.
    pub fn user_facility_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".latticenames/facilities"))
    }

    fn collect_warnings(config: &FacilityConfig, path: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |message: String| {
            warnings.push(ConfigWarning {
                message,
                path: path.to_path_buf(),
            })
        };

        for (name, subsystem) in &config.subsystems {
            if subsystem.is_empty() {
                warn(format!("subsystem '{}' selects no devices", name));
            }
        }
        for (name, layout) in &config.elements {
            if layout.is_empty() {
                warn(format!("element layout '{}' has no devices", name));
            }
        }
        if config.start.is_none() {
            warn("no [start] element configured, numbering starts at position 0".to_string());
        }

        warnings
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The parsed configuration.
    pub fn config(&self) -> &FacilityConfig {
        &self.config
    }

    /// File the facility was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// System prefix of device names.
    pub fn system(&self) -> &str {
        &self.config.system
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn section_layout(&self) -> &SectionLayout {
        &self.layout
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.config.segments
    }

    pub fn composites(&self) -> &[CompositeFamily] {
        &self.config.composite
    }

    /// Start element; position 0 when unset.
    pub fn start(&self) -> StartElement {
        self.config.start.clone().unwrap_or_default()
    }

    /// Sector label of family-wide names.
    pub fn family_sector(&self) -> &str {
        self.config.family_sector_label()
    }

    /// Sector label of system-wide names.
    pub fn global_sector(&self) -> &str {
        self.config.global_sector_label()
    }

    /// Derive (unrotated) family data for `lattice` under this facility.
    ///
    /// # Errors
    ///
    /// Propagates section-mapping and segmentation failures.
    pub fn family_data(&self, lattice: &Lattice) -> Result<FamilyData, FamilyError> {
        FamilyData::compute(
            lattice,
            &self.layout,
            &self.config.segments,
            &self.config.composite,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::naming::NamingRule;
    use std::io::Write;
    use tempfile::TempDir;

    const FACILITY: &str = r#"
        system = "tb"
        naming_rule = 1

        [sections]
        dipole = "b"
        count = 2

        [segments]
        b = 1
        qf = 1

        [subsystems.ps]
        elements = ["quad"]

        [subsystems.empty]

        [elements.quad]
        category = "quadrupole"
        device = "QF"
        devices = [{ sector = "01", family = "qf" }]
    "#;

    fn write_facility(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    mod initialize {
        use super::*;

        #[test]
        fn from_toml_builds_facility() {
            let facility = Facility::from_toml(FACILITY).unwrap();
            assert_eq!(facility.system(), "tb");
            assert_eq!(facility.naming().rule(), NamingRule::SubsystemFirst);
            assert_eq!(facility.section_layout().count(), 2);
            assert_eq!(facility.start(), StartElement::Position(0));
            assert_eq!(facility.family_sector(), "Fam");
        }

        #[test]
        fn invalid_config_rejected() {
            let broken = FACILITY.replace("count = 2", "count = 0");
            assert!(matches!(
                Facility::from_toml(&broken),
                Err(ConfigError::InvalidValue(_))
            ));
        }

        #[test]
        fn parse_error_reported() {
            assert!(matches!(
                Facility::from_toml("system = "),
                Err(ConfigError::ParseError { .. })
            ));
        }

        #[test]
        fn facility_is_send_and_sync() {
            fn assert_send_sync<T: Send + Sync>() {}
            assert_send_sync::<Facility>();
        }
    }

    mod load {
        use super::*;

        #[test]
        fn load_collects_warnings() {
            let temp = TempDir::new().unwrap();
            let path = write_facility(temp.path(), "tb.toml", FACILITY);

            let result = Facility::load(&path).unwrap();
            assert_eq!(result.facility.source(), Some(path.as_path()));
            let messages: Vec<_> = result.warnings.iter().map(|w| w.message.as_str()).collect();
            assert!(messages.iter().any(|m| m.contains("'empty'")));
            assert!(messages.iter().any(|m| m.contains("[start]")));
        }

        #[test]
        fn missing_file_is_read_error() {
            let temp = TempDir::new().unwrap();
            let result = Facility::load(&temp.path().join("nope.toml"));
            assert!(matches!(result, Err(ConfigError::ReadError { .. })));
        }

        #[test]
        fn find_direct_path() {
            let temp = TempDir::new().unwrap();
            let path = write_facility(temp.path(), "tb.toml", FACILITY);
            let found = Facility::find(path.to_str().unwrap()).unwrap();
            assert_eq!(found, path);
        }

        #[test]
        fn find_missing_direct_path() {
            let result = Facility::find("/definitely/not/here.toml");
            assert!(matches!(result, Err(ConfigError::NotFound { .. })));
        }

        #[test]
        fn search_order_prefers_facility_dir() {
            let facility_dir = PathBuf::from("/srv/facilities");
            let xdg = PathBuf::from("/home/op/.config");
            let paths = Facility::search_paths_from("tb", Some(facility_dir), Some(xdg));
            assert_eq!(paths[0], PathBuf::from("/srv/facilities/tb.toml"));
            assert_eq!(
                paths[1],
                PathBuf::from("/home/op/.config/latticenames/facilities/tb.toml")
            );
        }

        #[test]
        fn first_existing_candidate_wins() {
            let facility_dir = TempDir::new().unwrap();
            let xdg = TempDir::new().unwrap();
            let xdg_facilities = xdg.path().join("latticenames/facilities");
            fs::create_dir_all(&xdg_facilities).unwrap();
            let path = write_facility(&xdg_facilities, "booster-test.toml", FACILITY);

            let searched = Facility::search_paths_from(
                "booster-test",
                Some(facility_dir.path().to_path_buf()),
                Some(xdg.path().to_path_buf()),
            );
            assert!(!searched[0].exists());
            assert_eq!(
                Facility::first_existing("booster-test", searched).unwrap(),
                path
            );
        }

        #[test]
        fn missing_name_lists_searched_paths() {
            let temp = TempDir::new().unwrap();
            let searched = Facility::search_paths_from(
                "no-such-facility",
                Some(temp.path().to_path_buf()),
                None,
            );
            match Facility::first_existing("no-such-facility", searched) {
                Err(ConfigError::NotFound { searched, .. }) => {
                    assert_eq!(searched[0], temp.path().join("no-such-facility.toml"));
                }
                other => panic!("expected NotFound, got {:?}", other),
            }
        }
    }
}
