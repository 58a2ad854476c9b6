//! core::config::schema
//!
//! Facility configuration schema types.
//!
//! # Facility Config
//!
//! One TOML document per facility (transport line, booster, ring). It holds
//! every per-facility constant: segment counts, section layout, start
//! element, naming rule, and the device layouts that attach sectors and
//! instances to physical installations.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they are mutually
//! consistent (e.g. every layout references a family with a segment count).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::naming::{DeviceName, NamingConvention, NamingRule, FAMILY_SECTOR, GLOBAL_SECTOR};
use crate::core::rotate::StartElement;
use crate::core::sections::SectionLayout;
use crate::core::segment::{CompositeFamily, SegmentTable};
use crate::core::types::FamilyTag;

/// Element selectors that expand to every layout of a category group.
pub const CATEGORY_ALIASES: &[&str] = &["corr", "hcorr", "vcorr"];

/// Facility configuration.
///
/// # Example
///
/// ```toml
/// system = "ts"
/// naming_rule = "sector-first"
/// magnet_subsystems = ["ma"]
///
/// [sections]
/// dipole = "bend"
/// count = 4
/// dipole_groups = 3
///
/// [start]
/// family = "start"
///
/// [segments]
/// bend = 2
/// qf = 1
///
/// [subsystems.ma]
/// elements = ["bend"]
///
/// [elements.bend]
/// category = "dipole"
/// devices = [
///     { sector = "01", family = "bend", group = 0 },
///     { sector = "02", family = "bend", group = 1 },
/// ]
///
/// [elements.bpm]
/// category = "monitor"
/// from_families = ["bpm"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FacilityConfig {
    /// System prefix of every device name (e.g. "ts")
    pub system: String,

    /// Device name serialization order
    #[serde(default = "default_naming_rule")]
    pub naming_rule: NamingRule,

    /// Sector label of family-wide names (default: "Fam")
    #[serde(default)]
    pub family_sector: Option<String>,

    /// Sector label of system-wide names (default: "Glob")
    #[serde(default)]
    pub global_sector: Option<String>,

    /// Subsystems whose device tables make up the magnet names
    #[serde(default)]
    pub magnet_subsystems: Vec<String>,

    /// Subsystems listed when no subsystem is selected (default: all)
    #[serde(default)]
    pub device_subsystems: Vec<String>,

    /// Section mapping constants
    pub sections: SectionsConfig,

    /// Where device numbering starts (default: position 0)
    #[serde(default)]
    pub start: Option<StartElement>,

    /// Segments per logical element, by family
    pub segments: SegmentTable,

    /// Virtual families built from tagged ones
    #[serde(default)]
    pub composite: Vec<CompositeFamily>,

    /// Subsystem selectors, by subsystem name
    #[serde(default)]
    pub subsystems: BTreeMap<String, SubsystemConfig>,

    /// Device layouts, by element selector
    #[serde(default)]
    pub elements: BTreeMap<String, ElementLayout>,

    /// Families that get a family-wide device name
    #[serde(default)]
    pub families: FamilyNamesConfig,
}

fn default_naming_rule() -> NamingRule {
    NamingRule::SectorFirst
}

/// Section mapping constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SectionsConfig {
    /// Dipole family whose positions delimit sections
    pub dipole: FamilyTag,

    /// Number of sections
    pub count: usize,

    /// Groups the dipoles are split into (default: `count`)
    #[serde(default)]
    pub dipole_groups: Option<usize>,
}

/// What a subsystem's device table contains.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SubsystemConfig {
    /// Element selectors (layout names or category aliases)
    pub elements: Vec<String>,

    /// Families with family-wide names
    pub families: Vec<FamilyTag>,

    /// Devices with no lattice counterpart, joined under the naming rule
    pub fixed: Vec<FixedDevice>,

    /// Literal device names with no lattice counterpart
    pub raw: Vec<String>,
}

impl SubsystemConfig {
    /// Whether the subsystem selects nothing.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
            && self.families.is_empty()
            && self.fixed.is_empty()
            && self.raw.is_empty()
    }
}

/// A device with no lattice elements (e.g. a timing module).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixedDevice {
    pub device: String,
    pub sector: String,
    #[serde(default)]
    pub instance: Option<String>,
}

/// Category of a physical element layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Dipole,
    Quadrupole,
    HorizontalCorrector,
    VerticalCorrector,
    PulsedMagnet,
    Monitor,
}

impl ElementCategory {
    /// Categories in the order their layouts are emitted.
    pub const ORDER: [ElementCategory; 6] = [
        ElementCategory::Dipole,
        ElementCategory::Quadrupole,
        ElementCategory::HorizontalCorrector,
        ElementCategory::VerticalCorrector,
        ElementCategory::PulsedMagnet,
        ElementCategory::Monitor,
    ];

    /// Whether the category belongs to a category alias selector.
    pub fn matches_alias(self, alias: &str) -> bool {
        match alias {
            "corr" => matches!(
                self,
                ElementCategory::HorizontalCorrector | ElementCategory::VerticalCorrector
            ),
            "hcorr" => self == ElementCategory::HorizontalCorrector,
            "vcorr" => self == ElementCategory::VerticalCorrector,
            _ => false,
        }
    }
}

/// Which physical installation gets which device name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElementLayout {
    /// Category of the layout
    pub category: ElementCategory,

    /// Default device component. Explicit entries fall back to the selector
    /// upper-cased, derived names to the family tag upper-cased.
    #[serde(default)]
    pub device: Option<String>,

    /// One entry per device name
    #[serde(default)]
    pub devices: Vec<LayoutEntry>,

    /// Families named per installation from their computed section and
    /// instance labels
    #[serde(default)]
    pub from_families: Vec<FamilyTag>,
}

impl ElementLayout {
    /// Whether the layout names nothing.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.from_families.is_empty()
    }

    /// Device component of `entry` within the layout keyed `selector`.
    pub fn device_for(&self, selector: &str, entry: Option<&LayoutEntry>) -> String {
        entry
            .and_then(|e| e.device.clone())
            .or_else(|| self.device.clone())
            .unwrap_or_else(|| selector.to_ascii_uppercase())
    }

    /// Device component of names derived from `family`.
    pub fn derived_device(&self, family: &FamilyTag) -> String {
        self.device
            .clone()
            .unwrap_or_else(|| family.as_str().to_ascii_uppercase())
    }
}

/// One device name of a layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutEntry {
    /// Device component (default: the layout's device)
    #[serde(default)]
    pub device: Option<String>,

    /// Sector component
    pub sector: String,

    /// Instance component
    #[serde(default)]
    pub instance: Option<String>,

    /// Family whose groups the name maps to
    pub family: FamilyTag,

    /// Group of the rotated family (default: every group)
    #[serde(default)]
    pub group: Option<usize>,
}

/// Families with family-wide device names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FamilyNamesConfig {
    pub names: Vec<FamilyTag>,
}

impl FacilityConfig {
    /// Naming convention of this facility.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for invalid reserved sectors.
    pub fn naming_convention(&self) -> Result<NamingConvention, ConfigError> {
        NamingConvention::with_reserved_sectors(
            self.naming_rule,
            [self.family_sector_label(), self.global_sector_label()],
        )
        .map_err(|e| ConfigError::InvalidValue(format!("invalid reserved sector: {}", e)))
    }

    /// Section layout of this facility.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for zero counts.
    pub fn section_layout(&self) -> Result<SectionLayout, ConfigError> {
        SectionLayout::new(
            self.sections.dipole.clone(),
            self.sections.count,
            self.sections.dipole_groups,
        )
        .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Sector label of family-wide names.
    pub fn family_sector_label(&self) -> &str {
        self.family_sector.as_deref().unwrap_or(FAMILY_SECTOR)
    }

    /// Sector label of system-wide names.
    pub fn global_sector_label(&self) -> &str {
        self.global_sector.as_deref().unwrap_or(GLOBAL_SECTOR)
    }

    /// Whether `family` has records after segmentation.
    pub fn knows_family(&self, family: &str) -> bool {
        self.segments.contains(family) || self.composite.iter().any(|c| c.name.as_str() == family)
    }

    /// Whether `selector` names a layout or a category alias, ignoring case.
    pub fn knows_element(&self, selector: &str) -> bool {
        let selector = selector.to_ascii_lowercase();
        self.elements.contains_key(&selector) || CATEGORY_ALIASES.contains(&selector.as_str())
    }

    /// Whether `name` selects a configured subsystem, ignoring case.
    pub fn knows_subsystem(&self, name: &str) -> bool {
        self.subsystems.contains_key(&name.to_ascii_lowercase())
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidValue(msg));

        let naming = self.naming_convention()?;
        self.section_layout()?;

        // The system must be usable as a name component
        DeviceName::new(&self.system, "X", "X", "01", None)
            .map_err(|e| ConfigError::InvalidValue(format!("invalid system: {}", e)))?;

        for composite in &self.composite {
            if composite.members.is_empty() {
                return invalid(format!("composite family '{}' has no members", composite.name));
            }
            if !self.segments.contains(composite.name.as_str()) {
                return invalid(format!(
                    "composite family '{}' has no segment count",
                    composite.name
                ));
            }
        }

        if let Some(StartElement::Family(tag)) = &self.start {
            if !self.knows_family(tag.as_str()) {
                return invalid(format!("start family '{}' has no segment count", tag));
            }
        }

        // Selectors are matched lower-cased, so keys must be stored that way
        for key in self.subsystems.keys().chain(self.elements.keys()) {
            if *key != key.to_ascii_lowercase() {
                return invalid(format!(
                    "selector '{}' must be lowercase (use '{}')",
                    key,
                    key.to_ascii_lowercase()
                ));
            }
        }

        for (selector, layout) in &self.elements {
            if CATEGORY_ALIASES.contains(&selector.as_str()) {
                return invalid(format!(
                    "element layout '{}' shadows a category alias",
                    selector
                ));
            }
            for entry in &layout.devices {
                if !self.knows_family(entry.family.as_str()) {
                    return invalid(format!(
                        "element layout '{}' references unknown family '{}'",
                        selector, entry.family
                    ));
                }
                let device = layout.device_for(selector, Some(entry));
                let name = DeviceName::new(
                    &self.system,
                    "X",
                    &device,
                    &entry.sector,
                    entry.instance.as_deref(),
                )
                .map_err(|e| {
                    ConfigError::InvalidValue(format!("element layout '{}': {}", selector, e))
                })?;
                naming.join(&name).map_err(|e| {
                    ConfigError::InvalidValue(format!("element layout '{}': {}", selector, e))
                })?;
            }
            for family in &layout.from_families {
                if !self.knows_family(family.as_str()) {
                    return invalid(format!(
                        "element layout '{}' derives names from unknown family '{}'",
                        selector, family
                    ));
                }
                DeviceName::new(&self.system, "X", &layout.derived_device(family), "01", None)
                    .map_err(|e| {
                        ConfigError::InvalidValue(format!("element layout '{}': {}", selector, e))
                    })?;
            }
        }

        for family in &self.families.names {
            if !self.knows_family(family.as_str()) {
                return invalid(format!("family name '{}' has no segment count", family));
            }
        }

        for (name, subsystem) in &self.subsystems {
            DeviceName::new(&self.system, name, "X", "01", None)
                .map_err(|e| ConfigError::InvalidValue(format!("invalid subsystem: {}", e)))?;
            for selector in &subsystem.elements {
                if !self.knows_element(selector) {
                    return invalid(format!(
                        "subsystem '{}' selects unknown element '{}'",
                        name, selector
                    ));
                }
            }
            for family in &subsystem.families {
                if !self.families.names.contains(family) {
                    return invalid(format!(
                        "subsystem '{}' selects family '{}' which has no family-wide name",
                        name, family
                    ));
                }
            }
            for fixed in &subsystem.fixed {
                naming
                    .join_name(
                        &self.system,
                        name,
                        &fixed.device,
                        &fixed.sector,
                        fixed.instance.as_deref(),
                    )
                    .map_err(|e| {
                        ConfigError::InvalidValue(format!("subsystem '{}': {}", name, e))
                    })?;
            }
        }

        for name in &self.magnet_subsystems {
            if !self.knows_subsystem(name) {
                return invalid(format!("magnet subsystem '{}' is not configured", name));
            }
        }
        for name in &self.device_subsystems {
            if !self.knows_subsystem(name) {
                return invalid(format!("device subsystem '{}' is not configured", name));
            }
        }

        Ok(())
    }
}
