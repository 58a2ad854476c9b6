//! core::devices
//!
//! Expansion of rotated family data into device tables.
//!
//! # Overview
//!
//! A [`DeviceNamer`] binds one [`Facility`] to the rotated family data of one
//! lattice. Its operations turn the facility's subsystem selectors and
//! element layouts into a [`DeviceTable`]: device name to the index groups
//! of every family the device covers.
//!
//! # Entry points
//!
//! - [`DeviceNamer::from_lattice`] computes family data from a lattice
//! - [`DeviceNamer::from_family_data`] takes precomputed family data
//!
//! Both resolve the facility's start element and rotate before naming.
//!
//! # Selectors
//!
//! Subsystem, element and family selectors are case-insensitive. A selector
//! that matches nothing configured is an error; it never yields an empty
//! table.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::config::schema::CATEGORY_ALIASES;
use super::config::{ElementCategory, ElementLayout, Facility, SubsystemConfig};
use super::family::{FamilyData, FamilyError, FamilyRecord};
use super::lattice::Lattice;
use super::naming::NamingError;
use super::rotate::{rotate_to_start, RotateError};
use super::types::{FamilyTag, IndexGroup};

/// Errors from device name expansion.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown subsystem '{0}'")]
    UnknownSubsystem(String),

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("unknown family '{0}'")]
    UnknownFamily(String),

    #[error("device name '{0}' names more than one installation")]
    DuplicateName(String),

    #[error("family '{family}' has {len} groups, no group {group}")]
    GroupOutOfRange {
        family: FamilyTag,
        group: usize,
        len: usize,
    },

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Family(#[from] FamilyError),

    #[error(transparent)]
    Rotate(#[from] RotateError),
}

/// Device name to the index groups of each family it covers.
///
/// Devices with no lattice counterpart (timing modules, raw names) map to an
/// empty family set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceTable(BTreeMap<String, BTreeMap<FamilyTag, Vec<IndexGroup>>>);

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `groups` of `family`.
    ///
    /// Inserting the same mapping again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::DuplicateName` if `name` already maps to any
    /// other installation.
    pub fn insert(
        &mut self,
        name: String,
        family: FamilyTag,
        groups: &[IndexGroup],
    ) -> Result<(), DeviceError> {
        let mapping = BTreeMap::from([(family, groups.to_vec())]);
        self.insert_mapping(name, mapping)
    }

    /// Add `name` with no family mapping.
    pub fn insert_bare(&mut self, name: String) {
        self.0.entry(name).or_default();
    }

    /// Merge every entry of `other` into this table.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::DuplicateName` if a name of `other` maps to a
    /// different installation here.
    pub fn merge(&mut self, other: DeviceTable) -> Result<(), DeviceError> {
        for (name, families) in other.0 {
            if families.is_empty() {
                self.insert_bare(name);
            } else {
                self.insert_mapping(name, families)?;
            }
        }
        Ok(())
    }

    fn insert_mapping(
        &mut self,
        name: String,
        mapping: BTreeMap<FamilyTag, Vec<IndexGroup>>,
    ) -> Result<(), DeviceError> {
        match self.0.get(&name) {
            Some(existing) if *existing == mapping => Ok(()),
            Some(_) => Err(DeviceError::DuplicateName(name)),
            None => {
                self.0.insert(name, mapping);
                Ok(())
            }
        }
    }

    /// Family mapping of `name`.
    pub fn get(&self, name: &str) -> Option<&BTreeMap<FamilyTag, Vec<IndexGroup>>> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Device names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<FamilyTag, Vec<IndexGroup>>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Device naming for one facility and one lattice.
#[derive(Debug, Clone)]
pub struct DeviceNamer<'f> {
    facility: &'f Facility,
    data: FamilyData,
    start: usize,
}

impl<'f> DeviceNamer<'f> {
    /// Compute, rotate and bind the family data of `lattice`.
    ///
    /// # Errors
    ///
    /// Propagates family computation and start resolution failures.
    pub fn from_lattice(facility: &'f Facility, lattice: &Lattice) -> Result<Self, DeviceError> {
        let data = facility.family_data(lattice)?;
        Self::from_family_data(facility, &data)
    }

    /// Rotate and bind precomputed (unrotated) family data.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Rotate` if the start family has no record.
    pub fn from_family_data(facility: &'f Facility, data: &FamilyData) -> Result<Self, DeviceError> {
        let start = facility.start().resolve(data)?;
        Ok(Self {
            facility,
            data: rotate_to_start(data, start),
            start,
        })
    }

    pub fn facility(&self) -> &Facility {
        self.facility
    }

    /// Rotated family data names are drawn from.
    pub fn family_data(&self) -> &FamilyData {
        &self.data
    }

    /// Raw lattice position where numbering starts.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Every device of `subsystem`, or of the facility's listed subsystems
    /// (all when none are listed) when `None`.
    ///
    /// A subsystem's devices are its selected element layouts, its
    /// family-wide names, and its fixed and raw devices.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnknownSubsystem` for an unconfigured subsystem.
    pub fn device_names(&self, subsystem: Option<&str>) -> Result<DeviceTable, DeviceError> {
        let config = self.facility.config();
        let subsystems: Vec<String> = match subsystem {
            Some(name) => vec![self.subsystem(name)?.0.to_string()],
            None if config.device_subsystems.is_empty() => {
                config.subsystems.keys().cloned().collect()
            }
            None => config.device_subsystems.clone(),
        };

        let mut table = DeviceTable::new();
        for name in &subsystems {
            let (key, selected) = self.subsystem(name)?;
            for element in &selected.elements {
                table.merge(self.element_names(key, Some(element))?)?;
            }
            for family in &selected.families {
                table.merge(self.family_names(key, Some(family.as_str()))?)?;
            }
            for fixed in &selected.fixed {
                let joined = self.facility.naming().join_name(
                    self.facility.system(),
                    key,
                    &fixed.device,
                    &fixed.sector,
                    fixed.instance.as_deref(),
                )?;
                table.insert_bare(joined);
            }
            for raw in &selected.raw {
                table.insert_bare(raw.clone());
            }
        }

        tracing::debug!(
            subsystems = subsystems.len(),
            devices = table.len(),
            "expanded device names"
        );
        Ok(table)
    }

    /// Per-installation names of `element` under `subsystem`.
    ///
    /// With `None`, every configured layout is named, in category order.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnknownSubsystem` for an unconfigured subsystem
    /// - `DeviceError::UnknownElement` for an unknown selector
    /// - `DeviceError::UnknownFamily` if a layout family has no record
    /// - `DeviceError::GroupOutOfRange` if a layout group does not exist
    pub fn element_names(
        &self,
        subsystem: &str,
        element: Option<&str>,
    ) -> Result<DeviceTable, DeviceError> {
        let (key, _) = self.subsystem(subsystem)?;
        let layouts = match element {
            Some(e) => self.layouts(&e.to_ascii_lowercase())?,
            None => {
                let mut all: Vec<(&str, &ElementLayout)> = self
                    .facility
                    .config()
                    .elements
                    .iter()
                    .map(|(name, layout)| (name.as_str(), layout))
                    .collect();
                all.sort_by_key(|(_, layout)| category_rank(layout.category));
                all
            }
        };

        let mut table = DeviceTable::new();
        for (selector, layout) in layouts {
            self.expand_layout(&mut table, key, selector, layout)?;
        }
        Ok(table)
    }

    /// Family-wide names (`sector = family_sector`) under `subsystem`.
    ///
    /// With `None`, every family with a family-wide name is named.
    ///
    /// # Errors
    ///
    /// - `DeviceError::UnknownSubsystem` for an unconfigured subsystem
    /// - `DeviceError::UnknownFamily` if the family has no family-wide name
    ///   or no record
    pub fn family_names(
        &self,
        subsystem: &str,
        family: Option<&str>,
    ) -> Result<DeviceTable, DeviceError> {
        let (key, _) = self.subsystem(subsystem)?;
        let names = &self.facility.config().families.names;

        let families: Vec<&FamilyTag> = match family {
            Some(f) => {
                let tag = names
                    .iter()
                    .find(|n| n.as_str().eq_ignore_ascii_case(f))
                    .ok_or_else(|| DeviceError::UnknownFamily(f.to_string()))?;
                vec![tag]
            }
            None => names.iter().collect(),
        };

        let mut table = DeviceTable::new();
        for tag in families {
            let record = self.record(tag)?;
            let name = self.facility.naming().join_name(
                self.facility.system(),
                key,
                &tag.as_str().to_ascii_uppercase(),
                self.facility.family_sector(),
                None,
            )?;
            table.insert(name, tag.clone(), record.index())?;
        }
        Ok(table)
    }

    /// Union of the device tables of the facility's magnet subsystems.
    ///
    /// # Errors
    ///
    /// Propagates expansion failures of any magnet subsystem.
    pub fn magnet_names(&self) -> Result<DeviceTable, DeviceError> {
        let mut table = DeviceTable::new();
        for subsystem in &self.facility.config().magnet_subsystems {
            table.merge(self.device_names(Some(subsystem))?)?;
        }
        Ok(table)
    }

    fn subsystem(&self, name: &str) -> Result<(&str, &SubsystemConfig), DeviceError> {
        let key = name.to_ascii_lowercase();
        self.facility
            .config()
            .subsystems
            .get_key_value(&key)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| DeviceError::UnknownSubsystem(name.to_string()))
    }

    /// Layouts a selector expands to; aliases expand in category order.
    fn layouts(&self, selector: &str) -> Result<Vec<(&str, &ElementLayout)>, DeviceError> {
        let elements = &self.facility.config().elements;
        if let Some((name, layout)) = elements.get_key_value(selector) {
            return Ok(vec![(name.as_str(), layout)]);
        }

        if !CATEGORY_ALIASES.contains(&selector) {
            return Err(DeviceError::UnknownElement(selector.to_string()));
        }
        let mut matched: Vec<(&str, &ElementLayout)> = elements
            .iter()
            .filter(|(_, layout)| layout.category.matches_alias(selector))
            .map(|(name, layout)| (name.as_str(), layout))
            .collect();
        matched.sort_by_key(|(_, layout)| category_rank(layout.category));
        Ok(matched)
    }

    fn expand_layout(
        &self,
        table: &mut DeviceTable,
        subsystem: &str,
        selector: &str,
        layout: &ElementLayout,
    ) -> Result<(), DeviceError> {
        let naming = self.facility.naming();
        let system = self.facility.system();

        for entry in &layout.devices {
            let record = self.record(&entry.family)?;
            let groups = match entry.group {
                Some(g) => std::slice::from_ref(record.index().get(g).ok_or(
                    DeviceError::GroupOutOfRange {
                        family: entry.family.clone(),
                        group: g,
                        len: record.len(),
                    },
                )?),
                None => record.index(),
            };
            let name = naming.join_name(
                system,
                subsystem,
                &layout.device_for(selector, Some(entry)),
                &entry.sector,
                entry.instance.as_deref(),
            )?;
            table.insert(name, entry.family.clone(), groups)?;
        }

        for family in &layout.from_families {
            let record = self.record(family)?;
            let device = layout.derived_device(family);
            for (group, section, instance) in record.iter() {
                let name = naming.join_name(
                    system,
                    subsystem,
                    &device,
                    section.as_str(),
                    instance.as_component().as_deref(),
                )?;
                table.insert(name, family.clone(), std::slice::from_ref(group))?;
            }
        }

        Ok(())
    }

    fn record(&self, family: &FamilyTag) -> Result<&FamilyRecord, DeviceError> {
        self.data
            .get(family.as_str())
            .ok_or_else(|| DeviceError::UnknownFamily(family.to_string()))
    }
}

fn category_rank(category: ElementCategory) -> usize {
    ElementCategory::ORDER
        .iter()
        .position(|c| *c == category)
        .unwrap_or(ElementCategory::ORDER.len())
}
