//! core::family
//!
//! Structured per-family records derived from a lattice.
//!
//! # Pipeline
//!
//! ```text
//! Lattice ──compute_sections──▶ SectionLabeling ─┐
//!    │                                           ├─▶ FamilyRecord per family
//!    └──segment_families──▶ index groups ────────┘   (index, subsection, instance)
//! ```
//!
//! # Invariants
//!
//! - `index`, `subsection` and `instance` of a record have equal length
//! - `subsection[i]` is the section of `index[i].first()`
//! - Records are recomputed on demand; nothing here holds global state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instance::assign_instances;
use super::lattice::Lattice;
use super::sections::{compute_sections, SectionError, SectionLabeling, SectionLayout};
use super::segment::{segment_families, CompositeFamily, SegmentError, SegmentTable};
use super::types::{FamilyTag, IndexGroup, InstanceLabel, SectionLabel};

/// Errors from building family records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FamilyError {
    #[error(transparent)]
    Section(#[from] SectionError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(
        "misaligned record: {index} index groups, {subsection} subsections, {instance} instances"
    )]
    Misaligned {
        index: usize,
        subsection: usize,
        instance: usize,
    },

    #[error("position {position} is outside a lattice of {len} elements")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Index groups of one family with their section and instance labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFamilyRecord")]
pub struct FamilyRecord {
    index: Vec<IndexGroup>,
    subsection: Vec<SectionLabel>,
    instance: Vec<InstanceLabel>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFamilyRecord {
    index: Vec<IndexGroup>,
    subsection: Vec<SectionLabel>,
    instance: Vec<InstanceLabel>,
}

impl TryFrom<RawFamilyRecord> for FamilyRecord {
    type Error = FamilyError;

    fn try_from(raw: RawFamilyRecord) -> Result<Self, Self::Error> {
        Self::from_parts(raw.index, raw.subsection, raw.instance)
    }
}

impl FamilyRecord {
    /// Label `index` with sections and instances.
    ///
    /// # Errors
    ///
    /// Returns `FamilyError::PositionOutOfRange` if a group's first position
    /// has no section label.
    pub fn build(index: Vec<IndexGroup>, sections: &SectionLabeling) -> Result<Self, FamilyError> {
        let subsection = index
            .iter()
            .map(|group| {
                sections
                    .get(group.first())
                    .cloned()
                    .ok_or(FamilyError::PositionOutOfRange {
                        position: group.first(),
                        len: sections.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let instance = assign_instances(&subsection);

        Ok(Self {
            index,
            subsection,
            instance,
        })
    }

    /// Assemble a record from precomputed parts.
    ///
    /// # Errors
    ///
    /// Returns `FamilyError::Misaligned` if the parts differ in length.
    pub fn from_parts(
        index: Vec<IndexGroup>,
        subsection: Vec<SectionLabel>,
        instance: Vec<InstanceLabel>,
    ) -> Result<Self, FamilyError> {
        if index.len() != subsection.len() || index.len() != instance.len() {
            return Err(FamilyError::Misaligned {
                index: index.len(),
                subsection: subsection.len(),
                instance: instance.len(),
            });
        }
        Ok(Self {
            index,
            subsection,
            instance,
        })
    }

    /// The same record with instance labels recomputed from its subsections.
    pub fn renumbered(&self) -> Self {
        Self {
            index: self.index.clone(),
            subsection: self.subsection.clone(),
            instance: assign_instances(&self.subsection),
        }
    }

    pub fn index(&self) -> &[IndexGroup] {
        &self.index
    }

    pub fn subsection(&self) -> &[SectionLabel] {
        &self.subsection
    }

    pub fn instance(&self) -> &[InstanceLabel] {
        &self.instance
    }

    /// Number of installations.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterate over `(group, section, instance)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&IndexGroup, &SectionLabel, &InstanceLabel)> {
        self.index
            .iter()
            .zip(&self.subsection)
            .zip(&self.instance)
            .map(|((g, s), i)| (g, s, i))
    }

    /// Reorder all three columns by `order` (a permutation of `0..len`).
    pub(crate) fn permuted(&self, order: &[usize]) -> Self {
        Self {
            index: order.iter().map(|&i| self.index[i].clone()).collect(),
            subsection: order.iter().map(|&i| self.subsection[i].clone()).collect(),
            instance: order.iter().map(|&i| self.instance[i]).collect(),
        }
    }
}

/// Family records of one lattice, keyed by family tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyData {
    families: BTreeMap<FamilyTag, FamilyRecord>,
}

impl FamilyData {
    /// Wrap precomputed records.
    pub fn from_records(families: BTreeMap<FamilyTag, FamilyRecord>) -> Self {
        Self { families }
    }

    /// Derive family records from a lattice.
    ///
    /// # Errors
    ///
    /// Propagates section-mapping and segmentation failures.
    pub fn compute(
        lattice: &Lattice,
        layout: &SectionLayout,
        segments: &SegmentTable,
        composites: &[CompositeFamily],
    ) -> Result<Self, FamilyError> {
        let sections = compute_sections(lattice, layout)?;
        let groups = segment_families(lattice, segments, composites)?;

        let families = groups
            .into_iter()
            .map(|(family, index)| Ok((family, FamilyRecord::build(index, &sections)?)))
            .collect::<Result<BTreeMap<_, _>, FamilyError>>()?;

        tracing::debug!(
            elements = lattice.len(),
            families = families.len(),
            "computed family data"
        );

        Ok(Self { families })
    }

    /// Record of `family`.
    pub fn get(&self, family: &str) -> Option<&FamilyRecord> {
        self.families.get(family)
    }

    /// Whether `family` has a record.
    pub fn contains(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    /// Iterate over records in family tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&FamilyTag, &FamilyRecord)> {
        self.families.iter()
    }

    /// Number of families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl FromIterator<(FamilyTag, FamilyRecord)> for FamilyData {
    fn from_iter<I: IntoIterator<Item = (FamilyTag, FamilyRecord)>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> FamilyTag {
        FamilyTag::new(s).unwrap()
    }

    fn layout() -> SectionLayout {
        SectionLayout::new(tag("B"), 3, None).unwrap()
    }

    fn segments(entries: &[(&str, usize)]) -> SegmentTable {
        SegmentTable::new(entries.iter().map(|(k, v)| (tag(k), *v)).collect()).unwrap()
    }

    #[test]
    fn records_are_aligned() {
        let lattice =
            Lattice::from_tags(["B", "QF", "QF", "B", "QF", "B", "BPM", "BPM"]).unwrap();
        let data = FamilyData::compute(
            &lattice,
            &layout(),
            &segments(&[("B", 1), ("QF", 1), ("BPM", 1)]),
            &[],
        )
        .unwrap();

        for (_, record) in data.iter() {
            assert_eq!(record.index().len(), record.subsection().len());
            assert_eq!(record.index().len(), record.instance().len());
        }

        let qf = data.get("QF").unwrap();
        let sections: Vec<_> = qf.subsection().iter().map(|s| s.as_str()).collect();
        assert_eq!(sections, vec!["02", "02", "03"]);
        let instances: Vec<_> = qf.instance().iter().map(|i| i.to_string()).collect();
        assert_eq!(instances, vec!["1", "2", ""]);
    }

    #[test]
    fn inconsistent_segments_fail_whole_computation() {
        let lattice = Lattice::from_tags(["B", "B", "B", "InjS"]).unwrap();
        let result = FamilyData::compute(
            &lattice,
            &layout(),
            &segments(&[("B", 1), ("InjS", 2)]),
            &[],
        );
        assert!(matches!(
            result,
            Err(FamilyError::Segment(SegmentError::ConfigurationInconsistency { .. }))
        ));
    }

    #[test]
    fn from_parts_checks_lengths() {
        let result = FamilyRecord::from_parts(
            vec![IndexGroup::single(0)],
            vec![],
            vec![InstanceLabel::Sole],
        );
        assert_eq!(
            result,
            Err(FamilyError::Misaligned {
                index: 1,
                subsection: 0,
                instance: 1
            })
        );
    }

    #[test]
    fn build_rejects_positions_outside_labeling() {
        let sections = SectionLabeling::from_labels(vec![SectionLabel::nth(0)]);
        let result = FamilyRecord::build(vec![IndexGroup::single(5)], &sections);
        assert_eq!(
            result,
            Err(FamilyError::PositionOutOfRange { position: 5, len: 1 })
        );
    }

    #[test]
    fn renumbered_is_stable() {
        let lattice = Lattice::from_tags(["B", "QF", "QF", "B", "B", "QF"]).unwrap();
        let data =
            FamilyData::compute(&lattice, &layout(), &segments(&[("B", 1), ("QF", 1)]), &[])
                .unwrap();
        let qf = data.get("QF").unwrap();
        assert_eq!(&qf.renumbered(), qf);
    }

    #[test]
    fn serde_roundtrip_validates_alignment() {
        let lattice = Lattice::from_tags(["B", "QF", "B", "QF", "B"]).unwrap();
        let data =
            FamilyData::compute(&lattice, &layout(), &segments(&[("B", 1), ("QF", 1)]), &[])
                .unwrap();
        let json = serde_json::to_string(&data).unwrap();
        let parsed: FamilyData = serde_json::from_str(&json).unwrap();
        assert_eq!(data, parsed);

        let broken = r#"{"QF": {"index": [[1]], "subsection": [], "instance": [""]}}"#;
        assert!(serde_json::from_str::<FamilyData>(broken).is_err());
    }

    #[test]
    fn loaded_groups_must_be_ascending() {
        let unordered = r#"{"B": {"index": [[5, 3]], "subsection": ["01"], "instance": [""]}}"#;
        assert!(serde_json::from_str::<FamilyData>(unordered).is_err());
    }
}
