//! core::verify
//!
//! Structural verification of section labelings and family data.
//!
//! # Checks
//!
//! - **Sections**: one label per position, drawn from the configured
//!   vocabulary, non-decreasing except for at most one wrap boundary
//! - **Family data**:
//!   - Every segmented family in the lattice has a record, and no record
//!     lacks a segment count
//!   - Groups have the configured segment count and partition the family's
//!     raw positions exactly
//!   - Each subsection matches the labeling at the group's first position
//!   - Instance labels match a fresh numbering in lattice order
//!
//! Family data may be rotated: checks that depend on order sort the groups
//! by first position first.
//!
//! # Invariants
//!
//! - Never mutates its inputs
//! - Must be deterministic

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::config::Facility;
use super::family::{FamilyData, FamilyRecord};
use super::instance::assign_instances;
use super::lattice::Lattice;
use super::sections::{compute_sections, SectionError, SectionLabeling};
use super::types::{FamilyTag, InstanceLabel, SectionLabel};

/// Findings from verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("section labeling has {found} labels for a lattice of {expected} elements")]
    LabelingLength { expected: usize, found: usize },

    #[error("section label '{label}' at position {position} is outside the configured sections")]
    LabelOutOfVocabulary { position: usize, label: SectionLabel },

    #[error("section labels decrease more than once (again at position {position})")]
    LabelsUnordered { position: usize },

    #[error("section mapping failed: {0}")]
    Sections(SectionError),

    #[error("family '{0}' is segmented but has no record")]
    MissingFamily(FamilyTag),

    #[error("family '{0}' has a record but no segment count")]
    UnexpectedFamily(FamilyTag),

    #[error("family '{family}' group {group} has {found} positions, expected {expected}")]
    GroupSize {
        family: FamilyTag,
        group: usize,
        expected: usize,
        found: usize,
    },

    #[error("family '{family}' groups do not partition its lattice positions")]
    PartitionMismatch { family: FamilyTag },

    #[error("family '{family}' group {group} is labeled section '{found}', lattice says '{expected}'")]
    SectionMismatch {
        family: FamilyTag,
        group: usize,
        expected: SectionLabel,
        found: SectionLabel,
    },

    #[error("family '{family}' group {group} has instance '{found}', expected '{expected}'")]
    InstanceMismatch {
        family: FamilyTag,
        group: usize,
        expected: InstanceLabel,
        found: InstanceLabel,
    },
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Problems found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }
}

/// Verify a section labeling against its lattice length and section count.
pub fn verify_sections(labeling: &SectionLabeling, len: usize, count: usize) -> VerifyResult {
    let mut errors = Vec::new();

    if labeling.len() != len {
        errors.push(VerifyError::LabelingLength {
            expected: len,
            found: labeling.len(),
        });
    }

    for (position, label) in labeling.as_slice().iter().enumerate() {
        if label.ordinal() >= count {
            errors.push(VerifyError::LabelOutOfVocabulary {
                position,
                label: label.clone(),
            });
        }
    }

    let mut wrapped = false;
    for (position, pair) in labeling.as_slice().windows(2).enumerate() {
        if pair[1] < pair[0] {
            if wrapped {
                errors.push(VerifyError::LabelsUnordered {
                    position: position + 1,
                });
                break;
            }
            wrapped = true;
        }
    }

    VerifyResult::from_errors(errors)
}

/// Verify family data against the lattice and facility it claims to derive
/// from.
pub fn verify_family_data(
    facility: &Facility,
    lattice: &Lattice,
    data: &FamilyData,
) -> VerifyResult {
    let sections = match compute_sections(lattice, facility.section_layout()) {
        Ok(sections) => sections,
        Err(e) => return VerifyResult::failure(vec![VerifyError::Sections(e)]),
    };

    let count = facility.section_layout().count();
    let mut errors = verify_sections(&sections, lattice.len(), count).errors;

    let positions = expected_positions(facility, lattice);
    for family in positions.keys() {
        if !data.contains(family.as_str()) {
            errors.push(VerifyError::MissingFamily(family.clone()));
        }
    }

    for (family, record) in data.iter() {
        let Some(segments) = facility.segments().get(family.as_str()) else {
            errors.push(VerifyError::UnexpectedFamily(family.clone()));
            continue;
        };
        verify_record(
            family,
            record,
            segments,
            positions.get(family).map(Vec::as_slice).unwrap_or(&[]),
            &sections,
            &mut errors,
        );
    }

    tracing::debug!(families = data.len(), problems = errors.len(), "verified family data");
    VerifyResult::from_errors(errors)
}

/// Raw positions each segmented family should cover, composites included.
fn expected_positions(facility: &Facility, lattice: &Lattice) -> BTreeMap<FamilyTag, Vec<usize>> {
    let mut positions: BTreeMap<FamilyTag, Vec<usize>> = lattice
        .find_dict()
        .into_iter()
        .filter(|(family, _)| facility.segments().contains(family.as_str()))
        .collect();

    for composite in facility.composites() {
        let mut merged: Vec<usize> = composite
            .members
            .iter()
            .flat_map(|m| lattice.positions_of(m.as_str()))
            .collect();
        merged.sort_unstable();
        merged.dedup();
        positions.insert(composite.name.clone(), merged);
    }

    positions
}

fn verify_record(
    family: &FamilyTag,
    record: &FamilyRecord,
    segments: usize,
    expected: &[usize],
    sections: &SectionLabeling,
    errors: &mut Vec<VerifyError>,
) {
    for (i, group) in record.index().iter().enumerate() {
        if group.len() != segments {
            errors.push(VerifyError::GroupSize {
                family: family.clone(),
                group: i,
                expected: segments,
                found: group.len(),
            });
        }
    }

    let covered: Vec<usize> = record
        .index()
        .iter()
        .flat_map(|g| g.positions().iter().copied())
        .collect();
    let unique: BTreeSet<usize> = covered.iter().copied().collect();
    let wanted: BTreeSet<usize> = expected.iter().copied().collect();
    if unique.len() != covered.len() || unique != wanted {
        errors.push(VerifyError::PartitionMismatch {
            family: family.clone(),
        });
    }

    for (i, (group, section, _)) in record.iter().enumerate() {
        if let Some(actual) = sections.get(group.first()) {
            if actual != section {
                errors.push(VerifyError::SectionMismatch {
                    family: family.clone(),
                    group: i,
                    expected: actual.clone(),
                    found: section.clone(),
                });
            }
        }
    }

    // Instances are numbered in lattice order, so undo any rotation first.
    let mut ordered: Vec<usize> = (0..record.len()).collect();
    ordered.sort_by_key(|&i| record.index()[i].first());
    let subsections: Vec<SectionLabel> = ordered
        .iter()
        .map(|&i| record.subsection()[i].clone())
        .collect();
    for (expected, &i) in assign_instances(&subsections).into_iter().zip(&ordered) {
        let found = record.instance()[i];
        if found != expected {
            errors.push(VerifyError::InstanceMismatch {
                family: family.clone(),
                group: i,
                expected,
                found,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rotate::rotate_to_start;
    use crate::core::types::IndexGroup;

    const FACILITY: &str = r#"
        system = "tb"

        [sections]
        dipole = "b"
        count = 2

        [segments]
        b = 1
        qf = 1
        injs = 2
    "#;

    fn facility() -> Facility {
        Facility::from_toml(FACILITY).unwrap()
    }

    fn lattice() -> Lattice {
        Lattice::from_tags(["qf", "b", "qf", "injs", "injs", "qf", "b", "qf"]).unwrap()
    }

    fn labels(labels: &[&str]) -> SectionLabeling {
        SectionLabeling::from_labels(
            labels
                .iter()
                .map(|l| SectionLabel::new(*l).unwrap())
                .collect(),
        )
    }

    mod sections {
        use super::*;

        #[test]
        fn ordered_labels_pass() {
            let result = verify_sections(&labels(&["01", "01", "02"]), 3, 2);
            assert!(result.ok);
        }

        #[test]
        fn single_wrap_allowed() {
            let result = verify_sections(&labels(&["02", "02", "01", "01"]), 4, 2);
            assert!(result.ok);
        }

        #[test]
        fn second_wrap_rejected() {
            let result = verify_sections(&labels(&["02", "01", "02", "01"]), 4, 2);
            assert!(!result.ok);
            assert!(matches!(
                result.errors[0],
                VerifyError::LabelsUnordered { position: 3 }
            ));
        }

        #[test]
        fn length_and_vocabulary() {
            let result = verify_sections(&labels(&["01", "03"]), 3, 2);
            assert!(result.errors.contains(&VerifyError::LabelingLength {
                expected: 3,
                found: 2
            }));
            assert!(result.errors.iter().any(|e| matches!(
                e,
                VerifyError::LabelOutOfVocabulary { position: 1, .. }
            )));
        }
    }

    mod family_data {
        use super::*;

        #[test]
        fn computed_data_passes() {
            let facility = facility();
            let data = facility.family_data(&lattice()).unwrap();
            let result = verify_family_data(&facility, &lattice(), &data);
            assert!(result.ok, "{:?}", result.errors);
        }

        #[test]
        fn rotated_data_passes() {
            let facility = facility();
            let data = facility.family_data(&lattice()).unwrap();
            let rotated = rotate_to_start(&data, 4);
            let result = verify_family_data(&facility, &lattice(), &rotated);
            assert!(result.ok, "{:?}", result.errors);
        }

        #[test]
        fn missing_family_reported() {
            let facility = facility();
            let data: FamilyData = facility
                .family_data(&lattice())
                .unwrap()
                .iter()
                .filter(|(tag, _)| tag.as_str() != "qf")
                .map(|(tag, record)| (tag.clone(), record.clone()))
                .collect();
            let result = verify_family_data(&facility, &lattice(), &data);
            assert!(result
                .errors
                .contains(&VerifyError::MissingFamily(FamilyTag::new("qf").unwrap())));
        }

        #[test]
        fn tampered_record_reported() {
            let facility = facility();
            let lattice = lattice();
            let sections = compute_sections(&lattice, facility.section_layout()).unwrap();
            // Drops qf at 5 and 7 and puts position 2 in the wrong section.
            let record = FamilyRecord::from_parts(
                vec![IndexGroup::single(0), IndexGroup::single(2)],
                vec![sections.get(0).unwrap().clone(), SectionLabel::nth(0)],
                vec![InstanceLabel::Sole, InstanceLabel::Sole],
            )
            .unwrap();
            let mut data: BTreeMap<FamilyTag, FamilyRecord> = facility
                .family_data(&lattice)
                .unwrap()
                .iter()
                .map(|(t, r)| (t.clone(), r.clone()))
                .collect();
            data.insert(FamilyTag::new("qf").unwrap(), record);

            let result =
                verify_family_data(&facility, &lattice, &FamilyData::from_records(data));
            assert!(!result.ok);
            assert!(result
                .errors
                .iter()
                .any(|e| matches!(e, VerifyError::PartitionMismatch { .. })));
            assert!(result
                .errors
                .iter()
                .any(|e| matches!(e, VerifyError::SectionMismatch { group: 1, .. })));
        }

        #[test]
        fn unexpected_family_reported() {
            let facility = facility();
            let mut data: BTreeMap<FamilyTag, FamilyRecord> = BTreeMap::new();
            let sections = compute_sections(&lattice(), facility.section_layout()).unwrap();
            data.insert(
                FamilyTag::new("qd").unwrap(),
                FamilyRecord::build(vec![IndexGroup::single(0)], &sections).unwrap(),
            );
            let result =
                verify_family_data(&facility, &lattice(), &FamilyData::from_records(data));
            assert!(result
                .errors
                .contains(&VerifyError::UnexpectedFamily(FamilyTag::new("qd").unwrap())));
        }
    }
}
