//! core::segment
//!
//! Family segmentation: grouping raw positions into logical elements.
//!
//! A family's raw positions (ascending) are chunked into consecutive groups
//! of the family's configured segment count. Composite families are not
//! tagged in the lattice; their positions are the sorted union of their
//! member families' positions, and their entry replaces any same-named
//! entry from the generic scan.
//!
//! A position count that is not a multiple of the segment count is a
//! configuration inconsistency and is reported, never truncated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lattice::Lattice;
use super::types::{FamilyTag, IndexGroup};

/// Errors from family segmentation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("segment count for family '{0}' must be at least 1")]
    InvalidCount(FamilyTag),

    #[error(
        "configuration inconsistency: family '{family}' has {positions} lattice elements, \
         not a multiple of its segment count {segments}"
    )]
    ConfigurationInconsistency {
        family: FamilyTag,
        positions: usize,
        segments: usize,
    },

    #[error("composite family '{0}' has no segment count")]
    CompositeWithoutSegments(FamilyTag),

    #[error("composite family '{0}' has no members")]
    EmptyComposite(FamilyTag),
}

/// Number of consecutive raw lattice entries per logical element, by family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<FamilyTag, usize>", into = "BTreeMap<FamilyTag, usize>")]
pub struct SegmentTable(BTreeMap<FamilyTag, usize>);

impl SegmentTable {
    /// Create a table, rejecting zero counts.
    pub fn new(counts: BTreeMap<FamilyTag, usize>) -> Result<Self, SegmentError> {
        if let Some((family, _)) = counts.iter().find(|(_, &n)| n == 0) {
            return Err(SegmentError::InvalidCount(family.clone()));
        }
        Ok(Self(counts))
    }

    /// Segment count of `family`, if configured.
    pub fn get(&self, family: &str) -> Option<usize> {
        self.0.get(family).copied()
    }

    /// Whether `family` has a configured count.
    pub fn contains(&self, family: &str) -> bool {
        self.0.contains_key(family)
    }

    /// Iterate over `(family, count)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&FamilyTag, usize)> {
        self.0.iter().map(|(k, &v)| (k, v))
    }
}

impl TryFrom<BTreeMap<FamilyTag, usize>> for SegmentTable {
    type Error = SegmentError;

    fn try_from(counts: BTreeMap<FamilyTag, usize>) -> Result<Self, Self::Error> {
        Self::new(counts)
    }
}

impl From<SegmentTable> for BTreeMap<FamilyTag, usize> {
    fn from(table: SegmentTable) -> Self {
        table.0
    }
}

/// A virtual family defined as the union of several tagged families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeFamily {
    /// Name of the composite family.
    pub name: FamilyTag,
    /// Tagged families whose positions make up the composite.
    pub members: Vec<FamilyTag>,
}

/// Index groups of every segmented family.
pub type FamilyGroups = BTreeMap<FamilyTag, Vec<IndexGroup>>;

/// Chunk ascending `positions` into groups of `segments`.
///
/// # Errors
///
/// Returns `SegmentError::ConfigurationInconsistency` if the positions do
/// not divide evenly.
pub fn chunk_positions(
    family: &FamilyTag,
    positions: &[usize],
    segments: usize,
) -> Result<Vec<IndexGroup>, SegmentError> {
    if segments == 0 {
        return Err(SegmentError::InvalidCount(family.clone()));
    }
    if positions.len() % segments != 0 {
        return Err(SegmentError::ConfigurationInconsistency {
            family: family.clone(),
            positions: positions.len(),
            segments,
        });
    }
    Ok(positions
        .chunks_exact(segments)
        .map(IndexGroup::from_chunk)
        .collect())
}

/// Group the raw positions of every family that has a segment count.
///
/// Families present in the lattice but absent from `table` are skipped.
/// Composite families are built after the generic scan and replace any
/// same-named entry.
///
/// # Errors
///
/// - `SegmentError::ConfigurationInconsistency` for indivisible families
/// - `SegmentError::CompositeWithoutSegments` / `EmptyComposite` for
///   malformed composites
pub fn segment_families(
    lattice: &Lattice,
    table: &SegmentTable,
    composites: &[CompositeFamily],
) -> Result<FamilyGroups, SegmentError> {
    let dict = lattice.find_dict();
    let mut groups = FamilyGroups::new();

    for (family, positions) in &dict {
        let Some(segments) = table.get(family.as_str()) else {
            continue;
        };
        groups.insert(family.clone(), chunk_positions(family, positions, segments)?);
    }

    for composite in composites {
        if composite.members.is_empty() {
            return Err(SegmentError::EmptyComposite(composite.name.clone()));
        }
        let segments = table
            .get(composite.name.as_str())
            .ok_or_else(|| SegmentError::CompositeWithoutSegments(composite.name.clone()))?;

        let mut positions: Vec<usize> = composite
            .members
            .iter()
            .filter_map(|m| dict.get(m))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();

        let chunked = chunk_positions(&composite.name, &positions, segments)?;
        tracing::debug!(
            composite = %composite.name,
            members = composite.members.len(),
            groups = chunked.len(),
            "built composite family"
        );
        groups.insert(composite.name.clone(), chunked);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> FamilyTag {
        FamilyTag::new(s).unwrap()
    }

    fn table(entries: &[(&str, usize)]) -> SegmentTable {
        SegmentTable::new(entries.iter().map(|(k, v)| (tag(k), *v)).collect()).unwrap()
    }

    fn positions(groups: &[IndexGroup]) -> Vec<Vec<usize>> {
        groups.iter().map(|g| g.positions().to_vec()).collect()
    }

    #[test]
    fn single_segment_families() {
        let lattice = Lattice::from_tags(["QF", "B", "QF", "BPM"]).unwrap();
        let groups = segment_families(&lattice, &table(&[("QF", 1), ("BPM", 1)]), &[]).unwrap();
        assert_eq!(positions(&groups[&tag("QF")]), vec![vec![0], vec![2]]);
        assert_eq!(positions(&groups[&tag("BPM")]), vec![vec![3]]);
        assert!(!groups.contains_key("B"));
    }

    #[test]
    fn multi_segment_dipoles() {
        let tags: Vec<&str> = (0..48).map(|_| "B").collect();
        let lattice = Lattice::from_tags(tags).unwrap();
        let groups = segment_families(&lattice, &table(&[("B", 16)]), &[]).unwrap();
        let b = &groups[&tag("B")];
        assert_eq!(b.len(), 3);
        assert!(b.iter().all(|g| g.len() == 16));
        assert_eq!(b[1].first(), 16);
    }

    #[test]
    fn indivisible_count_is_reported() {
        let lattice = Lattice::from_tags(["InjS", "InjS", "InjS"]).unwrap();
        let err = segment_families(&lattice, &table(&[("InjS", 2)]), &[]).unwrap_err();
        assert_eq!(
            err,
            SegmentError::ConfigurationInconsistency {
                family: tag("InjS"),
                positions: 3,
                segments: 2,
            }
        );
    }

    #[test]
    fn composite_merges_and_sorts_members() {
        let lattice = Lattice::from_tags(["qa2", "qb1", "qc1", "qa2"]).unwrap();
        let composite = CompositeFamily {
            name: tag("qf"),
            members: vec![tag("qc1"), tag("qa2")],
        };
        let groups = segment_families(
            &lattice,
            &table(&[("qf", 1), ("qa2", 1), ("qc1", 1)]),
            &[composite],
        )
        .unwrap();
        assert_eq!(positions(&groups[&tag("qf")]), vec![vec![0], vec![2], vec![3]]);
        assert_eq!(positions(&groups[&tag("qa2")]), vec![vec![0], vec![3]]);
    }

    #[test]
    fn composite_replaces_scanned_entry() {
        // A tagged "qf" element exists, but the composite definition wins.
        let lattice = Lattice::from_tags(["qf", "qa2", "qa3"]).unwrap();
        let composite = CompositeFamily {
            name: tag("qf"),
            members: vec![tag("qa2"), tag("qa3")],
        };
        let groups = segment_families(&lattice, &table(&[("qf", 1)]), &[composite]).unwrap();
        assert_eq!(positions(&groups[&tag("qf")]), vec![vec![1], vec![2]]);
    }

    #[test]
    fn composite_tolerates_absent_members() {
        let lattice = Lattice::from_tags(["qa2"]).unwrap();
        let composite = CompositeFamily {
            name: tag("qf"),
            members: vec![tag("qa2"), tag("qz9")],
        };
        let groups = segment_families(&lattice, &table(&[("qf", 1)]), &[composite]).unwrap();
        assert_eq!(groups[&tag("qf")].len(), 1);
    }

    #[test]
    fn composite_requires_segment_count() {
        let lattice = Lattice::from_tags(["qa2"]).unwrap();
        let composite = CompositeFamily {
            name: tag("qf"),
            members: vec![tag("qa2")],
        };
        assert_eq!(
            segment_families(&lattice, &table(&[]), &[composite]).unwrap_err(),
            SegmentError::CompositeWithoutSegments(tag("qf"))
        );
    }

    #[test]
    fn zero_count_rejected() {
        let counts = [(tag("B"), 0)].into_iter().collect();
        assert_eq!(
            SegmentTable::new(counts).unwrap_err(),
            SegmentError::InvalidCount(tag("B"))
        );
    }

    #[test]
    fn table_deserializes_from_toml() {
        let parsed: SegmentTable = toml::from_str("B = 16\nQF = 1").unwrap();
        assert_eq!(parsed.get("B"), Some(16));
        let invalid: Result<SegmentTable, _> = toml::from_str("B = 0");
        assert!(invalid.is_err());
    }
}
