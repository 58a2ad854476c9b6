//! core::rotate
//!
//! Index rotation so device numbering starts at a configured element.
//!
//! Facilities number devices from a physical start point (e.g. the
//! injection point) rather than raw position 0. Every family's records are
//! stably partitioned into those whose first position is at or after the
//! start and those before it; the former come first. The same start applies
//! to every family so all of them agree on where numbering begins.
//!
//! Rotation is a pure transform: the input is never modified, and the
//! index, subsection and instance columns move together.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::family::{FamilyData, FamilyRecord};
use super::types::FamilyTag;

/// Errors from resolving the start element.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotateError {
    #[error("start family '{0}' has no elements")]
    StartFamilyMissing(FamilyTag),
}

/// Where device numbering begins.
///
/// ```toml
/// [start]
/// family = "start"   # first element of a marker family
/// ```
///
/// or
///
/// ```toml
/// [start]
/// position = 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartElement {
    /// A literal raw lattice position.
    Position(usize),
    /// The first position of a (marker) family.
    Family(FamilyTag),
}

impl Default for StartElement {
    fn default() -> Self {
        Self::Position(0)
    }
}

impl StartElement {
    /// Resolve to a raw lattice position using computed family data.
    ///
    /// # Errors
    ///
    /// Returns `RotateError::StartFamilyMissing` if a start family has no
    /// record or an empty one.
    pub fn resolve(&self, data: &FamilyData) -> Result<usize, RotateError> {
        match self {
            Self::Position(p) => Ok(*p),
            Self::Family(tag) => data
                .get(tag.as_str())
                .and_then(|r| r.index().first())
                .map(|g| g.first())
                .ok_or_else(|| RotateError::StartFamilyMissing(tag.clone())),
        }
    }
}

/// Rotate one record so groups at or after `start` come first.
pub fn rotate_record(record: &FamilyRecord, start: usize) -> FamilyRecord {
    let (after, before): (Vec<usize>, Vec<usize>) =
        (0..record.len()).partition(|&i| record.index()[i].first() >= start);
    let order: Vec<usize> = after.into_iter().chain(before).collect();
    record.permuted(&order)
}

/// Rotate every family so enumeration starts at `start`.
///
/// # Example
///
/// ```
/// use latticenames::core::family::{FamilyData, FamilyRecord};
/// use latticenames::core::rotate::rotate_to_start;
/// use latticenames::core::sections::SectionLabeling;
/// use latticenames::core::types::{FamilyTag, IndexGroup, SectionLabel};
///
/// let sections = SectionLabeling::from_labels(vec![SectionLabel::nth(0); 10]);
/// let groups = vec![IndexGroup::single(1), IndexGroup::single(4), IndexGroup::single(8)];
/// let record = FamilyRecord::build(groups, &sections).unwrap();
/// let data: FamilyData = [(FamilyTag::new("QF").unwrap(), record)].into_iter().collect();
///
/// let rotated = rotate_to_start(&data, 4);
/// let firsts: Vec<_> = rotated.get("QF").unwrap().index().iter().map(|g| g.first()).collect();
/// assert_eq!(firsts, vec![4, 8, 1]);
/// ```
pub fn rotate_to_start(data: &FamilyData, start: usize) -> FamilyData {
    if start == 0 {
        return data.clone();
    }
    tracing::debug!(start, families = data.len(), "rotating family data");
    data.iter()
        .map(|(family, record)| (family.clone(), rotate_record(record, start)))
        .collect()
}
