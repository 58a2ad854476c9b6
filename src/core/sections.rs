//! core::sections
//!
//! Section mapping: one section label per lattice position.
//!
//! # Algorithm
//!
//! Dipoles occur at regular intervals and divide the lattice into coarse
//! sectors. The raw dipole positions are split into `dipole_groups`
//! contiguous groups of `len / dipole_groups` members (any remainder joins
//! the last group). The last member of each group, plus the final lattice
//! position, are breakpoints. Walking the lattice once, every position
//! receives the current label and the label advances after a position
//! reaches the next breakpoint. The label never advances past the last
//! configured section.
//!
//! # Invariants
//!
//! - The labeling has exactly one label per lattice position
//! - Labels come from `SectionLabel::vocabulary(count)` only
//! - Labels are non-decreasing over position

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lattice::Lattice;
use super::types::{FamilyTag, SectionLabel};

/// Errors from section mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("invalid section layout: {0}")]
    InvalidLayout(String),

    #[error("dipole family '{0}' does not occur in the lattice")]
    DipoleNotFound(FamilyTag),

    #[error("dipole family '{dipole}' has {found} elements, fewer than the {groups} groups required")]
    TooFewDipoles {
        dipole: FamilyTag,
        found: usize,
        groups: usize,
    },
}

/// Facility constants that drive section mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    dipole: FamilyTag,
    count: usize,
    dipole_groups: usize,
}

impl SectionLayout {
    /// Create a layout.
    ///
    /// `dipole_groups` defaults to `count`. Facilities whose final section
    /// lies after the last dipole use `count - 1`.
    ///
    /// # Errors
    ///
    /// Returns `SectionError::InvalidLayout` if `count` or `dipole_groups`
    /// is zero.
    pub fn new(
        dipole: FamilyTag,
        count: usize,
        dipole_groups: Option<usize>,
    ) -> Result<Self, SectionError> {
        if count == 0 {
            return Err(SectionError::InvalidLayout(
                "section count must be at least 1".into(),
            ));
        }
        let dipole_groups = dipole_groups.unwrap_or(count);
        if dipole_groups == 0 {
            return Err(SectionError::InvalidLayout(
                "dipole group count must be at least 1".into(),
            ));
        }
        Ok(Self {
            dipole,
            count,
            dipole_groups,
        })
    }

    /// Family tag of the facility's dipoles.
    pub fn dipole(&self) -> &FamilyTag {
        &self.dipole
    }

    /// Number of sections.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of groups the dipole positions are split into.
    pub fn dipole_groups(&self) -> usize {
        self.dipole_groups
    }
}

/// Section label of every lattice position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionLabeling(Vec<SectionLabel>);

impl SectionLabeling {
    /// Wrap precomputed labels.
    pub fn from_labels(labels: Vec<SectionLabel>) -> Self {
        Self(labels)
    }

    /// Label at `position`.
    pub fn get(&self, position: usize) -> Option<&SectionLabel> {
        self.0.get(position)
    }

    /// Number of labeled positions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no positions are labeled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All labels in position order.
    pub fn as_slice(&self) -> &[SectionLabel] {
        &self.0
    }

    /// Contiguous runs of equal labels as `(label, positions)`.
    pub fn spans(&self) -> Vec<(SectionLabel, Range<usize>)> {
        let mut spans: Vec<(SectionLabel, Range<usize>)> = Vec::new();
        for (i, label) in self.0.iter().enumerate() {
            match spans.last_mut() {
                Some((current, range)) if current == label => range.end = i + 1,
                _ => spans.push((label.clone(), i..i + 1)),
            }
        }
        spans
    }
}

/// Compute the section label of every lattice position.
///
/// # Errors
///
/// - `SectionError::DipoleNotFound` if the lattice has no dipoles
/// - `SectionError::TooFewDipoles` if there are fewer dipoles than groups
///
/// # Example
///
/// ```
/// use latticenames::core::lattice::Lattice;
/// use latticenames::core::sections::{compute_sections, SectionLayout};
/// use latticenames::core::types::FamilyTag;
///
/// let lattice = Lattice::from_tags(["QF", "B", "QD", "B", "QF"]).unwrap();
/// let layout = SectionLayout::new(FamilyTag::new("B").unwrap(), 2, None).unwrap();
/// let sections = compute_sections(&lattice, &layout).unwrap();
/// let labels: Vec<_> = sections.as_slice().iter().map(|s| s.as_str()).collect();
/// assert_eq!(labels, vec!["01", "01", "02", "02", "02"]);
/// ```
pub fn compute_sections(
    lattice: &Lattice,
    layout: &SectionLayout,
) -> Result<SectionLabeling, SectionError> {
    let dipoles = lattice.positions_of(layout.dipole.as_str());
    let last_dipole = match dipoles.last() {
        Some(&p) => p,
        None => return Err(SectionError::DipoleNotFound(layout.dipole.clone())),
    };

    let per_group = dipoles.len() / layout.dipole_groups;
    if per_group == 0 {
        return Err(SectionError::TooFewDipoles {
            dipole: layout.dipole.clone(),
            found: dipoles.len(),
            groups: layout.dipole_groups,
        });
    }

    let mut breakpoints: Vec<usize> = (1..layout.dipole_groups)
        .map(|g| dipoles[g * per_group - 1])
        .collect();
    breakpoints.push(last_dipole);
    breakpoints.push(lattice.len() - 1);
    breakpoints.sort_unstable();

    tracing::debug!(
        dipole = %layout.dipole,
        dipoles = dipoles.len(),
        per_group,
        ?breakpoints,
        "computed section breakpoints"
    );

    let vocabulary = SectionLabel::vocabulary(layout.count);
    let last_section = layout.count - 1;
    let mut current = 0;
    let mut labels = Vec::with_capacity(lattice.len());
    for position in 0..lattice.len() {
        labels.push(vocabulary[current.min(last_section)].clone());
        if current < breakpoints.len() && position >= breakpoints[current] {
            current += 1;
        }
    }

    Ok(SectionLabeling(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> FamilyTag {
        FamilyTag::new(s).unwrap()
    }

    fn labels(labeling: &SectionLabeling) -> Vec<&str> {
        labeling.as_slice().iter().map(|s| s.as_str()).collect()
    }

    /// Lattice of `n` dipoles, each followed by one quadrupole.
    fn ring(n: usize) -> Lattice {
        Lattice::from_tags((0..n).flat_map(|_| ["B", "QF"])).unwrap()
    }

    #[test]
    fn one_label_per_position() {
        let lattice = ring(12);
        let layout = SectionLayout::new(tag("B"), 4, None).unwrap();
        let sections = compute_sections(&lattice, &layout).unwrap();
        assert_eq!(sections.len(), lattice.len());
    }

    #[test]
    fn dipoles_split_evenly_between_sections() {
        let lattice = ring(48);
        let layout = SectionLayout::new(tag("B"), 4, None).unwrap();
        let sections = compute_sections(&lattice, &layout).unwrap();

        let dipoles = lattice.positions_of("B");
        for (k, chunk) in dipoles.chunks(12).enumerate() {
            for &p in chunk {
                assert_eq!(sections.get(p).unwrap(), &SectionLabel::nth(k));
            }
        }
        assert_eq!(sections.spans().len(), 4);
    }

    #[test]
    fn trailing_section_after_last_dipole() {
        // Three dipoles, four sections: the fourth section follows the last dipole.
        let lattice = Lattice::from_tags(["QF", "B", "QD", "B", "QF", "B", "QD", "BPM"]).unwrap();
        let layout = SectionLayout::new(tag("B"), 4, Some(3)).unwrap();
        let sections = compute_sections(&lattice, &layout).unwrap();
        assert_eq!(
            labels(&sections),
            vec!["01", "01", "02", "02", "03", "03", "04", "04"]
        );
    }

    #[test]
    fn remainder_joins_last_group() {
        // 7 dipoles in 3 groups: 2, 2, 3.
        let lattice = Lattice::from_tags(["B"; 7]).unwrap();
        let layout = SectionLayout::new(tag("B"), 3, None).unwrap();
        let sections = compute_sections(&lattice, &layout).unwrap();
        assert_eq!(
            labels(&sections),
            vec!["01", "01", "02", "02", "03", "03", "03"]
        );
    }

    #[test]
    fn label_clamps_at_last_section() {
        let lattice = Lattice::from_tags(["B", "B", "QF", "QF"]).unwrap();
        let layout = SectionLayout::new(tag("B"), 2, None).unwrap();
        let sections = compute_sections(&lattice, &layout).unwrap();
        assert_eq!(labels(&sections), vec!["01", "02", "02", "02"]);
    }

    #[test]
    fn missing_dipole_is_error() {
        let lattice = Lattice::from_tags(["QF", "QD"]).unwrap();
        let layout = SectionLayout::new(tag("B"), 2, None).unwrap();
        assert_eq!(
            compute_sections(&lattice, &layout),
            Err(SectionError::DipoleNotFound(tag("B")))
        );
    }

    #[test]
    fn too_few_dipoles_is_error() {
        let lattice = Lattice::from_tags(["B", "QF", "B"]).unwrap();
        let layout = SectionLayout::new(tag("B"), 4, None).unwrap();
        assert!(matches!(
            compute_sections(&lattice, &layout),
            Err(SectionError::TooFewDipoles { found: 2, groups: 4, .. })
        ));
    }

    #[test]
    fn zero_counts_rejected() {
        assert!(SectionLayout::new(tag("B"), 0, None).is_err());
        assert!(SectionLayout::new(tag("B"), 2, Some(0)).is_err());
    }

    #[test]
    fn spans_cover_lattice() {
        let lattice = ring(8);
        let layout = SectionLayout::new(tag("B"), 4, None).unwrap();
        let spans = compute_sections(&lattice, &layout).unwrap().spans();
        assert_eq!(spans.first().unwrap().1.start, 0);
        assert_eq!(spans.last().unwrap().1.end, lattice.len());
        assert!(spans.windows(2).all(|w| w[0].1.end == w[1].1.start));
    }
}
