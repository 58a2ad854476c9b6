//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`FamilyTag`] - Validated lattice family label
//! - [`SectionLabel`] - Two-digit section label ("01", "02", ...)
//! - [`IndexGroup`] - Raw lattice positions forming one logical element
//! - [`InstanceLabel`] - Disambiguator for repeated same-section installations
//! - [`Fingerprint`] - Content hash of a lattice's family sequence
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use latticenames::core::types::{FamilyTag, IndexGroup, SectionLabel};
//!
//! // Valid constructions
//! let tag = FamilyTag::new("QF").unwrap();
//! let section = SectionLabel::nth(1);
//! let group = IndexGroup::new(vec![12, 13]).unwrap();
//! assert_eq!(section.as_str(), "02");
//! assert_eq!(group.first(), 12);
//!
//! // Invalid constructions fail at creation time
//! assert!(FamilyTag::new("").is_err());
//! assert!(IndexGroup::new(vec![]).is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid family tag: {0}")]
    InvalidFamilyTag(String),

    #[error("invalid section label: {0}")]
    InvalidSectionLabel(String),

    #[error("invalid index group: {0}")]
    InvalidIndexGroup(String),

    #[error("invalid instance label: {0}")]
    InvalidInstanceLabel(String),
}

/// A validated lattice family tag.
///
/// Family tags identify one physical element type in the lattice model
/// (e.g. `B`, `QF1`, `InjS`). They must:
/// - Not be empty
/// - Not contain whitespace or ASCII control characters
///
/// Tags are case-sensitive; `qf` and `QF` are distinct families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FamilyTag(String);

impl FamilyTag {
    /// Create a new validated family tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFamilyTag` if the tag is empty or contains
    /// whitespace or control characters.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TypeError::InvalidFamilyTag(
                "family tag cannot be empty".into(),
            ));
        }
        if tag
            .chars()
            .any(|c| c.is_whitespace() || c.is_ascii_control())
        {
            return Err(TypeError::InvalidFamilyTag(format!(
                "family tag '{}' cannot contain whitespace or control characters",
                tag.escape_debug()
            )));
        }
        Ok(Self(tag))
    }

    /// Get the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FamilyTag {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for FamilyTag {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<FamilyTag> for String {
    fn from(tag: FamilyTag) -> Self {
        tag.0
    }
}

impl AsRef<str> for FamilyTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for FamilyTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FamilyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A section label from the fixed ascending vocabulary `"01"`, `"02"`, ...
///
/// Labels order the same way their numeric value does because they share
/// a zero-padded width of at least two digits.
///
/// # Example
///
/// ```
/// use latticenames::core::types::SectionLabel;
///
/// assert_eq!(SectionLabel::nth(0).as_str(), "01");
/// assert_eq!(SectionLabel::new("04").unwrap().ordinal(), 3);
/// assert!(SectionLabel::new("4a").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionLabel(String);

impl SectionLabel {
    /// Create a validated section label.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSectionLabel` unless the label is two or
    /// more ASCII digits with a value of at least 1.
    pub fn new(label: impl Into<String>) -> Result<Self, TypeError> {
        let label = label.into();
        if label.len() < 2 || !label.chars().all(|c| c.is_ascii_digit()) {
            return Err(TypeError::InvalidSectionLabel(format!(
                "'{}' is not a zero-padded section number",
                label
            )));
        }
        if label.chars().all(|c| c == '0') {
            return Err(TypeError::InvalidSectionLabel(
                "section numbers start at 01".into(),
            ));
        }
        Ok(Self(label))
    }

    /// The label of the section with zero-based ordinal `n`.
    pub fn nth(n: usize) -> Self {
        Self(format!("{:02}", n + 1))
    }

    /// The first `count` labels of the vocabulary.
    pub fn vocabulary(count: usize) -> Vec<Self> {
        (0..count).map(Self::nth).collect()
    }

    /// Zero-based position of this label in the vocabulary.
    pub fn ordinal(&self) -> usize {
        // Validated as all digits at construction; overflow saturates.
        self.0
            .parse::<usize>()
            .map(|n| n.saturating_sub(1))
            .unwrap_or(usize::MAX)
    }

    /// Get the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SectionLabel {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SectionLabel> for String {
    fn from(label: SectionLabel) -> Self {
        label.0
    }
}

impl std::fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw lattice positions that together form one logical element.
///
/// A physically segmented magnet is modelled as several consecutive lattice
/// entries; the group holds all of them in ascending order. Groups are
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct IndexGroup(Vec<usize>);

impl IndexGroup {
    /// Create a group from raw positions.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidIndexGroup` if `positions` is empty or not
    /// strictly ascending.
    pub fn new(positions: Vec<usize>) -> Result<Self, TypeError> {
        if positions.is_empty() {
            return Err(TypeError::InvalidIndexGroup(
                "index group cannot be empty".into(),
            ));
        }
        if positions.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TypeError::InvalidIndexGroup(format!(
                "positions {:?} are not strictly ascending",
                positions
            )));
        }
        Ok(Self(positions))
    }

    /// Create a group from a chunk produced by `chunks_exact`.
    pub(crate) fn from_chunk(chunk: &[usize]) -> Self {
        debug_assert!(!chunk.is_empty());
        debug_assert!(chunk.windows(2).all(|w| w[0] < w[1]));
        Self(chunk.to_vec())
    }

    /// Create a single-segment group.
    pub fn single(position: usize) -> Self {
        Self(vec![position])
    }

    /// The position that locates the group (its first segment).
    pub fn first(&self) -> usize {
        self.0[0]
    }

    /// All raw positions in the group.
    pub fn positions(&self) -> &[usize] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<usize>> for IndexGroup {
    type Error = TypeError;

    fn try_from(v: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<IndexGroup> for Vec<usize> {
    fn from(group: IndexGroup) -> Self {
        group.0
    }
}

/// Instance label of one installation within its section.
///
/// `Sole` serializes as the empty string; `Numbered(n)` as the decimal
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InstanceLabel {
    /// The only installation of its family in its section.
    Sole,
    /// One of several consecutive installations sharing a section (1-based).
    Numbered(u32),
}

impl InstanceLabel {
    /// Parse the string form (`""` or a positive decimal).
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidInstanceLabel` for anything else.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Ok(Self::Sole);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 && s.chars().all(|c| c.is_ascii_digit()) => Ok(Self::Numbered(n)),
            _ => Err(TypeError::InvalidInstanceLabel(format!(
                "'{}' is neither empty nor a positive number",
                s
            ))),
        }
    }

    /// The label as an optional device-name instance component.
    pub fn as_component(&self) -> Option<String> {
        match self {
            Self::Sole => None,
            Self::Numbered(n) => Some(n.to_string()),
        }
    }
}

impl TryFrom<String> for InstanceLabel {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<InstanceLabel> for String {
    fn from(label: InstanceLabel) -> Self {
        label.to_string()
    }
}

impl std::fmt::Display for InstanceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sole => Ok(()),
            Self::Numbered(n) => write!(f, "{}", n),
        }
    }
}

/// A stable hash over the family sequence of a lattice.
///
/// Two lattices with the same fingerprint produce the same family data
/// under the same facility configuration, so it is usable as a cache key.
///
/// # Example
///
/// ```
/// use latticenames::core::types::Fingerprint;
///
/// let fp = Fingerprint::compute(["B", "QF", "B"]);
/// assert_eq!(fp, Fingerprint::compute(["B", "QF", "B"]));
/// assert_ne!(fp, Fingerprint::compute(["B", "B", "QF"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from an ordered sequence of family tags.
    ///
    /// Order matters: positions are part of the lattice identity.
    pub fn compute<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for tag in tags {
            hasher.update(tag.as_ref().as_bytes());
            hasher.update(b"\n");
        }

        let result = hasher.finalize();
        Self(hex::encode(result))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
