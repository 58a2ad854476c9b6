//! core::lattice
//!
//! Read-only view of an ordered lattice model.
//!
//! The physics model that produces a lattice lives elsewhere. All this
//! crate needs from it is the ordered sequence of family tags, so a
//! [`Lattice`] is exactly that: element `i` is the element at raw position
//! `i`.
//!
//! # Input format
//!
//! Lattices deserialize from a JSON array of element objects. Only
//! `fam_name` is read; other fields exported by the modelling library are
//! ignored.
//!
//! ```
//! use latticenames::core::lattice::Lattice;
//!
//! let lattice: Lattice = serde_json::from_str(
//!     r#"[{"fam_name": "start"}, {"fam_name": "B", "length": 0.6}, {"fam_name": "QF"}]"#,
//! ).unwrap();
//! assert_eq!(lattice.len(), 3);
//! assert_eq!(lattice.positions_of("B"), vec![1]);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{FamilyTag, Fingerprint};

/// Errors from reading a lattice file.
#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("failed to read lattice file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse lattice file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// One lattice element, reduced to its family tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Family this element belongs to.
    pub fam_name: FamilyTag,
}

impl Element {
    /// Create an element of the given family.
    pub fn new(family: FamilyTag) -> Self {
        Self { fam_name: family }
    }
}

/// An ordered, immutable sequence of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lattice {
    elements: Vec<Element>,
}

impl Lattice {
    /// Build a lattice from elements in position order.
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// Build a lattice from family tags in position order.
    ///
    /// # Errors
    ///
    /// Returns the first tag validation failure.
    pub fn from_tags<I, S>(tags: I) -> Result<Self, super::types::TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elements = tags
            .into_iter()
            .map(|t| FamilyTag::new(t).map(Element::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(elements))
    }

    /// Read a lattice from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LatticeError> {
        let contents = fs::read_to_string(path).map_err(|e| LatticeError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&contents).map_err(|e| LatticeError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the lattice has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Family tag of the element at `position`.
    pub fn family_at(&self, position: usize) -> Option<&FamilyTag> {
        self.elements.get(position).map(|e| &e.fam_name)
    }

    /// Iterate over family tags in position order.
    pub fn families(&self) -> impl Iterator<Item = &FamilyTag> {
        self.elements.iter().map(|e| &e.fam_name)
    }

    /// Ascending raw positions of every element tagged `family`.
    pub fn positions_of(&self, family: &str) -> Vec<usize> {
        self.families()
            .enumerate()
            .filter(|(_, tag)| tag.as_str() == family)
            .map(|(i, _)| i)
            .collect()
    }

    /// Map every family present to its ascending raw positions.
    pub fn find_dict(&self) -> BTreeMap<FamilyTag, Vec<usize>> {
        let mut dict: BTreeMap<FamilyTag, Vec<usize>> = BTreeMap::new();
        for (i, tag) in self.families().enumerate() {
            dict.entry(tag.clone()).or_default().push(i);
        }
        dict
    }

    /// Content fingerprint of the family sequence.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.families().map(|t| t.as_str()))
    }
}

impl FromIterator<Element> for Lattice {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
