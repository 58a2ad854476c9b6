//! core::cache
//!
//! Caller-owned memoization of computed family data.
//!
//! # Design
//!
//! The cache is bound to one [`Facility`] and keyed by the lattice
//! [`Fingerprint`], so two lattices with the same family tag sequence share
//! an entry and any change to the sequence misses. Entries hold unrotated
//! data; rotation stays a per-call transform in
//! [`DeviceNamer`](super::devices::DeviceNamer).
//!
//! Nothing here is global: callers create a cache, pass it around, and drop
//! it when done.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use latticenames::core::cache::FamilyCache;
//! use latticenames::core::config::Facility;
//! use latticenames::core::devices::DeviceNamer;
//! use latticenames::core::lattice::Lattice;
//! use std::path::Path;
//!
//! let facility = Arc::new(Facility::resolve("ts").unwrap().facility);
//! let mut cache = FamilyCache::new(facility);
//! let lattice = Lattice::load(Path::new("ts.json")).unwrap();
//!
//! let data = cache.get_or_compute(&lattice).unwrap();
//! let namer = DeviceNamer::from_family_data(cache.facility(), &data).unwrap();
//! println!("{} devices", namer.device_names(None).unwrap().len());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::config::Facility;
use super::family::{FamilyData, FamilyError};
use super::lattice::Lattice;
use super::types::Fingerprint;

/// Family data per lattice fingerprint for one facility.
#[derive(Debug)]
pub struct FamilyCache {
    facility: Arc<Facility>,
    entries: HashMap<Fingerprint, Arc<FamilyData>>,
}

impl FamilyCache {
    pub fn new(facility: Arc<Facility>) -> Self {
        Self {
            facility,
            entries: HashMap::new(),
        }
    }

    /// Facility the cached data was computed under.
    pub fn facility(&self) -> &Facility {
        &self.facility
    }

    /// Cached data for `lattice`, computing it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates family computation failures; failures are not cached.
    pub fn get_or_compute(&mut self, lattice: &Lattice) -> Result<Arc<FamilyData>, FamilyError> {
        let fingerprint = lattice.fingerprint();
        if let Some(data) = self.entries.get(&fingerprint) {
            tracing::debug!(fingerprint = %fingerprint.short(), "family cache hit");
            return Ok(Arc::clone(data));
        }

        let data = Arc::new(self.facility.family_data(lattice)?);
        tracing::debug!(fingerprint = %fingerprint.short(), "family cache miss");
        self.entries.insert(fingerprint, Arc::clone(&data));
        Ok(data)
    }

    /// Whether data for `lattice` is cached.
    pub fn contains(&self, lattice: &Lattice) -> bool {
        self.entries.contains_key(&lattice.fingerprint())
    }

    /// Drop the entry for `lattice`, if any.
    pub fn invalidate(&mut self, lattice: &Lattice) -> bool {
        self.entries.remove(&lattice.fingerprint()).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACILITY: &str = r#"
        system = "tb"

        [sections]
        dipole = "b"
        count = 2

        [segments]
        b = 1
        qf = 1
    "#;

    fn cache() -> FamilyCache {
        FamilyCache::new(Arc::new(Facility::from_toml(FACILITY).unwrap()))
    }

    #[test]
    fn hit_returns_same_allocation() {
        let mut cache = cache();
        let lattice = Lattice::from_tags(["b", "qf", "b", "qf"]).unwrap();
        let first = cache.get_or_compute(&lattice).unwrap();
        let second = cache.get_or_compute(&lattice).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn equal_content_shares_entry() {
        let mut cache = cache();
        let a = Lattice::from_tags(["b", "qf", "b"]).unwrap();
        let b = Lattice::from_tags(["b", "qf", "b"]).unwrap();
        cache.get_or_compute(&a).unwrap();
        assert!(cache.contains(&b));
    }

    #[test]
    fn different_lattice_misses() {
        let mut cache = cache();
        cache
            .get_or_compute(&Lattice::from_tags(["b", "qf", "b"]).unwrap())
            .unwrap();
        let other = Lattice::from_tags(["b", "b", "qf"]).unwrap();
        assert!(!cache.contains(&other));
        cache.get_or_compute(&other).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = cache();
        let no_dipoles = Lattice::from_tags(["qf", "qf"]).unwrap();
        assert!(cache.get_or_compute(&no_dipoles).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = cache();
        let lattice = Lattice::from_tags(["b", "qf", "b"]).unwrap();
        cache.get_or_compute(&lattice).unwrap();
        assert!(cache.invalidate(&lattice));
        assert!(!cache.invalidate(&lattice));
        cache.get_or_compute(&lattice).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cached_data_matches_direct_computation() {
        let mut cache = cache();
        let lattice = Lattice::from_tags(["qf", "b", "qf", "b"]).unwrap();
        let cached = cache.get_or_compute(&lattice).unwrap();
        let direct = cache.facility().family_data(&lattice).unwrap();
        assert_eq!(*cached, direct);
    }
}
