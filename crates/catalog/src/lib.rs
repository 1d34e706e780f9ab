//! Archetype catalog: maps a host model hash to the character it represents.
//!
//! The catalog is a JSON list of [`ArchetypeRecord`]s. Loading is strict: the
//! file must contain exactly the expected number of archetypes, every record
//! must validate, and no two records may share a model hash.
//!
//! ```ignore
//! let catalog = Catalog::load("data/catalog.json", EXPECTED_ARCHETYPE_COUNT)?;
//! if let Some(record) = catalog.lookup(0x62018559) {
//!     println!("{} fights for the {}", record.name, record.faction);
//! }
//! ```

pub mod error;
pub mod record;

pub use error::{CatalogError, RecordError};
pub use record::ArchetypeRecord;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{error, info};
use war_events::Faction;

/// Number of archetypes the shipped catalog is expected to hold.
pub const EXPECTED_ARCHETYPE_COUNT: usize = 106;

/// How many archetypes belong to each faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactionCounts {
    pub heroes: usize,
    pub villains: usize,
}

impl FactionCounts {
    pub fn total(&self) -> usize {
        self.heroes + self.villains
    }
}

/// A loaded and validated archetype catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<ArchetypeRecord>,
    /// Maps model hash -> index into `records`
    by_hash: HashMap<u32, usize>,
}

impl Catalog {
    /// Loads and validates a catalog file.
    pub fn load(path: impl AsRef<Path>, expected_count: usize) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::NotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Loading archetype catalog from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, expected_count)
    }

    /// Parses and validates catalog JSON.
    pub fn from_json(content: &str, expected_count: usize) -> Result<Self, CatalogError> {
        if content.trim().is_empty() {
            return Err(CatalogError::Empty);
        }
        let records: Vec<ArchetypeRecord> = serde_json::from_str(content)?;
        Self::from_records(records, expected_count)
    }

    /// Validates an in-memory list of records.
    pub fn from_records(
        records: Vec<ArchetypeRecord>,
        expected_count: usize,
    ) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        if records.len() != expected_count {
            return Err(CatalogError::WrongCount {
                found: records.len(),
                expected: expected_count,
            });
        }

        let mut invalid = Vec::new();
        let mut by_hash = HashMap::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let errors = record.validate();
            if !errors.is_empty() {
                for e in &errors {
                    error!("Validation failed for {}: {}", record.name, e);
                }
                invalid.extend(errors);
                continue;
            }

            // validate() already proved the hash parses
            let Ok(hash) = record.hash_value() else {
                continue;
            };
            if by_hash.insert(hash, index).is_some() {
                return Err(CatalogError::DuplicateHash {
                    name: record.name.clone(),
                    hash: record.hash.clone(),
                });
            }
        }

        if !invalid.is_empty() {
            return Err(CatalogError::InvalidRecords {
                count: invalid.len(),
                errors: invalid,
            });
        }

        let catalog = Self { records, by_hash };
        let counts = catalog.faction_counts();
        info!(
            heroes = counts.heroes,
            villains = counts.villains,
            "{} archetypes loaded and validated",
            catalog.len()
        );
        Ok(catalog)
    }

    /// Finds the archetype for a model hash.
    pub fn lookup(&self, hash: u32) -> Option<&ArchetypeRecord> {
        self.by_hash.get(&hash).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[ArchetypeRecord] {
        &self.records
    }

    /// Model hashes of every archetype, in catalog order.
    pub fn hashes(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter_map(|r| r.hash_value().ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn faction_counts(&self) -> FactionCounts {
        let mut counts = FactionCounts::default();
        for record in &self.records {
            match record.faction() {
                Some(Faction::Hero) => counts.heroes += 1,
                Some(Faction::Villain) => counts.villains += 1,
                None => {}
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ArchetypeRecord> {
        vec![
            ArchetypeRecord::new("Captain America", "s_m_y_marine_01", "0x65793043", "Hero", "Strength"),
            ArchetypeRecord::new("Red Skull", "u_m_m_aldinapoli", "0xF0EC56E2", "Villain", "Strength"),
            ArchetypeRecord::new("Iron Man", "s_m_m_pilot_02", "0xFC2F3A9D", "Hero", "Technology"),
        ]
    }

    #[test]
    fn test_lookup_by_hash() {
        let catalog = Catalog::from_records(records(), 3).unwrap();
        assert_eq!(catalog.lookup(0x65793043).unwrap().name, "Captain America");
        assert_eq!(catalog.lookup(0xF0EC56E2).unwrap().faction, "Villain");
        assert!(catalog.lookup(0xDEADBEEF).is_none());
    }

    #[test]
    fn test_faction_counts() {
        let catalog = Catalog::from_records(records(), 3).unwrap();
        let counts = catalog.faction_counts();
        assert_eq!(counts.heroes, 2);
        assert_eq!(counts.villains, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_wrong_count_rejected() {
        let err = Catalog::from_records(records(), 106).unwrap_err();
        assert!(matches!(err, CatalogError::WrongCount { found: 3, expected: 106 }));
    }

    #[test]
    fn test_duplicate_hash_rejected() {
        let mut list = records();
        list[2].hash = "0x65793043".into();
        let err = Catalog::from_records(list, 3).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateHash { .. }));
    }

    #[test]
    fn test_invalid_record_rejected() {
        let mut list = records();
        list[1].faction = "Neutral".into();
        match Catalog::from_records(list, 3) {
            Err(CatalogError::InvalidRecords { count, errors }) => {
                assert_eq!(count, 1);
                assert!(matches!(errors[0], RecordError::UnknownFaction { .. }));
            }
            other => panic!("expected invalid records, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(matches!(Catalog::from_json("   ", 3), Err(CatalogError::Empty)));
        assert!(matches!(Catalog::from_json("[]", 3), Err(CatalogError::Empty)));
        assert!(matches!(Catalog::from_json("{", 3), Err(CatalogError::Parse(_))));
    }
}
