//! Archetype records and per-record validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use war_events::Faction;

use crate::error::RecordError;

/// One archetype in the catalog: a visual model and the character it plays.
///
/// Missing string fields deserialize as empty and are reported by
/// [`ArchetypeRecord::validate`] rather than failing the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArchetypeRecord {
    /// Display name of the character
    #[serde(default, alias = "name")]
    pub name: String,
    /// Host model name, e.g. `s_m_y_cop_01`
    #[serde(default, alias = "model")]
    pub model: String,
    /// Model hash as written in the catalog, e.g. `0x62018559`
    #[serde(default, alias = "hash")]
    pub hash: String,
    #[serde(default, alias = "description")]
    pub description: String,
    /// `Hero` or `Villain`
    #[serde(default, alias = "faction")]
    pub faction: String,
    /// Power classification, e.g. `Strength` or `Technology`
    #[serde(default, alias = "power_type")]
    pub power_type: String,
}

impl ArchetypeRecord {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        hash: impl Into<String>,
        faction: impl Into<String>,
        power_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            hash: hash.into(),
            description: String::new(),
            faction: faction.into(),
            power_type: power_type.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parses the hex hash, with or without a `0x` prefix.
    pub fn hash_value(&self) -> Result<u32, RecordError> {
        let trimmed = self.hash.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(RecordError::MissingHash {
                name: self.name.clone(),
            });
        }

        u32::from_str_radix(digits, 16).map_err(|_| RecordError::MalformedHash {
            name: self.name.clone(),
            hash: self.hash.clone(),
        })
    }

    /// Parsed faction label, if it is one of the two known factions.
    pub fn faction(&self) -> Option<Faction> {
        self.faction.parse().ok()
    }

    /// Collects every problem with this record.
    pub fn validate(&self) -> Vec<RecordError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(RecordError::MissingName {
                hash: self.hash.clone(),
            });
        } else if self.name.chars().count() < 2 {
            errors.push(RecordError::NameTooShort {
                name: self.name.clone(),
            });
        }

        if self.model.is_empty() {
            errors.push(RecordError::MissingModel {
                name: self.name.clone(),
            });
        } else if !self.model.contains('_') {
            errors.push(RecordError::MalformedModel {
                name: self.name.clone(),
                model: self.model.clone(),
            });
        }

        match self.hash_value() {
            Ok(0) => errors.push(RecordError::ZeroHash {
                name: self.name.clone(),
            }),
            Ok(u32::MAX) => errors.push(RecordError::OverflowHash {
                name: self.name.clone(),
            }),
            Ok(_) => {}
            Err(e) => errors.push(e),
        }

        if self.faction.is_empty() {
            errors.push(RecordError::MissingFaction {
                name: self.name.clone(),
            });
        } else if self.faction().is_none() {
            errors.push(RecordError::UnknownFaction {
                name: self.name.clone(),
                faction: self.faction.clone(),
            });
        }

        if self.power_type.is_empty() {
            errors.push(RecordError::MissingPowerType {
                name: self.name.clone(),
            });
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl fmt::Display for ArchetypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}, {})", self.name, self.model, self.hash, self.faction)
    }
}
