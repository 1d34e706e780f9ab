//! Catalog error types.

use std::path::PathBuf;
use thiserror::Error;

/// A problem with a single archetype record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing name for hash {hash}")]
    MissingName { hash: String },
    #[error("name '{name}' is too short (min 2 characters)")]
    NameTooShort { name: String },
    #[error("missing model for {name}")]
    MissingModel { name: String },
    #[error("malformed model for {name}: {model} (underscore required)")]
    MalformedModel { name: String, model: String },
    #[error("missing hash for {name}")]
    MissingHash { name: String },
    #[error("malformed hash for {name}: {hash}")]
    MalformedHash { name: String, hash: String },
    #[error("hash is zero for {name}")]
    ZeroHash { name: String },
    #[error("hash overflows for {name}")]
    OverflowHash { name: String },
    #[error("missing faction for {name}")]
    MissingFaction { name: String },
    #[error("faction '{faction}' for {name} must be Hero or Villain")]
    UnknownFaction { name: String, faction: String },
    #[error("missing power type for {name}")]
    MissingPowerType { name: String },
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file {path} not found")]
    NotFound { path: PathBuf },
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog is empty")]
    Empty,
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog has {found} archetypes, expected {expected}")]
    WrongCount { found: usize, expected: usize },
    #[error("duplicate hash {hash} for {name}")]
    DuplicateHash { name: String, hash: String },
    #[error("{count} invalid archetype record(s)")]
    InvalidRecords { count: usize, errors: Vec<RecordError> },
}
