//! Shared data types for the faction war engine.
//!
//! This crate contains pure data structures with no orchestration logic.
//! It is a dependency for every other crate in the workspace.

pub mod agent;
pub mod attribute;
pub mod event;
pub mod faction;

pub use agent::{AgentHandle, Position};
pub use attribute::{CombatAttribute, CombatFlag, CombatMovement, CombatRange, ConfigFlag, TargetLossResponse};
pub use event::{EngineEvent, EventKind, FaultSite, TargetKind};
pub use faction::{Faction, ParseFactionError, RelationGroup, Stance};
