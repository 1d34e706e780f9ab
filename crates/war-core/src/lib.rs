//! Faction war orchestration: registry, combat decisions, fallback handling,
//! world sampling, and a sandbox host to run it all against.

pub mod config;
pub mod engine;
pub mod events;
pub mod host;
pub mod process;
pub mod sampler;
pub mod sandbox;

pub use config::{ConfigError, WarConfig};
pub use engine::{
    CleanupReport, CombatOutcome, CombatReport, CombatStats, EngineMode, FactionEngine,
    FaultResponse, RegisterError, Registration, WarTransition,
};
pub use events::{DiagnosticLog, PendingEvents};
pub use host::{ClearOrders, HostError, HostWorld};
pub use process::{ProcessLoop, TickOutcome, TickReport};
pub use sampler::{SampleOutcome, ScanReport, ScanSkip, WorldSampler};
pub use sandbox::{SandboxCommand, SandboxWorld};
