//! Faction Engine
//!
//! Owns faction membership, the per-cycle combat decision loop, engagement
//! cooldowns and the fallback state machine. The engine never stores the
//! host: every operation takes it as `&mut H`, and `&mut self` keeps a host
//! callback from re-entering an operation that is still running.

mod combat;
pub mod cooldown;
pub mod fallback;
pub mod profile;
mod registration;
pub mod roster;

pub use combat::{CombatOutcome, CombatReport};
pub use fallback::{EngineMode, FallbackState, FaultResponse};
pub use profile::CombatProfile;
pub use registration::{CleanupReport, RegisterError, Registration};
pub use roster::{ConfigState, FactionRoster, MemberEntry};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{info, warn};
use war_events::{
    AgentHandle, EngineEvent, EventKind, Faction, FaultSite, RelationGroup, Stance,
};

use crate::config::{EngineConfig, ProfileConfig, WarConfig};
use crate::events::PendingEvents;
use crate::host::{ClearOrders, HostError, HostWorld};
use cooldown::{EngagementCooldowns, LogThrottle, UpdateStride};

/// Relationship matrix established when the war starts.
const RELATIONSHIPS: [(RelationGroup, RelationGroup, Stance); 4] = [
    (RelationGroup::Heroes, RelationGroup::Villains, Stance::Hate),
    (RelationGroup::Villains, RelationGroup::Heroes, Stance::Hate),
    (RelationGroup::Villains, RelationGroup::Player, Stance::Hate),
    (RelationGroup::Heroes, RelationGroup::Player, Stance::Neutral),
];

/// Result of switching the war on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarTransition {
    Activated {
        /// False if the relationship matrix could not be set; it is retried
        /// on the next activation.
        relationships_established: bool,
    },
    Deactivated {
        destroyed: usize,
        faults: usize,
    },
}

/// Fighter counts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatStats {
    /// Heroes currently in combat
    pub active_heroes: usize,
    /// Villains currently in combat
    pub active_villains: usize,
    pub total_registered: usize,
}

/// Faction war orchestration state
pub struct FactionEngine {
    config: EngineConfig,
    profile: ProfileConfig,
    roster: FactionRoster,
    cooldowns: EngagementCooldowns,
    stride: UpdateStride,
    fallback: FallbackState,
    summary_throttle: LogThrottle,
    actions_this_tick: usize,
    relationships_initialized: bool,
    active: bool,
    rng: SmallRng,
    events: PendingEvents,
}

impl FactionEngine {
    /// Creates an inactive engine drawing every random choice from `rng`.
    pub fn new(config: &WarConfig, rng: SmallRng) -> Self {
        Self {
            config: config.engine.clone(),
            profile: config.profile.clone(),
            roster: FactionRoster::new(),
            cooldowns: EngagementCooldowns::new(config.engine.engagement_cooldown()),
            stride: UpdateStride::new(config.engine.update_stride),
            fallback: FallbackState::new(config.fallback.fault_threshold, config.fallback.duration()),
            summary_throttle: LogThrottle::new(config.engine.combat_log_interval),
            actions_this_tick: 0,
            relationships_initialized: false,
            active: false,
            rng,
            events: PendingEvents::new(),
        }
    }

    pub fn with_seed(config: &WarConfig, seed: u64) -> Self {
        Self::new(config, SmallRng::seed_from_u64(seed))
    }

    // --- Queries ---

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn total_count(&self) -> usize {
        self.roster.len()
    }

    pub fn hero_count(&self) -> usize {
        self.roster.count_of(Faction::Hero)
    }

    pub fn villain_count(&self) -> usize {
        self.roster.count_of(Faction::Villain)
    }

    pub fn heroes(&self) -> Vec<AgentHandle> {
        self.roster.members_of(Faction::Hero)
    }

    pub fn villains(&self) -> Vec<AgentHandle> {
        self.roster.members_of(Faction::Villain)
    }

    pub fn faction_of(&self, agent: AgentHandle) -> Option<Faction> {
        self.roster.faction_of(agent)
    }

    pub fn is_configured(&self, agent: AgentHandle) -> bool {
        self.roster
            .get(agent)
            .map_or(false, |e| e.config_state == ConfigState::Configured)
    }

    pub fn roster(&self) -> &FactionRoster {
        &self.roster
    }

    pub fn mode(&self) -> EngineMode {
        self.fallback.mode()
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.fallback.consecutive_faults()
    }

    pub fn fallback(&self) -> &FallbackState {
        &self.fallback
    }

    /// Attackers with a recorded engagement time.
    pub fn cooldown_count(&self) -> usize {
        self.cooldowns.len()
    }

    pub fn last_engaged(&self, agent: AgentHandle) -> Option<Duration> {
        self.cooldowns.last_engaged(agent)
    }

    /// Engagements issued by the most recent completed update.
    pub fn actions_this_tick(&self) -> usize {
        self.actions_this_tick
    }

    /// Takes every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &PendingEvents {
        &self.events
    }

    /// Counts registered agents that are fighting right now.
    pub fn combat_stats<H: HostWorld + ?Sized>(&self, host: &H) -> CombatStats {
        let mut stats = CombatStats {
            total_registered: self.roster.len(),
            ..CombatStats::default()
        };
        for agent in self.roster.handles() {
            if !host.exists(agent) || !host.is_in_combat(agent) {
                continue;
            }
            match self.roster.faction_of(agent) {
                Some(Faction::Hero) => stats.active_heroes += 1,
                Some(Faction::Villain) => stats.active_villains += 1,
                None => {}
            }
        }
        if stats.active_heroes + stats.active_villains > 0 {
            info!(
                "Combat: {} heroes, {} villains fighting ({} registered)",
                stats.active_heroes, stats.active_villains, stats.total_registered
            );
        }
        stats
    }

    // --- Activation ---

    /// Starts or stops the war.
    ///
    /// Starting sets the relationship matrix the first time it succeeds.
    /// Stopping clears orders for and destroys every registered agent that
    /// still exists, then forgets all membership and cooldowns.
    pub fn set_war_active<H: HostWorld + ?Sized>(&mut self, host: &mut H, active: bool) -> WarTransition {
        if active {
            self.activate(host)
        } else {
            self.deactivate(host)
        }
    }

    fn activate<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> WarTransition {
        let now = host.now();
        if !self.relationships_initialized {
            match Self::establish_relationships(host) {
                Ok(()) => {
                    self.relationships_initialized = true;
                    info!("Faction relationships established");
                }
                Err(e) => {
                    warn!("Failed to establish faction relationships: {}", e);
                    self.record(now, EventKind::Fault {
                        site: FaultSite::Relationships,
                        agent: None,
                        message: e.to_string(),
                    });
                }
            }
        }
        if !self.active {
            self.active = true;
            info!("Faction war activated");
            self.record(now, EventKind::WarActivated);
        }
        WarTransition::Activated {
            relationships_established: self.relationships_initialized,
        }
    }

    fn establish_relationships<H: HostWorld + ?Sized>(host: &mut H) -> Result<(), HostError> {
        for (from, to, stance) in RELATIONSHIPS {
            host.set_relationship(from, to, stance)?;
        }
        Ok(())
    }

    fn deactivate<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> WarTransition {
        let now = host.now();
        let mut destroyed = 0;
        let mut faults = 0;

        for agent in self.roster.handles() {
            if !host.exists(agent) {
                continue;
            }
            if let Err(e) = host.clear_orders(agent, ClearOrders::Gracefully) {
                warn!("Could not clear orders for {}: {}", agent, e);
            }
            match host.destroy(agent) {
                Ok(()) => destroyed += 1,
                Err(e) if e.is_invalid_reference() => {}
                Err(e) => {
                    faults += 1;
                    warn!("Could not destroy {}: {}", agent, e);
                    self.record(now, EventKind::Fault {
                        site: FaultSite::Teardown,
                        agent: Some(agent),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.roster.clear();
        self.cooldowns.clear();
        self.actions_this_tick = 0;
        self.stride = UpdateStride::new(self.config.update_stride);
        self.fallback.reset();
        self.active = false;

        info!("Faction war deactivated: {} agents destroyed", destroyed);
        self.record(now, EventKind::WarDeactivated { destroyed });
        WarTransition::Deactivated { destroyed, faults }
    }

    fn record(&mut self, at: Duration, kind: EventKind) {
        self.events.push(EngineEvent::new(at.as_millis() as u64, kind));
    }
}
