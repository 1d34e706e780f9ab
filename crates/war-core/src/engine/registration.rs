//! Registration and cleanup of faction members.

use thiserror::Error;
use tracing::{debug, info, warn};
use war_events::{AgentHandle, EventKind, Faction, FaultSite, ParseFactionError};

use super::profile::CombatProfile;
use super::FactionEngine;
use crate::host::{HostError, HostWorld};

/// Why a registration failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Missing, dead, or the player. Nothing changed.
    #[error("{0} cannot join a faction")]
    InvalidAgent(AgentHandle),
    /// The label is not a faction. Nothing changed.
    #[error("cannot register {agent}: {source}")]
    UnknownFaction {
        agent: AgentHandle,
        #[source]
        source: ParseFactionError,
    },
    /// The agent joined the faction but its combat configuration stopped
    /// partway. It is not configured again.
    #[error("{agent} joined {faction} but configuration failed: {source}")]
    Configuration {
        agent: AgentHandle,
        faction: Faction,
        #[source]
        source: HostError,
    },
}

/// A successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub agent: AgentHandle,
    pub faction: Faction,
    /// Faction the agent was in before, if any
    pub previous: Option<Faction>,
    /// True if combat configuration was issued by this call
    pub newly_configured: bool,
}

impl Registration {
    pub fn moved(&self) -> bool {
        matches!(self.previous, Some(p) if p != self.faction)
    }
}

/// Entries dropped by a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub heroes: usize,
    pub villains: usize,
    pub cooldowns: usize,
}

impl CleanupReport {
    /// Roster entries removed
    pub fn removed(&self) -> usize {
        self.heroes + self.villains
    }

    pub fn is_empty(&self) -> bool {
        self.removed() == 0 && self.cooldowns == 0
    }
}

impl FactionEngine {
    /// Registers `agent` under a faction label (`Hero` or `Villain`, any case).
    pub fn register<H: HostWorld + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentHandle,
        label: &str,
    ) -> Result<Registration, RegisterError> {
        if !host.is_valid(agent) {
            return Err(RegisterError::InvalidAgent(agent));
        }
        let faction = label
            .parse::<Faction>()
            .map_err(|source| RegisterError::UnknownFaction { agent, source })?;
        self.register_as(host, agent, faction)
    }

    /// Registers `agent` into `faction`, moving it out of the other one.
    ///
    /// The first registration of an agent issues its combat configuration.
    pub fn register_as<H: HostWorld + ?Sized>(
        &mut self,
        host: &mut H,
        agent: AgentHandle,
        faction: Faction,
    ) -> Result<Registration, RegisterError> {
        if !host.is_valid(agent) {
            return Err(RegisterError::InvalidAgent(agent));
        }
        let now = host.now();

        let previous = self.roster.insert(agent, faction, now);
        match previous {
            Some(p) if p == faction => debug!("{} already registered as {}", agent, faction),
            Some(p) => {
                info!("{} moved from {} to {}", agent, p, faction);
                self.record(now, EventKind::Registered { agent, faction, previous });
            }
            None => {
                debug!("{} registered as {}", agent, faction);
                self.record(now, EventKind::Registered { agent, faction, previous });
            }
        }

        let mut registration = Registration {
            agent,
            faction,
            previous,
            newly_configured: false,
        };
        if !self.roster.needs_configuration(agent) {
            return Ok(registration);
        }

        self.roster.mark_configured(agent);
        registration.newly_configured = true;
        let profile = CombatProfile::for_faction(faction, &self.profile, self.config.hero_detection_radius);

        let mut issued = 0;
        for attribute in &profile.attributes {
            if let Err(source) = host.apply_attribute(agent, attribute) {
                warn!(
                    "Configuration of {} stopped after {} of {} commands: {}",
                    agent,
                    issued,
                    profile.len(),
                    source
                );
                self.record(now, EventKind::Fault {
                    site: FaultSite::Configuration,
                    agent: Some(agent),
                    message: source.to_string(),
                });
                return Err(RegisterError::Configuration { agent, faction, source });
            }
            issued += 1;
        }

        debug!("{} configured as {} ({} commands)", agent, faction, issued);
        self.record(now, EventKind::Configured {
            agent,
            faction,
            commands: issued,
        });
        Ok(registration)
    }

    /// Drops every roster and cooldown entry whose agent no longer exists.
    pub fn cleanup_invalid<H: HostWorld + ?Sized>(&mut self, host: &H) -> CleanupReport {
        let (heroes, villains) = self.roster.retain(|agent| host.exists(agent));
        let cooldowns = self.cooldowns.retain(|agent| host.exists(agent));
        let report = CleanupReport {
            heroes,
            villains,
            cooldowns,
        };

        if report.removed() > 0 {
            debug!(
                "Cleaned up {} heroes and {} villains, {} remain",
                heroes,
                villains,
                self.roster.len()
            );
            self.record(host.now(), EventKind::CleanedUp { heroes, villains });
        }
        report
    }
}
