//! Faction Roster
//!
//! Membership of both factions in one map. An agent has exactly one entry, and
//! the entry names its faction, so an agent can never be a hero and a villain
//! at the same time.

use std::collections::BTreeMap;
use std::time::Duration;
use war_events::{AgentHandle, Faction};

/// Whether the one-time combat configuration has been issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigState {
    #[default]
    Unconfigured,
    Configured,
}

/// One registered agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub faction: Faction,
    pub config_state: ConfigState,
    /// Host time of the first registration
    pub registered_at: Duration,
}

/// Registry of faction membership, ordered by handle.
#[derive(Debug, Clone, Default)]
pub struct FactionRoster {
    members: BTreeMap<AgentHandle, MemberEntry>,
}

impl FactionRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `agent` in `faction`, moving it if it was in the other one.
    ///
    /// Returns the previous faction. The configuration state survives a move.
    pub fn insert(&mut self, agent: AgentHandle, faction: Faction, now: Duration) -> Option<Faction> {
        match self.members.get_mut(&agent) {
            Some(entry) => {
                let previous = entry.faction;
                entry.faction = faction;
                Some(previous)
            }
            None => {
                self.members.insert(
                    agent,
                    MemberEntry {
                        faction,
                        config_state: ConfigState::Unconfigured,
                        registered_at: now,
                    },
                );
                None
            }
        }
    }

    pub fn remove(&mut self, agent: AgentHandle) -> Option<MemberEntry> {
        self.members.remove(&agent)
    }

    pub fn get(&self, agent: AgentHandle) -> Option<&MemberEntry> {
        self.members.get(&agent)
    }

    pub fn faction_of(&self, agent: AgentHandle) -> Option<Faction> {
        self.members.get(&agent).map(|e| e.faction)
    }

    pub fn is_member_of(&self, agent: AgentHandle, faction: Faction) -> bool {
        self.faction_of(agent) == Some(faction)
    }

    pub fn needs_configuration(&self, agent: AgentHandle) -> bool {
        self.members
            .get(&agent)
            .map_or(false, |e| e.config_state == ConfigState::Unconfigured)
    }

    pub fn mark_configured(&mut self, agent: AgentHandle) {
        if let Some(entry) = self.members.get_mut(&agent) {
            entry.config_state = ConfigState::Configured;
        }
    }

    /// Members of one faction, in handle order.
    pub fn members_of(&self, faction: Faction) -> Vec<AgentHandle> {
        self.members
            .iter()
            .filter(|(_, e)| e.faction == faction)
            .map(|(&h, _)| h)
            .collect()
    }

    /// Every registered agent, in handle order.
    pub fn handles(&self) -> Vec<AgentHandle> {
        self.members.keys().copied().collect()
    }

    pub fn count_of(&self, faction: Faction) -> usize {
        self.members.values().filter(|e| e.faction == faction).count()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Keeps only agents for which `keep` holds.
    ///
    /// Returns how many heroes and villains were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(AgentHandle) -> bool) -> (usize, usize) {
        let mut heroes = 0;
        let mut villains = 0;
        self.members.retain(|&handle, entry| {
            let kept = keep(handle);
            if !kept {
                match entry.faction {
                    Faction::Hero => heroes += 1,
                    Faction::Villain => villains += 1,
                }
            }
            kept
        });
        (heroes, villains)
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Duration = Duration::ZERO;

    #[test]
    fn test_move_between_factions() {
        let mut roster = FactionRoster::new();
        let a = AgentHandle(1);

        assert_eq!(roster.insert(a, Faction::Hero, T0), None);
        assert_eq!(roster.insert(a, Faction::Villain, T0), Some(Faction::Hero));

        assert_eq!(roster.members_of(Faction::Hero), vec![]);
        assert_eq!(roster.members_of(Faction::Villain), vec![a]);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_configuration_survives_move() {
        let mut roster = FactionRoster::new();
        let a = AgentHandle(1);

        roster.insert(a, Faction::Hero, T0);
        assert!(roster.needs_configuration(a));
        roster.mark_configured(a);

        roster.insert(a, Faction::Villain, Duration::from_secs(5));
        assert!(!roster.needs_configuration(a));
        assert_eq!(roster.get(a).unwrap().registered_at, T0);
    }

    #[test]
    fn test_unknown_agent_needs_nothing() {
        let roster = FactionRoster::new();
        assert!(!roster.needs_configuration(AgentHandle(9)));
        assert_eq!(roster.faction_of(AgentHandle(9)), None);
    }

    #[test]
    fn test_retain_counts_per_faction() {
        let mut roster = FactionRoster::new();
        for i in 0..6 {
            let faction = if i % 2 == 0 { Faction::Hero } else { Faction::Villain };
            roster.insert(AgentHandle(i), faction, T0);
        }

        let (heroes, villains) = roster.retain(|h| h.0 >= 3);

        assert_eq!((heroes, villains), (2, 1));
        assert_eq!(roster.handles(), vec![AgentHandle(3), AgentHandle(4), AgentHandle(5)]);
        assert_eq!(roster.count_of(Faction::Villain), 2);
    }
}
