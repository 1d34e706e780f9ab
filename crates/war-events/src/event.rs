//! Engine events
//!
//! Everything the engine decides is recorded as an event. Events are drained
//! by the process loop and appended to the diagnostic log.

use serde::{Deserialize, Serialize};

use crate::agent::AgentHandle;
use crate::faction::Faction;

/// Where a recoverable fault was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultSite {
    Configuration,
    VillainPhase,
    HeroPhase,
    Relationships,
    Teardown,
    Reported,
}

/// How the attacker's target was classified at engagement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Hero,
    Villain,
    /// Unaffiliated and not fighting.
    Bystander,
    /// Unaffiliated and already fighting.
    Combatant,
    /// Unaffiliated, not fighting, but recently damaged someone.
    Aggressor,
}

/// The payload of an engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Registered {
        agent: AgentHandle,
        faction: Faction,
        previous: Option<Faction>,
    },
    Configured {
        agent: AgentHandle,
        faction: Faction,
        commands: usize,
    },
    Engaged {
        attacker: AgentHandle,
        attacker_faction: Faction,
        target: AgentHandle,
        target_kind: TargetKind,
    },
    CleanedUp {
        heroes: usize,
        villains: usize,
    },
    CycleCompleted {
        engagements: usize,
        faults: usize,
    },
    Fault {
        site: FaultSite,
        agent: Option<AgentHandle>,
        message: String,
    },
    FallbackEntered {
        consecutive_faults: u32,
    },
    FallbackCleared,
    WarActivated,
    WarDeactivated {
        destroyed: usize,
    },
}

/// A timestamped engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Host time in milliseconds when the event was recorded.
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn new(at_ms: u64, kind: EventKind) -> Self {
        Self { at_ms, kind }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self.kind, EventKind::Fault { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = EngineEvent::new(
            2500,
            EventKind::Engaged {
                attacker: AgentHandle(1),
                attacker_faction: Faction::Villain,
                target: AgentHandle(2),
                target_kind: TargetKind::Bystander,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "engaged");
        assert_eq!(json["at_ms"], 2500);
        assert_eq!(json["attacker"], 1);
        assert_eq!(json["target_kind"], "bystander");

        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_is_fault() {
        let fault = EngineEvent::new(
            0,
            EventKind::Fault {
                site: FaultSite::HeroPhase,
                agent: None,
                message: "boom".into(),
            },
        );
        assert!(fault.is_fault());
        assert!(!EngineEvent::new(0, EventKind::FallbackCleared).is_fault());
    }
}
