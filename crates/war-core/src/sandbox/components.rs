//! Sandbox Components
//!
//! ECS components and resources backing the sandbox world.

use bevy_ecs::prelude::*;
use std::collections::HashMap;
use std::time::Duration;
use war_events::{Position, RelationGroup, Stance};

/// Marker for every agent in the sandbox, the player included
#[derive(Component, Debug, Clone, Default)]
pub struct Agent;

/// Marker for the agent the player controls
#[derive(Component, Debug, Clone, Default)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Location(pub Position);

/// Model hash the catalog is keyed by
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model(pub u32);

#[derive(Component, Debug, Clone)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub armor: f32,
    pub ragdoll: bool,
    /// Cleared by the `CanRagdoll(false)` attribute
    pub can_ragdoll: bool,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: 200.0,
            max_health: 200.0,
            armor: 0.0,
            ragdoll: false,
            can_ragdoll: true,
        }
    }
}

impl Vitals {
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Armor absorbs damage first.
    pub fn take_damage(&mut self, amount: f32) {
        let absorbed = amount.min(self.armor);
        self.armor -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct CombatState {
    pub in_combat: bool,
    pub target: Option<Entity>,
    /// Set once anything has hurt this agent
    pub damaged: bool,
}

/// Host time of the sandbox
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SandboxClock {
    pub now: Duration,
}

/// Stances set between relationship groups
#[derive(Resource, Debug, Clone, Default)]
pub struct Relationships {
    pub stances: HashMap<(RelationGroup, RelationGroup), Stance>,
}

impl Relationships {
    pub fn stance(&self, from: RelationGroup, to: RelationGroup) -> Option<Stance> {
        self.stances.get(&(from, to)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_absorbs_first() {
        let mut vitals = Vitals {
            armor: 30.0,
            ..Vitals::default()
        };

        vitals.take_damage(50.0);

        assert_eq!(vitals.armor, 0.0);
        assert_eq!(vitals.health, 180.0);
        assert!(!vitals.is_dead());
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut vitals = Vitals::default();
        vitals.take_damage(1000.0);
        assert!(vitals.is_dead());
        assert_eq!(vitals.health, 0.0);
    }
}
