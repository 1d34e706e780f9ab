//! Host World Interface
//!
//! The engine never owns agents. Everything it knows about an agent comes
//! from these queries, and everything it does is one of these commands.
//! Commands are fire-and-forget: a failure surfaces as a [`HostError`], never
//! as a panic.

use std::time::Duration;
use thiserror::Error;
use war_events::{AgentHandle, CombatAttribute, Position, RelationGroup, Stance};

/// A failed host query or command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The handle no longer resolves to an agent.
    #[error("{0} no longer exists")]
    InvalidHandle(AgentHandle),
    /// The host refused or failed to carry out a command.
    #[error("{command} rejected for {agent}: {reason}")]
    CommandRejected {
        agent: AgentHandle,
        command: &'static str,
        reason: String,
    },
    /// A world-wide operation failed.
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Invalid references are skipped, never counted as faults.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, HostError::InvalidHandle(_))
    }
}

/// How pending orders are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOrders {
    /// Let the current animation finish.
    Gracefully,
    /// Drop everything this frame.
    Immediately,
}

/// The live world the engine orchestrates.
pub trait HostWorld {
    // --- Queries ---

    /// Host time since the world started.
    fn now(&self) -> Duration;

    fn exists(&self, agent: AgentHandle) -> bool;

    fn is_dead(&self, agent: AgentHandle) -> bool;

    /// True for the agent the human player controls.
    fn is_player(&self, agent: AgentHandle) -> bool;

    fn player(&self) -> Option<AgentHandle>;

    fn is_ragdoll(&self, agent: AgentHandle) -> bool;

    fn is_in_combat(&self, agent: AgentHandle) -> bool;

    /// True if any agent has damaged this one.
    fn was_damaged(&self, agent: AgentHandle) -> bool;

    fn position(&self, agent: AgentHandle) -> Result<Position, HostError>;

    fn model_hash(&self, agent: AgentHandle) -> Result<u32, HostError>;

    /// Agents within `radius` of `center`, in no particular order.
    fn nearby_agents(&self, center: Position, radius: f32) -> Result<Vec<AgentHandle>, HostError>;

    // --- Commands ---

    fn apply_attribute(
        &mut self,
        agent: AgentHandle,
        attribute: &CombatAttribute,
    ) -> Result<(), HostError>;

    fn set_relationship(
        &mut self,
        from: RelationGroup,
        to: RelationGroup,
        stance: Stance,
    ) -> Result<(), HostError>;

    fn clear_orders(&mut self, agent: AgentHandle, mode: ClearOrders) -> Result<(), HostError>;

    /// Orders `attacker` to fight `target`.
    fn engage(&mut self, attacker: AgentHandle, target: AgentHandle) -> Result<(), HostError>;

    /// Removes the agent from the world.
    fn destroy(&mut self, agent: AgentHandle) -> Result<(), HostError>;

    /// Hands the agent back to the host's own population management.
    fn release(&mut self, agent: AgentHandle) -> Result<(), HostError>;

    /// Shows a short message to the user.
    fn notify(&mut self, message: &str);

    // --- Derived checks ---

    /// Exists, alive, and not the player.
    fn is_valid(&self, agent: AgentHandle) -> bool {
        self.exists(agent) && !self.is_dead(agent) && !self.is_player(agent)
    }

    /// Valid and on its feet.
    fn is_alive(&self, agent: AgentHandle) -> bool {
        self.is_valid(agent) && !self.is_ragdoll(agent)
    }
}
