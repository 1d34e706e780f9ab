//! Sandbox Host World
//!
//! An in-process [`HostWorld`] backed by a `bevy_ecs` world. Agents are
//! entities; a handle is the entity's bit pattern, so a handle kept past a
//! despawn stops resolving even if the index is reused.
//!
//! Every successful command is appended to a journal. Commands can be made
//! to fail by name to exercise the engine's fault handling.

pub mod components;

use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use war_events::{AgentHandle, CombatAttribute, Position, RelationGroup, Stance};

use crate::host::{ClearOrders, HostError, HostWorld};
use components::{Agent, CombatState, Location, Model, Player, Relationships, SandboxClock, Vitals};

/// Health lost per second by an agent under attack
const DAMAGE_PER_SECOND: f32 = 25.0;

/// A command the sandbox carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxCommand {
    ApplyAttribute {
        agent: AgentHandle,
        attribute: CombatAttribute,
    },
    SetRelationship {
        from: RelationGroup,
        to: RelationGroup,
        stance: Stance,
    },
    ClearOrders {
        agent: AgentHandle,
        mode: ClearOrders,
    },
    Engage {
        attacker: AgentHandle,
        target: AgentHandle,
    },
    Destroy {
        agent: AgentHandle,
    },
    Release {
        agent: AgentHandle,
    },
}

/// ECS-backed host world
pub struct SandboxWorld {
    world: World,
    player: Option<Entity>,
    journal: Vec<SandboxCommand>,
    failing: HashSet<&'static str>,
    notifications: Vec<String>,
    unavailable: bool,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(SandboxClock::default());
        world.insert_resource(Relationships::default());
        Self {
            world,
            player: None,
            journal: Vec::new(),
            failing: HashSet::new(),
            notifications: Vec::new(),
            unavailable: false,
        }
    }

    // --- Population ---

    /// Spawns an unaffiliated agent.
    pub fn spawn_agent(&mut self, position: Position, model_hash: u32) -> AgentHandle {
        let entity = self
            .world
            .spawn((
                Agent,
                Location(position),
                Model(model_hash),
                Vitals::default(),
                CombatState::default(),
            ))
            .id();
        AgentHandle(entity.to_bits())
    }

    /// Spawns the player, replacing any previous one.
    pub fn spawn_player(&mut self, position: Position) -> AgentHandle {
        if let Some(old) = self.player.take() {
            self.world.despawn(old);
        }
        let entity = self
            .world
            .spawn((
                Agent,
                Player,
                Location(position),
                Model(0),
                Vitals::default(),
                CombatState::default(),
            ))
            .id();
        self.player = Some(entity);
        AgentHandle(entity.to_bits())
    }

    /// Scatters `count` agents within `radius` of `center`, cycling through
    /// `models`.
    pub fn populate(
        &mut self,
        rng: &mut impl Rng,
        center: Position,
        radius: f32,
        count: usize,
        models: &[u32],
    ) -> Vec<AgentHandle> {
        (0..count)
            .map(|i| {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let distance = rng.gen_range(0.0..radius.max(f32::EPSILON));
                let position = Position::new(
                    center.x + distance * angle.cos(),
                    center.y + distance * angle.sin(),
                    center.z,
                );
                let model = models.get(i % models.len().max(1)).copied().unwrap_or(0);
                self.spawn_agent(position, model)
            })
            .collect()
    }

    /// Removes an agent without a command, as if the host unloaded it.
    pub fn vanish(&mut self, agent: AgentHandle) -> bool {
        self.resolve(agent).map_or(false, |e| self.world.despawn(e))
    }

    pub fn agent_count(&self) -> usize {
        self.world
            .iter_entities()
            .filter(|e| e.contains::<Agent>() && !e.contains::<Player>())
            .count()
    }

    // --- Direct state changes ---

    pub fn kill(&mut self, agent: AgentHandle) {
        self.with_vitals(agent, |v| v.health = 0.0);
        self.with_combat(agent, |c| {
            c.in_combat = false;
            c.target = None;
        });
    }

    pub fn set_ragdoll(&mut self, agent: AgentHandle, ragdoll: bool) {
        self.with_vitals(agent, |v| v.ragdoll = ragdoll);
    }

    pub fn set_in_combat(&mut self, agent: AgentHandle, in_combat: bool) {
        self.with_combat(agent, |c| {
            c.in_combat = in_combat;
            if !in_combat {
                c.target = None;
            }
        });
    }

    pub fn set_damaged(&mut self, agent: AgentHandle, damaged: bool) {
        self.with_combat(agent, |c| c.damaged = damaged);
    }

    pub fn move_agent(&mut self, agent: AgentHandle, position: Position) {
        if let Some(mut location) = self.resolve(agent).and_then(|e| self.world.get_mut::<Location>(e)) {
            location.0 = position;
        }
    }

    pub fn health(&self, agent: AgentHandle) -> Option<f32> {
        self.component::<Vitals>(agent).map(|v| v.health)
    }

    pub fn target_of(&self, agent: AgentHandle) -> Option<AgentHandle> {
        self.component::<CombatState>(agent)
            .and_then(|c| c.target)
            .map(|e| AgentHandle(e.to_bits()))
    }

    pub fn stance(&self, from: RelationGroup, to: RelationGroup) -> Option<Stance> {
        self.world.resource::<Relationships>().stance(from, to)
    }

    // --- Time ---

    /// Moves the clock without simulating anything.
    pub fn advance(&mut self, dt: Duration) {
        self.world.resource_mut::<SandboxClock>().now += dt;
    }

    /// Moves the clock and resolves fights: every attacker damages its
    /// target, and fights end when the target dies or disappears.
    pub fn step(&mut self, dt: Duration) {
        self.advance(dt);
        let damage = DAMAGE_PER_SECOND * dt.as_secs_f32();

        let mut query = self.world.query::<(Entity, &CombatState)>();
        let fights: Vec<(Entity, Entity)> = query
            .iter(&self.world)
            .filter_map(|(attacker, combat)| combat.target.map(|target| (attacker, target)))
            .collect();

        for (attacker, target) in fights {
            let attacker_alive = self.world.get::<Vitals>(attacker).map_or(false, |v| !v.is_dead());
            let target_alive = self.world.get::<Vitals>(target).map_or(false, |v| !v.is_dead());

            if attacker_alive && target_alive {
                if let Some(mut vitals) = self.world.get_mut::<Vitals>(target) {
                    vitals.take_damage(damage);
                }
                if let Some(mut combat) = self.world.get_mut::<CombatState>(target) {
                    combat.damaged = true;
                    combat.in_combat = true;
                }
            }

            let fight_over = !attacker_alive
                || self.world.get::<Vitals>(target).map_or(true, |v| v.is_dead());
            if fight_over {
                if let Some(mut combat) = self.world.get_mut::<CombatState>(attacker) {
                    combat.in_combat = false;
                    combat.target = None;
                }
            }
        }
    }

    // --- Journal and failure injection ---

    pub fn journal(&self) -> &[SandboxCommand] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<SandboxCommand> {
        std::mem::take(&mut self.journal)
    }

    /// Engagements issued so far, in order.
    pub fn engagements(&self) -> Vec<(AgentHandle, AgentHandle)> {
        self.journal
            .iter()
            .filter_map(|c| match *c {
                SandboxCommand::Engage { attacker, target } => Some((attacker, target)),
                _ => None,
            })
            .collect()
    }

    /// Attribute commands applied to `agent`.
    pub fn attribute_count(&self, agent: AgentHandle) -> usize {
        self.journal
            .iter()
            .filter(|c| matches!(c, SandboxCommand::ApplyAttribute { agent: a, .. } if *a == agent))
            .count()
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    /// Makes every later call of the named command fail.
    pub fn fail_command(&mut self, command: &'static str) {
        self.failing.insert(command);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
        self.unavailable = false;
    }

    /// Makes area queries fail.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    // --- Internals ---

    fn resolve(&self, agent: AgentHandle) -> Option<Entity> {
        let entity = Entity::try_from_bits(agent.raw()).ok()?;
        self.world.get_entity(entity).map(|e| e.id())
    }

    fn component<T: Component>(&self, agent: AgentHandle) -> Option<&T> {
        self.resolve(agent).and_then(|e| self.world.get::<T>(e))
    }

    fn with_vitals(&mut self, agent: AgentHandle, f: impl FnOnce(&mut Vitals)) {
        if let Some(mut vitals) = self.resolve(agent).and_then(|e| self.world.get_mut::<Vitals>(e)) {
            f(&mut *vitals);
        }
    }

    fn with_combat(&mut self, agent: AgentHandle, f: impl FnOnce(&mut CombatState)) {
        if let Some(mut combat) = self.resolve(agent).and_then(|e| self.world.get_mut::<CombatState>(e)) {
            f(&mut *combat);
        }
    }

    /// Resolves `agent` for `command`, honoring injected failures.
    fn command_target(&self, agent: AgentHandle, command: &'static str) -> Result<Entity, HostError> {
        let entity = self.resolve(agent).ok_or(HostError::InvalidHandle(agent))?;
        if self.failing.contains(command) {
            return Err(HostError::CommandRejected {
                agent,
                command,
                reason: "injected failure".to_string(),
            });
        }
        Ok(entity)
    }

    fn apply_to_vitals(vitals: &mut Vitals, attribute: &CombatAttribute) {
        match *attribute {
            CombatAttribute::MaxHealth(max) => vitals.max_health = max as f32,
            CombatAttribute::RestoreHealth => vitals.health = vitals.max_health,
            CombatAttribute::Armor(armor) => vitals.armor = armor as f32,
            CombatAttribute::CanRagdoll(can) => vitals.can_ragdoll = can,
            _ => {}
        }
    }
}

impl HostWorld for SandboxWorld {
    fn now(&self) -> Duration {
        self.world.resource::<SandboxClock>().now
    }

    fn exists(&self, agent: AgentHandle) -> bool {
        self.resolve(agent).is_some()
    }

    fn is_dead(&self, agent: AgentHandle) -> bool {
        self.component::<Vitals>(agent).map_or(false, Vitals::is_dead)
    }

    fn is_player(&self, agent: AgentHandle) -> bool {
        self.component::<Player>(agent).is_some()
    }

    fn player(&self) -> Option<AgentHandle> {
        self.player
            .filter(|&e| self.world.get_entity(e).is_some())
            .map(|e| AgentHandle(e.to_bits()))
    }

    fn is_ragdoll(&self, agent: AgentHandle) -> bool {
        self.component::<Vitals>(agent)
            .map_or(false, |v| v.ragdoll && v.can_ragdoll)
    }

    fn is_in_combat(&self, agent: AgentHandle) -> bool {
        self.component::<CombatState>(agent).map_or(false, |c| c.in_combat)
    }

    fn was_damaged(&self, agent: AgentHandle) -> bool {
        self.component::<CombatState>(agent).map_or(false, |c| c.damaged)
    }

    fn position(&self, agent: AgentHandle) -> Result<Position, HostError> {
        self.component::<Location>(agent)
            .map(|l| l.0)
            .ok_or(HostError::InvalidHandle(agent))
    }

    fn model_hash(&self, agent: AgentHandle) -> Result<u32, HostError> {
        self.component::<Model>(agent)
            .map(|m| m.0)
            .ok_or(HostError::InvalidHandle(agent))
    }

    fn nearby_agents(&self, center: Position, radius: f32) -> Result<Vec<AgentHandle>, HostError> {
        if self.unavailable {
            return Err(HostError::Unavailable("area query failed".to_string()));
        }
        let radius_sq = radius * radius;
        Ok(self
            .world
            .iter_entities()
            .filter(|e| e.contains::<Agent>())
            .filter_map(|e| {
                let location = e.get::<Location>()?;
                (center.distance_squared(&location.0) <= radius_sq).then(|| AgentHandle(e.id().to_bits()))
            })
            .collect())
    }

    fn apply_attribute(&mut self, agent: AgentHandle, attribute: &CombatAttribute) -> Result<(), HostError> {
        let entity = self.command_target(agent, "apply_attribute")?;
        if let Some(mut vitals) = self.world.get_mut::<Vitals>(entity) {
            Self::apply_to_vitals(&mut *vitals, attribute);
        }
        self.journal.push(SandboxCommand::ApplyAttribute {
            agent,
            attribute: attribute.clone(),
        });
        Ok(())
    }

    fn set_relationship(&mut self, from: RelationGroup, to: RelationGroup, stance: Stance) -> Result<(), HostError> {
        if self.failing.contains("set_relationship") {
            return Err(HostError::Unavailable(format!(
                "cannot set {} -> {}",
                from.name(),
                to.name()
            )));
        }
        self.world
            .resource_mut::<Relationships>()
            .stances
            .insert((from, to), stance);
        self.journal.push(SandboxCommand::SetRelationship { from, to, stance });
        Ok(())
    }

    fn clear_orders(&mut self, agent: AgentHandle, mode: ClearOrders) -> Result<(), HostError> {
        let entity = self.command_target(agent, "clear_orders")?;
        if let Some(mut combat) = self.world.get_mut::<CombatState>(entity) {
            combat.in_combat = false;
            combat.target = None;
        }
        self.journal.push(SandboxCommand::ClearOrders { agent, mode });
        Ok(())
    }

    fn engage(&mut self, attacker: AgentHandle, target: AgentHandle) -> Result<(), HostError> {
        let attacker_entity = self.command_target(attacker, "engage")?;
        let target_entity = self.resolve(target).ok_or(HostError::InvalidHandle(target))?;

        if let Some(mut combat) = self.world.get_mut::<CombatState>(attacker_entity) {
            combat.in_combat = true;
            combat.target = Some(target_entity);
        }
        if let Some(mut combat) = self.world.get_mut::<CombatState>(target_entity) {
            combat.in_combat = true;
        }
        self.journal.push(SandboxCommand::Engage { attacker, target });
        Ok(())
    }

    fn destroy(&mut self, agent: AgentHandle) -> Result<(), HostError> {
        let entity = self.command_target(agent, "destroy")?;
        self.world.despawn(entity);
        self.journal.push(SandboxCommand::Destroy { agent });
        Ok(())
    }

    /// The sandbox has no population manager of its own; released agents are
    /// removed.
    fn release(&mut self, agent: AgentHandle) -> Result<(), HostError> {
        let entity = self.command_target(agent, "release")?;
        self.world.despawn(entity);
        self.journal.push(SandboxCommand::Release { agent });
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        tracing::info!("[notify] {}", message);
        self.notifications.push(message.to_string());
    }
}
