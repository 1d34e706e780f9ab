//! Per-cycle combat decision loop.
//!
//! Villains act first and pick victims among the nearest unaffiliated agents
//! that are not already fighting. Heroes act second and answer threats: agents
//! that are fighting, were damaged, or are villains. Both phases share one
//! engagement budget per cycle.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};
use war_events::{AgentHandle, EventKind, Faction, FaultSite, Position, TargetKind};

use super::fallback::FaultResponse;
use super::FactionEngine;
use crate::host::{ClearOrders, HostError, HostWorld};

/// What one call to [`FactionEngine::update_combat`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatOutcome {
    /// The fallback window is open; nothing was decided.
    Paused { remaining: Duration },
    /// Skipped by the update stride.
    Throttled { remaining_skips: u32 },
    Completed(CombatReport),
}

impl CombatOutcome {
    pub fn report(&self) -> Option<&CombatReport> {
        match self {
            CombatOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn engagements(&self) -> usize {
        self.report().map_or(0, CombatReport::engagements)
    }
}

/// Tally of one completed decision cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatReport {
    pub villain_engagements: usize,
    pub hero_engagements: usize,
    /// Command failures other than invalid references
    pub faults: usize,
    /// Attackers skipped because they were already fighting
    pub skipped_engaged: usize,
    /// Attackers skipped because they engaged recently
    pub skipped_cooling: usize,
    /// Roster entries removed before deciding
    pub cleaned: usize,
    /// True if the budget ran out before every attacker was considered
    pub budget_exhausted: bool,
    /// Fallback reaction to this cycle's faults, if any
    pub fault_response: Option<FaultResponse>,
}

impl CombatReport {
    pub fn engagements(&self) -> usize {
        self.villain_engagements + self.hero_engagements
    }
}

impl FactionEngine {
    /// Runs one decision cycle if the stride and fallback window allow it.
    pub fn update_combat<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> CombatOutcome {
        let now = host.now();
        if self.fallback.is_paused(now) {
            return CombatOutcome::Paused {
                remaining: self.fallback.remaining(now),
            };
        }
        if !self.stride.ready() {
            return CombatOutcome::Throttled {
                remaining_skips: self.stride.remaining(),
            };
        }

        self.actions_this_tick = 0;
        let mut report = CombatReport {
            cleaned: self.cleanup_invalid(host).removed(),
            ..CombatReport::default()
        };

        self.run_phase(host, Faction::Villain, now, &mut report);
        self.run_phase(host, Faction::Hero, now, &mut report);

        if report.faults > 0 {
            report.fault_response = Some(self.escalate(host, now));
        } else {
            self.settle(now);
        }

        self.record(now, EventKind::CycleCompleted {
            engagements: report.engagements(),
            faults: report.faults,
        });
        if self.summary_throttle.due() {
            info!(
                "Combat cycle: {} villain and {} hero engagements, {} faults ({} heroes, {} villains)",
                report.villain_engagements,
                report.hero_engagements,
                report.faults,
                self.hero_count(),
                self.villain_count()
            );
        } else {
            debug!(
                "Combat cycle: {} engagements, {} faults, {} skipped fighting, {} cooling",
                report.engagements(),
                report.faults,
                report.skipped_engaged,
                report.skipped_cooling
            );
        }

        CombatOutcome::Completed(report)
    }

    fn run_phase<H: HostWorld + ?Sized>(
        &mut self,
        host: &mut H,
        faction: Faction,
        now: Duration,
        report: &mut CombatReport,
    ) {
        let site = match faction {
            Faction::Villain => FaultSite::VillainPhase,
            Faction::Hero => FaultSite::HeroPhase,
        };

        for attacker in self.roster.members_of(faction) {
            if self.actions_this_tick >= self.config.max_actions_per_tick {
                report.budget_exhausted = true;
                break;
            }
            if !host.is_alive(attacker) {
                continue;
            }
            if host.is_in_combat(attacker) {
                report.skipped_engaged += 1;
                continue;
            }
            if self.cooldowns.is_cooling(attacker, now) {
                report.skipped_cooling += 1;
                continue;
            }

            match self.try_engage(host, attacker, faction) {
                Ok(Some((target, target_kind))) => {
                    self.actions_this_tick += 1;
                    self.cooldowns.record(attacker, now);
                    match faction {
                        Faction::Villain => report.villain_engagements += 1,
                        Faction::Hero => report.hero_engagements += 1,
                    }
                    debug!("{} {} engaged {} ({:?})", faction, attacker, target, target_kind);
                    self.record(now, EventKind::Engaged {
                        attacker,
                        attacker_faction: faction,
                        target,
                        target_kind,
                    });
                }
                Ok(None) => {}
                Err(e) if e.is_invalid_reference() => {
                    debug!("Skipped {}: {}", attacker, e);
                }
                Err(e) => {
                    report.faults += 1;
                    warn!("{} phase fault for {}: {}", faction, attacker, e);
                    self.record(now, EventKind::Fault {
                        site,
                        agent: Some(attacker),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Picks a target for `attacker` and issues the engagement. The target is
    /// classified as it was when picked.
    fn try_engage<H: HostWorld + ?Sized>(
        &mut self,
        host: &mut H,
        attacker: AgentHandle,
        faction: Faction,
    ) -> Result<Option<(AgentHandle, TargetKind)>, HostError> {
        let origin = host.position(attacker)?;
        let candidates = self.nearest_targets(&*host, attacker, faction, origin)?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let target = candidates[self.rng.gen_range(0..candidates.len())];
        let kind = self.classify(&*host, target);
        host.clear_orders(attacker, ClearOrders::Immediately)?;
        host.engage(attacker, target)?;
        Ok(Some((target, kind)))
    }

    /// Eligible targets for `attacker`, nearest first, at most `candidate_pool`.
    pub fn nearest_targets<H: HostWorld + ?Sized>(
        &self,
        host: &H,
        attacker: AgentHandle,
        faction: Faction,
        origin: Position,
    ) -> Result<Vec<AgentHandle>, HostError> {
        let radius = match faction {
            Faction::Villain => self.config.scan_radius,
            Faction::Hero => self.config.hero_detection_radius,
        };

        let mut nearby = host.nearby_agents(origin, radius)?;
        nearby.sort_unstable();
        nearby.dedup();

        let mut scored: Vec<(f32, AgentHandle)> = nearby
            .into_iter()
            .filter(|&candidate| candidate != attacker && self.is_eligible(host, faction, candidate))
            .filter_map(|candidate| {
                let distance = origin.distance_squared(&host.position(candidate).ok()?);
                (distance <= radius * radius).then_some((distance, candidate))
            })
            .collect();

        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(self.config.candidate_pool);
        Ok(scored.into_iter().map(|(_, handle)| handle).collect())
    }

    fn is_eligible<H: HostWorld + ?Sized>(&self, host: &H, faction: Faction, candidate: AgentHandle) -> bool {
        if !host.is_valid(candidate) || self.roster.is_member_of(candidate, faction) {
            return false;
        }
        match faction {
            Faction::Villain => !host.is_in_combat(candidate),
            Faction::Hero => {
                host.is_in_combat(candidate)
                    || host.was_damaged(candidate)
                    || self.roster.is_member_of(candidate, Faction::Villain)
            }
        }
    }

    fn classify<H: HostWorld + ?Sized>(&self, host: &H, target: AgentHandle) -> TargetKind {
        match self.roster.faction_of(target) {
            Some(Faction::Hero) => TargetKind::Hero,
            Some(Faction::Villain) => TargetKind::Villain,
            None if host.is_in_combat(target) => TargetKind::Combatant,
            None if host.was_damaged(target) => TargetKind::Aggressor,
            None => TargetKind::Bystander,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarConfig;
    use crate::sandbox::SandboxWorld;

    fn config(stride: u32, budget: usize) -> WarConfig {
        let mut config = WarConfig::default();
        config.engine.update_stride = stride;
        config.engine.max_actions_per_tick = budget;
        config
    }

    #[test]
    fn test_stride_throttles_updates() {
        let mut world = SandboxWorld::new();
        let mut engine = FactionEngine::with_seed(&config(3, 30), 3);

        assert!(matches!(engine.update_combat(&mut world), CombatOutcome::Completed(_)));
        for expected in [2, 1, 0] {
            assert_eq!(
                engine.update_combat(&mut world),
                CombatOutcome::Throttled { remaining_skips: expected }
            );
        }
        assert!(matches!(engine.update_combat(&mut world), CombatOutcome::Completed(_)));
    }

    #[test]
    fn test_villain_targets_nearest_bystanders() {
        let mut world = SandboxWorld::new();
        let villain = world.spawn_agent(Position::new(0.0, 0.0, 0.0), 0x1);
        let near: Vec<_> = (1..=3)
            .map(|i| world.spawn_agent(Position::new(i as f32 * 2.0, 0.0, 0.0), 0x9))
            .collect();
        let far = world.spawn_agent(Position::new(50.0, 0.0, 0.0), 0x9);
        let outside = world.spawn_agent(Position::new(150.0, 0.0, 0.0), 0x9);
        let mut engine = FactionEngine::with_seed(&config(0, 30), 3);
        engine.register_as(&mut world, villain, Faction::Villain).unwrap();

        let targets = engine
            .nearest_targets(&world, villain, Faction::Villain, Position::new(0.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(targets, near);
        assert!(!targets.contains(&far));
        assert!(!targets.contains(&outside));
    }

    #[test]
    fn test_hero_ignores_calm_bystanders() {
        let mut world = SandboxWorld::new();
        let hero = world.spawn_agent(Position::new(0.0, 0.0, 0.0), 0x1);
        let calm = world.spawn_agent(Position::new(1.0, 0.0, 0.0), 0x9);
        let fighting = world.spawn_agent(Position::new(2.0, 0.0, 0.0), 0x9);
        let villain = world.spawn_agent(Position::new(3.0, 0.0, 0.0), 0x2);
        world.spawn_player(Position::new(0.5, 0.0, 0.0));
        world.set_in_combat(fighting, true);

        let mut engine = FactionEngine::with_seed(&config(0, 30), 3);
        engine.register_as(&mut world, hero, Faction::Hero).unwrap();
        engine.register_as(&mut world, villain, Faction::Villain).unwrap();

        let targets = engine
            .nearest_targets(&world, hero, Faction::Hero, Position::new(0.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(targets, vec![fighting, villain]);
        assert!(!targets.contains(&calm));
    }

    #[test]
    fn test_hero_answers_damaged_bystander() {
        let mut world = SandboxWorld::new();
        let hero = world.spawn_agent(Position::new(0.0, 0.0, 0.0), 0x1);
        let hurt = world.spawn_agent(Position::new(2.0, 0.0, 0.0), 0x9);
        world.spawn_agent(Position::new(1.0, 0.0, 0.0), 0x9);
        world.set_damaged(hurt, true);
        let mut engine = FactionEngine::with_seed(&config(0, 30), 3);
        engine.register_as(&mut world, hero, Faction::Hero).unwrap();
        engine.drain_events();

        let outcome = engine.update_combat(&mut world);

        assert_eq!(outcome.report().unwrap().hero_engagements, 1);
        assert_eq!(world.engagements(), vec![(hero, hurt)]);
        let kinds: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter_map(|event| match event.kind {
                EventKind::Engaged { target, target_kind, .. } => Some((target, target_kind)),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![(hurt, TargetKind::Aggressor)]);
    }

    #[test]
    fn test_engagement_starts_cooldown() {
        let mut world = SandboxWorld::new();
        let villain = world.spawn_agent(Position::new(0.0, 0.0, 0.0), 0x1);
        let victim = world.spawn_agent(Position::new(3.0, 0.0, 0.0), 0x9);
        let mut engine = FactionEngine::with_seed(&config(0, 30), 3);
        engine.register_as(&mut world, villain, Faction::Villain).unwrap();

        let first = engine.update_combat(&mut world);
        assert_eq!(first.engagements(), 1);
        assert!(engine.last_engaged(villain).is_some());

        world.set_in_combat(villain, false);
        world.set_in_combat(victim, false);
        world.advance(Duration::from_secs(10));
        let second = engine.update_combat(&mut world);
        assert_eq!(second.report().unwrap().skipped_cooling, 1);

        world.advance(Duration::from_secs(60));
        assert_eq!(engine.update_combat(&mut world).engagements(), 1);
    }

    #[test]
    fn test_command_fault_is_counted_not_fatal() {
        let mut world = SandboxWorld::new();
        let villains: Vec<_> = (0..2)
            .map(|i| world.spawn_agent(Position::new(i as f32, 0.0, 0.0), 0x1))
            .collect();
        world.spawn_agent(Position::new(5.0, 0.0, 0.0), 0x9);
        let mut engine = FactionEngine::with_seed(&config(0, 30), 3);
        for &v in &villains {
            engine.register_as(&mut world, v, Faction::Villain).unwrap();
        }
        world.fail_command("engage");

        let outcome = engine.update_combat(&mut world);
        let report = outcome.report().unwrap();

        assert_eq!(report.faults, 2);
        assert_eq!(report.engagements(), 0);
        assert_eq!(report.fault_response, Some(FaultResponse::Counted { consecutive: 1 }));
        assert_eq!(engine.consecutive_faults(), 1);
    }
}
