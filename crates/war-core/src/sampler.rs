//! World Sampler
//!
//! Periodically scans the area around the player, registers agents whose
//! model is in the catalog, disposes of dead agents, and hands distant
//! unaffiliated agents back to the host to keep the population bounded.

use catalog::Catalog;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use war_events::{AgentHandle, Position};

use crate::config::SamplerConfig;
use crate::engine::{FactionEngine, RegisterError};
use crate::host::{HostError, HostWorld};

/// Why a scan did not look at the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSkip {
    NoPlayer,
    PopulationCap { registered: usize },
}

/// What one sampler tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Not due yet.
    Waiting { remaining: u32 },
    Skipped(ScanSkip),
    Scanned(ScanReport),
}

/// Tally of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidates considered, nearest first
    pub candidates: usize,
    pub registered: usize,
    /// Candidates that were already members
    pub already_registered: usize,
    /// Candidates whose model is not in the catalog
    pub unknown_models: usize,
    /// Candidates the engine refused
    pub rejected: usize,
    /// Registered, but combat configuration stopped partway
    pub misconfigured: usize,
    pub dead_destroyed: usize,
    pub dead_released: usize,
    /// Distant agents handed back to the host
    pub released: usize,
    /// True if the population cap stopped the scan early
    pub capped: bool,
}

/// Scans the world on a fixed cadence
pub struct WorldSampler {
    config: SamplerConfig,
    countdown: u32,
    seen_unknown: HashSet<u32>,
    rng: SmallRng,
}

impl WorldSampler {
    pub fn new(config: SamplerConfig, rng: SmallRng) -> Self {
        Self {
            config,
            countdown: 0,
            seen_unknown: HashSet::new(),
            rng,
        }
    }

    /// Makes the next tick scan.
    pub fn reset_cooldown(&mut self) {
        self.countdown = 0;
    }

    /// Model hashes seen in the world but missing from the catalog.
    pub fn unknown_models(&self) -> &HashSet<u32> {
        &self.seen_unknown
    }

    /// Scans if due, otherwise counts down.
    pub fn tick<H: HostWorld + ?Sized>(
        &mut self,
        engine: &mut FactionEngine,
        host: &mut H,
        catalog: &Catalog,
    ) -> Result<SampleOutcome, HostError> {
        if self.countdown > 0 {
            self.countdown -= 1;
            return Ok(SampleOutcome::Waiting {
                remaining: self.countdown,
            });
        }
        self.countdown = self.config.scan_interval;
        self.scan(engine, host, catalog)
    }

    /// Runs one scan immediately.
    pub fn scan<H: HostWorld + ?Sized>(
        &mut self,
        engine: &mut FactionEngine,
        host: &mut H,
        catalog: &Catalog,
    ) -> Result<SampleOutcome, HostError> {
        let Some(player) = host.player() else {
            return Ok(SampleOutcome::Skipped(ScanSkip::NoPlayer));
        };
        let registered = engine.total_count();
        if registered >= self.config.max_total_agents {
            info!("Population cap reached ({} agents)", registered);
            return Ok(SampleOutcome::Skipped(ScanSkip::PopulationCap { registered }));
        }

        let origin = host.position(player)?;
        let candidates = self.ranked_candidates(&*host, origin)?;
        let mut report = ScanReport {
            candidates: candidates.len(),
            ..ScanReport::default()
        };
        if candidates.is_empty() {
            return Ok(SampleOutcome::Scanned(report));
        }
        debug!("Scanning {} agents near the player", candidates.len());

        for agent in candidates {
            if !host.exists(agent) {
                continue;
            }
            if host.is_dead(agent) {
                self.dispose_dead(host, agent, &mut report);
                continue;
            }
            if engine.faction_of(agent).is_some() {
                report.already_registered += 1;
                continue;
            }
            if engine.total_count() >= self.config.max_total_agents {
                report.capped = true;
                continue;
            }
            self.register(engine, host, catalog, agent, &mut report);
        }

        if report.registered > 0 || report.rejected > 0 {
            info!(
                "Scan complete: {} registered of {} candidates",
                report.registered, report.candidates
            );
        }

        if engine.total_count() < self.config.max_total_agents {
            report.released = self.release_distant(engine, host, origin)?;
        }

        Ok(SampleOutcome::Scanned(report))
    }

    /// Agents near `origin` other than the player, nearest first.
    fn ranked_candidates<H: HostWorld + ?Sized>(
        &self,
        host: &H,
        origin: Position,
    ) -> Result<Vec<AgentHandle>, HostError> {
        let mut nearby = host.nearby_agents(origin, self.config.scan_radius)?;
        nearby.sort_unstable();
        nearby.dedup();

        let mut ranked: Vec<(f32, AgentHandle)> = nearby
            .into_iter()
            .filter(|&a| host.exists(a) && !host.is_player(a))
            .filter_map(|a| {
                let distance = origin.distance_to(&host.position(a).ok()?);
                Some((1.0 / (1.0 + distance), a))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.truncate(self.config.max_per_scan);
        Ok(ranked.into_iter().map(|(_, a)| a).collect())
    }

    fn register<H: HostWorld + ?Sized>(
        &mut self,
        engine: &mut FactionEngine,
        host: &mut H,
        catalog: &Catalog,
        agent: AgentHandle,
        report: &mut ScanReport,
    ) {
        let hash = match host.model_hash(agent) {
            Ok(hash) => hash,
            Err(e) => {
                debug!("Skipped {}: {}", agent, e);
                return;
            }
        };
        let Some(record) = catalog.lookup(hash) else {
            report.unknown_models += 1;
            if self.seen_unknown.insert(hash) {
                info!("Model 0x{:08X} is not in the catalog", hash);
            }
            return;
        };

        match engine.register(host, agent, &record.faction) {
            Ok(registration) => {
                report.registered += 1;
                debug!(
                    "{} registered as {} ({})",
                    record.name, registration.faction, record.power_type
                );
            }
            Err(RegisterError::Configuration { faction, source, .. }) => {
                report.registered += 1;
                report.misconfigured += 1;
                warn!("{} joined {} but was not fully configured: {}", record.name, faction, source);
            }
            Err(e) => {
                report.rejected += 1;
                warn!("Registration of {} failed: {}", record.name, e);
            }
        }
    }

    fn dispose_dead<H: HostWorld + ?Sized>(&mut self, host: &mut H, agent: AgentHandle, report: &mut ScanReport) {
        let result = if self.rng.gen_bool(self.config.dead_delete_chance) {
            host.destroy(agent).map(|()| report.dead_destroyed += 1)
        } else {
            host.release(agent).map(|()| report.dead_released += 1)
        };
        if let Err(e) = result {
            debug!("Could not dispose of dead {}: {}", agent, e);
        }
    }

    /// Releases some of the farthest unaffiliated agents just beyond the scan
    /// radius.
    fn release_distant<H: HostWorld + ?Sized>(
        &mut self,
        engine: &FactionEngine,
        host: &mut H,
        origin: Position,
    ) -> Result<usize, HostError> {
        let inner_sq = self.config.scan_radius * self.config.scan_radius;
        let radius = self.config.scan_radius + self.config.cull_ring_margin;
        let mut distant: Vec<(f32, AgentHandle)> = host
            .nearby_agents(origin, radius)?
            .into_iter()
            .filter(|&a| host.exists(a) && !host.is_player(a) && engine.faction_of(a).is_none())
            .filter_map(|a| Some((origin.distance_squared(&host.position(a).ok()?), a)))
            .filter(|&(distance_sq, _)| distance_sq > inner_sq)
            .collect();
        distant.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        distant.dedup_by_key(|(_, a)| *a);
        distant.truncate(self.config.cull_batch);

        let mut released = 0;
        for (_, agent) in distant {
            if !self.rng.gen_bool(self.config.cull_chance) {
                continue;
            }
            match host.release(agent) {
                Ok(()) => released += 1,
                Err(e) => debug!("Could not release {}: {}", agent, e),
            }
        }
        if released > 0 {
            debug!("Released {} distant agents", released);
        }
        Ok(released)
    }
}
