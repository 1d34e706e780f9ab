//! Process Loop
//!
//! One cycle of the faction war: scan (when due), decide combat, clean up,
//! and append the engine's events to the diagnostic log. The caller decides
//! how often cycles run.

use catalog::Catalog;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::warn;

use crate::config::WarConfig;
use crate::engine::{CleanupReport, CombatOutcome, FactionEngine, WarTransition};
use crate::events::DiagnosticLog;
use crate::host::HostWorld;
use crate::sampler::{SampleOutcome, WorldSampler};

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub cycle: u64,
    /// None if the scan failed
    pub sample: Option<SampleOutcome>,
    pub combat: CombatOutcome,
    pub cleanup: CleanupReport,
    pub events_logged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The war is switched off; nothing ran.
    Inactive,
    Ran(TickReport),
}

/// Drives the engine and sampler against a host world
pub struct ProcessLoop {
    engine: FactionEngine,
    sampler: WorldSampler,
    catalog: Catalog,
    log: DiagnosticLog,
    cycles: u64,
}

impl ProcessLoop {
    /// Seeds the engine with `process.seed` and the sampler with the next seed.
    pub fn new(config: &WarConfig, catalog: Catalog, log: DiagnosticLog) -> Self {
        let seed = config.process.seed;
        Self {
            engine: FactionEngine::with_seed(config, seed),
            sampler: WorldSampler::new(
                config.sampler.clone(),
                SmallRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            catalog,
            log,
            cycles: 0,
        }
    }

    pub fn engine(&self) -> &FactionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FactionEngine {
        &mut self.engine
    }

    pub fn sampler(&self) -> &WorldSampler {
        &self.sampler
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn activate<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> WarTransition {
        let transition = self.engine.set_war_active(host, true);
        self.flush_events();
        transition
    }

    /// Tears the war down and flushes the log.
    pub fn deactivate<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> WarTransition {
        let transition = self.engine.set_war_active(host, false);
        self.flush_events();
        if let Err(e) = self.log.flush() {
            warn!("Failed to flush diagnostic log: {}", e);
        }
        transition
    }

    /// Runs one cycle.
    pub fn tick<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> TickOutcome {
        if !self.engine.is_active() {
            return TickOutcome::Inactive;
        }
        self.cycles += 1;

        let sample = match self.sampler.tick(&mut self.engine, host, &self.catalog) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Scan failed in cycle {}: {}", self.cycles, e);
                self.sampler.reset_cooldown();
                None
            }
        };
        let combat = self.engine.update_combat(host);
        let cleanup = self.engine.cleanup_invalid(host);
        let events_logged = self.flush_events();

        TickOutcome::Ran(TickReport {
            cycle: self.cycles,
            sample,
            combat,
            cleanup,
            events_logged,
        })
    }

    fn flush_events(&mut self) -> usize {
        let events = self.engine.drain_events();
        let count = events.len();
        if let Err(e) = self.log.log_batch(events) {
            warn!("Failed to write diagnostic log: {}", e);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use catalog::ArchetypeRecord;
    use war_events::Position;

    fn catalog() -> Catalog {
        Catalog::from_records(
            vec![
                ArchetypeRecord::new("Thor", "u_m_y_babyd", "0xDA116E7E", "Hero", "Magic"),
                ArchetypeRecord::new("Loki", "u_m_m_willyfist", "0x90769A8F", "Villain", "Magic"),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_inactive_loop_does_nothing() {
        let mut world = SandboxWorld::new();
        world.spawn_player(Position::default());
        world.spawn_agent(Position::new(3.0, 0.0, 0.0), 0xDA116E7E);
        let mut process = ProcessLoop::new(&WarConfig::default(), catalog(), DiagnosticLog::null());

        assert_eq!(process.tick(&mut world), TickOutcome::Inactive);
        assert_eq!(process.engine().total_count(), 0);
        assert_eq!(process.cycles(), 0);
    }

    #[test]
    fn test_first_tick_scans_and_fights() {
        let mut world = SandboxWorld::new();
        world.spawn_player(Position::default());
        world.spawn_agent(Position::new(3.0, 0.0, 0.0), 0xDA116E7E);
        world.spawn_agent(Position::new(6.0, 0.0, 0.0), 0x90769A8F);
        let mut process = ProcessLoop::new(&WarConfig::default(), catalog(), DiagnosticLog::null());
        process.activate(&mut world);

        let TickOutcome::Ran(report) = process.tick(&mut world) else {
            panic!("loop should run while active");
        };

        assert!(matches!(report.sample, Some(SampleOutcome::Scanned(_))));
        assert_eq!(process.engine().total_count(), 2);
        assert_eq!(report.combat.engagements(), 1);
        assert!(report.events_logged > 0);
        assert!(process.log().event_count() > 0);
    }

    #[test]
    fn test_scan_failure_retries_next_cycle() {
        let mut world = SandboxWorld::new();
        world.spawn_player(Position::default());
        let mut process = ProcessLoop::new(&WarConfig::default(), catalog(), DiagnosticLog::null());
        process.activate(&mut world);
        world.set_unavailable(true);

        let TickOutcome::Ran(first) = process.tick(&mut world) else {
            panic!("loop should run while active");
        };
        assert_eq!(first.sample, None);

        world.set_unavailable(false);
        let TickOutcome::Ran(second) = process.tick(&mut world) else {
            panic!("loop should run while active");
        };
        assert!(matches!(second.sample, Some(SampleOutcome::Scanned(_))));
    }
}
