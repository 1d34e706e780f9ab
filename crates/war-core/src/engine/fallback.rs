//! Fallback State Machine
//!
//! Consecutive faulty cycles escalate into a timed pause. While paused the
//! engine issues no engagements; the first clean cycle after the window
//! returns it to normal operation.

use std::time::Duration;
use tracing::{info, warn};
use war_events::{EventKind, FaultSite};

use super::FactionEngine;
use crate::host::{ClearOrders, HostWorld};

/// Operating mode of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    #[default]
    Normal,
    Fallback,
}

/// What a fault report did to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResponse {
    /// Counted; still below the threshold.
    Counted { consecutive: u32 },
    /// Threshold reached; fallback entered and orders cleared.
    EnteredFallback { consecutive: u32 },
    /// Already in fallback; the window was extended.
    Latched { consecutive: u32 },
}

impl FaultResponse {
    pub fn consecutive(&self) -> u32 {
        match *self {
            FaultResponse::Counted { consecutive }
            | FaultResponse::EnteredFallback { consecutive }
            | FaultResponse::Latched { consecutive } => consecutive,
        }
    }
}

/// `{consecutive_faults, last_fault_at, mode}`.
#[derive(Debug, Clone)]
pub struct FallbackState {
    threshold: u32,
    duration: Duration,
    consecutive_faults: u32,
    last_fault_at: Option<Duration>,
    mode: EngineMode,
}

impl FallbackState {
    pub fn new(threshold: u32, duration: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            duration,
            consecutive_faults: 0,
            last_fault_at: None,
            mode: EngineMode::Normal,
        }
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    pub fn last_fault_at(&self) -> Option<Duration> {
        self.last_fault_at
    }

    /// Counts one fault at `now` and advances the mode.
    pub fn record_fault(&mut self, now: Duration) -> FaultResponse {
        self.consecutive_faults = self.consecutive_faults.saturating_add(1);
        self.last_fault_at = Some(now);
        let consecutive = self.consecutive_faults;

        match self.mode {
            EngineMode::Fallback => FaultResponse::Latched { consecutive },
            EngineMode::Normal if consecutive >= self.threshold => {
                self.mode = EngineMode::Fallback;
                FaultResponse::EnteredFallback { consecutive }
            }
            EngineMode::Normal => FaultResponse::Counted { consecutive },
        }
    }

    /// Records a clean cycle. Returns true if this left fallback.
    pub fn record_success(&mut self, now: Duration) -> bool {
        self.consecutive_faults = 0;
        if self.mode == EngineMode::Fallback && self.remaining(now).is_zero() {
            self.mode = EngineMode::Normal;
            return true;
        }
        false
    }

    /// Time left in the fallback window; zero outside fallback.
    pub fn remaining(&self, now: Duration) -> Duration {
        match (self.mode, self.last_fault_at) {
            (EngineMode::Fallback, Some(at)) => {
                self.duration.saturating_sub(now.saturating_sub(at))
            }
            _ => Duration::ZERO,
        }
    }

    /// True while the fallback window is open.
    pub fn is_paused(&self, now: Duration) -> bool {
        !self.remaining(now).is_zero()
    }

    pub fn reset(&mut self) {
        self.consecutive_faults = 0;
        self.last_fault_at = None;
        self.mode = EngineMode::Normal;
    }
}

impl FactionEngine {
    /// Reports one systemic fault.
    ///
    /// Reaching the threshold enters fallback: every registered agent that
    /// still exists has its orders cleared, invalid entries are cleaned up,
    /// and the update cadence restarts. Reports made while already in
    /// fallback only extend the window.
    pub fn report_fault<H: HostWorld + ?Sized>(&mut self, host: &mut H) -> FaultResponse {
        let now = host.now();
        self.record(now, EventKind::Fault {
            site: FaultSite::Reported,
            agent: None,
            message: "fault reported".to_string(),
        });
        self.escalate(host, now)
    }

    pub(crate) fn escalate<H: HostWorld + ?Sized>(
        &mut self,
        host: &mut H,
        now: Duration,
    ) -> FaultResponse {
        let response = self.fallback.record_fault(now);
        match response {
            FaultResponse::EnteredFallback { consecutive } => self.enter_fallback(host, now, consecutive),
            FaultResponse::Latched { consecutive } => {
                warn!("Fault during fallback ({} consecutive), window extended", consecutive);
            }
            FaultResponse::Counted { consecutive } => {
                warn!(
                    "Combat fault {}/{}",
                    consecutive, self.fallback.threshold
                );
            }
        }
        response
    }

    fn enter_fallback<H: HostWorld + ?Sized>(&mut self, host: &mut H, now: Duration, consecutive: u32) {
        let mut cleared = 0;
        for agent in self.roster.handles() {
            if !host.exists(agent) {
                continue;
            }
            match host.clear_orders(agent, ClearOrders::Gracefully) {
                Ok(()) => cleared += 1,
                Err(e) => warn!("Could not clear orders for {}: {}", agent, e),
            }
        }

        self.cleanup_invalid(host);
        self.actions_this_tick = 0;
        self.stride.reset();

        warn!(
            "Fallback mode after {} consecutive faults: cleared orders for {} agents, pausing {:.0}s",
            consecutive,
            cleared,
            self.fallback.duration.as_secs_f32()
        );
        host.notify(&format!(
            "Faction war paused for {:.0}s after repeated faults",
            self.fallback.duration.as_secs_f32()
        ));
        self.record(now, EventKind::FallbackEntered {
            consecutive_faults: consecutive,
        });
    }

    /// Records a cycle that completed without faults.
    pub(crate) fn settle(&mut self, now: Duration) {
        if self.fallback.record_success(now) {
            info!("Fallback window elapsed, combat resumed");
            self.record(now, EventKind::FallbackCleared);
        }
    }
}
