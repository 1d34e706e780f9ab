//! Cadence bookkeeping: update stride, per-attacker engagement cooldowns, and
//! log throttling. None of these affect correctness; they bound work per cycle.

use std::collections::BTreeMap;
use std::time::Duration;
use war_events::AgentHandle;

/// Lets an operation run once every `interval + 1` calls.
#[derive(Debug, Clone)]
pub struct UpdateStride {
    interval: u32,
    remaining: u32,
}

impl UpdateStride {
    /// The first call to [`UpdateStride::ready`] always runs.
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            remaining: 0,
        }
    }

    /// Returns true when the operation should run now.
    pub fn ready(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            false
        } else {
            self.remaining = self.interval;
            true
        }
    }

    /// Waits a full interval before the next run.
    pub fn reset(&mut self) {
        self.remaining = self.interval;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// Last engagement time per attacker.
#[derive(Debug, Clone)]
pub struct EngagementCooldowns {
    window: Duration,
    last_engaged: BTreeMap<AgentHandle, Duration>,
}

impl EngagementCooldowns {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_engaged: BTreeMap::new(),
        }
    }

    /// True while `agent` is inside its cooldown window.
    pub fn is_cooling(&self, agent: AgentHandle, now: Duration) -> bool {
        self.last_engaged
            .get(&agent)
            .map_or(false, |&at| now.saturating_sub(at) < self.window)
    }

    pub fn record(&mut self, agent: AgentHandle, now: Duration) {
        self.last_engaged.insert(agent, now);
    }

    pub fn last_engaged(&self, agent: AgentHandle) -> Option<Duration> {
        self.last_engaged.get(&agent).copied()
    }

    /// Keeps only entries for which `keep` holds; returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(AgentHandle) -> bool) -> usize {
        let before = self.last_engaged.len();
        self.last_engaged.retain(|&h, _| keep(h));
        before - self.last_engaged.len()
    }

    pub fn clear(&mut self) {
        self.last_engaged.clear();
    }

    pub fn len(&self) -> usize {
        self.last_engaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_engaged.is_empty()
    }
}

/// Fires every `interval` calls, starting with the first.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    interval: u32,
    counter: u32,
}

impl LogThrottle {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            counter: 0,
        }
    }

    pub fn due(&mut self) -> bool {
        let due = self.counter == 0;
        self.counter = (self.counter + 1) % self.interval;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_runs_every_fourth_call() {
        let mut stride = UpdateStride::new(3);
        let runs: Vec<bool> = (0..8).map(|_| stride.ready()).collect();
        assert_eq!(runs, vec![true, false, false, false, true, false, false, false]);
    }

    #[test]
    fn test_stride_zero_runs_every_call() {
        let mut stride = UpdateStride::new(0);
        assert!((0..5).all(|_| stride.ready()));
    }

    #[test]
    fn test_stride_reset_delays_next_run() {
        let mut stride = UpdateStride::new(2);
        assert!(stride.ready());
        assert!(!stride.ready());
        stride.reset();
        assert_eq!(stride.remaining(), 2);
        assert!(!stride.ready());
        assert!(!stride.ready());
        assert!(stride.ready());
    }

    #[test]
    fn test_cooldown_window() {
        let mut cooldowns = EngagementCooldowns::new(Duration::from_secs(60));
        let a = AgentHandle(1);

        assert!(!cooldowns.is_cooling(a, Duration::from_secs(10)));
        cooldowns.record(a, Duration::from_secs(10));
        assert!(cooldowns.is_cooling(a, Duration::from_secs(69)));
        assert!(!cooldowns.is_cooling(a, Duration::from_secs(70)));
    }

    #[test]
    fn test_cooldown_retain() {
        let mut cooldowns = EngagementCooldowns::new(Duration::from_secs(60));
        cooldowns.record(AgentHandle(1), Duration::ZERO);
        cooldowns.record(AgentHandle(2), Duration::ZERO);

        assert_eq!(cooldowns.retain(|h| h.0 == 2), 1);
        assert_eq!(cooldowns.len(), 1);
        assert!(cooldowns.last_engaged(AgentHandle(1)).is_none());
    }

    #[test]
    fn test_log_throttle() {
        let mut throttle = LogThrottle::new(3);
        let due: Vec<bool> = (0..7).map(|_| throttle.due()).collect();
        assert_eq!(due, vec![true, false, false, true, false, false, true]);
    }
}
