//! Configuration loading for the faction war.
//!
//! All tuning lives in one TOML file. Every section and field is optional;
//! anything left out keeps its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/war.toml";

/// Longest cooldown or fallback window accepted, one day
pub const MAX_DURATION_SECS: f32 = 86_400.0;

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarConfig {
    /// Combat decision loop
    #[serde(default)]
    pub engine: EngineConfig,
    /// One-time combat configuration values
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Fault escalation
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// World scanning and population control
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Archetype catalog location
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Tick driver
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WarConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: WarConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_actions_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_actions_per_tick must be at least 1".into(),
            ));
        }
        if self.engine.candidate_pool == 0 {
            return Err(ConfigError::Invalid(
                "engine.candidate_pool must be at least 1".into(),
            ));
        }
        if self.engine.scan_radius <= 0.0 || self.engine.hero_detection_radius <= 0.0 {
            return Err(ConfigError::Invalid("engine radii must be positive".into()));
        }
        if self.fallback.fault_threshold == 0 {
            return Err(ConfigError::Invalid(
                "fallback.fault_threshold must be at least 1".into(),
            ));
        }
        for (name, chance) in [
            ("sampler.cull_chance", self.sampler.cull_chance),
            ("sampler.dead_delete_chance", self.sampler.dead_delete_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::Invalid(format!("{} must be within 0..=1", name)));
            }
        }
        for (name, secs) in [
            ("engine.engagement_cooldown_secs", self.engine.engagement_cooldown_secs),
            ("fallback.duration_secs", self.fallback.duration_secs),
        ] {
            if !(0.0..=MAX_DURATION_SECS).contains(&secs) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0..={} seconds",
                    name, MAX_DURATION_SECS
                )));
            }
        }
        if self.process.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "process.tick_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Combat decision loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Process cycles skipped between two combat updates
    pub update_stride: u32,
    /// Engagement commands allowed per update, across both phases
    pub max_actions_per_tick: usize,
    /// How far villains look for victims
    pub scan_radius: f32,
    /// How far heroes look for threats
    pub hero_detection_radius: f32,
    /// Nearest candidates considered before the random pick
    pub candidate_pool: usize,
    /// Minimum seconds between two engagements issued to the same attacker
    pub engagement_cooldown_secs: f32,
    /// Completed updates between two info-level summaries
    pub combat_log_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_stride: 3,
            max_actions_per_tick: 30,
            scan_radius: 100.0,
            hero_detection_radius: 120.0,
            candidate_pool: 3,
            engagement_cooldown_secs: 60.0,
            combat_log_interval: 15,
        }
    }
}

impl EngineConfig {
    pub fn engagement_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.engagement_cooldown_secs.max(0.0).min(MAX_DURATION_SECS))
    }
}

/// Values applied when an agent is configured for combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub max_health: i32,
    pub armor: i32,
    pub combat_ability: u8,
    pub accuracy: u8,
    pub firing_pattern: u32,
    /// Half-angle of the hero visual field, in degrees
    pub hero_visual_half_angle: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            max_health: 2000,
            armor: 100,
            combat_ability: 100,
            accuracy: 100,
            firing_pattern: 0xC6EE_6B4C,
            hero_visual_half_angle: 90.0,
        }
    }
}

/// Fault escalation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Consecutive faults that trigger fallback
    pub fault_threshold: u32,
    /// Seconds the engine stays paused after the last fault
    pub duration_secs: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            fault_threshold: 3,
            duration_secs: 30.0,
        }
    }
}

impl FallbackConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.duration_secs.max(0.0).min(MAX_DURATION_SECS))
    }
}

/// World scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Process cycles between two scans
    pub scan_interval: u32,
    /// Radius around the player that is scanned
    pub scan_radius: f32,
    /// Candidates handled per scan
    pub max_per_scan: usize,
    /// Registered population cap
    pub max_total_agents: usize,
    /// Extra radius beyond the scan radius searched for agents to release
    pub cull_ring_margin: f32,
    /// Agents considered for release per scan
    pub cull_batch: usize,
    /// Probability that a considered agent is released
    pub cull_chance: f64,
    /// Probability that a dead agent is destroyed rather than released
    pub dead_delete_chance: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            scan_interval: 30,
            scan_radius: 80.0,
            max_per_scan: 10,
            max_total_agents: 30,
            cull_ring_margin: 10.0,
            cull_batch: 3,
            cull_chance: 0.7,
            dead_delete_chance: 0.9,
        }
    }
}

/// Catalog location and expected size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub expected_count: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/catalog.json"),
            expected_count: catalog::EXPECTED_ARCHETYPE_COUNT,
        }
    }
}

/// Tick driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Wall-clock milliseconds between two cycles
    pub tick_interval_ms: u64,
    /// Seed for every random choice
    pub seed: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2500,
            seed: 42,
        }
    }
}

impl ProcessConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Append-only JSONL diagnostic log; none disables it
    pub diagnostic_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            diagnostic_log: Some(PathBuf::from("output/faction_war.jsonl")),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Faction War Configuration

[engine]
update_stride = 3
max_actions_per_tick = 30
scan_radius = 100.0
hero_detection_radius = 120.0
candidate_pool = 3
engagement_cooldown_secs = 60.0
combat_log_interval = 15

[profile]
max_health = 2000
armor = 100
combat_ability = 100
accuracy = 100
firing_pattern = 3337513804
hero_visual_half_angle = 90.0

[fallback]
fault_threshold = 3
duration_secs = 30.0

[sampler]
scan_interval = 30
scan_radius = 80.0
max_per_scan = 10
max_total_agents = 30
cull_ring_margin = 10.0
cull_batch = 3
cull_chance = 0.7
dead_delete_chance = 0.9

[catalog]
path = "data/catalog.json"
expected_count = 106

[process]
tick_interval_ms = 2500
seed = 42

[logging]
level = "info"
diagnostic_log = "output/faction_war.jsonl"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WarConfig::default();

        assert_eq!(config.engine.update_stride, 3);
        assert_eq!(config.engine.max_actions_per_tick, 30);
        assert_eq!(config.engine.engagement_cooldown(), Duration::from_secs(60));
        assert_eq!(config.fallback.fault_threshold, 3);
        assert_eq!(config.fallback.duration(), Duration::from_secs(30));
        assert_eq!(config.sampler.max_total_agents, 30);
        assert_eq!(config.catalog.expected_count, 106);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [engine]
            max_actions_per_tick = 5
        "#;

        let config = WarConfig::from_str(toml).unwrap();

        assert_eq!(config.engine.max_actions_per_tick, 5);
        assert_eq!(config.engine.scan_radius, 100.0);
        assert_eq!(config.sampler.scan_interval, 30);
        assert_eq!(config.process.tick_interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = WarConfig::from_str(&default_config_toml()).unwrap();

        assert_eq!(config.engine.hero_detection_radius, 120.0);
        assert_eq!(config.profile.firing_pattern, 0xC6EE_6B4C);
        assert_eq!(config.sampler.dead_delete_chance, 0.9);
        assert_eq!(
            config.logging.diagnostic_log,
            Some(PathBuf::from("output/faction_war.jsonl"))
        );
    }

    #[test]
    fn test_config_to_toml_round_trips_sections() {
        let toml = WarConfig::default().to_toml().unwrap();

        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[fallback]"));
        assert!(toml.contains("[sampler]"));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let err = WarConfig::from_str("[engine]\nmax_actions_per_tick = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_out_of_range_chance() {
        let err = WarConfig::from_str("[sampler]\ncull_chance = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("sampler.cull_chance"));
    }

    #[test]
    fn test_rejects_unbounded_durations() {
        for toml in [
            "[engine]\nengagement_cooldown_secs = inf\n",
            "[engine]\nengagement_cooldown_secs = nan\n",
            "[fallback]\nduration_secs = 1e30\n",
            "[fallback]\nduration_secs = -1.0\n",
        ] {
            let err = WarConfig::from_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "accepted {:?}", toml);
        }
    }

    #[test]
    fn test_unvalidated_durations_are_clamped() {
        let mut config = WarConfig::default();
        config.engine.engagement_cooldown_secs = f32::INFINITY;
        config.fallback.duration_secs = f32::NAN;

        assert_eq!(
            config.engine.engagement_cooldown(),
            Duration::from_secs_f32(MAX_DURATION_SECS)
        );
        assert_eq!(config.fallback.duration(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        let err = WarConfig::from_str("[process]\ntick_interval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("process.tick_interval_ms"));

        let mut config = WarConfig::default();
        config.process.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = WarConfig::from_str("[engine\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
