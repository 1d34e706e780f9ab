//! Combat attribute commands sent to the host when an agent is configured.
//!
//! Numeric discriminants follow the host's own identifiers so that a host
//! adapter can forward them without a lookup table.

use serde::{Deserialize, Serialize};

/// Behavior flags that make an agent flee or panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigFlag {
    FleeWhenInVehicle = 42,
    FleeWhenThreatened = 46,
    PanicFromEvents = 128,
    FleeWhenInjured = 281,
    FleeFromCombat = 292,
}

impl ConfigFlag {
    /// Every flee/panic flag, in the order they are disabled.
    pub const FLEE_AND_PANIC: [ConfigFlag; 5] = [
        ConfigFlag::FleeWhenInjured,
        ConfigFlag::FleeWhenThreatened,
        ConfigFlag::FleeWhenInVehicle,
        ConfigFlag::FleeFromCombat,
        ConfigFlag::PanicFromEvents,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Combat attribute flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatFlag {
    SupportInCombat = 0,
    CanUseCover = 1,
    CanDoDrivebys = 2,
    AlwaysFight = 5,
    CanFightArmed = 46,
    CanUseVehicles = 50,
    CanAttackFromVehicle = 52,
    AlwaysEngage = 58,
    BlindFire = 1424,
}

impl CombatFlag {
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Movement posture while fighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatMovement {
    Stationary = 0,
    Defensive = 1,
    Advance = 2,
    /// Holds its ground and keeps firing.
    Hold = 3,
}

/// Preferred engagement distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatRange {
    Near = 0,
    Medium = 1,
    Far = 2,
    VeryFar = 3,
}

/// What an agent does when it loses sight of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLossResponse {
    ExitTask = 0,
    SearchForTarget = 1,
    NeverLoseTarget = 2,
}

/// A single attribute-setting command for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "snake_case")]
pub enum CombatAttribute {
    MaxHealth(i32),
    /// Refill health to the current ceiling.
    RestoreHealth,
    Armor(i32),
    SuffersCriticalHits(bool),
    CanRagdoll(bool),
    CanRagdollFromPlayerImpact(bool),
    CanBeKnockedOffVehicle(bool),
    CanBeDraggedOut(bool),
    ConfigFlag { flag: ConfigFlag, enabled: bool },
    CombatAbility(u8),
    CombatFlag { flag: CombatFlag, enabled: bool },
    CombatMovement(CombatMovement),
    CombatRange(CombatRange),
    Accuracy(u8),
    FiringPattern(u32),
    SeeingRange(f32),
    HearingRange(f32),
    PeripheralRange(f32),
    HighlyPerceptive(bool),
    VisualFieldAngles { min: f32, max: f32 },
    TargetLossResponse(TargetLossResponse),
    SteersAroundAgents(bool),
    SteersAroundObjects(bool),
    BlockNonTemporaryEvents(bool),
    KeepTask(bool),
}

impl CombatAttribute {
    pub fn enable(flag: CombatFlag) -> Self {
        CombatAttribute::CombatFlag { flag, enabled: true }
    }

    pub fn disable(flag: ConfigFlag) -> Self {
        CombatAttribute::ConfigFlag { flag, enabled: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_ids_match_host_values() {
        assert_eq!(ConfigFlag::FleeWhenInjured.id(), 281);
        assert_eq!(ConfigFlag::PanicFromEvents.id(), 128);
        assert_eq!(CombatFlag::AlwaysFight.id(), 5);
        assert_eq!(CombatFlag::BlindFire.id(), 1424);
    }

    #[test]
    fn test_attribute_serialization_is_tagged() {
        let json = serde_json::to_string(&CombatAttribute::Armor(100)).unwrap();
        assert_eq!(json, r#"{"attribute":"armor","value":100}"#);

        let json = serde_json::to_string(&CombatAttribute::RestoreHealth).unwrap();
        assert_eq!(json, r#"{"attribute":"restore_health"}"#);
    }
}
