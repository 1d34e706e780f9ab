//! Combat profile issued once per registered agent.
//!
//! The generic part makes an agent durable and willing to fight. The faction
//! part follows it and may repeat a generic attribute with another value; the
//! host applies commands in order, so the later one wins.

use war_events::{
    CombatAttribute, CombatFlag, CombatMovement, CombatRange, ConfigFlag, Faction,
    TargetLossResponse,
};

use crate::config::ProfileConfig;

/// Ability level used for the faction overrides
const PROFESSIONAL_ABILITY: u8 = 100;

/// Ordered attribute commands for one faction.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatProfile {
    pub faction: Faction,
    pub attributes: Vec<CombatAttribute>,
}

impl CombatProfile {
    pub fn for_faction(faction: Faction, config: &ProfileConfig, detection_radius: f32) -> Self {
        let mut attributes = generic_attributes(config);
        match faction {
            Faction::Hero => attributes.extend(hero_overrides(config, detection_radius)),
            Faction::Villain => attributes.extend(villain_overrides()),
        }
        attributes.extend(steering_attributes());
        Self { faction, attributes }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

fn generic_attributes(config: &ProfileConfig) -> Vec<CombatAttribute> {
    let mut attributes = vec![
        CombatAttribute::MaxHealth(config.max_health),
        CombatAttribute::RestoreHealth,
        CombatAttribute::Armor(config.armor),
        CombatAttribute::SuffersCriticalHits(false),
        CombatAttribute::CanRagdoll(false),
        CombatAttribute::CanRagdollFromPlayerImpact(false),
        CombatAttribute::CanBeKnockedOffVehicle(false),
        CombatAttribute::CanBeDraggedOut(false),
    ];
    attributes.extend(ConfigFlag::FLEE_AND_PANIC.iter().map(|&flag| CombatAttribute::disable(flag)));
    attributes.push(CombatAttribute::CombatAbility(config.combat_ability));
    attributes.extend(
        [
            CombatFlag::AlwaysFight,
            CombatFlag::CanFightArmed,
            CombatFlag::CanUseCover,
            CombatFlag::CanDoDrivebys,
            CombatFlag::CanUseVehicles,
            CombatFlag::SupportInCombat,
        ]
        .into_iter()
        .map(CombatAttribute::enable),
    );
    attributes.extend([
        CombatAttribute::CombatMovement(CombatMovement::Stationary),
        CombatAttribute::CombatRange(CombatRange::Far),
        CombatAttribute::Accuracy(config.accuracy),
        CombatAttribute::FiringPattern(config.firing_pattern),
    ]);
    attributes
}

fn hero_overrides(config: &ProfileConfig, detection_radius: f32) -> Vec<CombatAttribute> {
    let half = config.hero_visual_half_angle;
    vec![
        CombatAttribute::SeeingRange(detection_radius),
        CombatAttribute::HearingRange(detection_radius),
        CombatAttribute::PeripheralRange(detection_radius),
        CombatAttribute::HighlyPerceptive(true),
        CombatAttribute::VisualFieldAngles { min: -half, max: half },
        CombatAttribute::enable(CombatFlag::AlwaysEngage),
        CombatAttribute::CombatAbility(PROFESSIONAL_ABILITY),
    ]
}

fn villain_overrides() -> Vec<CombatAttribute> {
    vec![
        CombatAttribute::enable(CombatFlag::CanAttackFromVehicle),
        CombatAttribute::enable(CombatFlag::BlindFire),
        CombatAttribute::CombatRange(CombatRange::VeryFar),
        CombatAttribute::CombatAbility(PROFESSIONAL_ABILITY),
        CombatAttribute::CombatMovement(CombatMovement::Stationary),
        CombatAttribute::TargetLossResponse(TargetLossResponse::NeverLoseTarget),
    ]
}

fn steering_attributes() -> [CombatAttribute; 4] {
    [
        CombatAttribute::SteersAroundAgents(false),
        CombatAttribute::SteersAroundObjects(false),
        CombatAttribute::BlockNonTemporaryEvents(true),
        CombatAttribute::KeepTask(true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_profile_comes_first() {
        let config = ProfileConfig::default();
        let hero = CombatProfile::for_faction(Faction::Hero, &config, 120.0);
        let villain = CombatProfile::for_faction(Faction::Villain, &config, 120.0);

        let generic = generic_attributes(&config);
        assert_eq!(&hero.attributes[..generic.len()], &generic[..]);
        assert_eq!(&villain.attributes[..generic.len()], &generic[..]);
        assert_eq!(hero.attributes[0], CombatAttribute::MaxHealth(2000));
    }

    #[test]
    fn test_hero_senses_match_detection_radius() {
        let profile = CombatProfile::for_faction(Faction::Hero, &ProfileConfig::default(), 120.0);

        assert!(profile.attributes.contains(&CombatAttribute::SeeingRange(120.0)));
        assert!(profile.attributes.contains(&CombatAttribute::HighlyPerceptive(true)));
        assert!(profile
            .attributes
            .contains(&CombatAttribute::VisualFieldAngles { min: -90.0, max: 90.0 }));
        assert!(!profile
            .attributes
            .contains(&CombatAttribute::enable(CombatFlag::BlindFire)));
    }

    #[test]
    fn test_villain_never_loses_target() {
        let profile = CombatProfile::for_faction(Faction::Villain, &ProfileConfig::default(), 120.0);

        assert!(profile
            .attributes
            .contains(&CombatAttribute::TargetLossResponse(TargetLossResponse::NeverLoseTarget)));
        assert!(profile.attributes.contains(&CombatAttribute::CombatRange(CombatRange::VeryFar)));
        assert!(!profile.attributes.iter().any(|a| matches!(a, CombatAttribute::SeeingRange(_))));
    }

    #[test]
    fn test_profile_ends_with_task_locking() {
        let profile = CombatProfile::for_faction(Faction::Villain, &ProfileConfig::default(), 120.0);
        assert_eq!(profile.attributes.last(), Some(&CombatAttribute::KeepTask(true)));
        assert!(profile
            .attributes
            .contains(&CombatAttribute::disable(ConfigFlag::FleeFromCombat)));
    }
}
