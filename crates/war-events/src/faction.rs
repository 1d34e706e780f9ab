//! Factions and the relationship groups the host keeps between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two mutually exclusive allegiances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    Hero,
    Villain,
}

impl Faction {
    /// Returns the opposing faction.
    pub fn opponent(self) -> Self {
        match self {
            Faction::Hero => Faction::Villain,
            Faction::Villain => Faction::Hero,
        }
    }

    /// Relationship group the host uses for members of this faction.
    pub fn group(self) -> RelationGroup {
        match self {
            Faction::Hero => RelationGroup::Heroes,
            Faction::Villain => RelationGroup::Villains,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Faction::Hero => "Hero",
            Faction::Villain => "Villain",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a faction label is neither `Hero` nor `Villain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFactionError(pub String);

impl fmt::Display for ParseFactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown faction label '{}' (expected Hero or Villain)", self.0)
    }
}

impl std::error::Error for ParseFactionError {}

impl FromStr for Faction {
    type Err = ParseFactionError;

    /// Case-insensitive match against `Hero` / `Villain`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("hero") {
            Ok(Faction::Hero)
        } else if s.eq_ignore_ascii_case("villain") {
            Ok(Faction::Villain)
        } else {
            Err(ParseFactionError(s.to_string()))
        }
    }
}

/// Relationship groups registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationGroup {
    Heroes,
    Villains,
    Player,
}

impl RelationGroup {
    pub fn name(self) -> &'static str {
        match self {
            RelationGroup::Heroes => "HEROES",
            RelationGroup::Villains => "VILLAINS",
            RelationGroup::Player => "PLAYER",
        }
    }
}

/// How one group regards another. Values follow the host's numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Neutral = 0,
    Hate = 5,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Hero".parse::<Faction>(), Ok(Faction::Hero));
        assert_eq!("HERO".parse::<Faction>(), Ok(Faction::Hero));
        assert_eq!("villain".parse::<Faction>(), Ok(Faction::Villain));
    }

    #[test]
    fn test_parse_rejects_unknown_labels() {
        assert!("Antihero".parse::<Faction>().is_err());
        assert!("".parse::<Faction>().is_err());
        assert!(" Hero".parse::<Faction>().is_err());
    }

    #[test]
    fn test_opponent_and_group() {
        assert_eq!(Faction::Hero.opponent(), Faction::Villain);
        assert_eq!(Faction::Villain.group(), RelationGroup::Villains);
        assert_eq!(RelationGroup::Player.name(), "PLAYER");
        assert_eq!(Stance::Hate as i32, 5);
    }
}
