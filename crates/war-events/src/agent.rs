//! Agent handles and world positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an agent owned by the host world.
///
/// The engine never owns the agent behind a handle. A handle may stop
/// resolving at any time, so every use goes through the host first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentHandle(pub u64);

impl AgentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{:08X}", self.0)
    }
}

impl From<u64> for AgentHandle {
    fn from(raw: u64) -> Self {
        AgentHandle(raw)
    }
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(a.distance_squared(&b), 25.0);
        assert_eq!(b.distance_to(&b), 0.0);
    }

    #[test]
    fn test_handle_display_and_order() {
        assert_eq!(AgentHandle(0x2A).to_string(), "agent#0000002A");
        assert!(AgentHandle(1) < AgentHandle(2));
        assert_eq!(serde_json::to_string(&AgentHandle(7)).unwrap(), "7");
    }
}
