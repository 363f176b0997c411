//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for a live entity, allocated by the world on insertion.
///
/// Handles increase monotonically and are never reused, so ordering by handle
/// is ordering by insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A cell on the grid. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// 8-neighbour adjacency: Chebyshev distance of exactly one.
    pub fn adjacent(&self, other: &Point) -> bool {
        (self.x - other.x).abs().max((self.y - other.y).abs()) == 1
    }

    /// Squared Euclidean distance, only meaningful for comparisons
    pub fn distance_squared(&self, other: &Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The closed set of things that can live on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    OctoFull,
    OctoNotFull,
    Fish,
    Crab,
    Quake,
    Sgrass,
    Atlantis,
    Obstacle,
}

impl EntityKind {
    pub fn all() -> [EntityKind; 8] {
        [
            EntityKind::OctoFull,
            EntityKind::OctoNotFull,
            EntityKind::Fish,
            EntityKind::Crab,
            EntityKind::Quake,
            EntityKind::Sgrass,
            EntityKind::Atlantis,
            EntityKind::Obstacle,
        ]
    }

    pub fn is_octopus(&self) -> bool {
        matches!(self, EntityKind::OctoFull | EntityKind::OctoNotFull)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::OctoFull => "octo_full",
            EntityKind::OctoNotFull => "octo_not_full",
            EntityKind::Fish => "fish",
            EntityKind::Crab => "crab",
            EntityKind::Quake => "quake",
            EntityKind::Sgrass => "sgrass",
            EntityKind::Atlantis => "atlantis",
            EntityKind::Obstacle => "obstacle",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque reference to an image owned by the rendering side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub String);

impl ImageHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
