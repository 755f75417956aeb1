//! World Components
//!
//! Positions on the tile grid, the simulation clock and line-of-sight blockers.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sampling distance used when walking a line between two points
const LINE_STEP: f32 = 0.25;

/// Component: continuous position in tile units (one unit per tile)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Tile this position falls in
    pub fn tile(&self) -> TileCoord {
        TileCoord::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn lerp(&self, other: &Position, t: f32) -> Position {
        Position::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Integer tile coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn center(&self) -> Position {
        Position::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// Component: remembers the last tile an actor was seen on, so stepping onto
/// a new tile can be detected
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct TileTracker {
    last: Option<TileCoord>,
}

impl TileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current tile. Returns true when the actor moved onto a
    /// different tile; the first observation is not a step.
    pub fn step_to(&mut self, tile: TileCoord) -> bool {
        let stepped = matches!(self.last, Some(previous) if previous != tile);
        self.last = Some(tile);
        stepped
    }

    pub fn last_tile(&self) -> Option<TileCoord> {
        self.last
    }
}

/// Resource: monotonic simulation clock in seconds
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    /// Seconds since the simulation started
    pub now: f64,
    /// Length of the current frame in seconds
    pub delta: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, delta_seconds: f64) {
        let delta = delta_seconds.max(0.0);
        self.delta = delta;
        self.now += delta;
    }
}

/// Resource: tiles that block line of sight and unobstructed paths
#[derive(Resource, Debug, Clone, Default)]
pub struct Obstructions {
    blocked: HashSet<TileCoord>,
}

impl Obstructions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&mut self, tile: TileCoord) {
        self.blocked.insert(tile);
    }

    pub fn unblock(&mut self, tile: TileCoord) {
        self.blocked.remove(&tile);
    }

    pub fn is_blocked(&self, tile: TileCoord) -> bool {
        self.blocked.contains(&tile)
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// True when `b` is within `max_range` of `a` and no blocked tile lies on
    /// the straight line between them. The endpoints' own tiles never block.
    pub fn unobstructed(&self, a: Position, b: Position, max_range: f32) -> bool {
        let distance = a.distance(&b);
        if distance > max_range {
            return false;
        }
        if self.blocked.is_empty() {
            return true;
        }

        let start = a.tile();
        let end = b.tile();
        let steps = (distance / LINE_STEP).ceil() as usize;
        for i in 1..steps {
            let tile = a.lerp(&b, i as f32 / steps as f32).tile();
            if tile != start && tile != end && self.blocked.contains(&tile) {
                return false;
            }
        }
        true
    }
}
