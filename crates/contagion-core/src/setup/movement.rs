//! Actor Movement
//!
//! Random wandering between frames so that carriers meet and leave residue
//! across the room.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{CarrierState, Dead, Obstructions, Position, TileCoord};

const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Move each living actor one tile in a random direction with probability
/// `move_chance`, staying inside the room and off blocked tiles.
/// Returns how many actors moved.
pub fn random_walk(
    world: &mut World,
    width: i32,
    height: i32,
    move_chance: f64,
    rng: &mut impl Rng,
) -> usize {
    let obstructions = world
        .get_resource::<Obstructions>()
        .cloned()
        .unwrap_or_default();

    let mut moved = 0;
    let mut query = world.query_filtered::<&mut Position, (With<CarrierState>, Without<Dead>)>();
    for mut position in query.iter_mut(world) {
        if !rng.gen_bool(move_chance.clamp(0.0, 1.0)) {
            continue;
        }
        let (dx, dy) = STEPS[rng.gen_range(0..STEPS.len())];
        let tile = position.tile();
        let next = TileCoord::new(tile.x + dx, tile.y + dy);
        if next.x < 0 || next.y < 0 || next.x >= width || next.y >= height {
            continue;
        }
        if obstructions.is_blocked(next) {
            continue;
        }
        *position = next.center();
        moved += 1;
    }
    moved
}
