//! Spatial Index
//!
//! Per-frame index of infectable actors by tile, used for range queries by
//! the spread engines.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use crate::components::{CarrierState, Obstructions, Position, TileCoord};

/// Resource: positions of infectable actors, bucketed by tile
#[derive(Resource, Debug, Default)]
pub struct SpatialIndex {
    positions: HashMap<Entity, Position>,
    by_tile: HashMap<TileCoord, Vec<Entity>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (called before rebuilding)
    pub fn clear(&mut self) {
        self.positions.clear();
        self.by_tile.clear();
    }

    pub fn insert(&mut self, entity: Entity, position: Position) {
        self.positions.insert(entity, position);
        self.by_tile.entry(position.tile()).or_default().push(entity);
    }

    pub fn position(&self, entity: Entity) -> Option<Position> {
        self.positions.get(&entity).copied()
    }

    pub fn at_tile(&self, tile: TileCoord) -> &[Entity] {
        self.by_tile.get(&tile).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Every indexed entity within `radius` of `origin`, in entity order.
    ///
    /// Walks the tile buckets under the query box, or every indexed position
    /// when the box covers more tiles than are occupied.
    pub fn entities_in_range(&self, origin: Position, radius: f32) -> Vec<Entity> {
        if radius < 0.0 || radius.is_nan() {
            return Vec::new();
        }
        let min = Position::new(origin.x - radius, origin.y - radius).tile();
        let max = Position::new(origin.x + radius, origin.y + radius).tile();
        let box_tiles = (i64::from(max.x) - i64::from(min.x) + 1)
            .saturating_mul(i64::from(max.y) - i64::from(min.y) + 1);

        let mut found: Vec<Entity> = if box_tiles > self.by_tile.len() as i64 {
            self.positions
                .iter()
                .filter(|(_, position)| origin.distance(position) <= radius)
                .map(|(entity, _)| *entity)
                .collect()
        } else {
            let mut found = Vec::new();
            for x in min.x..=max.x {
                for y in min.y..=max.y {
                    for entity in self.at_tile(TileCoord::new(x, y)) {
                        if let Some(position) = self.positions.get(entity) {
                            if origin.distance(position) <= radius {
                                found.push(*entity);
                            }
                        }
                    }
                }
            }
            found
        };
        found.sort();
        found
    }

    /// Entities within `range` of `source` with an unobstructed line to it,
    /// excluding the source itself
    pub fn visible_from(
        &self,
        source: Entity,
        range: f32,
        obstructions: &Obstructions,
    ) -> Vec<Entity> {
        let Some(origin) = self.position(source) else {
            return Vec::new();
        };
        self.entities_in_range(origin, range)
            .into_iter()
            .filter(|target| *target != source)
            .filter(|target| {
                self.position(*target)
                    .map(|position| obstructions.unobstructed(origin, position, range))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// System: Rebuild the spatial index from current positions
pub fn build_spatial_index(
    mut index: ResMut<SpatialIndex>,
    query: Query<(Entity, &Position), With<CarrierState>>,
) {
    index.clear();
    for (entity, position) in query.iter() {
        index.insert(entity, *position);
    }
}
