//! Population Setup
//!
//! Spawns a walled room of actors, some masked, and seeds patient zero.

use bevy_ecs::prelude::*;
use rand::Rng;

use contagion_events::DiseaseId;

use crate::components::{
    BodyTemperature, Equipment, Gear, Obstructions, Position, SlotCategory, TileCoord,
};
use crate::config::PopulationConfig;
use crate::engine::Simulation;
use crate::infection::InfectOutcome;

/// Protection of the masks handed out to the masked fraction
pub const SURGICAL_MASK_PROTECTION: f32 = 0.5;

const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Summary of what was spawned
#[derive(Debug, Clone, Default)]
pub struct PopulationSummary {
    pub actors: Vec<Entity>,
    pub masked: usize,
    pub walls: usize,
    pub patient_zero: Option<Entity>,
}

/// Block a vertical wall down the middle of the room, leaving a doorway
pub fn build_walls(sim: &mut Simulation, width: i32, height: i32) -> usize {
    if width < 3 || height < 3 {
        return 0;
    }
    let x = width / 2;
    let door = height / 2;
    let mut walls = 0;
    for y in 0..height {
        if (y - door).abs() <= 1 {
            continue;
        }
        sim.set_obstructed(TileCoord::new(x, y), true);
        walls += 1;
    }
    walls
}

fn random_open_tile(
    sim: &Simulation,
    width: i32,
    height: i32,
    rng: &mut impl Rng,
) -> TileCoord {
    let obstructions = sim.world().resource::<Obstructions>();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let tile = TileCoord::new(rng.gen_range(0..width.max(1)), rng.gen_range(0..height.max(1)));
        if !obstructions.is_blocked(tile) {
            return tile;
        }
    }
    TileCoord::new(0, 0)
}

/// Spawn the demo population
pub fn spawn_population(
    sim: &mut Simulation,
    config: &PopulationConfig,
    rng: &mut impl Rng,
) -> PopulationSummary {
    let mut summary = PopulationSummary {
        walls: build_walls(sim, config.width, config.height),
        ..Default::default()
    };

    for _ in 0..config.actors {
        let tile = random_open_tile(sim, config.width, config.height, rng);
        let actor = sim.spawn_actor(tile.center());

        let mut equipment = Equipment::new();
        if rng.gen::<f32>() < config.masked_fraction {
            equipment.equip(
                SlotCategory::Mask,
                Gear::new("surgical mask", SURGICAL_MASK_PROTECTION),
            );
            summary.masked += 1;
        }
        let temperature = BodyTemperature(rng.gen_range(36.4..37.4));
        sim.world_mut().entity_mut(actor).insert((equipment, temperature));
        summary.actors.push(actor);
    }

    if let (Some(disease), Some(&first)) = (&config.patient_zero, summary.actors.first()) {
        let disease = DiseaseId::new(disease.clone());
        match sim.infect(first, &disease, 1) {
            InfectOutcome::Infected { .. } => summary.patient_zero = Some(first),
            outcome => {
                tracing::warn!(disease = %disease, ?outcome, "could not seed patient zero");
            }
        }
    }

    tracing::info!(
        actors = summary.actors.len(),
        masked = summary.masked,
        walls = summary.walls,
        "population spawned"
    );
    summary
}

/// Where an actor currently stands
pub fn position_of(sim: &Simulation, actor: Entity) -> Option<Position> {
    sim.world().get::<Position>(actor).copied()
}
