//! Simulation Engine
//!
//! Owns the ECS world and the fixed, chained schedule that drives every
//! engine once per frame.

use bevy_ecs::prelude::*;

use contagion_events::{CarrierSnapshot, DiseaseEvent, DiseaseId, ResidueSiteSnapshot, SymptomId};

use crate::components::{
    CarrierState, Dead, Obstructions, Position, ResidueSite, ResidueStore, SimClock, TileCoord,
    TileTracker,
};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::InfectOutcome;
use crate::interactions;
use crate::output::diagnostics;
use crate::registry::DiseaseRegistry;
use crate::systems::{
    airborne_spread, build_spatial_index, collect_due_carriers, contact_spread, decay_residue,
    residue_step_contacts, tick_carriers, AirborneTimer, DueCarriers, PendingBursts,
    SpatialIndex,
};
use crate::{RandomSource, SimRng};

/// Build the per-frame schedule. Order is fixed: index, due carriers,
/// residue decay, spread, progression and cures, then step-on contacts.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            build_spatial_index,
            collect_due_carriers,
            decay_residue,
            airborne_spread,
            contact_spread,
            tick_carriers,
            residue_step_contacts,
        )
            .chain(),
    );
    schedule
}

/// A running disease simulation
pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// Create a simulation seeded from `config.simulation.seed`
    pub fn new(config: SimConfig, registry: DiseaseRegistry) -> Self {
        let rng = SimRng::seeded(config.simulation.seed);
        Self::with_rng(config, registry, rng)
    }

    /// Create a simulation drawing from a caller-supplied random source
    pub fn with_rng(config: SimConfig, registry: DiseaseRegistry, rng: SimRng) -> Self {
        let mut world = World::new();
        world.insert_resource(SimClock::new());
        world.insert_resource(AirborneTimer::new(config.airborne.interval));
        world.insert_resource(config);
        world.insert_resource(registry);
        world.insert_resource(rng);
        world.insert_resource(DiseaseEvents::new());
        world.insert_resource(PendingBursts::new());
        world.insert_resource(DueCarriers::new());
        world.insert_resource(SpatialIndex::new());
        world.insert_resource(Obstructions::new());
        world.insert_resource(ResidueStore::new());

        Self {
            world,
            schedule: build_schedule(),
        }
    }

    /// Convenience for tests: replace the random source
    pub fn set_random_source(&mut self, source: impl RandomSource + 'static) {
        self.world.insert_resource(SimRng::from_source(source));
    }

    /// Advance the clock by `delta_seconds` and run one frame
    pub fn update(&mut self, delta_seconds: f64) {
        self.world.resource_mut::<SimClock>().advance(delta_seconds);
        self.schedule.run(&mut self.world);
    }

    pub fn now(&self) -> f64 {
        self.world.resource::<SimClock>().now
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn registry(&self) -> &DiseaseRegistry {
        self.world.resource::<DiseaseRegistry>()
    }

    /// Spawn an infectable actor
    pub fn spawn_actor(&mut self, position: Position) -> Entity {
        let interval = self.config().carrier.tick_interval;
        self.world
            .spawn((CarrierState::new(interval), position, TileTracker::new()))
            .id()
    }

    /// Spawn a plain object that can hold residue
    pub fn spawn_object(&mut self, position: Position) -> Entity {
        self.world.spawn(position).id()
    }

    /// Destroy an entity along with its carrier state and any residue on it
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world
            .resource_mut::<ResidueStore>()
            .remove(&ResidueSite::Object(entity));
        self.world.despawn(entity)
    }

    /// Mark an actor dead. Dead actors cannot be infected and stop progressing.
    pub fn kill(&mut self, actor: Entity) -> bool {
        match self.world.get_entity_mut(actor) {
            Some(mut entity) => {
                entity.insert(Dead);
                true
            }
            None => false,
        }
    }

    pub fn set_obstructed(&mut self, tile: TileCoord, blocked: bool) {
        let mut obstructions = self.world.resource_mut::<Obstructions>();
        if blocked {
            obstructions.block(tile);
        } else {
            obstructions.unblock(tile);
        }
    }

    pub fn set_position(&mut self, entity: Entity, position: Position) -> bool {
        match self.world.get_mut::<Position>(entity) {
            Some(mut current) => {
                *current = position;
                true
            }
            None => false,
        }
    }

    pub fn infect(&mut self, actor: Entity, disease: &DiseaseId, start_stage: u32) -> InfectOutcome {
        interactions::infect(&mut self.world, actor, disease, start_stage)
    }

    pub fn try_infect_with_chance(
        &mut self,
        actor: Entity,
        disease: &DiseaseId,
        chance: f32,
    ) -> InfectOutcome {
        interactions::try_infect_with_chance(&mut self.world, actor, disease, chance)
    }

    pub fn on_direct_contact(&mut self, a: Entity, b: Entity) -> Vec<InfectOutcome> {
        interactions::on_direct_contact(&mut self.world, a, b)
    }

    pub fn on_residue_contact(&mut self, actor: Entity, site: ResidueSite) -> bool {
        interactions::on_residue_contact(&mut self.world, actor, site)
    }

    pub fn on_actor_spoke(&mut self, actor: Entity) -> bool {
        interactions::on_actor_spoke(&mut self.world, actor)
    }

    pub fn vaccinate(&mut self, actor: Entity, disease: &DiseaseId) -> bool {
        interactions::vaccinate(&mut self.world, actor, disease)
    }

    pub fn try_cure_any(&mut self, actor: Entity, cure_chance: f32) -> bool {
        interactions::try_cure_any(&mut self.world, actor, cure_chance)
    }

    pub fn cure_all(&mut self, actor: Entity) -> usize {
        interactions::cure_all(&mut self.world, actor)
    }

    pub fn suppress_symptom(&mut self, actor: Entity, symptom: SymptomId, seconds: f64) -> bool {
        interactions::suppress_symptom(&mut self.world, actor, symptom, seconds)
    }

    pub fn set_metabolic_multiplier(&mut self, actor: Entity, multiplier: f64) -> bool {
        interactions::set_metabolic_multiplier(&mut self.world, actor, multiplier)
    }

    /// Stage of a disease on an actor, if active
    pub fn stage_of(&self, actor: Entity, disease: &DiseaseId) -> Option<u32> {
        self.world.get::<CarrierState>(actor)?.stage_of(disease)
    }

    /// Read-only diagnostic copy of an actor's infections
    pub fn diagnose(&self, actor: Entity) -> Option<CarrierSnapshot> {
        diagnostics::diagnose(&self.world, actor)
    }

    pub fn residue_at(&self, site: &ResidueSite) -> Option<ResidueSiteSnapshot> {
        diagnostics::residue_snapshot(&self.world, site)
    }

    pub fn residue_intensity(&self, site: &ResidueSite, disease: &DiseaseId) -> f32 {
        self.world.resource::<ResidueStore>().intensity(site, disease)
    }

    /// Take every effect emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<DiseaseEvent> {
        self.world.resource_mut::<DiseaseEvents>().drain()
    }
}
