//! Contagion Simulation Core
//!
//! Per-actor disease progression and spread on top of `bevy_ecs`.
//!
//! # Architecture
//!
//! - **Registry**: immutable disease and symptom definitions loaded once at startup
//! - **Components**: carrier state, positions, equipment and body chemistry on actor entities
//! - **Resources**: clock, residue store, spatial index, seeded random source, outbound events
//! - **Systems**: scheduler, progression, cure, airborne and contact spread, residue decay
//!
//! Event-driven contact (melee hits, touching contaminated objects) enters
//! through the plain functions in [`interactions`]; the core has no
//! subscription mechanism of its own.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod infection;
pub mod interactions;
pub mod output;
pub mod protection;
pub mod registry;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::SimConfig;
pub use engine::Simulation;
pub use infection::InfectOutcome;
pub use registry::{DiseaseDefinition, DiseaseRegistry, RegistryError, SymptomDefinition};

pub use contagion_events::{
    ActorId, CarrierSnapshot, CureEffect, DiseaseEvent, DiseaseId, InfectionVector,
    SensationKind, SymptomId,
};

/// Source of the independent trials every probabilistic decision draws from.
///
/// Injected through [`SimRng`] so that scenarios can be replayed from a seed
/// or driven by a scripted source in tests.
pub trait RandomSource: Send + Sync {
    /// One Bernoulli trial. Probabilities at or below 0 never succeed and at
    /// or above 1 always succeed, without consuming randomness.
    fn bernoulli(&mut self, probability: f32) -> bool;

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    fn pick(&mut self, len: usize) -> usize;
}

impl RandomSource for SmallRng {
    fn bernoulli(&mut self, probability: f32) -> bool {
        // NaN falls through to false here
        if !(probability > 0.0) {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.gen_bool(f64::from(probability))
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.gen_range(0..len)
    }
}

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub Box<dyn RandomSource>);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Box::new(SmallRng::seed_from_u64(seed)))
    }

    pub fn from_source(source: impl RandomSource + 'static) -> Self {
        Self(Box::new(source))
    }

    pub fn source(&mut self) -> &mut dyn RandomSource {
        self.0.as_mut()
    }
}

/// Converts an entity handle into the id used in outbound events.
pub fn actor_id(entity: Entity) -> ActorId {
    ActorId(entity.to_bits())
}

/// Resolves an outbound actor id back into an entity handle.
pub fn entity_of(actor: ActorId) -> Option<Entity> {
    Entity::try_from_bits(actor.0).ok()
}
