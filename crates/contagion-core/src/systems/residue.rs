//! Residue Systems
//!
//! Linear decay of every residue record and infection from touching
//! contaminated tiles and objects.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;

use contagion_events::InfectionVector;

use crate::components::{
    CarrierState, Dead, Equipment, Position, ResidueSite, ResidueStore, SimClock, TileTracker,
};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::{expose, Exposure};
use crate::protection;
use crate::registry::DiseaseRegistry;
use crate::{RandomSource, SimRng};

/// One actor touching one contaminated site
#[derive(Debug, Clone, Copy)]
pub struct ResidueContact<'a> {
    pub site: ResidueSite,
    pub actor: Entity,
    pub alive: bool,
    pub equipment: Option<&'a Equipment>,
    /// Intensity removed per disease touched
    pub consumption: f32,
}

/// Attempt infection from every disease present at the site, then use up
/// some of each. Returns true if the actor caught anything.
pub fn touch_residue(
    contact: ResidueContact,
    carrier: &mut CarrierState,
    store: &mut ResidueStore,
    registry: &DiseaseRegistry,
    now: f64,
    rng: &mut dyn RandomSource,
    events: &mut DiseaseEvents,
) -> bool {
    let present = store.intensities_at(&contact.site);
    let mut infected = false;

    for (disease, intensity) in present {
        if let Some(definition) = registry.lookup(&disease) {
            let factor = match contact.site {
                ResidueSite::Tile(_) => protection::deposit_factor(contact.equipment, definition),
                ResidueSite::Object(_) => {
                    protection::handled_residue_factor(contact.equipment, definition)
                }
            };
            let exposure = Exposure {
                target: contact.actor,
                disease: disease.clone(),
                chance: definition.contact_infect_chance * intensity * factor,
                vector: InfectionVector::Residue,
            };
            let outcome = expose(&exposure, carrier, contact.alive, registry, now, rng, events);
            infected |= outcome.is_infected();
        }
        store.consume(&contact.site, &disease, contact.consumption);
    }

    infected
}

/// System: Decay all residue by the frame's elapsed time
pub fn decay_residue(clock: Res<SimClock>, config: Res<SimConfig>, mut store: ResMut<ResidueStore>) {
    let amount = config.contact.residue_decay_per_second * clock.delta as f32;
    if amount > 0.0 && !store.is_empty() {
        store.decay(amount);
    }
}

/// System: Actors stepping onto a contaminated tile touch its residue
pub fn residue_step_contacts(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    registry: Res<DiseaseRegistry>,
    mut store: ResMut<ResidueStore>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<DiseaseEvents>,
    mut actors: Query<(
        Entity,
        &Position,
        &mut TileTracker,
        &mut CarrierState,
        Option<&Equipment>,
        Has<Dead>,
    )>,
) {
    for (entity, position, mut tracker, mut carrier, equipment, dead) in actors.iter_mut() {
        let tile = position.tile();
        if !tracker.step_to(tile) {
            continue;
        }
        let site = ResidueSite::Tile(tile);
        if store.get(&site).is_none() {
            continue;
        }

        let contact = ResidueContact {
            site,
            actor: entity,
            alive: !dead,
            equipment,
            consumption: config.contact.residue_contact_consumption,
        };
        let infected = touch_residue(
            contact,
            carrier.bypass_change_detection(),
            &mut store,
            &registry,
            clock.now,
            rng.source(),
            &mut events,
        );
        if infected {
            carrier.set_changed();
        }
    }
}
