//! Contact Spread Engine
//!
//! Per-tick passive adjacency spread and residue deposit for due carriers.
//! Event-driven direct contact lives in [`crate::interactions`].

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;

use contagion_events::{DiseaseEvent, InfectionVector};

use crate::components::{
    CarrierState, Dead, Equipment, Obstructions, ResidueSite, ResidueStore, SimClock,
};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::{expose, Exposure};
use crate::protection;
use crate::registry::{DiseaseRegistry, SpreadVector};
use crate::systems::scheduler::DueCarriers;
use crate::systems::spatial::SpatialIndex;
use crate::SimRng;

/// System: Adjacency spread and residue deposit from due carriers
pub fn contact_spread(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    registry: Res<DiseaseRegistry>,
    index: Res<SpatialIndex>,
    obstructions: Res<Obstructions>,
    due: Res<DueCarriers>,
    mut residue: ResMut<ResidueStore>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<DiseaseEvents>,
    mut carriers: Query<(&mut CarrierState, Option<&Equipment>, Has<Dead>)>,
) {
    let now = clock.now;
    let radius = config.contact.adjacency_radius;
    let mut exposures = Vec::new();

    for &source in &due.entities {
        let Ok((carrier, equipment, _)) = carriers.get(source) else {
            continue;
        };
        let position = index.position(source);

        for disease in carrier.active_infections.keys() {
            if carrier.is_incubating(disease, now) {
                continue;
            }
            let Some(definition) = registry.lookup(disease) else {
                continue;
            };
            if !definition.spreads_by(SpreadVector::Contact) {
                continue;
            }

            if let Some(position) = position {
                let amount =
                    definition.contact_deposit_amount * protection::deposit_factor(equipment, definition);
                if amount > 0.0 {
                    let intensity =
                        residue.deposit(ResidueSite::Tile(position.tile()), disease.clone(), amount);
                    events.push(DiseaseEvent::ResidueDeposited {
                        time: now,
                        actor: crate::actor_id(source),
                        disease: disease.clone(),
                        intensity,
                    });
                }
            }

            for target in index.visible_from(source, radius, &obstructions) {
                let Ok((_, target_equipment, _)) = carriers.get(target) else {
                    continue;
                };
                exposures.push(Exposure {
                    target,
                    disease: disease.clone(),
                    chance: definition.contact_infect_chance
                        * protection::contact_factor(target_equipment, definition),
                    vector: InfectionVector::Contact,
                });
            }
        }
    }

    for exposure in exposures {
        let Ok((mut carrier, _, dead)) = carriers.get_mut(exposure.target) else {
            continue;
        };
        let outcome = expose(
            &exposure,
            carrier.bypass_change_detection(),
            !dead,
            &registry,
            now,
            rng.source(),
            &mut events,
        );
        if outcome.is_infected() {
            carrier.set_changed();
        }
    }
}
