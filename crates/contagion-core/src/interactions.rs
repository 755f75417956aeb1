//! Interaction Hooks
//!
//! Plain functions the surrounding game calls when something happens to an
//! actor: a melee hit, touching a contaminated object, speaking, a vaccine.
//! Each one resolves the actor's carrier state by handle and returns quietly
//! when the actor is not infectable.

use bevy_ecs::prelude::*;

use contagion_events::{DiseaseEvent, DiseaseId, InfectionVector, SymptomId};

use crate::components::{CarrierState, Dead, Equipment, ResidueSite, ResidueStore, SimClock};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::{self, expose, Exposure, InfectOutcome};
use crate::protection;
use crate::registry::{DiseaseRegistry, SpreadVector};
use crate::systems::airborne::{PendingBurst, PendingBursts};
use crate::systems::residue::{touch_residue, ResidueContact};
use crate::{RandomSource, SimRng};

fn now(world: &World) -> f64 {
    world.get_resource::<SimClock>().map(|c| c.now).unwrap_or(0.0)
}

fn is_alive(world: &World, actor: Entity) -> bool {
    world.get::<Dead>(actor).is_none()
}

/// Run `f` with the random source and event queue borrowed out of the world
fn with_effects<R>(
    world: &mut World,
    f: impl FnOnce(&mut World, &mut dyn RandomSource, &mut DiseaseEvents) -> R,
) -> Option<R> {
    if !world.contains_resource::<SimRng>() || !world.contains_resource::<DiseaseEvents>() {
        return None;
    }
    Some(world.resource_scope(|world, mut rng: Mut<SimRng>| {
        world.resource_scope(|world, mut events: Mut<DiseaseEvents>| {
            f(world, rng.source(), &mut events)
        })
    }))
}

/// Add a disease directly, bypassing chance and immunity
pub fn infect(
    world: &mut World,
    actor: Entity,
    disease: &DiseaseId,
    start_stage: u32,
) -> InfectOutcome {
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return InfectOutcome::Rejected;
    };
    let now = now(world);
    let Some(mut carrier) = world.get_mut::<CarrierState>(actor) else {
        return InfectOutcome::Rejected;
    };

    let outcome = infection::infect(&mut carrier, &registry, disease, start_stage, now);
    if let InfectOutcome::Infected { stage } = outcome {
        if let Some(mut events) = world.get_resource_mut::<DiseaseEvents>() {
            events.push(DiseaseEvent::Infected {
                time: now,
                actor: crate::actor_id(actor),
                disease: disease.clone(),
                stage,
                vector: InfectionVector::Direct,
            });
        }
    }
    outcome
}

/// Chance-gated infection attempt with the immunity trial
pub fn try_infect_with_chance(
    world: &mut World,
    actor: Entity,
    disease: &DiseaseId,
    chance: f32,
) -> InfectOutcome {
    let exposure = Exposure {
        target: actor,
        disease: disease.clone(),
        chance,
        vector: InfectionVector::Direct,
    };
    apply_exposures(world, vec![exposure])
        .into_iter()
        .next()
        .unwrap_or(InfectOutcome::Rejected)
}

fn apply_exposures(world: &mut World, exposures: Vec<Exposure>) -> Vec<InfectOutcome> {
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return Vec::new();
    };
    let now = now(world);

    with_effects(world, |world, rng, events| {
        exposures
            .iter()
            .map(|exposure| {
                let alive = is_alive(world, exposure.target);
                match world.get_mut::<CarrierState>(exposure.target) {
                    Some(mut carrier) => {
                        expose(exposure, &mut carrier, alive, &registry, now, rng, events)
                    }
                    None => InfectOutcome::Rejected,
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Contact-spreading diseases `source` can pass on by touch
fn contact_exposures(
    world: &World,
    registry: &DiseaseRegistry,
    source: Entity,
    target: Entity,
) -> Vec<Exposure> {
    let now = now(world);
    let Some(carrier) = world.get::<CarrierState>(source) else {
        return Vec::new();
    };
    let equipment = world.get::<Equipment>(target);

    carrier
        .active_infections
        .keys()
        .filter(|disease| !carrier.is_incubating(disease, now))
        .filter_map(|disease| registry.lookup(disease))
        .filter(|definition| definition.spreads_by(SpreadVector::Contact))
        .map(|definition| Exposure {
            target,
            disease: definition.id.clone(),
            chance: definition.contact_infect_chance
                * protection::contact_factor(equipment, definition),
            vector: InfectionVector::Contact,
        })
        .collect()
}

/// Direct contact between two actors (a hit, an item used on someone).
/// Spreads both ways at full intensity; both directions are decided from the
/// state before the contact.
pub fn on_direct_contact(world: &mut World, a: Entity, b: Entity) -> Vec<InfectOutcome> {
    if a == b {
        return Vec::new();
    }
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return Vec::new();
    };
    let mut exposures = contact_exposures(world, &registry, a, b);
    exposures.extend(contact_exposures(world, &registry, b, a));
    apply_exposures(world, exposures)
}

/// An actor touched a contaminated tile or object
pub fn on_residue_contact(world: &mut World, actor: Entity, site: ResidueSite) -> bool {
    if !world.contains_resource::<ResidueStore>() {
        return false;
    }
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return false;
    };
    let consumption = world
        .get_resource::<SimConfig>()
        .map(|c| c.contact.residue_contact_consumption)
        .unwrap_or_default();
    let now = now(world);
    let alive = is_alive(world, actor);
    let equipment = world.get::<Equipment>(actor).cloned();

    with_effects(world, |world, rng, events| {
        world.resource_scope(|world, mut store: Mut<ResidueStore>| {
            let Some(mut carrier) = world.get_mut::<CarrierState>(actor) else {
                return false;
            };
            let contact = ResidueContact {
                site,
                actor,
                alive,
                equipment: equipment.as_ref(),
                consumption,
            };
            touch_residue(contact, &mut carrier, &mut store, &registry, now, rng, events)
        })
    })
    .unwrap_or(false)
}

/// The actor spoke: one random airborne disease they carry gets a short burst
pub fn on_actor_spoke(world: &mut World, actor: Entity) -> bool {
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return false;
    };
    let Some(config) = world.get_resource::<SimConfig>() else {
        return false;
    };
    let (range, chance) = (
        config.airborne.speech_burst_range,
        config.airborne.speech_burst_chance,
    );
    let now = now(world);
    let Some(carrier) = world.get::<CarrierState>(actor) else {
        return false;
    };

    let candidates: Vec<DiseaseId> = carrier
        .active_infections
        .keys()
        .filter(|disease| !carrier.is_incubating(disease, now))
        .filter(|disease| {
            registry
                .lookup(disease)
                .map(|d| d.spreads_by(SpreadVector::Airborne))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    if candidates.is_empty() {
        return false;
    }

    with_effects(world, |world, rng, _| {
        let disease = candidates[rng.pick(candidates.len()).min(candidates.len() - 1)].clone();
        match world.get_resource_mut::<PendingBursts>() {
            Some(mut bursts) => {
                bursts.push(PendingBurst {
                    source: actor,
                    disease,
                    range,
                    chance,
                });
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Grant full immunity to a disease the actor does not currently have
pub fn vaccinate(world: &mut World, actor: Entity, disease: &DiseaseId) -> bool {
    let known = world
        .get_resource::<DiseaseRegistry>()
        .map(|r| r.contains(disease))
        .unwrap_or(false);
    if !known {
        return false;
    }
    world
        .get_mut::<CarrierState>(actor)
        .map(|mut carrier| infection::vaccinate(&mut carrier, disease))
        .unwrap_or(false)
}

/// Generic cure attempt (a medicine that helps against anything)
pub fn try_cure_any(world: &mut World, actor: Entity, cure_chance: f32) -> bool {
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return false;
    };
    let now = now(world);

    with_effects(world, |world, rng, events| {
        let Some(mut carrier) = world.get_mut::<CarrierState>(actor) else {
            return false;
        };
        let event = infection::try_cure_any(
            &mut carrier,
            crate::actor_id(actor),
            &registry,
            cure_chance,
            now,
            rng,
        );
        match event {
            Some(event) => {
                events.push(event);
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Clear every disease the actor carries. Returns how many were cleared.
pub fn cure_all(world: &mut World, actor: Entity) -> usize {
    let Some(registry) = world.get_resource::<DiseaseRegistry>().cloned() else {
        return 0;
    };
    let now = now(world);
    let Some(mut carrier) = world.get_mut::<CarrierState>(actor) else {
        return 0;
    };
    let cleared = infection::cure_all(&mut carrier, crate::actor_id(actor), &registry, now);
    let count = cleared.len();
    if let Some(mut events) = world.get_resource_mut::<DiseaseEvents>() {
        for event in cleared {
            events.push(event);
        }
    }
    count
}

/// Temporarily stop a symptom from firing
pub fn suppress_symptom(world: &mut World, actor: Entity, symptom: SymptomId, seconds: f64) -> bool {
    let now = now(world);
    match world.get_mut::<CarrierState>(actor) {
        Some(mut carrier) => {
            carrier.suppress(symptom, now + seconds.max(0.0));
            true
        }
        None => false,
    }
}

/// Rescale how often the actor's infections tick
pub fn set_metabolic_multiplier(world: &mut World, actor: Entity, multiplier: f64) -> bool {
    match world.get_mut::<CarrierState>(actor) {
        Some(mut carrier) => {
            carrier.set_metabolic_multiplier(multiplier);
            true
        }
        None => false,
    }
}
