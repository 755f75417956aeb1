//! Airborne Spread Engine
//!
//! Broadcast infection attempts from due carriers to everyone in range with a
//! clear line of sight. Runs on a single shared timer; symptom and speech
//! bursts queued in between are processed every frame.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;
use std::collections::BTreeSet;

use contagion_events::{DiseaseId, InfectionVector};

use crate::components::{CarrierState, Dead, Equipment, Obstructions, SimClock};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::{expose, Exposure};
use crate::protection;
use crate::registry::{DiseaseRegistry, SpreadVector};
use crate::systems::scheduler::DueCarriers;
use crate::systems::spatial::SpatialIndex;
use crate::SimRng;

/// Resource: shared cadence of the airborne engine.
///
/// Carriers that came due since the timer last fired wait here, so a carrier
/// whose tick phase differs from the timer's still gets its turn.
#[derive(Resource, Debug, Clone)]
pub struct AirborneTimer {
    interval: f64,
    remaining: f64,
    waiting: BTreeSet<Entity>,
}

impl AirborneTimer {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            remaining: interval,
            waiting: BTreeSet::new(),
        }
    }

    /// Remember carriers that ticked this frame until the next firing
    pub fn note_due(&mut self, carriers: impl IntoIterator<Item = Entity>) {
        self.waiting.extend(carriers);
    }

    /// Carriers due since the last firing, in entity order
    pub fn take_waiting(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.waiting).into_iter().collect()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Advance by `delta` seconds. Returns true when the engine should run;
    /// fires at most once per call.
    pub fn tick(&mut self, delta: f64) -> bool {
        if self.interval <= 0.0 || !self.interval.is_finite() {
            return true;
        }
        self.remaining -= delta;
        if self.remaining > 0.0 {
            return false;
        }
        let missed = (-self.remaining / self.interval).floor();
        self.remaining += self.interval * (missed + 1.0);
        true
    }
}

/// A one-off airborne emission, e.g. a sneeze or speech
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBurst {
    pub source: Entity,
    pub disease: DiseaseId,
    pub range: f32,
    pub chance: f32,
}

/// Resource: Queue of bursts to process
#[derive(Resource, Debug, Default)]
pub struct PendingBursts {
    pub bursts: Vec<PendingBurst>,
}

impl PendingBursts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, burst: PendingBurst) {
        self.bursts.push(burst);
    }

    pub fn drain(&mut self) -> Vec<PendingBurst> {
        std::mem::take(&mut self.bursts)
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }
}

/// Whether `source` can currently breathe `disease` out
fn can_emit(
    carrier: &CarrierState,
    dead: bool,
    equipment: Option<&Equipment>,
    disease: &DiseaseId,
    now: f64,
) -> bool {
    !dead
        && carrier.is_active(disease)
        && !carrier.is_incubating(disease, now)
        && !protection::blocks_emission(equipment)
}

/// System: Periodic airborne spread plus queued bursts
pub fn airborne_spread(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    registry: Res<DiseaseRegistry>,
    index: Res<SpatialIndex>,
    obstructions: Res<Obstructions>,
    due: Res<DueCarriers>,
    mut timer: ResMut<AirborneTimer>,
    mut bursts: ResMut<PendingBursts>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<DiseaseEvents>,
    mut carriers: Query<(&mut CarrierState, Option<&Equipment>, Has<Dead>)>,
) {
    let now = clock.now;
    let mut exposures = Vec::new();

    // Read every source before any target is touched
    timer.note_due(due.entities.iter().copied());
    if timer.tick(clock.delta) {
        for source in timer.take_waiting() {
            let Ok((carrier, equipment, dead)) = carriers.get(source) else {
                continue;
            };
            for disease in carrier.active_infections.keys() {
                if !can_emit(carrier, dead, equipment, disease, now) {
                    continue;
                }
                let Some(definition) = registry.lookup(disease) else {
                    continue;
                };
                if !definition.spreads_by(SpreadVector::Airborne) {
                    continue;
                }
                if !rng.source().bernoulli(definition.airborne_tick_chance) {
                    continue;
                }
                for target in index.visible_from(source, definition.airborne_range, &obstructions) {
                    let Ok((_, target_equipment, _)) = carriers.get(target) else {
                        continue;
                    };
                    let factor =
                        protection::airborne_factor(target_equipment, definition, &config.protection);
                    exposures.push(Exposure {
                        target,
                        disease: disease.clone(),
                        chance: definition.airborne_infect_chance * factor,
                        vector: InfectionVector::Airborne,
                    });
                }
            }
        }
    }

    for burst in bursts.drain() {
        let Ok((carrier, equipment, dead)) = carriers.get(burst.source) else {
            continue;
        };
        if !can_emit(carrier, dead, equipment, &burst.disease, now) {
            continue;
        }
        let Some(definition) = registry.lookup(&burst.disease) else {
            continue;
        };
        for target in index.visible_from(burst.source, burst.range, &obstructions) {
            let Ok((_, target_equipment, _)) = carriers.get(target) else {
                continue;
            };
            let factor = protection::airborne_factor(target_equipment, definition, &config.protection);
            exposures.push(Exposure {
                target,
                disease: burst.disease.clone(),
                chance: burst.chance * factor,
                vector: InfectionVector::Airborne,
            });
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
