//! Simulation Scheduler
//!
//! Wakes each carrier on its own cadence. A carrier's next tick time is set
//! before it is processed, so nothing done during processing can make it due
//! again in the same frame.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;

use contagion_events::{CureEffect, DiseaseId};

use crate::components::{BodyTemperature, CarrierState, Dead, Reagents, Resting, SimClock};
use crate::config::SimConfig;
use crate::events::DiseaseEvents;
use crate::infection::apply_cure_effect;
use crate::registry::DiseaseRegistry;
use crate::systems::airborne::PendingBursts;
use crate::systems::cure::{apply_cures, BodyView};
use crate::systems::progression::progress_carrier;
use crate::{RandomSource, SimRng};

/// Resource: carriers whose tick came due this frame
#[derive(Resource, Debug, Default)]
pub struct DueCarriers {
    pub entities: Vec<Entity>,
}

impl DueCarriers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

/// Everything the per-carrier engines need while one carrier is processed
pub struct TickContext<'a> {
    pub actor: Entity,
    pub now: f64,
    pub registry: &'a DiseaseRegistry,
    pub rng: &'a mut dyn RandomSource,
    pub events: &'a mut DiseaseEvents,
    pub bursts: &'a mut PendingBursts,
}

/// System: Record due carriers and push their next tick forward
pub fn collect_due_carriers(
    clock: Res<SimClock>,
    mut due: ResMut<DueCarriers>,
    mut carriers: Query<(Entity, &mut CarrierState)>,
) {
    due.entities.clear();
    for (entity, mut carrier) in carriers.iter_mut() {
        if !carrier.has_infections() || !carrier.is_due(clock.now) {
            continue;
        }
        carrier.bypass_change_detection().schedule_next(clock.now);
        due.entities.push(entity);
    }
}

/// System: Run progression then cures for every due carrier
pub fn tick_carriers(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    registry: Res<DiseaseRegistry>,
    due: Res<DueCarriers>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<DiseaseEvents>,
    mut bursts: ResMut<PendingBursts>,
    mut carriers: Query<(
        &mut CarrierState,
        Has<Dead>,
        Option<&Reagents>,
        Option<&BodyTemperature>,
        Has<Resting>,
    )>,
) {
    for &entity in &due.entities {
        let Ok((mut carrier, dead, reagents, temperature, resting)) = carriers.get_mut(entity)
        else {
            continue;
        };

        let mut ctx = TickContext {
            actor: entity,
            now: clock.now,
            registry: &registry,
            rng: rng.source(),
            events: &mut events,
            bursts: &mut bursts,
        };

        let state = carrier.bypass_change_detection();
        let changed = if dead {
            shed_disease(state, config.carrier.dead_shed_rate, &mut ctx)
        } else {
            let body = BodyView {
                reagents,
                temperature,
                resting,
            };
            let progressed = progress_carrier(state, &mut ctx);
            let cured = apply_cures(state, &body, &mut ctx);
            progressed || cured
        };

        if changed {
            carrier.set_changed();
        }
    }
}

/// Dead carriers slowly lose one random disease at a time
fn shed_disease(carrier: &mut CarrierState, rate: f32, ctx: &mut TickContext) -> bool {
    let probability = rate * carrier.tick_interval as f32;
    if !ctx.rng.bernoulli(probability) {
        return false;
    }

    let diseases: Vec<DiseaseId> = carrier.active_infections.keys().cloned().collect();
    let Some(disease) = diseases.get(ctx.rng.pick(diseases.len())) else {
        return false;
    };

    match ctx.registry.lookup(disease) {
        Some(definition) => {
            let actor = crate::actor_id(ctx.actor);
            if let Some(event) =
                apply_cure_effect(carrier, actor, definition, CureEffect::Clear, ctx.now)
            {
                tracing::debug!(actor = %actor, disease = %disease, "dead carrier shed disease");
                ctx.events.push(event);
            }
        }
        None => {
            carrier.clear(disease);
        }
    }
    true
}
