//! Infection Contract
//!
//! The primitives every vector funnels into: adding a disease to a carrier,
//! the chance-gated attempt with its independent immunity trial, and the
//! cure effects shared by cure steps and generic cure attempts.

use bevy_ecs::prelude::*;

use contagion_events::{ActorId, CureEffect, DiseaseEvent, DiseaseId, InfectionVector};

use crate::components::{CarrierState, InfectionRecord};
use crate::events::DiseaseEvents;
use crate::registry::{DiseaseDefinition, DiseaseRegistry};
use crate::RandomSource;

/// Result of an infection call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfectOutcome {
    /// The disease took hold at the given stage
    Infected { stage: u32 },
    /// The disease was already active; nothing changed
    AlreadyActive,
    /// The base chance trial failed
    Failed,
    /// Immunity blocked the infection
    Blocked,
    /// Target cannot be infected or the disease is unknown
    Rejected,
}

impl InfectOutcome {
    pub fn is_infected(&self) -> bool {
        matches!(self, InfectOutcome::Infected { .. })
    }
}

/// Add a disease to a carrier.
///
/// Re-exposure to an active disease is a no-op. The carrier's next tick is
/// always pulled to `now + tick_interval` when the disease is valid.
pub fn infect(
    carrier: &mut CarrierState,
    registry: &DiseaseRegistry,
    disease: &DiseaseId,
    start_stage: u32,
    now: f64,
) -> InfectOutcome {
    let Some(definition) = registry.lookup(disease) else {
        return InfectOutcome::Rejected;
    };

    let outcome = if carrier.is_active(disease) {
        InfectOutcome::AlreadyActive
    } else {
        let stage = start_stage.clamp(1, definition.max_stage().max(1));
        carrier
            .active_infections
            .insert(disease.clone(), InfectionRecord::new(stage, now));
        if definition.incubation_seconds > 0.0 {
            carrier
                .incubating_until
                .insert(disease.clone(), now + definition.incubation_seconds);
        }
        InfectOutcome::Infected { stage }
    };

    carrier.schedule_next(now);
    outcome
}

/// Chance-gated infection attempt.
///
/// Draws the base trial, then (when the carrier holds any immunity) an
/// independent immunity trial. The disease takes hold only when the base
/// trial succeeds and the immunity trial does not.
pub fn try_infect_with_chance(
    carrier: &mut CarrierState,
    alive: bool,
    registry: &DiseaseRegistry,
    disease: &DiseaseId,
    chance: f32,
    now: f64,
    rng: &mut dyn RandomSource,
) -> InfectOutcome {
    if !alive || !registry.contains(disease) {
        return InfectOutcome::Rejected;
    }

    let hit = rng.bernoulli(chance);
    let immunity = carrier.immunity_to(disease);
    let blocked = immunity > 0.0 && rng.bernoulli(immunity);

    if !hit {
        return InfectOutcome::Failed;
    }
    if blocked {
        return InfectOutcome::Blocked;
    }
    infect(carrier, registry, disease, 1, now)
}

/// A pending infection attempt collected by a spread engine
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub target: Entity,
    pub disease: DiseaseId,
    pub chance: f32,
    pub vector: InfectionVector,
}

/// Run an attempt and record the new infection, if any
pub fn expose(
    exposure: &Exposure,
    carrier: &mut CarrierState,
    alive: bool,
    registry: &DiseaseRegistry,
    now: f64,
    rng: &mut dyn RandomSource,
    events: &mut DiseaseEvents,
) -> InfectOutcome {
    let outcome = try_infect_with_chance(
        carrier,
        alive,
        registry,
        &exposure.disease,
        exposure.chance,
        now,
        rng,
    );
    if let InfectOutcome::Infected { stage } = outcome {
        tracing::debug!(
            target_actor = %crate::actor_id(exposure.target),
            disease = %exposure.disease,
            vector = ?exposure.vector,
            "infection spread"
        );
        events.push(DiseaseEvent::Infected {
            time: now,
            actor: crate::actor_id(exposure.target),
            disease: exposure.disease.clone(),
            stage,
            vector: exposure.vector,
        });
    }
    outcome
}

/// Apply a cure effect to an active disease.
///
/// Lowering stage 1 clears the disease. Clearing grants the disease's
/// post-cure immunity. Returns the outbound event, or `None` when the
/// disease was not active.
pub fn apply_cure_effect(
    carrier: &mut CarrierState,
    actor: ActorId,
    definition: &DiseaseDefinition,
    effect: CureEffect,
    now: f64,
) -> Option<DiseaseEvent> {
    let record = carrier.active_infections.get_mut(&definition.id)?;

    let remaining_stage = match effect {
        CureEffect::LowerStage if record.stage > 1 => {
            let lowered = record.stage - 1;
            record.set_stage(lowered, now);
            Some(lowered)
        }
        CureEffect::LowerStage | CureEffect::Clear => {
            carrier.clear(&definition.id);
            if definition.post_cure_immunity > 0.0 {
                carrier.raise_immunity(definition.id.clone(), definition.post_cure_immunity);
            }
            None
        }
    };

    Some(DiseaseEvent::Cured {
        time: now,
        actor,
        disease: definition.id.clone(),
        effect,
        remaining_stage,
    })
}

/// Grant full immunity unless the disease is already active
pub fn vaccinate(carrier: &mut CarrierState, disease: &DiseaseId) -> bool {
    if carrier.is_active(disease) {
        return false;
    }
    carrier.set_immunity(disease.clone(), 1.0);
    true
}

/// Generic cure attempt against every active disease.
///
/// The chance is split evenly across active diseases and reduced by each
/// disease's cure resistance. Stops after the first disease cleared.
pub fn try_cure_any(
    carrier: &mut CarrierState,
    actor: ActorId,
    registry: &DiseaseRegistry,
    cure_chance: f32,
    now: f64,
    rng: &mut dyn RandomSource,
) -> Option<DiseaseEvent> {
    let diseases: Vec<DiseaseId> = carrier.active_infections.keys().cloned().collect();
    if diseases.is_empty() {
        return None;
    }
    let share = cure_chance / diseases.len() as f32;

    for disease in diseases {
        let Some(definition) = registry.lookup(&disease) else {
            continue;
        };
        let probability = share - definition.cure_resist;
        if probability <= 0.0 {
            continue;
        }
        if rng.bernoulli(probability) {
            return apply_cure_effect(carrier, actor, definition, CureEffect::Clear, now);
        }
    }
    None
}

/// Clear every active disease
pub fn cure_all(
    carrier: &mut CarrierState,
    actor: ActorId,
    registry: &DiseaseRegistry,
    now: f64,
) -> Vec<DiseaseEvent> {
    let diseases: Vec<DiseaseId> = carrier.active_infections.keys().cloned().collect();
    let mut events = Vec::with_capacity(diseases.len());
    for disease in diseases {
        match registry.lookup(&disease) {
            Some(definition) => {
                events.extend(apply_cure_effect(
                    carrier,
                    actor,
                    definition,
                    CureEffect::Clear,
                    now,
                ));
            }
            None => {
                carrier.clear(&disease);
            }
        }
    }
    events
}
