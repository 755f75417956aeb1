//! Progression Engine
//!
//! Advances each active infection's stage, then evaluates the sensations and
//! symptoms of the resulting stage.

use contagion_events::{DiseaseEvent, DiseaseId};

use crate::components::CarrierState;
use crate::registry::{DiseaseDefinition, SpreadVector, StageDefinition};
use crate::systems::airborne::PendingBurst;
use crate::systems::scheduler::TickContext;

/// Run one progression pass over a carrier. Returns true if the carrier's
/// state changed.
pub fn progress_carrier(carrier: &mut CarrierState, ctx: &mut TickContext) -> bool {
    let registry = ctx.registry;
    let mut changed = carrier.prune_expired(ctx.now);
    let mut corrupt = Vec::new();

    let diseases: Vec<DiseaseId> = carrier.active_infections.keys().cloned().collect();
    for disease in diseases {
        let Some(definition) = registry.lookup(&disease) else {
            corrupt.push(disease);
            continue;
        };
        if carrier.is_incubating(&disease, ctx.now) {
            continue;
        }
        let Some(record) = carrier.active_infections.get_mut(&disease) else {
            continue;
        };

        let max_stage = definition.max_stage();
        if ctx.rng.bernoulli(definition.stage_advance_probability) && record.stage < max_stage {
            record.set_stage(record.stage + 1, ctx.now);
            changed = true;
        }
        let stage = record.stage;

        if carrier.is_asymptomatic(&disease) {
            continue;
        }
        // Malformed stage data skips effects for this tick
        let Some(stage_definition) = definition.stage(stage) else {
            continue;
        };
        emit_sensation(&disease, stage_definition, ctx);
        emit_symptoms(carrier, definition, stage_definition, ctx);
    }

    for disease in corrupt {
        tracing::warn!(
            actor = %crate::actor_id(ctx.actor),
            disease = %disease,
            "dropping infection with unknown disease id"
        );
        carrier.clear(&disease);
        changed = true;
    }

    changed
}

/// At most one sensation per disease per tick: the first whose trial succeeds
fn emit_sensation(disease: &DiseaseId, stage: &StageDefinition, ctx: &mut TickContext) {
    for sensation in &stage.sensations {
        if ctx.rng.bernoulli(sensation.probability) {
            ctx.events.push(DiseaseEvent::Sensation {
                time: ctx.now,
                actor: crate::actor_id(ctx.actor),
                disease: disease.clone(),
                text: sensation.text.clone(),
                kind: sensation.kind,
            });
            break;
        }
    }
}

/// Every symptom whose trial succeeds fires
fn emit_symptoms(
    carrier: &CarrierState,
    definition: &DiseaseDefinition,
    stage: &StageDefinition,
    ctx: &mut TickContext,
) {
    let registry = ctx.registry;
    for entry in &stage.symptoms {
        if carrier.is_suppressed(&entry.symptom, ctx.now) {
            continue;
        }
        let Some(symptom) = registry.symptom(&entry.symptom) else {
            continue;
        };
        let probability = entry.probability.unwrap_or(symptom.default_probability);
        if !ctx.rng.bernoulli(probability) {
            continue;
        }

        ctx.events.push(DiseaseEvent::Symptom {
            time: ctx.now,
            actor: crate::actor_id(ctx.actor),
            disease: definition.id.clone(),
            symptom: entry.symptom.clone(),
            message: symptom.message.clone(),
        });

        if let Some(burst) = symptom.burst {
            if definition.spreads_by(SpreadVector::Airborne) {
                ctx.bursts.push(PendingBurst {
                    source: ctx.actor,
                    disease: definition.id.clone(),
                    range: burst.range,
                    chance: burst.chance,
                });
            }
        }
    }
}
