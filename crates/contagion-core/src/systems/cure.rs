//! Cure Engine
//!
//! Evaluates data-defined cure steps against each active infection. At most
//! one step applies per disease per tick.

use contagion_events::DiseaseId;

use crate::components::{
    BodyTemperature, CarrierState, InfectionRecord, Reagents, NORMAL_BODY_TEMPERATURE,
};
use crate::infection::apply_cure_effect;
use crate::registry::CureCondition;
use crate::systems::scheduler::TickContext;

/// Read-only view of the body state cure conditions inspect
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyView<'a> {
    pub reagents: Option<&'a Reagents>,
    pub temperature: Option<&'a BodyTemperature>,
    pub resting: bool,
}

/// Whether a cure condition currently holds
pub fn condition_holds(
    condition: &CureCondition,
    record: &InfectionRecord,
    body: &BodyView,
    now: f64,
) -> bool {
    match condition {
        CureCondition::Elapsed { seconds } => now - record.infected_at >= *seconds,
        CureCondition::TimeInStage { seconds } => now - record.stage_since >= *seconds,
        CureCondition::Reagent {
            reagent,
            min_amount,
        } => {
            let amount = body.reagents.map(|r| r.amount(reagent)).unwrap_or(0.0);
            amount > 0.0 && amount >= *min_amount
        }
        CureCondition::BodyTemperature { min, max } => {
            let temperature = body
                .temperature
                .map(|t| t.0)
                .unwrap_or(NORMAL_BODY_TEMPERATURE);
            min.map_or(true, |m| temperature >= m) && max.map_or(true, |m| temperature <= m)
        }
        CureCondition::Resting => body.resting,
    }
}

/// Run one cure pass over a carrier. Returns true if anything was cured.
pub fn apply_cures(carrier: &mut CarrierState, body: &BodyView, ctx: &mut TickContext) -> bool {
    let registry = ctx.registry;
    let mut changed = false;

    let diseases: Vec<DiseaseId> = carrier.active_infections.keys().cloned().collect();
    for disease in diseases {
        let Some(definition) = registry.lookup(&disease) else {
            continue;
        };
        let Some(record) = carrier.active_infections.get(&disease).copied() else {
            continue;
        };

        for step in definition.cure_steps_for(record.stage) {
            if !condition_holds(&step.condition, &record, body, ctx.now) {
                continue;
            }
            if !ctx.rng.bernoulli(step.chance) {
                continue;
            }
            let actor = crate::actor_id(ctx.actor);
            if let Some(event) = apply_cure_effect(carrier, actor, definition, step.effect, ctx.now)
            {
                tracing::debug!(actor = %actor, disease = %disease, effect = ?step.effect, "cure step applied");
                ctx.events.push(event);
                changed = true;
            }
            break;
        }
    }

    changed
}
