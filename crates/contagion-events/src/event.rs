//! Event Types
//!
//! Outbound, fire-and-forget effects emitted by the simulation core.
//! Every successful trial produces exactly one event.

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, DiseaseId, SymptomId};

/// How loudly a sensation should be presented to the carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensationKind {
    #[default]
    Small,
    Medium,
    Large,
}

/// Effect applied by a cure step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CureEffect {
    /// Lower the disease stage by one (clears the disease at stage 1)
    LowerStage,
    /// Remove the disease entirely
    Clear,
}

/// Channel through which an infection arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfectionVector {
    Airborne,
    Contact,
    Residue,
    /// Added directly, bypassing the attempt primitive
    Direct,
}

/// A single outbound effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiseaseEvent {
    /// Informational message shown to the carrier
    Sensation {
        time: f64,
        actor: ActorId,
        disease: DiseaseId,
        text: String,
        kind: SensationKind,
    },
    /// A mechanical symptom fired
    Symptom {
        time: f64,
        actor: ActorId,
        disease: DiseaseId,
        symptom: SymptomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A cure step (or generic cure) applied
    Cured {
        time: f64,
        actor: ActorId,
        disease: DiseaseId,
        effect: CureEffect,
        /// Stage after the effect; `None` once cleared
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remaining_stage: Option<u32>,
    },
    /// A new infection took hold
    Infected {
        time: f64,
        actor: ActorId,
        disease: DiseaseId,
        stage: u32,
        vector: InfectionVector,
    },
    /// A carrier left residue behind
    ResidueDeposited {
        time: f64,
        actor: ActorId,
        disease: DiseaseId,
        intensity: f32,
    },
}

impl DiseaseEvent {
    /// Actor this event concerns
    pub fn actor(&self) -> ActorId {
        match self {
            DiseaseEvent::Sensation { actor, .. }
            | DiseaseEvent::Symptom { actor, .. }
            | DiseaseEvent::Cured { actor, .. }
            | DiseaseEvent::Infected { actor, .. }
            | DiseaseEvent::ResidueDeposited { actor, .. } => *actor,
        }
    }

    /// Disease this event concerns
    pub fn disease(&self) -> &DiseaseId {
        match self {
            DiseaseEvent::Sensation { disease, .. }
            | DiseaseEvent::Symptom { disease, .. }
            | DiseaseEvent::Cured { disease, .. }
            | DiseaseEvent::Infected { disease, .. }
            | DiseaseEvent::ResidueDeposited { disease, .. } => disease,
        }
    }

    /// Short name used for stats bucketing
    pub fn kind_name(&self) -> &'static str {
        match self {
            DiseaseEvent::Sensation { .. } => "sensation",
            DiseaseEvent::Symptom { .. } => "symptom",
            DiseaseEvent::Cured { .. } => "cured",
            DiseaseEvent::Infected { .. } => "infected",
            DiseaseEvent::ResidueDeposited { .. } => "residue_deposited",
        }
    }
}
