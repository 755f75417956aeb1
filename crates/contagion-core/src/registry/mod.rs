//! Disease Registry
//!
//! Immutable, validated table of disease and symptom definitions. Built once
//! at load time and shared by every system through a cheap-to-clone handle.
//! Lookups return `Option`; callers drop or skip on a miss.

mod loader;

pub use loader::RegistryError;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use contagion_events::{CureEffect, DiseaseId, SensationKind, SymptomId};

fn default_one() -> f32 {
    1.0
}

/// Channel a disease can travel through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadVector {
    Airborne,
    Contact,
}

/// Informational message a stage can show its carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensationEntry {
    pub text: String,
    pub probability: f32,
    #[serde(default)]
    pub kind: SensationKind,
}

/// Symptom reference within a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSymptom {
    pub symptom: SymptomId,
    /// Overrides the symptom's default probability
    #[serde(default)]
    pub probability: Option<f32>,
}

/// Condition under which a cure step applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CureCondition {
    /// Seconds since the infection took hold
    Elapsed { seconds: f64 },
    /// Seconds spent in the current stage
    TimeInStage { seconds: f64 },
    /// Reagent present in the bloodstream
    Reagent { reagent: String, min_amount: f32 },
    /// Body temperature inside the given bounds
    BodyTemperature {
        #[serde(default)]
        min: Option<f32>,
        #[serde(default)]
        max: Option<f32>,
    },
    /// Carrier is lying down or asleep
    Resting,
}

/// Condition and effect pair that can lower or clear a disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CureStep {
    pub condition: CureCondition,
    /// Chance the step applies once its condition holds
    #[serde(default = "default_one")]
    pub chance: f32,
    pub effect: CureEffect,
}

impl CureStep {
    pub fn new(condition: CureCondition, effect: CureEffect) -> Self {
        Self {
            condition,
            chance: 1.0,
            effect,
        }
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.chance = chance;
        self
    }
}

/// One severity level of a disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub stage: u32,
    #[serde(default)]
    pub sensations: Vec<SensationEntry>,
    #[serde(default)]
    pub symptoms: Vec<StageSymptom>,
    #[serde(default)]
    pub cure_steps: Vec<CureStep>,
}

impl StageDefinition {
    pub fn new(stage: u32) -> Self {
        Self {
            stage,
            sensations: Vec::new(),
            symptoms: Vec::new(),
            cure_steps: Vec::new(),
        }
    }
}

/// Immediate airborne spread triggered by a symptom such as a sneeze
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirborneBurst {
    pub range: f32,
    pub chance: f32,
}

/// A mechanical effect a stage can trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomDefinition {
    pub id: SymptomId,
    #[serde(default)]
    pub default_probability: f32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub burst: Option<AirborneBurst>,
}

impl SymptomDefinition {
    pub fn new(id: impl Into<SymptomId>, default_probability: f32) -> Self {
        Self {
            id: id.into(),
            default_probability,
            message: None,
            burst: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_burst(mut self, range: f32, chance: f32) -> Self {
        self.burst = Some(AirborneBurst { range, chance });
        self
    }
}

/// Complete definition of one disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDefinition {
    pub id: DiseaseId,
    #[serde(default)]
    pub name: String,
    pub stages: Vec<StageDefinition>,
    #[serde(default)]
    pub stage_advance_probability: f32,
    #[serde(default)]
    pub incubation_seconds: f64,
    #[serde(default)]
    pub spread_vectors: Vec<SpreadVector>,
    #[serde(default)]
    pub airborne_range: f32,
    #[serde(default)]
    pub airborne_tick_chance: f32,
    #[serde(default)]
    pub airborne_infect_chance: f32,
    #[serde(default)]
    pub contact_infect_chance: f32,
    #[serde(default)]
    pub contact_deposit_amount: f32,
    /// How much worn protection mitigates this disease
    #[serde(default = "default_one")]
    pub permeability_modifier: f32,
    /// Used when the current stage defines no cure steps of its own
    #[serde(default)]
    pub cure_steps: Vec<CureStep>,
    /// Subtracted from generic cure attempts
    #[serde(default)]
    pub cure_resist: f32,
    /// Immunity granted once the disease is cleared
    #[serde(default = "default_one")]
    pub post_cure_immunity: f32,
}

impl DiseaseDefinition {
    /// A disease with `stages` empty stages and no spread or cures
    pub fn new(id: impl Into<DiseaseId>, stages: u32) -> Self {
        let id = id.into();
        Self {
            name: id.0.clone(),
            id,
            stages: (1..=stages).map(StageDefinition::new).collect(),
            stage_advance_probability: 0.0,
            incubation_seconds: 0.0,
            spread_vectors: Vec::new(),
            airborne_range: 0.0,
            airborne_tick_chance: 0.0,
            airborne_infect_chance: 0.0,
            contact_infect_chance: 0.0,
            contact_deposit_amount: 0.0,
            permeability_modifier: 1.0,
            cure_steps: Vec::new(),
            cure_resist: 0.0,
            post_cure_immunity: 1.0,
        }
    }

    pub fn with_advance_probability(mut self, probability: f32) -> Self {
        self.stage_advance_probability = probability;
        self
    }

    pub fn with_incubation(mut self, seconds: f64) -> Self {
        self.incubation_seconds = seconds;
        self
    }

    pub fn airborne(mut self, range: f32, tick_chance: f32, infect_chance: f32) -> Self {
        self.add_vector(SpreadVector::Airborne);
        self.airborne_range = range;
        self.airborne_tick_chance = tick_chance;
        self.airborne_infect_chance = infect_chance;
        self
    }

    pub fn contact(mut self, infect_chance: f32, deposit_amount: f32) -> Self {
        self.add_vector(SpreadVector::Contact);
        self.contact_infect_chance = infect_chance;
        self.contact_deposit_amount = deposit_amount;
        self
    }

    pub fn with_permeability(mut self, modifier: f32) -> Self {
        self.permeability_modifier = modifier;
        self
    }

    pub fn with_cure_resist(mut self, resist: f32) -> Self {
        self.cure_resist = resist;
        self
    }

    pub fn with_post_cure_immunity(mut self, immunity: f32) -> Self {
        self.post_cure_immunity = immunity;
        self
    }

    /// Add a symptom to a stage; `probability` overrides the symptom default
    pub fn with_stage_symptom(
        mut self,
        stage: u32,
        symptom: impl Into<SymptomId>,
        probability: Option<f32>,
    ) -> Self {
        if let Some(definition) = self.stage_mut(stage) {
            definition.symptoms.push(StageSymptom {
                symptom: symptom.into(),
                probability,
            });
        }
        self
    }

    pub fn with_sensation(
        mut self,
        stage: u32,
        text: impl Into<String>,
        probability: f32,
        kind: SensationKind,
    ) -> Self {
        if let Some(definition) = self.stage_mut(stage) {
            definition.sensations.push(SensationEntry {
                text: text.into(),
                probability,
                kind,
            });
        }
        self
    }

    /// Add a cure step to a stage, or to the fallback list when `stage` is `None`
    pub fn with_cure_step(mut self, stage: Option<u32>, step: CureStep) -> Self {
        match stage {
            Some(number) => {
                if let Some(definition) = self.stage_mut(number) {
                    definition.cure_steps.push(step);
                }
            }
            None => self.cure_steps.push(step),
        }
        self
    }

    fn add_vector(&mut self, vector: SpreadVector) {
        if !self.spread_vectors.contains(&vector) {
            self.spread_vectors.push(vector);
        }
    }

    fn stage_mut(&mut self, stage: u32) -> Option<&mut StageDefinition> {
        self.stages.iter_mut().find(|s| s.stage == stage)
    }

    pub fn spreads_by(&self, vector: SpreadVector) -> bool {
        self.spread_vectors.contains(&vector)
    }

    /// Highest defined stage number
    pub fn max_stage(&self) -> u32 {
        self.stages.last().map(|s| s.stage).unwrap_or(0)
    }

    pub fn stage(&self, stage: u32) -> Option<&StageDefinition> {
        // Stages are contiguous from 1 after validation
        let index = usize::try_from(stage.checked_sub(1)?).ok()?;
        self.stages.get(index).filter(|s| s.stage == stage)
    }

    /// Cure steps for a stage, falling back to the disease-level list
    pub fn cure_steps_for(&self, stage: u32) -> &[CureStep] {
        match self.stage(stage) {
            Some(definition) if !definition.cure_steps.is_empty() => &definition.cure_steps,
            _ => &self.cure_steps,
        }
    }
}

#[derive(Debug, Default)]
struct RegistryData {
    diseases: BTreeMap<DiseaseId, DiseaseDefinition>,
    symptoms: BTreeMap<SymptomId, SymptomDefinition>,
}

/// Resource: shared handle to the validated definitions
#[derive(Resource, Debug, Clone, Default)]
pub struct DiseaseRegistry {
    inner: Arc<RegistryData>,
}

impl DiseaseRegistry {
    /// Validate and index definitions. Probabilities are clamped; structural
    /// problems are errors.
    pub fn from_definitions(
        diseases: Vec<DiseaseDefinition>,
        symptoms: Vec<SymptomDefinition>,
    ) -> Result<Self, RegistryError> {
        let data = loader::build(diseases, symptoms)?;
        Ok(Self {
            inner: Arc::new(data),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file = loader::parse(content)?;
        Self::from_definitions(file.diseases, file.symptoms)
    }

    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn lookup(&self, disease: &DiseaseId) -> Option<&DiseaseDefinition> {
        self.inner.diseases.get(disease)
    }

    pub fn symptom(&self, symptom: &SymptomId) -> Option<&SymptomDefinition> {
        self.inner.symptoms.get(symptom)
    }

    pub fn contains(&self, disease: &DiseaseId) -> bool {
        self.inner.diseases.contains_key(disease)
    }

    pub fn disease_ids(&self) -> impl Iterator<Item = &DiseaseId> {
        self.inner.diseases.keys()
    }

    pub fn len(&self) -> usize {
        self.inner.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.diseases.is_empty()
    }
}
