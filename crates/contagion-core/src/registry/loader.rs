//! Registry loading and validation.
//!
//! Definitions are deserialized as-is, then sanitized: probabilities are
//! clamped into [0, 1] and amounts to >= 0. Anything that cannot be repaired
//! by clamping is a [`RegistryError`].

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use contagion_events::{DiseaseId, SymptomId};

use super::{CureCondition, CureStep, DiseaseDefinition, RegistryData, SymptomDefinition};

/// Errors that can occur while loading the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse registry: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("disease `{0}` is defined more than once")]
    DuplicateDisease(DiseaseId),
    #[error("symptom `{0}` is defined more than once")]
    DuplicateSymptom(SymptomId),
    #[error("disease `{0}` has no stages")]
    NoStages(DiseaseId),
    #[error("disease `{disease}` has stage {found}; stages must be numbered 1..={expected_max}")]
    NonContiguousStages {
        disease: DiseaseId,
        found: u32,
        expected_max: u32,
    },
    #[error("disease `{disease}` references unknown symptom `{symptom}`")]
    UnknownSymptom { disease: DiseaseId, symptom: SymptomId },
}

/// On-disk layout of a registry file
#[derive(Debug, Default, Deserialize)]
pub(super) struct RegistryFile {
    #[serde(default)]
    pub symptoms: Vec<SymptomDefinition>,
    #[serde(default)]
    pub diseases: Vec<DiseaseDefinition>,
}

pub(super) fn parse(content: &str) -> Result<RegistryFile, RegistryError> {
    Ok(toml::from_str(content)?)
}

pub(super) fn build(
    diseases: Vec<DiseaseDefinition>,
    symptoms: Vec<SymptomDefinition>,
) -> Result<RegistryData, RegistryError> {
    let mut symptom_table = BTreeMap::new();
    for mut symptom in symptoms {
        symptom.default_probability = clamp_unit(symptom.default_probability);
        if let Some(burst) = symptom.burst.as_mut() {
            burst.range = clamp_non_negative(burst.range);
            burst.chance = clamp_unit(burst.chance);
        }
        if symptom_table.contains_key(&symptom.id) {
            return Err(RegistryError::DuplicateSymptom(symptom.id));
        }
        symptom_table.insert(symptom.id.clone(), symptom);
    }

    let mut disease_table = BTreeMap::new();
    for disease in diseases {
        let disease = sanitize(disease, &symptom_table)?;
        if disease_table.contains_key(&disease.id) {
            return Err(RegistryError::DuplicateDisease(disease.id));
        }
        disease_table.insert(disease.id.clone(), disease);
    }

    tracing::debug!(
        diseases = disease_table.len(),
        symptoms = symptom_table.len(),
        "disease registry built"
    );

    Ok(RegistryData {
        diseases: disease_table,
        symptoms: symptom_table,
    })
}

fn sanitize(
    mut disease: DiseaseDefinition,
    symptoms: &BTreeMap<SymptomId, SymptomDefinition>,
) -> Result<DiseaseDefinition, RegistryError> {
    if disease.stages.is_empty() {
        return Err(RegistryError::NoStages(disease.id));
    }
    if disease.name.is_empty() {
        disease.name = disease.id.0.clone();
    }

    disease.stages.sort_by_key(|s| s.stage);
    let expected_max = disease.stages.len() as u32;
    for (index, stage) in disease.stages.iter().enumerate() {
        if stage.stage != index as u32 + 1 {
            return Err(RegistryError::NonContiguousStages {
                disease: disease.id.clone(),
                found: stage.stage,
                expected_max,
            });
        }
    }

    disease.stage_advance_probability = clamp_unit(disease.stage_advance_probability);
    disease.incubation_seconds = if disease.incubation_seconds.is_finite() {
        disease.incubation_seconds.max(0.0)
    } else {
        0.0
    };
    disease.airborne_range = clamp_non_negative(disease.airborne_range);
    disease.airborne_tick_chance = clamp_unit(disease.airborne_tick_chance);
    disease.airborne_infect_chance = clamp_unit(disease.airborne_infect_chance);
    disease.contact_infect_chance = clamp_unit(disease.contact_infect_chance);
    disease.contact_deposit_amount = clamp_unit(disease.contact_deposit_amount);
    disease.permeability_modifier = clamp_non_negative(disease.permeability_modifier);
    disease.cure_resist = clamp_unit(disease.cure_resist);
    disease.post_cure_immunity = clamp_unit(disease.post_cure_immunity);
    sanitize_steps(&mut disease.cure_steps);

    for stage in disease.stages.iter_mut() {
        for sensation in stage.sensations.iter_mut() {
            sensation.probability = clamp_unit(sensation.probability);
        }
        for entry in stage.symptoms.iter_mut() {
            if !symptoms.contains_key(&entry.symptom) {
                return Err(RegistryError::UnknownSymptom {
                    disease: disease.id.clone(),
                    symptom: entry.symptom.clone(),
                });
            }
            entry.probability = entry.probability.map(clamp_unit);
        }
        sanitize_steps(&mut stage.cure_steps);
    }

    Ok(disease)
}

fn sanitize_steps(steps: &mut [CureStep]) {
    for step in steps.iter_mut() {
        step.chance = clamp_unit(step.chance);
        match &mut step.condition {
            CureCondition::Elapsed { seconds } | CureCondition::TimeInStage { seconds } => {
                if !seconds.is_finite() || *seconds < 0.0 {
                    *seconds = 0.0;
                }
            }
            CureCondition::Reagent { min_amount, .. } => {
                *min_amount = clamp_non_negative(*min_amount);
            }
            CureCondition::BodyTemperature { .. } | CureCondition::Resting => {}
        }
    }
}

/// Clamp into [0, 1]; NaN becomes 0
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_non_negative(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}
