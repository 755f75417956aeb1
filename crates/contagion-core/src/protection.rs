//! Protection Model
//!
//! Stateless derating of infection chances from worn equipment. Each worn
//! item contributes `1 - protection * permeability`, clamped to [0, 1] per
//! item, and contributions multiply. Adding gear never raises a factor.

use crate::components::{Equipment, SlotCategory};
use crate::config::ProtectionConfig;
use crate::registry::DiseaseDefinition;

fn layer(factor: f32, protection: f32, permeability: f32) -> f32 {
    factor * clamp_factor(1.0 - protection * permeability)
}

fn slots_factor(
    equipment: Option<&Equipment>,
    slots: &[SlotCategory],
    disease: &DiseaseDefinition,
) -> f32 {
    let Some(equipment) = equipment else {
        return 1.0;
    };
    slots
        .iter()
        .filter_map(|slot| equipment.equipped(*slot))
        .fold(1.0, |factor, gear| {
            layer(factor, gear.protection, disease.permeability_modifier)
        })
}

fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// Multiplier on an airborne infection chance for the target
pub fn airborne_factor(
    target: Option<&Equipment>,
    disease: &DiseaseDefinition,
    config: &ProtectionConfig,
) -> f32 {
    let mut factor = slots_factor(target, &[SlotCategory::Mask], disease);
    if target.map(|e| e.internals).unwrap_or(false) {
        factor = layer(factor, config.internals_protection, disease.permeability_modifier);
    }
    clamp_factor(factor)
}

/// Multiplier on a touch infection chance for the target
pub fn contact_factor(target: Option<&Equipment>, disease: &DiseaseDefinition) -> f32 {
    clamp_factor(slots_factor(
        target,
        &[SlotCategory::Gloves, SlotCategory::Outerwear],
        disease,
    ))
}

/// Multiplier on residue touched with the hands (objects)
pub fn handled_residue_factor(target: Option<&Equipment>, disease: &DiseaseDefinition) -> f32 {
    clamp_factor(slots_factor(target, &[SlotCategory::Gloves], disease))
}

/// Multiplier on residue stepped on or left behind by feet (tiles)
pub fn deposit_factor(wearer: Option<&Equipment>, disease: &DiseaseDefinition) -> f32 {
    clamp_factor(slots_factor(wearer, &[SlotCategory::Footwear], disease))
}

/// Whether the source's mask keeps its breath in
pub fn blocks_emission(source: Option<&Equipment>) -> bool {
    source.map(Equipment::breath_blocked).unwrap_or(false)
}
