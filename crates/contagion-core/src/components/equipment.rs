//! Equipment Components
//!
//! Worn protective gear, looked up by slot category.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot categories that matter for disease protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Mask,
    Gloves,
    Footwear,
    Outerwear,
}

/// A single worn item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub name: String,
    /// Fraction of exposure this item stops, 0.0 to 1.0
    pub protection: f32,
    /// Seals the mouth: the wearer's breath cannot carry disease out
    #[serde(default)]
    pub blocks_breath: bool,
}

impl Gear {
    pub fn new(name: impl Into<String>, protection: f32) -> Self {
        Self {
            name: name.into(),
            protection: protection.clamp(0.0, 1.0),
            blocks_breath: false,
        }
    }

    pub fn blocking_breath(mut self) -> Self {
        self.blocks_breath = true;
        self
    }
}

/// Component: everything an actor is wearing
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    slots: HashMap<SlotCategory, Gear>,
    /// Breathing from a sealed air supply
    #[serde(default)]
    pub internals: bool,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: SlotCategory, gear: Gear) -> Self {
        self.equip(slot, gear);
        self
    }

    pub fn with_internals(mut self) -> Self {
        self.internals = true;
        self
    }

    /// Put on an item, returning whatever was in the slot before
    pub fn equip(&mut self, slot: SlotCategory, gear: Gear) -> Option<Gear> {
        self.slots.insert(slot, gear)
    }

    pub fn unequip(&mut self, slot: SlotCategory) -> Option<Gear> {
        self.slots.remove(&slot)
    }

    pub fn equipped(&self, slot: SlotCategory) -> Option<&Gear> {
        self.slots.get(&slot)
    }

    pub fn has_equipped(&self, slot: SlotCategory) -> bool {
        self.slots.contains_key(&slot)
    }

    /// Whether the worn mask stops outgoing breath
    pub fn breath_blocked(&self) -> bool {
        self.equipped(SlotCategory::Mask)
            .map(|mask| mask.blocks_breath)
            .unwrap_or(false)
    }
}
