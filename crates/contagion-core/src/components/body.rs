//! Body Components
//!
//! Physiological state that cure conditions inspect.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normal body temperature in degrees Celsius
pub const NORMAL_BODY_TEMPERATURE: f32 = 37.0;

/// Marker component: the actor is dead and cannot be infected
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

/// Marker component: the actor is lying down or asleep
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Resting;

/// Component: body temperature in degrees Celsius
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTemperature(pub f32);

impl Default for BodyTemperature {
    fn default() -> Self {
        Self(NORMAL_BODY_TEMPERATURE)
    }
}

/// Component: chemicals currently in the bloodstream, by reagent name
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reagents {
    amounts: HashMap<String, f32>,
}

impl Reagents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reagent: impl Into<String>, amount: f32) -> Self {
        self.add(reagent, amount);
        self
    }

    pub fn add(&mut self, reagent: impl Into<String>, amount: f32) {
        *self.amounts.entry(reagent.into()).or_insert(0.0) += amount.max(0.0);
    }

    /// Remove up to `amount`, dropping the reagent once it is used up
    pub fn metabolize(&mut self, reagent: &str, amount: f32) {
        if let Some(current) = self.amounts.get_mut(reagent) {
            *current -= amount.max(0.0);
            if *current <= 0.0 {
                self.amounts.remove(reagent);
            }
        }
    }

    pub fn amount(&self, reagent: &str) -> f32 {
        self.amounts.get(reagent).copied().unwrap_or(0.0)
    }
}
