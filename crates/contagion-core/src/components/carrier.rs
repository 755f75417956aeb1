//! Carrier Components
//!
//! Per-actor infection state. Attaching [`CarrierState`] to an entity makes
//! the actor infectable; despawning the entity destroys the record with it.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use contagion_events::{DiseaseId, SymptomId};

/// Default seconds between two progression ticks of one carrier
pub const DEFAULT_TICK_INTERVAL: f64 = 1.0;

/// One active infection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfectionRecord {
    /// Current stage, numbered from 1
    pub stage: u32,
    /// Time the infection took hold
    pub infected_at: f64,
    /// Time the current stage was entered
    pub stage_since: f64,
}

impl InfectionRecord {
    pub fn new(stage: u32, now: f64) -> Self {
        Self {
            stage,
            infected_at: now,
            stage_since: now,
        }
    }

    /// Move to a different stage, restarting the time-in-stage clock
    pub fn set_stage(&mut self, stage: u32, now: f64) {
        if stage != self.stage {
            self.stage = stage;
            self.stage_since = now;
        }
    }
}

/// Component: infection state of an infectable actor
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct CarrierState {
    pub active_infections: BTreeMap<DiseaseId, InfectionRecord>,
    /// Absolute time at which each incubating disease becomes active
    pub incubating_until: BTreeMap<DiseaseId, f64>,
    /// Block probability per disease, 0.0 to 1.0
    pub immunity: BTreeMap<DiseaseId, f32>,
    /// Absolute expiry time of each temporarily cured symptom
    pub suppressed_symptoms: BTreeMap<SymptomId, f64>,
    /// Diseases this actor carries silently
    pub asymptomatic: BTreeSet<DiseaseId>,
    pub next_tick_time: f64,
    pub tick_interval: f64,
    /// Interval before any metabolic multiplier was applied
    pub base_tick_interval: f64,
}

impl Default for CarrierState {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl CarrierState {
    pub fn new(tick_interval: f64) -> Self {
        let interval = sanitize_interval(tick_interval);
        Self {
            active_infections: BTreeMap::new(),
            incubating_until: BTreeMap::new(),
            immunity: BTreeMap::new(),
            suppressed_symptoms: BTreeMap::new(),
            asymptomatic: BTreeSet::new(),
            next_tick_time: 0.0,
            tick_interval: interval,
            base_tick_interval: interval,
        }
    }

    pub fn with_immunity(mut self, disease: impl Into<DiseaseId>, strength: f32) -> Self {
        self.set_immunity(disease.into(), strength);
        self
    }

    pub fn with_asymptomatic(mut self, disease: impl Into<DiseaseId>) -> Self {
        self.asymptomatic.insert(disease.into());
        self
    }

    pub fn stage_of(&self, disease: &DiseaseId) -> Option<u32> {
        self.active_infections.get(disease).map(|record| record.stage)
    }

    pub fn is_active(&self, disease: &DiseaseId) -> bool {
        self.active_infections.contains_key(disease)
    }

    pub fn has_infections(&self) -> bool {
        !self.active_infections.is_empty()
    }

    /// Whether the disease is still inside its incubation window
    pub fn is_incubating(&self, disease: &DiseaseId, now: f64) -> bool {
        self.incubating_until
            .get(disease)
            .map(|until| now < *until)
            .unwrap_or(false)
    }

    pub fn is_asymptomatic(&self, disease: &DiseaseId) -> bool {
        self.asymptomatic.contains(disease)
    }

    pub fn immunity_to(&self, disease: &DiseaseId) -> f32 {
        self.immunity.get(disease).copied().unwrap_or(0.0)
    }

    pub fn set_immunity(&mut self, disease: DiseaseId, strength: f32) {
        let strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        self.immunity.insert(disease, strength);
    }

    /// Raise immunity to at least `strength`, never lowering it
    pub fn raise_immunity(&mut self, disease: DiseaseId, strength: f32) {
        let current = self.immunity_to(&disease);
        if strength > current {
            self.set_immunity(disease, strength);
        }
    }

    pub fn is_suppressed(&self, symptom: &SymptomId, now: f64) -> bool {
        self.suppressed_symptoms
            .get(symptom)
            .map(|until| now < *until)
            .unwrap_or(false)
    }

    /// Suppress a symptom until `until`, keeping any later expiry
    pub fn suppress(&mut self, symptom: SymptomId, until: f64) {
        let entry = self.suppressed_symptoms.entry(symptom).or_insert(until);
        if until > *entry {
            *entry = until;
        }
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.next_tick_time <= now
    }

    pub fn schedule_next(&mut self, now: f64) {
        self.next_tick_time = now + self.tick_interval;
    }

    /// Rescale the tick cadence; a multiplier of 2 ticks twice as often
    pub fn set_metabolic_multiplier(&mut self, multiplier: f64) {
        if multiplier > 0.0 && multiplier.is_finite() {
            self.tick_interval = self.base_tick_interval / multiplier;
        }
    }

    /// Drop a disease and everything tied to it
    pub fn clear(&mut self, disease: &DiseaseId) -> Option<InfectionRecord> {
        self.incubating_until.remove(disease);
        self.asymptomatic.remove(disease);
        self.active_infections.remove(disease)
    }

    /// Remove expired incubation and suppression entries. Returns true if
    /// anything was removed.
    pub fn prune_expired(&mut self, now: f64) -> bool {
        let incubating = self.incubating_until.len();
        let suppressed = self.suppressed_symptoms.len();
        self.incubating_until.retain(|_, until| now < *until);
        self.suppressed_symptoms.retain(|_, until| now < *until);
        incubating != self.incubating_until.len() || suppressed != self.suppressed_symptoms.len()
    }
}

fn sanitize_interval(interval: f64) -> f64 {
    if interval > 0.0 && interval.is_finite() {
        interval
    } else {
        DEFAULT_TICK_INTERVAL
    }
}
