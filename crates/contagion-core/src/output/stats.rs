//! Statistics Output
//!
//! Collects outbreak statistics over a run and writes them as JSON.

use bevy_ecs::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use contagion_events::{DiseaseEvent, InfectionVector};

use crate::components::{CarrierState, Dead};

/// Per-disease counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiseaseStats {
    pub infections: usize,
    pub by_vector: BTreeMap<String, usize>,
    pub cures: usize,
    pub currently_infected: usize,
    pub peak_infected: usize,
}

/// Overall run statistics
#[derive(Debug, Clone, Serialize)]
pub struct OutbreakStats {
    pub duration_seconds: f64,
    pub population: usize,
    pub dead: usize,
    pub total_events: usize,
    pub events_by_type: BTreeMap<String, usize>,
    pub diseases: BTreeMap<String, DiseaseStats>,
}

/// Accumulates statistics while the simulation runs
#[derive(Debug, Default)]
pub struct StatsCollector {
    total_events: usize,
    events_by_type: BTreeMap<String, usize>,
    diseases: BTreeMap<String, DiseaseStats>,
}

fn vector_name(vector: InfectionVector) -> &'static str {
    match vector {
        InfectionVector::Airborne => "airborne",
        InfectionVector::Contact => "contact",
        InfectionVector::Residue => "residue",
        InfectionVector::Direct => "direct",
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events drained from the simulation
    pub fn record_events(&mut self, events: &[DiseaseEvent]) {
        for event in events {
            self.total_events += 1;
            *self
                .events_by_type
                .entry(event.kind_name().to_string())
                .or_insert(0) += 1;

            let stats = self.diseases.entry(event.disease().to_string()).or_default();
            match event {
                DiseaseEvent::Infected { vector, .. } => {
                    stats.infections += 1;
                    *stats
                        .by_vector
                        .entry(vector_name(*vector).to_string())
                        .or_insert(0) += 1;
                }
                DiseaseEvent::Cured {
                    remaining_stage: None,
                    ..
                } => {
                    stats.cures += 1;
                }
                _ => {}
            }
        }
    }

    /// Sample how many carriers currently hold each disease
    pub fn sample(&mut self, world: &mut World) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut query = world.query::<&CarrierState>();
        for carrier in query.iter(world) {
            for disease in carrier.active_infections.keys() {
                *counts.entry(disease.to_string()).or_insert(0) += 1;
            }
        }

        for stats in self.diseases.values_mut() {
            stats.currently_infected = 0;
        }
        for (disease, count) in counts {
            let stats = self.diseases.entry(disease).or_default();
            stats.currently_infected = count;
            stats.peak_infected = stats.peak_infected.max(count);
        }
    }

    pub fn finish(&self, world: &mut World, duration_seconds: f64) -> OutbreakStats {
        let population = world.query::<&CarrierState>().iter(world).count();
        let dead = world
            .query_filtered::<(), (With<CarrierState>, With<Dead>)>()
            .iter(world)
            .count();

        OutbreakStats {
            duration_seconds,
            population,
            dead,
            total_events: self.total_events,
            events_by_type: self.events_by_type.clone(),
            diseases: self.diseases.clone(),
        }
    }
}

/// Write statistics to a JSON file
pub fn write_stats(stats: &OutbreakStats, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json)
}
