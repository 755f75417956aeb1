//! Outbound Events
//!
//! The effect sink queue drained by presentation and gameplay collaborators,
//! and a JSONL logger for recording runs.

pub mod logger;

pub use logger::EventLogger;

use bevy_ecs::prelude::*;

use contagion_events::DiseaseEvent;

/// Resource: effects emitted since the last drain
#[derive(Resource, Debug, Default)]
pub struct DiseaseEvents {
    events: Vec<DiseaseEvent>,
}

impl DiseaseEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DiseaseEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<DiseaseEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiseaseEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
