//! Shared data types for the contagion simulation.
//!
//! This crate contains pure data structures with no simulation logic:
//! identifiers, the outbound effect events consumed by presentation and
//! gameplay collaborators, and read-only diagnostic snapshots.

pub mod event;
pub mod ids;
pub mod snapshot;

pub use event::{CureEffect, DiseaseEvent, InfectionVector, SensationKind};
pub use ids::{ActorId, DiseaseId, SymptomId};
pub use snapshot::{
    generate_snapshot_id, CarrierSnapshot, InfectionSnapshot, ResidueSiteSnapshot,
};
