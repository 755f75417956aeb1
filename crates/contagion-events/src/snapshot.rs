//! Snapshot Types
//!
//! Read-only copies of carrier and residue state handed to diagnosis
//! collaborators. Nothing here references live simulation storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ActorId, DiseaseId};

/// Generates a unique snapshot ID.
pub fn generate_snapshot_id() -> String {
    format!("diag_{}", Uuid::new_v4().simple())
}

/// One active infection as seen by a diagnoser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionSnapshot {
    pub disease: DiseaseId,
    pub stage: u32,
    #[serde(default)]
    pub incubating: bool,
    #[serde(default)]
    pub asymptomatic: bool,
    /// Seconds since the infection took hold
    pub infected_for: f64,
}

/// Diagnostic copy of one actor's carrier state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierSnapshot {
    pub snapshot_id: String,
    pub actor: ActorId,
    pub taken_at: f64,
    pub infections: Vec<InfectionSnapshot>,
}

impl CarrierSnapshot {
    /// Stage of the given disease, if active
    pub fn stage_of(&self, disease: &DiseaseId) -> Option<u32> {
        self.infections
            .iter()
            .find(|i| &i.disease == disease)
            .map(|i| i.stage)
    }

    pub fn is_healthy(&self) -> bool {
        self.infections.is_empty()
    }
}

/// Residue present at one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueSiteSnapshot {
    /// Human-readable site label, e.g. `tile(3,4)` or `object(actor_12)`
    pub site: String,
    pub intensities: Vec<(DiseaseId, f32)>,
}
