//! Simulation Configuration
//!
//! Engine tuning loaded from `tuning.toml`. Every section falls back to its
//! defaults, so a partial or empty file is valid.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Resource: complete engine tuning
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub carrier: CarrierConfig,
    #[serde(default)]
    pub airborne: AirborneConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub protection: ProtectionConfig,
    #[serde(default)]
    pub population: PopulationConfig,
}

impl SimConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Run-level settings used by the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Length of one simulated frame in seconds
    pub frame_seconds: f64,
    pub duration_seconds: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frame_seconds: 0.25,
            duration_seconds: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierConfig {
    /// Seconds between progression ticks for newly attached carriers
    pub tick_interval: f64,
    /// Per-second chance a dead carrier loses one disease
    pub dead_shed_rate: f32,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            tick_interval: 1.0,
            dead_shed_rate: 0.005,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirborneConfig {
    /// Seconds between airborne engine invocations
    pub interval: f64,
    /// Range of the burst emitted when a carrier speaks
    pub speech_burst_range: f32,
    pub speech_burst_chance: f32,
}

impl Default for AirborneConfig {
    fn default() -> Self {
        Self {
            interval: 1.0,
            speech_burst_range: 2.0,
            speech_burst_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Distance at which two actors count as touching
    pub adjacency_radius: f32,
    pub residue_decay_per_second: f32,
    /// Intensity removed from a residue each time it is touched
    pub residue_contact_consumption: f32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            adjacency_radius: 1.5,
            residue_decay_per_second: 0.01,
            residue_contact_consumption: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Protection provided by breathing from internals
    pub internals_protection: f32,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            internals_protection: 0.9,
        }
    }
}

/// Demo population spawned by the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub actors: usize,
    pub width: i32,
    pub height: i32,
    /// Disease given to the first actor
    pub patient_zero: Option<String>,
    /// Fraction of actors spawned wearing a mask
    pub masked_fraction: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            actors: 40,
            width: 20,
            height: 20,
            patient_zero: Some("space_flu".to_string()),
            masked_fraction: 0.25,
        }
    }
}
