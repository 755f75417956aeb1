//! Loading the shipped data files and rejecting broken ones

use std::io::Write;
use std::path::PathBuf;

use contagion_core::config::ConfigError;
use contagion_core::registry::{CureCondition, SpreadVector};
use contagion_core::{CureEffect, DiseaseId, DiseaseRegistry, RegistryError, SimConfig, SymptomId};
use tempfile::NamedTempFile;

fn workspace_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_shipped_registry_loads() {
    let registry = DiseaseRegistry::from_file(&workspace_file("data/diseases.toml")).unwrap();
    assert_eq!(registry.len(), 2);

    let flu = registry.lookup(&DiseaseId::new("space_flu")).unwrap();
    assert_eq!(flu.name, "Space Flu");
    assert_eq!(flu.max_stage(), 3);
    assert!(flu.spreads_by(SpreadVector::Airborne));
    assert!(!flu.spreads_by(SpreadVector::Contact));

    // Stage 3 carries its own cure; the others fall back to the disease list
    assert_eq!(flu.cure_steps_for(3).len(), 1);
    assert_eq!(flu.cure_steps_for(3)[0].effect, CureEffect::LowerStage);
    assert_eq!(flu.cure_steps_for(1).len(), 2);
    assert_eq!(flu.cure_steps_for(1)[0].condition, CureCondition::Resting);

    let rot = registry.lookup(&DiseaseId::new("bleeders_rot")).unwrap();
    assert!(rot.spreads_by(SpreadVector::Contact));
    assert_eq!(rot.post_cure_immunity, 1.0);

    let cough = registry.symptom(&SymptomId::new("cough")).unwrap();
    assert!(cough.burst.is_some());
}

#[test]
fn test_shipped_tuning_loads() {
    let config = SimConfig::from_file(&workspace_file("tuning.toml")).unwrap();
    assert_eq!(config.simulation.seed, 42);
    assert_eq!(config.carrier.tick_interval, 1.0);
    assert_eq!(config.population.patient_zero.as_deref(), Some("space_flu"));
}

#[test]
fn test_registry_from_temp_file() {
    let file = write_temp(
        r#"
[[diseases]]
id = "gut_worms"
stage_advance_probability = 2.5
spread_vectors = ["contact"]
contact_infect_chance = -1.0

[[diseases.stages]]
stage = 1
"#,
    );

    let registry = DiseaseRegistry::from_file(file.path()).unwrap();
    let worms = registry.lookup(&DiseaseId::new("gut_worms")).unwrap();
    assert_eq!(worms.stage_advance_probability, 1.0);
    assert_eq!(worms.contact_infect_chance, 0.0);
    assert_eq!(worms.name, "gut_worms");
}

#[test]
fn test_missing_registry_file() {
    let result = DiseaseRegistry::from_file(&workspace_file("data/no_such_file.toml"));
    assert!(matches!(result, Err(RegistryError::Io(_))));
}

#[test]
fn test_stage_gap_rejected() {
    let file = write_temp(
        r#"
[[diseases]]
id = "flu"

[[diseases.stages]]
stage = 1

[[diseases.stages]]
stage = 3
"#,
    );

    let result = DiseaseRegistry::from_file(file.path());
    assert!(matches!(
        result,
        Err(RegistryError::NonContiguousStages { found: 3, .. })
    ));
}

#[test]
fn test_partial_tuning_uses_defaults() {
    let file = write_temp("[contact]\nresidue_decay_per_second = 0.5\n");
    let config = SimConfig::from_file(file.path()).unwrap();
    assert_eq!(config.contact.residue_decay_per_second, 0.5);
    assert_eq!(config.contact.adjacency_radius, 1.5);
    assert_eq!(config.airborne.interval, 1.0);
}

#[test]
fn test_malformed_tuning_rejected() {
    let file = write_temp("[carrier]\ntick_interval = \"fast\"\n");
    assert!(matches!(
        SimConfig::from_file(file.path()),
        Err(ConfigError::Toml(_))
    ));
}
