//! End-to-end outbreak scenarios
//!
//! Drives a full `Simulation` frame by frame and checks the observable
//! behavior of progression, cures and every spread vector.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contagion_core::components::{
    Equipment, Gear, Position, ResidueSite, ResidueStore, Resting, SlotCategory, TileCoord,
};
use contagion_core::registry::{CureCondition, CureStep, DiseaseDefinition, SymptomDefinition};
use contagion_core::{
    CarrierState, CureEffect, DiseaseEvent, DiseaseId, DiseaseRegistry, InfectOutcome,
    InfectionVector, RandomSource, SensationKind, SimConfig, Simulation,
};

fn sim_with(diseases: Vec<DiseaseDefinition>, symptoms: Vec<SymptomDefinition>) -> Simulation {
    sim_with_config(SimConfig::default(), diseases, symptoms)
}

fn sim_with_config(
    config: SimConfig,
    diseases: Vec<DiseaseDefinition>,
    symptoms: Vec<SymptomDefinition>,
) -> Simulation {
    let registry = DiseaseRegistry::from_definitions(diseases, symptoms).unwrap();
    Simulation::new(config, registry)
}

fn tile(x: i32, y: i32) -> Position {
    TileCoord::new(x, y).center()
}

fn symptom_count(events: &[DiseaseEvent], name: &str) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, DiseaseEvent::Symptom { symptom, .. } if symptom.as_str() == name))
        .count()
}

/// Never succeeds; counts every trial drawn
#[derive(Clone, Default)]
struct CountingSource {
    draws: Arc<AtomicUsize>,
}

impl RandomSource for CountingSource {
    fn bernoulli(&mut self, _probability: f32) -> bool {
        self.draws.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

// ============================================================================
// Progression
// ============================================================================

fn flu_two_stages() -> DiseaseDefinition {
    DiseaseDefinition::new("flu", 2)
        .with_advance_probability(1.0)
        .with_incubation(0.0)
        .with_stage_symptom(1, "cough", Some(1.0))
}

#[test]
fn scenario_a_advance_then_evaluate() {
    let mut sim = sim_with(vec![flu_two_stages()], vec![SymptomDefinition::new("cough", 1.0)]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    assert_eq!(sim.infect(actor, &flu, 1), InfectOutcome::Infected { stage: 1 });
    sim.drain_events();

    sim.update(1.0);

    assert_eq!(sim.stage_of(actor, &flu), Some(2));
    // Symptoms are evaluated against the stage reached this tick, so the
    // stage 1 cough does not fire
    assert_eq!(symptom_count(&sim.drain_events(), "cough"), 0);
}

#[test]
fn scenario_a_new_stage_symptoms_fire_once() {
    let disease = flu_two_stages().with_stage_symptom(2, "wheeze", Some(1.0));
    let mut sim = sim_with(
        vec![disease],
        vec![
            SymptomDefinition::new("cough", 1.0),
            SymptomDefinition::new("wheeze", 0.0),
        ],
    );
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 1);

    sim.update(1.0);
    let events = sim.drain_events();
    assert_eq!(symptom_count(&events, "wheeze"), 1);
    assert_eq!(symptom_count(&events, "cough"), 0);
}

#[test]
fn carriers_tick_on_their_own_cadence() {
    let disease = DiseaseDefinition::new("flu", 1).with_sensation(1, "Achy.", 1.0, SensationKind::Small);
    let mut sim = sim_with(vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 1);

    let mut sensations = 0;
    for _ in 0..8 {
        sim.update(0.25);
        sensations += sim
            .drain_events()
            .iter()
            .filter(|e| matches!(e, DiseaseEvent::Sensation { .. }))
            .count();
    }
    // Ticks at t = 1.0 and t = 2.0
    assert_eq!(sensations, 2);
}

#[test]
fn metabolic_multiplier_speeds_up_ticks() {
    let disease = DiseaseDefinition::new("flu", 1).with_sensation(1, "Achy.", 1.0, SensationKind::Small);
    let mut sim = sim_with(vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    assert!(sim.set_metabolic_multiplier(actor, 2.0));
    sim.infect(actor, &flu, 1);

    let mut sensations = 0;
    for _ in 0..8 {
        sim.update(0.25);
        sensations += sim
            .drain_events()
            .iter()
            .filter(|e| matches!(e, DiseaseEvent::Sensation { .. }))
            .count();
    }
    assert_eq!(sensations, 4);
}

#[test]
fn sensation_exclusivity() {
    let disease = DiseaseDefinition::new("flu", 1)
        .with_sensation(1, "first", 1.0, SensationKind::Small)
        .with_sensation(1, "second", 1.0, SensationKind::Small)
        .with_sensation(1, "third", 1.0, SensationKind::Small);
    let mut sim = sim_with(vec![disease], vec![]);
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &DiseaseId::new("flu"), 1);

    for _ in 0..5 {
        sim.update(1.0);
        let texts: Vec<String> = sim
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                DiseaseEvent::Sensation { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["first".to_string()]);
    }
}

#[test]
fn incubation_gates_every_trial() {
    let disease = DiseaseDefinition::new("flu", 2)
        .with_advance_probability(0.5)
        .with_incubation(5.0)
        .with_sensation(1, "Itchy.", 0.5, SensationKind::Small);
    let mut sim = sim_with(vec![disease], vec![]);
    let source = CountingSource::default();
    let draws = source.draws.clone();
    sim.set_random_source(source);

    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 1);

    for _ in 0..4 {
        sim.update(1.0);
    }
    assert_eq!(draws.load(Ordering::SeqCst), 0);
    assert!(sim.diagnose(actor).unwrap().infections[0].incubating);

    // Incubation ends at t = 5; the tick that falls due then processes normally
    sim.update(1.0);
    assert_eq!(draws.load(Ordering::SeqCst), 2);
    assert!(!sim.diagnose(actor).unwrap().infections[0].incubating);
}

#[test]
fn stage_moves_at_most_one_step_per_tick() {
    let disease = DiseaseDefinition::new("flu", 5)
        .with_advance_probability(0.5)
        .with_post_cure_immunity(0.0)
        .with_cure_step(
            None,
            CureStep::new(CureCondition::Resting, CureEffect::LowerStage).with_chance(0.4),
        );
    let mut sim = sim_with(vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.world_mut().entity_mut(actor).insert(Resting);
    sim.infect(actor, &flu, 3);

    let mut previous = sim.stage_of(actor, &flu);
    for _ in 0..300 {
        sim.update(1.0);
        let current = sim.stage_of(actor, &flu);
        match (previous, current) {
            (Some(before), Some(after)) => {
                assert!((before as i64 - after as i64).abs() <= 1, "{before} -> {after}");
                assert!((1..=5).contains(&after));
            }
            (Some(before), None) => assert_eq!(before, 1, "cleared from stage {before}"),
            (None, Some(_)) => panic!("disease came back without exposure"),
            (None, None) => {}
        }
        previous = current;
    }
}

#[test]
fn reexposure_is_idempotent() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("flu", 3)], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 2);

    assert_eq!(sim.infect(actor, &flu, 1), InfectOutcome::AlreadyActive);
    assert_eq!(sim.stage_of(actor, &flu), Some(2));
    assert_eq!(
        sim.try_infect_with_chance(actor, &flu, 1.0),
        InfectOutcome::AlreadyActive
    );
    assert_eq!(sim.stage_of(actor, &flu), Some(2));
}

#[test]
fn unknown_disease_in_carrier_is_dropped() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("flu", 1)], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 1);
    sim.world_mut()
        .get_mut::<CarrierState>(actor)
        .unwrap()
        .active_infections
        .insert(
            DiseaseId::new("corrupt"),
            contagion_core::components::InfectionRecord::new(1, 0.0),
        );

    sim.update(1.0);
    let snapshot = sim.diagnose(actor).unwrap();
    assert_eq!(snapshot.infections.len(), 1);
    assert_eq!(snapshot.stage_of(&flu), Some(1));
}

// ============================================================================
// Cures
// ============================================================================

#[test]
fn cure_step_clears_and_grants_immunity() {
    let disease = DiseaseDefinition::new("flu", 2).with_cure_step(
        None,
        CureStep::new(
            CureCondition::Reagent {
                reagent: "spaceacillin".into(),
                min_amount: 5.0,
            },
            CureEffect::Clear,
        ),
    );
    let mut sim = sim_with(vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &flu, 2);

    sim.update(1.0);
    assert_eq!(sim.stage_of(actor, &flu), Some(2));

    sim.world_mut()
        .entity_mut(actor)
        .insert(contagion_core::components::Reagents::new().with("spaceacillin", 10.0));
    sim.update(1.0);
    assert_eq!(sim.stage_of(actor, &flu), None);
    assert!(sim.drain_events().iter().any(|e| matches!(
        e,
        DiseaseEvent::Cured { effect: CureEffect::Clear, remaining_stage: None, .. }
    )));

    // Cleared diseases do not come back
    assert_eq!(sim.try_infect_with_chance(actor, &flu, 1.0), InfectOutcome::Blocked);
}

#[test]
fn dead_carriers_shed_diseases() {
    let mut config = SimConfig::default();
    config.carrier.dead_shed_rate = 1.0;
    let mut sim = sim_with_config(
        config,
        vec![
            DiseaseDefinition::new("flu", 1),
            DiseaseDefinition::new("cold", 1),
        ],
        vec![],
    );
    let actor = sim.spawn_actor(tile(0, 0));
    sim.infect(actor, &DiseaseId::new("flu"), 1);
    sim.infect(actor, &DiseaseId::new("cold"), 1);
    sim.kill(actor);

    sim.update(1.0);
    assert_eq!(sim.diagnose(actor).unwrap().infections.len(), 1);
    sim.update(1.0);
    assert!(sim.diagnose(actor).unwrap().is_healthy());
}

#[test]
fn vaccine_blocks_future_infection() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("flu", 1)], vec![]);
    let flu = DiseaseId::new("flu");
    let actor = sim.spawn_actor(tile(0, 0));
    assert!(sim.vaccinate(actor, &flu));
    for _ in 0..50 {
        assert_eq!(sim.try_infect_with_chance(actor, &flu, 1.0), InfectOutcome::Blocked);
    }
}

// ============================================================================
// Airborne spread
// ============================================================================

fn airborne_flu() -> DiseaseDefinition {
    DiseaseDefinition::new("flu", 2).airborne(5.0, 1.0, 1.0)
}

#[test]
fn scenario_b_airborne_single_invocation() {
    let mut sim = sim_with(vec![airborne_flu()], vec![]);
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let target = sim.spawn_actor(tile(3, 0));
    sim.infect(source, &flu, 1);
    sim.drain_events();

    sim.update(1.0);

    assert_eq!(sim.stage_of(target, &flu), Some(1));
    let events = sim.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        DiseaseEvent::Infected { vector: InfectionVector::Airborne, .. }
    )));
}

#[test]
fn airborne_reaches_carriers_ticking_off_the_timer_phase() {
    let mut sim = sim_with(vec![airborne_flu()], vec![]);
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let target = sim.spawn_actor(tile(2, 0));

    // Source ticks at 1.25, 2.25, ... while the airborne timer fires on whole seconds
    sim.update(0.25);
    sim.infect(source, &flu, 1);
    for _ in 0..8 {
        sim.update(0.25);
    }
    assert_eq!(sim.stage_of(target, &flu), Some(1));
}

#[test]
fn airborne_out_of_range_or_behind_wall() {
    let mut sim = sim_with(vec![airborne_flu()], vec![]);
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let far = sim.spawn_actor(tile(9, 0));
    let walled = sim.spawn_actor(tile(0, 3));
    sim.set_obstructed(TileCoord::new(0, 2), true);
    sim.infect(source, &flu, 1);

    for _ in 0..10 {
        sim.update(1.0);
    }
    assert!(sim.stage_of(far, &flu).is_none());
    assert!(sim.stage_of(walled, &flu).is_none());
}

#[test]
fn airborne_respects_target_protection() {
    let mut sim = sim_with(vec![airborne_flu()], vec![]);
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let target = sim.spawn_actor(tile(2, 0));
    sim.world_mut()
        .entity_mut(target)
        .insert(Equipment::new().with(SlotCategory::Mask, Gear::new("sealed mask", 1.0)));
    sim.infect(source, &flu, 1);

    for _ in 0..10 {
        sim.update(1.0);
    }
    assert!(sim.stage_of(target, &flu).is_none());
}

#[test]
fn masked_or_dead_source_emits_nothing() {
    let mut sim = sim_with(vec![airborne_flu()], vec![]);
    let flu = DiseaseId::new("flu");
    let masked = sim.spawn_actor(tile(0, 0));
    let corpse = sim.spawn_actor(tile(10, 0));
    let near_masked = sim.spawn_actor(tile(2, 0));
    let near_corpse = sim.spawn_actor(tile(12, 0));
    sim.world_mut().entity_mut(masked).insert(
        Equipment::new().with(SlotCategory::Mask, Gear::new("gas mask", 0.9).blocking_breath()),
    );
    sim.infect(masked, &flu, 1);
    sim.infect(corpse, &flu, 1);
    sim.kill(corpse);

    for _ in 0..10 {
        sim.update(1.0);
    }
    assert!(sim.stage_of(near_masked, &flu).is_none());
    assert!(sim.stage_of(near_corpse, &flu).is_none());
}

#[test]
fn incubating_source_does_not_spread() {
    let disease = airborne_flu().with_incubation(3.5);
    let mut sim = sim_with(vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let target = sim.spawn_actor(tile(1, 0));
    sim.infect(source, &flu, 1);

    for _ in 0..3 {
        sim.update(1.0);
        assert!(sim.stage_of(target, &flu).is_none());
    }
    sim.update(1.0);
    assert_eq!(sim.stage_of(target, &flu), Some(1));
}

#[test]
fn sneeze_symptom_bursts_next_frame() {
    let disease = DiseaseDefinition::new("flu", 1)
        .airborne(5.0, 0.0, 0.0)
        .with_stage_symptom(1, "sneeze", None);
    let mut sim = sim_with(
        vec![disease],
        vec![SymptomDefinition::new("sneeze", 1.0).with_burst(2.0, 1.0)],
    );
    let flu = DiseaseId::new("flu");
    let source = sim.spawn_actor(tile(0, 0));
    let near = sim.spawn_actor(tile(1, 0));
    let far = sim.spawn_actor(tile(4, 0));
    sim.infect(source, &flu, 1);

    sim.update(1.0);
    assert!(sim.stage_of(near, &flu).is_none());

    sim.update(0.25);
    assert_eq!(sim.stage_of(near, &flu), Some(1));
    assert!(sim.stage_of(far, &flu).is_none());
}

#[test]
fn speaking_spreads_airborne_disease() {
    let mut config = SimConfig::default();
    config.airborne.speech_burst_chance = 1.0;
    let disease = DiseaseDefinition::new("flu", 1).airborne(5.0, 0.0, 0.0);
    let mut sim = sim_with_config(config, vec![disease], vec![]);
    let flu = DiseaseId::new("flu");
    let speaker = sim.spawn_actor(tile(0, 0));
    let listener = sim.spawn_actor(tile(1, 0));

    assert!(!sim.on_actor_spoke(speaker));
    sim.infect(speaker, &flu, 1);
    assert!(sim.on_actor_spoke(speaker));

    sim.update(0.25);
    assert_eq!(sim.stage_of(listener, &flu), Some(1));
}

// ============================================================================
// Contact spread and residue
// ============================================================================

#[test]
fn scenario_c_residue_deposit_and_decay() {
    let mut config = SimConfig::default();
    config.contact.residue_decay_per_second = 0.1;
    let disease = DiseaseDefinition::new("rot", 1).contact(0.0, 0.5);
    let mut sim = sim_with_config(config, vec![disease], vec![]);
    let rot = DiseaseId::new("rot");
    let actor = sim.spawn_actor(tile(2, 2));
    let site = ResidueSite::Tile(TileCoord::new(2, 2));
    sim.infect(actor, &rot, 1);

    sim.update(1.0);
    assert_eq!(sim.residue_intensity(&site, &rot), 0.5);

    // No further deposits
    sim.cure_all(actor);
    for second in 1..=4 {
        sim.update(1.0);
        let intensity = sim.residue_intensity(&site, &rot);
        let expected = 0.5 - 0.1 * second as f32;
        assert!((intensity - expected).abs() < 1e-4, "t+{second}: {intensity}");
        assert!(intensity > 0.0);
    }

    sim.update(1.0);
    assert_eq!(sim.residue_intensity(&site, &rot), 0.0);
    assert!(sim.residue_at(&site).is_none());
}

#[test]
fn footwear_reduces_deposit() {
    let disease = DiseaseDefinition::new("rot", 1).contact(0.0, 0.5);
    let mut sim = sim_with(vec![disease], vec![]);
    let rot = DiseaseId::new("rot");
    let actor = sim.spawn_actor(tile(0, 0));
    sim.world_mut()
        .entity_mut(actor)
        .insert(Equipment::new().with(SlotCategory::Footwear, Gear::new("boots", 0.5)));
    sim.infect(actor, &rot, 1);

    sim.update(1.0);
    let intensity = sim.residue_intensity(&ResidueSite::Tile(TileCoord::new(0, 0)), &rot);
    assert!((intensity - 0.25).abs() < 1e-3);
}

#[test]
fn adjacency_spreads_only_to_touching_actors() {
    let disease = DiseaseDefinition::new("rot", 1).contact(1.0, 0.0);
    let mut sim = sim_with(vec![disease], vec![]);
    let rot = DiseaseId::new("rot");
    let source = sim.spawn_actor(tile(0, 0));
    let neighbour = sim.spawn_actor(tile(1, 0));
    let across_room = sim.spawn_actor(tile(5, 0));
    sim.infect(source, &rot, 1);

    sim.update(1.0);
    assert_eq!(sim.stage_of(neighbour, &rot), Some(1));
    assert!(sim.stage_of(across_room, &rot).is_none());
}

#[test]
fn dead_source_still_spreads_by_contact() {
    let mut config = SimConfig::default();
    config.carrier.dead_shed_rate = 0.0;
    let disease = DiseaseDefinition::new("rot", 1).contact(1.0, 0.0);
    let mut sim = sim_with_config(config, vec![disease], vec![]);
    let rot = DiseaseId::new("rot");
    let corpse = sim.spawn_actor(tile(0, 0));
    let mourner = sim.spawn_actor(tile(1, 0));
    sim.infect(corpse, &rot, 1);
    sim.kill(corpse);

    sim.update(1.0);
    assert_eq!(sim.stage_of(mourner, &rot), Some(1));
}

#[test]
fn direct_contact_is_symmetric() {
    let mut sim = sim_with(
        vec![
            DiseaseDefinition::new("rot", 1).contact(1.0, 0.0),
            DiseaseDefinition::new("pox", 1).contact(1.0, 0.0),
        ],
        vec![],
    );
    let rot = DiseaseId::new("rot");
    let pox = DiseaseId::new("pox");
    let a = sim.spawn_actor(tile(0, 0));
    let b = sim.spawn_actor(tile(9, 9));
    sim.infect(a, &rot, 1);
    sim.infect(b, &pox, 1);

    let outcomes = sim.on_direct_contact(a, b);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(InfectOutcome::is_infected));
    assert_eq!(sim.stage_of(a, &pox), Some(1));
    assert_eq!(sim.stage_of(b, &rot), Some(1));
}

#[test]
fn gloves_protect_against_direct_contact() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("rot", 1).contact(1.0, 0.0)], vec![]);
    let rot = DiseaseId::new("rot");
    let a = sim.spawn_actor(tile(0, 0));
    let b = sim.spawn_actor(tile(1, 0));
    sim.world_mut()
        .entity_mut(b)
        .insert(Equipment::new().with(SlotCategory::Gloves, Gear::new("nitrile gloves", 1.0)));
    sim.infect(a, &rot, 1);

    for _ in 0..20 {
        sim.on_direct_contact(a, b);
    }
    assert!(sim.stage_of(b, &rot).is_none());
}

#[test]
fn touching_contaminated_object() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("rot", 1).contact(1.0, 0.0)], vec![]);
    let rot = DiseaseId::new("rot");
    let actor = sim.spawn_actor(tile(0, 0));
    let door = sim.spawn_object(tile(1, 0));
    let site = ResidueSite::Object(door);
    sim.world_mut()
        .resource_mut::<ResidueStore>()
        .deposit(site, rot.clone(), 1.0);

    assert!(sim.on_residue_contact(actor, site));
    assert_eq!(sim.stage_of(actor, &rot), Some(1));
    assert!((sim.residue_intensity(&site, &rot) - 0.75).abs() < 1e-6);
}

#[test]
fn stepping_onto_contaminated_tile() {
    let mut sim = sim_with(vec![DiseaseDefinition::new("rot", 1).contact(1.0, 0.0)], vec![]);
    let rot = DiseaseId::new("rot");
    let actor = sim.spawn_actor(tile(2, 3));
    let site = ResidueSite::Tile(TileCoord::new(3, 3));
    sim.world_mut()
        .resource_mut::<ResidueStore>()
        .deposit(site, rot.clone(), 1.0);

    sim.update(0.25);
    assert!(sim.stage_of(actor, &rot).is_none());

    sim.set_position(actor, tile(3, 3));
    sim.update(0.25);
    assert_eq!(sim.stage_of(actor, &rot), Some(1));
    assert!(sim.drain_events().iter().any(|e| matches!(
        e,
        DiseaseEvent::Infected { vector: InfectionVector::Residue, .. }
    )));
}
