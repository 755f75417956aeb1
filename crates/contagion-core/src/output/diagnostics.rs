//! Diagnostic Snapshots
//!
//! Owned, read-only copies of carrier and residue state. Nothing returned
//! here borrows from the world.

use bevy_ecs::prelude::*;

use contagion_events::{
    generate_snapshot_id, CarrierSnapshot, InfectionSnapshot, ResidueSiteSnapshot,
};

use crate::components::{CarrierState, ResidueSite, ResidueStore, SimClock};

/// Copy of an actor's active infections, or `None` if it is not a carrier
pub fn diagnose(world: &World, actor: Entity) -> Option<CarrierSnapshot> {
    let carrier = world.get::<CarrierState>(actor)?;
    let now = world.get_resource::<SimClock>().map(|c| c.now).unwrap_or(0.0);

    let infections = carrier
        .active_infections
        .iter()
        .map(|(disease, record)| InfectionSnapshot {
            disease: disease.clone(),
            stage: record.stage,
            incubating: carrier.is_incubating(disease, now),
            asymptomatic: carrier.is_asymptomatic(disease),
            infected_for: (now - record.infected_at).max(0.0),
        })
        .collect();

    Some(CarrierSnapshot {
        snapshot_id: generate_snapshot_id(),
        actor: crate::actor_id(actor),
        taken_at: now,
        infections,
    })
}

/// Copy of the residue at one site, or `None` if the site is clean
pub fn residue_snapshot(world: &World, site: &ResidueSite) -> Option<ResidueSiteSnapshot> {
    let store = world.get_resource::<ResidueStore>()?;
    store.get(site)?;
    Some(ResidueSiteSnapshot {
        site: site.to_string(),
        intensities: store.intensities_at(site),
    })
}
