//! ECS Systems
//!
//! Scheduler, progression, cure, airborne and contact spread, and residue.

pub mod airborne;
pub mod contact;
pub mod cure;
pub mod progression;
pub mod residue;
pub mod scheduler;
pub mod spatial;

pub use airborne::{airborne_spread, AirborneTimer, PendingBurst, PendingBursts};
pub use contact::contact_spread;
pub use cure::{apply_cures, condition_holds, BodyView};
pub use progression::progress_carrier;
pub use residue::{decay_residue, residue_step_contacts, touch_residue, ResidueContact};
pub use scheduler::{collect_due_carriers, tick_carriers, DueCarriers, TickContext};
pub use spatial::{build_spatial_index, SpatialIndex};
