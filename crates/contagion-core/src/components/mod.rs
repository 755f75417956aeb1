//! ECS Components
//!
//! Carrier state, residue storage, positions, equipment and body chemistry.

pub mod body;
pub mod carrier;
pub mod equipment;
pub mod residue;
pub mod world;

pub use body::*;
pub use carrier::*;
pub use equipment::*;
pub use residue::*;
pub use world::*;
