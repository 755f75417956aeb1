//! World Setup
//!
//! Demo population spawning and actor wandering for the command line runner.

pub mod movement;
pub mod population;

pub use movement::*;
pub use population::*;
