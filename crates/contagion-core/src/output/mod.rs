//! Output
//!
//! Diagnostic snapshots for collaborators and run statistics.

pub mod diagnostics;
pub mod stats;

pub use diagnostics::{diagnose, residue_snapshot};
pub use stats::{write_stats, DiseaseStats, OutbreakStats, StatsCollector};
