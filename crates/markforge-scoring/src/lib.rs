//! Incremental energy bookkeeping for MarkForge.
//!
//! This crate maintains the decomposed energy of a configuration of marks:
//! - [`EnergyIndividual`] - one energy per mark, parallel to the configuration
//! - [`EnergyPairwise`] - sparse graph of interacting pairs keyed by mark identity
//! - [`EnergyGlobal`] - one term recomputed from the whole configuration
//! - [`EnergyBreakdown`] - the only mutation API, keeping all three consistent
//!
//! # Architecture
//!
//! Every mutation scores what it needs into temporaries first and commits
//! only after all evaluator calls succeed. A failed mutation leaves the
//! breakdown exactly as it was.

pub mod breakdown;
pub mod global;
pub mod individual;
pub mod invariant;
pub mod model;
pub mod pairwise;
mod sum;
pub mod totals;

pub use breakdown::EnergyBreakdown;
pub use global::EnergyGlobal;
pub use individual::EnergyIndividual;
pub use invariant::InvariantCheck;
pub use model::EnergyModel;
pub use pairwise::{EnergyPairwise, PairEdge, PendingEdges};
pub use totals::EnergyTotals;
