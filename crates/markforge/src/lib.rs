//! MarkForge - incremental energy bookkeeping for marked point processes.
//!
//! A segmentation is a [`Configuration`] of marks (discs, ellipses,
//! polygons) scored by an energy split into individual, pairwise and global
//! terms. [`EnergyBreakdown`] keeps those terms exact under add, remove,
//! exchange and pairwise removal, and [`KernelProposer`] draws the
//! transform to try next. The acceptance rule stays with the caller.
//!
//! # Example
//!
//! ```rust
//! use markforge::prelude::*;
//!
//! let config = MarkForgeConfig::new()
//!     .with_random_seed(42)
//!     .with_initial_mark_count(10)
//!     .with_kernel(KernelConfig::new(KernelType::Birth, 2.0))
//!     .with_kernel(KernelConfig::new(KernelType::Death, 1.0));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.total_weight(), 3.0);
//! ```

pub use markforge_config::{
    ConfigError, EnergyConfig, EnvironmentMode, InitialKernelConfig, KernelConfig, KernelType,
    MarkForgeConfig,
};
pub use markforge_core::{
    Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Extent, Mark, MarkForgeError,
    MarkId, MarkIdGenerator, MarkSampler, PairingCriterion, RandomSource, RegionMap,
    RegionMembership, Result,
};
pub use markforge_scoring::{
    EnergyBreakdown, EnergyGlobal, EnergyIndividual, EnergyModel, EnergyPairwise, EnergyTotals,
    InvariantCheck, PairEdge,
};
pub use markforge_solver::{
    BirthKernel, CandidateMove, DeathKernel, EnergyModelBuilder, ExchangeKernel,
    InitialFillKernel, Kernel, KernelApplication, KernelOutcome, KernelProposer,
    KernelProposerBuilder, KernelStatistics, MergeKernel, SeededRandom, SplitKernel,
    WeightedKernel,
};

#[cfg(feature = "logging")]
pub mod logging;

pub mod prelude {
    pub use super::{Configuration, EnergyContext, Extent, Mark, MarkId, MarkIdGenerator};
    pub use super::{EnergyEvaluator, MarkSampler, PairingCriterion, RandomSource};
    pub use super::{EnergyBreakdown, EnergyModel, EnergyTotals, InvariantCheck};
    pub use super::{Kernel, KernelOutcome, KernelProposer, KernelProposerBuilder, SeededRandom};
    pub use super::{EnergyModelBuilder, EnvironmentMode, KernelConfig, KernelType, MarkForgeConfig};
    pub use super::{MarkForgeError, Result};
}
