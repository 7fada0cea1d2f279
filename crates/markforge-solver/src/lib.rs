//! Weighted kernel proposals for MarkForge searches.
//!
//! The outer optimizer asks a [`KernelProposer`] for a move, applies the
//! chosen [`Kernel`] to a working copy of an
//! [`EnergyBreakdown`](markforge_scoring::EnergyBreakdown), inspects the
//! energy delta and decides whether to accept it. The acceptance rule is
//! the caller's.
//!
//! - [`kernel`] - Birth, death, exchange, merge, split and initial fill kernels
//! - [`proposer`] - Builder and weighted selection
//! - [`builder`] - Wiring from [`MarkForgeConfig`](markforge_config::MarkForgeConfig)
//! - [`random`] - ChaCha8-backed random source

pub mod builder;
pub mod kernel;
pub mod proposer;
pub mod random;
pub mod statistics;
pub mod weighted;

pub use builder::{EnergyModelBuilder, KernelBuilder, DEFAULT_REPRODUCIBLE_SEED};
pub use kernel::{
    BirthKernel, DeathKernel, ExchangeKernel, InitialFillKernel, Kernel, KernelOutcome,
    MergeKernel, SplitKernel,
};
pub use proposer::{CandidateMove, KernelApplication, KernelProposer, KernelProposerBuilder};
pub use random::SeededRandom;
pub use statistics::KernelStatistics;
pub use weighted::WeightedKernel;
