//! MarkForge Core - Core types and traits for marked-configuration segmentation
//!
//! This crate provides the fundamental abstractions for MarkForge:
//! - Mark identity and id generation
//! - The `Configuration` container of marks
//! - Collaborator contracts for energy evaluation, pairing, mark sampling
//!   and randomness
//! - The explicit energy context handed to evaluators
//! - The error taxonomy shared by all MarkForge crates

pub mod configuration;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod mark;
pub mod random;
pub mod sampler;

pub use configuration::Configuration;
pub use context::{EnergyContext, Extent, RegionMap, RegionMembership};
pub use error::{EvaluationError, MarkForgeError, Result};
pub use evaluator::{EnergyEvaluator, PairingCriterion, DEFAULT_TOLERANCE};
pub use mark::{Mark, MarkId, MarkIdGenerator};
pub use random::RandomSource;
pub use sampler::MarkSampler;
