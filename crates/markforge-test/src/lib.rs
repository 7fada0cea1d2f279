//! Shared test fixtures for MarkForge crates.
//!
//! This crate provides marks, evaluators and random sources for testing.
//! It depends on `markforge-core` only, so every other crate can use it as a
//! dev-dependency without a cycle.
//!
//! - [`disc`] - Disc marks, a closed-form evaluator and an overlap criterion
//! - [`evaluators`] - Evaluator wrappers that fail or record their calls
//! - [`random`] - Scripted uniform random source
//! - [`sampler`] - Disc sampler for the search kernels
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! markforge-test = { workspace = true }
//! ```
//!
//! ```ignore
//! use markforge_test::disc::{Disc, DiscEvaluator, OverlapCriterion};
//! use markforge_test::random::ScriptedRandom;
//! ```

pub mod disc;
pub mod evaluators;
pub mod random;
pub mod sampler;

pub use disc::{disc_context, Disc, DiscEvaluator, OverlapCriterion};
pub use evaluators::{CountingEvaluator, FailingEvaluator};
pub use random::ScriptedRandom;
pub use sampler::DiscSampler;
