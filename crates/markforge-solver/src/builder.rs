//! Builder module for constructing search components from configuration
//!
//! This module provides the wiring between configuration types and the
//! kernels, proposer, energy model and random source.

use std::sync::Arc;

use markforge_config::{EnvironmentMode, KernelConfig, KernelType, MarkForgeConfig};
use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, MarkIdGenerator, MarkSampler, PairingCriterion, Result,
};
use markforge_scoring::{EnergyModel, InvariantCheck};

use crate::kernel::{
    BirthKernel, DeathKernel, ExchangeKernel, InitialFillKernel, Kernel, MergeKernel, SplitKernel,
};
use crate::proposer::{KernelProposer, KernelProposerBuilder};
use crate::random::SeededRandom;
use crate::weighted::WeightedKernel;

/// Seed used by reproducible modes when the configuration sets none.
pub const DEFAULT_REPRODUCIBLE_SEED: u64 = 0;

/// Builder for constructing kernels from configuration.
pub struct KernelBuilder;

impl KernelBuilder {
    /// Builds a kernel from configuration.
    pub fn build<M, E, P, S>(
        config: &KernelConfig,
        sampler: &Arc<S>,
        ids: &Arc<MarkIdGenerator>,
    ) -> Box<dyn Kernel<M, E, P>>
    where
        M: Mark,
        E: EnergyEvaluator<M>,
        P: PairingCriterion<M>,
        S: MarkSampler<M> + 'static,
    {
        match config.kernel_type {
            KernelType::Birth => {
                let kernel = BirthKernel::new(Arc::clone(sampler), Arc::clone(ids));
                match config.max_marks {
                    Some(max) => Box::new(kernel.with_max_marks(max)),
                    None => Box::new(kernel),
                }
            }

            KernelType::Death => Box::new(DeathKernel::new()),

            KernelType::Exchange => Box::new(ExchangeKernel::new(Arc::clone(sampler))),

            KernelType::Merge => Box::new(MergeKernel::new(Arc::clone(sampler), Arc::clone(ids))),

            KernelType::Split => {
                let kernel = SplitKernel::new(Arc::clone(sampler), Arc::clone(ids));
                match config.max_marks {
                    Some(max) => Box::new(kernel.with_max_marks(max)),
                    None => Box::new(kernel),
                }
            }
        }
    }
}

impl<M, E, P> KernelProposerBuilder<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Builds a proposer with the configured initial kernel and kernel mix.
    ///
    /// # Errors
    ///
    /// Returns `Initialization` if the configuration is invalid or the
    /// kernel weights sum to zero.
    pub fn from_config<S>(
        config: &MarkForgeConfig,
        sampler: Arc<S>,
        ids: Arc<MarkIdGenerator>,
    ) -> Result<KernelProposer<M, E, P>>
    where
        S: MarkSampler<M> + 'static,
    {
        config
            .validate()
            .map_err(|err| MarkForgeError::Initialization(err.to_string()))?;

        let initial = WeightedKernel::new(
            InitialFillKernel::new(
                Arc::clone(&sampler),
                Arc::clone(&ids),
                config.initial_kernel.mark_count,
            ),
            0.0,
        )
        .with_name(config.initial_kernel.display_name());

        let kernels: Vec<WeightedKernel<M, E, P>> = config
            .kernels
            .iter()
            .map(|kernel| {
                WeightedKernel::from_boxed(KernelBuilder::build(kernel, &sampler, &ids), kernel.weight)
                    .with_name(kernel.display_name())
            })
            .collect();

        Self::with_initial(initial).source(kernels).build()
    }
}

/// Builder for applying configuration to an energy model.
pub struct EnergyModelBuilder;

impl EnergyModelBuilder {
    /// Invariant policy for an environment mode.
    pub fn invariant_check(mode: EnvironmentMode) -> InvariantCheck {
        match mode {
            EnvironmentMode::NonReproducible | EnvironmentMode::Reproducible => {
                InvariantCheck::Log
            }
            EnvironmentMode::FastAssert => InvariantCheck::Fast,
            EnvironmentMode::FullAssert => InvariantCheck::Full,
        }
    }

    /// Applies tolerance, invariant policy and parallel initialization.
    pub fn configure<M, E, P>(
        model: EnergyModel<M, E, P>,
        config: &MarkForgeConfig,
    ) -> EnergyModel<M, E, P>
    where
        M: Mark,
        E: EnergyEvaluator<M>,
        P: PairingCriterion<M>,
    {
        model
            .with_tolerance(config.energy.tolerance)
            .with_invariant_check(Self::invariant_check(config.environment_mode))
            .with_parallel_initialization(config.energy.parallel_initialization)
    }
}

impl SeededRandom {
    /// Random source for a configuration.
    ///
    /// Uses `random_seed` when set. Reproducible modes without a seed fall
    /// back to [`DEFAULT_REPRODUCIBLE_SEED`].
    pub fn from_config(config: &MarkForgeConfig) -> Self {
        let seed = config.random_seed.or(config
            .environment_mode
            .is_reproducible()
            .then_some(DEFAULT_REPRODUCIBLE_SEED));
        Self::from_optional_seed(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markforge_core::{EnergyContext, RandomSource};
    use markforge_scoring::EnergyBreakdown;
    use markforge_test::{Disc, DiscEvaluator, DiscSampler, OverlapCriterion, ScriptedRandom};

    type DiscProposer = KernelProposer<Disc, DiscEvaluator, OverlapCriterion>;

    fn build(config: &MarkForgeConfig) -> Result<DiscProposer> {
        KernelProposerBuilder::from_config(
            config,
            Arc::new(DiscSampler::default()),
            Arc::new(MarkIdGenerator::new()),
        )
    }

    #[test]
    fn test_from_config_builds_kernel_mix() {
        let config = MarkForgeConfig::new()
            .with_initial_mark_count(5)
            .with_kernel(KernelConfig::new(KernelType::Birth, 2.0).with_max_marks(40))
            .with_kernel(KernelConfig::new(KernelType::Death, 1.0))
            .with_kernel(KernelConfig::new(KernelType::Split, 0.5))
            .with_kernel(KernelConfig::new(KernelType::Split, 0.5));

        let proposer = build(&config).unwrap();
        let names: Vec<&str> = proposer.names().collect();
        assert_eq!(names, vec!["initial", "birth", "death", "split_0", "split_1"]);
        assert_eq!(proposer.initial_kernel().weight(), 0.0);
        assert_eq!(proposer.kernel(1).unwrap().kernel_type(), "birth");
        assert_eq!(*proposer.cumulative().last().unwrap(), 1.0);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let err = build(&MarkForgeConfig::new()).unwrap_err();
        assert!(matches!(err, MarkForgeError::Initialization(_)));

        let zero = MarkForgeConfig::new().with_kernel(KernelConfig::new(KernelType::Death, 0.0));
        assert!(matches!(
            build(&zero),
            Err(MarkForgeError::Initialization(_))
        ));
    }

    #[test]
    fn test_initial_kernel_from_config_fills_configuration() {
        let config = MarkForgeConfig::new()
            .with_initial_mark_count(3)
            .with_kernel(KernelConfig::new(KernelType::Death, 1.0));
        let mut proposer = build(&config).unwrap();

        let model = Arc::new(EnergyModelBuilder::configure(
            EnergyModel::new(DiscEvaluator::default(), OverlapCriterion, EnergyContext::default()),
            &config,
        ));
        let mut breakdown = EnergyBreakdown::new(model).unwrap();
        let mut random = ScriptedRandom::new([0.1, 0.2, 0.3, 0.6, 0.7, 0.8, 0.35, 0.45, 0.55]);

        proposer.apply_initial(&mut breakdown, &mut random).unwrap();
        assert_eq!(breakdown.len(), 3);
        assert_eq!(proposer.initial_kernel().statistics().applied, 1);
    }

    #[test]
    fn test_invariant_check_per_mode() {
        assert_eq!(
            EnergyModelBuilder::invariant_check(EnvironmentMode::NonReproducible),
            InvariantCheck::Log
        );
        assert_eq!(
            EnergyModelBuilder::invariant_check(EnvironmentMode::FastAssert),
            InvariantCheck::Fast
        );
        assert_eq!(
            EnergyModelBuilder::invariant_check(EnvironmentMode::FullAssert),
            InvariantCheck::Full
        );
    }

    #[test]
    fn test_configure_model() {
        let config = MarkForgeConfig::new()
            .with_environment_mode(EnvironmentMode::FullAssert)
            .with_tolerance(1e-9);
        let model = EnergyModelBuilder::configure(
            EnergyModel::new(DiscEvaluator::default(), OverlapCriterion, EnergyContext::default()),
            &config,
        );
        assert_eq!(model.tolerance(), 1e-9);
        assert_eq!(model.invariant_check(), InvariantCheck::Full);
        assert!(model.parallel_initialization());
    }

    #[test]
    fn test_seeded_random_from_config() {
        let seeded = MarkForgeConfig::new().with_random_seed(9);
        let mut a = SeededRandom::from_config(&seeded);
        let mut b = SeededRandom::from_seed(9);
        assert_eq!(a.next_uniform(), b.next_uniform());

        let reproducible =
            MarkForgeConfig::new().with_environment_mode(EnvironmentMode::Reproducible);
        let mut c = SeededRandom::from_config(&reproducible);
        let mut d = SeededRandom::from_seed(DEFAULT_REPRODUCIBLE_SEED);
        assert_eq!(c.next_uniform(), d.next_uniform());
    }
}
