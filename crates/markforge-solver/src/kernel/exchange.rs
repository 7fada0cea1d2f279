//! Exchange kernel - replaces one mark by a perturbed version of itself.

use std::fmt;
use std::sync::Arc;

use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, MarkSampler, PairingCriterion, RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Replaces a uniformly chosen mark by the sampler's perturbation of it.
pub struct ExchangeKernel<S> {
    sampler: Arc<S>,
}

impl<S> ExchangeKernel<S> {
    pub fn new(sampler: Arc<S>) -> Self {
        Self { sampler }
    }
}

impl<S> fmt::Debug for ExchangeKernel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeKernel").finish()
    }
}

impl<M, E, P, S> Kernel<M, E, P> for ExchangeKernel<S>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
    S: MarkSampler<M> + 'static,
{
    fn try_apply(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome> {
        let len = breakdown.len();
        if len == 0 {
            return Ok(KernelOutcome::NoProposal);
        }
        let index = random.next_index(len);
        let current = breakdown
            .configuration()
            .get(index)
            .ok_or(MarkForgeError::IndexOutOfRange { index, len })?;
        let Some(replacement) = self.sampler.perturb(current, random) else {
            return Ok(KernelOutcome::NoProposal);
        };
        breakdown.exchange(index, replacement)?;
        Ok(KernelOutcome::Applied)
    }

    fn kernel_type(&self) -> &'static str {
        "exchange"
    }
}
