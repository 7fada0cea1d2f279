//! Birth kernel - adds one sampled mark.

use std::fmt;
use std::sync::Arc;

use markforge_core::{
    EnergyEvaluator, Mark, MarkIdGenerator, MarkSampler, PairingCriterion, RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Adds one mark drawn from the sampler.
pub struct BirthKernel<S> {
    sampler: Arc<S>,
    ids: Arc<MarkIdGenerator>,
    max_marks: Option<usize>,
}

impl<S> BirthKernel<S> {
    pub fn new(sampler: Arc<S>, ids: Arc<MarkIdGenerator>) -> Self {
        Self {
            sampler,
            ids,
            max_marks: None,
        }
    }

    /// No birth is proposed once the configuration holds `max_marks` marks.
    pub fn with_max_marks(mut self, max_marks: usize) -> Self {
        self.max_marks = Some(max_marks);
        self
    }
}

impl<S> fmt::Debug for BirthKernel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BirthKernel")
            .field("max_marks", &self.max_marks)
            .finish()
    }
}

impl<M, E, P, S> Kernel<M, E, P> for BirthKernel<S>
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
        if self.max_marks.is_some_and(|max| breakdown.len() >= max) {
            return Ok(KernelOutcome::NoProposal);
        }
        let Some(mark) = self.sampler.sample(self.ids.next_id(), random) else {
            return Ok(KernelOutcome::NoProposal);
        };
        breakdown.add(mark)?;
        Ok(KernelOutcome::Applied)
    }

    fn kernel_type(&self) -> &'static str {
        "birth"
    }
}
