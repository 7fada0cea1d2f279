//! Split kernel - replaces one mark by two.

use std::fmt;
use std::sync::Arc;

use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, MarkIdGenerator, MarkSampler, PairingCriterion,
    RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Replaces a uniformly chosen mark by the sampler's split of it.
///
/// The first half takes the position of the split mark, the second half is
/// appended.
pub struct SplitKernel<S> {
    sampler: Arc<S>,
    ids: Arc<MarkIdGenerator>,
    max_marks: Option<usize>,
}

impl<S> SplitKernel<S> {
    pub fn new(sampler: Arc<S>, ids: Arc<MarkIdGenerator>) -> Self {
        Self {
            sampler,
            ids,
            max_marks: None,
        }
    }

    /// No split is proposed once the configuration holds `max_marks` marks.
    pub fn with_max_marks(mut self, max_marks: usize) -> Self {
        self.max_marks = Some(max_marks);
        self
    }
}

impl<S> fmt::Debug for SplitKernel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitKernel")
            .field("max_marks", &self.max_marks)
            .finish()
    }
}

impl<M, E, P, S> Kernel<M, E, P> for SplitKernel<S>
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
        if len == 0 || self.max_marks.is_some_and(|max| len >= max) {
            return Ok(KernelOutcome::NoProposal);
        }
        let index = random.next_index(len);
        let original = breakdown
            .configuration()
            .get_shared(index)
            .cloned()
            .ok_or(MarkForgeError::IndexOutOfRange { index, len })?;

        let ids = (self.ids.next_id(), self.ids.next_id());
        let Some((first, second)) = self.sampler.split(&original, ids, random) else {
            return Ok(KernelOutcome::NoProposal);
        };

        breakdown.exchange(index, first)?;
        if let Err(err) = breakdown.add(second) {
            breakdown.exchange_shared(index, original)?;
            return Err(err);
        }
        Ok(KernelOutcome::Applied)
    }

    fn kernel_type(&self) -> &'static str {
        "split"
    }
}
