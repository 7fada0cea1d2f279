//! Initial fill kernel - seeds a configuration with sampled marks.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, MarkIdGenerator, MarkSampler, PairingCriterion,
    RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Sampling attempts allowed per requested mark.
const ATTEMPTS_PER_MARK: usize = 10;

/// Adds up to `mark_count` sampled marks.
///
/// Used as the zero-weight initial kernel: it is never drawn by weight and
/// only runs when the outer loop asks for the initial kernel explicitly.
/// Sampled marks the evaluator cannot score are skipped. Any other error
/// removes the marks added by this call before it is returned.
pub struct InitialFillKernel<S> {
    sampler: Arc<S>,
    ids: Arc<MarkIdGenerator>,
    mark_count: usize,
}

impl<S> InitialFillKernel<S> {
    pub fn new(sampler: Arc<S>, ids: Arc<MarkIdGenerator>, mark_count: usize) -> Self {
        Self {
            sampler,
            ids,
            mark_count,
        }
    }

    pub fn mark_count(&self) -> usize {
        self.mark_count
    }
}

impl<S> fmt::Debug for InitialFillKernel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialFillKernel")
            .field("mark_count", &self.mark_count)
            .finish()
    }
}

impl<M, E, P, S> Kernel<M, E, P> for InitialFillKernel<S>
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
        let limit = self.mark_count.saturating_mul(ATTEMPTS_PER_MARK);
        let mut added = 0usize;
        let mut attempts = 0usize;

        while added < self.mark_count && attempts < limit {
            attempts += 1;
            let Some(mark) = self.sampler.sample(self.ids.next_id(), random) else {
                continue;
            };
            match breakdown.add(mark) {
                Ok(_) => added += 1,
                Err(MarkForgeError::Evaluation(err)) => {
                    debug!(event = "initial_mark_rejected", reason = %err);
                }
                Err(err) => {
                    for _ in 0..added {
                        breakdown.remove(breakdown.len() - 1)?;
                    }
                    return Err(err);
                }
            }
        }

        debug!(
            event = "initial_fill",
            requested = self.mark_count,
            added,
            attempts,
        );
        if added > 0 {
            Ok(KernelOutcome::Applied)
        } else {
            Ok(KernelOutcome::NoProposal)
        }
    }

    fn kernel_type(&self) -> &'static str {
        "initial"
    }
}
