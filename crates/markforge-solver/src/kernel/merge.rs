//! Merge kernel - replaces an interacting pair by one mark.

use std::fmt;
use std::sync::Arc;

use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, MarkIdGenerator, MarkSampler, PairingCriterion,
    RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Replaces two interacting marks by the sampler's merge of them.
///
/// The pair is drawn uniformly from the edges of the pairwise graph, so
/// only marks that actually interact are ever merged. The higher-identity
/// mark is removed first, then the merged mark replaces the lower-identity
/// one, so the merged mark is never scored against either of the pair.
pub struct MergeKernel<S> {
    sampler: Arc<S>,
    ids: Arc<MarkIdGenerator>,
}

impl<S> MergeKernel<S> {
    pub fn new(sampler: Arc<S>, ids: Arc<MarkIdGenerator>) -> Self {
        Self { sampler, ids }
    }
}

impl<S> fmt::Debug for MergeKernel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeKernel").finish()
    }
}

impl<M, E, P, S> Kernel<M, E, P> for MergeKernel<S>
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
        // Sorted so a seeded search draws the same pair on every run.
        let edges = breakdown.pairwise().sorted_edges();
        if edges.is_empty() {
            return Ok(KernelOutcome::NoProposal);
        }
        let edge = edges[random.next_index(edges.len())];

        let configuration = breakdown.configuration();
        let (Some(index_a), Some(index_b)) = (
            configuration.index_of(edge.low),
            configuration.index_of(edge.high),
        ) else {
            return Err(MarkForgeError::Internal(format!(
                "edge {}-{} references an absent mark",
                edge.low, edge.high
            )));
        };
        let (Some(a), Some(b)) = (
            configuration.get_shared(index_a).cloned(),
            configuration.get_shared(index_b).cloned(),
        ) else {
            return Err(MarkForgeError::Internal(
                "merge pair vanished from configuration".to_string(),
            ));
        };

        let Some(merged) = self.sampler.merge(&a, &b, self.ids.next_id(), random) else {
            return Ok(KernelOutcome::NoProposal);
        };

        breakdown.remove(index_b)?;
        let target = if index_a > index_b { index_a - 1 } else { index_a };
        if let Err(err) = breakdown.exchange(target, merged) {
            breakdown.insert_shared(index_b, b)?;
            return Err(err);
        }
        Ok(KernelOutcome::Applied)
    }

    fn kernel_type(&self) -> &'static str {
        "merge"
    }
}
