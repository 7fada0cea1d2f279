//! Death kernel - removes one uniformly chosen mark.

use markforge_core::{EnergyEvaluator, Mark, PairingCriterion, RandomSource, Result};
use markforge_scoring::EnergyBreakdown;

use super::{Kernel, KernelOutcome};

/// Removes one uniformly chosen mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathKernel {
    min_marks: usize,
}

impl DeathKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// No death is proposed while the configuration holds `min_marks` marks
    /// or fewer.
    pub fn with_min_marks(mut self, min_marks: usize) -> Self {
        self.min_marks = min_marks;
        self
    }
}

impl<M, E, P> Kernel<M, E, P> for DeathKernel
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    fn try_apply(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome> {
        let len = breakdown.len();
        if len == 0 || len <= self.min_marks {
            return Ok(KernelOutcome::NoProposal);
        }
        breakdown.remove(random.next_index(len))?;
        Ok(KernelOutcome::Applied)
    }

    fn kernel_type(&self) -> &'static str {
        "death"
    }
}
