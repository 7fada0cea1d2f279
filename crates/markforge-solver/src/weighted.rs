//! A kernel paired with its selection weight and display name.

use std::fmt;

use markforge_core::{EnergyEvaluator, Mark, PairingCriterion, RandomSource, Result};
use markforge_scoring::EnergyBreakdown;

use crate::kernel::{Kernel, KernelOutcome};
use crate::statistics::KernelStatistics;

/// A kernel with its weight, display name and statistics.
pub struct WeightedKernel<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    kernel: Box<dyn Kernel<M, E, P>>,
    weight: f64,
    name: String,
    statistics: KernelStatistics,
}

impl<M, E, P> WeightedKernel<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Wraps `kernel`, named after its type.
    pub fn new(kernel: impl Kernel<M, E, P> + 'static, weight: f64) -> Self {
        Self::from_boxed(Box::new(kernel), weight)
    }

    pub fn from_boxed(kernel: Box<dyn Kernel<M, E, P>>, weight: f64) -> Self {
        let name = kernel.kernel_type().to_string();
        Self {
            kernel,
            weight,
            name,
            statistics: KernelStatistics::default(),
        }
    }

    /// Overrides the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn kernel_type(&self) -> &'static str {
        self.kernel.kernel_type()
    }

    pub fn statistics(&self) -> &KernelStatistics {
        &self.statistics
    }

    /// Applies the kernel and records the result.
    pub fn try_apply(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome> {
        let result = self.kernel.try_apply(breakdown, random);
        self.statistics.record(&result);
        result
    }

    /// Clears kernel state and statistics.
    pub fn reset(&mut self) {
        self.kernel.reset();
        self.statistics.reset();
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl<M, E, P> fmt::Debug for WeightedKernel<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedKernel")
            .field("name", &self.name)
            .field("type", &self.kernel.kernel_type())
            .field("weight", &self.weight)
            .field("statistics", &self.statistics)
            .finish()
    }
}
