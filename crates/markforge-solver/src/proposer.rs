//! Weighted stochastic kernel selection.
//!
//! ```text
//! KernelProposerBuilder  --build()-->  KernelProposer  --propose*()-->  (active)
//!   (uninitialized)                     (initialized)
//! ```
//!
//! Building flattens every configured kernel source into one list, prepends
//! the zero-weight initial kernel at index 0, normalizes the weights into a
//! cumulative probability array and makes every display name unique.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace};

use markforge_core::{
    EnergyEvaluator, Mark, MarkForgeError, PairingCriterion, RandomSource, Result,
};
use markforge_scoring::EnergyBreakdown;

use crate::kernel::{Kernel, KernelOutcome};
use crate::statistics::KernelStatistics;
use crate::weighted::WeightedKernel;

/// Collects the initial kernel and the weighted kernel sources.
pub struct KernelProposerBuilder<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    initial: WeightedKernel<M, E, P>,
    sources: Vec<Vec<WeightedKernel<M, E, P>>>,
}

impl<M, E, P> KernelProposerBuilder<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Starts a builder around the initial kernel.
    pub fn new(initial: impl Kernel<M, E, P> + 'static) -> Self {
        Self::with_initial(WeightedKernel::new(initial, 0.0))
    }

    /// Starts a builder around an already wrapped initial kernel.
    ///
    /// Its weight is forced to zero when the proposer is built.
    pub fn with_initial(initial: WeightedKernel<M, E, P>) -> Self {
        Self {
            initial,
            sources: Vec::new(),
        }
    }

    /// Adds one source of weighted kernels.
    pub fn source(mut self, kernels: Vec<WeightedKernel<M, E, P>>) -> Self {
        self.sources.push(kernels);
        self
    }

    /// Adds a single kernel as its own source.
    pub fn kernel(self, kernel: impl Kernel<M, E, P> + 'static, weight: f64) -> Self {
        self.source(vec![WeightedKernel::new(kernel, weight)])
    }

    /// Adds a single kernel with an explicit display name.
    pub fn named_kernel(
        self,
        kernel: impl Kernel<M, E, P> + 'static,
        weight: f64,
        name: impl Into<String>,
    ) -> Self {
        self.source(vec![WeightedKernel::new(kernel, weight).with_name(name)])
    }

    /// Builds the proposer.
    ///
    /// # Errors
    ///
    /// Returns `Initialization` if no weighted kernel is configured, a
    /// weight is negative or not finite, or the weights sum to zero or
    /// overflow.
    pub fn build(self) -> Result<KernelProposer<M, E, P>> {
        let Self {
            mut initial,
            sources,
        } = self;

        let configured: usize = sources.iter().map(Vec::len).sum();
        if configured == 0 {
            return Err(MarkForgeError::Initialization(
                "no weighted kernel configured".to_string(),
            ));
        }

        initial.set_weight(0.0);
        let mut kernels = Vec::with_capacity(configured + 1);
        kernels.push(initial);
        kernels.extend(sources.into_iter().flatten());

        if let Some(bad) = kernels
            .iter()
            .find(|k| !k.weight().is_finite() || k.weight() < 0.0)
        {
            return Err(MarkForgeError::Initialization(format!(
                "kernel '{}' has invalid weight {}",
                bad.name(),
                bad.weight()
            )));
        }

        let weights: Vec<f64> = kernels.iter().map(WeightedKernel::weight).collect();
        let cumulative = cumulative_probabilities(&weights).ok_or_else(|| {
            MarkForgeError::Initialization(
                "total kernel weight is zero or not finite".to_string(),
            )
        })?;

        let mut names: Vec<String> = kernels.iter().map(|k| k.name().to_string()).collect();
        deduplicate_names(&mut names);
        for (kernel, name) in kernels.iter_mut().zip(names) {
            kernel.set_name(name);
        }

        info!(
            event = "proposer_initialized",
            kernels = kernels.len(),
            total_weight = weights.iter().sum::<f64>(),
            names = %kernels.iter().map(|k| k.name()).collect::<Vec<_>>().join(","),
        );

        Ok(KernelProposer {
            kernels,
            cumulative,
        })
    }
}

/// Normalized running sums of `weights`.
///
/// Entries from the last positive weight onward are exactly `1.0`, so every
/// value in `[0, 1)` resolves to a kernel with positive weight. Returns
/// `None` if the weights sum to zero or overflow.
pub(crate) fn cumulative_probabilities(weights: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let last_positive = weights.iter().rposition(|w| *w > 0.0)?;

    let mut running = 0.0;
    let cumulative = weights
        .iter()
        .enumerate()
        .map(|(index, weight)| {
            running += weight / total;
            if index >= last_positive {
                1.0
            } else {
                running.min(1.0)
            }
        })
        .collect();
    Some(cumulative)
}

/// Suffixes every name shared by several kernels with `_0`, `_1`, ...
///
/// Unique names are kept unmodified. Generated names skip any suffix that is
/// already taken.
pub(crate) fn deduplicate_names(names: &mut [String]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names.iter() {
        *counts.entry(name.clone()).or_default() += 1;
    }

    let mut taken: HashSet<String> = names
        .iter()
        .filter(|name| counts.get(name.as_str()) == Some(&1))
        .cloned()
        .collect();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    for name in names.iter_mut() {
        if counts.get(name.as_str()).copied().unwrap_or(0) < 2 {
            continue;
        }
        let suffix = next_suffix.entry(name.clone()).or_insert(0);
        let mut candidate = format!("{name}_{suffix}");
        *suffix += 1;
        while taken.contains(&candidate) {
            candidate = format!("{name}_{suffix}");
            *suffix += 1;
        }
        taken.insert(candidate.clone());
        *name = candidate;
    }
}

/// One kernel application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelApplication {
    pub kernel_index: usize,
    pub outcome: KernelOutcome,
}

/// A kernel applied to a working copy, awaiting the acceptance decision.
pub struct CandidateMove<M, E, P>
where
    M: Mark,
{
    /// Index of the applied kernel.
    pub kernel_index: usize,
    /// Display name of the applied kernel.
    pub kernel_name: String,
    pub outcome: KernelOutcome,
    /// The transformed working copy.
    pub breakdown: EnergyBreakdown<M, E, P>,
    /// Candidate total minus current total.
    pub delta: f64,
}

impl<M, E, P> std::fmt::Debug for CandidateMove<M, E, P>
where
    M: Mark,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateMove")
            .field("kernel_index", &self.kernel_index)
            .field("kernel_name", &self.kernel_name)
            .field("outcome", &self.outcome)
            .field("delta", &self.delta)
            .finish()
    }
}

/// Weighted list of kernels with a zero-weight initial kernel at index 0.
///
/// The kernel list and the cumulative array are fixed at construction; only
/// per-kernel state and statistics change afterwards.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use markforge_core::MarkIdGenerator;
/// use markforge_solver::{DeathKernel, KernelProposerBuilder};
/// # use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId};
/// # #[derive(Clone, Debug)]
/// # struct Dot { id: MarkId }
/// # impl Mark for Dot { fn mark_id(&self) -> MarkId { self.id } }
/// # struct Flat;
/// # impl EnergyEvaluator<Dot> for Flat {
/// #     fn score_individual(&self, _: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(0.0) }
/// #     fn score_pair(&self, _: &Dot, _: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(0.0) }
/// #     fn score_global(&self, _: &Configuration<Dot>, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(0.0) }
/// # }
/// # type Pairing = fn(&Dot, &Dot) -> bool;
///
/// let proposer = KernelProposerBuilder::<Dot, Flat, Pairing>::new(DeathKernel::new())
///     .named_kernel(DeathKernel::new(), 1.0, "cull")
///     .named_kernel(DeathKernel::new(), 3.0, "purge")
///     .build()
///     .unwrap();
///
/// assert_eq!(proposer.cumulative(), &[0.0, 0.25, 1.0]);
/// assert_eq!(proposer.propose_index(0.1).unwrap(), 1);
/// assert_eq!(proposer.propose_index(0.5).unwrap(), 2);
/// assert_eq!(proposer.initial_kernel().name(), "death");
/// ```
pub struct KernelProposer<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    kernels: Vec<WeightedKernel<M, E, P>>,
    cumulative: Vec<f64>,
}

impl<M, E, P> KernelProposer<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Number of kernels, the initial kernel included.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn kernels(&self) -> &[WeightedKernel<M, E, P>] {
        &self.kernels
    }

    pub fn kernel(&self, index: usize) -> Option<&WeightedKernel<M, E, P>> {
        self.kernels.get(index)
    }

    pub fn kernel_mut(&mut self, index: usize) -> Option<&mut WeightedKernel<M, E, P>> {
        self.kernels.get_mut(index)
    }

    /// Position of the kernel with display name `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.kernels.iter().position(|k| k.name() == name)
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.kernels.iter().map(WeightedKernel::name)
    }

    /// Index of the first kernel with `random < cumulative[index]`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `random` is outside `[0, 1)`.
    pub fn propose_index(&self, random: f64) -> Result<usize> {
        if !(0.0..1.0).contains(&random) {
            return Err(MarkForgeError::Internal(format!(
                "random value {random} outside [0, 1)"
            )));
        }
        self.cumulative
            .iter()
            .position(|c| random < *c)
            .ok_or_else(|| {
                MarkForgeError::Internal(format!(
                    "no kernel for random value {random}; cumulative ends at {:?}",
                    self.cumulative.last()
                ))
            })
    }

    /// The kernel selected by `random`, paired with its index.
    pub fn propose_kernel(&self, random: f64) -> Result<(usize, &WeightedKernel<M, E, P>)> {
        let index = self.propose_index(random)?;
        let kernel = self.kernel(index).ok_or_else(|| {
            MarkForgeError::Internal(format!("kernel index {index} out of range"))
        })?;
        trace!(event = "kernel_proposed", random, index, kernel = kernel.name());
        Ok((index, kernel))
    }

    /// The zero-weight initial kernel at index 0.
    pub fn initial_kernel(&self) -> &WeightedKernel<M, E, P> {
        &self.kernels[0]
    }

    pub fn initial_kernel_mut(&mut self) -> &mut WeightedKernel<M, E, P> {
        &mut self.kernels[0]
    }

    /// Applies the initial kernel to `breakdown`.
    pub fn apply_initial(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome> {
        self.apply_at(0, breakdown, random)
    }

    /// Draws a kernel and applies it to `breakdown` in place.
    pub fn propose_and_apply(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelApplication> {
        let kernel_index = self.propose_index(random.next_uniform())?;
        let outcome = self.apply_at(kernel_index, breakdown, random)?;
        Ok(KernelApplication {
            kernel_index,
            outcome,
        })
    }

    /// Draws a kernel and applies it to a shallow copy of `current`.
    ///
    /// `current` is never modified. The returned candidate carries the
    /// energy delta for the outer acceptance rule.
    pub fn propose_on_copy(
        &mut self,
        current: &EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<CandidateMove<M, E, P>> {
        let kernel_index = self.propose_index(random.next_uniform())?;
        let mut candidate = current.shallow_copy();
        let outcome = self.apply_at(kernel_index, &mut candidate, random)?;
        let delta = candidate.total() - current.total();
        Ok(CandidateMove {
            kernel_index,
            kernel_name: self.kernels[kernel_index].name().to_string(),
            outcome,
            breakdown: candidate,
            delta,
        })
    }

    /// `(name, statistics)` for every kernel, in index order.
    pub fn statistics(&self) -> impl Iterator<Item = (&str, &KernelStatistics)> + '_ {
        self.kernels.iter().map(|k| (k.name(), k.statistics()))
    }

    /// Clears the internal state and statistics of every kernel.
    pub fn reset_kernels(&mut self) {
        for kernel in &mut self.kernels {
            kernel.reset();
        }
        debug!(event = "kernels_reset", kernels = self.kernels.len());
    }

    fn apply_at(
        &mut self,
        index: usize,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome> {
        let kernel = self.kernels.get_mut(index).ok_or_else(|| {
            MarkForgeError::Internal(format!("kernel index {index} out of range"))
        })?;
        let result = kernel.try_apply(breakdown, random);
        match &result {
            Ok(outcome) => debug!(
                event = "kernel_applied",
                kernel = kernel.name(),
                index,
                outcome = %outcome,
                total = breakdown.total(),
            ),
            Err(err) => debug!(
                event = "kernel_failed",
                kernel = kernel.name(),
                index,
                error = %err,
            ),
        }
        result
    }
}

impl<M, E, P> std::fmt::Debug for KernelProposer<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelProposer")
            .field("kernels", &self.kernels)
            .field("cumulative", &self.cumulative)
            .finish()
    }
}

#[cfg(test)]
mod tests;
