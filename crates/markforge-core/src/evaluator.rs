//! Collaborator contracts for scoring marks.

use crate::configuration::Configuration;
use crate::context::EnergyContext;
use crate::error::EvaluationError;
use crate::mark::Mark;

/// Default tolerance when comparing cached energies with rescored ones.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Scores one mark, a pair of marks, or a whole configuration.
///
/// The concrete energy formulas live outside the core. Implementations must
/// be safe for concurrent read-only use: several search chains may score
/// against the same evaluator at once.
///
/// # Example
///
/// ```
/// use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId};
///
/// #[derive(Clone, Debug)]
/// struct Dot { id: MarkId, weight: f64 }
///
/// impl Mark for Dot {
///     fn mark_id(&self) -> MarkId { self.id }
/// }
///
/// struct WeightEnergy;
///
/// impl EnergyEvaluator<Dot> for WeightEnergy {
///     fn score_individual(&self, mark: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> {
///         Ok(-mark.weight)
///     }
///     fn score_pair(&self, a: &Dot, b: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> {
///         Ok(a.weight * b.weight)
///     }
///     fn score_global(&self, cfg: &Configuration<Dot>, _: &EnergyContext) -> Result<f64, EvaluationError> {
///         Ok(cfg.len() as f64)
///     }
/// }
///
/// let ctx = EnergyContext::default();
/// let dot = Dot { id: MarkId(1), weight: 2.0 };
/// assert_eq!(WeightEnergy.score_individual(&dot, &ctx).unwrap(), -2.0);
/// ```
pub trait EnergyEvaluator<M: Mark>: Send + Sync {
    /// Energy contributed by a single mark.
    fn score_individual(&self, mark: &M, context: &EnergyContext) -> Result<f64, EvaluationError>;

    /// Energy contributed by an interacting pair of marks.
    ///
    /// Must be symmetric in its arguments.
    fn score_pair(&self, a: &M, b: &M, context: &EnergyContext) -> Result<f64, EvaluationError>;

    /// Energy of the configuration as a whole.
    fn score_global(
        &self,
        configuration: &Configuration<M>,
        context: &EnergyContext,
    ) -> Result<f64, EvaluationError>;
}

/// Decides whether two marks interact for the pairwise energy term.
///
/// `interacts` must be pure and symmetric. Implementations with a spatial
/// index can override [`candidates`](Self::candidates) to avoid the linear
/// scan.
pub trait PairingCriterion<M: Mark>: Send + Sync {
    /// Returns true if `a` and `b` interact.
    fn interacts(&self, a: &M, b: &M) -> bool;

    /// Positions in `existing` whose marks interact with `mark`.
    ///
    /// Positions listed in `skip` are never reported.
    fn candidates(&self, mark: &M, existing: &Configuration<M>, skip: &[usize]) -> Vec<usize> {
        existing
            .iter()
            .enumerate()
            .filter(|(index, other)| !skip.contains(index) && self.interacts(mark, other))
            .map(|(index, _)| index)
            .collect()
    }
}

impl<M, F> PairingCriterion<M> for F
where
    M: Mark,
    F: Fn(&M, &M) -> bool + Send + Sync,
{
    fn interacts(&self, a: &M, b: &M) -> bool {
        self(a, b)
    }
}
