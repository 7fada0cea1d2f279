//! Shared, read-only energy model.

use std::fmt::{self, Debug};
use std::marker::PhantomData;

use markforge_core::{EnergyContext, EnergyEvaluator, Mark, PairingCriterion, DEFAULT_TOLERANCE};

use crate::invariant::InvariantCheck;

/// Bundles the collaborators every breakdown scores with.
///
/// Shared behind an `Arc` by all breakdowns of a search, including the
/// independent chains of a multi-start optimizer. Nothing in the model is
/// mutated after construction.
///
/// # Example
///
/// ```
/// use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId};
/// use markforge_scoring::{EnergyModel, InvariantCheck};
///
/// #[derive(Clone, Debug)]
/// struct Dot { id: MarkId }
/// impl Mark for Dot { fn mark_id(&self) -> MarkId { self.id } }
///
/// struct Flat;
/// impl EnergyEvaluator<Dot> for Flat {
///     fn score_individual(&self, _: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(1.0) }
///     fn score_pair(&self, _: &Dot, _: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(0.5) }
///     fn score_global(&self, _: &Configuration<Dot>, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(0.0) }
/// }
///
/// let model = EnergyModel::<Dot, _, _>::new(Flat, |_: &Dot, _: &Dot| true, EnergyContext::default())
///     .with_tolerance(1e-8)
///     .with_invariant_check(InvariantCheck::Full);
/// assert_eq!(model.tolerance(), 1e-8);
/// ```
pub struct EnergyModel<M, E, P> {
    evaluator: E,
    criterion: P,
    context: EnergyContext,
    tolerance: f64,
    invariant_check: InvariantCheck,
    parallel_initialization: bool,
    _phantom: PhantomData<fn() -> M>,
}

impl<M, E, P> EnergyModel<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    pub fn new(evaluator: E, criterion: P, context: EnergyContext) -> Self {
        Self {
            evaluator,
            criterion,
            context,
            tolerance: DEFAULT_TOLERANCE,
            invariant_check: InvariantCheck::default(),
            parallel_initialization: true,
            _phantom: PhantomData,
        }
    }

    /// Sets the tolerance of the energy invariants.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_invariant_check(mut self, invariant_check: InvariantCheck) -> Self {
        self.invariant_check = invariant_check;
        self
    }

    /// Enables or disables rayon-parallel scoring during bulk initialization.
    pub fn with_parallel_initialization(mut self, parallel: bool) -> Self {
        self.parallel_initialization = parallel;
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn criterion(&self) -> &P {
        &self.criterion
    }

    pub fn context(&self) -> &EnergyContext {
        &self.context
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn invariant_check(&self) -> InvariantCheck {
        self.invariant_check
    }

    pub fn parallel_initialization(&self) -> bool {
        self.parallel_initialization
    }
}

impl<M, E, P> Debug for EnergyModel<M, E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyModel")
            .field("context", &self.context)
            .field("tolerance", &self.tolerance)
            .field("invariant_check", &self.invariant_check)
            .field("parallel_initialization", &self.parallel_initialization)
            .finish()
    }
}
