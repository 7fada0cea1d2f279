//! Consistent, incrementally maintained energy of a configuration.
//!
//! `EnergyBreakdown` is the only mutation API for a configuration under
//! search. Every mutation follows the same shape:
//!
//! ```text
//! 1. validate indices and identities        (no state touched)
//! 2. score individual and pairwise terms     (temporaries only)
//! 3. apply the structural change             (undo record kept)
//! 4. score the global term                   (on failure: undo, return error)
//! 5. commit all terms; the total is their sum
//! 6. check the energy invariants
//! ```
//!
//! A failure in steps 1-4 leaves the breakdown exactly as it was. Under a
//! fatal [`InvariantCheck`], a violation found in step 6 restores the terms
//! saved before step 5 and undoes step 3 before the error is returned.

use std::fmt::{self, Debug, Write as _};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, error, info};

use markforge_core::{
    Configuration, EnergyEvaluator, EvaluationError, Mark, MarkForgeError, MarkId,
    PairingCriterion, Result,
};

use crate::global::EnergyGlobal;
use crate::individual::EnergyIndividual;
use crate::invariant::{within_tolerance, InvariantCheck};
use crate::model::EnergyModel;
use crate::pairwise::{EnergyPairwise, PendingEdges};
use crate::sum::CompensatedSum;
use crate::totals::EnergyTotals;

/// Structural change applied to the configuration before the global term
/// is scored; replayed backwards if that scoring fails.
enum Undo<M> {
    Inserted { index: usize },
    Removed { index: usize, mark: Arc<M> },
    /// Both removals, ordered by ascending position.
    RemovedTwo {
        low: (usize, Arc<M>),
        high: (usize, Arc<M>),
    },
    Exchanged { index: usize, old: Arc<M> },
}

/// Mutable view of the per-mark and pairwise terms during a commit.
struct Terms<'a> {
    individual: &'a mut EnergyIndividual,
    pairwise: &'a mut EnergyPairwise,
}

/// A configuration together with its decomposed energy.
///
/// Invariants after every successful mutation:
/// - `individual().len() == configuration().len()`, position by position
/// - the pairwise graph holds exactly the interacting pairs of the configuration
/// - `total()` equals individual + pairwise + global within tolerance
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId};
/// use markforge_scoring::{EnergyBreakdown, EnergyModel};
///
/// #[derive(Clone, Debug)]
/// struct Dot { id: MarkId, x: f64 }
/// impl Mark for Dot { fn mark_id(&self) -> MarkId { self.id } }
///
/// struct LineEnergy;
/// impl EnergyEvaluator<Dot> for LineEnergy {
///     fn score_individual(&self, _: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> { Ok(-1.0) }
///     fn score_pair(&self, a: &Dot, b: &Dot, _: &EnergyContext) -> Result<f64, EvaluationError> {
///         Ok(1.0 - (a.x - b.x).abs())
///     }
///     fn score_global(&self, c: &Configuration<Dot>, _: &EnergyContext) -> Result<f64, EvaluationError> {
///         Ok(0.1 * c.len() as f64)
///     }
/// }
///
/// let close = |a: &Dot, b: &Dot| (a.x - b.x).abs() < 1.0;
/// let model = Arc::new(EnergyModel::new(LineEnergy, close, EnergyContext::default()));
/// let mut breakdown = EnergyBreakdown::new(model).unwrap();
///
/// breakdown.add(Dot { id: MarkId(1), x: 0.0 }).unwrap();
/// let total = breakdown.add(Dot { id: MarkId(2), x: 0.5 }).unwrap();
///
/// assert_eq!(breakdown.pairwise().edge_count(), 1);
/// assert!((total - (-2.0 + 0.5 + 0.2)).abs() < 1e-9);
/// ```
pub struct EnergyBreakdown<M, E, P>
where
    M: Mark,
{
    model: Arc<EnergyModel<M, E, P>>,
    configuration: Configuration<M>,
    individual: EnergyIndividual,
    pairwise: EnergyPairwise,
    global: EnergyGlobal,
    total: f64,
}

impl<M, E, P> EnergyBreakdown<M, E, P>
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Creates a breakdown for the empty configuration.
    ///
    /// The global term of the empty configuration is scored immediately.
    pub fn new(model: Arc<EnergyModel<M, E, P>>) -> Result<Self> {
        Self::from_configuration(model, Configuration::new())
    }

    /// Scores an existing configuration in bulk.
    pub fn from_configuration(
        model: Arc<EnergyModel<M, E, P>>,
        configuration: Configuration<M>,
    ) -> Result<Self> {
        let evaluator = model.evaluator();
        let context = model.context();
        let parallel = model.parallel_initialization();

        let energies: Vec<f64> = if parallel {
            configuration
                .marks()
                .par_iter()
                .map(|mark| evaluator.score_individual(&**mark, context))
                .collect::<std::result::Result<_, EvaluationError>>()?
        } else {
            configuration
                .iter()
                .map(|mark| evaluator.score_individual(mark, context))
                .collect::<std::result::Result<_, EvaluationError>>()?
        };
        let individual = EnergyIndividual::from_energies(energies);
        let pairwise =
            EnergyPairwise::build(&configuration, evaluator, model.criterion(), context, parallel)?;
        let mut global = EnergyGlobal::new();
        global.set(EnergyGlobal::compute(&configuration, evaluator, context)?);

        let total = individual.total() + pairwise.total() + global.total();
        let breakdown = Self {
            model,
            configuration,
            individual,
            pairwise,
            global,
            total,
        };

        info!(
            event = "breakdown_initialized",
            marks = breakdown.configuration.len(),
            edges = breakdown.pairwise.edge_count(),
            parallel,
            total = breakdown.total,
        );
        breakdown.check_invariants()?;
        Ok(breakdown)
    }

    pub fn model(&self) -> &Arc<EnergyModel<M, E, P>> {
        &self.model
    }

    pub fn configuration(&self) -> &Configuration<M> {
        &self.configuration
    }

    pub fn individual(&self) -> &EnergyIndividual {
        &self.individual
    }

    pub fn pairwise(&self) -> &EnergyPairwise {
        &self.pairwise
    }

    pub fn global(&self) -> &EnergyGlobal {
        &self.global
    }

    /// Cached total energy.
    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn individual_total(&self) -> f64 {
        self.individual.total()
    }

    pub fn pairwise_total(&self) -> f64 {
        self.pairwise.total()
    }

    pub fn global_total(&self) -> f64 {
        self.global.total()
    }

    pub fn len(&self) -> usize {
        self.configuration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configuration.is_empty()
    }

    /// Consumes the breakdown, keeping only its configuration.
    pub fn into_configuration(self) -> Configuration<M> {
        self.configuration
    }

    // ==================== Mutations ====================

    /// Adds a mark, returning the new total.
    pub fn add(&mut self, mark: M) -> Result<f64> {
        self.add_shared(Arc::new(mark))
    }

    /// Adds an already shared mark, returning the new total.
    pub fn add_shared(&mut self, mark: Arc<M>) -> Result<f64> {
        self.insert_shared(self.configuration.len(), mark)
    }

    /// Inserts a mark at `index`, shifting later marks up by one.
    pub fn insert(&mut self, index: usize, mark: M) -> Result<f64> {
        self.insert_shared(index, Arc::new(mark))
    }

    /// Shared-handle variant of [`insert`](Self::insert).
    pub fn insert_shared(&mut self, index: usize, mark: Arc<M>) -> Result<f64> {
        let len = self.configuration.len();
        if index > len {
            return Err(MarkForgeError::IndexOutOfRange { index, len });
        }
        let id = mark.mark_id();
        self.configuration.check_insertable(id, None)?;

        let model = Arc::clone(&self.model);
        let individual = model.evaluator().score_individual(&mark, model.context())?;
        let pending = PendingEdges::score(
            &*mark,
            &self.configuration,
            &[],
            model.evaluator(),
            model.criterion(),
            model.context(),
        )?;

        self.configuration.insert_shared(index, mark)?;
        let undo = Undo::Inserted { index };
        let global = self.score_global_or_undo(&undo)?;
        self.commit(&undo, global, |terms| {
            terms.individual.insert(index, individual)?;
            terms.pairwise.commit(pending);
            Ok(())
        })?;

        debug!(
            event = "mark_added",
            mark = %id,
            index,
            marks = self.configuration.len(),
            total = self.total,
        );
        Ok(self.total)
    }

    /// Removes the mark at `index`, returning the new total.
    pub fn remove(&mut self, index: usize) -> Result<f64> {
        self.configuration.check_index(index)?;

        let mark = self.configuration.remove(index)?;
        let id = mark.mark_id();
        let undo = Undo::Removed { index, mark };
        let global = self.score_global_or_undo(&undo)?;
        self.commit(&undo, global, |terms| {
            terms.individual.remove(index)?;
            terms.pairwise.remove(id);
            Ok(())
        })?;

        debug!(
            event = "mark_removed",
            mark = %id,
            index,
            marks = self.configuration.len(),
            total = self.total,
        );
        Ok(self.total)
    }

    /// Removes `mark` by identity, returning the new total.
    ///
    /// Fails with `NotFound` if no mark with its identity is present.
    pub fn remove_mark(&mut self, mark: &M) -> Result<f64> {
        self.remove_id(mark.mark_id())
    }

    /// Removes the mark with identity `id`, returning the new total.
    pub fn remove_id(&mut self, id: MarkId) -> Result<f64> {
        let index = self
            .configuration
            .index_of(id)
            .ok_or(MarkForgeError::NotFound(id))?;
        self.remove(index)
    }

    /// Removes two marks in one step, returning the new total.
    ///
    /// Their mutual edge is subtracted once and the global term is scored
    /// once. The result does not depend on argument order.
    pub fn remove_two(&mut self, index_a: usize, index_b: usize) -> Result<f64> {
        self.configuration.check_index_pair(index_a, index_b)?;

        let (mark_a, mark_b) = self.configuration.remove_two(index_a, index_b)?;
        let (id_a, id_b) = (mark_a.mark_id(), mark_b.mark_id());
        let undo = if index_a < index_b {
            Undo::RemovedTwo {
                low: (index_a, mark_a),
                high: (index_b, mark_b),
            }
        } else {
            Undo::RemovedTwo {
                low: (index_b, mark_b),
                high: (index_a, mark_a),
            }
        };
        let global = self.score_global_or_undo(&undo)?;
        self.commit(&undo, global, |terms| {
            terms.individual.remove_two(index_a, index_b)?;
            terms.pairwise.remove_two(id_a, id_b);
            Ok(())
        })?;

        debug!(
            event = "marks_removed",
            mark_a = %id_a,
            mark_b = %id_b,
            marks = self.configuration.len(),
            total = self.total,
        );
        Ok(self.total)
    }

    /// Replaces the mark at `index`, returning the new total.
    pub fn exchange(&mut self, index: usize, mark: M) -> Result<f64> {
        self.exchange_shared(index, Arc::new(mark))
    }

    /// Shared-handle variant of [`exchange`](Self::exchange).
    ///
    /// The old mark's pairwise contribution is read from the pre-exchange
    /// graph. The new mark is scored individually first, then against every
    /// remaining mark, with the old mark skipped.
    pub fn exchange_shared(&mut self, index: usize, mark: Arc<M>) -> Result<f64> {
        self.configuration.check_index(index)?;
        let new_id = mark.mark_id();
        self.configuration.check_insertable(new_id, Some(index))?;
        let old_id = self
            .configuration
            .get(index)
            .map(Mark::mark_id)
            .ok_or_else(|| MarkForgeError::Internal(format!("no mark at checked index {index}")))?;

        let model = Arc::clone(&self.model);
        let individual = model.evaluator().score_individual(&mark, model.context())?;
        let old_contribution = self.pairwise.contribution_of(old_id);
        let pending = PendingEdges::score(
            &*mark,
            &self.configuration,
            &[index],
            model.evaluator(),
            model.criterion(),
            model.context(),
        )?;

        let old = self.configuration.exchange_shared(index, mark)?;
        let undo = Undo::Exchanged { index, old };
        let global = self.score_global_or_undo(&undo)?;
        let mut pairwise_delta = 0.0;
        self.commit(&undo, global, |terms| {
            terms.individual.exchange(index, individual)?;
            pairwise_delta = terms.pairwise.exchange(old_id, pending);
            Ok(())
        })?;

        debug!(
            event = "mark_exchanged",
            old = %old_id,
            new = %new_id,
            index,
            old_contribution,
            pairwise_delta,
            total = self.total,
        );
        Ok(self.total)
    }

    /// Replaces cached totals with fresh sums of the stored contributions.
    ///
    /// Discards accumulated floating-point drift without calling the
    /// evaluator.
    pub fn resync_totals(&mut self) {
        self.individual.resync();
        self.pairwise.resync();
        let total = self.summed_terms();
        debug!(event = "totals_resynced", drift = total - self.total, total);
        self.total = total;
    }

    // ==================== Copies ====================

    /// Independent copy holding clones of every mark.
    pub fn deep_copy(&self) -> Self {
        self.copy_with(self.configuration.deep_copy())
    }

    /// Independent copy sharing the marks of this breakdown.
    ///
    /// Marks are never mutated in place, so mutating either breakdown cannot
    /// affect the other.
    pub fn shallow_copy(&self) -> Self {
        self.copy_with(self.configuration.shallow_copy())
    }

    fn copy_with(&self, configuration: Configuration<M>) -> Self {
        Self {
            model: Arc::clone(&self.model),
            configuration,
            individual: self.individual.clone(),
            pairwise: self.pairwise.clone(),
            global: self.global,
            total: self.total,
        }
    }

    // ==================== Diagnostics ====================

    pub fn totals(&self) -> EnergyTotals {
        EnergyTotals {
            total: self.total,
            individual: self.individual.total(),
            pairwise: self.pairwise.total(),
            global: self.global.total(),
            mark_count: self.configuration.len(),
            edge_count: self.pairwise.edge_count(),
        }
    }

    /// Human-readable dump: a totals line, then `index id energy` per mark.
    pub fn describe(&self) -> String {
        let mut out = format!("{}\n", self.totals());
        for (index, (mark, energy)) in self
            .configuration
            .iter()
            .zip(self.individual.iter())
            .enumerate()
        {
            let _ = writeln!(out, "{index}\t{}\t{energy:.6}", mark.mark_id());
        }
        out
    }

    /// Re-scores everything from scratch and compares with the cached state.
    ///
    /// Checks every individual energy, exact correspondence between the
    /// pairwise graph and the interacting pairs, the global term and the
    /// total. Fails with `InvariantViolation` on the first mismatch.
    pub fn verify_from_scratch(&self) -> Result<()> {
        match self.scratch_violation()? {
            Some(violation) => Err(MarkForgeError::InvariantViolation(violation)),
            None => Ok(()),
        }
    }

    // ==================== Internals ====================

    fn summed_terms(&self) -> f64 {
        self.individual.total() + self.pairwise.total() + self.global.total()
    }

    fn score_global_or_undo(&mut self, undo: &Undo<M>) -> Result<f64> {
        let scored = EnergyGlobal::compute(
            &self.configuration,
            self.model.evaluator(),
            self.model.context(),
        );
        match scored {
            Ok(global) => Ok(global),
            Err(err) => {
                self.undo(undo)?;
                debug!(event = "mutation_rolled_back", reason = %err);
                Err(err.into())
            }
        }
    }

    /// Commits the scored terms of a structural change already applied to
    /// the configuration, then checks the invariants.
    ///
    /// `apply` must fail, if at all, before it touches any term. When a
    /// fatal invariant check fails, the terms are restored from a snapshot
    /// and the structural change is undone.
    fn commit<F>(&mut self, undo: &Undo<M>, global: f64, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Terms<'_>) -> Result<()>,
    {
        let saved = self
            .model
            .invariant_check()
            .is_fatal()
            .then(|| (self.individual.clone(), self.pairwise.clone(), self.global, self.total));

        let mut result = apply(&mut Terms {
            individual: &mut self.individual,
            pairwise: &mut self.pairwise,
        });
        if result.is_ok() {
            self.global.set(global);
            self.total = self.summed_terms();
            result = self.check_invariants();
        }

        let Err(err) = result else {
            return Ok(());
        };
        if let Some((individual, pairwise, global, total)) = saved {
            self.individual = individual;
            self.pairwise = pairwise;
            self.global = global;
            self.total = total;
        }
        self.undo(undo)?;
        debug!(event = "mutation_rolled_back", reason = %err);
        Err(err)
    }

    fn undo(&mut self, undo: &Undo<M>) -> Result<()> {
        match undo {
            Undo::Inserted { index } => {
                self.configuration.remove(*index)?;
            }
            Undo::Removed { index, mark } => {
                self.configuration.insert_shared(*index, Arc::clone(mark))?;
            }
            Undo::RemovedTwo { low, high } => {
                self.configuration.insert_shared(low.0, Arc::clone(&low.1))?;
                self.configuration.insert_shared(high.0, Arc::clone(&high.1))?;
            }
            Undo::Exchanged { index, old } => {
                self.configuration.exchange_shared(*index, Arc::clone(old))?;
            }
        }
        Ok(())
    }

    fn check_invariants(&self) -> Result<()> {
        let policy = self.model.invariant_check();
        let mut violation = self.cached_total_violation();
        if violation.is_none() && policy.resums_terms() {
            violation = self.term_violation();
        }
        if violation.is_none() && policy == InvariantCheck::Full {
            violation = self.scratch_violation()?;
        }

        let Some(violation) = violation else {
            return Ok(());
        };
        error!(
            event = "energy_invariant_violated",
            detail = %violation,
            total = self.total,
            marks = self.configuration.len(),
        );
        if policy.is_fatal() {
            return Err(MarkForgeError::InvariantViolation(violation));
        }
        if cfg!(debug_assertions) {
            panic!("energy invariant violated: {violation}");
        }
        Ok(())
    }

    fn cached_total_violation(&self) -> Option<String> {
        let summed = self.summed_terms();
        (!within_tolerance(self.total, summed, self.model.tolerance()))
            .then(|| format!("total {} != sum of terms {}", self.total, summed))
    }

    fn term_violation(&self) -> Option<String> {
        let tolerance = self.model.tolerance();
        if self.individual.len() != self.configuration.len() {
            return Some(format!(
                "{} individual energies for {} marks",
                self.individual.len(),
                self.configuration.len()
            ));
        }
        let individual = self.individual.recomputed_total();
        if !within_tolerance(self.individual.total(), individual, tolerance) {
            return Some(format!(
                "individual total {} != summed {}",
                self.individual.total(),
                individual
            ));
        }
        let pairwise = self.pairwise.recomputed_total();
        if !within_tolerance(self.pairwise.total(), pairwise, tolerance) {
            return Some(format!(
                "pairwise total {} != summed {}",
                self.pairwise.total(),
                pairwise
            ));
        }
        if let Some(structure) = self.pairwise.structure_error() {
            return Some(structure);
        }
        self.pairwise
            .connected_marks()
            .find(|id| !self.configuration.contains(*id))
            .map(|id| format!("edge references absent mark {id}"))
    }

    fn scratch_violation(&self) -> Result<Option<String>> {
        let evaluator = self.model.evaluator();
        let criterion = self.model.criterion();
        let context = self.model.context();
        let tolerance = self.model.tolerance();
        let marks = self.configuration.marks();

        if self.individual.len() != marks.len() {
            return Ok(Some(format!(
                "{} individual energies for {} marks",
                self.individual.len(),
                marks.len()
            )));
        }

        let mut fresh_individual = CompensatedSum::new();
        for (index, mark) in marks.iter().enumerate() {
            let fresh = evaluator.score_individual(mark, context)?;
            let cached = self.individual.get(index).unwrap_or(f64::NAN);
            if !within_tolerance(cached, fresh, tolerance) {
                return Ok(Some(format!(
                    "individual energy of {} at {index}: cached {cached}, scored {fresh}",
                    mark.mark_id()
                )));
            }
            fresh_individual.add(fresh);
        }
        if !within_tolerance(self.individual.total(), fresh_individual.value(), tolerance) {
            return Ok(Some(format!(
                "individual total {} != rescored {}",
                self.individual.total(),
                fresh_individual.value()
            )));
        }

        let mut fresh_pairwise = CompensatedSum::new();
        let mut interacting = 0usize;
        for (i, a) in marks.iter().enumerate() {
            for b in &marks[i + 1..] {
                let (id_a, id_b) = (a.mark_id(), b.mark_id());
                let cached = self.pairwise.edge_energy(id_a, id_b);
                if !criterion.interacts(a, b) {
                    if cached.is_some() {
                        return Ok(Some(format!("stale edge {id_a}-{id_b}")));
                    }
                    continue;
                }
                interacting += 1;
                let fresh = evaluator.score_pair(a, b, context)?;
                match cached {
                    None => return Ok(Some(format!("missing edge {id_a}-{id_b}"))),
                    Some(cached) if !within_tolerance(cached, fresh, tolerance) => {
                        return Ok(Some(format!(
                            "edge {id_a}-{id_b}: cached {cached}, scored {fresh}"
                        )));
                    }
                    Some(_) => fresh_pairwise.add(fresh),
                }
            }
        }
        if interacting != self.pairwise.edge_count() {
            return Ok(Some(format!(
                "{} edges for {interacting} interacting pairs",
                self.pairwise.edge_count()
            )));
        }
        if !within_tolerance(self.pairwise.total(), fresh_pairwise.value(), tolerance) {
            return Ok(Some(format!(
                "pairwise total {} != rescored {}",
                self.pairwise.total(),
                fresh_pairwise.value()
            )));
        }

        let global = EnergyGlobal::compute(&self.configuration, evaluator, context)?;
        if !within_tolerance(self.global.total(), global, tolerance) {
            return Ok(Some(format!(
                "global energy: cached {}, scored {global}",
                self.global.total()
            )));
        }

        let fresh_total = fresh_individual.value() + fresh_pairwise.value() + global;
        if !within_tolerance(self.total, fresh_total, tolerance) {
            return Ok(Some(format!(
                "total {} != rescored {fresh_total}",
                self.total
            )));
        }
        Ok(None)
    }
}

impl<M, E, P> Debug for EnergyBreakdown<M, E, P>
where
    M: Mark,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnergyBreakdown")
            .field("marks", &self.configuration.len())
            .field("edges", &self.pairwise.edge_count())
            .field("individual", &self.individual.total())
            .field("pairwise", &self.pairwise.total())
            .field("global", &self.global.total())
            .field("total", &self.total)
            .finish()
    }
}
