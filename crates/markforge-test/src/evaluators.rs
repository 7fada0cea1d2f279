//! Evaluator wrappers for exercising failure paths and call ordering.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId};

/// Wraps an evaluator and fails on chosen marks or on global scoring.
#[derive(Debug)]
pub struct FailingEvaluator<E> {
    inner: E,
    failing_marks: HashSet<MarkId>,
    fail_global: AtomicBool,
}

impl<E> FailingEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            failing_marks: HashSet::new(),
            fail_global: AtomicBool::new(false),
        }
    }

    /// Individual and pair scoring fail whenever this mark is involved.
    pub fn failing_on(mut self, id: u64) -> Self {
        self.failing_marks.insert(MarkId(id));
        self
    }

    /// Toggles failure of global scoring.
    pub fn set_fail_global(&self, fail: bool) {
        self.fail_global.store(fail, Ordering::SeqCst);
    }

    fn check(&self, id: MarkId) -> Result<(), EvaluationError> {
        if self.failing_marks.contains(&id) {
            Err(EvaluationError::for_mark(id, "injected failure"))
        } else {
            Ok(())
        }
    }
}

impl<M: Mark, E: EnergyEvaluator<M>> EnergyEvaluator<M> for FailingEvaluator<E> {
    fn score_individual(&self, mark: &M, context: &EnergyContext) -> Result<f64, EvaluationError> {
        self.check(mark.mark_id())?;
        self.inner.score_individual(mark, context)
    }

    fn score_pair(&self, a: &M, b: &M, context: &EnergyContext) -> Result<f64, EvaluationError> {
        self.check(a.mark_id())?;
        self.check(b.mark_id())?;
        self.inner.score_pair(a, b, context)
    }

    fn score_global(
        &self,
        configuration: &Configuration<M>,
        context: &EnergyContext,
    ) -> Result<f64, EvaluationError> {
        if self.fail_global.load(Ordering::SeqCst) {
            return Err(EvaluationError::new("injected global failure"));
        }
        self.inner.score_global(configuration, context)
    }
}

/// Wraps an evaluator and records every call.
#[derive(Debug, Default)]
pub struct CountingEvaluator<E> {
    inner: E,
    pairs: Mutex<Vec<(MarkId, MarkId)>>,
    individuals: Mutex<Vec<MarkId>>,
    globals: Mutex<usize>,
}

impl<E> CountingEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            pairs: Mutex::new(Vec::new()),
            individuals: Mutex::new(Vec::new()),
            globals: Mutex::new(0),
        }
    }

    /// Scored pairs in call order, as `(argument a, argument b)`.
    pub fn pair_calls(&self) -> Vec<(MarkId, MarkId)> {
        self.pairs.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn individual_calls(&self) -> Vec<MarkId> {
        self.individuals.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn global_calls(&self) -> usize {
        self.globals.lock().map(|g| *g).unwrap_or_default()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        if let Ok(mut p) = self.pairs.lock() {
            p.clear();
        }
        if let Ok(mut i) = self.individuals.lock() {
            i.clear();
        }
        if let Ok(mut g) = self.globals.lock() {
            *g = 0;
        }
    }
}

impl<M: Mark, E: EnergyEvaluator<M>> EnergyEvaluator<M> for CountingEvaluator<E> {
    fn score_individual(&self, mark: &M, context: &EnergyContext) -> Result<f64, EvaluationError> {
        if let Ok(mut calls) = self.individuals.lock() {
            calls.push(mark.mark_id());
        }
        self.inner.score_individual(mark, context)
    }

    fn score_pair(&self, a: &M, b: &M, context: &EnergyContext) -> Result<f64, EvaluationError> {
        if let Ok(mut calls) = self.pairs.lock() {
            calls.push((a.mark_id(), b.mark_id()));
        }
        self.inner.score_pair(a, b, context)
    }

    fn score_global(
        &self,
        configuration: &Configuration<M>,
        context: &EnergyContext,
    ) -> Result<f64, EvaluationError> {
        if let Ok(mut calls) = self.globals.lock() {
            *calls += 1;
        }
        self.inner.score_global(configuration, context)
    }
}
