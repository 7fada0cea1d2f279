//! Sparse pairwise interaction graph.
//!
//! Edges are keyed by mark identity, never by position, so removals and
//! exchanges elsewhere in the configuration cannot invalidate them. Each
//! unordered pair is stored once under its canonical `(low, high)` key.

use std::collections::HashMap;

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::{error, trace};

use markforge_core::{
    Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark, MarkId,
    PairingCriterion,
};

use crate::sum::CompensatedSum;

/// One interacting pair, `low < high`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEdge {
    pub low: MarkId,
    pub high: MarkId,
    pub energy: f64,
}

#[inline]
fn canonical(a: MarkId, b: MarkId) -> (MarkId, MarkId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Edges scored for one mark but not yet committed to a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdges {
    mark: MarkId,
    edges: Vec<(MarkId, f64)>,
}

impl PendingEdges {
    /// Scores `mark` against every interacting mark of `existing`.
    ///
    /// Positions in `skip` are ignored, as is any mark sharing the identity
    /// of `mark`. Nothing is stored: a failure leaves no trace.
    pub fn score<M, E, P>(
        mark: &M,
        existing: &Configuration<M>,
        skip: &[usize],
        evaluator: &E,
        criterion: &P,
        context: &EnergyContext,
    ) -> Result<Self, EvaluationError>
    where
        M: Mark,
        E: EnergyEvaluator<M>,
        P: PairingCriterion<M>,
    {
        let id = mark.mark_id();
        let mut edges = Vec::new();
        for index in criterion.candidates(mark, existing, skip) {
            let Some(other) = existing.get(index) else {
                continue;
            };
            if other.mark_id() == id {
                continue;
            }
            let energy = evaluator.score_pair(mark, other, context)?;
            edges.push((other.mark_id(), energy));
        }
        Ok(Self { mark: id, edges })
    }

    pub fn mark(&self) -> MarkId {
        self.mark
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.edges.iter().map(|(_, energy)| energy).sum()
    }

    /// `(partner, energy)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (MarkId, f64)> + '_ {
        self.edges.iter().copied()
    }
}

/// The pairwise energy term.
#[derive(Debug, Clone, Default)]
pub struct EnergyPairwise {
    /// (low, high) -> energy
    edges: HashMap<(MarkId, MarkId), f64>,
    /// mark -> partners it shares an edge with
    adjacency: HashMap<MarkId, SmallVec<[MarkId; 8]>>,
    total: CompensatedSum,
}

impl EnergyPairwise {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores every interacting pair of `configuration`.
    ///
    /// With `parallel` set, rows of the pair matrix are scored on the rayon
    /// pool; edges are committed in row order either way.
    pub fn build<M, E, P>(
        configuration: &Configuration<M>,
        evaluator: &E,
        criterion: &P,
        context: &EnergyContext,
        parallel: bool,
    ) -> Result<Self, EvaluationError>
    where
        M: Mark,
        E: EnergyEvaluator<M>,
        P: PairingCriterion<M>,
    {
        let marks = configuration.marks();
        let row = |i: usize| -> Result<Vec<(MarkId, MarkId, f64)>, EvaluationError> {
            let a = &*marks[i];
            let mut found = Vec::new();
            for other in &marks[i + 1..] {
                let b = &**other;
                if criterion.interacts(a, b) {
                    let energy = evaluator.score_pair(a, b, context)?;
                    found.push((a.mark_id(), b.mark_id(), energy));
                }
            }
            Ok(found)
        };

        let rows: Vec<Vec<(MarkId, MarkId, f64)>> = if parallel {
            (0..marks.len()).into_par_iter().map(row).collect::<Result<_, _>>()?
        } else {
            (0..marks.len()).map(row).collect::<Result<_, _>>()?
        };

        let mut pairwise = Self::new();
        for (a, b, energy) in rows.into_iter().flatten() {
            pairwise.insert_edge(a, b, energy);
        }
        Ok(pairwise)
    }

    pub fn total(&self) -> f64 {
        self.total.value()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn has_edge(&self, a: MarkId, b: MarkId) -> bool {
        self.edges.contains_key(&canonical(a, b))
    }

    pub fn edge_energy(&self, a: MarkId, b: MarkId) -> Option<f64> {
        self.edges.get(&canonical(a, b)).copied()
    }

    /// Marks sharing an edge with `id`.
    pub fn neighbours(&self, id: MarkId) -> &[MarkId] {
        self.adjacency.get(&id).map(|n| n.as_slice()).unwrap_or(&[])
    }

    pub fn degree(&self, id: MarkId) -> usize {
        self.neighbours(id).len()
    }

    /// Marks with at least one edge.
    pub fn connected_marks(&self) -> impl Iterator<Item = MarkId> + '_ {
        self.adjacency.keys().copied()
    }

    /// All edges, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = PairEdge> + '_ {
        self.edges.iter().map(|(&(low, high), &energy)| PairEdge { low, high, energy })
    }

    /// All edges ordered by `(low, high)`.
    pub fn sorted_edges(&self) -> Vec<PairEdge> {
        let mut edges: Vec<PairEdge> = self.edges().collect();
        edges.sort_by_key(|e| (e.low, e.high));
        edges
    }

    /// Sum of the energies of all edges incident to `id`.
    pub fn contribution_of(&self, id: MarkId) -> f64 {
        self.neighbours(id)
            .iter()
            .filter_map(|&other| self.edge_energy(id, other))
            .sum()
    }

    /// Incident energy of `a` and `b` together, counting their mutual edge once.
    pub fn combined_contribution(&self, a: MarkId, b: MarkId) -> f64 {
        self.contribution_of(a) + self.contribution_of(b) - self.edge_energy(a, b).unwrap_or(0.0)
    }

    /// Commits previously scored edges, returning their energy sum.
    pub fn commit(&mut self, pending: PendingEdges) -> f64 {
        let sum = pending.sum();
        for (other, energy) in pending.edges {
            if let Some(replaced) = self.insert_edge(pending.mark, other, energy) {
                error!(
                    event = "duplicate_edge",
                    a = %pending.mark,
                    b = %other,
                    replaced,
                    energy,
                );
            }
        }
        sum
    }

    /// Removes every edge incident to `id`, returning their energy sum.
    pub fn remove(&mut self, id: MarkId) -> f64 {
        let Some(partners) = self.adjacency.remove(&id) else {
            return 0.0;
        };
        let mut removed = 0.0;
        for other in partners {
            if let Some(energy) = self.edges.remove(&canonical(id, other)) {
                self.total.sub(energy);
                removed += energy;
                trace!(event = "edge_removed", a = %id, b = %other, energy);
            }
            self.detach(other, id);
        }
        removed
    }

    /// Removes the edges of two marks, their mutual edge once.
    pub fn remove_two(&mut self, a: MarkId, b: MarkId) -> f64 {
        self.remove(a) + self.remove(b)
    }

    /// Replaces the edges of `old` with `pending`, returning the net change.
    ///
    /// `pending` must have been scored against the configuration with `old`
    /// skipped. It may carry the same identity as `old`.
    pub fn exchange(&mut self, old: MarkId, pending: PendingEdges) -> f64 {
        let removed = self.remove(old);
        let added = self.commit(pending);
        added - removed
    }

    /// Sum of the stored edge energies, ignoring the cached total.
    pub fn recomputed_total(&self) -> f64 {
        CompensatedSum::of(self.edges.values().copied()).value()
    }

    /// Replaces the cached total with a fresh sum.
    pub fn resync(&mut self) {
        self.total = CompensatedSum::of(self.edges.values().copied());
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.adjacency.clear();
        self.total = CompensatedSum::new();
    }

    /// Checks that adjacency and edge map describe the same graph.
    pub(crate) fn structure_error(&self) -> Option<String> {
        let mut half_edges = 0usize;
        for (&id, partners) in &self.adjacency {
            for &other in partners {
                if !self.edges.contains_key(&canonical(id, other)) {
                    return Some(format!("adjacency {id} -> {other} has no edge"));
                }
            }
            half_edges += partners.len();
        }
        if half_edges != 2 * self.edges.len() {
            return Some(format!(
                "{} edges but {} adjacency entries",
                self.edges.len(),
                half_edges
            ));
        }
        None
    }

    fn insert_edge(&mut self, a: MarkId, b: MarkId, energy: f64) -> Option<f64> {
        let key = canonical(a, b);
        let replaced = self.edges.insert(key, energy);
        match replaced {
            Some(old) => self.total.sub(old),
            None => {
                self.adjacency.entry(a).or_default().push(b);
                self.adjacency.entry(b).or_default().push(a);
            }
        }
        self.total.add(energy);
        trace!(event = "edge_added", a = %a, b = %b, energy);
        replaced
    }

    fn detach(&mut self, id: MarkId, partner: MarkId) {
        if let Some(partners) = self.adjacency.get_mut(&id) {
            partners.retain(|p| *p != partner);
            if partners.is_empty() {
                self.adjacency.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests;
