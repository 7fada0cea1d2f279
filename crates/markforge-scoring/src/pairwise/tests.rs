use super::*;
use markforge_test::{Disc, DiscEvaluator, OverlapCriterion};

fn id(n: u64) -> MarkId {
    MarkId(n)
}

fn chain() -> Configuration<Disc> {
    // 1-2 and 2-3 overlap, 1-3 and 4 are isolated.
    Configuration::from_marks([
        Disc::new(1, 10.0, 10.0, 2.0),
        Disc::new(2, 13.0, 10.0, 2.0),
        Disc::new(3, 16.0, 10.0, 2.0),
        Disc::new(4, 60.0, 60.0, 1.0),
    ])
    .unwrap()
}

fn build(configuration: &Configuration<Disc>, parallel: bool) -> EnergyPairwise {
    EnergyPairwise::build(
        configuration,
        &DiscEvaluator::default(),
        &OverlapCriterion,
        &EnergyContext::default(),
        parallel,
    )
    .unwrap()
}

#[test]
fn test_build_finds_interacting_pairs() {
    let pairwise = build(&chain(), false);

    assert_eq!(pairwise.edge_count(), 2);
    assert!(pairwise.has_edge(id(1), id(2)));
    assert!(pairwise.has_edge(id(3), id(2)));
    assert!(!pairwise.has_edge(id(1), id(3)));
    assert!((pairwise.total() - 2.0).abs() < 1e-12);
    assert_eq!(pairwise.degree(id(2)), 2);
    assert!(pairwise.neighbours(id(4)).is_empty());
    assert!(pairwise.structure_error().is_none());
}

#[test]
fn test_parallel_build_matches_sequential() {
    let configuration = chain();
    let sequential = build(&configuration, false);
    let parallel = build(&configuration, true);

    assert_eq!(sequential.sorted_edges(), parallel.sorted_edges());
    assert_eq!(sequential.total(), parallel.total());
}

#[test]
fn test_pending_edges_skip_positions() {
    let configuration = chain();
    let candidate = Disc::new(9, 13.0, 10.0, 2.0);

    let all = PendingEdges::score(
        &candidate,
        &configuration,
        &[],
        &DiscEvaluator::default(),
        &OverlapCriterion,
        &EnergyContext::default(),
    )
    .unwrap();
    assert_eq!(all.len(), 3);

    let skipped = PendingEdges::score(
        &candidate,
        &configuration,
        &[1],
        &DiscEvaluator::default(),
        &OverlapCriterion,
        &EnergyContext::default(),
    )
    .unwrap();
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|(other, _)| other != id(2)));
}

#[test]
fn test_commit_and_remove() {
    let configuration = chain();
    let mut pairwise = build(&configuration, false);
    let before = pairwise.total();

    let candidate = Disc::new(9, 11.0, 10.0, 1.0);
    let pending = PendingEdges::score(
        &candidate,
        &configuration,
        &[],
        &DiscEvaluator::default(),
        &OverlapCriterion,
        &EnergyContext::default(),
    )
    .unwrap();
    let expected = pending.sum();
    assert_eq!(pairwise.commit(pending), expected);
    assert!((pairwise.total() - (before + expected)).abs() < 1e-12);

    let removed = pairwise.remove(id(9));
    assert!((removed - expected).abs() < 1e-12);
    assert!((pairwise.total() - before).abs() < 1e-12);
    assert_eq!(pairwise.degree(id(9)), 0);
    assert!(pairwise.structure_error().is_none());
}

#[test]
fn test_remove_two_counts_mutual_edge_once() {
    let mut pairwise = build(&chain(), false);
    let combined = pairwise.combined_contribution(id(1), id(2));

    // 1-2 (1.0) and 2-3 (1.0); the mutual edge must not be subtracted twice.
    assert!((combined - 2.0).abs() < 1e-12);
    let removed = pairwise.remove_two(id(1), id(2));
    assert!((removed - combined).abs() < 1e-12);
    assert!(pairwise.is_empty());
    assert!(pairwise.total().abs() < 1e-12);
}

#[test]
fn test_exchange_reusing_identity() {
    let configuration = chain();
    let mut pairwise = build(&configuration, false);

    // Move mark 3 next to mark 4 while keeping its identity.
    let moved = Disc::new(3, 61.0, 60.0, 1.0);
    let pending = PendingEdges::score(
        &moved,
        &configuration,
        &[2],
        &DiscEvaluator::default(),
        &OverlapCriterion,
        &EnergyContext::default(),
    )
    .unwrap();
    let delta = pairwise.exchange(id(3), pending);

    assert!(!pairwise.has_edge(id(2), id(3)));
    assert!(pairwise.has_edge(id(3), id(4)));
    assert!((delta - (1.0 - 1.0)).abs() < 1e-12);
    assert!(pairwise.structure_error().is_none());
    assert!((pairwise.total() - pairwise.recomputed_total()).abs() < 1e-12);
}

#[test]
fn test_remove_unknown_mark_is_noop() {
    let mut pairwise = build(&chain(), false);
    assert_eq!(pairwise.remove(id(42)), 0.0);
    assert_eq!(pairwise.edge_count(), 2);
}

#[test]
fn test_contribution_of() {
    let pairwise = build(&chain(), false);
    assert!((pairwise.contribution_of(id(2)) - 2.0).abs() < 1e-12);
    assert!((pairwise.contribution_of(id(1)) - 1.0).abs() < 1e-12);
    assert_eq!(pairwise.contribution_of(id(4)), 0.0);
}
