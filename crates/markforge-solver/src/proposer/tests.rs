use std::sync::Arc;

use markforge_core::{Configuration, MarkForgeError, MarkIdGenerator};
use markforge_scoring::{EnergyBreakdown, EnergyModel, InvariantCheck};
use markforge_test::{
    disc_context, Disc, DiscEvaluator, DiscSampler, OverlapCriterion, ScriptedRandom,
};

use super::*;
use crate::kernel::{BirthKernel, DeathKernel, InitialFillKernel};

type DiscBuilder = KernelProposerBuilder<Disc, DiscEvaluator, OverlapCriterion>;

fn breakdown(marks: Vec<Disc>) -> EnergyBreakdown<Disc, DiscEvaluator, OverlapCriterion> {
    let model = Arc::new(
        EnergyModel::new(DiscEvaluator::default(), OverlapCriterion, disc_context())
            .with_invariant_check(InvariantCheck::Full),
    );
    EnergyBreakdown::from_configuration(model, Configuration::from_marks(marks).unwrap()).unwrap()
}

fn ids() -> Arc<MarkIdGenerator> {
    Arc::new(MarkIdGenerator::starting_at(100))
}

fn builder() -> DiscBuilder {
    let sampler = Arc::new(DiscSampler::default());
    KernelProposerBuilder::new(InitialFillKernel::new(sampler, ids(), 3))
}

#[test]
fn test_cumulative_distribution() {
    let proposer = builder()
        .kernel(DeathKernel::new(), 1.0)
        .kernel(BirthKernel::new(Arc::new(DiscSampler::default()), ids()), 3.0)
        .build()
        .unwrap();

    assert_eq!(proposer.len(), 3);
    assert_eq!(proposer.cumulative(), &[0.0, 0.25, 1.0]);
    assert_eq!(proposer.propose_index(0.0).unwrap(), 1);
    assert_eq!(proposer.propose_index(0.1).unwrap(), 1);
    assert_eq!(proposer.propose_index(0.25).unwrap(), 2);
    assert_eq!(proposer.propose_index(0.5).unwrap(), 2);
    assert_eq!(proposer.propose_index(0.999_999).unwrap(), 2);
}

#[test]
fn test_initial_kernel_never_drawn() {
    let proposer = builder()
        .kernel(DeathKernel::new(), 2.0)
        .build()
        .unwrap();

    assert_eq!(proposer.initial_kernel().weight(), 0.0);
    assert_eq!(proposer.initial_kernel().name(), "initial");
    for step in 0..100 {
        let r = step as f64 / 100.0;
        assert_ne!(proposer.propose_index(r).unwrap(), 0);
    }
}

#[test]
fn test_trailing_zero_weights_pinned_to_one() {
    let cumulative = cumulative_probabilities(&[0.0, 1.0, 1.0, 0.0]).unwrap();
    assert_eq!(cumulative, vec![0.0, 0.5, 1.0, 1.0]);

    let thirds = cumulative_probabilities(&[0.0, 1.0, 1.0, 1.0]).unwrap();
    assert_eq!(*thirds.last().unwrap(), 1.0);
    assert!(thirds.windows(2).all(|w| w[0] <= w[1]));

    assert!(cumulative_probabilities(&[0.0, 0.0]).is_none());
    assert!(cumulative_probabilities(&[f64::MAX, f64::MAX]).is_none());
}

#[test]
fn test_zero_weight_kernel_between_positive_ones() {
    let proposer = builder()
        .named_kernel(DeathKernel::new(), 1.0, "a")
        .named_kernel(DeathKernel::new(), 0.0, "b")
        .named_kernel(DeathKernel::new(), 1.0, "c")
        .build()
        .unwrap();

    for step in 0..100 {
        let r = step as f64 / 100.0;
        assert_ne!(proposer.propose_index(r).unwrap(), 2);
    }
}

#[test]
fn test_duplicate_names_are_suffixed() {
    let proposer = builder()
        .named_kernel(DeathKernel::new(), 1.0, "split")
        .named_kernel(DeathKernel::new(), 1.0, "split")
        .named_kernel(DeathKernel::new(), 1.0, "merge")
        .build()
        .unwrap();

    let names: Vec<&str> = proposer.names().collect();
    assert_eq!(names, vec!["initial", "split_0", "split_1", "merge"]);
    assert_eq!(proposer.index_of("split_1"), Some(2));
    assert_eq!(proposer.index_of("split"), None);
}

#[test]
fn test_generated_names_skip_taken_ones() {
    let mut names = vec![
        "death".to_string(),
        "death_0".to_string(),
        "death".to_string(),
    ];
    deduplicate_names(&mut names);
    assert_eq!(names, vec!["death_1", "death_0", "death_2"]);
}

#[test]
fn test_build_rejects_missing_kernels() {
    let err = builder().build().unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(_)));

    let err = builder().source(Vec::new()).build().unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(_)));
}

#[test]
fn test_build_rejects_invalid_weights() {
    let err = builder()
        .kernel(DeathKernel::new(), 0.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(_)));

    let err = builder()
        .kernel(DeathKernel::new(), 1.0)
        .kernel(DeathKernel::new(), -1.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(_)));

    let err = builder()
        .kernel(DeathKernel::new(), f64::NAN)
        .build()
        .unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(_)));

    let err = builder()
        .kernel(DeathKernel::new(), f64::MAX)
        .kernel(DeathKernel::new(), f64::MAX)
        .build()
        .unwrap_err();
    assert!(matches!(err, MarkForgeError::Initialization(msg) if msg.contains("not finite")));
}

#[test]
fn test_propose_index_rejects_out_of_range() {
    let proposer = builder().kernel(DeathKernel::new(), 1.0).build().unwrap();
    for r in [1.0, -0.1, 2.0, f64::NAN] {
        let err = proposer.propose_index(r).unwrap_err();
        assert!(matches!(err, MarkForgeError::Internal(_)));
    }
}

#[test]
fn test_propose_on_copy_leaves_current_untouched() {
    let current = breakdown(vec![
        Disc::new(1, 10.0, 10.0, 2.0),
        Disc::new(2, 13.0, 10.0, 2.0),
    ]);
    let before = current.totals();
    let mut proposer = builder().kernel(DeathKernel::new(), 1.0).build().unwrap();

    // Kernel draw, then the death index.
    let candidate = proposer
        .propose_on_copy(&current, &mut ScriptedRandom::new([0.5, 0.0]))
        .unwrap();

    assert_eq!(candidate.kernel_index, 1);
    assert_eq!(candidate.kernel_name, "death");
    assert_eq!(candidate.outcome, KernelOutcome::Applied);
    assert_eq!(candidate.breakdown.len(), 1);
    assert_eq!(current.totals(), before);
    assert!((candidate.delta - (candidate.breakdown.total() - current.total())).abs() < 1e-12);
    candidate.breakdown.verify_from_scratch().unwrap();
}

#[test]
fn test_propose_and_apply_in_place() {
    let mut current = breakdown(vec![Disc::new(1, 50.0, 50.0, 2.0)]);
    let mut proposer = builder().kernel(DeathKernel::new(), 1.0).build().unwrap();

    let application = proposer
        .propose_and_apply(&mut current, &mut ScriptedRandom::new([0.3, 0.0]))
        .unwrap();

    assert_eq!(
        application,
        KernelApplication {
            kernel_index: 1,
            outcome: KernelOutcome::Applied,
        }
    );
    assert!(current.is_empty());

    let application = proposer
        .propose_and_apply(&mut current, &mut ScriptedRandom::new([0.3]))
        .unwrap();
    assert_eq!(application.outcome, KernelOutcome::NoProposal);
}

#[test]
fn test_apply_initial_fills_configuration() {
    let mut current = breakdown(Vec::new());
    let mut proposer = builder().kernel(DeathKernel::new(), 1.0).build().unwrap();

    // Three discs on a diagonal, far enough apart not to overlap.
    let script = [0.1, 0.1, 0.0, 0.4, 0.4, 0.0, 0.7, 0.7, 0.0];
    let outcome = proposer
        .apply_initial(&mut current, &mut ScriptedRandom::new(script))
        .unwrap();

    assert_eq!(outcome, KernelOutcome::Applied);
    assert_eq!(current.len(), 3);
    assert_eq!(current.pairwise().edge_count(), 0);
}

#[test]
fn test_statistics_and_reset() {
    let mut current = breakdown(vec![Disc::new(1, 50.0, 50.0, 2.0)]);
    let mut proposer = builder().kernel(DeathKernel::new(), 1.0).build().unwrap();
    let mut random = ScriptedRandom::new([0.5]);

    proposer.propose_and_apply(&mut current, &mut random).unwrap();
    proposer.propose_and_apply(&mut current, &mut random).unwrap();

    let stats: Vec<(&str, KernelStatistics)> = proposer
        .statistics()
        .map(|(name, stats)| (name, *stats))
        .collect();
    assert_eq!(stats[0].1, KernelStatistics::default());
    assert_eq!(stats[1].0, "death");
    assert_eq!(stats[1].1.proposals, 2);
    assert_eq!(stats[1].1.applied, 1);
    assert_eq!(stats[1].1.no_proposal, 1);

    proposer.reset_kernels();
    assert!(proposer
        .statistics()
        .all(|(_, stats)| *stats == KernelStatistics::default()));
}
