//! Whole-configuration energy.

use markforge_core::{Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Mark};

/// The global term, recomputed from scratch after every structural change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyGlobal {
    total: f64,
}

impl EnergyGlobal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Scores `configuration` without storing the result.
    pub fn compute<M, E>(
        configuration: &Configuration<M>,
        evaluator: &E,
        context: &EnergyContext,
    ) -> Result<f64, EvaluationError>
    where
        M: Mark,
        E: EnergyEvaluator<M>,
    {
        evaluator.score_global(configuration, context)
    }

    /// Stores a previously computed value, returning the old one.
    pub fn set(&mut self, total: f64) -> f64 {
        std::mem::replace(&mut self.total, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markforge_test::{Disc, DiscEvaluator};

    #[test]
    fn test_compute_and_set() {
        let configuration =
            Configuration::from_marks([Disc::new(1, 10.0, 10.0, 1.0), Disc::new(2, 50.0, 50.0, 2.0)])
                .unwrap();
        let evaluator = DiscEvaluator::default();

        let value =
            EnergyGlobal::compute(&configuration, &evaluator, &EnergyContext::default()).unwrap();
        assert_eq!(value, evaluator.global_for(2));

        let mut global = EnergyGlobal::new();
        assert_eq!(global.set(value), 0.0);
        assert_eq!(global.total(), value);
    }
}
