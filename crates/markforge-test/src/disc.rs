//! Disc marks with closed-form energies.
//!
//! Energies are chosen so expected totals are easy to compute by hand:
//! - individual: `-radius`
//! - pair: overlap depth `max(0, r_a + r_b - distance)`
//! - global: `offset + per_mark * len`

use markforge_core::{
    Configuration, EnergyContext, EnergyEvaluator, EvaluationError, Extent, Mark, MarkId,
    PairingCriterion, RegionMap,
};

/// A disc-shaped mark.
#[derive(Clone, Debug, PartialEq)]
pub struct Disc {
    pub id: MarkId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Disc {
    pub fn new(id: u64, x: f64, y: f64, radius: f64) -> Self {
        Self {
            id: MarkId(id),
            x,
            y,
            radius,
        }
    }

    pub fn distance(&self, other: &Disc) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// How far the two discs overlap along the line between centers.
    pub fn overlap_depth(&self, other: &Disc) -> f64 {
        (self.radius + other.radius - self.distance(other)).max(0.0)
    }
}

impl Mark for Disc {
    fn mark_id(&self) -> MarkId {
        self.id
    }
}

/// Closed-form evaluator for discs.
#[derive(Debug, Clone)]
pub struct DiscEvaluator {
    pub global_offset: f64,
    pub global_per_mark: f64,
}

impl DiscEvaluator {
    pub fn new(global_offset: f64, global_per_mark: f64) -> Self {
        Self {
            global_offset,
            global_per_mark,
        }
    }

    /// Expected global energy for a configuration of `len` marks.
    pub fn global_for(&self, len: usize) -> f64 {
        self.global_offset + self.global_per_mark * len as f64
    }
}

impl Default for DiscEvaluator {
    fn default() -> Self {
        Self::new(0.5, 0.25)
    }
}

impl EnergyEvaluator<Disc> for DiscEvaluator {
    fn score_individual(&self, mark: &Disc, context: &EnergyContext) -> Result<f64, EvaluationError> {
        if let Some(extent) = context.extent() {
            if !extent.contains(mark.x as i64, mark.y as i64, 0) {
                return Err(EvaluationError::for_mark(mark.id, "disc center outside image"));
            }
        }
        Ok(-mark.radius)
    }

    fn score_pair(&self, a: &Disc, b: &Disc, _context: &EnergyContext) -> Result<f64, EvaluationError> {
        Ok(a.overlap_depth(b))
    }

    fn score_global(
        &self,
        configuration: &Configuration<Disc>,
        _context: &EnergyContext,
    ) -> Result<f64, EvaluationError> {
        Ok(self.global_for(configuration.len()))
    }
}

/// Discs interact when their boundaries touch or overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapCriterion;

impl PairingCriterion<Disc> for OverlapCriterion {
    fn interacts(&self, a: &Disc, b: &Disc) -> bool {
        a.distance(b) < a.radius + b.radius
    }
}

/// A 100x100 planar context with "inside" and "shell" regions.
pub fn disc_context() -> EnergyContext {
    let regions = RegionMap::new()
        .with_region("inside")
        .and_then(|r| r.with_region("shell"))
        .unwrap_or_default();
    EnergyContext::new(Extent::planar(100, 100)).with_regions(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Disc::new(1, 0.0, 0.0, 2.0);
        let b = Disc::new(2, 3.0, 0.0, 2.0);
        assert!((a.overlap_depth(&b) - 1.0).abs() < 1e-12);
        assert_eq!(a.overlap_depth(&b), b.overlap_depth(&a));
        assert!(OverlapCriterion.interacts(&a, &b));
        assert!(OverlapCriterion.interacts(&b, &a));
    }

    #[test]
    fn test_evaluator_rejects_out_of_image() {
        let ctx = disc_context();
        let outside = Disc::new(1, -5.0, 10.0, 1.0);
        let err = DiscEvaluator::default()
            .score_individual(&outside, &ctx)
            .unwrap_err();
        assert_eq!(err.mark(), Some(MarkId(1)));
    }
}
