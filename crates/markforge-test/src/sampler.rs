//! Disc sampler for kernel tests.

use markforge_core::{MarkId, MarkSampler, RandomSource};

use crate::disc::Disc;

/// Samples discs inside a square area.
///
/// Draw order per call:
/// - `sample`: x, y, radius
/// - `perturb`: dx, dy
/// - `merge` and `split` draw nothing
#[derive(Debug, Clone)]
pub struct DiscSampler {
    pub low: f64,
    pub high: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub step: f64,
}

impl Default for DiscSampler {
    fn default() -> Self {
        Self {
            low: 5.0,
            high: 95.0,
            min_radius: 1.0,
            max_radius: 4.0,
            step: 2.0,
        }
    }
}

impl MarkSampler<Disc> for DiscSampler {
    fn sample(&self, id: MarkId, random: &mut dyn RandomSource) -> Option<Disc> {
        let x = random.next_in_range(self.low, self.high);
        let y = random.next_in_range(self.low, self.high);
        let radius = random.next_in_range(self.min_radius, self.max_radius);
        Some(Disc::new(id.value(), x, y, radius))
    }

    fn perturb(&self, mark: &Disc, random: &mut dyn RandomSource) -> Option<Disc> {
        let dx = random.next_in_range(-self.step, self.step);
        let dy = random.next_in_range(-self.step, self.step);
        Some(Disc {
            x: (mark.x + dx).clamp(self.low, self.high),
            y: (mark.y + dy).clamp(self.low, self.high),
            ..mark.clone()
        })
    }

    fn merge(&self, a: &Disc, b: &Disc, id: MarkId, _random: &mut dyn RandomSource) -> Option<Disc> {
        // Area preserving.
        let radius = (a.radius.powi(2) + b.radius.powi(2)).sqrt();
        if radius > self.max_radius * 2.0 {
            return None;
        }
        Some(Disc::new(
            id.value(),
            (a.x + b.x) / 2.0,
            (a.y + b.y) / 2.0,
            radius,
        ))
    }

    fn split(
        &self,
        mark: &Disc,
        ids: (MarkId, MarkId),
        _random: &mut dyn RandomSource,
    ) -> Option<(Disc, Disc)> {
        let radius = mark.radius / std::f64::consts::SQRT_2;
        if radius < self.min_radius {
            return None;
        }
        let offset = mark.radius / 2.0;
        Some((
            Disc::new(ids.0.value(), mark.x - offset, mark.y, radius),
            Disc::new(ids.1.value(), mark.x + offset, mark.y, radius),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_sample_draws_in_order() {
        let mut random = ScriptedRandom::new([0.0, 0.5, 1.0 / 3.0]);
        let disc = DiscSampler::default()
            .sample(MarkId(7), &mut random)
            .unwrap();
        assert_eq!(disc.id, MarkId(7));
        assert_eq!(disc.x, 5.0);
        assert_eq!(disc.y, 50.0);
        assert!((disc.radius - 2.0).abs() < 1e-12);
        assert_eq!(random.drawn(), 3);
    }

    #[test]
    fn test_split_respects_min_radius() {
        let sampler = DiscSampler::default();
        let mut random = ScriptedRandom::new([0.5]);
        let small = Disc::new(1, 50.0, 50.0, 1.2);
        assert!(sampler
            .split(&small, (MarkId(2), MarkId(3)), &mut random)
            .is_none());

        let (a, b) = sampler
            .split(&Disc::new(1, 50.0, 50.0, 3.0), (MarkId(2), MarkId(3)), &mut random)
            .unwrap();
        assert_eq!((a.id, b.id), (MarkId(2), MarkId(3)));
        assert!(a.x < b.x);
    }
}
