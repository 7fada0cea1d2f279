//! Compensated running sums for the energy terms.

/// Neumaier-compensated sum.
///
/// Adding a large contribution and later removing it again leaves the small
/// contributions intact, where a plain `f64` accumulator would keep the
/// rounding error of the large one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn of<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sum = Self::new();
        for value in values {
            sum.add(value);
        }
        sum
    }

    pub(crate) fn add(&mut self, value: f64) {
        let next = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - next) + value;
        } else {
            self.compensation += (value - next) + self.sum;
        }
        self.sum = next;
    }

    pub(crate) fn sub(&mut self, value: f64) {
        self.add(-value);
    }

    pub(crate) fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_contribution_cancels_exactly() {
        let mut sum = CompensatedSum::new();
        sum.add(1e13);
        for _ in 0..50 {
            sum.add(0.1);
        }
        sum.sub(1e13);
        assert!((sum.value() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_of_matches_plain_sum_on_exact_values() {
        let sum = CompensatedSum::of([1.0, 2.5, -0.5]);
        assert_eq!(sum.value(), 3.0);
        assert_eq!(CompensatedSum::new().value(), 0.0);
    }
}
