//! Uniform random source contract.

/// A source of uniform random values in `[0, 1)`.
///
/// Every stochastic decision of the core is derived from `next_uniform`, so
/// a seeded or scripted source reproduces a search exactly.
pub trait RandomSource {
    /// Returns a value in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Returns an index in `0..len`. `len` must be positive.
    fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "next_index called with empty range");
        let index = (self.next_uniform() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// Returns a value in `[low, high)`.
    fn next_in_range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_uniform()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_uniform(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_next_index_scales_and_clamps() {
        assert_eq!(Fixed(0.0).next_index(4), 0);
        assert_eq!(Fixed(0.49).next_index(4), 1);
        assert_eq!(Fixed(0.999_999).next_index(4), 3);
    }

    #[test]
    fn test_next_in_range() {
        let value = Fixed(0.25).next_in_range(2.0, 6.0);
        assert!((value - 3.0).abs() < 1e-12);
    }

    fn draw<R: RandomSource>(mut random: R) -> f64 {
        random.next_uniform()
    }

    #[test]
    fn test_mutable_reference_forwards() {
        let mut source = Fixed(0.5);
        assert_eq!(draw(&mut source), 0.5);
    }
}
