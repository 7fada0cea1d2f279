//! Energy invariant policy.

/// How thoroughly an [`EnergyBreakdown`](crate::EnergyBreakdown) verifies
/// itself after each mutation.
///
/// Violations are always logged at ERROR level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvariantCheck {
    /// Compares the cached total with the sum of the cached terms.
    ///
    /// Debug builds additionally re-sum every term and panic on a mismatch.
    /// Release builds only log.
    #[default]
    Log,

    /// Re-sums every term from its stored contributions; a mismatch rolls
    /// the mutation back and fails it with `InvariantViolation`.
    Fast,

    /// Like `Fast`, and re-scores the whole configuration from scratch,
    /// checking pairwise edge exactness.
    Full,
}

impl InvariantCheck {
    /// Returns true if violations are reported as errors.
    pub fn is_fatal(self) -> bool {
        !matches!(self, InvariantCheck::Log)
    }

    /// Returns true if stored contributions are re-summed after mutations.
    pub fn resums_terms(self) -> bool {
        self.is_fatal() || cfg!(debug_assertions)
    }
}

/// Tolerance comparison used by all energy invariants.
///
/// Absolute for energies near zero, relative for large magnitudes so that
/// accumulated rounding on big totals does not trip the check.
pub(crate) fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = 1.0 + a.abs().max(b.abs());
    (a - b).abs() <= tolerance * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(1.0, 1.0 + 1e-9, 1e-6));
        assert!(!within_tolerance(1.0, 1.0 + 1e-3, 1e-6));
        assert!(within_tolerance(1e9, 1e9 + 1.0, 1e-6));
        assert!(!within_tolerance(0.0, f64::NAN, 1e-6));
    }

    #[test]
    fn test_policy_flags() {
        assert!(!InvariantCheck::Log.is_fatal());
        assert!(InvariantCheck::Fast.is_fatal());
        assert!(InvariantCheck::Full.resums_terms());
    }
}
