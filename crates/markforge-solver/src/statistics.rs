//! Per-kernel proposal statistics.

use markforge_core::Result;

use crate::kernel::KernelOutcome;

/// Counters for one kernel, reset together with the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelStatistics {
    /// Times the kernel was applied.
    pub proposals: u64,
    /// Applications that transformed the configuration.
    pub applied: u64,
    /// Applications that found no valid proposal.
    pub no_proposal: u64,
    /// Applications that failed with an error.
    pub errors: u64,
}

impl KernelStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result of one application.
    pub fn record(&mut self, result: &Result<KernelOutcome>) {
        self.proposals += 1;
        match result {
            Ok(KernelOutcome::Applied) => self.applied += 1,
            Ok(KernelOutcome::NoProposal) => self.no_proposal += 1,
            Err(_) => self.errors += 1,
        }
    }

    /// Returns the success rate (applied / proposals).
    pub fn applied_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.applied as f64 / self.proposals as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markforge_core::MarkForgeError;

    #[test]
    fn test_record_and_reset() {
        let mut stats = KernelStatistics::new();
        stats.record(&Ok(KernelOutcome::Applied));
        stats.record(&Ok(KernelOutcome::NoProposal));
        stats.record(&Ok(KernelOutcome::Applied));
        stats.record(&Err(MarkForgeError::Internal("boom".to_string())));

        assert_eq!(stats.proposals, 4);
        assert_eq!(stats.applied, 2);
        assert_eq!(stats.no_proposal, 1);
        assert_eq!(stats.errors, 1);
        assert!((stats.applied_rate() - 0.5).abs() < 1e-12);

        stats.reset();
        assert_eq!(stats, KernelStatistics::default());
        assert_eq!(stats.applied_rate(), 0.0);
    }
}
