//! Move kernels.
//!
//! A kernel attempts one structural transform of a configuration through the
//! [`EnergyBreakdown`] mutation API. Failing to find a proposal is a normal
//! outcome ([`KernelOutcome::NoProposal`]), not an error.
//!
//! Kernels that need several mutations (merge, split) compensate the earlier
//! steps when a later one fails, so a kernel either applies completely or
//! leaves the breakdown unchanged.

mod birth;
mod death;
mod exchange;
mod initial;
mod merge;
mod split;


use std::fmt;

use markforge_core::{EnergyEvaluator, Mark, PairingCriterion, RandomSource, Result};
use markforge_scoring::EnergyBreakdown;

pub use birth::BirthKernel;
pub use death::DeathKernel;
pub use exchange::ExchangeKernel;
pub use initial::InitialFillKernel;
pub use merge::MergeKernel;
pub use split::SplitKernel;

/// Result of one kernel application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelOutcome {
    /// The breakdown was transformed.
    Applied,
    /// No valid proposal was found; the breakdown is unchanged.
    NoProposal,
}

impl KernelOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, KernelOutcome::Applied)
    }
}

impl fmt::Display for KernelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelOutcome::Applied => f.write_str("applied"),
            KernelOutcome::NoProposal => f.write_str("no_proposal"),
        }
    }
}

/// A move strategy transforming a configuration.
///
/// # Type Parameters
/// * `M` - The mark type
/// * `E` - The energy evaluator
/// * `P` - The pairing criterion
pub trait Kernel<M, E, P>: Send
where
    M: Mark,
    E: EnergyEvaluator<M>,
    P: PairingCriterion<M>,
{
    /// Attempts one transform of `breakdown`.
    ///
    /// Errors are mutation errors from the breakdown; the breakdown is left
    /// as it was before the call.
    fn try_apply(
        &mut self,
        breakdown: &mut EnergyBreakdown<M, E, P>,
        random: &mut dyn RandomSource,
    ) -> Result<KernelOutcome>;

    /// Short type name, used as the default display name.
    fn kernel_type(&self) -> &'static str;

    /// Clears internal state between searches.
    fn reset(&mut self) {}
}
