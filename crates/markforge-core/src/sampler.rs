//! Mark proposal contract used by the search kernels.

use crate::mark::{Mark, MarkId};
use crate::random::RandomSource;

/// Draws new marks and derives marks from existing ones.
///
/// The geometry of a mark is opaque to the core, so every kernel that
/// invents a mark asks the sampler for it. Returning `None` means no valid
/// proposal could be made; kernels report that as a non-error outcome.
///
/// Only [`sample`](Self::sample) is required. The derived proposals default
/// to `None`, which disables the corresponding kernels.
pub trait MarkSampler<M: Mark>: Send + Sync {
    /// A fresh mark carrying identity `id`.
    fn sample(&self, id: MarkId, random: &mut dyn RandomSource) -> Option<M>;

    /// A modified copy of `mark`, normally keeping its identity.
    fn perturb(&self, _mark: &M, _random: &mut dyn RandomSource) -> Option<M> {
        None
    }

    /// One mark, with identity `id`, replacing the interacting pair `a`, `b`.
    fn merge(&self, _a: &M, _b: &M, _id: MarkId, _random: &mut dyn RandomSource) -> Option<M> {
        None
    }

    /// Two marks, with identities `ids`, replacing `mark`.
    fn split(
        &self,
        _mark: &M,
        _ids: (MarkId, MarkId),
        _random: &mut dyn RandomSource,
    ) -> Option<(M, M)> {
        None
    }
}
