//! Mark identity.

use std::fmt::{self, Debug, Display};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a mark.
///
/// Two marks with the same id are never part of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkId(pub u64);

impl MarkId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for MarkId {
    fn from(value: u64) -> Self {
        MarkId(value)
    }
}

/// A parameterized geometric primitive representing one candidate object.
///
/// The geometry is opaque to the core: it is only identified and handed to
/// evaluators and pairing criteria. Marks are immutable once placed in a
/// configuration; a changed mark is a new value swapped in by `exchange`.
///
/// # Example
///
/// ```
/// use markforge_core::{Mark, MarkId};
///
/// #[derive(Clone, Debug)]
/// struct Ellipse {
///     id: MarkId,
///     center: (f64, f64),
///     radii: (f64, f64),
/// }
///
/// impl Mark for Ellipse {
///     fn mark_id(&self) -> MarkId { self.id }
/// }
///
/// let e = Ellipse { id: MarkId(7), center: (3.0, 4.0), radii: (2.0, 1.0) };
/// assert_eq!(e.mark_id(), MarkId(7));
/// ```
///
/// # Thread Safety
///
/// Marks must be `Send + Sync` so independent configurations can be searched
/// on separate threads.
pub trait Mark: Clone + Debug + Send + Sync + 'static {
    /// Returns the identity of this mark.
    ///
    /// This must never change for the lifetime of the value.
    fn mark_id(&self) -> MarkId;
}

/// Thread-safe source of fresh mark identities.
///
/// Share one generator (behind an `Arc`) between every kernel that creates
/// marks so that born, merged and split marks never collide.
#[derive(Debug, Default)]
pub struct MarkIdGenerator {
    next: AtomicU64,
}

impl MarkIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Creates a generator that continues after the highest id in `ids`.
    ///
    /// Saturates at `u64::MAX`.
    pub fn after<I: IntoIterator<Item = MarkId>>(ids: I) -> Self {
        let first = ids
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self::starting_at(first)
    }

    /// Returns a fresh id.
    pub fn next_id(&self) -> MarkId {
        MarkId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to `next_id` will produce.
    pub fn peek(&self) -> MarkId {
        MarkId(self.next.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_monotonic() {
        let ids = MarkIdGenerator::starting_at(5);
        assert_eq!(ids.next_id(), MarkId(5));
        assert_eq!(ids.next_id(), MarkId(6));
        assert_eq!(ids.peek(), MarkId(7));
    }

    #[test]
    fn test_generator_after_existing_ids() {
        let ids = MarkIdGenerator::after([MarkId(3), MarkId(11), MarkId(4)]);
        assert_eq!(ids.next_id(), MarkId(12));

        let empty = MarkIdGenerator::after(std::iter::empty());
        assert_eq!(empty.next_id(), MarkId(0));
    }

    #[test]
    fn test_generator_after_max_id() {
        let ids = MarkIdGenerator::after([MarkId(7), MarkId(u64::MAX)]);
        assert_eq!(ids.peek(), MarkId(u64::MAX));
    }

    #[test]
    fn test_generator_shared_across_threads() {
        use std::collections::HashSet;
        use std::sync::{Arc, Mutex};

        let ids = Arc::new(MarkIdGenerator::new());
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                let seen = Arc::clone(&seen);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let id = ids.next_id();
                        assert!(seen.lock().unwrap().insert(id));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 400);
    }

    #[test]
    fn test_mark_id_display() {
        assert_eq!(MarkId(42).to_string(), "#42");
        assert_eq!(MarkId::from(3).value(), 3);
    }
}
