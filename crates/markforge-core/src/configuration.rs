//! Ordered collection of marks forming one candidate segmentation.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{MarkForgeError, Result};
use crate::mark::{Mark, MarkId};

/// An ordered sequence of marks with unique identities.
///
/// Marks are held behind `Arc` so that a [`shallow_copy`](Self::shallow_copy)
/// shares them while keeping an independent index structure. Since marks
/// are never mutated in place, the two copies cannot observe each other's
/// changes. [`deep_copy`](Self::deep_copy) clones every mark instead.
///
/// The configuration knows nothing about energy; it is mutated only through
/// its own operations, each of which either succeeds completely or leaves the
/// configuration untouched.
///
/// # Example
///
/// ```
/// use markforge_core::{Configuration, Mark, MarkId};
///
/// #[derive(Clone, Debug)]
/// struct Dot { id: MarkId }
///
/// impl Mark for Dot {
///     fn mark_id(&self) -> MarkId { self.id }
/// }
///
/// let mut cfg = Configuration::new();
/// cfg.add(Dot { id: MarkId(1) }).unwrap();
/// cfg.add(Dot { id: MarkId(2) }).unwrap();
/// assert!(cfg.add(Dot { id: MarkId(1) }).is_err());
///
/// let (a, b) = cfg.remove_two(1, 0).unwrap();
/// assert_eq!((a.mark_id(), b.mark_id()), (MarkId(2), MarkId(1)));
/// assert!(cfg.is_empty());
/// ```
#[derive(Debug)]
pub struct Configuration<M: Mark> {
    marks: Vec<Arc<M>>,
    ids: HashSet<MarkId>,
}

impl<M: Mark> Default for Configuration<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Mark> Configuration<M> {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self {
            marks: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            marks: Vec::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
        }
    }

    /// Builds a configuration from marks, rejecting duplicate identities.
    pub fn from_marks<I: IntoIterator<Item = M>>(marks: I) -> Result<Self> {
        let mut configuration = Self::new();
        for mark in marks {
            configuration.add(mark)?;
        }
        Ok(configuration)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.marks.get(index).map(|m| m.as_ref())
    }

    /// Returns the shared handle of the mark at `index`.
    pub fn get_shared(&self, index: usize) -> Option<&Arc<M>> {
        self.marks.get(index)
    }

    pub fn marks(&self) -> &[Arc<M>] {
        &self.marks
    }

    pub fn iter(&self) -> impl Iterator<Item = &M> + '_ {
        self.marks.iter().map(|m| m.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = MarkId> + '_ {
        self.marks.iter().map(|m| m.mark_id())
    }

    pub fn contains(&self, id: MarkId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns the position of the mark with the given identity.
    pub fn index_of(&self, id: MarkId) -> Option<usize> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.marks.iter().position(|m| m.mark_id() == id)
    }

    /// Fails with `IndexOutOfRange` unless `index` addresses a mark.
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.marks.len() {
            Ok(())
        } else {
            Err(MarkForgeError::IndexOutOfRange {
                index,
                len: self.marks.len(),
            })
        }
    }

    /// Validates a pair of positions for [`remove_two`](Self::remove_two).
    pub fn check_index_pair(&self, index_a: usize, index_b: usize) -> Result<()> {
        self.check_index(index_a)?;
        self.check_index(index_b)?;
        if index_a == index_b {
            return Err(MarkForgeError::IdenticalIndices(index_a));
        }
        Ok(())
    }

    /// Fails with `DuplicateIdentity` if a mark with `id` is present,
    /// ignoring the mark at `replacing` (the slot about to be exchanged).
    pub fn check_insertable(&self, id: MarkId, replacing: Option<usize>) -> Result<()> {
        if !self.ids.contains(&id) {
            return Ok(());
        }
        match replacing {
            Some(index) if self.marks.get(index).map(|m| m.mark_id()) == Some(id) => Ok(()),
            _ => Err(MarkForgeError::DuplicateIdentity(id)),
        }
    }

    /// Appends a mark.
    pub fn add(&mut self, mark: M) -> Result<()> {
        self.add_shared(Arc::new(mark))
    }

    /// Appends an already shared mark.
    pub fn add_shared(&mut self, mark: Arc<M>) -> Result<()> {
        let id = mark.mark_id();
        self.check_insertable(id, None)?;
        self.ids.insert(id);
        self.marks.push(mark);
        Ok(())
    }

    /// Inserts a mark at `index`, shifting later marks back.
    ///
    /// `index == len()` appends. Used to restore a removed mark to its
    /// original position.
    pub fn insert_shared(&mut self, index: usize, mark: Arc<M>) -> Result<()> {
        if index > self.marks.len() {
            return Err(MarkForgeError::IndexOutOfRange {
                index,
                len: self.marks.len(),
            });
        }
        let id = mark.mark_id();
        self.check_insertable(id, None)?;
        self.ids.insert(id);
        self.marks.insert(index, mark);
        Ok(())
    }

    /// Removes and returns the mark at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Arc<M>> {
        self.check_index(index)?;
        let mark = self.marks.remove(index);
        self.ids.remove(&mark.mark_id());
        Ok(mark)
    }

    /// Removes two marks in one step.
    ///
    /// Returns the removed marks in argument order: `(mark at index_a,
    /// mark at index_b)`. Fails without change if either index is invalid or
    /// both are equal.
    pub fn remove_two(&mut self, index_a: usize, index_b: usize) -> Result<(Arc<M>, Arc<M>)> {
        self.check_index_pair(index_a, index_b)?;

        // Remove the higher position first so the lower one stays valid.
        let (high, low) = if index_a > index_b {
            (index_a, index_b)
        } else {
            (index_b, index_a)
        };
        let high_mark = self.marks.remove(high);
        let low_mark = self.marks.remove(low);
        self.ids.remove(&high_mark.mark_id());
        self.ids.remove(&low_mark.mark_id());

        if index_a > index_b {
            Ok((high_mark, low_mark))
        } else {
            Ok((low_mark, high_mark))
        }
    }

    /// Replaces the mark at `index`, preserving its position.
    ///
    /// Returns the replaced mark. The new mark may reuse the identity of the
    /// mark it replaces but not that of any other mark.
    pub fn exchange(&mut self, index: usize, mark: M) -> Result<Arc<M>> {
        self.exchange_shared(index, Arc::new(mark))
    }

    /// Shared-handle variant of [`exchange`](Self::exchange).
    pub fn exchange_shared(&mut self, index: usize, mark: Arc<M>) -> Result<Arc<M>> {
        self.check_index(index)?;
        let id = mark.mark_id();
        self.check_insertable(id, Some(index))?;
        let old = std::mem::replace(&mut self.marks[index], mark);
        self.ids.remove(&old.mark_id());
        self.ids.insert(id);
        Ok(old)
    }

    /// New configuration sharing the same marks.
    pub fn shallow_copy(&self) -> Self {
        Self {
            marks: self.marks.clone(),
            ids: self.ids.clone(),
        }
    }

    /// New configuration holding clones of every mark.
    pub fn deep_copy(&self) -> Self {
        Self {
            marks: self
                .marks
                .iter()
                .map(|m| Arc::new(M::clone(m)))
                .collect(),
            ids: self.ids.clone(),
        }
    }
}
