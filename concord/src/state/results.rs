use crate::error::ReportError;

use std::collections::BTreeMap;

/// Index-keyed storage for the values reported by a producer.
///
/// Values are kept ordered by index, so reading them back yields index
/// order no matter in which order they were reported. An index is written
/// at most once; a second write to the same index is rejected.
pub(crate) struct ResultStore<T> {
    /// Stored values, keyed by result index.
    items: BTreeMap<usize, T>,

    /// Slot used by the next append: one past the highest index written.
    next_index: usize,
}

impl<T> ResultStore<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_index: 0,
        }
    }

    /// Stores `value` at `index`, or at the next free slot when `index` is `None`.
    ///
    /// Returns the index the value was written to.
    pub(crate) fn insert(&mut self, value: T, index: Option<usize>) -> Result<usize, ReportError> {
        let index = index.unwrap_or(self.next_index);

        if self.items.contains_key(&index) {
            return Err(ReportError::IndexTaken(index));
        }

        let following = index.checked_add(1).ok_or(ReportError::IndexOverflow(index))?;

        self.items.insert(index, value);
        self.next_index = self.next_index.max(following);

        Ok(index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.items.get(&index)
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates over the stored values in index order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}
