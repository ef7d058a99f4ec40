//! Splice records for observable lists.
//!
//! A `Splice` describes one mutation of an `ObservableList`: at `index`,
//! the items in `removed` were taken out and the items in `inserted` were put
//! in their place. Every list mutation produces exactly one splice.

/// A single list mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Splice<T> {
    /// Position of the first affected item
    pub index: usize,
    /// Items that were removed, in list order
    pub removed: Vec<T>,
    /// Items that were inserted, in list order
    pub inserted: Vec<T>,
}

impl<T> Default for Splice<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> Splice<T> {
    /// Creates an empty splice at `index`.
    #[inline]
    pub fn new(index: usize) -> Self {
        Self {
            index,
            removed: Vec::new(),
            inserted: Vec::new(),
        }
    }

    /// Creates a splice representing an initial list, all items inserted.
    pub fn initial(items: Vec<T>) -> Self {
        Self {
            index: 0,
            removed: Vec::new(),
            inserted: items,
        }
    }

    /// Returns true if the splice did not change the list.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.inserted.is_empty()
    }

    /// Returns how much the list length changed.
    #[inline]
    pub fn len_delta(&self) -> isize {
        self.inserted.len() as isize - self.removed.len() as isize
    }

    /// Returns the total number of affected items.
    #[inline]
    pub fn len(&self) -> usize {
        self.removed.len() + self.inserted.len()
    }
}
