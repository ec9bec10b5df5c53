//! Tree boundary index.
//!
//! For every tree in input order we keep the exclusive end of its column
//! range. The range of tree `t` is `ends[t-1]..ends[t]` (with an implicit
//! `0` before the first tree), so a tree that closed no parenthesis simply
//! has an empty range and the previous boundary carries over.

use std::ops::Range;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeBoundaries {
    ends: Vec<usize>,
}

impl TreeBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the next tree at `column_count` columns allocated so far.
    ///
    /// Boundaries are non-decreasing; a smaller count is clamped to the
    /// previous boundary.
    pub(crate) fn push(&mut self, column_count: usize) {
        let prev = self.ends.last().copied().unwrap_or(0);
        self.ends.push(column_count.max(prev));
    }

    /// Number of trees recorded.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Index of the last column at or before tree `tree`'s boundary.
    ///
    /// `None` when no column has been produced by `tree` or any tree before it.
    pub fn last_column(&self, tree: usize) -> Option<usize> {
        self.ends.get(tree).and_then(|&end| end.checked_sub(1))
    }

    /// Column range contributed by `tree`.
    pub fn range(&self, tree: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(tree)?;
        let start = if tree == 0 { 0 } else { self.ends[tree - 1] };
        Some(start..end)
    }

    /// Column ranges of all trees, in input order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let starts = std::iter::once(0).chain(self.ends.iter().copied());
        starts.zip(self.ends.iter().copied()).map(|(s, e)| s..e)
    }

    /// Exclusive end column of every tree.
    pub(crate) fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// Total columns covered by all trees.
    pub fn column_count(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }
}
