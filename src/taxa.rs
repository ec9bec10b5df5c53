//! Taxon registry: dense integer ids for taxon names.
//!
//! Ids are handed out in first-seen order across the whole forest, so the
//! id of a taxon is also its row index in the assembled matrix. Besides the
//! name mapping, every taxon carries the two append-only lists the matrix
//! assembler walks with forward pointers:
//!
//! - `columns`: ascending indices of the bipartitions whose clade holds the taxon
//! - `trees`: ascending indices of the trees in which the taxon is a leaf

use std::collections::HashMap;

/// Dense taxon id, `0..registry.len()`.
pub type TaxonId = usize;

/// Per-taxon column and tree-membership lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonRecord {
    /// Columns in which the taxon is on the counted side (strictly increasing).
    pub columns: Vec<usize>,
    /// Trees containing the taxon (strictly increasing).
    pub trees: Vec<usize>,
}

impl TaxonRecord {
    /// Record membership in column `column`. Repeats of the last column are ignored.
    #[inline]
    pub(crate) fn add_column(&mut self, column: usize) {
        if self.columns.last() != Some(&column) {
            self.columns.push(column);
        }
    }

    /// Record membership in tree `tree`; returns false if it was already recorded.
    #[inline]
    pub(crate) fn add_tree(&mut self, tree: usize) -> bool {
        if self.trees.last() == Some(&tree) {
            return false;
        }
        self.trees.push(tree);
        true
    }

    /// Whether the taxon occurs in `tree`.
    pub fn in_tree(&self, tree: usize) -> bool {
        self.trees.binary_search(&tree).is_ok()
    }
}

/// Bijective `name ↔ id` map plus one [`TaxonRecord`] per id.
///
/// # Example
/// ```
/// # use fast_mrp::taxa::TaxonRegistry;
/// let mut reg = TaxonRegistry::new();
/// assert_eq!(reg.intern("Homo"), 0);
/// assert_eq!(reg.intern("Pan"), 1);
/// assert_eq!(reg.intern("Homo"), 0);
/// assert_eq!(reg.name(1), Some("Pan"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaxonRegistry {
    ids: HashMap<String, TaxonId>,
    names: Vec<String>,
    records: Vec<TaxonRecord>,
}

impl TaxonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `name`, allocating the next dense id on first sight.
    pub fn intern(&mut self, name: &str) -> TaxonId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        self.records.push(TaxonRecord::default());
        id
    }

    pub fn id(&self, name: &str) -> Option<TaxonId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: TaxonId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn record(&self, id: TaxonId) -> Option<&TaxonRecord> {
        self.records.get(id)
    }

    pub(crate) fn record_mut(&mut self, id: TaxonId) -> &mut TaxonRecord {
        &mut self.records[id]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Taxa in id order (the matrix row order).
    pub fn iter(&self) -> impl Iterator<Item = (TaxonId, &str, &TaxonRecord)> + '_ {
        self.names
            .iter()
            .zip(&self.records)
            .enumerate()
            .map(|(id, (name, record))| (id, name.as_str(), record))
    }
}
